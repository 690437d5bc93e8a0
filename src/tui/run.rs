//! TUI entry point and terminal setup.

use std::io;
use std::path::PathBuf;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::backend::Backend;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::tui::app::App;
use crate::view::TaskView;

/// Initialise the terminal, run the app until the user quits, then restore the terminal.
///
/// The terminal is restored even when the event loop fails.
pub fn run_tui<B: Backend>(
    view: TaskView<B>,
    config: Config,
    config_path: Option<PathBuf>,
) -> Result<()> {
    enable_raw_mode().map_err(Error::Terminal)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(Error::Terminal)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(Error::Terminal)?;

    let mut app = App::new(view, config, config_path);
    tracing::info!("tui started");
    let result = app.run(&mut terminal);

    disable_raw_mode().map_err(Error::Terminal)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(Error::Terminal)?;
    terminal.show_cursor().map_err(Error::Terminal)?;
    tracing::info!("tui stopped");

    result.map_err(Error::Terminal)
}
