use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tsakarori::backend::{Backend, FileBackend, TaskwarriorBackend};
use tsakarori::cli::Cli;
use tsakarori::cmd::{cmd_completions, cmd_list, cmd_stats, Commands};
use tsakarori::config::{default_config_path, default_log_path, Config};
use tsakarori::error::{Error, Result};
use tsakarori::tui::run::run_tui;
use tsakarori::view::TaskView;

/// Send `tracing` output to `path`. The terminal belongs to the TUI.
fn init_logging(path: &Path) -> Result<()> {
    let io_err = |source| Error::IoPath {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    let filter =
        EnvFilter::try_from_env("TSAKARORI_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish()
        .try_init()
        .map_err(Error::Logging)
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().or_else(default_config_path);
    let config = match &config_path {
        Some(path) => Config::load_or_create(path)?,
        None => Config::default(),
    };

    let backend: Box<dyn Backend> = match &cli.store {
        Some(path) => Box::new(FileBackend::open(path)?.scored()),
        None => {
            let program = cli
                .task_bin
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.task_bin));
            Box::new(TaskwarriorBackend::new(program))
        }
    };
    let mut view = TaskView::new(backend)?;

    match cli.command {
        None => run_tui(view, config, config_path),
        Some(Commands::List {
            all,
            project,
            tag,
            filter,
            group,
        }) => cmd_list(&mut view, all, project, tag, filter, group),
        Some(Commands::Stats) => cmd_stats(&view),
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Completions need neither a backend nor a config file.
    if let Some(Commands::Completions { shell }) = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    if let Err(e) = init_logging(&log_path) {
        eprintln!("warning: logging disabled: {e}");
    }

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "exiting with error");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_creates_the_file_and_reports_a_second_install() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("tsakarori.log");

        init_logging(&path).unwrap();
        assert!(path.exists());

        let err = init_logging(&path).unwrap_err();
        assert!(matches!(err, Error::Logging(_)));
        assert!(err.to_string().starts_with("cannot install log subscriber"));
    }
}
