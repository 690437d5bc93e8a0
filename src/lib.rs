//! # Tsakarori
//!
//! A terminal front end for Taskwarrior.
//!
//! The core is [`view::TaskView`], a filtered and sorted projection over a task
//! [`backend::Backend`]. The TUI and the `list`/`stats` commands only read the
//! projection and call its operations; they never filter or sort on their own.
//!
//! Two backends ship with the crate:
//!
//! - [`backend::TaskwarriorBackend`] shells out to the `task` executable
//!   (`export`, `import`, `done`, `delete`).
//! - [`backend::FileBackend`] keeps tasks in a JSON file, or only in memory, and is
//!   used by `--store` and by the tests.
//!
//! ## Quick Start
//!
//! ```bash
//! # Browse Taskwarrior tasks
//! tsakarori
//!
//! # Print pending tasks in project "work", one table per tag
//! tsakarori list --project work --group tag
//!
//! # Try it without Taskwarrior
//! tsakarori --store ./tasks.json
//! ```

pub mod backend;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod format;
pub mod task;
pub mod tui;
pub mod view;
