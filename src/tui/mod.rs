//! Terminal user interface.

pub mod app;
pub mod colors;
pub mod enums;
pub mod input;
pub mod picker;
pub mod run;
pub mod task_form;
pub mod utils;
