//! Enumerations for TUI state management.

/// Which screen or modal dialog has the keyboard.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    TaskList,
    AddTask,
    EditTask,
    FilterPrompt,
    Picker,
    Help,
    Confirm,
}

/// The main views, cycled with `v`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ViewMode {
    All,
    ByProject,
    ByTag,
    Stats,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::All => ViewMode::ByProject,
            ViewMode::ByProject => ViewMode::ByTag,
            ViewMode::ByTag => ViewMode::Stats,
            ViewMode::Stats => ViewMode::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::All => "all",
            ViewMode::ByProject => "by_project",
            ViewMode::ByTag => "by_tags",
            ViewMode::Stats => "stats",
        }
    }
}

/// What a picker selection is used for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PickerKind {
    Project,
    Tag,
    Dependency,
}
