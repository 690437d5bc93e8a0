//! Enumerations and field types for tasks.
//!
//! This module defines the structured values a task carries (priority, status) and
//! the `FieldEdit` type used to describe a requested change to a single field.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task priority as understood by Taskwarrior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    #[serde(rename = "H")]
    High,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Low,
}

impl Priority {
    /// Parse the one-letter form (`H`, `M`, `L`), ignoring case and surrounding whitespace.
    pub fn from_letter(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "H" => Some(Priority::High),
            "M" => Some(Priority::Medium),
            "L" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Priority::High => "H",
            Priority::Medium => "M",
            Priority::Low => "L",
        }
    }
}

/// Task completion status.
///
/// Backends may know more states (deleted, waiting, recurring); those never reach
/// the projection, so anything that is not `completed` is read as pending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => f.write_str("pending"),
            Status::Completed => f.write_str("completed"),
        }
    }
}

/// A requested change to one editable field.
///
/// `Unchanged` leaves the field alone, `Clear` removes its value and `Set` replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldEdit<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

impl<T> FieldEdit<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldEdit::Unchanged)
    }
}

/// Grouping used by the list views and `list --group`.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum GroupBy {
    Project,
    Tag,
}
