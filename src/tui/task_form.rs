//! Add and edit forms.
//!
//! The add form collects description, project and tags and submits them together.
//! The edit form works field by field: Enter applies only the focused field, so one
//! rejected value never blocks the others.

use uuid::Uuid;

use crate::fields::FieldEdit;
use crate::task::{split_tags, Task};
use crate::tui::input::InputField;
use crate::view::TaskEdit;

pub const DESCRIPTION_FIELD: usize = 0;
pub const PROJECT_FIELD: usize = 1;
pub const TAGS_FIELD: usize = 2;
pub const PRIORITY_FIELD: usize = 3;
pub const DUE_FIELD: usize = 4;

const LABELS: [&str; 5] = [
    "Description",
    "Project",
    "Tags (comma-separated)",
    "Priority (H,M,L)",
    "Due Date (YYYY-MM-DD)",
];

#[derive(Clone, Debug)]
pub struct FormField {
    pub label: &'static str,
    pub input: InputField,
    /// Value the field had when the form opened or was last applied.
    initial: String,
}

impl FormField {
    fn new(idx: usize, value: &str) -> Self {
        FormField {
            label: LABELS[idx],
            input: InputField::with_value(value),
            initial: value.to_string(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.input.value != self.initial
    }
}

/// Values the add form submits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddRequest {
    pub description: String,
    pub project: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct TaskForm {
    pub fields: Vec<FormField>,
    pub current_field: usize,
    /// Set when editing an existing task.
    pub task: Option<Uuid>,
}

impl TaskForm {
    /// Empty add form: description, project, tags.
    pub fn new_add() -> Self {
        TaskForm {
            fields: (DESCRIPTION_FIELD..=TAGS_FIELD)
                .map(|i| FormField::new(i, ""))
                .collect(),
            current_field: 0,
            task: None,
        }
    }

    /// Edit form prefilled from `task`.
    pub fn from_task(task: &Task) -> Self {
        let due = task
            .due_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let values = [
            task.description.clone(),
            task.project.clone().unwrap_or_default(),
            task.tags_display(),
            task.priority.map(|p| p.letter().to_string()).unwrap_or_default(),
            due,
        ];
        TaskForm {
            fields: values
                .iter()
                .enumerate()
                .map(|(i, v)| FormField::new(i, v))
                .collect(),
            current_field: 0,
            task: Some(task.uuid),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.task.is_some()
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + self.fields.len() - 1) % self.fields.len();
    }

    pub fn is_last_field(&self) -> bool {
        self.current_field + 1 == self.fields.len()
    }

    pub fn active_input(&mut self) -> &mut InputField {
        &mut self.fields[self.current_field].input
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map_or("", |f| f.input.value.as_str())
    }

    pub fn add_request(&self) -> AddRequest {
        let project = self.value(PROJECT_FIELD).trim();
        AddRequest {
            description: self.value(DESCRIPTION_FIELD).trim().to_string(),
            project: (!project.is_empty()).then(|| project.to_string()),
            tags: split_tags(self.value(TAGS_FIELD)).into_iter().collect(),
        }
    }

    /// The edit for the focused field alone; `TaskEdit::default()` when it was not changed.
    pub fn current_edit(&self) -> TaskEdit {
        let field = &self.fields[self.current_field];
        let mut edit = TaskEdit::default();
        if !field.is_dirty() {
            return edit;
        }
        let raw = field.input.value.trim().to_string();
        let clear_or_set = |raw: String| {
            if raw.is_empty() {
                FieldEdit::Clear
            } else {
                FieldEdit::Set(raw)
            }
        };
        match self.current_field {
            DESCRIPTION_FIELD => edit.description = FieldEdit::Set(raw),
            PROJECT_FIELD => edit.project = clear_or_set(raw),
            TAGS_FIELD => edit.tags = FieldEdit::Set(split_tags(&raw).into_iter().collect()),
            PRIORITY_FIELD => edit.priority = clear_or_set(raw),
            DUE_FIELD => edit.due = clear_or_set(raw),
            _ => {}
        }
        edit
    }

    /// Reset the focused field's baseline after it was applied.
    pub fn mark_current_applied(&mut self) {
        let field = &mut self.fields[self.current_field];
        field.initial = field.input.value.clone();
    }
}
