//! The task projection shown by every front end.
//!
//! `TaskView` owns the filter state and the derived projection (`current_tasks`,
//! `projects`, `tags`) and is the only place either changes. Every mutating operation
//! goes to the backend first and then rebuilds the projection before returning, so
//! callers never observe a half-updated view.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use uuid::Uuid;

use crate::backend::Backend;
use crate::error::{Result, ValidationError};
use crate::fields::{FieldEdit, GroupBy, Priority};
use crate::task::{local_midnight_utc, normalise_tags, parse_due_input, NewTask, Task};

/// The active filters. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub project: Option<String>,
    pub tag: Option<String>,
    pub text: Option<String>,
    pub show_completed: bool,
}

impl FilterState {
    pub fn is_filtered(&self) -> bool {
        self.project.is_some() || self.tag.is_some() || self.text.is_some()
    }
}

/// Requested changes to one task; fields left `Unchanged` are not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub description: FieldEdit<String>,
    pub project: FieldEdit<String>,
    pub tags: FieldEdit<Vec<String>>,
    /// Raw user input, accepted when it is H, M or L in any case.
    pub priority: FieldEdit<String>,
    /// Raw user input, accepted when it parses as `YYYY-MM-DD`.
    pub due: FieldEdit<String>,
}

/// A part of an edit that was not applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditWarning {
    #[error("no task at position {0}")]
    NoSuchTask(usize),

    #[error(transparent)]
    Rejected(#[from] ValidationError),
}

/// Result of `edit_task`: whether anything was saved, and what was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    pub changed: bool,
    pub warnings: Vec<EditWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    pub key: String,
    pub tasks: Vec<&'a Task>,
}

/// `current_tasks` partitioned by project or tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouping<'a> {
    /// Groups in ascending key order.
    pub groups: Vec<Group<'a>>,
    /// Tasks without a project (or without tags).
    pub ungrouped: Vec<&'a Task>,
}

impl<'a> Grouping<'a> {
    /// Tasks in display order: each group in turn, then the ungrouped bucket.
    pub fn rows(&self) -> Vec<&'a Task> {
        self.groups
            .iter()
            .flat_map(|g| g.tasks.iter().copied())
            .chain(self.ungrouped.iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.tasks.len()).sum::<usize>() + self.ungrouped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Aggregate numbers for the stats view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Across the whole backend, ignoring filters.
    pub pending_total: usize,
    /// Across the whole backend, ignoring filters.
    pub completed_total: usize,
    /// Distinct projects in the current projection.
    pub projects: Vec<String>,
    /// Distinct tags in the current projection.
    pub tags: Vec<String>,
}

/// Filtered, sorted view over a backend's tasks.
pub struct TaskView<B: Backend> {
    backend: B,
    filters: FilterState,
    current_tasks: Vec<Task>,
    projects: Vec<String>,
    tags: Vec<String>,
    known: HashMap<Uuid, Task>,
    /// Last completed export; `None` once something may have changed it.
    completed: Option<Vec<Task>>,
    pending_total: usize,
    completed_total: usize,
}

impl<B: Backend> TaskView<B> {
    /// Build the view with empty filters and compute the first projection.
    pub fn new(backend: B) -> Result<Self> {
        let mut view = TaskView {
            backend,
            filters: FilterState::default(),
            current_tasks: Vec::new(),
            projects: Vec::new(),
            tags: Vec::new(),
            known: HashMap::new(),
            completed: None,
            pending_total: 0,
            completed_total: 0,
        };
        view.recompute()?;
        Ok(view)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn current_tasks(&self) -> &[Task] {
        &self.current_tasks
    }

    pub fn projects(&self) -> &[String] {
        &self.projects
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.current_tasks.get(index)
    }

    /// Index of the task in `current_tasks`.
    pub fn position_of(&self, uuid: Uuid) -> Option<usize> {
        self.current_tasks.iter().position(|t| t.uuid == uuid)
    }

    /// Any pending or completed task, whether or not it passes the filters.
    pub fn find(&self, uuid: Uuid) -> Option<&Task> {
        self.known.get(&uuid)
    }

    /// Re-read everything from the backend, including completed tasks.
    pub fn refresh(&mut self) -> Result<()> {
        self.completed = None;
        self.recompute()
    }

    /// Rebuild `current_tasks`, `projects` and `tags` from the backend and filters.
    ///
    /// Completed tasks are exported when they are shown or when the cached copy was
    /// invalidated; otherwise the last export still backs `find` and the stats totals.
    pub fn recompute(&mut self) -> Result<()> {
        let pending = self.backend.pending()?;
        let completed = match self.completed.take() {
            Some(cached) if !self.filters.show_completed => cached,
            _ => self.backend.completed()?,
        };
        self.completed = Some(completed.clone());
        self.pending_total = pending.len();
        self.completed_total = completed.len();
        self.known = pending
            .iter()
            .chain(completed.iter())
            .map(|t| (t.uuid, t.clone()))
            .collect();

        let mut tasks = pending;
        if self.filters.show_completed {
            tasks.extend(completed);
        }

        if let Some(project) = &self.filters.project {
            tasks.retain(|t| t.project.as_deref() == Some(project.as_str()));
        }
        if let Some(tag) = &self.filters.tag {
            tasks.retain(|t| t.tags.contains(tag));
        }
        if let Some(text) = &self.filters.text {
            let needle = text.to_lowercase();
            tasks.retain(|t| t.matches_text(&needle));
        }

        sort_for_display(&mut tasks);

        self.projects = tasks
            .iter()
            .filter_map(|t| t.project.clone())
            .filter(|p| !p.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.tags = tasks
            .iter()
            .flat_map(|t| t.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.current_tasks = tasks;

        tracing::debug!(
            shown = self.current_tasks.len(),
            pending = self.pending_total,
            completed = self.completed_total,
            filters = ?self.filters,
            "recomputed projection"
        );
        Ok(())
    }

    /// Create a task. A blank description is rejected before the backend is called.
    pub fn add_task(
        &mut self,
        description: &str,
        project: Option<&str>,
        tags: &[String],
    ) -> Result<Task> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription.into());
        }
        let new = NewTask {
            description: description.to_string(),
            project: project
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            tags: normalise_tags(tags),
        };
        let task = self.backend.create(new)?;
        tracing::info!(uuid = %task.uuid, description = %task.description, "added task");
        self.recompute()?;
        Ok(task)
    }

    /// Apply `edit` to the task at `index`.
    ///
    /// Invalid fields are skipped and reported in the outcome; the remaining fields are
    /// still applied. Nothing is saved when no field was accepted.
    pub fn edit_task(&mut self, index: usize, edit: TaskEdit) -> Result<EditOutcome> {
        let mut outcome = EditOutcome::default();
        let Some(original) = self.current_tasks.get(index) else {
            outcome.warnings.push(EditWarning::NoSuchTask(index));
            return Ok(outcome);
        };
        let mut task = original.clone();
        let mut accepted = false;

        match edit.description {
            FieldEdit::Unchanged => {}
            FieldEdit::Set(d) if !d.trim().is_empty() => {
                task.description = d.trim().to_string();
                accepted = true;
            }
            FieldEdit::Set(_) | FieldEdit::Clear => {
                outcome.warnings.push(ValidationError::EmptyDescription.into());
            }
        }

        match edit.project {
            FieldEdit::Unchanged => {}
            FieldEdit::Set(p) if !p.trim().is_empty() => {
                task.project = Some(p.trim().to_string());
                accepted = true;
            }
            FieldEdit::Set(_) | FieldEdit::Clear => {
                task.project = None;
                accepted = true;
            }
        }

        match edit.tags {
            FieldEdit::Unchanged => {}
            FieldEdit::Set(tags) => {
                task.tags = normalise_tags(tags);
                accepted = true;
            }
            FieldEdit::Clear => {
                task.tags.clear();
                accepted = true;
            }
        }

        match edit.priority {
            FieldEdit::Unchanged => {}
            FieldEdit::Set(raw) => match Priority::from_letter(&raw) {
                Some(p) => {
                    task.priority = Some(p);
                    accepted = true;
                }
                None => outcome
                    .warnings
                    .push(ValidationError::InvalidPriority(raw).into()),
            },
            FieldEdit::Clear => {
                task.priority = None;
                accepted = true;
            }
        }

        match edit.due {
            FieldEdit::Unchanged => {}
            FieldEdit::Set(raw) => match parse_due_input(&raw) {
                Some(d) => {
                    // Re-entering the shown date keeps the stored time of day.
                    if task.due_date() != Some(d) {
                        task.due = Some(local_midnight_utc(d));
                    }
                    accepted = true;
                }
                None => outcome.warnings.push(ValidationError::InvalidDueDate(raw).into()),
            },
            FieldEdit::Clear => {
                task.due = None;
                accepted = true;
            }
        }

        for w in &outcome.warnings {
            tracing::warn!(uuid = %task.uuid, warning = %w, "edit field skipped");
        }

        if accepted {
            self.backend.save(&task)?;
            tracing::info!(uuid = %task.uuid, "edited task");
            self.recompute()?;
            outcome.changed = true;
        }
        Ok(outcome)
    }

    /// Delete the task at `index`. Returns `false` when there is no such task.
    pub fn delete_task(&mut self, index: usize) -> Result<bool> {
        let Some(task) = self.current_tasks.get(index).cloned() else {
            return Ok(false);
        };
        self.backend.delete(&task)?;
        tracing::info!(uuid = %task.uuid, "deleted task");
        // Deleting may strip the uuid from completed tasks' dependencies too.
        self.completed = None;
        self.recompute()?;
        Ok(true)
    }

    /// Mark the task at `index` done. Returns `false` when there is no such task.
    pub fn complete_task(&mut self, index: usize) -> Result<bool> {
        let Some(task) = self.current_tasks.get(index).cloned() else {
            return Ok(false);
        };
        self.backend.complete(&task)?;
        tracing::info!(uuid = %task.uuid, "completed task");
        self.completed = None;
        self.recompute()?;
        Ok(true)
    }

    /// Tasks the one at `index` may be made to depend on: everything else on screen.
    pub fn dependency_candidates(&self, index: usize) -> Vec<&Task> {
        self.current_tasks
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, t)| t)
            .collect()
    }

    /// Record that the task at `index` is blocked by `other`.
    ///
    /// Adding an existing dependency is a no-op write. Returns `false` for an unknown
    /// index or when `other` is the task itself.
    pub fn set_dependency(&mut self, index: usize, other: Uuid) -> Result<bool> {
        let Some(task) = self.current_tasks.get(index) else {
            return Ok(false);
        };
        if task.uuid == other {
            tracing::warn!(uuid = %other, "refusing self dependency");
            return Ok(false);
        }
        let mut task = task.clone();
        task.depends.insert(other);
        self.backend.save(&task)?;
        tracing::info!(uuid = %task.uuid, depends_on = %other, "added dependency");
        self.recompute()?;
        Ok(true)
    }

    pub fn group_by_project(&self) -> Grouping<'_> {
        self.group(GroupBy::Project)
    }

    pub fn group_by_tag(&self) -> Grouping<'_> {
        self.group(GroupBy::Tag)
    }

    /// Partition `current_tasks`; a task with several tags lands in each tag's group.
    pub fn group(&self, by: GroupBy) -> Grouping<'_> {
        let mut groups: BTreeMap<&str, Vec<&Task>> = BTreeMap::new();
        let mut ungrouped = Vec::new();
        for task in &self.current_tasks {
            match by {
                GroupBy::Project => match task.project.as_deref() {
                    Some(p) if !p.is_empty() => groups.entry(p).or_default().push(task),
                    _ => ungrouped.push(task),
                },
                GroupBy::Tag => {
                    if task.tags.is_empty() {
                        ungrouped.push(task);
                    }
                    for tag in &task.tags {
                        groups.entry(tag.as_str()).or_default().push(task);
                    }
                }
            }
        }

        sort_by_urgency(&mut ungrouped);
        Grouping {
            groups: groups
                .into_iter()
                .map(|(key, mut tasks)| {
                    sort_by_urgency(&mut tasks);
                    Group {
                        key: key.to_string(),
                        tasks,
                    }
                })
                .collect(),
            ungrouped,
        }
    }

    /// Set the text filter; blank input removes it.
    pub fn set_filter(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        self.filters.text = (!text.is_empty()).then(|| text.to_string());
        self.recompute()
    }

    pub fn set_project_filter(&mut self, project: Option<String>) -> Result<()> {
        self.filters.project = project;
        self.recompute()
    }

    pub fn set_tag_filter(&mut self, tag: Option<String>) -> Result<()> {
        self.filters.tag = tag;
        self.recompute()
    }

    /// Drop the project, tag and text filters. The completed toggle is kept.
    pub fn clear_filters(&mut self) -> Result<()> {
        self.filters.project = None;
        self.filters.tag = None;
        self.filters.text = None;
        self.recompute()
    }

    pub fn toggle_completed(&mut self) -> Result<()> {
        self.filters.show_completed = !self.filters.show_completed;
        self.recompute()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            pending_total: self.pending_total,
            completed_total: self.completed_total,
            projects: self.projects.clone(),
            tags: self.tags.clone(),
        }
    }

    /// `Project:x, Tag:y, Text:z` for the active filters, or `None` when unfiltered.
    pub fn filter_summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(p) = &self.filters.project {
            parts.push(format!("Project:{p}"));
        }
        if let Some(t) = &self.filters.tag {
            parts.push(format!("Tag:{t}"));
        }
        if let Some(t) = &self.filters.text {
            parts.push(format!("Text:{t}"));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// Pending before completed, then highest urgency first. Stable.
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.is_completed()
            .cmp(&b.is_completed())
            .then(b.urgency.total_cmp(&a.urgency))
    });
}

fn sort_by_urgency(tasks: &mut [&Task]) {
    tasks.sort_by(|a, b| b.urgency.total_cmp(&a.urgency));
}
