//! Local task store backed by an optional JSON file.
//!
//! Used for the offline `--store` mode and as the substitute backend in tests. Tasks
//! are numbered like a Taskwarrior working set: pending tasks get ids `1..` in store
//! order, completed tasks get 0.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::fields::{Priority, Status};
use crate::task::{NewTask, Task};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// In-memory task store, optionally mirrored to a JSON file on every write.
#[derive(Debug, Default)]
pub struct FileBackend {
    tasks: Vec<Task>,
    path: Option<PathBuf>,
    score: bool,
}

impl FileBackend {
    /// An empty store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A memory-only store seeded with `tasks`. Urgency values are kept as given.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let mut backend = FileBackend {
            tasks,
            path: None,
            score: false,
        };
        backend.renumber();
        backend
    }

    /// Load the store at `path`, starting empty if the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let mut backend = FileBackend {
            tasks: Vec::new(),
            path: Some(path.to_path_buf()),
            score: false,
        };
        if path.exists() {
            let mut buf = String::new();
            File::open(path)
                .and_then(|mut f| f.read_to_string(&mut buf))
                .map_err(|source| Error::IoPath {
                    path: path.to_path_buf(),
                    source,
                })?;
            let store: StoreFile = serde_json::from_str(&buf)?;
            backend.tasks = store.tasks;
        }
        backend.renumber();
        tracing::debug!(path = %path.display(), tasks = backend.tasks.len(), "opened task store");
        Ok(backend)
    }

    /// Recompute urgency from priority, project, tags and due date on every write.
    pub fn scored(mut self) -> Self {
        self.score = true;
        let today = Local::now().date_naive();
        for t in &mut self.tasks {
            t.urgency = estimate_urgency(t, today);
        }
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Every task in the store, in store order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, uuid: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.uuid == uuid)
    }

    fn position(&self, uuid: Uuid) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.uuid == uuid)
            .ok_or_else(|| Error::TaskNotFound(uuid.to_string()))
    }

    fn renumber(&mut self) {
        let mut next = 1;
        for t in &mut self.tasks {
            if t.is_completed() {
                t.id = 0;
            } else {
                t.id = next;
                next += 1;
            }
        }
    }

    /// Renumber, rescore and write the file if there is one.
    fn commit(&mut self) -> Result<()> {
        self.renumber();
        if self.score {
            let today = Local::now().date_naive();
            for t in &mut self.tasks {
                t.urgency = estimate_urgency(t, today);
            }
        }
        match self.path.clone() {
            Some(path) => self.persist(&path),
            None => Ok(()),
        }
    }

    /// Atomic-ish write via temp file + rename.
    fn persist(&self, path: &Path) -> Result<()> {
        let io_err = |source| Error::IoPath {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let store = StoreFile {
            tasks: self.tasks.clone(),
        };
        let data = serde_json::to_string_pretty(&store)?;
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(data.as_bytes()).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

impl Backend for FileBackend {
    fn pending(&mut self) -> Result<Vec<Task>> {
        Ok(self.tasks.iter().filter(|t| !t.is_completed()).cloned().collect())
    }

    fn completed(&mut self) -> Result<Vec<Task>> {
        Ok(self.tasks.iter().filter(|t| t.is_completed()).cloned().collect())
    }

    fn create(&mut self, new: NewTask) -> Result<Task> {
        let uuid = Uuid::new_v4();
        let mut task = Task::new(uuid, new.description);
        task.project = new.project;
        task.tags = new.tags;
        task.extra.insert("entry".into(), Value::String(timestamp()));
        self.tasks.push(task);
        self.commit()?;
        let created = self.tasks[self.position(uuid)?].clone();
        Ok(created)
    }

    fn save(&mut self, task: &Task) -> Result<()> {
        let idx = self.position(task.uuid)?;
        let mut stored = task.clone();
        if !self.score {
            // Urgency belongs to the store; a caller's copy may be stale.
            stored.urgency = self.tasks[idx].urgency;
        }
        stored.extra.insert("modified".into(), Value::String(timestamp()));
        self.tasks[idx] = stored;
        self.commit()
    }

    fn complete(&mut self, task: &Task) -> Result<()> {
        let idx = self.position(task.uuid)?;
        let stored = &mut self.tasks[idx];
        stored.status = Status::Completed;
        stored.extra.insert("end".into(), Value::String(timestamp()));
        self.commit()
    }

    fn delete(&mut self, task: &Task) -> Result<()> {
        let idx = self.position(task.uuid)?;
        self.tasks.remove(idx);
        // Drop dependency links pointing at the removed task.
        for t in self.tasks.iter_mut() {
            t.depends.remove(&task.uuid);
        }
        self.commit()
    }
}

fn timestamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// A reduced version of Taskwarrior's urgency polynomial.
///
/// Only the terms this store can know about are included: priority, project, tag
/// count, due proximity and being blocked.
pub fn estimate_urgency(task: &Task, today: NaiveDate) -> f64 {
    if task.is_completed() {
        return 0.0;
    }
    let mut u = match task.priority {
        Some(Priority::High) => 6.0,
        Some(Priority::Medium) => 3.9,
        Some(Priority::Low) => 1.8,
        None => 0.0,
    };
    if task.project.is_some() {
        u += 1.0;
    }
    u += match task.tags.len() {
        0 => 0.0,
        1 => 0.8,
        2 => 0.9,
        _ => 1.0,
    };
    if let Some(due) = task.due_date() {
        // 12.0 when overdue by a week or more, scaling down to 2.4 two weeks out.
        let days = (due - today).num_days() as f64;
        let closeness = if days <= -7.0 {
            1.0
        } else if days >= 14.0 {
            0.2
        } else {
            ((14.0 - days) * 0.8 / 21.0) + 0.2
        };
        u += 12.0 * closeness;
    }
    if !task.depends.is_empty() {
        u -= 5.0;
    }
    (u * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn new_task(description: &str) -> NewTask {
        NewTask {
            description: description.to_string(),
            ..NewTask::default()
        }
    }

    #[test]
    fn working_set_ids_skip_completed_tasks() {
        let mut store = FileBackend::in_memory();
        let a = store.create(new_task("a")).unwrap();
        let b = store.create(new_task("b")).unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        store.complete(&a).unwrap();
        let pending = store.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, 1);
        assert_eq!(store.completed().unwrap()[0].id, 0);
    }

    #[test]
    fn save_keeps_store_urgency_when_unscored() {
        let mut t = Task::new(Uuid::new_v4(), "x");
        t.urgency = 4.5;
        let mut store = FileBackend::with_tasks(vec![t.clone()]);
        t.urgency = 99.0;
        t.description = "y".into();
        store.save(&t).unwrap();
        let saved = store.get(t.uuid).unwrap();
        assert_eq!(saved.urgency, 4.5);
        assert_eq!(saved.description, "y");
    }

    #[test]
    fn saving_an_unknown_task_fails() {
        let mut store = FileBackend::in_memory();
        let err = store.save(&Task::new(Uuid::new_v4(), "ghost")).unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(_)));
    }

    #[test]
    fn delete_drops_dangling_dependencies() {
        let mut store = FileBackend::in_memory();
        let a = store.create(new_task("a")).unwrap();
        let mut b = store.create(new_task("b")).unwrap();
        b.depends.insert(a.uuid);
        store.save(&b).unwrap();
        store.delete(&a).unwrap();
        assert!(store.get(b.uuid).unwrap().depends.is_empty());
    }

    #[test]
    fn store_round_trips_through_its_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.json");
        let created = {
            let mut store = FileBackend::open(&path).unwrap();
            store
                .create(NewTask {
                    description: "persisted".into(),
                    project: Some("Home".into()),
                    tags: BTreeSet::from(["a".to_string()]),
                })
                .unwrap()
        };
        let mut reopened = FileBackend::open(&path).unwrap();
        let pending = reopened.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].uuid, created.uuid);
        assert_eq!(pending[0].project.as_deref(), Some("Home"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn urgency_estimate_orders_by_priority_and_due() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut high = Task::new(Uuid::new_v4(), "h");
        high.priority = Some(Priority::High);
        let mut low = Task::new(Uuid::new_v4(), "l");
        low.priority = Some(Priority::Low);
        assert!(estimate_urgency(&high, today) > estimate_urgency(&low, today));

        let mut overdue = Task::new(Uuid::new_v4(), "o");
        overdue.due = NaiveDate::from_ymd_opt(2024, 2, 1).map(crate::task::local_midnight_utc);
        assert_eq!(estimate_urgency(&overdue, today), 12.0);

        overdue.status = Status::Completed;
        assert_eq!(estimate_urgency(&overdue, today), 0.0);
    }
}
