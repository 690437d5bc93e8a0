//! Access to the task store this program browses.
//!
//! The engine only talks to a store through the `Backend` trait. `TaskwarriorBackend`
//! drives the real `task` executable, `FileBackend` keeps tasks in memory with an
//! optional JSON file behind them.

use crate::error::Result;
use crate::task::{NewTask, Task};

pub mod file;
pub mod taskwarrior;

pub use file::FileBackend;
pub use taskwarrior::TaskwarriorBackend;

/// Operations a task store must provide.
///
/// Tasks handed back are snapshots; the store owns the durable state and may compute
/// fields (id, urgency) that callers treat as read-only.
pub trait Backend {
    /// All pending tasks.
    fn pending(&mut self) -> Result<Vec<Task>>;

    /// All completed tasks.
    fn completed(&mut self) -> Result<Vec<Task>>;

    /// Create a pending task and return it as the store now reports it.
    fn create(&mut self, new: NewTask) -> Result<Task>;

    /// Persist every writable field of `task`, matched by uuid.
    fn save(&mut self, task: &Task) -> Result<()>;

    /// Mark the task done.
    fn complete(&mut self, task: &Task) -> Result<()>;

    /// Remove the task.
    fn delete(&mut self, task: &Task) -> Result<()>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn pending(&mut self) -> Result<Vec<Task>> {
        (**self).pending()
    }

    fn completed(&mut self) -> Result<Vec<Task>> {
        (**self).completed()
    }

    fn create(&mut self, new: NewTask) -> Result<Task> {
        (**self).create(new)
    }

    fn save(&mut self, task: &Task) -> Result<()> {
        (**self).save(task)
    }

    fn complete(&mut self, task: &Task) -> Result<()> {
        (**self).complete(task)
    }

    fn delete(&mut self, task: &Task) -> Result<()> {
        (**self).delete(task)
    }
}
