//! Backend that drives the Taskwarrior command line.
//!
//! Reads go through `task export`, writes through `task import` (which updates a task
//! in place when its uuid already exists), `task <uuid> done` and `task <uuid> delete`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::task::{NewTask, Task};

/// Overrides passed on every invocation so output is machine readable and nothing prompts.
const RC_OVERRIDES: [&str; 4] = [
    "rc.confirmation=off",
    "rc.verbose=nothing",
    "rc.json.array=on",
    "rc.recurrence.confirmation=off",
];

#[derive(Debug, Clone)]
pub struct TaskwarriorBackend {
    program: PathBuf,
}

impl TaskwarriorBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<String> {
        let command = format!("{} {}", self.program.display(), args.join(" "));
        tracing::debug!(%command, "running taskwarrior");

        let backend_err = |message: String| Error::Backend {
            command: command.clone(),
            message,
        };

        let mut cmd = Command::new(&self.program);
        cmd.args(RC_OVERRIDES)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                backend_err(format!("{} not found in PATH", self.program.display()))
            } else {
                backend_err(e.to_string())
            }
        })?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes())
                    .map_err(|e| backend_err(e.to_string()))?;
            }
        }

        let out = child
            .wait_with_output()
            .map_err(|e| backend_err(e.to_string()))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_owned();
            tracing::warn!(%command, status = ?out.status.code(), %stderr, "taskwarrior failed");
            return Err(backend_err(if stderr.is_empty() {
                format!("exited with {}", out.status)
            } else {
                stderr
            }));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn export(&self, filter: &[&str]) -> Result<Vec<Task>> {
        let mut args = filter.to_vec();
        args.push("export");
        let out = self.run(&args, None)?;
        parse_export(&out)
    }

    fn import(&self, value: &Value) -> Result<()> {
        let payload = serde_json::to_string(&Value::Array(vec![value.clone()]))?;
        self.run(&["import", "-"], Some(payload.as_str()))?;
        Ok(())
    }
}

impl Default for TaskwarriorBackend {
    fn default() -> Self {
        Self::new("task")
    }
}

/// Parse the output of `task export`. Empty output means no tasks.
pub fn parse_export(out: &str) -> Result<Vec<Task>> {
    let trimmed = out.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// The JSON object `task import` needs to create a new pending task.
pub fn new_task_json(uuid: Uuid, new: &NewTask) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("uuid".into(), Value::String(uuid.to_string()));
    obj.insert("description".into(), Value::String(new.description.clone()));
    obj.insert("status".into(), Value::String("pending".into()));
    obj.insert(
        "entry".into(),
        Value::String(Utc::now().format("%Y%m%dT%H%M%SZ").to_string()),
    );
    if let Some(project) = &new.project {
        obj.insert("project".into(), Value::String(project.clone()));
    }
    if !new.tags.is_empty() {
        obj.insert(
            "tags".into(),
            Value::Array(new.tags.iter().cloned().map(Value::String).collect()),
        );
    }
    Value::Object(obj)
}

impl Backend for TaskwarriorBackend {
    fn pending(&mut self) -> Result<Vec<Task>> {
        self.export(&["status:pending"])
    }

    fn completed(&mut self) -> Result<Vec<Task>> {
        self.export(&["status:completed"])
    }

    fn create(&mut self, new: NewTask) -> Result<Task> {
        let uuid = Uuid::new_v4();
        self.import(&new_task_json(uuid, &new))?;
        let uuid_str = uuid.to_string();
        let created = self.export(&[uuid_str.as_str()])?;
        created
            .into_iter()
            .next()
            .ok_or(Error::TaskNotFound(uuid_str))
    }

    fn save(&mut self, task: &Task) -> Result<()> {
        self.import(&task.to_import_json()?)
    }

    fn complete(&mut self, task: &Task) -> Result<()> {
        let uuid = task.uuid.to_string();
        self.run(&[uuid.as_str(), "done"], None)?;
        Ok(())
    }

    fn delete(&mut self, task: &Task) -> Result<()> {
        let uuid = task.uuid.to_string();
        self.run(&[uuid.as_str(), "delete"], None)?;
        Ok(())
    }
}
