//! Text formatting shared by the TUI and the `list`/`stats` commands.

use chrono::NaiveDate;

use crate::fields::Priority;
use crate::task::Task;

/// Truncate a string to `width` characters, ending in an ellipsis when cut.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

pub fn format_priority(p: Option<Priority>) -> &'static str {
    p.map_or("None", Priority::letter)
}

pub fn format_due(due: Option<NaiveDate>) -> String {
    due.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "None".into())
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Which metadata a list row repeats; grouped views omit the grouping key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowMeta {
    Full,
    WithoutProject,
    WithoutTags,
}

/// One list row: `   4. description                    (U: 5.0, Work, [a,b])`.
pub fn task_line(task: &Task, meta: RowMeta, width: usize) -> String {
    const DESC_WIDTH: usize = 30;
    let id = format!("{:4}", task.id);
    let description = format!("{:<DESC_WIDTH$}", truncate(&task.description, DESC_WIDTH));
    let urgency = format!("U:{:4.1}", task.urgency);
    let project = task.project.as_deref().unwrap_or("None");
    let tags = task.tags_display();
    let mut metadata = match meta {
        RowMeta::Full => format!(" ({urgency}, {project}, [{tags}])"),
        RowMeta::WithoutProject => format!(" ({urgency}, [{tags}])"),
        RowMeta::WithoutTags => format!(" ({urgency}, {project})"),
    };

    let available = width.saturating_sub(id.chars().count() + DESC_WIDTH + 2);
    if metadata.chars().count() > available {
        let keep: String = metadata.chars().take(available.saturating_sub(4)).collect();
        metadata = format!("{keep}...)");
    }
    format!("{id}. {description}{metadata}")
}
