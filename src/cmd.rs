//! Command implementations for the CLI interface.
//!
//! Each command builds its output from a `TaskView`, so the printed tables use the
//! same filtering, ordering and grouping as the TUI.

use std::io::{self, Write};

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::backend::Backend;
use crate::error::Result;
use crate::fields::GroupBy;
use crate::format::{format_due_relative, format_priority, truncate};
use crate::task::Task;
use crate::view::{Stats, TaskView};

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks with optional filters.
    List {
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
        /// Only tasks in this project.
        #[arg(long)]
        project: Option<String>,
        /// Only tasks carrying this tag.
        #[arg(long)]
        tag: Option<String>,
        /// Case-insensitive text match on description, project and tags.
        #[arg(long)]
        filter: Option<String>,
        /// Print one table per project or tag.
        #[arg(long, value_enum)]
        group: Option<GroupBy>,
    },

    /// Show task statistics.
    Stats,

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Print a table of tasks.
pub fn write_table<W: Write>(out: &mut W, tasks: &[&Task], today: NaiveDate) -> io::Result<()> {
    writeln!(
        out,
        "{:<5} {:<4} {:<6} {:<10} {:<14} {}",
        "ID", "Pri", "Urg", "Due", "Project", "Description [tags]"
    )?;
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags_display())
        };
        let priority = match t.priority {
            Some(_) => format_priority(t.priority),
            None => "-",
        };
        let project = t.project.clone().unwrap_or_else(|| "-".into());
        writeln!(
            out,
            "{:<5} {:<4} {:<6.1} {:<10} {:<14} {}{}",
            t.id,
            priority,
            t.urgency,
            format_due_relative(t.due_date(), today),
            truncate(&project, 14),
            t.description,
            tags
        )?;
    }
    Ok(())
}

/// Print the current projection, flat or grouped.
pub fn write_listing<W: Write, B: Backend>(
    out: &mut W,
    view: &TaskView<B>,
    group: Option<GroupBy>,
    today: NaiveDate,
) -> io::Result<()> {
    if view.current_tasks().is_empty() {
        return writeln!(out, "No tasks found.");
    }
    let Some(by) = group else {
        let rows: Vec<&Task> = view.current_tasks().iter().collect();
        return write_table(out, &rows, today);
    };

    let (prefix, none) = match by {
        GroupBy::Project => ("Project", "No Project"),
        GroupBy::Tag => ("Tag", "No Tags"),
    };
    let grouping = view.group(by);
    for g in &grouping.groups {
        writeln!(out, "{prefix}: {}", g.key)?;
        write_table(out, &g.tasks, today)?;
        writeln!(out)?;
    }
    if !grouping.ungrouped.is_empty() {
        writeln!(out, "{none}")?;
        write_table(out, &grouping.ungrouped, today)?;
    }
    Ok(())
}

pub fn write_stats<W: Write>(out: &mut W, stats: &Stats) -> io::Result<()> {
    writeln!(out, "Total pending tasks:   {}", stats.pending_total)?;
    writeln!(out, "Total completed tasks: {}", stats.completed_total)?;
    writeln!(out, "Number of projects:    {}", stats.projects.len())?;
    writeln!(out, "Number of tags:        {}", stats.tags.len())?;
    if !stats.projects.is_empty() {
        writeln!(out, "\nProjects:")?;
        for p in &stats.projects {
            writeln!(out, "  - {p}")?;
        }
    }
    if !stats.tags.is_empty() {
        writeln!(out, "\nTags:")?;
        for t in &stats.tags {
            writeln!(out, "  - {t}")?;
        }
    }
    Ok(())
}

/// List tasks after applying the requested filters to the view.
pub fn cmd_list<B: Backend>(
    view: &mut TaskView<B>,
    all: bool,
    project: Option<String>,
    tag: Option<String>,
    filter: Option<String>,
    group: Option<GroupBy>,
) -> Result<()> {
    if all {
        view.toggle_completed()?;
    }
    if project.is_some() {
        view.set_project_filter(project)?;
    }
    if tag.is_some() {
        view.set_tag_filter(tag.map(|t| t.trim().to_string()))?;
    }
    if let Some(text) = filter {
        view.set_filter(&text)?;
    }
    let today = Local::now().date_naive();
    write_listing(&mut io::stdout().lock(), view, group, today)?;
    Ok(())
}

pub fn cmd_stats<B: Backend>(view: &TaskView<B>) -> Result<()> {
    write_stats(&mut io::stdout().lock(), &view.stats())?;
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FileBackend;
    use crate::task::split_tags;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn view() -> TaskView<FileBackend> {
        let mut a = Task::new(Uuid::new_v4(), "Write report");
        a.project = Some("Work".into());
        a.tags = split_tags("docs");
        a.urgency = 5.0;
        a.due = NaiveDate::from_ymd_opt(2024, 3, 11).map(crate::task::local_midnight_utc);
        let mut b = Task::new(Uuid::new_v4(), "Buy milk");
        b.urgency = 2.0;
        TaskView::new(FileBackend::with_tasks(vec![a, b])).unwrap()
    }

    fn render(view: &TaskView<FileBackend>, group: Option<GroupBy>) -> String {
        let mut out = Vec::new();
        write_listing(&mut out, view, group, today()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn flat_listing() {
        let text = render(&view(), None);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID"));
        assert_eq!(
            lines[1],
            "1     -    5.0    tomorrow   Work           Write report [docs]"
        );
        assert!(lines[2].ends_with("Buy milk"));
    }

    #[test]
    fn grouped_listing_puts_ungrouped_last() {
        let text = render(&view(), Some(GroupBy::Project));
        let headings: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("Project:") || l.starts_with("No Project"))
            .collect();
        assert_eq!(headings, ["Project: Work", "No Project"]);
    }

    #[test]
    fn empty_listing() {
        let mut v = view();
        v.set_filter("nothing matches this").unwrap();
        assert_eq!(render(&v, None), "No tasks found.\n");
    }

    #[test]
    fn stats_output() {
        let mut out = Vec::new();
        write_stats(&mut out, &view().stats()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Total pending tasks:   2\n"));
        assert!(text.contains("Projects:\n  - Work\n"));
        assert!(text.contains("Tags:\n  - docs\n"));
    }
}
