//! End-to-end behaviour of the task view over the file-backed store.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use tsakarori::backend::{Backend, FileBackend};
use tsakarori::fields::{FieldEdit, GroupBy, Priority, Status};
use tsakarori::task::Task;
use tsakarori::view::{EditWarning, TaskEdit, TaskView};

fn task(description: &str, project: Option<&str>, tags: &[&str], urgency: f64) -> Task {
    let mut t = Task::new(Uuid::new_v4(), description);
    t.project = project.map(str::to_string);
    t.tags = tags.iter().map(|s| s.to_string()).collect();
    t.urgency = urgency;
    t
}

fn descriptions<B: Backend>(view: &TaskView<B>) -> Vec<&str> {
    view.current_tasks()
        .iter()
        .map(|t| t.description.as_str())
        .collect()
}

#[test]
fn work_home_scenario_through_a_boxed_backend() {
    let a = task("A", Some("Work"), &["urgent"], 5.0);
    let b = task("B", Some("Home"), &[], 2.0);
    let mut c = task("C", Some("Work"), &["later"], 9.0);
    c.status = Status::Completed;

    let backend: Box<dyn Backend> = Box::new(FileBackend::with_tasks(vec![c, b, a]));
    let mut view = TaskView::new(backend).unwrap();
    assert_eq!(descriptions(&view), ["A", "B"]);

    view.set_project_filter(Some("Work".into())).unwrap();
    assert_eq!(descriptions(&view), ["A"]);
    assert_eq!(view.projects(), ["Work"]);
    assert_eq!(view.tags(), ["urgent"]);

    view.set_project_filter(None).unwrap();
    view.toggle_completed().unwrap();
    assert_eq!(descriptions(&view), ["A", "B", "C"]);
    assert_eq!(view.tags(), ["later", "urgent"]);
}

#[test]
fn changes_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");

    let (report, milk) = {
        let mut view = TaskView::new(FileBackend::open(&path).unwrap()).unwrap();
        let report = view
            .add_task("Write report", Some("Work"), &["docs".to_string()])
            .unwrap();
        let milk = view.add_task("Buy milk", None, &[]).unwrap();

        let idx = view.position_of(report.uuid).unwrap();
        let outcome = view
            .edit_task(
                idx,
                TaskEdit {
                    priority: FieldEdit::Set("h".into()),
                    due: FieldEdit::Set("2024-05-01".into()),
                    ..TaskEdit::default()
                },
            )
            .unwrap();
        assert!(outcome.changed);
        assert!(outcome.warnings.is_empty());

        let idx = view.position_of(report.uuid).unwrap();
        assert!(view.set_dependency(idx, milk.uuid).unwrap());
        let idx = view.position_of(milk.uuid).unwrap();
        assert!(view.complete_task(idx).unwrap());
        (report.uuid, milk.uuid)
    };

    let view = TaskView::new(FileBackend::open(&path).unwrap()).unwrap();
    assert_eq!(descriptions(&view), ["Write report"]);
    let stored = &view.current_tasks()[0];
    assert_eq!(stored.uuid, report);
    assert_eq!(stored.id, 1);
    assert_eq!(stored.priority, Some(Priority::High));
    assert_eq!(stored.due_date(), NaiveDate::from_ymd_opt(2024, 5, 1));
    assert_eq!(stored.depends, BTreeSet::from([milk]));
    assert!(stored.extra.contains_key("entry"));

    let done = view.find(milk).unwrap();
    assert!(done.is_completed());
    assert_eq!(done.id, 0);
    assert_eq!(view.stats().completed_total, 1);
}

#[test]
fn dependency_recorded_once_and_removed_with_its_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let mut view = TaskView::new(FileBackend::open(&path).unwrap()).unwrap();
    let a = view.add_task("A", None, &[]).unwrap();
    let b = view.add_task("B", None, &[]).unwrap();

    for _ in 0..2 {
        let idx = view.position_of(a.uuid).unwrap();
        view.set_dependency(idx, b.uuid).unwrap();
    }
    assert_eq!(view.find(a.uuid).unwrap().depends.len(), 1);

    let idx = view.position_of(b.uuid).unwrap();
    assert!(view.delete_task(idx).unwrap());
    assert!(view.find(a.uuid).unwrap().depends.is_empty());
    assert!(view.find(b.uuid).is_none());
}

#[test]
fn rejected_fields_are_reported_and_the_rest_applied() {
    let mut view = TaskView::new(FileBackend::with_tasks(vec![task(
        "Plan trip",
        Some("Home"),
        &["travel"],
        1.0,
    )]))
    .unwrap();

    let outcome = view
        .edit_task(
            0,
            TaskEdit {
                project: FieldEdit::Clear,
                tags: FieldEdit::Set(vec![]),
                due: FieldEdit::Set("next tuesday".into()),
                ..TaskEdit::default()
            },
        )
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(matches!(outcome.warnings[0], EditWarning::Rejected(_)));
    let t = &view.current_tasks()[0];
    assert_eq!(t.project, None);
    assert!(t.tags.is_empty());
    assert_eq!(t.due, None);
}

#[test]
fn scored_store_reorders_after_an_edit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let mut view = TaskView::new(FileBackend::open(&path).unwrap().scored()).unwrap();
    view.add_task("First", Some("Work"), &[]).unwrap();
    let second = view.add_task("Second", None, &[]).unwrap();
    assert_eq!(descriptions(&view), ["First", "Second"]);

    let idx = view.position_of(second.uuid).unwrap();
    view.edit_task(
        idx,
        TaskEdit {
            priority: FieldEdit::Set("H".into()),
            ..TaskEdit::default()
        },
    )
    .unwrap();
    assert_eq!(descriptions(&view), ["Second", "First"]);
    assert!(view.current_tasks()[0].urgency > view.current_tasks()[1].urgency);
}

#[test]
fn grouped_rows_cover_every_task_once_per_group() {
    let view = TaskView::new(FileBackend::with_tasks(vec![
        task("Both", None, &["a", "b"], 3.0),
        task("OnlyA", None, &["a"], 4.0),
        task("Bare", None, &[], 1.0),
    ]))
    .unwrap();

    let grouping = view.group(GroupBy::Tag);
    let keys: Vec<&str> = grouping.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["a", "b"]);
    let rows: Vec<&str> = grouping
        .rows()
        .iter()
        .map(|t| t.description.as_str())
        .collect();
    assert_eq!(rows, ["OnlyA", "Both", "Both", "Bare"]);
}
