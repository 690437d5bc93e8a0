//! Main application logic for the terminal user interface.
//!
//! `App` owns the `TaskView`, the active screen and whatever dialog is open. Key
//! handling is kept apart from the event loop so tests can drive it directly, and
//! every change to tasks or filters goes through the view.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend as TermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use uuid::Uuid;

use crate::backend::Backend;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fields::GroupBy;
use crate::format::{format_due, format_due_relative, format_priority, task_line, RowMeta};
use crate::task::Task;
use crate::tui::{
    colors::Palette,
    enums::{AppState, PickerKind, ViewMode},
    input::InputField,
    picker::{Picker, PickerItem},
    task_form::{TaskForm, DESCRIPTION_FIELD},
    utils::{centered_fixed, centered_rect},
};
use crate::view::{TaskEdit, TaskView};

const FOOTER: &str =
    " q:Quit | a:Add | e:Edit | d:Depend | D:Delete | Space:Done | f:Filter | v:View | ?:Help ";
const FILTER_PROMPT: &str = " Filter: ";

/// Main application state for the terminal user interface.
pub struct App<B: Backend> {
    view: TaskView<B>,
    config: Config,
    config_path: Option<PathBuf>,
    palette: Palette,
    state: AppState,
    mode: ViewMode,
    /// Row in the current view's display order, not an index into `current_tasks`.
    selected: usize,
    list_state: ListState,
    task_form: TaskForm,
    filter_input: InputField,
    picker: Option<Picker>,
    /// Task an open dependency picker or delete confirmation applies to.
    target: Option<Uuid>,
    status_message: String,
}

/// Apply an editing key to a text input. Returns `false` for keys it ignores.
fn edit_input(input: &mut InputField, key: KeyCode) -> bool {
    match key {
        KeyCode::Char(c) => input.handle_char(c),
        KeyCode::Backspace => input.handle_backspace(),
        KeyCode::Delete => input.handle_delete(),
        KeyCode::Left => input.move_cursor_left(),
        KeyCode::Right => input.move_cursor_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => return false,
    }
    true
}

impl<B: Backend> App<B> {
    pub fn new(view: TaskView<B>, config: Config, config_path: Option<PathBuf>) -> Self {
        let palette = Palette::from_scheme(&config.active_scheme());
        App {
            view,
            config,
            config_path,
            palette,
            state: AppState::TaskList,
            mode: ViewMode::All,
            selected: 0,
            list_state: ListState::default(),
            task_form: TaskForm::new_add(),
            filter_input: InputField::new(),
            picker: None,
            target: None,
            status_message: String::new(),
        }
    }

    pub fn view(&self) -> &TaskView<B> {
        &self.view
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Tasks in the order the current view lists them. Empty for the stats view.
    fn display_rows(&self) -> Vec<&Task> {
        match self.mode {
            ViewMode::All => self.view.current_tasks().iter().collect(),
            ViewMode::ByProject => self.view.group(GroupBy::Project).rows(),
            ViewMode::ByTag => self.view.group(GroupBy::Tag).rows(),
            ViewMode::Stats => Vec::new(),
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.display_rows().get(self.selected).copied()
    }

    /// Index into `current_tasks` of the selected row.
    fn selected_index(&self) -> Option<usize> {
        self.selected_task()
            .and_then(|t| self.view.position_of(t.uuid))
    }

    fn clamp_selection(&mut self) {
        let len = self.display_rows().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn select_uuid(&mut self, uuid: Uuid) {
        let row = self.display_rows().iter().position(|t| t.uuid == uuid);
        match row {
            Some(row) => self.selected = row,
            None => self.clamp_selection(),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.display_rows().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    /// Handle one key press. Returns `true` when the user asked to quit.
    ///
    /// Failed actions are logged and shown on the status line; the app keeps running.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        self.status_message.clear();

        let result = match self.state {
            AppState::TaskList => self.handle_task_list_input(key.code),
            AppState::AddTask | AppState::EditTask => self.handle_form_input(key.code),
            AppState::FilterPrompt => self.handle_filter_input(key.code),
            AppState::Picker => self.handle_picker_input(key.code),
            AppState::Help => self.handle_help_input(key.code),
            AppState::Confirm => self.handle_confirm_input(key.code),
        };
        match result {
            Ok(quit) => quit,
            Err(e) => {
                tracing::error!(error = %e, state = ?self.state, "action failed");
                self.status_message = format!("Error: {e}");
                false
            }
        }
    }

    fn handle_task_list_input(&mut self, key: KeyCode) -> Result<bool> {
        match key {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('v') => {
                self.mode = self.mode.next();
                self.clamp_selection();
            }
            KeyCode::Char('?') => self.state = AppState::Help,
            KeyCode::Char('a') => {
                self.task_form = TaskForm::new_add();
                self.state = AppState::AddTask;
            }
            KeyCode::Char('e') => {
                let form = self.selected_task().map(TaskForm::from_task);
                if let Some(form) = form {
                    self.task_form = form;
                    self.state = AppState::EditTask;
                }
            }
            KeyCode::Char('D') => {
                let target = self.selected_task().map(|t| t.uuid);
                if target.is_some() {
                    self.target = target;
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('d') => self.open_dependency_picker(),
            KeyCode::Char(' ') => self.complete_selected()?,
            KeyCode::Char('T') => {
                self.view.toggle_completed()?;
                self.clamp_selection();
                self.status_message = if self.view.filters().show_completed {
                    "Showing completed tasks".into()
                } else {
                    "Hiding completed tasks".into()
                };
            }
            KeyCode::Char('p') => self.open_value_picker(PickerKind::Project),
            KeyCode::Char('t') => self.open_value_picker(PickerKind::Tag),
            KeyCode::Char('f') => {
                self.filter_input =
                    InputField::with_value(self.view.filters().text.as_deref().unwrap_or(""));
                self.state = AppState::FilterPrompt;
            }
            KeyCode::Char('c') => {
                self.view.clear_filters()?;
                self.selected = 0;
                self.status_message = "Filters cleared".into();
            }
            KeyCode::Char('s') => self.cycle_color_scheme()?,
            KeyCode::Char('r') => {
                self.view.refresh()?;
                self.clamp_selection();
                self.status_message = "Tasks refreshed".into();
            }
            _ => {}
        }
        Ok(false)
    }

    fn complete_selected(&mut self) -> Result<()> {
        let Some(index) = self.selected_index() else {
            return Ok(());
        };
        let Some(task) = self.view.get(index) else {
            return Ok(());
        };
        if task.is_completed() {
            self.status_message = "Task is already completed".into();
            return Ok(());
        }
        let description = task.description.clone();
        if self.view.complete_task(index)? {
            self.status_message = format!("Completed: {description}");
        }
        self.clamp_selection();
        Ok(())
    }

    fn cycle_color_scheme(&mut self) -> Result<()> {
        let name = self.config.cycle_color_scheme().to_string();
        self.palette = Palette::from_scheme(&self.config.active_scheme());
        if let Some(path) = &self.config_path {
            self.config.save(path)?;
        }
        tracing::debug!(scheme = %name, "switched color scheme");
        self.status_message = format!("Color scheme: {name}");
        Ok(())
    }

    fn open_dependency_picker(&mut self) {
        let Some(index) = self.selected_index() else {
            return;
        };
        let subject = self.view.get(index).map(|t| t.uuid);
        let items: Vec<PickerItem> = self
            .view
            .dependency_candidates(index)
            .into_iter()
            .map(|t| PickerItem::task(format!("{:>3} {}", t.id, t.description), t.uuid))
            .collect();
        match Picker::new(PickerKind::Dependency, "Depends On", items) {
            Some(picker) => {
                self.picker = Some(picker);
                self.target = subject;
                self.state = AppState::Picker;
            }
            None => self.status_message = "No other tasks to depend on".into(),
        }
    }

    fn open_value_picker(&mut self, kind: PickerKind) {
        let (title, values, empty) = match kind {
            PickerKind::Project => ("Select Project", self.view.projects(), "No projects"),
            PickerKind::Tag => ("Select Tag", self.view.tags(), "No tags"),
            PickerKind::Dependency => return,
        };
        let items: Vec<PickerItem> = values.iter().map(|v| PickerItem::value(v)).collect();
        match Picker::new(kind, title, items) {
            Some(picker) => {
                self.picker = Some(picker);
                self.state = AppState::Picker;
            }
            None => self.status_message = empty.into(),
        }
    }

    fn close_picker(&mut self) {
        self.picker = None;
        self.state = AppState::TaskList;
    }

    fn handle_picker_input(&mut self, key: KeyCode) -> Result<bool> {
        let Some(picker) = self.picker.as_mut() else {
            self.state = AppState::TaskList;
            return Ok(false);
        };
        match key {
            KeyCode::Char('j') | KeyCode::Down => picker.move_by(1),
            KeyCode::Char('k') | KeyCode::Up => picker.move_by(-1),
            KeyCode::Esc | KeyCode::Char('q') => {
                self.close_picker();
                self.target = None;
            }
            KeyCode::Enter => {
                let kind = picker.kind;
                let choice = picker.selected().cloned();
                self.close_picker();
                if let Some(item) = choice {
                    self.apply_pick(kind, item)?;
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn apply_pick(&mut self, kind: PickerKind, item: PickerItem) -> Result<()> {
        match kind {
            PickerKind::Project => {
                self.view.set_project_filter(Some(item.value.clone()))?;
                self.selected = 0;
                self.status_message = format!("Project filter: {}", item.value);
            }
            PickerKind::Tag => {
                self.view.set_tag_filter(Some(item.value.clone()))?;
                self.selected = 0;
                self.status_message = format!("Tag filter: {}", item.value);
            }
            PickerKind::Dependency => {
                let (Some(subject), Some(other)) = (self.target.take(), item.uuid) else {
                    return Ok(());
                };
                let Some(index) = self.view.position_of(subject) else {
                    self.status_message = "Task is no longer listed".into();
                    return Ok(());
                };
                if self.view.set_dependency(index, other)? {
                    self.status_message = format!("Now depends on {}", item.label.trim());
                }
                self.select_uuid(subject);
            }
        }
        Ok(())
    }

    fn handle_filter_input(&mut self, key: KeyCode) -> Result<bool> {
        match key {
            KeyCode::Esc => self.state = AppState::TaskList,
            KeyCode::Enter => {
                self.state = AppState::TaskList;
                let text = self.filter_input.value.clone();
                self.view.set_filter(&text)?;
                self.selected = 0;
                self.status_message = match &self.view.filters().text {
                    Some(t) => format!(
                        "Filter '{t}' matches {} tasks",
                        self.view.current_tasks().len()
                    ),
                    None => "Text filter cleared".into(),
                };
            }
            other => {
                edit_input(&mut self.filter_input, other);
            }
        }
        Ok(false)
    }

    fn handle_form_input(&mut self, key: KeyCode) -> Result<bool> {
        match key {
            KeyCode::Esc => self.state = AppState::TaskList,
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Enter => {
                if self.task_form.is_edit() {
                    self.update_task()?;
                } else if self.task_form.is_last_field() {
                    self.create_task()?;
                } else {
                    self.task_form.next_field();
                }
            }
            other => {
                edit_input(self.task_form.active_input(), other);
            }
        }
        Ok(false)
    }

    fn create_task(&mut self) -> Result<()> {
        let request = self.task_form.add_request();
        let added = self.view.add_task(
            &request.description,
            request.project.as_deref(),
            &request.tags,
        );
        match added {
            Ok(task) => {
                self.state = AppState::TaskList;
                self.select_uuid(task.uuid);
                self.status_message = if self.view.position_of(task.uuid).is_some() {
                    format!("Added task {}", task.id)
                } else {
                    format!("Added task {} (hidden by filters)", task.id)
                };
                Ok(())
            }
            Err(Error::Validation(e)) => {
                self.status_message = e.to_string();
                self.task_form.current_field = DESCRIPTION_FIELD;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply the focused edit-form field. Rejected values leave the form open on
    /// that field with the reason on the status line.
    fn update_task(&mut self) -> Result<()> {
        let edit = self.task_form.current_edit();
        if edit == TaskEdit::default() {
            self.task_form.next_field();
            return Ok(());
        }
        let Some(uuid) = self.task_form.task else {
            return Ok(());
        };
        let Some(index) = self.view.position_of(uuid) else {
            self.status_message = "Task is no longer listed".into();
            self.state = AppState::TaskList;
            return Ok(());
        };

        let outcome = self.view.edit_task(index, edit)?;
        if outcome.warnings.is_empty() {
            self.task_form.mark_current_applied();
            let label = self.task_form.fields[self.task_form.current_field].label;
            let name = label.split(" (").next().unwrap_or(label);
            self.status_message = format!("Updated {name}");
            self.task_form.next_field();
        } else {
            self.status_message = outcome
                .warnings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
        }
        self.select_uuid(uuid);
        Ok(())
    }

    fn handle_confirm_input(&mut self, key: KeyCode) -> Result<bool> {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.state = AppState::TaskList;
                let index = self.target.take().and_then(|u| self.view.position_of(u));
                if let Some(index) = index {
                    if self.view.delete_task(index)? {
                        self.status_message = "Task deleted".into();
                    }
                }
                self.clamp_selection();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state = AppState::TaskList;
                self.target = None;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_help_input(&mut self, _key: KeyCode) -> Result<bool> {
        self.state = AppState::TaskList;
        Ok(false)
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let filters = self
            .view
            .filter_summary()
            .map(|s| format!(" | Filters: {s}"))
            .unwrap_or_default();
        let completed = if self.view.filters().show_completed {
            " | +completed"
        } else {
            ""
        };
        let text = format!(
            " Tsakarori | View: {}{filters}{completed} | Press '?' for help",
            self.mode.label()
        );
        f.render_widget(Paragraph::new(text).style(self.palette.header), area);
    }

    fn task_item(&self, task: &Task, meta: RowMeta, width: usize) -> ListItem<'static> {
        let style = if task.is_completed() {
            self.palette.normal.add_modifier(Modifier::DIM)
        } else {
            self.palette.normal
        };
        ListItem::new(task_line(task, meta, width)).style(style)
    }

    /// List rows for the current view, plus the visual position of the selected task.
    fn list_items(&self, width: usize) -> (Vec<ListItem<'static>>, Option<usize>) {
        let mut items = Vec::new();
        let mut visual = None;
        let (by, meta, prefix, none) = match self.mode {
            ViewMode::ByProject => (GroupBy::Project, RowMeta::WithoutProject, "Project", "No Project"),
            ViewMode::ByTag => (GroupBy::Tag, RowMeta::WithoutTags, "Tag", "No Tags"),
            ViewMode::All | ViewMode::Stats => {
                for task in self.view.current_tasks() {
                    items.push(self.task_item(task, RowMeta::Full, width));
                }
                if !items.is_empty() {
                    visual = Some(self.selected);
                }
                return (items, visual);
            }
        };

        let grouping = self.view.group(by);
        let heading_style = self.palette.highlight.add_modifier(Modifier::BOLD);
        let sections = grouping
            .groups
            .iter()
            .map(|g| (format!("{prefix}: {}", g.key), &g.tasks))
            .chain((!grouping.ungrouped.is_empty()).then(|| (none.to_string(), &grouping.ungrouped)));
        let mut row = 0;
        for (heading, tasks) in sections {
            items.push(ListItem::new(Line::from(Span::styled(heading, heading_style))));
            for task in tasks.iter() {
                if row == self.selected {
                    visual = Some(items.len());
                }
                items.push(self.task_item(task, meta, width));
                row += 1;
            }
        }
        (items, visual)
    }

    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let title = format!("Tasks ({})", self.view.current_tasks().len());
        let block = Block::default().borders(Borders::ALL).title(title);
        let (items, visual) = self.list_items(area.width.saturating_sub(4) as usize);
        if items.is_empty() {
            let message = if self.view.filters().is_filtered() {
                "No tasks match the current filters"
            } else {
                "No tasks"
            };
            f.render_widget(
                Paragraph::new(message).block(block).style(self.palette.normal),
                area,
            );
            return;
        }

        self.list_state.select(visual);
        let list = List::new(items)
            .block(block)
            .style(self.palette.normal)
            .highlight_style(self.palette.selected)
            .highlight_symbol("> ");
        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_task_detail(&self, f: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Task Details");
        let Some(task) = self.selected_task() else {
            f.render_widget(
                Paragraph::new("No task selected").block(block).style(self.palette.normal),
                area,
            );
            return;
        };

        let today = Local::now().date_naive();
        let label_style = self.palette.highlight.add_modifier(Modifier::BOLD);
        let label = |name: &str| Span::styled(format!("{name}: "), label_style);
        let field = |name: &str, value: String| Line::from(vec![label(name), Span::raw(value)]);
        let due = match task.due_date() {
            Some(_) => format!(
                "{} ({})",
                format_due(task.due_date()),
                format_due_relative(task.due_date(), today)
            ),
            None => "None".into(),
        };
        let tags = if task.tags.is_empty() {
            "None".into()
        } else {
            task.tags_display()
        };

        let mut lines = vec![
            field("ID", task.id.to_string()),
            field("Description", task.description.clone()),
            field("Status", task.status.to_string()),
            field("Project", task.project.clone().unwrap_or_else(|| "None".into())),
            field("Tags", tags),
            field("Urgency", format!("{:.2}", task.urgency)),
            field("Priority", format_priority(task.priority).into()),
            field("Due", due),
            Line::from(""),
            Line::from(label("Depends on")),
        ];
        if task.depends.is_empty() {
            lines.push(Line::from("  None"));
        }
        for uuid in &task.depends {
            let text = match self.view.find(*uuid) {
                Some(dep) => format!(
                    "  - {} [{}]{}",
                    dep.description,
                    dep.project.as_deref().unwrap_or("No Project"),
                    if dep.is_completed() { " (done)" } else { "" }
                ),
                None => format!("  - {uuid} (unknown)"),
            };
            lines.push(Line::from(text));
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .style(self.palette.normal)
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_stats(&self, f: &mut Frame, area: Rect) {
        let stats = self.view.stats();
        let heading = self.palette.highlight.add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(format!("Total pending tasks:   {}", stats.pending_total)),
            Line::from(format!("Total completed tasks: {}", stats.completed_total)),
            Line::from(format!("Number of projects:    {}", stats.projects.len())),
            Line::from(format!("Number of tags:        {}", stats.tags.len())),
            Line::from(""),
            Line::from(Span::styled("Projects:", heading)),
        ];
        lines.extend(stats.projects.iter().map(|p| Line::from(format!("  - {p}"))));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Tags:", heading)));
        lines.extend(stats.tags.iter().map(|t| Line::from(format!("  - {t}"))));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Statistics"))
            .style(self.palette.normal);
        f.render_widget(paragraph, area);
    }

    fn render_task_form(&self, f: &mut Frame, area: Rect) {
        let form = &self.task_form;
        let height = (form.fields.len() as u16 * 3 + 2).min(area.height);
        let popup = centered_fixed(64.min(area.width), height, area);
        f.render_widget(Clear, popup);

        let title = if form.is_edit() {
            "Edit Task (Enter applies field, Tab next, Esc close)"
        } else {
            "Add Task (Tab next, Enter on last field adds, Esc cancel)"
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(self.palette.normal);
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(form.fields.iter().map(|_| Constraint::Length(3)))
            .split(inner);
        for (i, (field, row)) in form.fields.iter().zip(rows.iter()).enumerate() {
            let focused = i == form.current_field;
            let border = if focused {
                self.palette.highlight
            } else {
                self.palette.normal
            };
            let marker = if field.is_dirty() { " *" } else { "" };
            let input = Paragraph::new(field.input.value.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(format!("{}{marker}", field.label)),
            );
            f.render_widget(input, *row);
            if focused {
                f.set_cursor_position((row.x + 1 + field.input.cursor as u16, row.y + 1));
            }
        }
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = self.palette.highlight.add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Task List:", bold)),
            Line::from("  j/k, Down/Up   Move selection"),
            Line::from("  v              Cycle view (all, by project, by tags, stats)"),
            Line::from("  a              Add task"),
            Line::from("  e              Edit selected task"),
            Line::from("  Space          Mark selected task done"),
            Line::from("  D              Delete selected task"),
            Line::from("  d              Add a dependency to the selected task"),
            Line::from("  p / t          Filter by project / tag"),
            Line::from("  f              Filter by text"),
            Line::from("  c              Clear filters"),
            Line::from("  T              Show or hide completed tasks"),
            Line::from("  s              Cycle color scheme"),
            Line::from("  r              Refresh"),
            Line::from("  q / Ctrl+C     Quit"),
            Line::from(""),
            Line::from(Span::styled("Forms:", bold)),
            Line::from("  Tab / Shift+Tab  Next / previous field"),
            Line::from("  Enter            Add: next field, adds on the last one"),
            Line::from("                   Edit: apply the focused field"),
            Line::from("  Esc              Close"),
            Line::from(""),
            Line::from("Priority is H, M or L. Due dates are YYYY-MM-DD."),
        ];

        let popup = centered_rect(70, 80, area);
        f.render_widget(Clear, popup);
        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .style(self.palette.normal)
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, popup);
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let popup = centered_fixed(50.min(area.width), 9.min(area.height), area);
        f.render_widget(Clear, popup);
        let description = self
            .target
            .and_then(|u| self.view.find(u))
            .map(|t| format!("#{} {}", t.id, t.description))
            .unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Delete this task?",
                self.palette.highlight.add_modifier(Modifier::BOLD),
            )),
            Line::from(description),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(Block::default().title("Confirm Delete").borders(Borders::ALL))
            .style(self.palette.normal)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, popup);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        if self.state == AppState::FilterPrompt {
            let text = format!("{FILTER_PROMPT}{}", self.filter_input.value);
            f.render_widget(Paragraph::new(text).style(self.palette.normal), area);
            let x = area.x + FILTER_PROMPT.len() as u16 + self.filter_input.cursor as u16;
            f.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
            return;
        }
        let text = if self.status_message.is_empty() {
            format!(" {} tasks shown", self.view.current_tasks().len())
        } else {
            format!(" {}", self.status_message)
        };
        f.render_widget(Paragraph::new(text).style(self.palette.normal), area);
    }

    fn render(&mut self, f: &mut Frame) {
        let area = f.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(f, chunks[0]);
        if self.mode == ViewMode::Stats {
            self.render_stats(f, chunks[1]);
        } else {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);
            self.render_task_list(f, body[0]);
            self.render_task_detail(f, body[1]);
        }
        self.render_status_bar(f, chunks[2]);
        f.render_widget(Paragraph::new(FOOTER).style(self.palette.footer), chunks[3]);

        match self.state {
            AppState::AddTask | AppState::EditTask => self.render_task_form(f, chunks[1]),
            AppState::Picker => {
                if let Some(picker) = self.picker.as_mut() {
                    picker.render(f, chunks[1], &self.palette);
                }
            }
            AppState::Help => self.render_help(f, area),
            AppState::Confirm => self.render_confirm(f, chunks[1]),
            AppState::TaskList | AppState::FilterPrompt => {}
        }
    }

    /// Main event loop. Returns when the user quits.
    pub fn run<T: TermBackend>(&mut self, terminal: &mut Terminal<T>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FileBackend;
    use crate::fields::Priority;
    use crate::task::split_tags;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    fn task(description: &str, project: Option<&str>, tags: &str, urgency: f64) -> Task {
        let mut t = Task::new(Uuid::new_v4(), description);
        t.project = project.map(str::to_string);
        t.tags = split_tags(tags);
        t.urgency = urgency;
        t
    }

    fn app_with(tasks: Vec<Task>) -> App<FileBackend> {
        let view = TaskView::new(FileBackend::with_tasks(tasks)).unwrap();
        App::new(view, Config::default(), None)
    }

    fn sample_app() -> App<FileBackend> {
        app_with(vec![
            task("Write report", Some("Work"), "docs", 5.0),
            task("Buy milk", None, "home", 3.0),
            task("Plan trip", Some("Home"), "", 1.0),
        ])
    }

    fn press(app: &mut App<FileBackend>, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App<FileBackend>, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn screen(app: &mut App<FileBackend>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn quit_keys() {
        let mut app = sample_app();
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn selection_is_clamped() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_task().unwrap().description, "Write report");
        for _ in 0..5 {
            press(&mut app, KeyCode::Char('j'));
        }
        assert_eq!(app.selected_task().unwrap().description, "Plan trip");
    }

    #[test]
    fn add_task_through_form() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state(), AppState::AddTask);
        type_str(&mut app, "Call mom");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "family, phone");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.view().current_tasks().len(), 4);
        let added = app.selected_task().unwrap();
        assert_eq!(added.description, "Call mom");
        assert_eq!(added.tags_display(), "family,phone");
        assert!(app.status_message().starts_with("Added task"));
    }

    #[test]
    fn blank_description_keeps_form_open() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state(), AppState::AddTask);
        assert_eq!(app.status_message(), "task description cannot be empty");
        assert_eq!(app.view().current_tasks().len(), 3);
    }

    #[test]
    fn edit_rejects_bad_priority_then_accepts_good_one() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state(), AppState::EditTask);
        for _ in 0..3 {
            press(&mut app, KeyCode::Tab);
        }
        type_str(&mut app, "X");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state(), AppState::EditTask);
        assert!(app.status_message().contains("invalid priority 'X'"));
        assert_eq!(app.view().current_tasks()[0].priority, None);

        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "h");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status_message(), "Updated Priority");
        let t = app.view().current_tasks().iter().find(|t| t.description == "Write report");
        assert_eq!(t.unwrap().priority, Some(Priority::High));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state(), AppState::TaskList);
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('D'));
        assert_eq!(app.state(), AppState::Confirm);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.view().current_tasks().len(), 3);

        press(&mut app, KeyCode::Char('D'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.view().current_tasks().len(), 2);
        assert!(app
            .view()
            .current_tasks()
            .iter()
            .all(|t| t.description != "Write report"));
    }

    #[test]
    fn dependency_picker_adds_dependency() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state(), AppState::Picker);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);

        let report = app.selected_task().unwrap();
        assert_eq!(report.description, "Write report");
        let deps: Vec<_> = report
            .depends
            .iter()
            .filter_map(|u| app.view().find(*u))
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(deps, ["Plan trip"]);
    }

    #[test]
    fn grouped_view_acts_on_the_highlighted_task() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('v'));
        assert_eq!(app.mode(), ViewMode::ByProject);
        // Groups: Home (Plan trip), Work (Write report), then No Project (Buy milk).
        assert_eq!(app.selected_task().unwrap().description, "Plan trip");
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.status_message(), "Completed: Plan trip");
        assert!(app
            .view()
            .current_tasks()
            .iter()
            .all(|t| t.description != "Plan trip"));
        assert_eq!(app.view().current_tasks().len(), 2);
    }

    #[test]
    fn text_filter_prompt() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.state(), AppState::FilterPrompt);
        type_str(&mut app, "MILK");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view().current_tasks().len(), 1);
        assert_eq!(app.status_message(), "Filter 'MILK' matches 1 tasks");

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view().current_tasks().len(), 3);
    }

    #[test]
    fn project_picker_sets_filter() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view().filters().project.as_deref(), Some("Home"));
        assert_eq!(app.view().current_tasks().len(), 1);
    }

    #[test]
    fn empty_pickers_are_not_opened() {
        let mut app = app_with(vec![task("Lonely", None, "", 0.0)]);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.status_message(), "No tags");
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.status_message(), "No other tasks to depend on");
    }

    #[test]
    fn color_scheme_cycles_without_config_file() {
        let mut app = sample_app();
        let before = app.config().color_scheme.clone();
        press(&mut app, KeyCode::Char('s'));
        assert_ne!(app.config().color_scheme, before);
        assert!(app.status_message().starts_with("Color scheme: "));
    }

    #[test]
    fn renders_header_list_and_details() {
        let mut app = sample_app();
        let text = screen(&mut app);
        assert!(text.contains("Tsakarori | View: all"));
        assert!(text.contains("Write report"));
        assert!(text.contains("Task Details"));
        assert!(text.contains("Depends on"));
    }

    #[test]
    fn renders_grouped_and_stats_views() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('v'));
        press(&mut app, KeyCode::Char('v'));
        let text = screen(&mut app);
        assert!(text.contains("View: by_tags"));
        assert!(text.contains("Tag: docs"));
        assert!(text.contains("No Tags"));

        press(&mut app, KeyCode::Char('v'));
        let text = screen(&mut app);
        assert!(text.contains("Total pending tasks:   3"));
        assert!(text.contains("Number of projects:    2"));
    }
}
