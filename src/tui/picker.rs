//! Popup list for choosing a project, a tag or a dependency.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};
use ratatui::Frame;
use uuid::Uuid;

use crate::tui::colors::Palette;
use crate::tui::enums::PickerKind;
use crate::tui::utils::centered_fixed;

#[derive(Clone, Debug, PartialEq)]
pub struct PickerItem {
    pub label: String,
    /// Filter value for project/tag pickers.
    pub value: String,
    /// Target task for the dependency picker.
    pub uuid: Option<Uuid>,
}

impl PickerItem {
    pub fn value(value: &str) -> Self {
        PickerItem {
            label: value.to_string(),
            value: value.to_string(),
            uuid: None,
        }
    }

    pub fn task(label: String, uuid: Uuid) -> Self {
        PickerItem {
            label,
            value: String::new(),
            uuid: Some(uuid),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Picker {
    pub kind: PickerKind,
    pub title: String,
    pub items: Vec<PickerItem>,
    pub state: ListState,
}

impl Picker {
    /// `None` when there is nothing to choose from.
    pub fn new(kind: PickerKind, title: &str, items: Vec<PickerItem>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        let mut state = ListState::default();
        state.select(Some(0));
        Some(Picker {
            kind,
            title: title.to_string(),
            items,
            state,
        })
    }

    /// Move the highlight, wrapping at both ends.
    pub fn move_by(&mut self, delta: isize) {
        let len = self.items.len() as isize;
        let cur = self.state.selected().unwrap_or(0) as isize;
        self.state.select(Some((cur + delta).rem_euclid(len) as usize));
    }

    pub fn selected(&self) -> Option<&PickerItem> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, palette: &Palette) {
        let height = (self.items.len() as u16 + 2).min(area.height);
        let width = 44.min(area.width);
        let popup = centered_fixed(width, height, area);
        f.render_widget(Clear, popup);

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|i| ListItem::new(i.label.clone()))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{} (Enter select, Esc cancel)", self.title)),
            )
            .style(palette.normal)
            .highlight_style(palette.selected.add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        f.render_stateful_widget(list, popup, &mut self.state);
    }
}
