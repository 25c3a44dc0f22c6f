//! Status bar surface driven by the modes.
//!
//! Each mode creates its [`StatusItem`]s up front, shows them while it is
//! active and hides them again on deactivation. The bar renders the visible
//! items right-aligned, highest priority first:
//!
//! `                         [Records] | Max: L120, C64 | Ln 12, Col 5`

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const SEPARATOR: &str = " | ";

/// How an item should stand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusTone {
    #[default]
    Normal,
    Warning,
    Error,
}

impl StatusTone {
    fn style(self) -> Style {
        match self {
            StatusTone::Normal => Style::default(),
            StatusTone::Warning => Style::default().fg(Color::Yellow),
            StatusTone::Error => Style::default().fg(Color::Red),
        }
    }
}

#[derive(Debug, Clone)]
struct ItemState {
    id: usize,
    priority: i32,
    text: String,
    tooltip: Option<String>,
    command: Option<String>,
    tone: StatusTone,
    visible: bool,
}

/// Shared handle to the host's status bar.
#[derive(Debug, Clone, Default)]
pub struct StatusBar {
    items: Rc<RefCell<Vec<ItemState>>>,
    next_id: Rc<Cell<usize>>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hidden, empty item. Higher `priority` is placed further left.
    pub fn create_item(&self, priority: i32) -> StatusItem {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.items.borrow_mut().push(ItemState {
            id,
            priority,
            text: String::new(),
            tooltip: None,
            command: None,
            tone: StatusTone::Normal,
            visible: false,
        });
        StatusItem {
            id,
            bar: self.clone(),
        }
    }

    /// Visible items as `(text, tone)`, in display order.
    pub fn visible(&self) -> Vec<(String, StatusTone)> {
        let items = self.items.borrow();
        let mut visible: Vec<&ItemState> = items
            .iter()
            .filter(|item| item.visible && !item.text.is_empty())
            .collect();
        // Stable sort keeps creation order between equal priorities.
        visible.sort_by(|a, b| b.priority.cmp(&a.priority));
        visible
            .into_iter()
            .map(|item| (item.text.clone(), item.tone))
            .collect()
    }

    /// Texts of the visible items, in display order.
    pub fn visible_texts(&self) -> Vec<String> {
        self.visible().into_iter().map(|(text, _)| text).collect()
    }

    /// Command bound to the visible item whose text is `text`, if any.
    pub fn command_for(&self, text: &str) -> Option<String> {
        self.items
            .borrow()
            .iter()
            .find(|item| item.visible && item.text == text)
            .and_then(|item| item.command.clone())
    }

    /// Renders the bar into one row of `buf`.
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        for (idx, (text, tone)) in self.visible().into_iter().enumerate() {
            if idx > 0 {
                spans.push(Span::raw(SEPARATOR));
            }
            spans.push(Span::styled(text, tone.style()));
        }

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Right)
            .render(area, buf);
    }

    /// Renders the bar into a plain string exactly `width` cells wide.
    pub fn render_line(&self, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        self.render(area, &mut buf);
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    fn with_item<R>(&self, id: usize, f: impl FnOnce(&mut ItemState) -> R) -> Option<R> {
        self.items
            .borrow_mut()
            .iter_mut()
            .find(|item| item.id == id)
            .map(f)
    }

    fn remove(&self, id: usize) {
        self.items.borrow_mut().retain(|item| item.id != id);
    }
}

/// One entry in the [`StatusBar`]. Removed from the bar when dropped.
#[derive(Debug)]
pub struct StatusItem {
    id: usize,
    bar: StatusBar,
}

impl StatusItem {
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.bar.with_item(self.id, |item| item.text = text);
    }

    pub fn text(&self) -> String {
        self.bar
            .with_item(self.id, |item| item.text.clone())
            .unwrap_or_default()
    }

    pub fn set_tooltip(&self, tooltip: impl Into<String>) {
        let tooltip = tooltip.into();
        self.bar.with_item(self.id, |item| item.tooltip = Some(tooltip));
    }

    pub fn tooltip(&self) -> Option<String> {
        self.bar
            .with_item(self.id, |item| item.tooltip.clone())
            .flatten()
    }

    /// Command the host should run when the item is clicked.
    pub fn set_command(&self, command: impl Into<String>) {
        let command = command.into();
        self.bar.with_item(self.id, |item| item.command = Some(command));
    }

    pub fn set_tone(&self, tone: StatusTone) {
        self.bar.with_item(self.id, |item| item.tone = tone);
    }

    pub fn show(&self) {
        self.bar.with_item(self.id, |item| item.visible = true);
    }

    pub fn hide(&self) {
        self.bar.with_item(self.id, |item| item.visible = false);
    }

    pub fn is_visible(&self) -> bool {
        self.bar
            .with_item(self.id, |item| item.visible)
            .unwrap_or(false)
    }
}

impl Drop for StatusItem {
    fn drop(&mut self) {
        self.bar.remove(self.id);
    }
}
