use super::KeyResult;
use crate::ui::renderfns::centered;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Events emitted by the picker that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent<T> {
  Selected(T),
  Cancelled,
}

/// Modal list picker over labelled values
#[derive(Debug, Clone)]
pub struct Picker<T> {
  active: bool,
  title: String,
  items: Vec<(T, String)>,
  selected: usize,
  empty_message: &'static str,
}

impl<T> Default for Picker<T> {
  fn default() -> Self {
    Self {
      active: false,
      title: String::new(),
      items: Vec::new(),
      selected: 0,
      empty_message: "Nothing to choose from.",
    }
  }
}

impl<T: Clone> Picker<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Message shown when the item list is empty
  pub fn set_empty_message(&mut self, message: &'static str) {
    self.empty_message = message;
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn show(&mut self, title: impl Into<String>, items: Vec<(T, String)>) {
    self.active = true;
    self.title = title.into();
    self.items = items;
    self.selected = 0;
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.items.clear();
    self.selected = 0;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PickerEvent<T>> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(PickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let event = match self.items.get(self.selected) {
          Some((value, _)) => PickerEvent::Selected(value.clone()),
          None => PickerEvent::Cancelled,
        };
        self.hide();
        KeyResult::Event(event)
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.items.is_empty() {
          self.selected = (self.selected + 1) % self.items.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.items.is_empty() {
          self.selected = (self.selected + self.items.len() - 1) % self.items.len();
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let max_label_len = self
      .items
      .iter()
      .map(|(_, label)| label.chars().count())
      .chain([self.title.chars().count(), self.empty_message.len()])
      .max()
      .unwrap_or(10);
    let width = (max_label_len as u16 + 6).max(24);
    let height = (self.items.len().max(1) as u16 + 2).min(area.height.saturating_sub(4)).max(3);
    let overlay_area = centered(area, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    if self.items.is_empty() {
      let paragraph = Paragraph::new(self.empty_message)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, overlay_area);
      return;
    }

    let items: Vec<ListItem> = self
      .items
      .iter()
      .map(|(_, label)| ListItem::new(Span::styled(label.clone(), Style::default().fg(Color::Cyan))))
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, overlay_area, &mut state);
  }
}
