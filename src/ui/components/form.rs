use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::ui::renderfns::centered;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  /// Free text; must be non-blank when `required`
  Text { required: bool },
  /// Required non-negative amount
  Money,
}

#[derive(Debug, Clone)]
pub struct FormField {
  label: &'static str,
  kind: FieldKind,
  input: TextInput,
}

impl FormField {
  /// Required text field
  pub fn text(label: &'static str) -> Self {
    Self {
      label,
      kind: FieldKind::Text { required: true },
      input: TextInput::new(),
    }
  }

  /// Optional text field; blank submits as `None`
  pub fn optional(label: &'static str) -> Self {
    Self {
      label,
      kind: FieldKind::Text { required: false },
      input: TextInput::new(),
    }
  }

  pub fn money(label: &'static str) -> Self {
    Self {
      label,
      kind: FieldKind::Money,
      input: TextInput::new(),
    }
  }

  pub fn with_value(mut self, value: &str) -> Self {
    self.input = TextInput::with_value(value);
    self
  }

  fn parse(&self) -> Result<FieldValue, String> {
    let raw = self.input.value().trim();
    match self.kind {
      FieldKind::Text { required: true } if raw.is_empty() => {
        Err(format!("{} is required", self.label))
      }
      FieldKind::Text { required: true } => Ok(FieldValue::Text(raw.to_string())),
      FieldKind::Text { required: false } => Ok(FieldValue::Optional(
        (!raw.is_empty()).then(|| raw.to_string()),
      )),
      FieldKind::Money if raw.is_empty() => Err(format!("{} is required", self.label)),
      FieldKind::Money => match raw.replace(',', "").parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(FieldValue::Money(amount)),
        _ => Err(format!("{} must be a non-negative number", self.label)),
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
  Text(String),
  Optional(Option<String>),
  Money(f64),
}

/// Validated values, in field order
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues(Vec<FieldValue>);

impl FormValues {
  pub fn text(&self, idx: usize) -> String {
    match self.0.get(idx) {
      Some(FieldValue::Text(s)) => s.clone(),
      Some(FieldValue::Optional(s)) => s.clone().unwrap_or_default(),
      _ => String::new(),
    }
  }

  pub fn optional_text(&self, idx: usize) -> Option<String> {
    match self.0.get(idx) {
      Some(FieldValue::Optional(s)) => s.clone(),
      Some(FieldValue::Text(s)) => Some(s.clone()),
      _ => None,
    }
  }

  pub fn money(&self, idx: usize) -> f64 {
    match self.0.get(idx) {
      Some(FieldValue::Money(amount)) => *amount,
      _ => 0.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
  Submitted(FormValues),
  Cancelled,
}

/// Modal add/edit form. Stays open until the owner closes it, so a failed
/// save keeps the user's entries.
#[derive(Debug, Clone, Default)]
pub struct FormModal {
  active: bool,
  title: String,
  fields: Vec<FormField>,
  focus: usize,
  pending: bool,
  error: Option<String>,
  /// Bumped on every `open`, so owners can tell one opening from the next
  generation: u64,
}

impl FormModal {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn open(&mut self, title: impl Into<String>, fields: Vec<FormField>) {
    self.generation += 1;
    self.active = true;
    self.title = title.into();
    self.fields = fields;
    self.focus = 0;
    self.pending = false;
    self.error = None;
  }

  pub fn close(&mut self) {
    *self = Self {
      generation: self.generation,
      ..Self::default()
    };
  }

  /// Identifies the current opening; only meaningful while active
  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// While pending, submit is ignored and "Saving..." is shown
  pub fn set_pending(&mut self, pending: bool) {
    self.pending = pending;
    if pending {
      self.error = None;
    }
  }

  pub fn set_error(&mut self, error: impl Into<String>) {
    self.pending = false;
    self.error = Some(error.into());
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  fn validate(&self) -> Result<FormValues, String> {
    self
      .fields
      .iter()
      .map(FormField::parse)
      .collect::<Result<Vec<_>, _>>()
      .map(FormValues)
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.close();
        return KeyResult::Event(FormEvent::Cancelled);
      }
      KeyCode::Tab | KeyCode::Down => {
        if !self.fields.is_empty() {
          self.focus = (self.focus + 1) % self.fields.len();
        }
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        if !self.fields.is_empty() {
          self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
        return KeyResult::Handled;
      }
      KeyCode::Enter => {
        if self.pending {
          return KeyResult::Handled;
        }
        return match self.validate() {
          Ok(values) => KeyResult::Event(FormEvent::Submitted(values)),
          Err(message) => {
            self.error = Some(message);
            KeyResult::Handled
          }
        };
      }
      _ => {}
    }

    if self.pending {
      return KeyResult::Handled;
    }
    if let Some(field) = self.fields.get_mut(self.focus) {
      if field.input.handle_key(key) == InputResult::Consumed {
        self.error = None;
      }
    }
    KeyResult::Handled
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let label_width = self.fields.iter().map(|f| f.label.len()).max().unwrap_or(0);
    // fields + blank + status + hint + borders
    let height = self.fields.len() as u16 + 5;
    let overlay_area = centered(area, 64, height);

    frame.render_widget(Clear, overlay_area);
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    let mut lines: Vec<Line> = self
      .fields
      .iter()
      .enumerate()
      .map(|(i, field)| {
        let focused = i == self.focus;
        let label_style = if focused {
          Style::default().fg(Color::Yellow).bold()
        } else {
          Style::default().fg(Color::Cyan)
        };
        let marker = match field.kind {
          FieldKind::Text { required: false } => " ",
          _ => "*",
        };
        let mut spans = vec![
          Span::styled(
            format!("{}{:<width$} ", marker, field.label, width = label_width),
            label_style,
          ),
          Span::raw(field.input.value().to_string()),
        ];
        if focused {
          spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        }
        Line::from(spans)
      })
      .collect();

    lines.push(Line::raw(""));
    lines.push(if self.pending {
      Line::styled("Saving...", Style::default().fg(Color::Yellow))
    } else if let Some(error) = &self.error {
      Line::styled(error.clone(), Style::default().fg(Color::Red))
    } else {
      Line::raw("")
    });
    lines.push(Line::styled(
      "Tab next  Enter save  Esc cancel",
      Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
  }
}
