use super::KeyResult;
use crate::ui::renderfns::centered;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmEvent {
  Confirmed,
  Cancelled,
}

/// Yes/no prompt for destructive actions. Like the form, it stays open until
/// the owner closes it after the action succeeds.
#[derive(Debug, Clone, Default)]
pub struct ConfirmDialog {
  active: bool,
  title: String,
  message: String,
  /// Shown in place of the y/n hint while the action runs
  pending_label: String,
  pending: bool,
  error: Option<String>,
  generation: u64,
}

impl ConfirmDialog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn open(
    &mut self,
    title: impl Into<String>,
    message: impl Into<String>,
    pending_label: impl Into<String>,
  ) {
    self.generation += 1;
    self.active = true;
    self.title = title.into();
    self.message = message.into();
    self.pending_label = pending_label.into();
    self.pending = false;
    self.error = None;
  }

  pub fn close(&mut self) {
    *self = Self {
      generation: self.generation,
      ..Self::default()
    };
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

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

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ConfirmEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Char('y') | KeyCode::Enter if !self.pending => {
        KeyResult::Event(ConfirmEvent::Confirmed)
      }
      KeyCode::Char('n') | KeyCode::Esc => {
        self.close();
        KeyResult::Event(ConfirmEvent::Cancelled)
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let overlay_area = centered(area, 56, 7);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(format!(" {} ", self.title));

    let status = if self.pending {
      Line::styled(self.pending_label.clone(), Style::default().fg(Color::Yellow))
    } else if let Some(error) = &self.error {
      Line::styled(error.clone(), Style::default().fg(Color::Red))
    } else {
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" delete   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
      ])
    };

    let text = vec![Line::raw(self.message.clone()), Line::raw(""), status];
    frame.render_widget(
      Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
      overlay_area,
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_confirm_keeps_dialog_open() {
    let mut dialog = ConfirmDialog::new();
    dialog.open("Delete project", "Delete Bridge?", "Deleting...");

    assert_eq!(
      dialog.handle_key(key(KeyCode::Char('y'))),
      KeyResult::Event(ConfirmEvent::Confirmed)
    );
    assert!(dialog.is_active());
  }

  #[test]
  fn test_pending_ignores_confirm() {
    let mut dialog = ConfirmDialog::new();
    dialog.open("Delete project", "Delete Bridge?", "Deleting...");
    dialog.set_pending(true);

    assert_eq!(dialog.handle_key(key(KeyCode::Enter)), KeyResult::Handled);

    dialog.set_error("Failed to delete job");
    assert_eq!(
      dialog.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(ConfirmEvent::Confirmed)
    );
  }

  #[test]
  fn test_cancel_closes() {
    let mut dialog = ConfirmDialog::new();
    dialog.open("Delete employee", "Delete Ana?", "Deleting...");

    assert_eq!(
      dialog.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(ConfirmEvent::Cancelled)
    );
    assert!(!dialog.is_active());
  }

  #[test]
  fn test_reopen_bumps_generation() {
    let mut dialog = ConfirmDialog::new();
    dialog.open("Remove employee", "Remove Ana?", "Removing...");
    let first = dialog.generation();
    dialog.set_pending(true);
    assert_eq!(dialog.pending_label, "Removing...");

    dialog.close();
    assert_eq!(dialog.generation(), first);
    dialog.open("Remove employee", "Remove Ben?", "Removing...");
    assert_ne!(dialog.generation(), first);
    assert!(!dialog.pending);
  }
}
