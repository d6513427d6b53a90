pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::api::ApiError;
use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, ListState, Paragraph, Wrap};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Breadcrumb
    ])
    .split(frame.area());

  let shortcuts = app.current_view().map(|v| v.shortcuts()).unwrap_or_default();
  renderfns::draw_header(frame, chunks[0], app.title(), app.api_host(), &shortcuts);

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }
  app.command_input().render_overlay(frame, chunks[1]);

  renderfns::draw_footer(frame, chunks[2], &app.breadcrumb());
}

/// Keep the list selection inside `len` items
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

/// Bordered block for a list screen, with its count or fetch state in the title
pub fn list_block(title: &str, count: Option<usize>, is_fetching: bool) -> Block<'static> {
  let title = match (count, is_fetching) {
    (None, _) => format!(" {} ", title),
    (Some(_), true) => format!(" {} (refreshing...) ", title),
    (Some(n), false) => format!(" {} ({}) ", title, n),
  };
  Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue))
}

/// Render a dimmed message in place of a list
pub fn render_placeholder(frame: &mut Frame, area: Rect, block: Block, message: &str) {
  let paragraph = Paragraph::new(message)
    .block(block)
    .wrap(Wrap { trim: true })
    .style(Style::default().fg(Color::DarkGray));
  frame.render_widget(paragraph, area);
}

/// Split off a one-line error row under `area` when there is an error to show.
/// Returns the remaining area.
pub fn render_error_line(frame: &mut Frame, area: Rect, error: Option<&ApiError>) -> Rect {
  let Some(error) = error else {
    return area;
  };
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Min(1), Constraint::Length(1)])
    .split(area);
  let line = Line::styled(
    format!(" {} (r to retry)", error),
    Style::default().fg(Color::Red),
  );
  frame.render_widget(Paragraph::new(line), chunks[1]);
  chunks[0]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_selection_clamped_after_shrink() {
    let mut state = ListState::default();
    state.select(Some(4));
    ensure_valid_selection(&mut state, 2);
    assert_eq!(state.selected(), Some(1));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);

    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));
  }
}
