use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::api::{ApiError, ApiErrorKind};

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Bordered block with the app's default styling
pub fn panel(title: String) -> Block<'static> {
  Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue))
}

pub fn draw_loading(frame: &mut Frame, area: Rect, block: Block<'_>, what: &str) {
  let paragraph = Paragraph::new(format!("Loading {}...", what))
    .block(block)
    .style(Style::default().fg(Color::DarkGray));
  frame.render_widget(paragraph, area);
}

pub fn draw_error(frame: &mut Frame, area: Rect, block: Block<'_>, error: &ApiError, retry_key: &str) {
  let paragraph = Paragraph::new(format!("Error: {}\n\n{}", error, error_hint(error, retry_key)))
    .block(block)
    .style(Style::default().fg(Color::Red))
    .wrap(Wrap { trim: false });
  frame.render_widget(paragraph, area);
}

/// Retrying a missing resource cannot help, so point back instead.
fn error_hint(error: &ApiError, retry_key: &str) -> String {
  match error.kind {
    ApiErrorKind::NotFound => "Press 'q' to go back.".to_string(),
    _ => format!("Press '{}' to retry.", retry_key),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_error_hint() {
    assert_eq!(
      error_hint(&ApiError::storage("disk full"), "r"),
      "Press 'r' to retry."
    );
    assert_eq!(
      error_hint(&ApiError::not_found("Page 3 not found"), "r"),
      "Press 'q' to go back."
    );
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("ééééééé", 5), "éé...");
  }
}
