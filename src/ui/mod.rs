mod editor;
mod header;
pub mod input;
mod stories;
mod utils;

use crate::api::StoryApi;
use crate::app::{App, Mode, Screen};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Main draw function
pub fn draw<A: StoryApi + Clone>(frame: &mut Frame, app: &App<A>) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  match app.screen() {
    Screen::Stories { selected } => {
      header::draw_header(frame, chunks[0], "Stories", stories::SHORTCUTS);
      stories::draw_story_list(frame, chunks[1], &app.controller().stories(), *selected);
    }
    Screen::Editor {
      story_id,
      selected,
      open_page,
    } => {
      let title = app
        .story_info(*story_id)
        .map(|info| info.title)
        .unwrap_or_else(|| format!("Story {}", story_id));
      header::draw_header(frame, chunks[0], &title, editor::SHORTCUTS);

      let story = app.controller().story();
      let pages = app.story_pages(*story_id);
      let open = open_page.map(|id| app.controller().page(id));
      editor::draw_editor(
        frame,
        chunks[1],
        *story_id,
        &story,
        &pages,
        *selected,
        open.as_ref(),
      );
    }
  }

  draw_status_bar(frame, chunks[2], app);
}

fn draw_status_bar<A: StoryApi + Clone>(frame: &mut Frame, area: Rect, app: &App<A>) {
  match app.mode() {
    Mode::Input { prompt, input } => {
      let label = format!(" {}: ", prompt.label());
      let cursor_x = area.x + (label.chars().count() + input.cursor_position()) as u16;
      let line = Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Yellow)),
        Span::raw(input.value()),
      ]);
      frame.render_widget(Paragraph::new(line), area);
      frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(1)), area.y));
    }
    Mode::Normal => {
      let (content, style) = match app.notice() {
        Some(notice) if notice.starts_with("Error") => {
          (format!(" {}", notice), Style::default().fg(Color::Red))
        }
        Some(notice) => (format!(" {}", notice), Style::default().fg(Color::Green)),
        None => (
          " j/k:nav  Enter:open  q:back  Ctrl-C:quit".to_string(),
          Style::default().fg(Color::DarkGray),
        ),
      };
      frame.render_widget(Paragraph::new(content).style(style), area);
    }
  }
}
