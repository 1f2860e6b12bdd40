use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph};

use super::utils::{draw_error, draw_loading, panel, truncate};
use crate::api::{ApiError, StoryListing};
use crate::loadable::{handle_loadable, Loadable};

pub const SHORTCUTS: &[(&str, &str)] = &[
  ("n", "new story"),
  ("d", "delete"),
  ("r", "reload"),
  ("q", "quit"),
];

enum Body<'a> {
  Loading,
  Ready(&'a [StoryListing]),
  Failed(&'a ApiError),
}

pub fn draw_story_list(
  frame: &mut Frame,
  area: Rect,
  stories: &Loadable<Vec<StoryListing>>,
  selected: usize,
) {
  let body = handle_loadable(
    stories,
    || Body::Loading,
    |list| Body::Ready(list),
    Body::Failed,
  );

  let stories = match body {
    Body::Loading => return draw_loading(frame, area, panel(" Stories ".into()), "stories"),
    Body::Failed(err) => return draw_error(frame, area, panel(" Stories ".into()), err, "r"),
    Body::Ready(stories) => stories,
  };

  let block = panel(format!(" Stories ({}) ", stories.len()));
  if stories.is_empty() {
    let paragraph = Paragraph::new("No stories yet. Press 'n' to create one.")
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let items: Vec<ListItem> = stories
    .iter()
    .map(|story| {
      ListItem::new(Line::from(vec![
        Span::styled(format!("{:>4}", story.id), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(
          story.created_at.format("%Y-%m-%d").to_string(),
          Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::raw(truncate(&story.title, 60)),
      ]))
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(Some(selected.min(stories.len() - 1)));

  frame.render_stateful_widget(list, area, &mut state);
}
