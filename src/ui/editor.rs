use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};

use super::utils::{draw_error, draw_loading, panel, truncate};
use crate::api::{Page, StoryId, StoryInfo};
use crate::loadable::{LoadState, Loadable};

pub const SHORTCUTS: &[(&str, &str)] = &[
  ("a", "add page"),
  ("c", "choice to selected"),
  ("1-9", "follow choice"),
  ("e", "edit name"),
  ("b", "edit body"),
  ("r", "refresh page"),
  ("R", "reload story"),
  ("q", "back"),
];

/// Story editor: page list on the left, open page on the right.
pub fn draw_editor(
  frame: &mut Frame,
  area: Rect,
  story_id: StoryId,
  story: &Loadable<StoryInfo>,
  pages: &[Page],
  selected: usize,
  open_page: Option<&Loadable<Page>>,
) {
  // The story slot decides what the whole screen shows. A slot still holding
  // the previously opened story counts as loading.
  match &story.state {
    LoadState::Loaded(Ok(info)) if info.id == story_id => {}
    LoadState::Loaded(Err(err)) => {
      return draw_error(frame, area, panel(" Story ".into()), err, "R");
    }
    _ => {
      return draw_loading(frame, area, panel(" Story ".into()), "story");
    }
  }

  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
    .split(area);

  draw_page_list(frame, chunks[0], story.value(), pages, selected);

  match open_page {
    Some(page) => draw_page_card(frame, chunks[1], page, pages),
    None => {
      let paragraph = Paragraph::new("Select a page and press Enter.")
        .block(panel(" Page ".into()))
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, chunks[1]);
    }
  }
}

fn draw_page_list(
  frame: &mut Frame,
  area: Rect,
  info: Option<&StoryInfo>,
  pages: &[Page],
  selected: usize,
) {
  let start_page = info.and_then(|i| i.start_page);
  let items: Vec<ListItem> = pages
    .iter()
    .map(|page| {
      let marker = if Some(page.id) == start_page { "*" } else { " " };
      ListItem::new(Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::raw(truncate(&page.name, 30)),
      ]))
    })
    .collect();

  let list = List::new(items)
    .block(panel(format!(" Pages ({}) ", pages.len())))
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  if !pages.is_empty() {
    state.select(Some(selected.min(pages.len() - 1)));
  }
  frame.render_stateful_widget(list, area, &mut state);
}

fn draw_page_card(frame: &mut Frame, area: Rect, page: &Loadable<Page>, pages: &[Page]) {
  let page_value = match &page.state {
    LoadState::NotLoaded | LoadState::Loading => {
      return draw_loading(frame, area, panel(" Page ".into()), "page");
    }
    LoadState::Loaded(Err(err)) => {
      return draw_error(frame, area, panel(" Page ".into()), err, "r");
    }
    LoadState::Loaded(Ok(value)) => value,
  };

  let title = if page.is_dirty {
    format!(" {} (stale) ", page_value.name)
  } else {
    format!(" {} ", page_value.name)
  };

  let mut body = if page_value.body.is_empty() {
    Text::styled("(empty - press 'b' to write)", Style::default().fg(Color::DarkGray))
  } else {
    Text::raw(page_value.body.as_str())
  };

  if !page_value.choices.is_empty() {
    body.push_line(Line::raw(""));
    body.push_line(Line::styled("Choices", Style::default().fg(Color::Yellow).bold()));
  }
  for (index, choice) in page_value.choices.iter().enumerate() {
    let target = choice
      .target_page
      .and_then(|id| pages.iter().find(|p| p.id == id))
      .map_or("(missing page)", |p| p.name.as_str());
    body.push_line(Line::from(vec![
      Span::styled(format!(" {}. ", index + 1), Style::default().fg(Color::Cyan)),
      Span::raw(choice.text.as_str()),
      Span::styled(format!(" -> {}", target), Style::default().fg(Color::DarkGray)),
    ]));
  }

  let paragraph = Paragraph::new(body)
    .block(panel(title))
    .wrap(Wrap { trim: false });
  frame.render_widget(paragraph, area);
}
