use crate::api::{Page, PageId, PagePatch, StoryApi, StoryId, StoryInfo};
use crate::cache::Subscription;
use crate::event::{Event, EventHandler};
use crate::story::StoryStateController;
use crate::ui;
use crate::ui::input::{InputResult, TextInput};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::future::Future;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Which screen is shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  Stories {
    selected: usize,
  },
  Editor {
    story_id: StoryId,
    selected: usize,
    open_page: Option<PageId>,
  },
}

/// What a text prompt will be used for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
  NewStory,
  DeleteStory(StoryId),
  NewPage,
  PageName(PageId),
  PageBody(PageId),
  NewChoice {
    page_id: PageId,
    target: PageId,
  },
}

impl Prompt {
  pub fn label(&self) -> &'static str {
    match self {
      Prompt::NewStory => "New story title",
      Prompt::DeleteStory(_) => "Delete this story? (y/n)",
      Prompt::NewPage => "New page name",
      Prompt::PageName(_) => "Page name",
      Prompt::PageBody(_) => "Page body",
      Prompt::NewChoice { .. } => "Choice text",
    }
  }
}

/// Input mode
#[derive(Debug, Clone)]
pub enum Mode {
  Normal,
  Input { prompt: Prompt, input: TextInput },
}

/// Main application state
pub struct App<A> {
  controller: StoryStateController<A>,
  screen: Screen,
  mode: Mode,
  /// Last message for the status line
  notice: Option<String>,
  event_tx: mpsc::UnboundedSender<Event>,
  /// Controller observers, unregistered on drop
  _subscriptions: Vec<Subscription>,
  should_quit: bool,
}

impl<A: StoryApi + Clone> App<A> {
  pub fn new(controller: StoryStateController<A>, start_story: Option<StoryId>) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();
    let screen = match start_story {
      Some(story_id) => Screen::Editor {
        story_id,
        selected: 0,
        open_page: None,
      },
      None => Screen::Stories { selected: 0 },
    };

    Self {
      controller,
      screen,
      mode: Mode::Normal,
      notice: None,
      event_tx: tx,
      _subscriptions: Vec::new(),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    self.attach(events.sender());
    self.load_screen();

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }
    Ok(())
  }

  /// Route background events and cache changes to `tx`.
  fn attach(&mut self, tx: mpsc::UnboundedSender<Event>) {
    let observer_tx = tx.clone();
    self._subscriptions = self.controller.subscribe(move || {
      let _ = observer_tx.send(Event::Changed);
    });
    self.event_tx = tx;
  }

  /// Fetch whatever the current screen shows.
  fn load_screen(&self) {
    match &self.screen {
      Screen::Stories { .. } => {
        let controller = self.controller.clone();
        self.spawn(async move { controller.load_story_list().await });
      }
      Screen::Editor { story_id, .. } => {
        let controller = self.controller.clone();
        let story_id = *story_id;
        self.spawn(async move { controller.load_story(story_id).await });
      }
    }
  }

  fn spawn(&self, task: impl Future<Output = ()> + Send + 'static) {
    tokio::spawn(task);
  }

  /// Run a fallible operation in the background and report its outcome.
  fn spawn_reported<T, F>(&self, task: F, on_ok: impl FnOnce(T) -> String + Send + 'static)
  where
    T: Send + 'static,
    F: Future<Output = crate::api::ApiResult<T>> + Send + 'static,
  {
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let notice = match task.await {
        Ok(value) => on_ok(value),
        Err(err) => format!("Error: {}", err),
      };
      let _ = tx.send(Event::Notice(notice));
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick | Event::Changed => {} // Redraw happens on every event
      Event::Notice(message) => self.notice = Some(message),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let result = match &mut self.mode {
      Mode::Normal => None,
      Mode::Input { input, .. } => Some(input.handle_key(key)),
    };

    match result {
      None => self.handle_normal_key(key),
      Some(InputResult::Consumed) => {}
      Some(InputResult::Cancelled) => self.mode = Mode::Normal,
      Some(InputResult::Submitted(value)) => {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        if let Mode::Input { prompt, .. } = mode {
          self.submit(prompt, value);
        }
      }
    }
  }

  fn handle_normal_key(&mut self, key: KeyEvent) {
    self.notice = None;
    match key.code {
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Enter => self.enter_selected(),
      KeyCode::Char('q') | KeyCode::Esc => self.back(),
      _ => match self.screen {
        Screen::Stories { .. } => self.handle_stories_key(key),
        Screen::Editor { .. } => self.handle_editor_key(key),
      },
    }
  }

  fn handle_stories_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('n') => self.prompt(Prompt::NewStory, ""),
      KeyCode::Char('d') => {
        if let Some(story_id) = self.selected_story_id() {
          self.prompt(Prompt::DeleteStory(story_id), "");
        }
      }
      KeyCode::Char('r') => self.load_screen(),
      _ => {}
    }
  }

  fn handle_editor_key(&mut self, key: KeyEvent) {
    let (story_id, selected, open_page) = match &self.screen {
      Screen::Editor {
        story_id,
        selected,
        open_page,
      } => (*story_id, *selected, *open_page),
      Screen::Stories { .. } => return,
    };

    match key.code {
      KeyCode::Char('a') => self.prompt(Prompt::NewPage, ""),
      KeyCode::Char('R') => self.load_screen(),
      KeyCode::Char('e') => {
        if let Some(page) = open_page.and_then(|id| self.controller.page(id).value().cloned()) {
          self.prompt(Prompt::PageName(page.id), &page.name);
        }
      }
      KeyCode::Char('b') => {
        if let Some(page) = open_page.and_then(|id| self.controller.page(id).value().cloned()) {
          self.prompt(Prompt::PageBody(page.id), &page.body);
        }
      }
      KeyCode::Char('c') => {
        let target = self.story_pages(story_id).get(selected).map(|p| p.id);
        if let (Some(page_id), Some(target)) = (open_page, target) {
          self.prompt(Prompt::NewChoice { page_id, target }, "");
        }
      }
      KeyCode::Char('r') => {
        if let Some(id) = open_page {
          self.controller.invalidate_page(id);
          self.open_page(id);
        }
      }
      KeyCode::Char(digit @ '1'..='9') => {
        let index = digit as usize - '1' as usize;
        if let Some(id) = open_page {
          self.follow_choice(story_id, id, index);
        }
      }
      _ => {}
    }
  }

  /// Open the target of the `index`th choice of `page_id`.
  fn follow_choice(&mut self, story_id: StoryId, page_id: PageId, index: usize) {
    let target = self
      .controller
      .page(page_id)
      .value()
      .and_then(|page| page.choices.get(index))
      .and_then(|choice| choice.target_page);
    let Some(target) = target else {
      return;
    };

    let position = self.story_pages(story_id).iter().position(|p| p.id == target);
    if let (Screen::Editor { selected, .. }, Some(position)) = (&mut self.screen, position) {
      *selected = position;
    }
    self.open_page(target);
  }

  fn prompt(&mut self, prompt: Prompt, initial: &str) {
    self.mode = Mode::Input {
      prompt,
      input: TextInput::with_value(initial),
    };
  }

  fn submit(&mut self, prompt: Prompt, value: String) {
    debug!(?prompt, "prompt submitted");
    let controller = self.controller.clone();
    match prompt {
      Prompt::NewStory => self.spawn_reported(
        async move { controller.create_story(&value).await },
        |id| format!("Created story {}", id),
      ),
      Prompt::DeleteStory(id) => {
        if value.trim().eq_ignore_ascii_case("y") {
          self.spawn_reported(async move { controller.delete_story(id).await }, move |_| {
            format!("Deleted story {}", id)
          });
        } else {
          self.notice = Some("Delete cancelled".to_string());
        }
      }
      Prompt::NewPage => {
        let Screen::Editor { story_id, .. } = self.screen else {
          return;
        };
        self.spawn_reported(
          async move { controller.create_page(story_id, &value).await },
          |id| format!("Created page {}", id),
        )
      }
      Prompt::PageName(id) => self.spawn_reported(
        async move { controller.patch_page(PagePatch::new(id).name(value)).await },
        |_| "Saved".to_string(),
      ),
      Prompt::PageBody(id) => self.spawn_reported(
        async move { controller.patch_page(PagePatch::new(id).body(value)).await },
        |_| "Saved".to_string(),
      ),
      Prompt::NewChoice { page_id, target } => self.spawn_reported(
        async move {
          controller
            .create_choice(page_id, &value, Some(target))
            .await
        },
        |_| "Choice added".to_string(),
      ),
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let len = match &self.screen {
      Screen::Stories { .. } => self.story_listings_len(),
      Screen::Editor { story_id, .. } => self.story_pages(*story_id).len(),
    };
    let selected = match &mut self.screen {
      Screen::Stories { selected } | Screen::Editor { selected, .. } => selected,
    };
    if len > 0 {
      *selected = (*selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  fn enter_selected(&mut self) {
    match self.screen.clone() {
      Screen::Stories { .. } => {
        if let Some(story_id) = self.selected_story_id() {
          info!(story_id, "opening story");
          self.screen = Screen::Editor {
            story_id,
            selected: 0,
            open_page: None,
          };
          self.load_screen();
        }
      }
      Screen::Editor {
        story_id, selected, ..
      } => {
        if let Some(page) = self.story_pages(story_id).get(selected) {
          self.open_page(page.id);
        }
      }
    }
  }

  fn open_page(&mut self, id: PageId) {
    if let Screen::Editor { open_page, .. } = &mut self.screen {
      *open_page = Some(id);
    }
    let controller = self.controller.clone();
    self.spawn(async move {
      controller.get_page(id).await;
    });
  }

  fn back(&mut self) {
    match self.screen {
      Screen::Stories { .. } => self.should_quit = true,
      Screen::Editor { .. } => {
        self.screen = Screen::Stories { selected: 0 };
        self.load_screen();
      }
    }
  }

  fn selected_story_id(&self) -> Option<StoryId> {
    let Screen::Stories { selected } = self.screen else {
      return None;
    };
    self
      .controller
      .stories()
      .value()
      .and_then(|stories| stories.get(selected).map(|s| s.id))
  }

  fn story_listings_len(&self) -> usize {
    self.controller.stories().value().map_or(0, Vec::len)
  }

  /// The loaded story, if it is `story_id`.
  ///
  /// A slot still holding the previously opened story reads as `None`.
  pub fn story_info(&self, story_id: StoryId) -> Option<StoryInfo> {
    self
      .controller
      .story()
      .value()
      .filter(|info| info.id == story_id)
      .cloned()
  }

  /// Successfully loaded pages of `story_id`, ordered by id.
  pub fn story_pages(&self, story_id: StoryId) -> Vec<Page> {
    self
      .controller
      .pages()
      .into_iter()
      .filter_map(|(_, entry)| entry.value().cloned())
      .filter(|page| page.story_id == story_id)
      .collect()
  }

  // Accessors for UI rendering
  pub fn controller(&self) -> &StoryStateController<A> {
    &self.controller
  }

  pub fn screen(&self) -> &Screen {
    &self.screen
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn notice(&self) -> Option<&str> {
    self.notice.as_deref()
  }
}
