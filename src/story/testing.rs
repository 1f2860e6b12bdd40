//! In-memory [`StoryApi`] with call counters, one-shot failure injection and
//! gates that hold `get_page` responses until released.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::Notify;

use crate::api::{
  ApiError, ApiResult, Choice, ChoiceId, Page, PageId, PagePatch, Story, StoryApi, StoryId,
  StoryListing,
};

#[derive(Default)]
struct FakeState {
  stories: BTreeMap<StoryId, (String, Vec<PageId>)>,
  pages: BTreeMap<PageId, Page>,
  next_id: i64,
  get_page_calls: usize,
  create_page_calls: usize,
  fail_get_story: Option<String>,
  fail_get_page: Option<String>,
  fail_patch: Option<String>,
  fail_create_page: Option<String>,
  get_page_gates: VecDeque<Arc<Notify>>,
}

#[derive(Clone, Default)]
pub struct FakeApi {
  state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
  pub fn new() -> Self {
    let api = Self::default();
    api.state.lock().unwrap().next_id = 100;
    api
  }

  /// Insert or replace a story and its pages.
  pub fn insert_story(&self, id: StoryId, title: &str, pages: Vec<Page>) {
    let mut state = self.state.lock().unwrap();
    let ids = pages.iter().map(|p| p.id).collect();
    for page in pages {
      state.pages.insert(page.id, page);
    }
    state.stories.insert(id, (title.to_string(), ids));
  }

  pub fn insert_page(&self, page: Page) {
    self.state.lock().unwrap().pages.insert(page.id, page);
  }

  pub fn set_next_page_id(&self, id: PageId) {
    self.state.lock().unwrap().next_id = id;
  }

  pub fn fail_next_get_story(&self, message: &str) {
    self.state.lock().unwrap().fail_get_story = Some(message.to_string());
  }

  pub fn fail_next_get_page(&self, message: &str) {
    self.state.lock().unwrap().fail_get_page = Some(message.to_string());
  }

  pub fn fail_next_patch(&self, message: &str) {
    self.state.lock().unwrap().fail_patch = Some(message.to_string());
  }

  pub fn fail_next_create_page(&self, message: &str) {
    self.state.lock().unwrap().fail_create_page = Some(message.to_string());
  }

  /// Hold the response of the next unclaimed `get_page` call until the
  /// returned gate is notified. The response is read when the call starts.
  pub fn gate_next_get_page(&self) -> Arc<Notify> {
    let gate = Arc::new(Notify::new());
    self
      .state
      .lock()
      .unwrap()
      .get_page_gates
      .push_back(gate.clone());
    gate
  }

  pub fn get_page_calls(&self) -> usize {
    self.state.lock().unwrap().get_page_calls
  }

  pub fn create_page_calls(&self) -> usize {
    self.state.lock().unwrap().create_page_calls
  }
}

fn allocate_id(state: &mut FakeState) -> i64 {
  let id = state.next_id;
  state.next_id += 1;
  id
}

impl StoryApi for FakeApi {
  async fn get_story_list(&self) -> ApiResult<Vec<StoryListing>> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .stories
        .iter()
        .map(|(id, (title, _))| StoryListing {
          id: *id,
          title: title.clone(),
          created_at: Utc::now(),
        })
        .collect(),
    )
  }

  async fn create_story(&self, title: &str) -> ApiResult<StoryId> {
    let mut state = self.state.lock().unwrap();
    let id = allocate_id(&mut state);
    state.stories.insert(id, (title.to_string(), Vec::new()));
    Ok(id)
  }

  async fn get_story(&self, id: StoryId) -> ApiResult<Story> {
    let mut state = self.state.lock().unwrap();
    if let Some(message) = state.fail_get_story.take() {
      return Err(ApiError::not_found(message));
    }

    let (title, page_ids) = state
      .stories
      .get(&id)
      .cloned()
      .ok_or_else(|| ApiError::not_found(format!("Story {} not found", id)))?;
    let pages = page_ids
      .iter()
      .filter_map(|page_id| state.pages.get(page_id).cloned())
      .collect();

    Ok(Story {
      id,
      title,
      start_page: page_ids.first().copied(),
      pages,
    })
  }

  async fn get_page(&self, id: PageId) -> ApiResult<Page> {
    let (result, gate) = {
      let mut state = self.state.lock().unwrap();
      state.get_page_calls += 1;
      let gate = state.get_page_gates.pop_front();
      let result = match state.fail_get_page.take() {
        Some(message) => Err(ApiError::storage(message)),
        None => state
          .pages
          .get(&id)
          .cloned()
          .ok_or_else(|| ApiError::not_found(format!("Page {} not found", id))),
      };
      (result, gate)
    };

    if let Some(gate) = gate {
      gate.notified().await;
    }
    result
  }

  async fn patch_page(&self, patch: &PagePatch) -> ApiResult<()> {
    let mut state = self.state.lock().unwrap();
    if let Some(message) = state.fail_patch.take() {
      return Err(ApiError::invalid_input(message));
    }

    let page = state
      .pages
      .get_mut(&patch.id)
      .ok_or_else(|| ApiError::not_found(format!("Page {} not found", patch.id)))?;
    if let Some(name) = &patch.name {
      page.name = name.clone();
    }
    if let Some(body) = &patch.body {
      page.body = body.clone();
    }
    Ok(())
  }

  async fn create_page(&self, story_id: StoryId, name: &str) -> ApiResult<PageId> {
    let mut state = self.state.lock().unwrap();
    state.create_page_calls += 1;
    if let Some(message) = state.fail_create_page.take() {
      return Err(ApiError::storage(message));
    }
    if !state.stories.contains_key(&story_id) {
      return Err(ApiError::not_found(format!("Story {} not found", story_id)));
    }

    let id = allocate_id(&mut state);
    state.pages.insert(
      id,
      Page {
        id,
        story_id,
        name: name.to_string(),
        body: String::new(),
        choices: Vec::new(),
      },
    );
    if let Some((_, pages)) = state.stories.get_mut(&story_id) {
      pages.push(id);
    }
    Ok(id)
  }

  async fn create_choice(
    &self,
    page_id: PageId,
    text: &str,
    target_page: Option<PageId>,
  ) -> ApiResult<ChoiceId> {
    let mut state = self.state.lock().unwrap();
    let story_id = state
      .pages
      .get(&page_id)
      .map(|p| p.story_id)
      .ok_or_else(|| ApiError::not_found(format!("Page {} not found", page_id)))?;
    if let Some(target) = target_page {
      if state.pages.get(&target).map(|p| p.story_id) != Some(story_id) {
        return Err(ApiError::invalid_input(
          "Choice target must be a page of the same story",
        ));
      }
    }

    let id = allocate_id(&mut state);
    if let Some(page) = state.pages.get_mut(&page_id) {
      page.choices.push(Choice {
        id,
        page_id,
        text: text.to_string(),
        target_page,
      });
    }
    Ok(id)
  }

  async fn delete_story(&self, id: StoryId) -> ApiResult<()> {
    let mut state = self.state.lock().unwrap();
    if state.stories.remove(&id).is_none() {
      return Err(ApiError::not_found(format!("Story {} not found", id)));
    }
    state.pages.retain(|_, page| page.story_id != id);
    Ok(())
  }
}
