//! Cache-coherent story operations.

use tracing::{debug, info, warn};

use crate::api::{
  ApiError, ApiResult, ChoiceId, Page, PageId, PagePatch, StoryApi, StoryId, StoryInfo,
  StoryListing,
};
use crate::cache::{KeyedResourceCache, ResourceSlot, Subscription};
use crate::loadable::{is_loaded_and_success, not_loaded, LoadState, Loadable};

/// Owns the story slot and the page cache and keeps them coherent with the
/// remote source.
///
/// Cloning is cheap; clones share state. Every operation stores its outcome
/// in the relevant slot and never retries.
#[derive(Clone)]
pub struct StoryStateController<A> {
  api: A,
  story: ResourceSlot<StoryInfo>,
  pages: KeyedResourceCache<PageId, Page>,
  stories: ResourceSlot<Vec<StoryListing>>,
}

impl<A: StoryApi> StoryStateController<A> {
  pub fn new(api: A) -> Self {
    Self {
      api,
      story: ResourceSlot::new(),
      pages: KeyedResourceCache::new(),
      stories: ResourceSlot::new(),
    }
  }

  // ===== Read accessors =====

  pub fn story(&self) -> Loadable<StoryInfo> {
    self.story.get()
  }

  pub fn page(&self, id: PageId) -> Loadable<Page> {
    self.pages.get(&id)
  }

  /// Ordered snapshot of the page cache.
  pub fn pages(&self) -> Vec<(PageId, Loadable<Page>)> {
    self.pages.entries()
  }

  pub fn stories(&self) -> Loadable<Vec<StoryListing>> {
    self.stories.get()
  }

  /// Call `callback` after every change to the story, the story list or the
  /// page cache. Dropping the returned subscriptions unregisters it.
  pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Vec<Subscription> {
    let callback = std::sync::Arc::new(callback);
    let (c1, c2, c3) = (callback.clone(), callback.clone(), callback);
    vec![
      self.story.subscribe(move |_| c1()),
      self.stories.subscribe(move |_| c2()),
      self.pages.subscribe(move |_| c3()),
    ]
  }

  // ===== Operations =====

  /// Fetch a story and warm the page cache with the pages it embeds.
  ///
  /// Cached pages of other stories are left alone; cached pages of this story
  /// that the response no longer lists are removed in the same cache mutation
  /// as the warm.
  pub async fn load_story(&self, id: StoryId) {
    info!(story_id = id, "loading story");
    self.story.set(Loadable::loading());

    match self.api.get_story(id).await {
      Ok(story) => {
        let (info, pages) = story.into_parts();
        let fresh: Vec<PageId> = pages.iter().map(|p| p.id).collect();

        debug!(story_id = id, pages = fresh.len(), "warming page cache");
        self.pages.replace_where(
          |page_id, entry| {
            !fresh.contains(page_id) && entry.value().is_some_and(|p| p.story_id == id)
          },
          pages.into_iter().map(|page| (page.id, Loadable::ok(page))),
        );
        self.story.set(Loadable::ok(info));
      }
      Err(err) => {
        warn!(story_id = id, error = %err, "failed to load story");
        self.story.set(Loadable::err(err));
      }
    }
  }

  /// Cache-first page read. Returns a resolved loadable, never Loading.
  pub async fn get_page(&self, id: PageId) -> Loadable<Page> {
    let cached = self.pages.get(&id);
    if !cached.is_dirty && is_loaded_and_success(&cached) {
      debug!(page_id = id, "page cache hit");
      return cached;
    }
    self.fetch_page(id, cached).await
  }

  async fn fetch_page(&self, id: PageId, cached: Loadable<Page>) -> Loadable<Page> {
    // A previous value stays visible while its replacement is in flight
    if !cached.is_loaded_and_success() {
      self.pages.set(id, Loadable::loading());
    }

    debug!(page_id = id, "fetching page");
    let result = self.api.get_page(id).await;
    if let Err(err) = &result {
      warn!(page_id = id, error = %err, "failed to fetch page");
    }

    let loadable = Loadable::loaded(result);
    self.pages.set(id, loadable.clone());
    loadable
  }

  /// Send a patch, then refetch the page so the cache reflects the server.
  ///
  /// The patch result is returned as-is. The refetch goes through the same
  /// path as [`get_page`](Self::get_page), so a failed refetch replaces the
  /// pre-patch value with the error.
  pub async fn patch_page(&self, patch: PagePatch) -> ApiResult<()> {
    info!(page_id = patch.id, "patching page");
    if let Err(err) = self.api.patch_page(&patch).await {
      warn!(page_id = patch.id, error = %err, "patch rejected");
      return Err(err);
    }

    self.refetch_page(patch.id).await;
    Ok(())
  }

  async fn refetch_page(&self, id: PageId) {
    let refreshed = self.fetch_page(id, self.pages.get(&id)).await;
    if let Some(err) = refreshed.error() {
      warn!(page_id = id, error = %err, "refresh after write failed");
    }
  }

  /// Create a page in `story_id` and cache it immediately.
  ///
  /// `story_id` must be the story currently loaded; this keeps a late
  /// response for another story from redirecting the page.
  pub async fn create_page(&self, story_id: StoryId, name: &str) -> ApiResult<PageId> {
    match &self.story.get().state {
      LoadState::Loaded(Ok(info)) if info.id == story_id => {}
      _ => return Err(ApiError::no_story_loaded()),
    }

    info!(story_id, name, "creating page");
    let id = self.api.create_page(story_id, name).await.map_err(|err| {
      warn!(story_id, error = %err, "failed to create page");
      err
    })?;

    self.pages.set(
      id,
      Loadable::ok(Page {
        id,
        story_id,
        name: name.trim().to_string(),
        body: String::new(),
        choices: Vec::new(),
      }),
    );
    Ok(id)
  }

  /// Add a choice leading out of `page_id`, then refetch that page.
  pub async fn create_choice(
    &self,
    page_id: PageId,
    text: &str,
    target_page: Option<PageId>,
  ) -> ApiResult<ChoiceId> {
    info!(page_id, ?target_page, "creating choice");
    let id = self
      .api
      .create_choice(page_id, text, target_page)
      .await
      .map_err(|err| {
        warn!(page_id, error = %err, "failed to create choice");
        err
      })?;

    self.refetch_page(page_id).await;
    Ok(id)
  }

  /// Mark a cached page stale so the next read refetches it.
  pub fn invalidate_page(&self, id: PageId) -> bool {
    debug!(page_id = id, "invalidating page");
    self.pages.mark_dirty(&id)
  }

  pub async fn load_story_list(&self) {
    info!("loading story list");
    self.stories.set(Loadable::loading());

    let result = self.api.get_story_list().await;
    if let Err(err) = &result {
      warn!(error = %err, "failed to load story list");
    }
    self.stories.set(Loadable::loaded(result));
  }

  /// Create a story, then reload the story list.
  pub async fn create_story(&self, title: &str) -> ApiResult<StoryId> {
    info!(title, "creating story");
    let id = self.api.create_story(title).await.map_err(|err| {
      warn!(error = %err, "failed to create story");
      err
    })?;
    self.load_story_list().await;
    Ok(id)
  }

  /// Delete a story, drop its cached pages and reload the story list.
  ///
  /// The story slot is reset if it holds the deleted story.
  pub async fn delete_story(&self, id: StoryId) -> ApiResult<()> {
    info!(story_id = id, "deleting story");
    self.api.delete_story(id).await.map_err(|err| {
      warn!(story_id = id, error = %err, "failed to delete story");
      err
    })?;

    self.pages.replace_where(
      |_, entry| entry.value().is_some_and(|p| p.story_id == id),
      Vec::new(),
    );
    if self.story.get().value().is_some_and(|info| info.id == id) {
      self.story.set(not_loaded());
    }
    self.load_story_list().await;
    Ok(())
  }
}
