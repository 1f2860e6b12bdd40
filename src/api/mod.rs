//! Transport seam between the story cache and the remote source.
//!
//! [`StoryApi`] has one async method per remote operation. Every call
//! resolves to an [`ApiResult`]; nothing is retried here.

mod error;
mod local;
mod types;

use std::future::Future;

pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use local::LocalApi;
pub use types::{
  Choice, ChoiceId, Page, PageId, PagePatch, Story, StoryId, StoryInfo, StoryListing,
};

/// Remote operations consumed by the story controller.
pub trait StoryApi: Send + Sync + 'static {
  fn get_story_list(&self) -> impl Future<Output = ApiResult<Vec<StoryListing>>> + Send;

  fn create_story(&self, title: &str) -> impl Future<Output = ApiResult<StoryId>> + Send;

  fn get_story(&self, id: StoryId) -> impl Future<Output = ApiResult<Story>> + Send;

  fn get_page(&self, id: PageId) -> impl Future<Output = ApiResult<Page>> + Send;

  fn patch_page(&self, patch: &PagePatch) -> impl Future<Output = ApiResult<()>> + Send;

  fn create_page(
    &self,
    story_id: StoryId,
    name: &str,
  ) -> impl Future<Output = ApiResult<PageId>> + Send;

  fn create_choice(
    &self,
    page_id: PageId,
    text: &str,
    target_page: Option<PageId>,
  ) -> impl Future<Output = ApiResult<ChoiceId>> + Send;

  fn delete_story(&self, id: StoryId) -> impl Future<Output = ApiResult<()>> + Send;
}
