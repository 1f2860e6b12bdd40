//! [`StoryApi`] backed by the local SQLite store.

use std::sync::Arc;

use color_eyre::Report;
use tracing::warn;

use super::{
  ApiError, ApiResult, ChoiceId, Page, PageId, PagePatch, Story, StoryApi, StoryId, StoryListing,
};
use crate::db::Database;

/// Transport that answers every remote operation from a [`Database`].
#[derive(Clone)]
pub struct LocalApi {
  db: Arc<Database>,
}

impl LocalApi {
  pub fn new(db: Database) -> Self {
    Self { db: Arc::new(db) }
  }
}

fn storage_error(report: Report) -> ApiError {
  warn!(error = %report, "story store failure");
  ApiError::storage(report.to_string())
}

fn validate_name(kind: &str, name: &str) -> ApiResult<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(ApiError::invalid_input(format!("{} must not be empty", kind)));
  }
  Ok(trimmed.to_string())
}

impl StoryApi for LocalApi {
  async fn get_story_list(&self) -> ApiResult<Vec<StoryListing>> {
    self.db.story_list().map_err(storage_error)
  }

  async fn create_story(&self, title: &str) -> ApiResult<StoryId> {
    let title = validate_name("Story title", title)?;
    self.db.add_story(&title).map_err(storage_error)
  }

  async fn get_story(&self, id: StoryId) -> ApiResult<Story> {
    self
      .db
      .story(id)
      .map_err(storage_error)?
      .ok_or_else(|| ApiError::not_found(format!("Story {} not found", id)))
  }

  async fn get_page(&self, id: PageId) -> ApiResult<Page> {
    self
      .db
      .page(id)
      .map_err(storage_error)?
      .ok_or_else(|| ApiError::not_found(format!("Page {} not found", id)))
  }

  async fn patch_page(&self, patch: &PagePatch) -> ApiResult<()> {
    let patch = match &patch.name {
      Some(name) => PagePatch {
        name: Some(validate_name("Page name", name)?),
        ..patch.clone()
      },
      None => patch.clone(),
    };

    if self.db.patch_page(&patch).map_err(storage_error)? {
      Ok(())
    } else {
      Err(ApiError::not_found(format!("Page {} not found", patch.id)))
    }
  }

  async fn create_page(&self, story_id: StoryId, name: &str) -> ApiResult<PageId> {
    let name = validate_name("Page name", name)?;
    self
      .db
      .create_page(story_id, &name)
      .map_err(storage_error)?
      .ok_or_else(|| ApiError::not_found(format!("Story {} not found", story_id)))
  }

  async fn create_choice(
    &self,
    page_id: PageId,
    text: &str,
    target_page: Option<PageId>,
  ) -> ApiResult<ChoiceId> {
    let text = validate_name("Choice text", text)?;
    match self
      .db
      .add_choice(page_id, &text, target_page)
      .map_err(storage_error)?
    {
      Some(id) => Ok(id),
      None if self.db.page(page_id).map_err(storage_error)?.is_none() => {
        Err(ApiError::not_found(format!("Page {} not found", page_id)))
      }
      None => Err(ApiError::invalid_input(
        "Choice target must be a page of the same story",
      )),
    }
  }

  async fn delete_story(&self, id: StoryId) -> ApiResult<()> {
    if self.db.delete_story(id).map_err(storage_error)? {
      Ok(())
    } else {
      Err(ApiError::not_found(format!("Story {} not found", id)))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::ApiErrorKind;

  fn api() -> LocalApi {
    LocalApi::new(Database::open_in_memory().unwrap())
  }

  #[tokio::test]
  async fn test_round_trip_through_store() {
    let api = api();
    let story_id = api.create_story("  Castle  ").await.unwrap();

    let listing = api.get_story_list().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].title, "Castle");

    let page_id = api.create_page(story_id, "Gate").await.unwrap();
    api
      .patch_page(&PagePatch::new(page_id).body("A portcullis."))
      .await
      .unwrap();

    let page = api.get_page(page_id).await.unwrap();
    assert_eq!(page.name, "Gate");
    assert_eq!(page.body, "A portcullis.");

    let story = api.get_story(story_id).await.unwrap();
    assert_eq!(story.pages.len(), 2);
  }

  #[tokio::test]
  async fn test_not_found_errors() {
    let api = api();
    assert_eq!(
      api.get_story(7).await.unwrap_err().kind,
      ApiErrorKind::NotFound
    );
    assert_eq!(
      api.get_page(7).await.unwrap_err().message,
      "Page 7 not found"
    );
    assert_eq!(
      api
        .patch_page(&PagePatch::new(7).name("x"))
        .await
        .unwrap_err()
        .kind,
      ApiErrorKind::NotFound
    );
    assert_eq!(
      api.create_page(7, "x").await.unwrap_err().kind,
      ApiErrorKind::NotFound
    );
  }

  #[tokio::test]
  async fn test_choices_and_story_deletion() {
    let api = api();
    let story_id = api.create_story("Tower").await.unwrap();
    let other_id = api.create_story("Moat").await.unwrap();
    let start = api.get_story(story_id).await.unwrap().pages[0].id;
    let stairs = api.create_page(story_id, "Stairs").await.unwrap();
    let moat = api.get_story(other_id).await.unwrap().pages[0].id;

    let choice_id = api
      .create_choice(start, " Climb ", Some(stairs))
      .await
      .unwrap();
    let page = api.get_page(start).await.unwrap();
    assert_eq!(page.choices.len(), 1);
    assert_eq!(page.choices[0].id, choice_id);
    assert_eq!(page.choices[0].text, "Climb");

    assert_eq!(
      api.create_choice(start, "Swim", Some(moat)).await.unwrap_err().kind,
      ApiErrorKind::InvalidInput
    );
    assert_eq!(
      api.create_choice(404, "Lost", None).await.unwrap_err().kind,
      ApiErrorKind::NotFound
    );
    assert_eq!(
      api.create_choice(start, "  ", None).await.unwrap_err().kind,
      ApiErrorKind::InvalidInput
    );

    api.delete_story(story_id).await.unwrap();
    assert_eq!(
      api.get_page(stairs).await.unwrap_err().kind,
      ApiErrorKind::NotFound
    );
    assert_eq!(
      api.delete_story(story_id).await.unwrap_err().kind,
      ApiErrorKind::NotFound
    );
    assert_eq!(api.get_story_list().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_blank_names_rejected() {
    let api = api();
    assert_eq!(
      api.create_story("   ").await.unwrap_err().kind,
      ApiErrorKind::InvalidInput
    );

    let story_id = api.create_story("Ok").await.unwrap();
    assert_eq!(
      api.create_page(story_id, "").await.unwrap_err().kind,
      ApiErrorKind::InvalidInput
    );

    let start = api.get_story(story_id).await.unwrap().pages[0].id;
    assert_eq!(
      api
        .patch_page(&PagePatch::new(start).name(" "))
        .await
        .unwrap_err()
        .kind,
      ApiErrorKind::InvalidInput
    );
  }
}
