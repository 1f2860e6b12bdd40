use chrono::{DateTime, Utc};
use serde::Serialize;

pub type StoryId = i64;
pub type PageId = i64;
pub type ChoiceId = i64;

/// Story entry for the story list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryListing {
  pub id: StoryId,
  pub title: String,
  pub created_at: DateTime<Utc>,
}

/// Full story as returned by the remote source, pages included
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Story {
  pub id: StoryId,
  pub title: String,
  pub start_page: Option<PageId>,
  pub pages: Vec<Page>,
}

/// Story metadata without its pages.
///
/// Pages live in the page cache only, so the story slot never duplicates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryInfo {
  pub id: StoryId,
  pub title: String,
  pub start_page: Option<PageId>,
}

impl Story {
  /// Split into the story projection and its pages.
  pub fn into_parts(self) -> (StoryInfo, Vec<Page>) {
    let info = StoryInfo {
      id: self.id,
      title: self.title,
      start_page: self.start_page,
    };
    (info, self.pages)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
  pub id: PageId,
  pub story_id: StoryId,
  pub name: String,
  pub body: String,
  /// Branches leading out of this page, ordered by id
  pub choices: Vec<Choice>,
}

/// A branch from one page to another page of the same story.
///
/// `target_page` is `None` once the target has been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
  pub id: ChoiceId,
  pub page_id: PageId,
  pub text: String,
  pub target_page: Option<PageId>,
}

/// Partial page update. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePatch {
  pub id: PageId,
  pub name: Option<String>,
  pub body: Option<String>,
}

impl PagePatch {
  pub fn new(id: PageId) -> Self {
    Self {
      id,
      ..Self::default()
    }
  }

  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn body(mut self, body: impl Into<String>) -> Self {
    self.body = Some(body.into());
    self
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.body.is_none()
  }
}
