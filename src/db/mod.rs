//! SQLite-backed story store. This is the remote source behind [`crate::api::LocalApi`].

pub mod schema;

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::api::{Choice, ChoiceId, Page, PageId, PagePatch, Story, StoryId, StoryListing};

/// Name given to the page every new story starts with
pub const START_PAGE_NAME: &str = "Start";

/// Database connection wrapper for stories and pages
pub struct Database {
  conn: Mutex<Connection>,
}

impl Database {
  /// Open or create the database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a private in-memory database.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(schema::SCHEMA)
      .map_err(|e| eyre!("Failed to run migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("storyloom").join("stories.db"))
  }

  fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  pub fn story_list(&self) -> Result<Vec<StoryListing>> {
    let conn = self.conn()?;
    let mut stmt = conn
      .prepare("SELECT id, title, created_at FROM stories ORDER BY id")
      .map_err(|e| eyre!("Failed to prepare story list query: {}", e))?;

    let rows: Vec<(StoryId, String, String)> = stmt
      .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
      .map_err(|e| eyre!("Failed to query stories: {}", e))?
      .collect::<rusqlite::Result<_>>()
      .map_err(|e| eyre!("Failed to read story row: {}", e))?;

    rows
      .into_iter()
      .map(|(id, title, created_at)| {
        Ok(StoryListing {
          id,
          title,
          created_at: parse_datetime(&created_at)?,
        })
      })
      .collect()
  }

  /// Insert a story together with its start page.
  pub fn add_story(&self, title: &str) -> Result<StoryId> {
    let mut conn = self.conn()?;
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute("INSERT INTO stories (title) VALUES (?)", params![title])
      .map_err(|e| eyre!("Failed to insert story: {}", e))?;
    let story_id = tx.last_insert_rowid();

    tx.execute(
      "INSERT INTO pages (story_id, name, body) VALUES (?, ?, '')",
      params![story_id, START_PAGE_NAME],
    )
    .map_err(|e| eyre!("Failed to insert start page: {}", e))?;
    let start_page = tx.last_insert_rowid();

    tx.execute(
      "UPDATE stories SET start_page = ? WHERE id = ?",
      params![start_page, story_id],
    )
    .map_err(|e| eyre!("Failed to set start page: {}", e))?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    debug!(story_id, start_page, "story created");
    Ok(story_id)
  }

  /// Fetch a story with all of its pages, ordered by page id.
  pub fn story(&self, id: StoryId) -> Result<Option<Story>> {
    let conn = self.conn()?;

    let header: Option<(String, Option<PageId>)> = conn
      .query_row(
        "SELECT title, start_page FROM stories WHERE id = ?",
        params![id],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to fetch story {}: {}", id, e))?;

    let Some((title, start_page)) = header else {
      return Ok(None);
    };

    let mut stmt = conn
      .prepare("SELECT id, story_id, name, body FROM pages WHERE story_id = ? ORDER BY id")
      .map_err(|e| eyre!("Failed to prepare page query: {}", e))?;

    let mut pages = stmt
      .query_map(params![id], page_from_row)
      .map_err(|e| eyre!("Failed to query pages for story {}: {}", id, e))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to read page row: {}", e))?;

    let mut stmt = conn
      .prepare(
        "SELECT c.id, c.page_id, c.text, c.target_page_id FROM choices c \
         JOIN pages p ON p.id = c.page_id WHERE p.story_id = ? ORDER BY c.id",
      )
      .map_err(|e| eyre!("Failed to prepare choice query: {}", e))?;

    let mut choices: BTreeMap<PageId, Vec<Choice>> = BTreeMap::new();
    for choice in stmt
      .query_map(params![id], choice_from_row)
      .map_err(|e| eyre!("Failed to query choices for story {}: {}", id, e))?
    {
      let choice = choice.map_err(|e| eyre!("Failed to read choice row: {}", e))?;
      choices.entry(choice.page_id).or_default().push(choice);
    }
    for page in &mut pages {
      page.choices = choices.remove(&page.id).unwrap_or_default();
    }

    Ok(Some(Story {
      id,
      title,
      start_page,
      pages,
    }))
  }

  pub fn page(&self, id: PageId) -> Result<Option<Page>> {
    let conn = self.conn()?;
    let page = conn
      .query_row(
        "SELECT id, story_id, name, body FROM pages WHERE id = ?",
        params![id],
        page_from_row,
      )
      .optional()
      .map_err(|e| eyre!("Failed to fetch page {}: {}", id, e))?;

    let Some(mut page) = page else {
      return Ok(None);
    };

    let mut stmt = conn
      .prepare(
        "SELECT id, page_id, text, target_page_id FROM choices WHERE page_id = ? ORDER BY id",
      )
      .map_err(|e| eyre!("Failed to prepare choice query: {}", e))?;
    page.choices = stmt
      .query_map(params![id], choice_from_row)
      .map_err(|e| eyre!("Failed to query choices for page {}: {}", id, e))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to read choice row: {}", e))?;

    Ok(Some(page))
  }

  /// Insert an empty page. Returns `None` if the story does not exist.
  pub fn create_page(&self, story_id: StoryId, name: &str) -> Result<Option<PageId>> {
    let conn = self.conn()?;

    let exists: Option<i64> = conn
      .query_row(
        "SELECT 1 FROM stories WHERE id = ?",
        params![story_id],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to look up story {}: {}", story_id, e))?;
    if exists.is_none() {
      return Ok(None);
    }

    conn
      .execute(
        "INSERT INTO pages (story_id, name, body) VALUES (?, ?, '')",
        params![story_id, name],
      )
      .map_err(|e| eyre!("Failed to insert page: {}", e))?;

    Ok(Some(conn.last_insert_rowid()))
  }

  /// Apply the provided fields of `patch`. Returns false if the page does not exist.
  pub fn patch_page(&self, patch: &PagePatch) -> Result<bool> {
    let conn = self.conn()?;

    if patch.is_empty() {
      let exists: Option<i64> = conn
        .query_row("SELECT 1 FROM pages WHERE id = ?", params![patch.id], |row| {
          row.get(0)
        })
        .optional()
        .map_err(|e| eyre!("Failed to look up page {}: {}", patch.id, e))?;
      return Ok(exists.is_some());
    }

    let changed = conn
      .execute(
        "UPDATE pages SET name = COALESCE(?, name), body = COALESCE(?, body) WHERE id = ?",
        params![patch.name, patch.body, patch.id],
      )
      .map_err(|e| eyre!("Failed to patch page {}: {}", patch.id, e))?;

    Ok(changed > 0)
  }

  /// Add a choice leading out of `page_id`.
  ///
  /// Returns `None` if the page does not exist or if `target_page` is not a
  /// page of the same story.
  pub fn add_choice(
    &self,
    page_id: PageId,
    text: &str,
    target_page: Option<PageId>,
  ) -> Result<Option<ChoiceId>> {
    let conn = self.conn()?;

    let story_of = |id: PageId| -> Result<Option<StoryId>> {
      conn
        .query_row(
          "SELECT story_id FROM pages WHERE id = ?",
          params![id],
          |row| row.get(0),
        )
        .optional()
        .map_err(|e| eyre!("Failed to look up page {}: {}", id, e))
    };

    let Some(story_id) = story_of(page_id)? else {
      return Ok(None);
    };
    if let Some(target) = target_page {
      if story_of(target)? != Some(story_id) {
        return Ok(None);
      }
    }

    conn
      .execute(
        "INSERT INTO choices (page_id, text, target_page_id) VALUES (?, ?, ?)",
        params![page_id, text, target_page],
      )
      .map_err(|e| eyre!("Failed to insert choice: {}", e))?;

    let id = conn.last_insert_rowid();
    debug!(choice_id = id, page_id, ?target_page, "choice created");
    Ok(Some(id))
  }

  /// Delete a story with its pages and their choices. Returns false if it
  /// did not exist.
  pub fn delete_story(&self, id: StoryId) -> Result<bool> {
    let conn = self.conn()?;
    let deleted = conn
      .execute("DELETE FROM stories WHERE id = ?", params![id])
      .map_err(|e| eyre!("Failed to delete story {}: {}", id, e))?;

    debug!(story_id = id, deleted, "story deleted");
    Ok(deleted > 0)
  }
}

fn page_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
  Ok(Page {
    id: row.get(0)?,
    story_id: row.get(1)?,
    name: row.get(2)?,
    body: row.get(3)?,
    choices: Vec::new(),
  })
}

fn choice_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Choice> {
  Ok(Choice {
    id: row.get(0)?,
    page_id: row.get(1)?,
    text: row.get(2)?,
    target_page: row.get(3)?,
  })
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
