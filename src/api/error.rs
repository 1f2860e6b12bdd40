use thiserror::Error;

/// What went wrong with a remote operation.
///
/// Carried for display and logging. The cache never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
  NotFound,
  InvalidInput,
  Storage,
  NoStoryLoaded,
}

/// Failure of a single remote operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
  pub kind: ApiErrorKind,
  pub message: String,
}

/// Maximum length for storage error messages shown to the user
const MAX_MESSAGE_LENGTH: usize = 200;

impl ApiError {
  pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
    }
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(ApiErrorKind::NotFound, message)
  }

  pub fn invalid_input(message: impl Into<String>) -> Self {
    Self::new(ApiErrorKind::InvalidInput, message)
  }

  pub fn storage(message: impl Into<String>) -> Self {
    let message: String = message.into();
    Self::new(ApiErrorKind::Storage, truncate_message(message))
  }

  pub fn no_story_loaded() -> Self {
    Self::new(ApiErrorKind::NoStoryLoaded, "No story is loaded")
  }
}

fn truncate_message(message: String) -> String {
  if message.len() <= MAX_MESSAGE_LENGTH {
    return message;
  }
  let mut end = MAX_MESSAGE_LENGTH;
  while !message.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}... (truncated)", &message[..end])
}

/// Outcome of one remote operation
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_is_message() {
    let err = ApiError::not_found("Page 4 not found");
    assert_eq!(err.to_string(), "Page 4 not found");
    assert_eq!(err.kind, ApiErrorKind::NotFound);
  }

  #[test]
  fn test_storage_message_is_truncated() {
    let err = ApiError::storage("x".repeat(500));
    assert!(err.message.len() < 250);
    assert!(err.message.ends_with("(truncated)"));
  }

  #[test]
  fn test_short_storage_message_kept() {
    assert_eq!(ApiError::storage("locked").message, "locked");
  }
}
