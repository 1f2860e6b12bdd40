use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::db::Database;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  /// SQLite file holding stories (defaults to the data directory)
  pub database: Option<PathBuf>,
  /// Story opened at start-up instead of the story list
  pub default_story: Option<i64>,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
  /// Filter used when RUST_LOG is not set
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Log file (defaults to the data directory)
  pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      file: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./storyloom.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/storyloom/config.yaml
  ///
  /// Without any file the defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("storyloom.yaml");
    if local.exists() {
      return Some(local);
    }

    let xdg_path = dirs::config_dir()?.join("storyloom").join("config.yaml");
    xdg_path.exists().then_some(xdg_path)
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file deserializes to null
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Database file, falling back to the data directory.
  pub fn database_path(&self) -> Result<PathBuf> {
    match &self.database {
      Some(path) => Ok(path.clone()),
      None => Database::default_path(),
    }
  }

  /// Log file, placed next to the default database unless configured.
  pub fn log_path(&self) -> Result<PathBuf> {
    match &self.log.file {
      Some(path) => Ok(path.clone()),
      None => Database::default_path().map(|p| p.with_file_name("storyloom.log")),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert!(config.database.is_none());
    assert!(config.default_story.is_none());
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_full_config() {
    let config = Config::parse(
      "database: /tmp/stories.db\n\
       default_story: 7\n\
       log:\n  level: debug\n  file: /tmp/storyloom.log\n",
    )
    .unwrap();

    assert_eq!(config.database, Some(PathBuf::from("/tmp/stories.db")));
    assert_eq!(config.default_story, Some(7));
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log_path().unwrap(), PathBuf::from("/tmp/storyloom.log"));
    assert_eq!(
      config.database_path().unwrap(),
      PathBuf::from("/tmp/stories.db")
    );
  }

  #[test]
  fn test_partial_log_section() {
    let config = Config::parse("log:\n  file: out.log\n").unwrap();
    assert_eq!(config.log.level, "info");
    assert_eq!(config.log.file, Some(PathBuf::from("out.log")));
  }

  #[test]
  fn test_unknown_field_rejected() {
    assert!(Config::parse("databse: typo.db\n").is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    let err = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
