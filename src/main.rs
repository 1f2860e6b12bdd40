mod api;
mod app;
mod cache;
mod config;
mod db;
mod event;
mod loadable;
mod logging;
mod story;
mod ui;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use api::{LocalApi, Page, StoryId, StoryInfo};
use db::Database;
use story::StoryStateController;

#[derive(Parser, Debug)]
#[command(name = "storyloom")]
#[command(about = "A terminal editor for branching stories")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/storyloom/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Open this story instead of the story list
  #[arg(short, long)]
  story: Option<StoryId>,

  /// SQLite database holding the stories
  #[arg(short, long)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print all stories and exit
  List,
  /// Print a story and its pages as JSON
  Export { id: StoryId },
}

#[derive(Serialize)]
struct StoryExport {
  #[serde(flatten)]
  story: StoryInfo,
  pages: Vec<Page>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(database) = args.database {
    config.database = Some(database);
  }

  let _guard = logging::init(&config)?;

  let db_path = config.database_path()?;
  info!(path = %db_path.display(), "opening story database");
  let controller = StoryStateController::new(LocalApi::new(Database::open(&db_path)?));

  match args.command {
    Some(Command::List) => list_stories(&controller).await,
    Some(Command::Export { id }) => export_story(&controller, id).await,
    None => {
      let mut app = app::App::new(controller, args.story.or(config.default_story));
      app.run().await
    }
  }
}

async fn list_stories(controller: &StoryStateController<LocalApi>) -> Result<()> {
  controller.load_story_list().await;
  let stories = controller.stories();
  if let Some(err) = stories.error() {
    return Err(eyre!("Failed to load stories: {}", err));
  }

  for story in stories.value().into_iter().flatten() {
    println!(
      "{:>5}  {}  {}",
      story.id,
      story.created_at.format("%Y-%m-%d %H:%M"),
      story.title
    );
  }
  Ok(())
}

async fn export_story(controller: &StoryStateController<LocalApi>, id: StoryId) -> Result<()> {
  controller.load_story(id).await;
  let story = controller.story();
  let info = match (story.value(), story.error()) {
    (Some(info), _) => info.clone(),
    (None, Some(err)) => return Err(eyre!("Failed to load story {}: {}", id, err)),
    (None, None) => return Err(eyre!("Story {} did not load", id)),
  };

  let pages = controller
    .pages()
    .into_iter()
    .filter_map(|(_, entry)| entry.value().cloned())
    .filter(|page| page.story_id == id)
    .collect();

  let export = StoryExport { story: info, pages };
  println!("{}", serde_json::to_string_pretty(&export)?);
  Ok(())
}
