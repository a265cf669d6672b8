//! Command-line front end for the learning dashboard.
//!
//! # Responsibility
//! - Wire configuration, logging and the SQLite document store into a
//!   `DashboardStore`.
//! - Expose seeding, inspection and a few mutations for local use.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use learnboard_core::{
    init_logging, DashboardConfig, DashboardStore, DocumentStore, LoadOutcome, Note, Project,
    ProjectStatus, SqliteDocumentStore, Topic,
};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "learnboard", version, about = "Learning dashboard tracker")]
struct Cli {
    /// SQLite document database (overrides LEARNBOARD_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Absolute log directory (overrides LEARNBOARD_LOG_DIR).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// Log level (overrides LEARNBOARD_LOG_LEVEL).
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a JSON topic tree into the database.
    Seed { file: PathBuf },
    /// Print topics, progress and projects.
    Show,
    #[command(subcommand)]
    Topic(TopicCommand),
    #[command(subcommand)]
    Project(ProjectCommand),
    #[command(subcommand)]
    Note(NoteCommand),
}

#[derive(Debug, Subcommand)]
enum TopicCommand {
    Add { name: String },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    Add {
        topic: String,
        id: String,
        title: String,
        start_date: String,
    },
    Status { id: String, status: String },
    Remove { topic: String, id: String },
}

#[derive(Debug, Subcommand)]
enum NoteCommand {
    Add {
        project: String,
        date: String,
        content: String,
    },
    Delete { project: String, index: usize },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    if let Some(logging) = config.logging() {
        init_logging(&logging).context("failed to initialize logging")?;
    }

    let remote = open_remote(&config)?;
    match cli.command {
        Command::Seed { file } => {
            let Some(remote) = remote else {
                bail!("seeding requires --db or LEARNBOARD_DB_PATH");
            };
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read `{}`", file.display()))?;
            let topics: Vec<Topic> =
                serde_json::from_str(&raw).context("seed file is not a topic list")?;
            DashboardStore::seed_remote(remote.as_ref(), &topics).await?;
            println!("seeded {} topics", topics.len());
        }
        Command::Show => {
            let store = load(remote).await;
            print_dashboard(&store);
        }
        Command::Topic(command) => {
            let mut store = load(remote).await;
            match command {
                TopicCommand::Add { name } => {
                    let id = store.create_topic(&name).await?;
                    println!("created topic {id}");
                }
                TopicCommand::Delete { id } => {
                    store.delete_topic(&id).await?;
                    println!("deleted topic {id}");
                }
            }
        }
        Command::Project(command) => {
            let mut store = load(remote).await;
            match command {
                ProjectCommand::Add {
                    topic,
                    id,
                    title,
                    start_date,
                } => {
                    store
                        .add_project(&topic, Project::new(id.clone(), title, start_date))
                        .await?;
                    println!("added project {id} to {topic}");
                }
                ProjectCommand::Status { id, status } => {
                    let status: ProjectStatus = status.parse()?;
                    store.update_project_status(&id, status).await?;
                    println!("project {id} is now {status}");
                }
                ProjectCommand::Remove { topic, id } => {
                    store.remove_project(&topic, &id).await?;
                    println!("removed project {id}");
                }
            }
        }
        Command::Note(command) => {
            let mut store = load(remote).await;
            match command {
                NoteCommand::Add {
                    project,
                    date,
                    content,
                } => {
                    let id = store.add_note(&project, Note::new(date, content)).await?;
                    println!("added note {id}");
                }
                NoteCommand::Delete { project, index } => {
                    store.delete_note(&project, index).await?;
                    println!("deleted note {index} of {project}");
                }
            }
        }
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = DashboardConfig::from_env()?;
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    if let Some(dir) = &cli.log_dir {
        if !dir.is_absolute() {
            bail!("--log-dir must be an absolute path");
        }
        config.log_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn open_remote(config: &DashboardConfig) -> Result<Option<Arc<dyn DocumentStore>>> {
    let Some(path) = &config.db_path else {
        return Ok(None);
    };
    let store = SqliteDocumentStore::open(path)
        .with_context(|| format!("failed to open `{}`", path.display()))?;
    Ok(Some(Arc::new(store)))
}

async fn load(remote: Option<Arc<dyn DocumentStore>>) -> DashboardStore {
    let mut store = DashboardStore::new(remote);
    let outcome = store.load_initial_data().await;
    info!("event=cli_load module=cli status=ok outcome={outcome:?}");
    if outcome == LoadOutcome::FallbackAfterError {
        eprintln!("warning: database unreadable, continuing with an empty dashboard");
    }
    store
}

fn print_dashboard(store: &DashboardStore) {
    if store.topics().is_empty() {
        println!("no topics");
        return;
    }
    for topic in store.topics() {
        let (completed, total) = store.topic_progress(&topic.id);
        println!("{} [{}] {completed}/{total}", topic.name, topic.id);
        for project in store.topic_projects(&topic.id) {
            let end = project.end_date.as_deref().unwrap_or("open");
            println!(
                "  {} ({}) {} {}..{} notes={}",
                project.title,
                project.id,
                project.status,
                project.start_date,
                end,
                project.notes.len()
            );
        }
    }
}
