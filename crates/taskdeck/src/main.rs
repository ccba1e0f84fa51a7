//! CLI entry point for taskdeck.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use taskdeck_app::{ProjectConfig, Repository};
use taskdeck_store_kv::{FileStore, StoreConfig};

mod commands;
mod view;

/// Folders, lists and tasks in a local key-value store.
#[derive(Parser, Debug)]
#[command(
    name = "taskdeck",
    version,
    about = "taskdeck: folders, lists and tasks persisted to a local store file"
)]
struct Cli {
    /// Path to the store file (overrides taskdeck.toml and the default).
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed the default folder and list when the store holds none.
    Init,

    /// Folder operations.
    Folder {
        #[command(subcommand)]
        cmd: FolderCmd,
    },

    /// List operations.
    List {
        #[command(subcommand)]
        cmd: ListCmd,
    },

    /// Task operations.
    Task {
        #[command(subcommand)]
        cmd: TaskCmd,
    },

    /// Seed the canned demo tasks into a list.
    SeedDemo {
        /// Target list id, e.g. list1.
        #[arg(long)]
        list: String,
    },
}

#[derive(Subcommand, Debug)]
enum FolderCmd {
    /// Create a folder.
    Add {
        /// Display name.
        name: String,
    },

    /// List every folder.
    Ls,

    /// Rename a folder.
    Rename {
        /// Folder id, e.g. fldr1.
        id: String,
        /// New display name.
        name: String,
    },

    /// Delete a folder and everything inside it.
    Rm {
        /// Folder id, e.g. fldr1.
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ListCmd {
    /// Create a list inside a folder.
    Add {
        /// Owning folder id, e.g. fldr1.
        #[arg(long)]
        folder: String,
        /// Display name.
        content: String,
    },

    /// Show the lists of a folder.
    Ls {
        /// Folder id, e.g. fldr1.
        #[arg(long)]
        folder: String,
    },

    /// Rename a list.
    Rename {
        /// List id, e.g. list1.
        id: String,
        /// New display name.
        content: String,
    },

    /// Delete a list and its tasks.
    Rm {
        /// List id, e.g. list1.
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCmd {
    /// Create a task.
    Add {
        /// Owning list id, e.g. list1.
        #[arg(long)]
        list: String,
        /// Title.
        #[arg(long)]
        title: String,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
        /// Tags; repeat the flag for more than one (at most 5 unique).
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
        /// Priority: low, medium or high (defaults to medium).
        #[arg(long)]
        priority: Option<String>,
    },

    /// Show the tasks of a list.
    Ls {
        /// List id, e.g. list1.
        #[arg(long)]
        list: String,
    },

    /// Mark a task as done.
    Done {
        /// Task id, e.g. task1.
        id: String,
    },

    /// Mark a task as not done.
    Undone {
        /// Task id, e.g. task1.
        id: String,
    },

    /// Edit a task's fields.
    Edit {
        /// Task id, e.g. task1.
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description.
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Erase the description.
        #[arg(long)]
        clear_description: bool,
        /// Replace the tags; repeat the flag for more than one.
        #[arg(short = 't', long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<String>,
        /// Erase the tags.
        #[arg(long)]
        clear_tags: bool,
        /// New priority: low, medium or high.
        #[arg(long)]
        priority: Option<String>,
    },

    /// Delete a task.
    Rm {
        /// Task id, e.g. task1.
        id: String,
    },

    /// Show one task in full.
    Show {
        /// Task id, e.g. task1.
        id: String,
        /// Print the record as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_tracing();

    let Cli { store, cmd } = Cli::parse();

    let config = ProjectConfig::load(".")?;
    let store_path = resolve_store_path(store, &config)?;
    let mut store_config = StoreConfig::new(store_path);
    store_config.quota_bytes = config.store.quota_bytes;

    let store = FileStore::open(store_config).await?;
    let repo = Repository::new(store);
    commands::run(repo, cmd).await
}

fn resolve_store_path(flag: Option<PathBuf>, config: &ProjectConfig) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Some(path) = &config.store.path {
        return Ok(path.clone());
    }
    let base = dirs::data_dir()
        .ok_or_else(|| anyhow!("could not determine the platform data directory"))?;
    Ok(base.join("taskdeck").join("store.json"))
}

fn install_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_task_add_command() {
        let cli = Cli::parse_from([
            "taskdeck",
            "task",
            "add",
            "--list",
            "list1",
            "--title",
            "Buy milk",
            "--tag",
            "shopping",
            "--tag",
            "food",
            "--priority",
            "high",
        ]);

        let Command::Task {
            cmd:
                TaskCmd::Add {
                    list,
                    title,
                    description,
                    tags,
                    priority,
                },
        } = cli.cmd
        else {
            panic!("expected task add");
        };
        assert_eq!(list, "list1");
        assert_eq!(title, "Buy milk");
        assert_eq!(description, None);
        assert_eq!(tags, ["shopping", "food"]);
        assert_eq!(priority.as_deref(), Some("high"));
    }

    #[test]
    fn parse_store_override() {
        let cli = Cli::parse_from(["taskdeck", "--store", "/tmp/s.json", "folder", "ls"]);
        assert_eq!(cli.store.as_deref(), Some(std::path::Path::new("/tmp/s.json")));
    }

    #[test]
    fn edit_rejects_conflicting_description_flags() {
        let result = Cli::try_parse_from([
            "taskdeck",
            "task",
            "edit",
            "task1",
            "--description",
            "x",
            "--clear-description",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn store_flag_wins_over_config() {
        let config = ProjectConfig {
            store: taskdeck_app::StoreSettings {
                path: Some(PathBuf::from("from-config.json")),
                quota_bytes: None,
            },
        };

        let resolved = resolve_store_path(Some(PathBuf::from("from-flag.json")), &config)
            .expect("resolve");
        assert_eq!(resolved, PathBuf::from("from-flag.json"));

        let resolved = resolve_store_path(None, &config).expect("resolve");
        assert_eq!(resolved, PathBuf::from("from-config.json"));
    }
}
