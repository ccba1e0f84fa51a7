//! Command handlers: input validation, slice dispatch, rendering.
//!
//! Validation lives here, at the view boundary; the repository below never
//! checks inputs. Storage failures recorded by a slice are logged and the
//! command otherwise completes quietly.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::error;

use taskdeck_app::{
    ensure_default_data, seed_demo_tasks, FieldPatch, KeyValueStore, NewTask, Repository,
    SidebarSlice, TaskPatch, TaskSlice,
};
use taskdeck_core::id::{FolderId, ListId, TaskId};
use taskdeck_core::Priority;

use crate::view;
use crate::{Command, FolderCmd, ListCmd, TaskCmd};

/// Upper bound on unique tags per task, enforced at this boundary.
const MAX_TAGS: usize = 5;

/// Execute a parsed command against the repository.
///
/// # Errors
/// Returns an error for invalid input; storage failures are logged instead.
pub async fn run<S: KeyValueStore>(repo: Repository<S>, cmd: Command) -> Result<()> {
    let repo = Arc::new(repo);
    let mut sidebar = SidebarSlice::new(Arc::clone(&repo));
    let mut tasks = TaskSlice::new(Arc::clone(&repo));

    match cmd {
        Command::Init => match ensure_default_data(&repo).await {
            Ok(Some((folder, list))) => {
                println!("created {}", view::folder_line(&folder));
                println!("created {}", view::list_line(&list));
            }
            Ok(None) => println!("store already initialized"),
            Err(err) => error!(%err, "initialization failed"),
        },

        Command::Folder { cmd } => run_folder(&mut sidebar, cmd).await?,
        Command::List { cmd } => run_list(&mut sidebar, cmd).await?,
        Command::Task { cmd } => run_task(&repo, &mut tasks, cmd).await?,

        Command::SeedDemo { list } => {
            let list_id = parse_list_id(&list)?;
            match seed_demo_tasks(&repo, list_id).await {
                Ok(created) => {
                    for task in &created {
                        println!("created {}", view::task_line(task));
                    }
                }
                Err(err) => error!(%err, "demo seeding failed"),
            }
        }
    }
    Ok(())
}

async fn run_folder<S: KeyValueStore>(
    sidebar: &mut SidebarSlice<S>,
    cmd: FolderCmd,
) -> Result<()> {
    match cmd {
        FolderCmd::Add { name } => {
            let name = required_name("folder name", &name)?;
            if let Some(folder) = sidebar.add_folder(name).await {
                println!("created {}", view::folder_line(&folder));
            }
        }
        FolderCmd::Ls => {
            sidebar.load_folders().await;
            if sidebar.folders().is_empty() && sidebar.error().is_none() {
                println!("no folders yet; run `taskdeck init`");
            }
            for folder in sidebar.folders() {
                println!("{}", view::folder_line(folder));
            }
        }
        FolderCmd::Rename { id, name } => {
            let id = parse_folder_id(&id)?;
            let name = required_name("folder name", &name)?;
            if let Some(folder) = sidebar.rename_folder(id, name).await {
                println!("renamed {}", view::folder_line(&folder));
            }
        }
        FolderCmd::Rm { id } => {
            let id = parse_folder_id(&id)?;
            sidebar.delete_folder(id).await;
            if sidebar.error().is_none() {
                println!("deleted folder {id}");
            }
        }
    }
    log_slice_error(sidebar.error());
    Ok(())
}

async fn run_list<S: KeyValueStore>(sidebar: &mut SidebarSlice<S>, cmd: ListCmd) -> Result<()> {
    match cmd {
        ListCmd::Add { folder, content } => {
            let folder_id = parse_folder_id(&folder)?;
            let content = required_name("list name", &content)?;
            if let Some(list) = sidebar.add_list(folder_id, content).await {
                println!("created {}", view::list_line(&list));
            }
        }
        ListCmd::Ls { folder } => {
            let folder_id = parse_folder_id(&folder)?;
            sidebar.load_lists(folder_id).await;
            if sidebar.lists().is_empty() && sidebar.error().is_none() {
                println!("no lists in {folder_id}");
            }
            for list in sidebar.lists() {
                println!("{}", view::list_line(list));
            }
        }
        ListCmd::Rename { id, content } => {
            let id = parse_list_id(&id)?;
            let content = required_name("list name", &content)?;
            if let Some(list) = sidebar.rename_list(id, content).await {
                println!("renamed {}", view::list_line(&list));
            }
        }
        ListCmd::Rm { id } => {
            let id = parse_list_id(&id)?;
            sidebar.delete_list(id).await;
            if sidebar.error().is_none() {
                println!("deleted list {id}");
            }
        }
    }
    log_slice_error(sidebar.error());
    Ok(())
}

async fn run_task<S: KeyValueStore>(
    repo: &Repository<S>,
    tasks: &mut TaskSlice<S>,
    cmd: TaskCmd,
) -> Result<()> {
    match cmd {
        TaskCmd::Add {
            list,
            title,
            description,
            tags,
            priority,
        } => {
            let list_id = parse_list_id(&list)?;
            let title = required_name("task title", &title)?;
            validate_tags(&tags)?;
            let priority = priority.as_deref().map(parse_priority).transpose()?;
            let new_task = NewTask {
                list_id,
                title,
                description,
                tags: if tags.is_empty() { None } else { Some(tags) },
                priority,
            };
            if let Some(task) = tasks.add_task(new_task).await {
                println!("created {}", view::task_line(&task));
            }
        }
        TaskCmd::Ls { list } => {
            let list_id = parse_list_id(&list)?;
            tasks.load_tasks(list_id).await;
            if tasks.tasks().is_empty() && tasks.error().is_none() {
                println!("no tasks in {list_id}");
            }
            for task in tasks.tasks() {
                println!("{}", view::task_line(task));
            }
        }
        TaskCmd::Done { id } => {
            let id = parse_task_id(&id)?;
            tasks.set_done(id, true).await;
            if tasks.error().is_none() {
                println!("done {id}");
            }
        }
        TaskCmd::Undone { id } => {
            let id = parse_task_id(&id)?;
            tasks.set_done(id, false).await;
            if tasks.error().is_none() {
                println!("not done {id}");
            }
        }
        TaskCmd::Edit {
            id,
            title,
            description,
            clear_description,
            tags,
            clear_tags,
            priority,
        } => {
            let id = parse_task_id(&id)?;
            let title = title
                .map(|value| required_name("task title", &value))
                .transpose()?;
            let description_patch = if clear_description {
                FieldPatch::Clear
            } else {
                description.map_or(FieldPatch::Keep, FieldPatch::Set)
            };
            let tags_patch = if clear_tags {
                FieldPatch::Clear
            } else if tags.is_empty() {
                FieldPatch::Keep
            } else {
                validate_tags(&tags)?;
                FieldPatch::Set(tags)
            };
            let priority = priority.as_deref().map(parse_priority).transpose()?;

            let patch = TaskPatch {
                title,
                description: description_patch,
                done: None,
                tags: tags_patch,
                priority,
            };
            if patch.is_empty() {
                bail!("nothing to change; pass at least one field");
            }
            if let Some(task) = tasks.update_task(id, patch).await {
                println!("updated {}", view::task_line(&task));
            }
        }
        TaskCmd::Rm { id } => {
            let id = parse_task_id(&id)?;
            tasks.delete_task(id).await;
            if tasks.error().is_none() {
                println!("deleted task {id}");
            }
        }
        TaskCmd::Show { id, json } => {
            let id = parse_task_id(&id)?;
            match repo.task(id).await {
                Ok(Some(task)) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&task)?);
                    } else {
                        print!("{}", view::task_details(&task));
                    }
                }
                Ok(None) => println!("task {id} not found"),
                Err(err) => error!(%err, "failed to read task"),
            }
        }
    }
    log_slice_error(tasks.error());
    Ok(())
}

fn log_slice_error(error: Option<&str>) {
    if let Some(message) = error {
        error!(message, "operation failed");
    }
}

fn required_name(what: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{what} must not be empty");
    }
    Ok(trimmed.to_owned())
}

fn validate_tags(tags: &[String]) -> Result<()> {
    if tags.len() > MAX_TAGS {
        bail!("a task can carry at most {MAX_TAGS} tags");
    }
    let mut seen = HashSet::new();
    for tag in tags {
        if !seen.insert(tag.as_str()) {
            bail!("duplicate tag {tag:?}");
        }
    }
    Ok(())
}

fn parse_priority(value: &str) -> Result<Priority> {
    value
        .parse()
        .map_err(|err: taskdeck_core::ParsePriorityError| anyhow::anyhow!(err))
}

fn parse_folder_id(value: &str) -> Result<FolderId> {
    value
        .parse()
        .map_err(|err: taskdeck_core::id::ParseIdError| anyhow::anyhow!(err))
}

fn parse_list_id(value: &str) -> Result<ListId> {
    value
        .parse()
        .map_err(|err: taskdeck_core::id::ParseIdError| anyhow::anyhow!(err))
}

fn parse_task_id(value: &str) -> Result<TaskId> {
    value
        .parse()
        .map_err(|err: taskdeck_core::id::ParseIdError| anyhow::anyhow!(err))
}
