//! Canned demo tasks for seeding a list.

use taskdeck_core::id::ListId;
use taskdeck_core::{Priority, Task};
use taskdeck_store_kv::StoreError;

use crate::kv::KeyValueStore;
use crate::repository::{NewTask, Repository};

/// One canned demo task.
#[derive(Debug, Clone, Copy)]
pub struct DemoTask {
    /// Title.
    pub title: &'static str,
    /// Description.
    pub description: &'static str,
    /// Tags.
    pub tags: &'static [&'static str],
    /// Priority.
    pub priority: Priority,
}

/// The demo payload: mixed priorities and tags, nothing completed.
pub const DEMO_TASKS: &[DemoTask] = &[
    DemoTask {
        title: "Write project documentation",
        description: "Cover the new endpoints and the storage schema changes.",
        tags: &["docs", "writing"],
        priority: Priority::High,
    },
    DemoTask {
        title: "Review open pull requests",
        description: "Focus on correctness and naming; leave style nits to CI.",
        tags: &["review", "team"],
        priority: Priority::Medium,
    },
    DemoTask {
        title: "Upgrade dependencies",
        description: "Bump outdated crates to their latest stable releases.",
        tags: &["maintenance"],
        priority: Priority::Low,
    },
    DemoTask {
        title: "Plan the weekly sync",
        description: "Collect agenda items and blockers before Thursday.",
        tags: &["meeting", "planning"],
        priority: Priority::Medium,
    },
    DemoTask {
        title: "Fix release regressions",
        description: "Work through the bugs reported against the latest cut.",
        tags: &["bugs", "urgent"],
        priority: Priority::High,
    },
];

/// Seed the demo tasks into `list_id`, returning them in creation order.
///
/// # Errors
/// Returns an error when the store fails.
pub async fn seed_demo_tasks<S: KeyValueStore>(
    repo: &Repository<S>,
    list_id: ListId,
) -> Result<Vec<Task>, StoreError> {
    let mut created = Vec::with_capacity(DEMO_TASKS.len());
    for demo in DEMO_TASKS {
        let task = repo
            .add_task(NewTask {
                list_id,
                title: demo.title.to_owned(),
                description: Some(demo.description.to_owned()),
                tags: Some(demo.tags.iter().map(|&tag| tag.to_owned()).collect()),
                priority: Some(demo.priority),
            })
            .await?;
        created.push(task);
    }
    Ok(created)
}
