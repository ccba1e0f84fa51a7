//! Task collection state for the currently viewed list.

use std::sync::Arc;
use tracing::warn;

use taskdeck_core::id::{ListId, TaskId};
use taskdeck_core::Task;
use taskdeck_store_kv::StoreError;

use crate::kv::KeyValueStore;
use crate::repository::{NewTask, Repository};
use crate::task_patch::TaskPatch;

/// In-memory mirror of one list's tasks for synchronous reads.
///
/// Same pending/fulfilled/rejected lifecycle as
/// [`SidebarSlice`](crate::sidebar::SidebarSlice); no automatic retries, no
/// de-duplication of concurrent dispatches.
pub struct TaskSlice<S> {
    repo: Arc<Repository<S>>,
    tasks: Vec<Task>,
    loading: bool,
    error: Option<String>,
}

impl<S> TaskSlice<S> {
    /// Construct an empty slice over the given repository.
    #[must_use]
    pub fn new(repo: Arc<Repository<S>>) -> Self {
        Self {
            repo,
            tasks: Vec::new(),
            loading: false,
            error: None,
        }
    }

    /// Cached tasks.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Whether an operation is in flight.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.loading
    }

    /// Message of the last rejected operation, cleared by the next dispatch.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Reset the slice to its initial state.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.loading = false;
        self.error = None;
    }

    /// Drop the recorded error without touching the collection.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish(&mut self) {
        self.loading = false;
    }

    fn reject(&mut self, context: &str, err: &StoreError) {
        warn!(context, %err, "task operation rejected");
        self.loading = false;
        self.error = Some(format!("{context}: {err}"));
    }
}

impl<S: KeyValueStore> TaskSlice<S> {
    /// Load the tasks of one list, replacing the cached collection.
    pub async fn load_tasks(&mut self, list_id: ListId) {
        self.begin();
        match self.repo.tasks_by_list(list_id).await {
            Ok(tasks) => {
                self.tasks = tasks;
                self.finish();
            }
            Err(err) => self.reject("failed to load tasks", &err),
        }
    }

    /// Create a task and append it to the cached collection.
    pub async fn add_task(&mut self, new_task: NewTask) -> Option<Task> {
        self.begin();
        match self.repo.add_task(new_task).await {
            Ok(task) => {
                if !self.tasks.iter().any(|cached| cached.id == task.id) {
                    self.tasks.push(task.clone());
                }
                self.finish();
                Some(task)
            }
            Err(err) => {
                self.reject("failed to add task", &err);
                None
            }
        }
    }

    /// Toggle a task's completion state, patching the cached entry in place.
    pub async fn set_done(&mut self, task_id: TaskId, done: bool) {
        self.begin();
        match self.repo.set_task_done(task_id, done).await {
            Ok(()) => {
                if let Some(cached) = self.tasks.iter_mut().find(|cached| cached.id == task_id)
                {
                    cached.done = done;
                }
                self.finish();
            }
            Err(err) => self.reject("failed to update task status", &err),
        }
    }

    /// Merge a patch into a task, replacing the cached entry in place. A
    /// missing task surfaces as a rejected operation.
    pub async fn update_task(&mut self, task_id: TaskId, patch: TaskPatch) -> Option<Task> {
        self.begin();
        match self.repo.update_task(task_id, patch).await {
            Ok(Some(task)) => {
                if let Some(cached) = self.tasks.iter_mut().find(|cached| cached.id == task.id)
                {
                    *cached = task.clone();
                }
                self.finish();
                Some(task)
            }
            Ok(None) => {
                self.loading = false;
                self.error = Some(format!("task {task_id} not found"));
                None
            }
            Err(err) => {
                self.reject("failed to update task", &err);
                None
            }
        }
    }

    /// Delete a task and drop it from the cached collection.
    pub async fn delete_task(&mut self, task_id: TaskId) {
        self.begin();
        match self.repo.delete_task(task_id).await {
            Ok(()) => {
                self.tasks.retain(|cached| cached.id != task_id);
                self.finish();
            }
            Err(err) => self.reject("failed to delete task", &err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::task_patch::FieldPatch;
    use taskdeck_core::Priority;
    use taskdeck_store_kv::MemoryStore;

    async fn fixture() -> (TaskSlice<MemoryStore>, ListId) {
        let repo = Arc::new(Repository::new(MemoryStore::new()));
        let folder = repo.add_folder("F").await.expect("add folder");
        let list = repo.add_list(folder.id, "L").await.expect("add list");
        (TaskSlice::new(repo), list.id)
    }

    fn new_task(list_id: ListId, title: &str) -> NewTask {
        NewTask {
            list_id,
            title: title.into(),
            description: None,
            tags: None,
            priority: None,
        }
    }

    #[tokio::test]
    async fn add_then_load_round_trips() {
        let (mut tasks, list_id) = fixture().await;
        let created = tasks
            .add_task(new_task(list_id, "Buy milk"))
            .await
            .expect("add task");
        assert!(!created.done);
        assert_eq!(created.priority, Priority::Medium);

        tasks.load_tasks(list_id).await;
        assert_eq!(tasks.tasks().len(), 1);
        assert_eq!(tasks.tasks()[0].title, "Buy milk");
        assert_eq!(tasks.error(), None);
    }

    #[tokio::test]
    async fn set_done_patches_the_cached_entry() {
        let (mut tasks, list_id) = fixture().await;
        let created = tasks
            .add_task(new_task(list_id, "t"))
            .await
            .expect("add task");

        tasks.set_done(created.id, true).await;
        assert!(tasks.tasks()[0].done);
    }

    #[tokio::test]
    async fn update_keeps_collection_order() {
        let (mut tasks, list_id) = fixture().await;
        let first = tasks.add_task(new_task(list_id, "a")).await.expect("add");
        tasks.add_task(new_task(list_id, "b")).await.expect("add");

        tasks
            .update_task(
                first.id,
                TaskPatch {
                    title: Some("a2".into()),
                    priority: Some(Priority::High),
                    ..TaskPatch::default()
                },
            )
            .await
            .expect("update");

        assert_eq!(tasks.tasks()[0].title, "a2");
        assert_eq!(tasks.tasks()[0].priority, Priority::High);
        assert_eq!(tasks.tasks()[1].title, "b");
    }

    #[tokio::test]
    async fn update_missing_task_rejects() {
        let (mut tasks, _list_id) = fixture().await;
        let result = tasks
            .update_task(
                TaskId(99),
                TaskPatch {
                    tags: FieldPatch::Clear,
                    ..TaskPatch::default()
                },
            )
            .await;
        assert_eq!(result, None);
        assert!(tasks.error().expect("error recorded").contains("not found"));
        assert!(!tasks.loading());
    }

    #[tokio::test]
    async fn delete_removes_from_the_cache_and_is_idempotent() {
        let (mut tasks, list_id) = fixture().await;
        let created = tasks
            .add_task(new_task(list_id, "t"))
            .await
            .expect("add task");

        tasks.delete_task(created.id).await;
        assert!(tasks.tasks().is_empty());
        assert_eq!(tasks.error(), None);

        // Second delete of the same id rides on remove-if-absent.
        tasks.delete_task(created.id).await;
        assert_eq!(tasks.error(), None);
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let (mut tasks, list_id) = fixture().await;
        tasks.add_task(new_task(list_id, "t")).await.expect("add task");

        tasks.clear();
        assert!(tasks.tasks().is_empty());
        assert!(!tasks.loading());
        assert_eq!(tasks.error(), None);
    }
}
