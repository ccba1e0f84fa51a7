//! Entity repository over the key-value store.
//!
//! Every record lives under a flat `"<type>:<id>"` key and each entity type
//! keeps a `"<type>_id_counter"` entry that is removed once the last live
//! entity of that type is deleted, so numbering restarts at 1 afterwards.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::ops::ControlFlow;
use tokio::sync::Mutex;
use tracing::{debug, info};

use taskdeck_core::id::{FolderId, ListId, TaskId};
use taskdeck_core::{Folder, List, Priority, Task};
use taskdeck_store_kv::StoreError;

use crate::kv::KeyValueStore;
use crate::task_patch::TaskPatch;

/// Fields for a new task. `priority` falls back to [`Priority::Medium`] and
/// `done` always starts false.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Owning list.
    pub list_id: ListId,
    /// Required title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional tags.
    pub tags: Option<Vec<String>>,
    /// Optional priority.
    pub priority: Option<Priority>,
}

/// Typed CRUD operations against a [`KeyValueStore`].
///
/// The repository performs no input validation; that is the caller's concern.
/// Storage failures propagate as [`StoreError`]; "not found" is `Ok(None)`.
pub struct Repository<S> {
    store: S,
    // Serializes the read-increment-persist id allocation so two concurrent
    // creations of the same type cannot mint the same id.
    id_lock: Mutex<()>,
}

impl<S> Repository<S> {
    /// Construct a repository over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            id_lock: Mutex::new(()),
        }
    }

    /// Expose a reference to the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> Repository<S> {
    async fn next_id(&self, counter_key: &str) -> Result<u64, StoreError> {
        let _guard = self.id_lock.lock().await;
        let current = self
            .store
            .get(counter_key)
            .await?
            .and_then(|value| value.as_u64())
            .unwrap_or(0);
        let next = current + 1;
        self.store.set(counter_key, Value::from(next)).await?;
        Ok(next)
    }

    async fn put<T: Serialize>(&self, key: &str, entity: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(entity)?;
        self.store.set(key, value).await?;
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Collect every record under `prefix` that passes `keep`.
    ///
    /// Full scan; result order is the store's iteration order and must be
    /// treated as arbitrary.
    async fn scan<T>(
        &self,
        prefix: &str,
        keep: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut raw = Vec::new();
        self.store
            .iterate(|value, key| {
                if key.starts_with(prefix) {
                    raw.push(value.clone());
                }
                ControlFlow::Continue(())
            })
            .await?;

        let mut out = Vec::with_capacity(raw.len());
        for value in raw {
            let entity: T = serde_json::from_value(value)?;
            if keep(&entity) {
                out.push(entity);
            }
        }
        Ok(out)
    }

    /// Remove the type's id counter when no records with `prefix` remain.
    async fn reset_counter_if_empty(
        &self,
        prefix: &str,
        counter_key: &str,
    ) -> Result<(), StoreError> {
        let mut any_left = false;
        self.store
            .iterate(|_, key| {
                if key.starts_with(prefix) {
                    any_left = true;
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await?;

        if !any_left {
            self.store.remove(counter_key).await?;
            debug!(counter_key, "cleared id counter");
        }
        Ok(())
    }

    // Folder operations

    /// Create a folder.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn add_folder(&self, name: impl Into<String>) -> Result<Folder, StoreError> {
        let id = FolderId(self.next_id(FolderId::COUNTER_KEY).await?);
        let folder = Folder {
            id,
            name: name.into(),
        };
        self.put(&id.storage_key(), &folder).await?;
        debug!(folder = %id, "created folder");
        Ok(folder)
    }

    /// Fetch a folder by id; `Ok(None)` when absent.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn folder(&self, id: FolderId) -> Result<Option<Folder>, StoreError> {
        self.read(&id.storage_key()).await
    }

    /// Rename a folder; `Ok(None)` when the id does not exist.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn rename_folder(
        &self,
        id: FolderId,
        name: impl Into<String>,
    ) -> Result<Option<Folder>, StoreError> {
        let Some(mut folder) = self.folder(id).await? else {
            return Ok(None);
        };
        folder.name = name.into();
        self.put(&id.storage_key(), &folder).await?;
        Ok(Some(folder))
    }

    /// Every folder, in arbitrary order.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn all_folders(&self) -> Result<Vec<Folder>, StoreError> {
        self.scan(FolderId::STORAGE_PREFIX, |_: &Folder| true).await
    }

    /// Delete a folder and, transitively, its lists and their tasks.
    ///
    /// Deleting an absent id is a no-op. The folder id counter is cleared when
    /// no folders remain; the list/task counters are left alone even when the
    /// cascade removed the last of them.
    ///
    /// # Errors
    /// Returns an error when the store fails mid-cascade; the cascade is safe
    /// to re-run.
    pub async fn delete_folder(&self, id: FolderId) -> Result<(), StoreError> {
        let lists = self.lists_by_folder(id).await?;
        for list in &lists {
            for task in self.tasks_by_list(list.id).await? {
                self.store.remove(&task.id.storage_key()).await?;
            }
            self.store.remove(&list.id.storage_key()).await?;
        }
        self.store.remove(&id.storage_key()).await?;
        info!(folder = %id, lists = lists.len(), "deleted folder");

        self.reset_counter_if_empty(FolderId::STORAGE_PREFIX, FolderId::COUNTER_KEY)
            .await
    }

    // List operations

    /// Create a list inside `folder_id`.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn add_list(
        &self,
        folder_id: FolderId,
        content: impl Into<String>,
    ) -> Result<List, StoreError> {
        let id = ListId(self.next_id(ListId::COUNTER_KEY).await?);
        let list = List {
            id,
            folder_id,
            content: content.into(),
        };
        self.put(&id.storage_key(), &list).await?;
        debug!(list = %id, folder = %folder_id, "created list");
        Ok(list)
    }

    /// Fetch a list by id; `Ok(None)` when absent.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn list(&self, id: ListId) -> Result<Option<List>, StoreError> {
        self.read(&id.storage_key()).await
    }

    /// Rename a list; `Ok(None)` when the id does not exist.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn rename_list(
        &self,
        id: ListId,
        content: impl Into<String>,
    ) -> Result<Option<List>, StoreError> {
        let Some(mut list) = self.list(id).await? else {
            return Ok(None);
        };
        list.content = content.into();
        self.put(&id.storage_key(), &list).await?;
        Ok(Some(list))
    }

    /// Lists owned by `folder_id`, in arbitrary order.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn lists_by_folder(&self, folder_id: FolderId) -> Result<Vec<List>, StoreError> {
        self.scan(ListId::STORAGE_PREFIX, |list: &List| {
            list.folder_id == folder_id
        })
        .await
    }

    /// Delete a list and its tasks.
    ///
    /// Deleting an absent id is a no-op. The list id counter is cleared when
    /// no lists remain; the task counter is left alone.
    ///
    /// # Errors
    /// Returns an error when the store fails mid-cascade; the cascade is safe
    /// to re-run.
    pub async fn delete_list(&self, id: ListId) -> Result<(), StoreError> {
        let tasks = self.tasks_by_list(id).await?;
        for task in &tasks {
            self.store.remove(&task.id.storage_key()).await?;
        }
        self.store.remove(&id.storage_key()).await?;
        info!(list = %id, tasks = tasks.len(), "deleted list");

        self.reset_counter_if_empty(ListId::STORAGE_PREFIX, ListId::COUNTER_KEY)
            .await
    }

    // Task operations

    /// Create a task.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn add_task(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let NewTask {
            list_id,
            title,
            description,
            tags,
            priority,
        } = new_task;

        let id = TaskId(self.next_id(TaskId::COUNTER_KEY).await?);
        let task = Task {
            id,
            list_id,
            title,
            description,
            done: false,
            tags,
            priority: priority.unwrap_or_default(),
        };
        self.put(&id.storage_key(), &task).await?;
        debug!(task = %id, list = %list_id, "created task");
        Ok(task)
    }

    /// Fetch a task by id; `Ok(None)` when absent.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        self.read(&id.storage_key()).await
    }

    /// Tasks owned by `list_id`, in arbitrary order.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn tasks_by_list(&self, list_id: ListId) -> Result<Vec<Task>, StoreError> {
        self.scan(TaskId::STORAGE_PREFIX, |task: &Task| {
            task.list_id == list_id
        })
        .await
    }

    /// Toggle a task's completion state. A missing id is a silent no-op.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn set_task_done(&self, id: TaskId, done: bool) -> Result<(), StoreError> {
        let Some(mut task) = self.task(id).await? else {
            return Ok(());
        };
        task.done = done;
        self.put(&id.storage_key(), &task).await
    }

    /// Merge `patch` into the stored task; `Ok(None)` when the id does not
    /// exist. See [`TaskPatch`] for the merge semantics.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn update_task(
        &self,
        id: TaskId,
        patch: TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        let Some(mut task) = self.task(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut task);
        self.put(&id.storage_key(), &task).await?;
        Ok(Some(task))
    }

    /// Delete a task. Deleting an absent id is a no-op. The task id counter
    /// is cleared when no tasks remain.
    ///
    /// # Errors
    /// Returns an error when the store fails.
    pub async fn delete_task(&self, id: TaskId) -> Result<(), StoreError> {
        self.store.remove(&id.storage_key()).await?;
        self.reset_counter_if_empty(TaskId::STORAGE_PREFIX, TaskId::COUNTER_KEY)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::task_patch::FieldPatch;
    use std::sync::Arc;
    use taskdeck_store_kv::MemoryStore;

    fn repo() -> Repository<Arc<MemoryStore>> {
        Repository::new(Arc::new(MemoryStore::new()))
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
    async fn ids_count_up_per_type() {
        let repo = repo();
        let first = repo.add_folder("A").await.expect("add folder");
        let second = repo.add_folder("B").await.expect("add folder");
        assert_eq!(first.id, FolderId(1));
        assert_eq!(second.id, FolderId(2));

        // The list counter is independent of the folder counter.
        let list = repo.add_list(first.id, "L").await.expect("add list");
        assert_eq!(list.id, ListId(1));
    }

    #[tokio::test]
    async fn task_defaults_apply() {
        let repo = repo();
        let folder = repo.add_folder("A").await.expect("add folder");
        let list = repo.add_list(folder.id, "L").await.expect("add list");
        let task = repo
            .add_task(new_task(list.id, "Buy milk"))
            .await
            .expect("add task");

        assert!(!task.done);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.description, None);
        assert_eq!(task.tags, None);
    }

    #[tokio::test]
    async fn rename_touches_only_the_name_field() {
        let repo = repo();
        let folder = repo.add_folder("Old").await.expect("add folder");
        let renamed = repo
            .rename_folder(folder.id, "New")
            .await
            .expect("rename folder")
            .expect("folder exists");

        assert_eq!(renamed.id, folder.id);
        assert_eq!(renamed.name, "New");

        let stored = repo
            .folder(folder.id)
            .await
            .expect("read folder")
            .expect("folder exists");
        assert_eq!(stored, renamed);
    }

    #[tokio::test]
    async fn rename_missing_id_is_none_not_an_error() {
        let repo = repo();
        assert_eq!(
            repo.rename_folder(FolderId(99), "x").await.expect("rename"),
            None
        );
        assert_eq!(repo.rename_list(ListId(99), "x").await.expect("rename"), None);
        assert_eq!(
            repo.update_task(TaskId(99), TaskPatch::default())
                .await
                .expect("update"),
            None
        );
    }

    #[tokio::test]
    async fn update_task_merges_partially() {
        let repo = repo();
        let folder = repo.add_folder("A").await.expect("add folder");
        let list = repo.add_list(folder.id, "L").await.expect("add list");
        let task = repo
            .add_task(NewTask {
                list_id: list.id,
                title: "Write report".into(),
                description: Some("draft".into()),
                tags: Some(vec!["a".into(), "b".into()]),
                priority: Some(Priority::Low),
            })
            .await
            .expect("add task");

        let updated = repo
            .update_task(
                task.id,
                TaskPatch {
                    tags: FieldPatch::Set(vec!["a".into(), "b".into(), "c".into()]),
                    ..TaskPatch::default()
                },
            )
            .await
            .expect("update task")
            .expect("task exists");

        // Tags are replaced wholesale, everything else is untouched.
        assert_eq!(
            updated.tags.as_deref(),
            Some(["a".to_owned(), "b".to_owned(), "c".to_owned()].as_slice())
        );
        assert_eq!(updated.title, "Write report");
        assert_eq!(updated.description.as_deref(), Some("draft"));
        assert_eq!(updated.priority, Priority::Low);

        let stored = repo.task(task.id).await.expect("read task").expect("task");
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn set_task_done_on_missing_id_is_a_no_op() {
        let repo = repo();
        repo.set_task_done(TaskId(42), true)
            .await
            .expect("missing id must not error");
    }

    #[tokio::test]
    async fn counter_resets_when_last_entity_goes() {
        let repo = repo();
        let folder = repo.add_folder("Only").await.expect("add folder");
        assert_eq!(folder.id, FolderId(1));

        repo.delete_folder(folder.id).await.expect("delete folder");
        let next = repo.add_folder("Reborn").await.expect("add folder");
        assert_eq!(next.id, FolderId(1));
    }

    #[tokio::test]
    async fn cascade_does_not_reset_child_counters() {
        let repo = repo();
        let folder = repo.add_folder("A").await.expect("add folder");
        let list = repo.add_list(folder.id, "L").await.expect("add list");
        repo.add_task(new_task(list.id, "t")).await.expect("add task");

        // Folder cascade removes the last list and task, but only the folder
        // counter is cleared.
        repo.delete_folder(folder.id).await.expect("delete folder");

        let folder = repo.add_folder("B").await.expect("add folder");
        assert_eq!(folder.id, FolderId(1));
        let list = repo.add_list(folder.id, "M").await.expect("add list");
        assert_eq!(list.id, ListId(2));
        let task = repo.add_task(new_task(list.id, "u")).await.expect("add task");
        assert_eq!(task.id, TaskId(2));
    }

    #[tokio::test]
    async fn queries_filter_by_parent() {
        let repo = repo();
        let folder_a = repo.add_folder("A").await.expect("add folder");
        let folder_b = repo.add_folder("B").await.expect("add folder");
        let list_a = repo.add_list(folder_a.id, "LA").await.expect("add list");
        let list_b = repo.add_list(folder_b.id, "LB").await.expect("add list");
        repo.add_task(new_task(list_a.id, "in A")).await.expect("add task");
        repo.add_task(new_task(list_b.id, "in B")).await.expect("add task");

        let mut lists = repo.lists_by_folder(folder_a.id).await.expect("query lists");
        assert_eq!(lists.len(), 1);
        let list = lists.pop().expect("one list");
        assert_eq!(list.id, list_a.id);

        let tasks = repo.tasks_by_list(list_b.id).await.expect("query tasks");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "in B");
    }
}
