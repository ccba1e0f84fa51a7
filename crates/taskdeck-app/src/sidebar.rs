//! Navigation state: folder and list collections plus the current selection.

use std::sync::Arc;
use tracing::warn;

use taskdeck_core::id::{FolderId, ListId};
use taskdeck_core::{Folder, List};
use taskdeck_store_kv::StoreError;

use crate::kv::KeyValueStore;
use crate::repository::Repository;

/// In-memory mirror of the folder/list collections for synchronous reads.
///
/// Every asynchronous operation runs the pending/fulfilled/rejected
/// lifecycle: pending raises `loading` and clears `error`, fulfilled merges
/// the repository result into the cached collections, rejected records the
/// failure message. Nothing is retried automatically.
pub struct SidebarSlice<S> {
    repo: Arc<Repository<S>>,
    folders: Vec<Folder>,
    lists: Vec<List>,
    selected_folder: Option<FolderId>,
    selected_list: Option<ListId>,
    loading: bool,
    error: Option<String>,
}

impl<S> SidebarSlice<S> {
    /// Construct an empty slice over the given repository.
    #[must_use]
    pub fn new(repo: Arc<Repository<S>>) -> Self {
        Self {
            repo,
            folders: Vec::new(),
            lists: Vec::new(),
            selected_folder: None,
            selected_list: None,
            loading: false,
            error: None,
        }
    }

    /// Cached folders.
    #[must_use]
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Cached lists (across every loaded folder).
    #[must_use]
    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    /// Currently selected folder, if any.
    #[must_use]
    pub const fn selected_folder(&self) -> Option<FolderId> {
        self.selected_folder
    }

    /// Currently selected list, if any.
    #[must_use]
    pub const fn selected_list(&self) -> Option<ListId> {
        self.selected_list
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

    /// Select a folder. Changing the folder resets the selected list and the
    /// cached lists.
    pub fn set_selected_folder(&mut self, folder_id: Option<FolderId>) {
        self.selected_folder = folder_id;
        self.selected_list = None;
        self.lists.clear();
    }

    /// Select a list.
    pub const fn set_selected_list(&mut self, list_id: Option<ListId>) {
        self.selected_list = list_id;
    }

    /// Reset the whole slice to its initial state.
    pub fn clear(&mut self) {
        self.folders.clear();
        self.lists.clear();
        self.selected_folder = None;
        self.selected_list = None;
        self.loading = false;
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
        warn!(context, %err, "sidebar operation rejected");
        self.loading = false;
        self.error = Some(format!("{context}: {err}"));
    }
}

impl<S: KeyValueStore> SidebarSlice<S> {
    /// Load every folder, replacing the cached collection.
    pub async fn load_folders(&mut self) {
        self.begin();
        match self.repo.all_folders().await {
            Ok(folders) => {
                self.folders = folders;
                self.finish();
            }
            Err(err) => self.reject("failed to load folders", &err),
        }
    }

    /// Load the lists of one folder.
    ///
    /// The merge is scoped: cached entries for that folder are dropped and the
    /// freshly loaded ones spliced in (deduplicated by id, last write wins);
    /// entries belonging to other folders stay untouched.
    pub async fn load_lists(&mut self, folder_id: FolderId) {
        self.begin();
        match self.repo.lists_by_folder(folder_id).await {
            Ok(fresh) => {
                self.lists.retain(|list| list.folder_id != folder_id);
                for list in fresh {
                    if let Some(existing) =
                        self.lists.iter_mut().find(|cached| cached.id == list.id)
                    {
                        *existing = list;
                    } else {
                        self.lists.push(list);
                    }
                }
                self.finish();
            }
            Err(err) => self.reject("failed to load lists", &err),
        }
    }

    /// Create a folder and append it to the cached collection.
    pub async fn add_folder(&mut self, name: impl Into<String>) -> Option<Folder> {
        self.begin();
        match self.repo.add_folder(name).await {
            Ok(folder) => {
                if !self.folders.iter().any(|cached| cached.id == folder.id) {
                    self.folders.push(folder.clone());
                }
                self.finish();
                Some(folder)
            }
            Err(err) => {
                self.reject("failed to add folder", &err);
                None
            }
        }
    }

    /// Rename a folder, replacing the cached entry in place.
    pub async fn rename_folder(
        &mut self,
        folder_id: FolderId,
        name: impl Into<String>,
    ) -> Option<Folder> {
        self.begin();
        match self.repo.rename_folder(folder_id, name).await {
            Ok(Some(folder)) => {
                if let Some(cached) = self
                    .folders
                    .iter_mut()
                    .find(|cached| cached.id == folder.id)
                {
                    *cached = folder.clone();
                }
                self.finish();
                Some(folder)
            }
            Ok(None) => {
                self.loading = false;
                self.error = Some(format!("folder {folder_id} not found"));
                None
            }
            Err(err) => {
                self.reject("failed to rename folder", &err);
                None
            }
        }
    }

    /// Delete a folder, mirroring the repository cascade in the cached state:
    /// the folder and every cached list it owned disappear, and dangling
    /// selections are cleared.
    pub async fn delete_folder(&mut self, folder_id: FolderId) {
        self.begin();
        match self.repo.delete_folder(folder_id).await {
            Ok(()) => {
                self.folders.retain(|cached| cached.id != folder_id);
                if self.lists.iter().any(|list| {
                    list.folder_id == folder_id && Some(list.id) == self.selected_list
                }) {
                    self.selected_list = None;
                }
                self.lists.retain(|list| list.folder_id != folder_id);
                if self.selected_folder == Some(folder_id) {
                    self.selected_folder = None;
                    self.selected_list = None;
                }
                self.finish();
            }
            Err(err) => self.reject("failed to delete folder", &err),
        }
    }

    /// Create a list and append it to the cached collection.
    pub async fn add_list(
        &mut self,
        folder_id: FolderId,
        content: impl Into<String>,
    ) -> Option<List> {
        self.begin();
        match self.repo.add_list(folder_id, content).await {
            Ok(list) => {
                if !self.lists.iter().any(|cached| cached.id == list.id) {
                    self.lists.push(list.clone());
                }
                self.finish();
                Some(list)
            }
            Err(err) => {
                self.reject("failed to add list", &err);
                None
            }
        }
    }

    /// Rename a list, replacing the cached entry in place.
    pub async fn rename_list(
        &mut self,
        list_id: ListId,
        content: impl Into<String>,
    ) -> Option<List> {
        self.begin();
        match self.repo.rename_list(list_id, content).await {
            Ok(Some(list)) => {
                if let Some(cached) = self.lists.iter_mut().find(|cached| cached.id == list.id)
                {
                    *cached = list.clone();
                }
                self.finish();
                Some(list)
            }
            Ok(None) => {
                self.loading = false;
                self.error = Some(format!("list {list_id} not found"));
                None
            }
            Err(err) => {
                self.reject("failed to rename list", &err);
                None
            }
        }
    }

    /// Delete a list, clearing the selection when it pointed at it.
    pub async fn delete_list(&mut self, list_id: ListId) {
        self.begin();
        match self.repo.delete_list(list_id).await {
            Ok(()) => {
                self.lists.retain(|cached| cached.id != list_id);
                if self.selected_list == Some(list_id) {
                    self.selected_list = None;
                }
                self.finish();
            }
            Err(err) => self.reject("failed to delete list", &err),
        }
    }
}
