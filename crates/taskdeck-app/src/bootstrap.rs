//! First-run initialization.

use tracing::info;

use taskdeck_core::{Folder, List};
use taskdeck_store_kv::StoreError;

use crate::kv::KeyValueStore;
use crate::repository::Repository;

/// Name of the folder created on first run.
pub const DEFAULT_FOLDER_NAME: &str = "My Folder";
/// Name of the list created on first run.
pub const DEFAULT_LIST_NAME: &str = "My Tasks";

/// Ensure at least one folder and one list exist.
///
/// Idempotent check-then-create, meant to run once at process start rather
/// than from any particular view. Returns the created pair on a fresh store
/// and `None` when folders already exist. The check and the creation are not
/// one atomic step; two racing processes can both seed defaults.
///
/// # Errors
/// Returns an error when the store fails.
pub async fn ensure_default_data<S: KeyValueStore>(
    repo: &Repository<S>,
) -> Result<Option<(Folder, List)>, StoreError> {
    if !repo.all_folders().await?.is_empty() {
        return Ok(None);
    }

    let folder = repo.add_folder(DEFAULT_FOLDER_NAME).await?;
    let list = repo.add_list(folder.id, DEFAULT_LIST_NAME).await?;
    info!(folder = %folder.id, list = %list.id, "seeded default folder and list");
    Ok(Some((folder, list)))
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use taskdeck_store_kv::MemoryStore;

    #[tokio::test]
    async fn seeds_once_and_only_once() {
        let repo = Repository::new(MemoryStore::new());

        let seeded = ensure_default_data(&repo)
            .await
            .expect("bootstrap")
            .expect("fresh store seeds defaults");
        assert_eq!(seeded.0.name, DEFAULT_FOLDER_NAME);
        assert_eq!(seeded.1.content, DEFAULT_LIST_NAME);
        assert_eq!(seeded.1.folder_id, seeded.0.id);

        // Second run is a no-op.
        assert!(ensure_default_data(&repo).await.expect("bootstrap").is_none());
        assert_eq!(repo.all_folders().await.expect("folders").len(), 1);
    }

    #[tokio::test]
    async fn existing_folders_suppress_seeding() {
        let repo = Repository::new(MemoryStore::new());
        repo.add_folder("Mine").await.expect("add folder");

        assert!(ensure_default_data(&repo).await.expect("bootstrap").is_none());
        let folders = repo.all_folders().await.expect("folders");
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Mine");
    }
}
