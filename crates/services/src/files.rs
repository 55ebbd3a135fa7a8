use std::{collections::HashSet, sync::Arc};

use domain::{new_id, Child, ChildInput, Folder, FolderInput};
use storage::Store;
use tracing::info;

use crate::error::{AppError, Result};

/// Folder tree addressed by position, as the admin console sees it.
///
/// Positions are resolved to stable ids here; storage never sees an index
/// except for whole-list moves.
#[derive(Clone)]
pub struct FileService {
    store: Arc<dyn Store>,
}

impl FileService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        Ok(self.store.list_folders().await?)
    }

    async fn folder_at(&self, index: usize) -> Result<Folder> {
        self.store
            .list_folders()
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| AppError::NotFound(format!("folder at index {}", index)))
    }

    async fn child_at(&self, folder_index: usize, child_index: usize) -> Result<(String, Child)> {
        let folder = self.folder_at(folder_index).await?;
        let child = folder
            .children
            .into_iter()
            .nth(child_index)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "file at index {} in folder {}",
                    child_index, folder_index
                ))
            })?;
        Ok((folder.id, child))
    }

    /// Creates an empty folder at the end of the list.
    pub async fn create_folder(&self, input: FolderInput) -> Result<Folder> {
        let mut folder = Folder::from_input(input).map_err(AppError::Validation)?;
        folder.id = new_id();
        folder.children.clear();

        self.store.insert_folder(&folder).await?;
        info!(folder_id = %folder.id, name = %folder.name, "Folder created");
        Ok(folder)
    }

    /// Full replace of the folder at `index`, children included.
    ///
    /// Incoming child ids already used elsewhere in the tree are regenerated.
    pub async fn update_folder(&self, index: usize, input: FolderInput) -> Result<Folder> {
        let folders = self.store.list_folders().await?;
        let existing = folders
            .get(index)
            .ok_or_else(|| AppError::NotFound(format!("folder at index {}", index)))?;
        let mut folder = Folder::from_input(input).map_err(AppError::Validation)?;
        folder.id = existing.id.clone();

        let mut seen: HashSet<String> = folders
            .iter()
            .filter(|f| f.id != folder.id)
            .flat_map(|f| f.children.iter().map(|c| c.id.clone()))
            .collect();
        dedupe_child_ids(&mut folder.children, &mut seen);

        if !self.store.update_folder(&folder).await? {
            return Err(AppError::NotFound(format!("folder at index {}", index)));
        }
        info!(folder_id = %folder.id, children = folder.children.len(), "Folder updated");
        Ok(folder)
    }

    pub async fn delete_folder(&self, index: usize) -> Result<()> {
        let folder = self.folder_at(index).await?;
        if !self.store.delete_folder(&folder.id).await? {
            return Err(AppError::NotFound(format!("folder at index {}", index)));
        }
        info!(folder_id = %folder.id, "Folder deleted");
        Ok(())
    }

    pub async fn list_children(&self, folder_index: usize) -> Result<Vec<Child>> {
        Ok(self.folder_at(folder_index).await?.children)
    }

    /// Adds a file or divider. `at_start` is the console's quick-add path.
    pub async fn add_child(
        &self,
        folder_index: usize,
        input: ChildInput,
        at_start: bool,
    ) -> Result<Child> {
        let folder = self.folder_at(folder_index).await?;
        let mut child = Child::from_input(input).map_err(AppError::Validation)?;
        child.id = new_id();

        if !self.store.insert_child(&folder.id, &child, at_start).await? {
            return Err(AppError::NotFound(format!("folder at index {}", folder_index)));
        }
        info!(folder_id = %folder.id, child_id = %child.id, kind = child.kind.as_str(), "File added");
        Ok(child)
    }

    pub async fn update_child(
        &self,
        folder_index: usize,
        child_index: usize,
        mut input: ChildInput,
    ) -> Result<Child> {
        let (folder_id, existing) = self.child_at(folder_index, child_index).await?;
        if input.created_at.is_none() {
            input.created_at = Some(existing.created_at.clone());
        }
        let mut child = Child::from_input(input).map_err(AppError::Validation)?;
        child.id = existing.id;

        if !self.store.update_child(&folder_id, &child).await? {
            return Err(AppError::NotFound(format!("file {}", child.id)));
        }
        info!(child_id = %child.id, "File updated");
        Ok(child)
    }

    pub async fn delete_child(&self, folder_index: usize, child_index: usize) -> Result<()> {
        let (folder_id, child) = self.child_at(folder_index, child_index).await?;
        if !self.store.delete_child(&folder_id, &child.id).await? {
            return Err(AppError::NotFound(format!("file {}", child.id)));
        }
        info!(child_id = %child.id, "File deleted");
        Ok(())
    }

    /// Moves the folder at `from` so that it ends up at `to`.
    pub async fn reorder(&self, from: usize, to: usize) -> Result<()> {
        if !self.store.move_folder(from, to).await? {
            return Err(AppError::NotFound(format!(
                "folder positions {} -> {}",
                from, to
            )));
        }
        info!(from, to, "Folders reordered");
        Ok(())
    }

    /// Bulk import. Overwrites the whole tree and returns the folder count.
    pub async fn replace_all(&self, inputs: Vec<FolderInput>) -> Result<usize> {
        let mut folders = inputs
            .into_iter()
            .map(Folder::from_input)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AppError::Validation)?;

        let mut folder_ids = HashSet::new();
        let mut child_ids = HashSet::new();
        for folder in folders.iter_mut() {
            if !folder_ids.insert(folder.id.clone()) {
                folder.id = new_id();
                folder_ids.insert(folder.id.clone());
            }
            dedupe_child_ids(&mut folder.children, &mut child_ids);
        }

        self.store.replace_folders(&folders).await?;
        info!(count = folders.len(), "Folder tree replaced");
        Ok(folders.len())
    }
}

fn dedupe_child_ids(children: &mut [Child], seen: &mut HashSet<String>) {
    for child in children.iter_mut() {
        if !seen.insert(child.id.clone()) {
            child.id = new_id();
            seen.insert(child.id.clone());
        }
    }
}
