use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Child, Comment, Folder};
use tokio::sync::RwLock;

use crate::{CommentRepo, FolderRepo, MetaRepo, Store};

#[derive(Default)]
struct Tables {
    comments: Vec<Comment>,
    folders: Vec<Folder>,
    meta: HashMap<String, String>,
}

/// In-process store with the same row-level semantics as [`crate::Db`].
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

fn update_comment<F>(tables: &mut Tables, id: &str, f: F) -> Option<Comment>
where
    F: FnOnce(&mut Comment),
{
    let comment = tables.comments.iter_mut().find(|c| c.id == id)?;
    f(comment);
    Some(comment.clone())
}

#[async_trait]
impl CommentRepo for MemoryDb {
    async fn insert_comment(&self, comment: &Comment) -> anyhow::Result<()> {
        let mut tables = self.inner.write().await;
        if tables.comments.iter().any(|c| c.id == comment.id) {
            anyhow::bail!("duplicate comment id {}", comment.id);
        }
        tables.comments.push(comment.clone());
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> anyhow::Result<Option<Comment>> {
        let tables = self.inner.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(&self, limit: i64, offset: i64) -> anyhow::Result<(Vec<Comment>, i64)> {
        let tables = self.inner.read().await;
        let mut sorted: Vec<&Comment> = tables.comments.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

        let page = sorted
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, tables.comments.len() as i64))
    }

    async fn approve_comment(&self, id: &str) -> anyhow::Result<Option<Comment>> {
        let mut tables = self.inner.write().await;
        Ok(update_comment(&mut tables, id, |c| c.approved = true))
    }

    async fn reply_comment(
        &self,
        id: &str,
        reply: &str,
        reply_date: DateTime<Utc>,
        content: Option<&str>,
    ) -> anyhow::Result<Option<Comment>> {
        let mut tables = self.inner.write().await;
        Ok(update_comment(&mut tables, id, |c| {
            c.reply = Some(reply.to_string());
            c.reply_date = Some(reply_date);
            c.approved = true;
            if let Some(content) = content {
                c.content = content.to_string();
            }
        }))
    }

    async fn clear_reply(&self, id: &str) -> anyhow::Result<Option<Comment>> {
        let mut tables = self.inner.write().await;
        Ok(update_comment(&mut tables, id, |c| {
            c.reply = None;
            c.reply_date = None;
        }))
    }

    async fn edit_comment_content(
        &self,
        id: &str,
        content: &str,
    ) -> anyhow::Result<Option<Comment>> {
        let mut tables = self.inner.write().await;
        Ok(update_comment(&mut tables, id, |c| {
            c.content = content.to_string()
        }))
    }

    async fn delete_comment(&self, id: &str) -> anyhow::Result<bool> {
        let mut tables = self.inner.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        Ok(tables.comments.len() < before)
    }

    async fn count_comments(&self) -> anyhow::Result<i64> {
        Ok(self.inner.read().await.comments.len() as i64)
    }

    async fn count_pending(&self) -> anyhow::Result<i64> {
        let tables = self.inner.read().await;
        Ok(tables.comments.iter().filter(|c| !c.approved).count() as i64)
    }

    async fn count_replied(&self) -> anyhow::Result<i64> {
        let tables = self.inner.read().await;
        Ok(tables.comments.iter().filter(|c| c.is_replied()).count() as i64)
    }
}

#[async_trait]
impl FolderRepo for MemoryDb {
    async fn list_folders(&self) -> anyhow::Result<Vec<Folder>> {
        Ok(self.inner.read().await.folders.clone())
    }

    async fn insert_folder(&self, folder: &Folder) -> anyhow::Result<()> {
        self.inner.write().await.folders.push(folder.clone());
        Ok(())
    }

    async fn update_folder(&self, folder: &Folder) -> anyhow::Result<bool> {
        let mut tables = self.inner.write().await;
        match tables.folders.iter_mut().find(|f| f.id == folder.id) {
            Some(existing) => {
                existing.name = folder.name.clone();
                existing.note = folder.note.clone();
                existing.children = folder.children.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_folder(&self, id: &str) -> anyhow::Result<bool> {
        let mut tables = self.inner.write().await;
        let before = tables.folders.len();
        tables.folders.retain(|f| f.id != id);
        Ok(tables.folders.len() < before)
    }

    async fn move_folder(&self, from: usize, to: usize) -> anyhow::Result<bool> {
        let mut tables = self.inner.write().await;
        let len = tables.folders.len();
        if from >= len || to >= len {
            return Ok(false);
        }
        let moved = tables.folders.remove(from);
        tables.folders.insert(to, moved);
        Ok(true)
    }

    async fn insert_child(
        &self,
        folder_id: &str,
        child: &Child,
        at_start: bool,
    ) -> anyhow::Result<bool> {
        let mut tables = self.inner.write().await;
        let Some(folder) = tables.folders.iter_mut().find(|f| f.id == folder_id) else {
            return Ok(false);
        };
        if at_start {
            folder.children.insert(0, child.clone());
        } else {
            folder.children.push(child.clone());
        }
        Ok(true)
    }

    async fn update_child(&self, folder_id: &str, child: &Child) -> anyhow::Result<bool> {
        let mut tables = self.inner.write().await;
        let existing = tables
            .folders
            .iter_mut()
            .find(|f| f.id == folder_id)
            .and_then(|f| f.children.iter_mut().find(|c| c.id == child.id));
        match existing {
            Some(existing) => {
                *existing = child.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_child(&self, folder_id: &str, id: &str) -> anyhow::Result<bool> {
        let mut tables = self.inner.write().await;
        let Some(folder) = tables.folders.iter_mut().find(|f| f.id == folder_id) else {
            return Ok(false);
        };
        match folder.children.iter().position(|c| c.id == id) {
            Some(pos) => {
                folder.children.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn replace_folders(&self, folders: &[Folder]) -> anyhow::Result<()> {
        self.inner.write().await.folders = folders.to_vec();
        Ok(())
    }
}

#[async_trait]
impl MetaRepo for MemoryDb {
    async fn get_meta(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.inner.read().await.meta.get(key).cloned())
    }

    async fn set_meta(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.inner
            .write()
            .await
            .meta
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn meta_exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.inner.read().await.meta.contains_key(key))
    }

    async fn delete_meta(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.inner.write().await.meta.remove(key).is_some())
    }
}

impl Store for MemoryDb {}
