use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Child, Comment, Folder};

/// Named resources the board persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Comments,
    Files,
    AdminCredentials,
    AdminToken,
}

impl Resource {
    pub fn key(&self) -> &'static str {
        match self {
            Resource::Comments => "comments",
            Resource::Files => "files",
            Resource::AdminCredentials => "admin_credentials",
            Resource::AdminToken => "admin_token",
        }
    }
}

/// Row-level comment storage. Every mutation touches a single row.
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn insert_comment(&self, comment: &Comment) -> Result<()>;
    async fn get_comment(&self, id: &str) -> Result<Option<Comment>>;
    /// Newest first.
    async fn list_comments(&self, limit: i64, offset: i64) -> Result<(Vec<Comment>, i64)>;
    async fn approve_comment(&self, id: &str) -> Result<Option<Comment>>;
    /// Writes the reply, stamps `reply_date` and publishes the comment.
    /// `content` replaces the body when given. `ip` is never touched.
    async fn reply_comment(
        &self,
        id: &str,
        reply: &str,
        reply_date: DateTime<Utc>,
        content: Option<&str>,
    ) -> Result<Option<Comment>>;
    async fn clear_reply(&self, id: &str) -> Result<Option<Comment>>;
    async fn edit_comment_content(&self, id: &str, content: &str) -> Result<Option<Comment>>;
    async fn delete_comment(&self, id: &str) -> Result<bool>;
    async fn count_comments(&self) -> Result<i64>;
    async fn count_pending(&self) -> Result<i64>;
    async fn count_replied(&self) -> Result<i64>;
}

/// Ordered folder list with per-folder ordered children.
///
/// Positions are dense and 0-based; implementations keep them that way on
/// every insert, delete and move.
#[async_trait]
pub trait FolderRepo: Send + Sync {
    async fn list_folders(&self) -> Result<Vec<Folder>>;
    /// Appends a folder (and any children it carries).
    async fn insert_folder(&self, folder: &Folder) -> Result<()>;
    /// Replaces name, note and children of the folder with `folder.id`.
    async fn update_folder(&self, folder: &Folder) -> Result<bool>;
    async fn delete_folder(&self, id: &str) -> Result<bool>;
    async fn move_folder(&self, from: usize, to: usize) -> Result<bool>;
    async fn insert_child(&self, folder_id: &str, child: &Child, at_start: bool) -> Result<bool>;
    /// Child writes only match a child of `folder_id`.
    async fn update_child(&self, folder_id: &str, child: &Child) -> Result<bool>;
    async fn delete_child(&self, folder_id: &str, id: &str) -> Result<bool>;
    async fn replace_folders(&self, folders: &[Folder]) -> Result<()>;
}

/// Singleton key/value resources.
#[async_trait]
pub trait MetaRepo: Send + Sync {
    async fn get_meta(&self, key: &str) -> Result<Option<String>>;
    async fn set_meta(&self, key: &str, value: &str) -> Result<()>;
    async fn meta_exists(&self, key: &str) -> Result<bool>;
    async fn delete_meta(&self, key: &str) -> Result<bool>;
}

#[async_trait]
pub trait Store: CommentRepo + FolderRepo + MetaRepo {
    /// Whether anything is stored under `resource`.
    async fn resource_exists(&self, resource: Resource) -> Result<bool> {
        match resource {
            Resource::Comments => Ok(self.count_comments().await? > 0),
            Resource::Files => Ok(!self.list_folders().await?.is_empty()),
            Resource::AdminCredentials | Resource::AdminToken => {
                self.meta_exists(resource.key()).await
            }
        }
    }
}
