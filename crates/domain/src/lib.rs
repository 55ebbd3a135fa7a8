mod commands;
mod files;
pub mod masking;
mod models;
mod pagination;

pub use commands::CommentUpdate;
pub use files::{Child, ChildInput, ChildKind, Folder, FolderInput, FolderTag, DIVIDER_MARKER};
pub use masking::{mask, MaskRule};
pub use models::{
    new_id, validate_content, Comment, CommentStats, Contact, PublicComment,
};
pub use pagination::{CommentPage, PageRequest};
