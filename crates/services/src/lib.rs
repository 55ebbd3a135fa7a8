mod auth;
mod comments;
mod error;
mod files;

pub use auth::{AdminSeed, AuthService};
pub use comments::{CommentListing, CommentService, CommentSettings};
pub use error::{AppError, Result};
pub use files::FileService;
