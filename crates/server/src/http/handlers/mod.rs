pub mod auth;
pub mod comments;
pub mod file_manager;
pub mod files;
pub mod health;
