use sqlx::{migrate::MigrateDatabase, postgres::PgPoolOptions, Pool, Postgres};
use std::{sync::Arc, time::Duration};
use tracing::info;

mod memory;
mod models;
mod repo;
mod traits;

pub use memory::MemoryDb;
pub use traits::{CommentRepo, FolderRepo, MetaRepo, Resource, Store};

#[derive(Clone)]
pub struct Db {
    pub(crate) pool: Pool<Postgres>,
}

impl Db {
    /// Connects, creating the database if needed, and applies pending migrations.
    pub async fn connect(db_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        info!(url = %mask_password(db_url), max_connections, "Connecting to PostgreSQL");

        if !Postgres::database_exists(db_url).await.unwrap_or(false) {
            Postgres::create_database(db_url).await?;
        }
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(db_url)
            .await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;

        info!("Database ready");
        Ok(Self { pool })
    }
}

/// Opens the store named by `db_url`. `memory://` keeps everything in process.
pub async fn open(db_url: &str, max_connections: u32) -> anyhow::Result<Arc<dyn Store>> {
    if db_url.starts_with("memory:") {
        info!("Using in-memory store; data is lost on restart");
        return Ok(Arc::new(MemoryDb::new()));
    }
    Ok(Arc::new(Db::connect(db_url, max_connections).await?))
}

/// Masks the password portion of a database URL for logging.
fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
