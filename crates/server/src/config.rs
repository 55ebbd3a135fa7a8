use config::ConfigError;
use domain::MaskRule;
use serde::Deserialize;
use services::{AdminSeed, CommentSettings};
use std::collections::HashMap;

const ENV_PREFIX: &str = "NOTICEBOARD_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub admin: AdminSettings,
    pub comments: CommentsSettings,
    pub masking: MaskingSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    /// `postgres://…`, or `memory://` for a throwaway in-process store.
    pub url: String,
    pub max_connections: u32,
}

/// Seed identity; ignored once credentials are stored.
#[derive(Deserialize, Clone)]
pub struct AdminSettings {
    pub username: String,
    pub password: String,
    pub token: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct CommentsSettings {
    pub page_size: u32,
    pub max_page_size: u32,
    pub placeholder: String,
}

#[derive(Deserialize, Clone)]
pub struct MaskingSettings {
    pub rule: MaskRule,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();
        let env_json =
            serde_json::to_string(&env_map).map_err(|e| ConfigError::Message(e.to_string()))?;

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "memory://")?
            .set_default("database.max_connections", 5)?
            .set_default("admin.username", "admin")?
            .set_default("admin.password", "admin123")?
            .set_default("comments.page_size", 10)?
            .set_default("comments.max_page_size", 100)?
            .set_default("comments.placeholder", "This comment is awaiting review")?
            .set_default("masking.rule", "narrow")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(&env_json, config::FileFormat::Json))
            .build()?;

        s.try_deserialize()
    }

    pub fn admin_seed(&self) -> AdminSeed {
        AdminSeed {
            username: self.admin.username.clone(),
            password: self.admin.password.clone(),
            token: self.admin.token.clone(),
        }
    }

    pub fn comment_settings(&self) -> CommentSettings {
        CommentSettings {
            default_page_size: self.comments.page_size,
            max_page_size: self.comments.max_page_size,
            placeholder: self.comments.placeholder.clone(),
            mask_rule: self.masking.rule,
        }
    }
}

/// `NOTICEBOARD_DATABASE__URL` -> `database.url`
fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches(ENV_PREFIX)
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}
