use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use storage::{Resource, Store};
use tracing::{info, warn};

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const MIN_PASSWORD_LEN: usize = 6;

/// Stored under `admin_credentials` as one JSON document.
#[derive(Serialize, Deserialize)]
struct Credentials {
    username: String,
    /// Argon2id PHC string; carries its own salt and parameters.
    password_hash: String,
}

impl Credentials {
    fn new(username: &str, password: &str) -> Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Storage(anyhow::anyhow!("password hashing failed: {}", e)))?
            .to_string();
        Ok(Self {
            username: username.to_string(),
            password_hash,
        })
    }

    fn verify(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
            warn!("Stored admin password hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

fn generate_token() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

/// Compares secrets by their HMAC tags under a throwaway key, so timing is
/// independent of where the inputs differ and of their lengths.
fn secrets_match(expected: &str, presented: &str) -> bool {
    let key = rand::random::<[u8; 32]>();
    let tag = |value: &str| {
        HmacSha256::new_from_slice(&key).map(|mut mac| {
            mac.update(value.as_bytes());
            mac
        })
    };
    let (Ok(expected), Ok(presented)) = (tag(expected), tag(presented)) else {
        return false;
    };
    presented
        .verify_slice(&expected.finalize().into_bytes())
        .is_ok()
}

/// Initial admin identity, applied only where nothing is stored yet.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub token: Option<String>,
}

/// Single shared admin token guarding every mutation.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// One-time setup run by the process bootstrap.
    pub async fn bootstrap(&self, seed: &AdminSeed) -> Result<()> {
        if !self.store.resource_exists(Resource::AdminCredentials).await? {
            let credentials = Credentials::new(&seed.username, &seed.password)?;
            self.save_credentials(&credentials).await?;
            warn!(username = %seed.username, "Seeded admin credentials from configuration; change the password");
        }

        if !self.store.resource_exists(Resource::AdminToken).await? {
            let token = seed
                .token
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(generate_token);
            self.store
                .set_meta(Resource::AdminToken.key(), &token)
                .await?;
            info!("Admin token initialised");
        }
        Ok(())
    }

    async fn load_credentials(&self) -> Result<Option<Credentials>> {
        let Some(raw) = self.store.get_meta(Resource::AdminCredentials.key()).await? else {
            return Ok(None);
        };
        let credentials = serde_json::from_str(&raw)
            .map_err(|e| AppError::Storage(anyhow::anyhow!("corrupt admin credentials: {}", e)))?;
        Ok(Some(credentials))
    }

    async fn save_credentials(&self, credentials: &Credentials) -> Result<()> {
        let raw = serde_json::to_string(credentials)
            .map_err(|e| AppError::Storage(anyhow::anyhow!(e)))?;
        self.store
            .set_meta(Resource::AdminCredentials.key(), &raw)
            .await?;
        Ok(())
    }

    /// Exchanges username and password for the shared admin token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let valid = match self.load_credentials().await? {
            Some(c) => secrets_match(&c.username, username) && c.verify(password),
            None => false,
        };
        if !valid {
            warn!(username = %username, "Failed admin login");
            return Err(AppError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        let token = match self.store.get_meta(Resource::AdminToken.key()).await? {
            Some(token) => token,
            None => {
                let token = generate_token();
                self.store
                    .set_meta(Resource::AdminToken.key(), &token)
                    .await?;
                warn!("Admin token was missing and has been regenerated");
                token
            }
        };
        info!(username = %username, "Admin logged in");
        Ok(token)
    }

    pub async fn verify(&self, token: &str) -> Result<bool> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(false);
        }
        Ok(match self.store.get_meta(Resource::AdminToken.key()).await? {
            Some(stored) => secrets_match(&stored, token),
            None => false,
        })
    }

    /// Gate for mutating operations.
    pub async fn authorize(&self, token: Option<&str>) -> Result<()> {
        let Some(token) = token else {
            return Err(AppError::Unauthorized(
                "Missing Authorization header".to_string(),
            ));
        };
        if !self.verify(token).await? {
            return Err(AppError::Unauthorized("Invalid admin token".to_string()));
        }
        Ok(())
    }

    pub async fn change_password(&self, current: &str, new_password: &str) -> Result<()> {
        let credentials = self
            .load_credentials()
            .await?
            .ok_or_else(|| AppError::Unauthorized("No admin account configured".to_string()))?;
        if !credentials.verify(current) {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "New password must be at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }

        let updated = Credentials::new(&credentials.username, new_password)?;
        self.save_credentials(&updated).await?;
        info!(username = %credentials.username, "Admin password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::{MemoryDb, MetaRepo};

    fn seed(token: Option<&str>) -> AdminSeed {
        AdminSeed {
            username: "admin".into(),
            password: "secret-pass".into(),
            token: token.map(Into::into),
        }
    }

    #[test]
    fn passwords_are_stored_as_argon2_phc() {
        let a = Credentials::new("admin", "pw123456").unwrap();
        let b = Credentials::new("admin", "pw123456").unwrap();
        assert!(a.password_hash.starts_with("$argon2id$"));
        assert_ne!(a.password_hash, b.password_hash);
        assert!(a.verify("pw123456"));
        assert!(!a.verify("pw1234567"));

        let corrupt = Credentials {
            username: "admin".into(),
            password_hash: "not-a-hash".into(),
        };
        assert!(!corrupt.verify("pw123456"));
    }

    #[test]
    fn secret_comparison() {
        assert!(secrets_match("token-abc", "token-abc"));
        assert!(!secrets_match("token-abc", "token-abd"));
        assert!(!secrets_match("token-abc", "token-ab"));
        assert!(!secrets_match("token-abc", ""));
    }

    #[tokio::test]
    async fn login_returns_stored_token() {
        let db = MemoryDb::new();
        let auth = AuthService::new(Arc::new(db.clone()));
        auth.bootstrap(&seed(Some("fixed-token"))).await.unwrap();

        let token = auth.login("admin", "secret-pass").await.unwrap();
        assert_eq!(token, "fixed-token");
        assert!(auth.verify("fixed-token").await.unwrap());
        assert!(!auth.verify("other").await.unwrap());
        assert!(auth.authorize(Some("fixed-token")).await.is_ok());
        assert!(matches!(
            auth.authorize(None).await,
            Err(AppError::Unauthorized(_))
        ));

        assert!(matches!(
            auth.login("admin", "wrong").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.login("root", "secret-pass").await,
            Err(AppError::Unauthorized(_))
        ));

        let raw = db.get_meta("admin_credentials").await.unwrap().unwrap();
        assert!(!raw.contains("secret-pass"));
    }

    #[tokio::test]
    async fn bootstrap_does_not_overwrite() {
        let auth = AuthService::new(Arc::new(MemoryDb::new()));
        auth.bootstrap(&seed(None)).await.unwrap();
        let token = auth.login("admin", "secret-pass").await.unwrap();
        assert!(!token.is_empty());

        auth.change_password("secret-pass", "another-pass").await.unwrap();
        auth.bootstrap(&seed(Some("ignored"))).await.unwrap();

        assert!(auth.login("admin", "secret-pass").await.is_err());
        assert_eq!(auth.login("admin", "another-pass").await.unwrap(), token);
    }

    #[tokio::test]
    async fn change_password_rules() {
        let auth = AuthService::new(Arc::new(MemoryDb::new()));
        auth.bootstrap(&seed(None)).await.unwrap();

        assert!(matches!(
            auth.change_password("nope", "another-pass").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.change_password("secret-pass", "123").await,
            Err(AppError::Validation(_))
        ));
    }
}
