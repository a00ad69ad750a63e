use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

const DEFAULT_COVER_URL: &str =
    "https://images.unsplash.com/photo-1490730141103-6cac27aaab94?q=80&w=2940&auto=format&fit=crop";

/// Where uploaded images go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local { dir: PathBuf, public_base_url: String },
    Remote { endpoint: String, api_key: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password_hash: Option<String>,
    pub storage: StorageConfig,
    pub bucket: String,
    pub default_cover_url: String,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("PETAL_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("PETAL_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = var("PETAL_PORT", "3000")
            .parse()
            .context("PETAL_PORT must be a port number")?;
        let max_upload_mb: usize = var("PETAL_MAX_UPLOAD_MB", "20")
            .parse()
            .context("PETAL_MAX_UPLOAD_MB must be a whole number")?;
        let Some(max_upload_bytes) = max_upload_mb.checked_mul(1024 * 1024) else {
            bail!("PETAL_MAX_UPLOAD_MB is too large: {}", max_upload_mb);
        };

        let storage = match (lookup("PETAL_STORAGE_ENDPOINT"), lookup("PETAL_STORAGE_KEY")) {
            (Some(endpoint), Some(api_key)) => StorageConfig::Remote { endpoint, api_key },
            (Some(_), None) => bail!("PETAL_STORAGE_ENDPOINT is set but PETAL_STORAGE_KEY is not"),
            _ => StorageConfig::Local {
                dir: var("PETAL_STORAGE_DIR", "./uploads").into(),
                public_base_url: var("PETAL_PUBLIC_BASE_URL", "http://localhost:3000/files"),
            },
        };

        Ok(Self {
            host: var("PETAL_HOST", "0.0.0.0"),
            port,
            db_path: var("PETAL_DB_PATH", "petal.db").into(),
            jwt_secret,
            admin_username: var("PETAL_ADMIN_USERNAME", "admin"),
            admin_password_hash: lookup("PETAL_ADMIN_PASSWORD_HASH").filter(|h| !h.is_empty()),
            storage,
            bucket: var("PETAL_BUCKET", petal_media::pipeline::DEFAULT_BUCKET),
            default_cover_url: var("PETAL_DEFAULT_COVER_URL", DEFAULT_COVER_URL),
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_use_local_storage() {
        let cfg = config(&[("PETAL_JWT_SECRET", "a-real-secret")]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.admin_username, "admin");
        assert!(cfg.admin_password_hash.is_none());
        assert_eq!(cfg.bucket, "uploads");
        assert_eq!(cfg.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(
            cfg.storage,
            StorageConfig::Local {
                dir: "./uploads".into(),
                public_base_url: "http://localhost:3000/files".into(),
            }
        );
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        assert!(config(&[]).is_err());
        assert!(config(&[("PETAL_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn remote_storage_needs_a_key() {
        let remote = config(&[
            ("PETAL_JWT_SECRET", "s"),
            ("PETAL_STORAGE_ENDPOINT", "https://x.supabase.co/storage/v1"),
            ("PETAL_STORAGE_KEY", "k"),
        ])
        .unwrap();
        assert!(matches!(remote.storage, StorageConfig::Remote { .. }));

        assert!(config(&[
            ("PETAL_JWT_SECRET", "s"),
            ("PETAL_STORAGE_ENDPOINT", "https://x.supabase.co/storage/v1"),
        ])
        .is_err());
    }

    #[test]
    fn oversized_upload_limit_is_an_error() {
        let huge = usize::MAX.to_string();
        assert!(config(&[("PETAL_JWT_SECRET", "s"), ("PETAL_MAX_UPLOAD_MB", huge.as_str())]).is_err());

        let cfg = config(&[("PETAL_JWT_SECRET", "s"), ("PETAL_MAX_UPLOAD_MB", "5")]).unwrap();
        assert_eq!(cfg.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(config(&[("PETAL_JWT_SECRET", "s"), ("PETAL_PORT", "http")]).is_err());
    }
}
