use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

use seans_api::SeedAccount;
use seans_catalog::client::DEFAULT_BASE_URL;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &[DEV_JWT_SECRET, "changeme", "secret", ""];

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub seed: SeedAccount,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("SEANS_HOST", "0.0.0.0");
        let port: u16 = var("SEANS_PORT", "3000")
            .parse()
            .context("SEANS_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

        let jwt_secret = var("SEANS_JWT_SECRET", DEV_JWT_SECRET);
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            warn!("SEANS_JWT_SECRET is a placeholder; set a real secret before deploying");
        }

        let tmdb_api_key = var("TMDB_API_KEY", "");
        if tmdb_api_key.is_empty() {
            warn!("TMDB_API_KEY is not set; catalog requests will fail");
        }

        Ok(Self {
            addr,
            db_path: PathBuf::from(var("SEANS_DB_PATH", "seans.db")),
            jwt_secret,
            seed: SeedAccount {
                username: var("SEANS_ADMIN_USERNAME", "admin"),
                email: var("SEANS_ADMIN_EMAIL", "admin@seans.local"),
                password: var("SEANS_ADMIN_PASSWORD", "admin123"),
            },
            tmdb_api_key,
            tmdb_base_url: var("TMDB_BASE_URL", DEFAULT_BASE_URL),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let defaults = config(&[]).unwrap();
        assert_eq!(defaults.addr.to_string(), "0.0.0.0:3000");
        assert_eq!(defaults.db_path, PathBuf::from("seans.db"));
        assert_eq!(defaults.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(defaults.seed.username, "admin");
        assert_eq!(defaults.tmdb_base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn overrides_and_bad_port() {
        let custom = config(&[
            ("SEANS_HOST", "127.0.0.1"),
            ("SEANS_PORT", "8080"),
            ("SEANS_ADMIN_USERNAME", "szef"),
        ])
        .unwrap();
        assert_eq!(custom.addr.to_string(), "127.0.0.1:8080");
        assert_eq!(custom.seed.username, "szef");

        assert!(config(&[("SEANS_PORT", "http")]).is_err());
    }
}
