//! Authorization and moderation rules over the record store.
//!
//! Every operation is synchronous and takes the acting user explicitly;
//! HTTP handlers run them on the blocking pool.

pub mod accounts;
pub mod chat;
pub mod help;
pub mod invites;
pub mod moderation;
pub mod streaming;

use anyhow::anyhow;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use seans_db::Database;
use seans_db::models::UserRow;
use seans_types::models::Role;

use crate::error::ApiError;

pub use accounts::LoginOutcome;
pub use streaming::{STREAMING_SERVICES, StreamingService};

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

/// The authenticated user behind a request.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An account created at startup. Seed accounts are admins and are exempt
/// from moderation.
#[derive(Debug, Clone)]
pub struct SeedAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct Service {
    db: Database,
    seeds: Vec<SeedAccount>,
}

impl Service {
    pub fn new(db: Database, seeds: Vec<SeedAccount>) -> Self {
        Self { db, seeds }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    fn require_admin(actor: &Actor, denied: &'static str) -> Result<(), ApiError> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(denied))
        }
    }

    fn find_user(&self, username: &str) -> Result<UserRow, ApiError> {
        self.db
            .get_user_by_username(username.trim())?
            .ok_or(ApiError::NotFound("Nie znaleziono użytkownika."))
    }
}

/// Current time at the store's microsecond precision, so values handed back
/// to callers compare equal to what a later read returns.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub(crate) fn verify_password(hash: &str, password: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("Corrupt password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub const ADMIN: &str = "admin";
    pub const ADMIN_PASSWORD: &str = "admin123";

    pub fn service() -> Service {
        let db = Database::open_in_memory().unwrap();
        let service = Service::new(
            db,
            vec![SeedAccount {
                username: ADMIN.into(),
                email: "admin@seans.local".into(),
                password: ADMIN_PASSWORD.into(),
            }],
        );
        service.ensure_seed_accounts().unwrap();
        service
    }

    pub fn login(service: &Service, username: &str, password: &str) -> Actor {
        let outcome = service.login(username, password).unwrap();
        outcome.actor()
    }

    pub fn admin(service: &Service) -> Actor {
        login(service, ADMIN, ADMIN_PASSWORD)
    }

    /// Registers `username` with password `haslo123` through a fresh invite.
    pub fn register(service: &Service, username: &str) -> Actor {
        let admin = admin(service);
        let invite = service.create_invite_code(&admin).unwrap();
        service
            .register(username, &format!("{username}@example.com"), "haslo123", &invite.code)
            .unwrap();
        login(service, username, "haslo123")
    }
}
