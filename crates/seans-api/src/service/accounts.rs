use tracing::{info, warn};
use uuid::Uuid;

use seans_db::models::{NewUser, Registration, SessionStart};
use seans_types::models::{Role, UserProfile};

use super::{Actor, MIN_PASSWORD_LEN, Service, hash_password, now, verify_password};
use crate::error::ApiError;

const MAX_USERNAME_LEN: usize = 15;

/// A successful login: the new session and the user it belongs to.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session_id: Uuid,
    pub user: UserProfile,
}

impl LoginOutcome {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user.id,
            session_id: self.session_id,
            username: self.user.username.clone(),
            role: self.user.role,
        }
    }
}

impl Service {
    /// Inserts missing seed accounts. Existing records win, so a changed
    /// password survives restarts.
    pub fn ensure_seed_accounts(&self) -> Result<(), ApiError> {
        for seed in &self.seeds {
            let password_hash = hash_password(&seed.password)?;
            let inserted = self.db.ensure_seed_user(&NewUser {
                id: Uuid::new_v4(),
                username: &seed.username,
                email: &seed.email,
                password_hash: &password_hash,
                role: Role::Admin,
                protected: true,
                created_at: now(),
            })?;
            if inserted {
                info!("Seed account '{}' created", seed.username);
            }
        }
        Ok(())
    }

    pub fn is_protected_account(&self, username: &str) -> Result<bool, ApiError> {
        Ok(self
            .db
            .get_user_by_username(username.trim())?
            .is_some_and(|row| row.protected))
    }

    pub fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let row = self
            .db
            .get_user_by_username(username.trim())?
            .ok_or(ApiError::Unauthorized("Nie znaleziono konta o podanym loginie."))?;

        if !verify_password(&row.password, password)? {
            return Err(ApiError::Unauthorized("Nieprawidłowe hasło."));
        }

        let mut user = row.to_profile()?;
        let session_id = Uuid::new_v4();

        // Password hashing runs without the store lock, so the block is
        // checked again inside the session transaction.
        match self.db.open_session(session_id, &row.id, now())? {
            SessionStart::Opened { cleared_block } => {
                // an opened session means the stored block is clear
                user.blocked_until = None;
                user.blocked_at = None;
                if cleared_block {
                    info!("Expired block of '{}' cleared at login", user.username);
                }
            }
            SessionStart::Blocked { until } => {
                warn!("Blocked user '{}' tried to log in", user.username);
                return Err(ApiError::Blocked { until });
            }
            SessionStart::UserGone => {
                return Err(ApiError::Unauthorized("Nie znaleziono konta o podanym loginie."));
            }
        }

        info!("User '{}' logged in", user.username);
        Ok(LoginOutcome { session_id, user })
    }

    pub fn logout(&self, actor: &Actor) -> Result<(), ApiError> {
        self.db.delete_session(actor.session_id)?;
        info!("User '{}' logged out", actor.username);
        Ok(())
    }

    /// Resolves a live session. Username and role come from the store, so
    /// changes apply to tokens issued before them.
    pub fn authenticate(&self, session_id: Uuid) -> Result<Actor, ApiError> {
        const EXPIRED: ApiError = ApiError::Unauthorized("Sesja wygasła. Zaloguj się ponownie.");

        let session = self.db.get_session(session_id)?.ok_or(EXPIRED)?;
        let row = self.db.get_user_by_id(&session.user_id)?.ok_or(EXPIRED)?;

        Ok(Actor {
            user_id: row.user_id()?,
            session_id,
            username: row.username.clone(),
            role: row.role(),
        })
    }

    pub fn current_user(&self, actor: &Actor) -> Result<UserProfile, ApiError> {
        let row = self
            .db
            .get_user_by_id(&actor.user_id.to_string())?
            .ok_or(ApiError::NotFound("Nie znaleziono konta."))?;
        Ok(row.to_profile()?)
    }

    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        invite_code: &str,
    ) -> Result<UserProfile, ApiError> {
        let username = username.trim();
        let email = email.trim();
        let invite_code = invite_code.trim();

        if username.is_empty() {
            return Err(ApiError::Validation("Podaj login."));
        }
        if !is_valid_username(username) {
            return Err(ApiError::Validation(
                "Login może zawierać maksymalnie 15 liter/cyfr (bez spacji i znaków specjalnych).",
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation("Hasło musi mieć co najmniej 6 znaków."));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::Validation("Podaj poprawny adres email."));
        }
        if invite_code.is_empty() {
            return Err(ApiError::Validation("Podaj kod rejestracyjny."));
        }

        let password_hash = hash_password(password)?;
        let registered_at = now();
        let new_user = NewUser {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash: &password_hash,
            role: Role::User,
            protected: false,
            created_at: registered_at,
        };

        match self.db.register_with_invite(&new_user, invite_code, registered_at)? {
            Registration::Created => {}
            Registration::UsernameTaken => return Err(ApiError::Conflict("Ten login jest już zajęty.")),
            Registration::EmailTaken => return Err(ApiError::Conflict("Ten email jest już używany.")),
            Registration::InviteRejected => {
                warn!("Registration of '{}' rejected: invalid invite code", username);
                return Err(ApiError::InvalidInvite);
            }
        }

        info!("User '{}' registered", username);
        let row = self
            .db
            .get_user_by_id(&new_user.id.to_string())?
            .ok_or_else(|| anyhow::anyhow!("User '{}' vanished after registration", username))?;
        Ok(row.to_profile()?)
    }

    pub fn change_password(
        &self,
        actor: &Actor,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let username = username.trim();
        if !username.eq_ignore_ascii_case(&actor.username) {
            return Err(ApiError::Forbidden("Nie możesz zmienić hasła innego użytkownika."));
        }

        let row = self
            .db
            .get_user_by_username(username)?
            .ok_or(ApiError::NotFound("Nie znaleziono konta."))?;

        if !verify_password(&row.password, current_password)? {
            return Err(ApiError::Validation("Nieprawidłowe aktualne hasło."));
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation("Nowe hasło musi mieć co najmniej 6 znaków."));
        }

        self.db.set_password(&row.username, &hash_password(new_password)?)?;
        info!("User '{}' changed password", row.username);
        Ok(())
    }

    pub fn admin_reset_password(
        &self,
        actor: &Actor,
        target_username: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        Self::require_admin(actor, "Brak uprawnień do resetu hasła.")?;

        if target_username.trim().is_empty() {
            return Err(ApiError::Validation("Podaj nazwę użytkownika."));
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation("Nowe hasło musi mieć co najmniej 6 znaków."));
        }

        let target = self.find_user(target_username)?;
        if target.protected {
            return Err(ApiError::Forbidden("Nie można zresetować hasła konta administracyjnego."));
        }

        self.db.set_password(&target.username, &hash_password(new_password)?)?;
        info!("Admin '{}' reset password of '{}'", actor.username, target.username);
        Ok(())
    }

    pub fn list_users(&self, actor: &Actor) -> Result<Vec<UserProfile>, ApiError> {
        Self::require_admin(actor, "Brak uprawnień do przeglądania użytkowników.")?;
        self.db
            .list_users()?
            .iter()
            .map(|row| row.to_profile().map_err(ApiError::from))
            .collect()
    }
}

fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username.chars().all(|c| c.is_ascii_alphanumeric())
}
