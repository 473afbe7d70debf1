use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::info;

use seans_types::models::InviteCode;

use super::{Actor, Service, now};
use crate::error::ApiError;

pub const INVITE_CODE_LEN: usize = 12;

impl Service {
    /// Issues a new single-use registration code.
    pub fn create_invite_code(&self, actor: &Actor) -> Result<InviteCode, ApiError> {
        Self::require_admin(actor, "Brak uprawnień do tworzenia kodów.")?;

        let code = loop {
            let candidate = generate_code(INVITE_CODE_LEN);
            if !self.db.invite_code_exists(&candidate)? {
                break candidate;
            }
        };

        let invite = InviteCode {
            code,
            created_at: now(),
            created_by: actor.username.clone(),
            used: false,
            used_at: None,
        };
        self.db.insert_invite_code(&invite)?;

        info!("Admin '{}' created an invite code", actor.username);
        Ok(invite)
    }

    pub fn revoke_invite_code(&self, actor: &Actor, code: &str) -> Result<(), ApiError> {
        Self::require_admin(actor, "Brak uprawnień do usuwania kodów.")?;

        if !self.db.delete_invite_code(code.trim())? {
            return Err(ApiError::NotFound("Nie znaleziono kodu."));
        }
        info!("Admin '{}' revoked invite code {}", actor.username, code.trim());
        Ok(())
    }

    pub fn list_invite_codes(&self, actor: &Actor) -> Result<Vec<InviteCode>, ApiError> {
        Self::require_admin(actor, "Brak uprawnień do przeglądania kodów.")?;
        Ok(self.db.list_invite_codes()?)
    }
}

fn generate_code(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
