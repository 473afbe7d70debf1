use chrono::{DateTime, Duration, Utc};
use tracing::info;

use super::chat::{system_message, unmuted_notice};
use super::{Actor, Service, now};
use crate::error::ApiError;

pub const DEFAULT_BLOCK_DAYS: u32 = 3;
pub const DEFAULT_MUTE_HOURS: u32 = 24;

/// Longest block or mute, about a hundred years.
pub const MAX_BLOCK_DAYS: u32 = 36_500;
pub const MAX_MUTE_HOURS: u32 = MAX_BLOCK_DAYS * 24;

/// `now + length`, or `None` when it does not fit in a timestamp.
fn sanction_end(now: DateTime<Utc>, length: Option<Duration>) -> Option<DateTime<Utc>> {
    length.and_then(|length| now.checked_add_signed(length))
}

impl Service {
    /// Blocks login for `days` (default 3) and ends the target's sessions.
    pub fn block_user_for_days(
        &self,
        actor: &Actor,
        username: &str,
        days: Option<u32>,
    ) -> Result<DateTime<Utc>, ApiError> {
        Self::require_admin(actor, "Brak uprawnień do blokowania użytkowników.")?;

        let days = days.unwrap_or(DEFAULT_BLOCK_DAYS);
        if days == 0 {
            return Err(ApiError::Validation("Liczba dni blokady musi być większa od zera."));
        }
        if days > MAX_BLOCK_DAYS {
            return Err(ApiError::Validation("Blokada może trwać maksymalnie 36500 dni."));
        }

        let target = self.find_user(username)?;
        if target.protected {
            return Err(ApiError::Forbidden("Nie można zablokować konta administracyjnego."));
        }

        let now = now();
        let blocked_until = sanction_end(now, Duration::try_days(i64::from(days)))
            .ok_or(ApiError::Validation("Blokada może trwać maksymalnie 36500 dni."))?;
        let notice = system_message(format!(
            "Użytkownik {} został zablokowany na {} dni przez administratora.",
            target.username, days
        ));

        let revoked = self
            .db
            .block_user(&target.id, blocked_until, now, &notice)?
            .ok_or(ApiError::NotFound("Nie znaleziono użytkownika."))?;

        info!(
            "Admin '{}' blocked '{}' until {} ({} sessions revoked)",
            actor.username, target.username, blocked_until, revoked
        );
        Ok(blocked_until)
    }

    pub fn unblock_user(&self, actor: &Actor, username: &str) -> Result<(), ApiError> {
        Self::require_admin(actor, "Brak uprawnień do odblokowania użytkowników.")?;

        let target = self.find_user(username)?;
        if target.protected {
            return Err(ApiError::Forbidden("Nie można odblokować konta administracyjnego."));
        }

        self.db.set_block(&target.username, None, None)?;
        info!("Admin '{}' unblocked '{}'", actor.username, target.username);
        Ok(())
    }

    pub fn remove_user_account(&self, actor: &Actor, username: &str) -> Result<(), ApiError> {
        Self::require_admin(actor, "Brak uprawnień do usuwania użytkowników.")?;

        let target = self.find_user(username)?;
        if target.protected {
            return Err(ApiError::Forbidden("Nie można usunąć konta administracyjnego."));
        }

        self.db.delete_user(&target.username)?;
        info!("Admin '{}' removed account '{}'", actor.username, target.username);
        Ok(())
    }

    /// Stops the target from posting chat messages for `hours` (default 24).
    pub fn mute_user_for_hours(
        &self,
        actor: &Actor,
        username: &str,
        hours: Option<u32>,
    ) -> Result<DateTime<Utc>, ApiError> {
        Self::require_admin(actor, "Brak uprawnień do wyciszania użytkowników.")?;

        let hours = hours.unwrap_or(DEFAULT_MUTE_HOURS);
        if hours == 0 {
            return Err(ApiError::Validation("Liczba godzin wyciszenia musi być większa od zera."));
        }
        if hours > MAX_MUTE_HOURS {
            return Err(ApiError::Validation("Wyciszenie może trwać maksymalnie 876000 godzin."));
        }

        let target = self.find_user(username)?;
        if target.protected {
            return Err(ApiError::Forbidden("Nie można wyciszyć konta administracyjnego."));
        }

        let now = now();
        let muted_until = sanction_end(now, Duration::try_hours(i64::from(hours)))
            .ok_or(ApiError::Validation("Wyciszenie może trwać maksymalnie 876000 godzin."))?;
        let notice = system_message(format!(
            "Użytkownik {} został wyciszony na {}h przez administratora.",
            target.username, hours
        ));

        if !self.db.mute_user(&target.id, muted_until, now, &notice)? {
            return Err(ApiError::NotFound("Nie znaleziono użytkownika."));
        }

        info!("Admin '{}' muted '{}' until {}", actor.username, target.username, muted_until);
        Ok(muted_until)
    }

    pub fn clear_user_mute(&self, actor: &Actor, username: &str) -> Result<(), ApiError> {
        Self::require_admin(actor, "Brak uprawnień do odciszania użytkowników.")?;

        let target = self.find_user(username)?;
        self.lift_mute(&target.username)?;
        info!("Admin '{}' unmuted '{}'", actor.username, target.username);
        Ok(())
    }

    /// Clears a mute and announces it in the chat.
    fn lift_mute(&self, username: &str) -> Result<(), ApiError> {
        self.db.set_mute(username, None, None)?;
        self.db.insert_chat_message(&unmuted_notice(username))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{self, ADMIN};
    use chrono::SubsecRound;

    #[test]
    fn blocking_protected_account_fails() {
        let service = testing::service();
        let admin = testing::admin(&service);

        let err = service.block_user_for_days(&admin, ADMIN, None).unwrap_err();
        assert_eq!(err.to_string(), "Nie można zablokować konta administracyjnego.");

        let err = service.mute_user_for_hours(&admin, "Admin", None).unwrap_err();
        assert_eq!(err.to_string(), "Nie można wyciszyć konta administracyjnego.");

        let err = service.remove_user_account(&admin, ADMIN).unwrap_err();
        assert_eq!(err.to_string(), "Nie można usunąć konta administracyjnego.");

        let err = service.unblock_user(&admin, ADMIN).unwrap_err();
        assert_eq!(err.to_string(), "Nie można odblokować konta administracyjnego.");

        let stored = service.db().get_user_by_username(ADMIN).unwrap().unwrap();
        assert!(stored.blocked_until.is_none() && stored.muted_until.is_none());
    }

    #[test]
    fn moderation_requires_admin() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");
        testing::register(&service, "bartek");

        let cases = [
            service.block_user_for_days(&ania, "bartek", None).map(|_| ()),
            service.unblock_user(&ania, "bartek"),
            service.remove_user_account(&ania, "bartek"),
            service.mute_user_for_hours(&ania, "bartek", None).map(|_| ()),
            service.clear_user_mute(&ania, "bartek"),
        ];
        for result in cases {
            assert!(matches!(result, Err(ApiError::Forbidden(_))));
        }
        assert!(service.db().get_user_by_username("bartek").unwrap().is_some());
    }

    #[test]
    fn block_uses_default_days_revokes_sessions_and_announces() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");
        let admin = testing::admin(&service);

        let before = Utc::now().trunc_subsecs(6);
        let until = service.block_user_for_days(&admin, "ANIA", None).unwrap();
        assert!(until >= before + Duration::days(3));
        assert!(until <= Utc::now() + Duration::days(3));

        assert!(service.authenticate(ania.session_id).is_err());

        let latest = service.db().latest_chat_message().unwrap().unwrap();
        assert!(latest.system);
        assert_eq!(latest.author, "System");
        assert_eq!(
            latest.text,
            "Użytkownik ania został zablokowany na 3 dni przez administratora."
        );

        service.unblock_user(&admin, "ania").unwrap();
        assert!(service.login("ania", "haslo123").is_ok());
    }

    #[test]
    fn unknown_targets_and_zero_durations_are_rejected() {
        let service = testing::service();
        let admin = testing::admin(&service);
        testing::register(&service, "ania");

        for result in [
            service.block_user_for_days(&admin, "ghost", None).map(|_| ()),
            service.mute_user_for_hours(&admin, "ghost", None).map(|_| ()),
            service.remove_user_account(&admin, "ghost"),
        ] {
            assert!(matches!(result, Err(ApiError::NotFound(_))));
        }

        assert!(matches!(
            service.block_user_for_days(&admin, "ania", Some(0)),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            service.mute_user_for_hours(&admin, "ania", Some(0)),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn mute_and_unmute_post_system_messages() {
        let service = testing::service();
        testing::register(&service, "ania");
        let admin = testing::admin(&service);

        service.mute_user_for_hours(&admin, "ania", Some(2)).unwrap();
        let profile = service.find_user("ania").unwrap().to_profile().unwrap();
        assert!(profile.is_muted(Utc::now()));

        service.clear_user_mute(&admin, "ania").unwrap();
        let profile = service.find_user("ania").unwrap().to_profile().unwrap();
        assert!(profile.muted_until.is_none() && profile.muted_at.is_none());

        let texts: Vec<_> = service
            .chat_messages(None)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(
            texts,
            [
                "Użytkownik ania został wyciszony na 2h przez administratora.",
                "Użytkownik ania został odciszony.",
            ]
        );
    }

    #[test]
    fn removing_account_ends_sessions() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");
        let admin = testing::admin(&service);

        service.remove_user_account(&admin, "ania").unwrap();
        assert!(service.authenticate(ania.session_id).is_err());
        assert!(service.login("ania", "haslo123").is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let service = testing::service();
        let admin = testing::admin(&service);
        testing::register(&service, "ania");

        for days in [MAX_BLOCK_DAYS + 1, u32::MAX] {
            assert!(matches!(
                service.block_user_for_days(&admin, "ania", Some(days)),
                Err(ApiError::Validation(_))
            ));
        }
        for hours in [MAX_MUTE_HOURS + 1, u32::MAX] {
            assert!(matches!(
                service.mute_user_for_hours(&admin, "ania", Some(hours)),
                Err(ApiError::Validation(_))
            ));
        }

        let profile = service.find_user("ania").unwrap().to_profile().unwrap();
        assert!(profile.blocked_until.is_none() && profile.muted_until.is_none());
        assert!(service.chat_messages(None).unwrap().is_empty());

        service.block_user_for_days(&admin, "ania", Some(MAX_BLOCK_DAYS)).unwrap();
        service.mute_user_for_hours(&admin, "ania", Some(MAX_MUTE_HOURS)).unwrap();
    }

    #[test]
    fn returned_deadlines_match_stored_values() {
        let service = testing::service();
        testing::register(&service, "ania");
        let admin = testing::admin(&service);

        let muted_until = service.mute_user_for_hours(&admin, "ania", Some(5)).unwrap();
        let blocked_until = service.block_user_for_days(&admin, "ania", Some(2)).unwrap();

        let profile = service.find_user("ania").unwrap().to_profile().unwrap();
        assert_eq!(profile.muted_until, Some(muted_until));
        assert_eq!(profile.blocked_until, Some(blocked_until));

        match service.login("ania", "haslo123") {
            Err(ApiError::Blocked { until }) => assert_eq!(until, blocked_until),
            other => panic!("expected a block, got {other:?}"),
        }
    }

    #[test]
    fn login_racing_a_block_leaves_no_session() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");
        let admin = testing::admin(&service);
        let ania_id = ania.user_id.to_string();

        for _ in 0..3 {
            service.unblock_user(&admin, "ania").unwrap();
            std::thread::scope(|scope| {
                let login = scope.spawn(|| service.login("ania", "haslo123"));
                service.block_user_for_days(&admin, "ania", Some(1)).unwrap();
                match login.join().unwrap() {
                    Ok(_) | Err(ApiError::Blocked { .. }) => {}
                    Err(other) => panic!("unexpected login error: {other}"),
                }
            });
            assert_eq!(service.db().delete_sessions_for_user(&ania_id).unwrap(), 0);
        }
    }
}
