use tracing::{debug, info};
use uuid::Uuid;

use seans_db::models::ChatPost;
use seans_types::models::{ChatMessage, SYSTEM_AUTHOR};

use super::{Actor, Service, now};
use crate::error::ApiError;

pub const MAX_CHAT_MESSAGE_CHARS: usize = 50;

/// A chat entry posted by the system rather than a user.
pub(crate) fn system_message(text: String) -> ChatMessage {
    ChatMessage {
        id: Uuid::new_v4(),
        author: SYSTEM_AUTHOR.to_string(),
        text,
        created_at: now(),
        system: true,
    }
}

pub(crate) fn unmuted_notice(username: &str) -> ChatMessage {
    system_message(format!("Użytkownik {} został odciszony.", username))
}

impl Service {
    /// Posts as `actor`. The mute is checked in the same transaction as the
    /// insert; an expired mute is cleared and announced first.
    pub fn add_chat_message(&self, actor: &Actor, text: &str) -> Result<ChatMessage, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::Validation("Wiadomość nie może być pusta."));
        }
        if text.chars().count() > MAX_CHAT_MESSAGE_CHARS {
            return Err(ApiError::Validation("Wiadomość może mieć maksymalnie 50 znaków."));
        }

        let message = ChatMessage {
            id: Uuid::new_v4(),
            author: actor.username.clone(),
            text: text.to_string(),
            created_at: now(),
            system: false,
        };
        let user_id = actor.user_id.to_string();

        match self.db.post_chat_message(
            &user_id,
            &message,
            &unmuted_notice(&actor.username),
            message.created_at,
        )? {
            ChatPost::Posted { lifted_mute } => {
                if lifted_mute {
                    info!("Expired mute of '{}' cleared", actor.username);
                }
            }
            ChatPost::Muted { until } => return Err(ApiError::Muted { until }),
            ChatPost::UserGone => return Err(ApiError::NotFound("Nie znaleziono konta.")),
        }

        debug!("Chat message {} posted by '{}'", message.id, message.author);
        Ok(message)
    }

    pub fn add_system_chat_message(&self, text: &str) -> Result<ChatMessage, ApiError> {
        let message = system_message(text.to_string());
        self.db.insert_chat_message(&message)?;
        Ok(message)
    }

    /// Messages oldest first; `limit` keeps only the newest ones.
    pub fn chat_messages(&self, limit: Option<u32>) -> Result<Vec<ChatMessage>, ApiError> {
        Ok(self.db.list_chat_messages(limit)?)
    }

    pub fn remove_chat_message(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        Self::require_admin(actor, "Brak uprawnień do usuwania wiadomości.")?;

        if !self.db.delete_chat_message(id)? {
            return Err(ApiError::NotFound("Nie znaleziono wiadomości."));
        }
        info!("Admin '{}' removed chat message {}", actor.username, id);
        Ok(())
    }

    pub fn mark_chat_as_read(&self, actor: &Actor) -> Result<(), ApiError> {
        self.db.mark_chat_read(&actor.user_id.to_string())?;
        Ok(())
    }

    pub fn has_unread_messages(&self, actor: &Actor) -> Result<bool, ApiError> {
        let Some(latest) = self.db.latest_chat_message()? else {
            return Ok(false);
        };
        let unread = match self.db.get_chat_read(&actor.user_id.to_string())? {
            Some(last_read) => last_read < latest.created_at,
            None => true,
        };
        Ok(unread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing;
    use chrono::{Duration, Utc};

    #[test]
    fn message_validation() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");

        let err = service.add_chat_message(&ania, "   ").unwrap_err();
        assert_eq!(err.to_string(), "Wiadomość nie może być pusta.");

        let long = "x".repeat(51);
        let err = service.add_chat_message(&ania, &long).unwrap_err();
        assert_eq!(err.to_string(), "Wiadomość może mieć maksymalnie 50 znaków.");

        // 50 multi-byte characters still fit
        let polish = "ż".repeat(50);
        let message = service.add_chat_message(&ania, &format!("  {polish}  ")).unwrap();
        assert_eq!(message.text, polish);
        assert_eq!(message.author, "ania");
        assert!(!message.system);
    }

    #[test]
    fn muted_user_cannot_post() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");
        let admin = testing::admin(&service);

        service.mute_user_for_hours(&admin, "ania", None).unwrap();
        let err = service.add_chat_message(&ania, "hej").unwrap_err();
        assert!(matches!(err, ApiError::Muted { .. }));
        assert_eq!(err.to_string(), "Jesteś wyciszony. Spróbuj ponownie później.");
    }

    #[test]
    fn expired_mute_is_cleared_before_posting() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");

        let past = Utc::now() - Duration::minutes(5);
        service.db().set_mute("ania", Some(past), Some(past - Duration::hours(24))).unwrap();

        service.add_chat_message(&ania, "wróciłam").unwrap();

        let messages = service.chat_messages(None).unwrap();
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["Użytkownik ania został odciszony.", "wróciłam"]);

        let stored = service.db().get_user_by_username("ania").unwrap().unwrap();
        assert!(stored.muted_until.is_none());
    }

    #[test]
    fn unread_tracking() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");
        let admin = testing::admin(&service);

        assert!(!service.has_unread_messages(&ania).unwrap());

        service.add_chat_message(&admin, "witajcie").unwrap();
        assert!(service.has_unread_messages(&ania).unwrap());
        // posting marks the author's own read marker
        assert!(!service.has_unread_messages(&admin).unwrap());

        service.mark_chat_as_read(&ania).unwrap();
        assert!(!service.has_unread_messages(&ania).unwrap());

        service.add_system_chat_message("ogłoszenie").unwrap();
        assert!(service.has_unread_messages(&ania).unwrap());
        assert!(service.has_unread_messages(&admin).unwrap());
    }

    #[test]
    fn user_without_read_marker_has_unread_messages() {
        let service = testing::service();
        let admin = testing::admin(&service);
        service.add_chat_message(&admin, "pierwsza").unwrap();

        // registering logs in after the message exists, so clear the marker
        let ania = testing::register(&service, "ania");
        assert!(!service.has_unread_messages(&ania).unwrap());
        service
            .db()
            .with_conn(|conn| {
                conn.execute("DELETE FROM chat_reads", [])?;
                Ok(())
            })
            .unwrap();
        assert!(service.has_unread_messages(&ania).unwrap());
    }

    #[test]
    fn only_admin_removes_messages() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");
        let admin = testing::admin(&service);
        let message = service.add_chat_message(&ania, "spam").unwrap();

        let err = service.remove_chat_message(&ania, message.id).unwrap_err();
        assert_eq!(err.to_string(), "Brak uprawnień do usuwania wiadomości.");

        service.remove_chat_message(&admin, message.id).unwrap();
        assert!(service.chat_messages(None).unwrap().is_empty());
        assert!(matches!(
            service.remove_chat_message(&admin, message.id),
            Err(ApiError::NotFound(_))
        ));
    }
}
