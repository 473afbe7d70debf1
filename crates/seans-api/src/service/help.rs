use tracing::info;
use uuid::Uuid;

use seans_types::models::{HelpMessage, HelpStatus};

use super::{Actor, Service, now};
use crate::error::ApiError;

pub const MAX_HELP_MESSAGE_CHARS: usize = 1000;

impl Service {
    pub fn submit_help_message(&self, actor: &Actor, text: &str) -> Result<HelpMessage, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::Validation("Wiadomość nie może być pusta."));
        }
        if text.chars().count() > MAX_HELP_MESSAGE_CHARS {
            return Err(ApiError::Validation("Wiadomość może mieć maksymalnie 1000 znaków."));
        }

        let message = HelpMessage {
            id: Uuid::new_v4(),
            author: actor.username.clone(),
            text: text.to_string(),
            created_at: now(),
            status: HelpStatus::Pending,
        };
        self.db.insert_help_message(&message)?;

        info!("Help request {} submitted by '{}'", message.id, actor.username);
        Ok(message)
    }

    /// Admins see every request, everyone else only their own.
    pub fn help_messages(&self, actor: &Actor) -> Result<Vec<HelpMessage>, ApiError> {
        let author = (!actor.is_admin()).then_some(actor.username.as_str());
        Ok(self.db.list_help_messages(author)?)
    }

    pub fn update_help_message_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: HelpStatus,
    ) -> Result<(), ApiError> {
        Self::require_admin(actor, "Brak uprawnień do aktualizacji zgłoszeń.")?;

        if !self.db.set_help_status(id, status)? {
            return Err(ApiError::NotFound("Nie znaleziono zgłoszenia."));
        }
        info!("Admin '{}' marked help request {} as {}", actor.username, id, status.as_str());
        Ok(())
    }

    pub fn remove_help_message(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        Self::require_admin(actor, "Brak uprawnień do usuwania zgłoszeń.")?;

        if !self.db.delete_help_message(id)? {
            return Err(ApiError::NotFound("Nie znaleziono zgłoszenia."));
        }
        info!("Admin '{}' removed help request {}", actor.username, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing;

    #[test]
    fn submitted_requests_start_pending() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");

        let err = service.submit_help_message(&ania, " \n ").unwrap_err();
        assert_eq!(err.to_string(), "Wiadomość nie może być pusta.");
        assert!(service.submit_help_message(&ania, &"a".repeat(1001)).is_err());

        let message = service.submit_help_message(&ania, "  Nie działa odtwarzacz  ").unwrap();
        assert_eq!(message.text, "Nie działa odtwarzacz");
        assert_eq!(message.status, HelpStatus::Pending);
        assert_eq!(message.author, "ania");
    }

    #[test]
    fn visibility_depends_on_role() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");
        let bartek = testing::register(&service, "bartek");
        let admin = testing::admin(&service);

        service.submit_help_message(&ania, "pierwsze").unwrap();
        service.submit_help_message(&bartek, "drugie").unwrap();

        let own = service.help_messages(&ania).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].text, "pierwsze");

        assert_eq!(service.help_messages(&admin).unwrap().len(), 2);
    }

    #[test]
    fn admin_resolves_and_removes_requests() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");
        let admin = testing::admin(&service);
        let message = service.submit_help_message(&ania, "pomocy").unwrap();

        let err = service
            .update_help_message_status(&ania, message.id, HelpStatus::Done)
            .unwrap_err();
        assert_eq!(err.to_string(), "Brak uprawnień do aktualizacji zgłoszeń.");
        let err = service.remove_help_message(&ania, message.id).unwrap_err();
        assert_eq!(err.to_string(), "Brak uprawnień do usuwania zgłoszeń.");

        service
            .update_help_message_status(&admin, message.id, HelpStatus::Rejected)
            .unwrap();
        assert_eq!(service.help_messages(&ania).unwrap()[0].status, HelpStatus::Rejected);

        service.remove_help_message(&admin, message.id).unwrap();
        assert!(service.help_messages(&ania).unwrap().is_empty());
        assert!(matches!(
            service.update_help_message_status(&admin, message.id, HelpStatus::Done),
            Err(ApiError::NotFound(_))
        ));
    }
}
