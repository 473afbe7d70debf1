use std::collections::BTreeMap;

use tracing::info;

use seans_types::models::{LoginMode, StreamingLogin};

use super::{Actor, Service, now};
use crate::error::ApiError;

/// An external streaming site a user can keep credentials for.
#[derive(Debug, Clone, Copy)]
pub struct StreamingService {
    pub id: &'static str,
    pub name: &'static str,
    pub allow_guest: bool,
}

pub const STREAMING_SERVICES: &[StreamingService] = &[
    StreamingService {
        id: "filman",
        name: "Filman.cc",
        allow_guest: false,
    },
    StreamingService {
        id: "obejrzyjto",
        name: "Oglądaj.TV",
        allow_guest: true,
    },
];

pub fn find_streaming_service(id: &str) -> Option<&'static StreamingService> {
    STREAMING_SERVICES.iter().find(|service| service.id == id)
}

impl Service {
    pub fn save_streaming_login(
        &self,
        actor: &Actor,
        service_id: &str,
        mode: Option<LoginMode>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<StreamingLogin, ApiError> {
        let service_id = service_id.trim();
        if service_id.is_empty() {
            return Err(ApiError::Validation("Wybierz serwis."));
        }
        let service = find_streaming_service(service_id)
            .ok_or(ApiError::NotFound("Nieznany serwis."))?;

        let mode = mode.unwrap_or_default();
        let (username, password) = match mode {
            LoginMode::Guest if !service.allow_guest => {
                return Err(ApiError::Validation("Ten serwis nie obsługuje trybu gościa."));
            }
            LoginMode::Guest => (String::new(), String::new()),
            LoginMode::Account => (
                username.unwrap_or_default().trim().to_string(),
                password.unwrap_or_default().trim().to_string(),
            ),
        };

        let login = StreamingLogin {
            service_id: service.id.to_string(),
            mode,
            username,
            password,
            updated_at: now(),
        };
        self.db.upsert_streaming_login(&actor.user_id.to_string(), &login)?;

        info!("User '{}' saved {} login for {}", actor.username, mode.as_str(), service.name);
        Ok(login)
    }

    /// Removing credentials that were never saved is not an error.
    pub fn remove_streaming_login(&self, actor: &Actor, service_id: &str) -> Result<(), ApiError> {
        let service_id = service_id.trim();
        if service_id.is_empty() {
            return Ok(());
        }
        if self.db.delete_streaming_login(&actor.user_id.to_string(), service_id)? {
            info!("User '{}' removed login for {}", actor.username, service_id);
        }
        Ok(())
    }

    pub fn streaming_logins(
        &self,
        actor: &Actor,
    ) -> Result<BTreeMap<String, StreamingLogin>, ApiError> {
        let logins = self.db.list_streaming_logins(&actor.user_id.to_string())?;
        Ok(logins
            .into_iter()
            .map(|login| (login.service_id.clone(), login))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing;

    #[test]
    fn save_requires_known_service() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");

        let err = service.save_streaming_login(&ania, "  ", None, None, None).unwrap_err();
        assert_eq!(err.to_string(), "Wybierz serwis.");

        let err = service.save_streaming_login(&ania, "netflix", None, None, None).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn account_mode_trims_and_overwrites() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");

        let saved = service
            .save_streaming_login(&ania, "filman", None, Some(" ania "), Some(" sekret "))
            .unwrap();
        assert_eq!(saved.mode, LoginMode::Account);
        assert_eq!(saved.username, "ania");
        assert_eq!(saved.password, "sekret");

        service
            .save_streaming_login(&ania, "filman", Some(LoginMode::Account), Some("nowa"), Some("x"))
            .unwrap();
        let logins = service.streaming_logins(&ania).unwrap();
        assert_eq!(logins.len(), 1);
        assert_eq!(logins["filman"].username, "nowa");
    }

    #[test]
    fn guest_mode_drops_credentials_where_allowed() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");

        let err = service
            .save_streaming_login(&ania, "filman", Some(LoginMode::Guest), None, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Ten serwis nie obsługuje trybu gościa.");

        let saved = service
            .save_streaming_login(&ania, "obejrzyjto", Some(LoginMode::Guest), Some("a"), Some("b"))
            .unwrap();
        assert!(saved.username.is_empty() && saved.password.is_empty());
    }

    #[test]
    fn logins_are_per_user_and_removable() {
        let service = testing::service();
        let ania = testing::register(&service, "ania");
        let bartek = testing::register(&service, "bartek");

        service
            .save_streaming_login(&ania, "filman", None, Some("ania"), Some("x"))
            .unwrap();
        assert!(service.streaming_logins(&bartek).unwrap().is_empty());

        service.remove_streaming_login(&ania, "obejrzyjto").unwrap();
        service.remove_streaming_login(&ania, "").unwrap();
        assert_eq!(service.streaming_logins(&ania).unwrap().len(), 1);

        service.remove_streaming_login(&ania, "filman").unwrap();
        assert!(service.streaming_logins(&ania).unwrap().is_empty());
    }
}
