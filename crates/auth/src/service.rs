//! Auth-Service fuer Chimecast
//!
//! Zentraler Service fuer Registrierung, Login, Logout und Session-Pruefung.
//! Nutzt das Benutzer-Repository und den Session-Store.

use std::sync::Arc;

use chimecast_db::{BenutzerRecord, BenutzerRepository, NeuerBenutzer};

use crate::{
    error::{AuthError, AuthResult},
    password::{passwort_hashen, passwort_verifizieren},
    session::{Session, SessionStore},
};

/// Eingaben einer Registrierung
#[derive(Debug, Clone, Copy)]
pub struct Registrierung<'a> {
    /// Anzeigename
    pub name: &'a str,
    /// Login-Name
    pub username: &'a str,
    pub email: &'a str,
    pub passwort: &'a str,
}

impl Registrierung<'_> {
    fn validieren(&self) -> AuthResult<()> {
        let felder = [
            ("name", self.name),
            ("userId", self.username),
            ("email", self.email),
            ("password", self.passwort),
        ];
        for (feld, wert) in felder {
            if wert.trim().is_empty() {
                return Err(AuthError::validierung(format!("Feld '{feld}' darf nicht leer sein")));
            }
        }
        Ok(())
    }
}

/// Auth-Service – zentraler Einstiegspunkt fuer alle Authentifizierungsvorgaenge
#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn BenutzerRepository>,
    session_store: Arc<SessionStore>,
}

impl AuthService {
    /// Erstellt einen neuen AuthService
    pub fn neu(user_repo: Arc<dyn BenutzerRepository>, session_store: Arc<SessionStore>) -> Self {
        Self {
            user_repo,
            session_store,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.session_store
    }

    /// Registriert einen neuen Benutzer und meldet ihn direkt an
    pub async fn registrieren(
        &self,
        daten: Registrierung<'_>,
    ) -> AuthResult<(BenutzerRecord, Session)> {
        daten.validieren()?;

        if self.user_repo.laden_nach_name(daten.username).await?.is_some() {
            return Err(AuthError::BenutzernameVergeben(daten.username.to_string()));
        }

        let passwort_hash = passwort_hashen(daten.passwort)?;

        let benutzer = self
            .user_repo
            .erstellen(NeuerBenutzer {
                username: daten.username,
                email: daten.email,
                name: daten.name,
                password_hash: &passwort_hash,
            })
            .await
            .map_err(|e| {
                // E-Mail-Duplikate fallen erst beim INSERT auf
                if e.ist_eindeutigkeit() {
                    AuthError::BenutzernameVergeben(daten.username.to_string())
                } else {
                    AuthError::Datenbank(e)
                }
            })?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            "Neuer Benutzer registriert"
        );

        let session = self
            .session_store
            .erstellen(&benutzer.username, benutzer.id)
            .await;
        Ok((benutzer, session))
    }

    /// Meldet einen Benutzer an und erstellt eine neue Session
    ///
    /// Unbekannter Benutzer und falsches Passwort ergeben denselben Fehler.
    pub async fn anmelden(
        &self,
        username: &str,
        passwort: &str,
    ) -> AuthResult<(BenutzerRecord, Session)> {
        let benutzer = self
            .user_repo
            .laden_nach_name(username)
            .await?
            .ok_or(AuthError::UngueltigeAnmeldedaten)?;

        let korrekt = passwort_verifizieren(passwort, &benutzer.password_hash)?;
        if !korrekt {
            tracing::warn!(username = %username, "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }

        let session = self
            .session_store
            .erstellen(&benutzer.username, benutzer.id)
            .await;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            "Benutzer angemeldet"
        );

        Ok((benutzer, session))
    }

    /// Meldet einen Benutzer ab und invalidiert die Session
    pub async fn abmelden(&self, session_token: &str) {
        self.session_store.invalidieren(session_token).await;
    }

    /// Validiert einen Session-Token
    pub async fn validieren(&self, token: &str) -> AuthResult<Session> {
        self.session_store.validieren(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chimecast_core::UserId;
    use chimecast_db::{DbError, DbResult};
    use chrono::Utc;
    use std::sync::Mutex;

    // Minimaler In-Memory BenutzerRepository fuer Tests
    #[derive(Default)]
    struct TestUserRepo {
        benutzer: Mutex<Vec<BenutzerRecord>>,
    }

    #[async_trait]
    impl BenutzerRepository for TestUserRepo {
        async fn erstellen(&self, daten: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
            let mut benutzer = self.benutzer.lock().unwrap();
            if benutzer
                .iter()
                .any(|u| u.username == daten.username || u.email == daten.email)
            {
                return Err(DbError::Eindeutigkeit(daten.username.to_string()));
            }
            let record = BenutzerRecord {
                id: UserId::new(),
                username: daten.username.to_string(),
                email: daten.email.to_string(),
                name: daten.name.to_string(),
                password_hash: daten.password_hash.to_string(),
                created_at: Utc::now(),
            };
            benutzer.push(record.clone());
            Ok(record)
        }

        async fn laden(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
            Ok(self.benutzer.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }

        async fn laden_nach_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
            Ok(self
                .benutzer
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username == username)
                .cloned())
        }
    }

    fn test_service() -> AuthService {
        AuthService::neu(Arc::new(TestUserRepo::default()), SessionStore::neu())
    }

    fn registrierung<'a>(username: &'a str, email: &'a str, passwort: &'a str) -> Registrierung<'a> {
        Registrierung {
            name: "Test",
            username,
            email,
            passwort,
        }
    }

    #[tokio::test]
    async fn registrieren_meldet_an() {
        let service = test_service();

        let (user, session) = service
            .registrieren(registrierung("testuser", "t@example.org", "sicheres_passwort!"))
            .await
            .expect("Registrierung fehlgeschlagen");

        assert_eq!(user.username, "testuser");
        assert_eq!(session.subject_id, user.id);
        assert!(service.validieren(&session.token).await.is_ok());
    }

    #[tokio::test]
    async fn registrieren_und_anmelden() {
        let service = test_service();
        let (user, _) = service
            .registrieren(registrierung("alice", "a@example.org", "geheim"))
            .await
            .unwrap();

        let (angemeldeter, session) = service
            .anmelden("alice", "geheim")
            .await
            .expect("Anmeldung fehlgeschlagen");

        assert_eq!(angemeldeter.id, user.id);
        assert_eq!(session.subject_name, "alice");
    }

    #[tokio::test]
    async fn leere_felder_werden_abgelehnt() {
        let service = test_service();
        let ergebnis = service
            .registrieren(registrierung("", "x@example.org", "pw"))
            .await;
        assert!(matches!(ergebnis, Err(AuthError::Validierung(_))));

        let ergebnis = service
            .registrieren(registrierung("x", "x@example.org", "   "))
            .await;
        assert!(matches!(ergebnis, Err(AuthError::Validierung(_))));
    }

    #[tokio::test]
    async fn doppelte_registrierung_schlaegt_fehl() {
        let service = test_service();
        service
            .registrieren(registrierung("duplikat", "d1@example.org", "passwort"))
            .await
            .unwrap();
        let ergebnis = service
            .registrieren(registrierung("duplikat", "d2@example.org", "anderes"))
            .await;
        assert!(matches!(ergebnis, Err(AuthError::BenutzernameVergeben(_))));
    }

    #[tokio::test]
    async fn doppelte_email_schlaegt_fehl() {
        let service = test_service();
        service
            .registrieren(registrierung("eins", "gleich@example.org", "passwort"))
            .await
            .unwrap();
        let ergebnis = service
            .registrieren(registrierung("zwei", "gleich@example.org", "passwort"))
            .await;
        assert!(matches!(ergebnis, Err(AuthError::BenutzernameVergeben(_))));
    }

    #[tokio::test]
    async fn falsches_passwort_und_unbekannter_benutzer_gleich() {
        let service = test_service();
        service
            .registrieren(registrierung("user", "u@example.org", "richtig"))
            .await
            .unwrap();

        let falsch = service.anmelden("user", "falsch").await;
        assert!(matches!(falsch, Err(AuthError::UngueltigeAnmeldedaten)));

        let unbekannt = service.anmelden("niemand", "richtig").await;
        assert!(matches!(unbekannt, Err(AuthError::UngueltigeAnmeldedaten)));
    }

    #[tokio::test]
    async fn abmelden_invalidiert_session() {
        let service = test_service();
        let (_, session) = service
            .registrieren(registrierung("logoutuser", "l@example.org", "passwort"))
            .await
            .unwrap();

        service.abmelden(&session.token).await;
        let ergebnis = service.validieren(&session.token).await;
        assert!(matches!(ergebnis, Err(AuthError::SessionUngueltig)));
    }
}
