//! Session-Management fuer Chimecast
//!
//! Sessions binden ein zufaelliges Token an einen Benutzer fuer eine feste
//! Lebensdauer. Sie liegen nur im Speicher; abgelaufene Eintraege werden
//! beim Zugriff wie fehlende behandelt, es gibt keinen Aufraeum-Task.

use std::{collections::HashMap, sync::Arc};

use chimecast_core::{SystemUhr, Uhr, UserId};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tokio::sync::RwLock;

use crate::error::{AuthError, AuthResult};

/// Standard-Session-Lebensdauer in Stunden
pub const SESSION_TTL_STUNDEN: i64 = 24;

/// Ein aktives Session-Token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Der Token-String (URL-sicheres Base64)
    pub token: String,
    /// ID des Benutzers dem diese Session gehoert
    pub subject_id: UserId,
    /// Benutzername zum Zeitpunkt des Logins
    pub subject_name: String,
    /// Zeitpunkt der Session-Erstellung
    pub erstellt_am: DateTime<Utc>,
    /// Zeitpunkt des Session-Ablaufs
    pub laeuft_ab_am: DateTime<Utc>,
}

impl Session {
    /// Gueltig bis einschliesslich `laeuft_ab_am`
    pub fn ist_gueltig_zu(&self, jetzt: DateTime<Utc>) -> bool {
        jetzt <= self.laeuft_ab_am
    }
}

/// In-Memory Session-Store mit TTL-Unterstuetzung
pub struct SessionStore {
    /// token -> Session
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    uhr: Arc<dyn Uhr>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Erstellt einen leeren Store mit Systemzeit und Standard-TTL
    pub fn neu() -> Arc<Self> {
        Self::mit_uhr(Duration::hours(SESSION_TTL_STUNDEN), Arc::new(SystemUhr))
    }

    /// Erstellt einen leeren Store mit eigener TTL und Zeitquelle
    pub fn mit_uhr(ttl: Duration, uhr: Arc<dyn Uhr>) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            uhr,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Erstellt eine neue Session fuer den angegebenen Benutzer
    pub async fn erstellen(&self, subject_name: &str, subject_id: UserId) -> Session {
        let jetzt = self.uhr.jetzt();
        let session = Session {
            token: token_generieren(),
            subject_id,
            subject_name: subject_name.to_string(),
            erstellt_am: jetzt,
            laeuft_ab_am: jetzt + self.ttl,
        };

        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        tracing::debug!(user_id = %subject_id, "Neue Session erstellt");
        session
    }

    /// Validiert einen Session-Token und gibt die Session zurueck
    ///
    /// Unbekannte und abgelaufene Tokens ergeben beide
    /// `AuthError::SessionUngueltig`.
    pub async fn validieren(&self, token: &str) -> AuthResult<Session> {
        let jetzt = self.uhr.jetzt();
        let sessions = self.sessions.read().await;
        match sessions.get(token) {
            Some(session) if session.ist_gueltig_zu(jetzt) => Ok(session.clone()),
            _ => Err(AuthError::SessionUngueltig),
        }
    }

    /// Invalidiert (loescht) eine Session anhand des Tokens. Idempotent.
    pub async fn invalidieren(&self, token: &str) {
        let entfernt = self.sessions.write().await.remove(token);
        if let Some(session) = entfernt {
            tracing::debug!(user_id = %session.subject_id, "Session invalidiert");
        }
    }

    /// Anzahl der noch gueltigen Sessions
    pub async fn anzahl_aktive(&self) -> usize {
        let jetzt = self.uhr.jetzt();
        let sessions = self.sessions.read().await;
        sessions.values().filter(|s| s.ist_gueltig_zu(jetzt)).count()
    }
}

/// Generiert einen kryptografisch sicheren Session-Token (URL-sicheres Base64)
fn token_generieren() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chimecast_core::ManuelleUhr;

    fn store_mit_uhr() -> (Arc<SessionStore>, Arc<ManuelleUhr>) {
        let uhr = Arc::new(ManuelleUhr::neu(Utc::now()));
        let store = SessionStore::mit_uhr(Duration::hours(24), uhr.clone());
        (store, uhr)
    }

    #[tokio::test]
    async fn session_erstellen_und_validieren() {
        let store = SessionStore::neu();
        let user_id = UserId::new();

        let session = store.erstellen("alice", user_id).await;
        assert_eq!(session.subject_id, user_id);
        assert_eq!(session.subject_name, "alice");
        assert_eq!(
            session.laeuft_ab_am - session.erstellt_am,
            Duration::hours(SESSION_TTL_STUNDEN)
        );

        let validiert = store
            .validieren(&session.token)
            .await
            .expect("Validierung fehlgeschlagen");
        assert_eq!(validiert, session);
    }

    #[tokio::test]
    async fn ungueltige_session_gibt_fehler() {
        let store = SessionStore::neu();
        let ergebnis = store.validieren("kein_gueltiger_token").await;
        assert!(matches!(ergebnis, Err(AuthError::SessionUngueltig)));
    }

    #[tokio::test]
    async fn session_gueltig_bis_genau_ablauf() {
        let (store, uhr) = store_mit_uhr();
        let session = store.erstellen("bob", UserId::new()).await;

        uhr.vorstellen(Duration::hours(24));
        assert!(store.validieren(&session.token).await.is_ok());

        uhr.vorstellen(Duration::milliseconds(1));
        let ergebnis = store.validieren(&session.token).await;
        assert!(matches!(ergebnis, Err(AuthError::SessionUngueltig)));
    }

    #[tokio::test]
    async fn abgelaufene_session_zaehlt_nicht_als_aktiv() {
        let (store, uhr) = store_mit_uhr();
        store.erstellen("a", UserId::new()).await;
        uhr.vorstellen(Duration::hours(12));
        store.erstellen("b", UserId::new()).await;
        assert_eq!(store.anzahl_aktive().await, 2);

        uhr.vorstellen(Duration::hours(13));
        assert_eq!(store.anzahl_aktive().await, 1);
    }

    #[tokio::test]
    async fn session_invalidieren_ist_idempotent() {
        let store = SessionStore::neu();
        let session = store.erstellen("carol", UserId::new()).await;

        store.invalidieren(&session.token).await;
        store.invalidieren(&session.token).await;
        let ergebnis = store.validieren(&session.token).await;
        assert!(matches!(ergebnis, Err(AuthError::SessionUngueltig)));
    }

    #[tokio::test]
    async fn token_sind_eindeutig() {
        let store = SessionStore::neu();
        let user_id = UserId::new();

        let s1 = store.erstellen("dave", user_id).await;
        let s2 = store.erstellen("dave", user_id).await;
        assert_ne!(s1.token, s2.token, "Session-Tokens muessen eindeutig sein");
        // 32 Byte ohne Padding
        assert_eq!(s1.token.len(), 43);
    }
}
