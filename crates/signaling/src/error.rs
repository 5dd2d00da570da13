//! Fehlertypen fuer den Signaling-Service

use chimecast_db::DbError;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Ungueltige Eingabe (z.B. leerer Raumname)
    #[error("Ungueltige Eingabe: {0}")]
    Validierung(String),

    /// Anfragender ist nicht berechtigt (z.B. nicht der Host)
    #[error("Nicht autorisiert: {0}")]
    NichtAutorisiert(String),

    /// Raum oder Teilnehmer nicht gefunden
    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    /// Fehler im Raum-Verzeichnis
    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] DbError),

    /// Interner Fehler
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl SignalingError {
    pub fn validierung(msg: impl Into<String>) -> Self {
        Self::Validierung(msg.into())
    }

    pub fn nicht_autorisiert(msg: impl Into<String>) -> Self {
        Self::NichtAutorisiert(msg.into())
    }

    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }

    /// Erstellt einen internen Fehler
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
