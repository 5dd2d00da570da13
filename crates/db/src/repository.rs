//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Die Traits nutzen `async-trait`, damit
//! Services sie als `Arc<dyn …>` halten und in axum-Handlern `Send`-Futures
//! erhalten.

use async_trait::async_trait;
use chimecast_core::{RoomId, UserId};

use crate::error::DbResult;
use crate::models::{BenutzerRecord, NeuerBenutzer, RaumRecord};

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://chimecast.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://chimecast.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Persistentes Verzeichnis der Raum-Metadaten
///
/// Der Signaling-Kern liest und erstellt nur; Aenderungen am Status sind
/// nicht Teil dieses Traits.
#[async_trait]
pub trait RaumVerzeichnis: Send + Sync {
    /// Legt einen neuen Raum an
    async fn raum_erstellen(&self, raum: &RaumRecord) -> DbResult<()>;

    /// Laedt einen Raum anhand seiner ID
    async fn raum_laden(&self, id: RoomId) -> DbResult<Option<RaumRecord>>;

    /// Prueft ob ein Raum existiert
    async fn raum_existiert(&self, id: RoomId) -> DbResult<bool>;

    /// Alle Raeume, sortiert nach [`raeume_sortieren`]
    async fn raeume_auflisten(&self) -> DbResult<Vec<RaumRecord>>;
}

/// Repository fuer Benutzer-Datenzugriffe
#[async_trait]
pub trait BenutzerRepository: Send + Sync {
    /// Legt einen neuen Benutzer an. Doppelter Benutzername oder doppelte
    /// E-Mail ergibt `DbError::Eindeutigkeit`.
    async fn erstellen(&self, daten: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Laedt einen Benutzer anhand seiner ID
    async fn laden(&self, id: UserId) -> DbResult<Option<BenutzerRecord>>;

    /// Laedt einen Benutzer anhand seines Benutzernamens
    async fn laden_nach_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>>;
}

/// Ordnet Raeume fuer die Auflistung: aktive vor inaktiven, innerhalb einer
/// Statusklasse nach `created_at` aufsteigend, bei Gleichstand nach ID.
pub fn raeume_sortieren(raeume: &mut [RaumRecord]) {
    raeume.sort_by(|a, b| {
        a.status
            .rang()
            .cmp(&b.status.rang())
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}
