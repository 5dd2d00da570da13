//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod benutzer;
pub mod pool;
pub mod raeume;

pub use pool::SqliteDb;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbError;

/// Parst einen gespeicherten RFC3339-Zeitstempel
pub(crate) fn zeit_parsen(wert: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(wert)
        .map(|z| z.with_timezone(&Utc))
        .map_err(|e| DbError::ungueltig(format!("Zeitstempel '{wert}': {e}")))
}

/// Parst eine gespeicherte UUID
pub(crate) fn uuid_parsen(wert: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(wert).map_err(|e| DbError::ungueltig(format!("UUID '{wert}': {e}")))
}
