//! Datenbankmodelle
//!
//! Records entsprechen den Tabellen aus `migrations/`. Zeitstempel werden als
//! RFC3339-Text gespeichert, der Raumstatus als INTEGER (1 = aktiv).

use chimecast_core::{RoomId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status eines Raums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaumStatus {
    Active,
    Inactive,
}

impl RaumStatus {
    pub fn als_i64(self) -> i64 {
        match self {
            Self::Active => 1,
            Self::Inactive => 0,
        }
    }

    pub fn aus_i64(wert: i64) -> Self {
        if wert == 0 {
            Self::Inactive
        } else {
            Self::Active
        }
    }

    /// Sortierrang: aktive Raeume zuerst
    pub(crate) fn rang(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Inactive => 1,
        }
    }
}

/// Persistierte Raum-Metadaten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaumRecord {
    pub id: RoomId,
    pub name: String,
    pub host_id: UserId,
    pub created_at: DateTime<Utc>,
    pub status: RaumStatus,
}

impl RaumRecord {
    /// Neuer aktiver Raum mit frischer ID
    pub fn neu(name: impl Into<String>, host_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: RoomId::new(),
            name: name.into(),
            host_id,
            created_at,
            status: RaumStatus::Active,
        }
    }

    pub fn ist_host(&self, user_id: UserId) -> bool {
        self.host_id == user_id
    }
}

/// Benutzer-Datensatz aus der Datenbank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenutzerRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Anlegen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
}
