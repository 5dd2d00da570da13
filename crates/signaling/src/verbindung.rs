//! Eine registrierte Client-Verbindung
//!
//! Die Registry ist alleiniger Besitzer des Senders. Wird die `Verbindung`
//! aus der Registry entfernt und fallengelassen, endet die Empfangs-Queue
//! und die Verbindungsschleife beendet sich ueber den normalen Cleanup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chimecast_core::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Standard-Groesse der Send-Queue pro Verbindung
pub const SEND_QUEUE_GROESSE: usize = 64;

static NAECHSTE_VERBINDUNG: AtomicU64 = AtomicU64::new(1);

/// Prozessweit eindeutige ID eines Sockets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerbindungsId(u64);

impl VerbindungsId {
    fn naechste() -> Self {
        Self(NAECHSTE_VERBINDUNG.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for VerbindungsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "verbindung:{}", self.0)
    }
}

/// Zustand eines Teilnehmers im Raum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeilnehmerStatus {
    #[serde(rename = "waiting")]
    Wartend,
    #[serde(rename = "admitted")]
    Zugelassen,
}

impl std::fmt::Display for TeilnehmerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wartend => write!(f, "waiting"),
            Self::Zugelassen => write!(f, "admitted"),
        }
    }
}

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Debug)]
pub struct Verbindung {
    pub id: VerbindungsId,
    pub user_id: UserId,
    pub beigetreten_am: DateTime<Utc>,
    pub status: TeilnehmerStatus,
    tx: mpsc::Sender<Arc<str>>,
}

impl Verbindung {
    /// Erstellt eine Verbindung und die zugehoerige Empfangs-Queue
    pub fn neu(
        user_id: UserId,
        status: TeilnehmerStatus,
        queue_groesse: usize,
    ) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(queue_groesse.max(1));
        let verbindung = Self {
            id: VerbindungsId::naechste(),
            user_id,
            beigetreten_am: Utc::now(),
            status,
            tx,
        };
        (verbindung, rx)
    }

    /// Sendet eine Nachricht nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, text: Arc<str>) -> bool {
        match self.tx.try_send(text) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(user_id = %self.user_id, verbindung = %self.id, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(user_id = %self.user_id, verbindung = %self.id, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}
