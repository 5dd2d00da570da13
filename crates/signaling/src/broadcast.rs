//! Broadcast-Relay – verteilt Nachrichten an die Zugelassenen eines Raums
//!
//! Fehlschlaege einzelner Empfaenger (Queue voll oder geschlossen) werden
//! geloggt und gezaehlt, brechen die Verteilung aber nie ab und entfernen
//! die betroffene Verbindung nicht. Aufgeraeumt wird ausschliesslich ueber
//! den Cleanup der jeweiligen Verbindungsschleife.

use std::sync::Arc;

use chimecast_core::{RoomId, UserId};
use chimecast_observability::ChimecastMetrics;

use crate::registry::{RaumEintrag, VerbindungsRegistry};

/// Sendet `text` an alle Zugelassenen ausser `ausgenommen`
///
/// Wird auch innerhalb von Mutationen mit dem bereits gehaltenen Eintrag
/// aufgerufen. Gibt die Anzahl erfolgreicher Zustellungen zurueck.
pub(crate) fn an_zugelassene(
    eintrag: &RaumEintrag,
    text: &Arc<str>,
    ausgenommen: Option<UserId>,
    metriken: &ChimecastMetrics,
) -> usize {
    let mut zugestellt = 0;
    for (user_id, verbindung) in &eintrag.zugelassen {
        if Some(*user_id) == ausgenommen {
            continue;
        }
        if verbindung.senden(Arc::clone(text)) {
            zugestellt += 1;
        } else {
            metriken.zustellfehler.inc();
        }
    }
    zugestellt
}

impl VerbindungsRegistry {
    /// Sendet eine Nachricht an alle Zugelassenen eines Raums ausser einem
    ///
    /// Unbekannte Raeume ergeben 0 Zustellungen.
    pub fn an_raum_senden(
        &self,
        raum_id: RoomId,
        text: Arc<str>,
        ausgenommen: Option<UserId>,
    ) -> usize {
        match self.raeume.get(&raum_id) {
            Some(eintrag) => an_zugelassene(&eintrag, &text, ausgenommen, &self.metriken),
            None => {
                tracing::debug!(raum_id = %raum_id, "Broadcast an Raum ohne Verbindungen");
                0
            }
        }
    }
}
