//! Zulassungs-Steuerung – Warteraum und Host-Entscheidungen
//!
//! Der Host eines Raums (laut Raum-Verzeichnis) wird sofort zugelassen,
//! alle anderen warten. Nur der Host darf Wartende zulassen oder ablehnen.
//! Die Host-Pruefung liegt vor jeder Mutation; ein abgewiesener Aufruf
//! veraendert die Registry nicht.

use std::sync::Arc;

use chimecast_core::{RoomId, UserId};
use chimecast_db::{RaumRecord, RaumVerzeichnis};

use crate::error::{SignalingError, SignalingResult};
use crate::nachricht::GRUND_ABGELEHNT;
use crate::registry::VerbindungsRegistry;
use crate::verbindung::TeilnehmerStatus;

pub struct Zulassung {
    verzeichnis: Arc<dyn RaumVerzeichnis>,
    registry: Arc<VerbindungsRegistry>,
}

impl Zulassung {
    pub fn neu(verzeichnis: Arc<dyn RaumVerzeichnis>, registry: Arc<VerbindungsRegistry>) -> Self {
        Self {
            verzeichnis,
            registry,
        }
    }

    /// Laedt den Raum oder liefert `NichtGefunden`
    pub async fn raum_laden(&self, raum_id: RoomId) -> SignalingResult<RaumRecord> {
        self.verzeichnis
            .raum_laden(raum_id)
            .await?
            .ok_or_else(|| SignalingError::nicht_gefunden(format!("Raum {raum_id}")))
    }

    /// Ermittelt, in welche Menge der Benutzer beim Verbinden kommt
    ///
    /// Wer bereits zugelassen ist, bleibt es auch mit einer neuen Verbindung.
    /// Aendert selbst nichts an der Registry.
    pub async fn beitreten(
        &self,
        raum_id: RoomId,
        user_id: UserId,
    ) -> SignalingResult<TeilnehmerStatus> {
        let raum = self.raum_laden(raum_id).await?;
        let bereits_zugelassen =
            self.registry.status(raum_id, user_id) == Some(TeilnehmerStatus::Zugelassen);
        let status = if raum.ist_host(user_id) || bereits_zugelassen {
            TeilnehmerStatus::Zugelassen
        } else {
            TeilnehmerStatus::Wartend
        };
        tracing::debug!(raum_id = %raum_id, user_id = %user_id, status = %status, "Beitritt aufgeloest");
        Ok(status)
    }

    /// Host laesst einen wartenden Teilnehmer zu
    pub async fn zulassen(
        &self,
        raum_id: RoomId,
        teilnehmer: UserId,
        anfragender: UserId,
    ) -> SignalingResult<()> {
        self.host_pruefen(raum_id, anfragender).await?;
        self.registry.wartend_zulassen(raum_id, teilnehmer)
    }

    /// Host lehnt einen wartenden Teilnehmer ab
    pub async fn ablehnen(
        &self,
        raum_id: RoomId,
        teilnehmer: UserId,
        anfragender: UserId,
    ) -> SignalingResult<()> {
        self.host_pruefen(raum_id, anfragender).await?;
        self.registry
            .wartend_ablehnen(raum_id, teilnehmer, GRUND_ABGELEHNT)
    }

    async fn host_pruefen(&self, raum_id: RoomId, anfragender: UserId) -> SignalingResult<RaumRecord> {
        let raum = self.raum_laden(raum_id).await?;
        if !raum.ist_host(anfragender) {
            tracing::warn!(
                raum_id = %raum_id,
                user_id = %anfragender,
                "Zulassungsentscheidung ohne Host-Rechte abgewiesen"
            );
            return Err(SignalingError::nicht_autorisiert(
                "Nur der Host darf Teilnehmer zulassen oder ablehnen",
            ));
        }
        Ok(raum)
    }
}
