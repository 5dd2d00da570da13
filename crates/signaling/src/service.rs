//! Raum-Service – Einstiegspunkt fuer die HTTP-Schicht
//!
//! Buendelt Raum-Verzeichnis, Verbindungs-Registry und Zulassung. Alle
//! Raum-bezogenen Operationen pruefen zuerst, ob der Raum existiert.

use std::sync::Arc;

use chimecast_core::{RoomId, UserId};
use chimecast_db::{RaumRecord, RaumStatus, RaumVerzeichnis};
use chrono::Utc;
use serde::Serialize;

use crate::connection::ClientVerbindung;
use crate::error::{SignalingError, SignalingResult};
use crate::registry::{TeilnehmerListe, VerbindungsRegistry};
use crate::verbindung::{TeilnehmerStatus, SEND_QUEUE_GROESSE};
use crate::zulassung::Zulassung;

/// Maximale Laenge eines Raumnamens in Zeichen
pub const RAUMNAME_MAX_LAENGE: usize = 100;

/// Laufzeit-Einstellungen des Signaling-Kerns
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            send_queue_groesse: SEND_QUEUE_GROESSE,
        }
    }
}

/// Zustand eines Raums aus Sicht eines Benutzers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaumZustand {
    pub room_id: RoomId,
    pub name: String,
    pub host_id: UserId,
    pub is_host: bool,
    pub room_status: RaumStatus,
    /// "admitted", "waiting" oder "none"
    pub participant_status: String,
    pub admitted_count: usize,
    pub waiting_count: usize,
}

pub struct RaumService {
    verzeichnis: Arc<dyn RaumVerzeichnis>,
    registry: Arc<VerbindungsRegistry>,
    zulassung: Zulassung,
    config: SignalingConfig,
}

impl RaumService {
    pub fn neu(
        verzeichnis: Arc<dyn RaumVerzeichnis>,
        registry: Arc<VerbindungsRegistry>,
        config: SignalingConfig,
    ) -> Self {
        let zulassung = Zulassung::neu(Arc::clone(&verzeichnis), Arc::clone(&registry));
        Self {
            verzeichnis,
            registry,
            zulassung,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<VerbindungsRegistry> {
        &self.registry
    }

    /// Legt einen neuen aktiven Raum mit `host_id` als Host an
    pub async fn raum_erstellen(&self, name: &str, host_id: UserId) -> SignalingResult<RaumRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SignalingError::validierung("Raumname darf nicht leer sein"));
        }
        if name.chars().count() > RAUMNAME_MAX_LAENGE {
            return Err(SignalingError::validierung(format!(
                "Raumname laenger als {RAUMNAME_MAX_LAENGE} Zeichen"
            )));
        }

        let raum = RaumRecord::neu(name, host_id, Utc::now());
        self.verzeichnis.raum_erstellen(&raum).await?;

        tracing::info!(raum_id = %raum.id, host_id = %host_id, name = %raum.name, "Raum erstellt");
        Ok(raum)
    }

    pub async fn raeume_auflisten(&self) -> SignalingResult<Vec<RaumRecord>> {
        Ok(self.verzeichnis.raeume_auflisten().await?)
    }

    /// Ermittelt den Status, mit dem der Benutzer beim Verbinden startet
    pub async fn beitreten(
        &self,
        raum_id: RoomId,
        user_id: UserId,
    ) -> SignalingResult<TeilnehmerStatus> {
        self.zulassung.beitreten(raum_id, user_id).await
    }

    /// Loest den Beitritt auf und bindet eine startbereite Verbindung
    pub async fn verbindung_vorbereiten(
        &self,
        raum_id: RoomId,
        user_id: UserId,
    ) -> SignalingResult<ClientVerbindung> {
        let status = self.beitreten(raum_id, user_id).await?;
        Ok(ClientVerbindung::neu(
            Arc::clone(&self.registry),
            raum_id,
            user_id,
            status,
            self.config.send_queue_groesse,
        ))
    }

    pub async fn zulassen(
        &self,
        raum_id: RoomId,
        teilnehmer: UserId,
        anfragender: UserId,
    ) -> SignalingResult<()> {
        self.zulassung.zulassen(raum_id, teilnehmer, anfragender).await
    }

    pub async fn ablehnen(
        &self,
        raum_id: RoomId,
        teilnehmer: UserId,
        anfragender: UserId,
    ) -> SignalingResult<()> {
        self.zulassung.ablehnen(raum_id, teilnehmer, anfragender).await
    }

    /// Entfernt den Benutzer aus dem Raum und schliesst seine Verbindung
    pub async fn verlassen(
        &self,
        raum_id: RoomId,
        user_id: UserId,
    ) -> SignalingResult<TeilnehmerStatus> {
        self.zulassung.raum_laden(raum_id).await?;
        self.registry
            .verlassen(raum_id, user_id)
            .ok_or_else(|| SignalingError::nicht_gefunden(format!("{user_id} ist nicht in {raum_id}")))
    }

    pub async fn teilnehmer(&self, raum_id: RoomId) -> SignalingResult<TeilnehmerListe> {
        self.zulassung.raum_laden(raum_id).await?;
        Ok(self.registry.teilnehmer(raum_id))
    }

    pub async fn zustand(&self, raum_id: RoomId, user_id: UserId) -> SignalingResult<RaumZustand> {
        let raum = self.zulassung.raum_laden(raum_id).await?;
        let (admitted_count, waiting_count) = self.registry.anzahl(raum_id);
        let participant_status = self
            .registry
            .status(raum_id, user_id)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string());

        Ok(RaumZustand {
            room_id: raum.id,
            is_host: raum.ist_host(user_id),
            name: raum.name,
            host_id: raum.host_id,
            room_status: raum.status,
            participant_status,
            admitted_count,
            waiting_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chimecast_db::SqliteDb;
    use chimecast_observability::ChimecastMetrics;

    async fn service() -> RaumService {
        let db = SqliteDb::in_memory().await.unwrap();
        let registry = Arc::new(VerbindungsRegistry::neu(ChimecastMetrics::neu().unwrap()));
        RaumService::neu(Arc::new(db), registry, SignalingConfig::default())
    }

    #[tokio::test]
    async fn raum_erstellen_und_auflisten() {
        let service = service().await;
        let host = UserId::new();

        let raum = service.raum_erstellen("  Daily  ", host).await.unwrap();
        assert_eq!(raum.name, "Daily");
        assert_eq!(raum.host_id, host);

        let raeume = service.raeume_auflisten().await.unwrap();
        assert_eq!(raeume.len(), 1);
        assert_eq!(raeume[0].id, raum.id);
    }

    #[tokio::test]
    async fn leerer_oder_zu_langer_name() {
        let service = service().await;
        let err = service.raum_erstellen("   ", UserId::new()).await.unwrap_err();
        assert!(matches!(err, SignalingError::Validierung(_)));

        let lang = "x".repeat(RAUMNAME_MAX_LAENGE + 1);
        let err = service.raum_erstellen(&lang, UserId::new()).await.unwrap_err();
        assert!(matches!(err, SignalingError::Validierung(_)));
    }

    #[tokio::test]
    async fn abfragen_auf_unbekanntem_raum() {
        let service = service().await;
        let raum = RoomId::new();
        let user = UserId::new();

        assert!(matches!(
            service.teilnehmer(raum).await,
            Err(SignalingError::NichtGefunden(_))
        ));
        assert!(matches!(
            service.zustand(raum, user).await,
            Err(SignalingError::NichtGefunden(_))
        ));
        assert!(matches!(
            service.verlassen(raum, user).await,
            Err(SignalingError::NichtGefunden(_))
        ));
        assert!(service.verbindung_vorbereiten(raum, user).await.is_err());
    }

    #[tokio::test]
    async fn zustand_ohne_verbindung() {
        let service = service().await;
        let host = UserId::new();
        let raum = service.raum_erstellen("Sprint", host).await.unwrap();

        let zustand = service.zustand(raum.id, host).await.unwrap();
        assert!(zustand.is_host);
        assert_eq!(zustand.participant_status, "none");
        assert_eq!(zustand.admitted_count, 0);

        let json = serde_json::to_value(&zustand).unwrap();
        assert_eq!(json["roomStatus"], "active");
        assert_eq!(json["participantStatus"], "none");
        assert!(json.get("hostId").is_some());
    }

    #[tokio::test]
    async fn verlassen_ohne_teilnahme_ist_nicht_gefunden() {
        let service = service().await;
        let raum = service.raum_erstellen("Leer", UserId::new()).await.unwrap();
        let err = service.verlassen(raum.id, UserId::new()).await.unwrap_err();
        assert!(matches!(err, SignalingError::NichtGefunden(_)));
    }
}
