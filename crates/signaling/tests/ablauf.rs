//! Kompletter Ablauf: Host erstellt Raum, Gast wartet, Host laesst zu,
//! beide tauschen Signale, Raum leert sich.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use chimecast_core::UserId;
use chimecast_db::SqliteDb;
use chimecast_observability::ChimecastMetrics;
use chimecast_signaling::{
    Rahmen, RaumService, SignalingConfig, SignalingError, TeilnehmerStatus, VerbindungsRegistry,
};
use futures::channel::mpsc;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;

struct Client {
    eingang: mpsc::UnboundedSender<Result<Rahmen, Infallible>>,
    ausgang: mpsc::UnboundedReceiver<Rahmen>,
    task: JoinHandle<()>,
}

impl Client {
    async fn verbinden(service: &RaumService, raum: chimecast_core::RoomId, user: UserId) -> Self {
        let verbindung = service
            .verbindung_vorbereiten(raum, user)
            .await
            .expect("Verbindung vorbereiten fehlgeschlagen");
        let (eingang, server_eingang) = mpsc::unbounded();
        let (server_ausgang, ausgang) = mpsc::unbounded();
        let task = tokio::spawn(verbindung.verarbeiten(server_eingang, server_ausgang));
        Self {
            eingang,
            ausgang,
            task,
        }
    }

    fn senden(&self, text: &str) {
        self.eingang
            .unbounded_send(Ok(Rahmen::Text(text.to_string())))
            .unwrap();
    }

    async fn json(&mut self) -> Value {
        let rahmen = tokio::time::timeout(Duration::from_secs(2), self.ausgang.next())
            .await
            .expect("Timeout beim Warten auf Nachricht")
            .expect("Ausgang geschlossen");
        match rahmen {
            Rahmen::Text(text) => serde_json::from_str(&text).unwrap(),
            Rahmen::Schliessen => panic!("Unerwartetes Schliessen"),
        }
    }

    async fn beendet(self) {
        tokio::time::timeout(Duration::from_secs(2), self.task)
            .await
            .expect("Schleife endet nicht")
            .unwrap();
    }
}

async fn warten_bis(bedingung: impl Fn() -> bool) {
    for _ in 0..200 {
        if bedingung() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("Bedingung nicht erreicht");
}

async fn service() -> RaumService {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let db = SqliteDb::in_memory().await.unwrap();
    let registry = Arc::new(VerbindungsRegistry::neu(ChimecastMetrics::neu().unwrap()));
    RaumService::neu(Arc::new(db), registry, SignalingConfig::default())
}

#[tokio::test]
async fn host_laesst_gast_zu_und_beide_signalisieren() {
    let service = service().await;
    let host = UserId::new();
    let gast = UserId::new();
    let raum = service.raum_erstellen("Kundentermin", host).await.unwrap();

    // Host ist sofort zugelassen, Gast wartet
    assert_eq!(service.beitreten(raum.id, host).await.unwrap(), TeilnehmerStatus::Zugelassen);
    assert_eq!(service.beitreten(raum.id, gast).await.unwrap(), TeilnehmerStatus::Wartend);

    let mut client_host = Client::verbinden(&service, raum.id, host).await;
    warten_bis(|| service.registry().status(raum.id, host).is_some()).await;
    let mut client_gast = Client::verbinden(&service, raum.id, gast).await;

    let update = client_host.json().await;
    assert_eq!(update["type"], "participant-update");
    assert_eq!(update["payload"]["waiting"][0], gast.inner().to_string());

    let zustand = service.zustand(raum.id, gast).await.unwrap();
    assert_eq!(zustand.participant_status, "waiting");
    assert_eq!((zustand.admitted_count, zustand.waiting_count), (1, 1));

    // Nur der Host darf zulassen
    let err = service.zulassen(raum.id, gast, gast).await.unwrap_err();
    assert!(matches!(err, SignalingError::NichtAutorisiert(_)));

    service.zulassen(raum.id, gast, host).await.unwrap();
    assert_eq!(client_gast.json().await["type"], "admitted");
    let join = client_host.json().await;
    assert_eq!(join["type"], "join");
    assert_eq!(join["payload"]["userId"], gast.inner().to_string());

    // Signalaustausch in beide Richtungen
    client_host.senden(r#"{"type":"offer","payload":{"sdp":"host-sdp"}}"#);
    let offer = client_gast.json().await;
    assert_eq!(offer["payload"]["sdp"], "host-sdp");
    assert_eq!(offer["senderId"], host.inner().to_string());

    client_gast.senden(r#"{"type":"answer","payload":{"sdp":"gast-sdp"}}"#);
    let answer = client_host.json().await;
    assert_eq!(answer["payload"]["sdp"], "gast-sdp");
    assert_eq!(answer["senderId"], gast.inner().to_string());

    let teilnehmer = service.teilnehmer(raum.id).await.unwrap();
    assert_eq!(teilnehmer.zugelassen.len(), 2);
    assert!(teilnehmer.wartend.is_empty());

    // Host geht, Gast bleibt und erfaehrt es
    client_host.senden(r#"{"type":"leave"}"#);
    client_host.beendet().await;
    let leave = client_gast.json().await;
    assert_eq!(leave["type"], "leave");
    assert_eq!(leave["payload"]["userId"], host.inner().to_string());

    // Gast geht, Raum wird aus dem Speicher entfernt
    client_gast.senden(r#"{"type":"leave"}"#);
    client_gast.beendet().await;
    assert_eq!(service.registry().raum_anzahl(), 0);

    // Der gespeicherte Raum bleibt, erneuter Beitritt funktioniert
    assert_eq!(service.raeume_auflisten().await.unwrap().len(), 1);
    assert_eq!(service.beitreten(raum.id, host).await.unwrap(), TeilnehmerStatus::Zugelassen);
}

#[tokio::test]
async fn http_verlassen_schliesst_websocket() {
    let service = service().await;
    let host = UserId::new();
    let raum = service.raum_erstellen("Runde", host).await.unwrap();

    let client_host = Client::verbinden(&service, raum.id, host).await;
    warten_bis(|| service.registry().status(raum.id, host).is_some()).await;

    assert_eq!(
        service.verlassen(raum.id, host).await.unwrap(),
        TeilnehmerStatus::Zugelassen
    );
    client_host.beendet().await;
    assert_eq!(service.registry().raum_anzahl(), 0);
}
