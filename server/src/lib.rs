//! chimecast-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Auth, Signaling, API und Observability und stellt
//! den oeffentlichen Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chimecast_api::{ApiServer, ApiState};
use chimecast_auth::{AuthService, SessionStore};
use chimecast_core::SystemUhr;
use chimecast_db::SqliteDb;
use chimecast_observability::{observability_server_starten, ChimecastMetrics, HealthState};
use chimecast_signaling::{RaumService, VerbindungsRegistry};
use config::ServerConfig;
use tokio::sync::watch;

/// Abstand zwischen zwei Datenbank-Pings fuer den Health-Status
const DB_PING_INTERVALL: Duration = Duration::from_secs(30);

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbank oeffnen und migrieren (Fehler beendet den Prozess)
    /// 2. Auth- und Raum-Service aufbauen
    /// 3. Observability-Server starten (optional)
    /// 4. REST-API starten
    /// 5. Auf Ctrl-C / SIGTERM warten
    pub async fn starten(self) -> Result<()> {
        let api_konfig = self.config.api_server_konfig()?;
        tracing::info!(
            server_name = %self.config.server.name,
            api = %api_konfig.bind_addr,
            "Server startet"
        );

        let metriken = ChimecastMetrics::neu()?;
        let health = HealthState::neu(metriken.clone());

        let db = SqliteDb::oeffnen(&self.config.datenbank_config())
            .await
            .context("Datenbank konnte nicht geoeffnet werden")?;
        health.db_status_setzen(true);
        let db = Arc::new(db);

        let sessions = SessionStore::mit_uhr(
            chrono::Duration::hours(self.config.sessions.ttl_stunden),
            Arc::new(SystemUhr),
        );
        let auth = AuthService::neu(db.clone(), sessions);
        let registry = Arc::new(VerbindungsRegistry::neu(metriken.clone()));
        let raeume = Arc::new(RaumService::neu(
            db.clone(),
            registry,
            self.config.signaling_config(),
        ));
        let state = ApiState::neu(auth, raeume, self.config.cookie_konfig());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown_tx = Arc::new(shutdown_tx);

        let ping_task = tokio::spawn(db_ueberwachen(
            db.clone(),
            health.clone(),
            shutdown_rx.clone(),
        ));

        let observability_task = if self.config.observability.aktiviert {
            let addr = self.config.observability_bind_adresse()?;
            let metriken = metriken.clone();
            let health = health.clone();
            let rx = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                if let Err(e) =
                    observability_server_starten(addr, metriken, health, warten_auf_shutdown(rx))
                        .await
                {
                    tracing::error!(fehler = %e, "Observability-Server beendet");
                }
            }))
        } else {
            None
        };

        let signal_tx = Arc::clone(&shutdown_tx);
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            let _ = signal_tx.send(true);
        });

        let ergebnis = ApiServer::neu(api_konfig)
            .starten(state, metriken, warten_auf_shutdown(shutdown_rx))
            .await;

        // Auch bei einem Fehler der API die Hintergrund-Tasks beenden
        let _ = shutdown_tx.send(true);

        if let Some(task) = observability_task {
            let _ = task.await;
        }
        let _ = ping_task.await;

        tracing::info!("Server beendet");
        ergebnis
    }
}

/// Aktualisiert den Health-Status regelmaessig per Ping
async fn db_ueberwachen(db: Arc<SqliteDb>, health: HealthState, mut shutdown: watch::Receiver<bool>) {
    let mut intervall = tokio::time::interval(DB_PING_INTERVALL);
    loop {
        tokio::select! {
            _ = intervall.tick() => {
                let erreichbar = db.ping().await;
                if erreichbar != health.db_verbunden() {
                    tracing::warn!(erreichbar, "Datenbank-Status geaendert");
                }
                health.db_status_setzen(erreichbar);
            }
            _ = shutdown.changed() => break,
        }
    }
}

async fn warten_auf_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Wartet auf Ctrl-C oder (unter Unix) SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(fehler = %e, "Ctrl-C-Handler konnte nicht installiert werden");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(fehler = %e, "SIGTERM-Handler konnte nicht installiert werden");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
