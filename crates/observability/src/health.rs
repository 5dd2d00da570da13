//! Health-Check-Endpunkt fuer Chimecast
//!
//! `GET /health` liefert Status, Version, Uptime, DB-Status und die aktuelle
//! Signaling-Last. Ohne erreichbares Raum-Verzeichnis ist kein Beitritt
//! moeglich, deshalb meldet der Endpunkt dann 503.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::metrics::ChimecastMetrics;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    fn http_status(self) -> StatusCode {
        match self {
            Self::Healthy => StatusCode::OK,
            Self::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub db_connected: bool,
    pub active_rooms: i64,
    pub connections: i64,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    gestartet: Instant,
    db_verbunden: Arc<AtomicBool>,
    metriken: ChimecastMetrics,
}

impl HealthState {
    /// Die Datenbank gilt bis zur ersten Meldung als getrennt
    pub fn neu(metriken: ChimecastMetrics) -> Self {
        Self {
            gestartet: Instant::now(),
            db_verbunden: Arc::new(AtomicBool::new(false)),
            metriken,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.gestartet.elapsed().as_secs()
    }

    pub fn db_verbunden(&self) -> bool {
        self.db_verbunden.load(Ordering::Relaxed)
    }

    pub fn db_status_setzen(&self, verbunden: bool) {
        self.db_verbunden.store(verbunden, Ordering::Relaxed);
    }

    /// Momentaufnahme fuer die Antwort
    pub fn bericht(&self) -> HealthResponse {
        let db_connected = self.db_verbunden();
        HealthResponse {
            status: if db_connected {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            db_connected,
            active_rooms: self.metriken.aktive_raeume.get(),
            connections: self.metriken.verbindungen.get(),
        }
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let bericht = state.bericht();
    (bericht.status.http_status(), Json(bericht))
}
