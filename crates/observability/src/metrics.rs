//! Prometheus-kompatible Metriken fuer Chimecast
//!
//! Registrierte Metriken:
//! - `chimecast_aktive_raeume` – Gauge: Raeume mit Eintrag in der Registry
//! - `chimecast_verbindungen` – Gauge: Registrierte WebSocket-Verbindungen
//! - `chimecast_wartende_teilnehmer` – Gauge: Teilnehmer im Warteraum
//! - `chimecast_signale_weitergeleitet_total` – Counter: Zugestellte Signale
//! - `chimecast_zustellfehler_total` – Counter: Verworfene Zustellungen (Queue voll/zu)
//! - `chimecast_http_requests_total` – Counter: HTTP-Anfragen (method, status)
//! - `chimecast_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Alle Chimecast-Prometheus-Metriken
///
/// Clone ist billig; alle Klone zaehlen in dieselbe Registry.
#[derive(Clone)]
pub struct ChimecastMetrics {
    pub registry: Arc<Registry>,

    // Signaling
    pub aktive_raeume: IntGauge,
    pub verbindungen: IntGauge,
    pub wartende_teilnehmer: IntGauge,
    pub signale_weitergeleitet: IntCounter,
    pub zustellfehler: IntCounter,

    // HTTP
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl ChimecastMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let aktive_raeume = IntGauge::with_opts(Opts::new(
            "chimecast_aktive_raeume",
            "Anzahl Raeume mit mindestens einer Verbindung",
        ))?;
        registry.register(Box::new(aktive_raeume.clone()))?;

        let verbindungen = IntGauge::with_opts(Opts::new(
            "chimecast_verbindungen",
            "Anzahl registrierter WebSocket-Verbindungen",
        ))?;
        registry.register(Box::new(verbindungen.clone()))?;

        let wartende_teilnehmer = IntGauge::with_opts(Opts::new(
            "chimecast_wartende_teilnehmer",
            "Anzahl Teilnehmer im Warteraum",
        ))?;
        registry.register(Box::new(wartende_teilnehmer.clone()))?;

        let signale_weitergeleitet = IntCounter::with_opts(Opts::new(
            "chimecast_signale_weitergeleitet_total",
            "Gesamtanzahl zugestellter WebRTC-Signale",
        ))?;
        registry.register(Box::new(signale_weitergeleitet.clone()))?;

        let zustellfehler = IntCounter::with_opts(Opts::new(
            "chimecast_zustellfehler_total",
            "Verworfene Zustellungen wegen voller oder geschlossener Send-Queue",
        ))?;
        registry.register(Box::new(zustellfehler.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("chimecast_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "chimecast_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry: Arc::new(registry),
            aktive_raeume,
            verbindungen,
            wartende_teilnehmer,
            signale_weitergeleitet,
            zustellfehler,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: ChimecastMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<ChimecastMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
