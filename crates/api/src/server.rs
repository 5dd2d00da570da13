//! Axum HTTP-Server fuer die Chimecast-API

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Result;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, Router};
use chimecast_observability::{http_metriken, request_trace_layer, ChimecastMetrics};
use tower_http::cors::CorsLayer;

use crate::routes::api_router;
use crate::state::ApiState;

/// API-Server-Konfiguration
#[derive(Debug, Clone)]
pub struct ApiServerKonfig {
    pub bind_addr: SocketAddr,
    /// Erlaubte CORS-Origins. Leer = alle Origins erlaubt (nur fuer Entwicklung).
    pub cors_origins: Vec<String>,
}

impl Default for ApiServerKonfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cors_origins: vec![],
        }
    }
}

/// CORS konfigurieren: entweder spezifische Origins (mit Cookies) oder Any
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Baut die vollstaendige App inkl. Tracing, Metriken und CORS
pub fn app_erstellen(state: ApiState, metriken: ChimecastMetrics, cors_origins: &[String]) -> Router {
    api_router(state)
        .layer(middleware::from_fn_with_state(metriken, http_metriken))
        .layer(request_trace_layer())
        .layer(cors_layer(cors_origins))
}

/// Axum HTTP-Server fuer die API
pub struct ApiServer {
    konfig: ApiServerKonfig,
}

impl ApiServer {
    pub fn neu(konfig: ApiServerKonfig) -> Self {
        Self { konfig }
    }

    /// Startet den Server und laeuft bis `shutdown` fertig ist
    pub async fn starten(
        self,
        state: ApiState,
        metriken: ChimecastMetrics,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let app = app_erstellen(state, metriken, &self.konfig.cors_origins);

        let listener = tokio::net::TcpListener::bind(self.konfig.bind_addr).await?;
        tracing::info!(addr = %self.konfig.bind_addr, "API-Server gestartet");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
