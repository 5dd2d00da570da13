//! HTTP-Metriken-Middleware fuer Axum
//!
//! Zaehlt jede Anfrage nach Methode und Statuscode und misst die Antwortzeit.
//! Das eigentliche Request-Logging uebernimmt `TraceLayer`.

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    middleware::Next,
};
use std::time::Instant;

use crate::metrics::ChimecastMetrics;

/// Erstellt den TraceLayer fuer strukturiertes Request-Logging
pub fn request_trace_layer() -> tower_http::trace::TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
> {
    tower_http::trace::TraceLayer::new_for_http()
}

/// Axum-Middleware-Funktion: erfasst Anfrage-Zaehler und Antwortzeit.
///
/// Verwendung:
/// ```ignore
/// Router::new()
///     .route("/", get(handler))
///     .layer(axum::middleware::from_fn_with_state(metriken, http_metriken))
/// ```
pub async fn http_metriken(
    State(metriken): State<ChimecastMetrics>,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    let methode = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    metriken
        .http_requests_total
        .with_label_values(&[methode.as_str(), status.as_str()])
        .inc();
    metriken
        .http_request_duration_seconds
        .with_label_values(&[methode.as_str()])
        .observe(start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn anfragen_werden_gezaehlt() {
        let metriken = ChimecastMetrics::neu().unwrap();
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(axum::middleware::from_fn_with_state(
                metriken.clone(),
                http_metriken,
            ));

        let antwort = app
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), 200);

        let wert = metriken
            .http_requests_total
            .with_label_values(&["GET", "200"])
            .get();
        assert_eq!(wert, 1);
    }
}
