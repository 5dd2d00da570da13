//! Extraktoren mit Fehlern im API-Format
//!
//! `axum::Json` lehnt kaputte Bodies mit Klartext ab (400/415/422). `JsonBody`
//! liefert stattdessen `ApiFehler::Validierung` und damit denselben
//! Fehler-Body wie alle anderen Endpunkte.

use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::error::ApiFehler;

/// JSON-Body einer Anfrage
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiFehler))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for ApiFehler {
    fn from(ablehnung: JsonRejection) -> Self {
        tracing::debug!(status = %ablehnung.status(), fehler = %ablehnung.body_text(), "JSON-Body abgelehnt");
        ApiFehler::validierung(ablehnung.body_text())
    }
}
