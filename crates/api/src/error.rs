//! Fehlertyp der HTTP-Schicht
//!
//! `ApiFehler` fasst Auth- und Signaling-Fehler zusammen und bildet sie auf
//! HTTP-Statuscodes ab. Der Body hat immer die Form
//! `{ "error": { "code": <status>, "message": <text> } }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chimecast_auth::AuthError;
use chimecast_signaling::SignalingError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiFehler {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Signaling(#[from] SignalingError),

    /// Ungueltige Anfrage (Pfad, Body, fehlender Cookie beim Logout)
    #[error("Ungueltige Anfrage: {0}")]
    Validierung(String),

    /// Kein Session-Cookie vorhanden
    #[error("Nicht angemeldet")]
    NichtAngemeldet,
}

impl ApiFehler {
    pub fn validierung(msg: impl Into<String>) -> Self {
        Self::Validierung(msg.into())
    }

    /// HTTP-Statuscode fuer diesen Fehler
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Validierung(_) => StatusCode::BAD_REQUEST,
            Self::NichtAngemeldet => StatusCode::UNAUTHORIZED,
            Self::Auth(e) => match e {
                AuthError::Validierung(_) => StatusCode::BAD_REQUEST,
                AuthError::UngueltigeAnmeldedaten | AuthError::SessionUngueltig => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::BenutzernameVergeben(_) => StatusCode::CONFLICT,
                AuthError::PasswortHashing(_) | AuthError::Datenbank(_) | AuthError::Intern(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Signaling(e) => match e {
                SignalingError::Validierung(_) => StatusCode::BAD_REQUEST,
                SignalingError::NichtAutorisiert(_) => StatusCode::FORBIDDEN,
                SignalingError::NichtGefunden(_) => StatusCode::NOT_FOUND,
                SignalingError::Datenbank(_) | SignalingError::Intern(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

/// Fehlerantwort fuer die REST-API
pub fn fehler_antwort(status: StatusCode, nachricht: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "code": status.as_u16(),
                "message": nachricht
            }
        })),
    )
        .into_response()
}

impl IntoResponse for ApiFehler {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            // Interna nicht an den Client weitergeben
            tracing::error!(fehler = %self, "Anfrage fehlgeschlagen");
            return fehler_antwort(status, "Interner Serverfehler");
        }
        fehler_antwort(status, &self.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiFehler>;

#[cfg(test)]
mod tests {
    use super::*;
    use chimecast_db::DbError;

    #[test]
    fn status_abbildung() {
        let faelle: Vec<(ApiFehler, StatusCode)> = vec![
            (AuthError::validierung("x").into(), StatusCode::BAD_REQUEST),
            (AuthError::UngueltigeAnmeldedaten.into(), StatusCode::UNAUTHORIZED),
            (AuthError::SessionUngueltig.into(), StatusCode::UNAUTHORIZED),
            (
                AuthError::BenutzernameVergeben("alice".into()).into(),
                StatusCode::CONFLICT,
            ),
            (SignalingError::validierung("x").into(), StatusCode::BAD_REQUEST),
            (SignalingError::nicht_autorisiert("x").into(), StatusCode::FORBIDDEN),
            (SignalingError::nicht_gefunden("x").into(), StatusCode::NOT_FOUND),
            (
                SignalingError::Datenbank(DbError::intern("x")).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiFehler::NichtAngemeldet, StatusCode::UNAUTHORIZED),
        ];
        for (fehler, erwartet) in faelle {
            assert_eq!(fehler.http_status(), erwartet, "{fehler}");
        }
    }

    #[test]
    fn serverfehler_verbergen_details() {
        let fehler: ApiFehler = SignalingError::intern("geheimes Detail").into();
        let antwort = fehler.into_response();
        assert_eq!(antwort.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
