//! Session-Middleware fuer die Raum-Routen
//!
//! Liest das Session-Cookie, validiert es und legt die Identitaet des
//! Aufrufers als Request-Extension ab.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chimecast_core::UserId;

use crate::error::ApiFehler;
use crate::state::ApiState;

/// Identitaet des angemeldeten Aufrufers (als Extension gespeichert)
#[derive(Debug, Clone)]
pub struct Identitaet {
    pub user_id: UserId,
    pub username: String,
}

/// Liest den Session-Token aus dem Cookie, leere Werte zaehlen als fehlend
pub fn session_token(jar: &CookieJar, cookie_name: &str) -> Option<String> {
    jar.get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Axum-Middleware: ohne gueltige Session 401
pub async fn session_pruefen(
    State(state): State<ApiState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiFehler> {
    let token = session_token(&jar, &state.cookie.name).ok_or(ApiFehler::NichtAngemeldet)?;
    let session = state.auth.validieren(&token).await?;

    req.extensions_mut().insert(Identitaet {
        user_id: session.subject_id,
        username: session.subject_name,
    });
    Ok(next.run(req).await)
}
