//! Gemeinsamer Axum-State der API

use std::sync::Arc;

use chimecast_auth::AuthService;
use chimecast_signaling::RaumService;

/// Einstellungen des Session-Cookies
#[derive(Debug, Clone)]
pub struct CookieKonfig {
    /// Cookie-Name, Standard `session_id`
    pub name: String,
    /// Nur ueber HTTPS senden
    pub secure: bool,
}

impl Default for CookieKonfig {
    fn default() -> Self {
        Self {
            name: "session_id".to_string(),
            secure: false,
        }
    }
}

/// Axum-State fuer alle API-Routen
#[derive(Clone)]
pub struct ApiState {
    pub auth: AuthService,
    pub raeume: Arc<RaumService>,
    pub cookie: Arc<CookieKonfig>,
}

impl ApiState {
    pub fn neu(auth: AuthService, raeume: Arc<RaumService>, cookie: CookieKonfig) -> Self {
        Self {
            auth,
            raeume,
            cookie: Arc::new(cookie),
        }
    }
}
