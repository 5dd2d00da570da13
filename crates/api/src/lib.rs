//! # chimecast-api
//!
//! HTTP-Oberflaeche von Chimecast:
//! - `/api/auth/v1/*` – Registrierung, Login, Logout, Session-Pruefung
//! - `/api/room/v1/*` – Raeume, Warteraum und WebSocket-Signaling
//!
//! Die Session wird als HTTP-only Cookie uebertragen.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiFehler, ApiResult};
pub use extract::JsonBody;
pub use middleware::Identitaet;
pub use routes::api_router;
pub use server::{app_erstellen, ApiServer, ApiServerKonfig};
pub use state::{ApiState, CookieKonfig};
