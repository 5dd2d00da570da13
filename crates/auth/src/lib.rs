//! chimecast-auth – Registrierung, Login und Sessions
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id
//! - Session-Management (in-memory mit fester TTL)
//! - AuthService (Registrierung, Login, Logout, Session-Pruefung)

pub mod error;
pub mod password;
pub mod service;
pub mod session;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use password::{passwort_hashen, passwort_verifizieren};
pub use service::{AuthService, Registrierung};
pub use session::{Session, SessionStore, SESSION_TTL_STUNDEN};
