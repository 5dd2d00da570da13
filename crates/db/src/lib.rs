//! chimecast-db – Persistenz fuer Raeume und Benutzer
//!
//! Das Repository-Pattern entkoppelt Raum-Service und Auth-Service von der
//! konkreten Datenbank. Die Traits sind Objekt-sicher (`async-trait`), damit
//! die Services `Arc<dyn …>` halten koennen. Die einzige Implementierung ist
//! SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::{DbError, DbResult};
pub use models::{BenutzerRecord, NeuerBenutzer, RaumRecord, RaumStatus};
pub use repository::{raeume_sortieren, BenutzerRepository, DatabaseConfig, RaumVerzeichnis};
pub use sqlite::SqliteDb;
