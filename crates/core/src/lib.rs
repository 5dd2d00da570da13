//! chimecast-core – Gemeinsame Typen fuer alle Chimecast-Crates
//!
//! Enthaelt die ID-Newtypes fuer Benutzer und Raeume sowie die
//! austauschbare Zeitquelle, ueber die Sessions ihr Ablaufdatum pruefen.

pub mod types;
pub mod zeit;

// Re-Exporte fuer bequemen Zugriff
pub use types::{RoomId, UserId};
pub use zeit::{ManuelleUhr, SystemUhr, Uhr};
