//! chimecast-signaling – Raum- und Signaling-Kern
//!
//! Verwaltet, wer in welchem Raum zugelassen ist oder wartet, und leitet
//! WebRTC-Signale zwischen den Zugelassenen eines Raums weiter. Medien
//! laufen nie durch den Server; Signal-Payloads werden unverstanden
//! weitergereicht.
//!
//! ## Architektur
//!
//! ```text
//! HTTP / WebSocket-Upgrade (chimecast-api)
//!     |
//!     v
//! RaumService
//!     +-- Zulassung            (Host sofort, alle anderen warten)
//!     +-- ClientVerbindung     (pro WebSocket ein Task)
//!             |
//!             v
//!     VerbindungsRegistry      (DashMap<RoomId, RaumEintrag>)
//!             +-- Broadcast    (an alle Zugelassenen ausser Absender)
//! ```

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod nachricht;
pub mod registry;
pub mod service;
pub mod verbindung;
pub mod zulassung;

// Bequeme Re-Exporte
pub use connection::{ClientVerbindung, Rahmen};
pub use error::{SignalingError, SignalingResult};
pub use nachricht::{EingehendeNachricht, ServerEreignis, SignalArt};
pub use registry::{TeilnehmerInfo, TeilnehmerListe, VerbindungsRegistry};
pub use service::{RaumService, RaumZustand, SignalingConfig};
pub use verbindung::{TeilnehmerStatus, Verbindung, VerbindungsId};
pub use zulassung::Zulassung;
