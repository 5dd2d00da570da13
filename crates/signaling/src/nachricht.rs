//! WebSocket-Nachrichtenformat
//!
//! Jede Nachricht ist ein Umschlag `{ "type": ..., "payload": ... }`; `data`
//! wird als Alias fuer `payload` akzeptiert. Signal-Payloads (offer, answer,
//! ice-candidate) bleiben `RawValue` und werden byte-genau weitergereicht,
//! ergaenzt um `senderId`.

use std::sync::Arc;

use chimecast_core::{RoomId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{SignalingError, SignalingResult};

/// Grund fuer `denied`, wenn der Raum sich leert waehrend jemand wartet
pub const GRUND_RAUM_GESCHLOSSEN: &str = "raum-geschlossen";
/// Grund fuer `denied` nach Ablehnung durch den Host
pub const GRUND_ABGELEHNT: &str = "vom-host-abgelehnt";

/// Art eines WebRTC-Signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalArt {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalArt {
    fn aus_typ(typ: &str) -> Option<Self> {
        match typ {
            "offer" => Some(Self::Offer),
            "answer" => Some(Self::Answer),
            "ice-candidate" => Some(Self::IceCandidate),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Umschlag {
    #[serde(rename = "type")]
    typ: String,
    #[serde(default, alias = "data")]
    payload: Option<Box<RawValue>>,
}

/// Vom Client empfangene Nachricht
#[derive(Debug)]
pub enum EingehendeNachricht {
    Join,
    Leave,
    Signal {
        art: SignalArt,
        payload: Option<Box<RawValue>>,
    },
    /// Gueltiger Umschlag mit unbekanntem Typ
    Unbekannt(String),
}

impl EingehendeNachricht {
    /// Parst einen Text-Frame. Fehler nur bei kaputtem JSON oder fehlendem `type`.
    pub fn parsen(text: &str) -> Result<Self, serde_json::Error> {
        let umschlag: Umschlag = serde_json::from_str(text)?;
        Ok(match umschlag.typ.as_str() {
            "join" => Self::Join,
            "leave" => Self::Leave,
            typ => match SignalArt::aus_typ(typ) {
                Some(art) => Self::Signal {
                    art,
                    payload: umschlag.payload,
                },
                None => Self::Unbekannt(typ.to_string()),
            },
        })
    }
}

/// Vom Server erzeugte Ereignisse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEreignis {
    /// Teilnehmer ist jetzt zugelassen (an die uebrigen Zugelassenen)
    Join { user_id: UserId },
    /// Teilnehmer hat den Raum verlassen
    Leave { user_id: UserId },
    /// An den Teilnehmer selbst: Host hat zugelassen
    Admitted { room_id: RoomId },
    /// An den Teilnehmer selbst: abgelehnt oder Raum geschlossen
    Denied {
        room_id: RoomId,
        #[serde(rename = "reason")]
        grund: String,
    },
    /// Aktuelle Belegung, an die Zugelassenen wenn jemand wartet
    ParticipantUpdate {
        admitted: Vec<UserId>,
        waiting: Vec<UserId>,
    },
}

impl ServerEreignis {
    /// Serialisiert einmal; der Text wird an alle Empfaenger geteilt
    pub fn als_text(&self) -> SignalingResult<Arc<str>> {
        serde_json::to_string(self)
            .map(Arc::from)
            .map_err(|e| SignalingError::intern(format!("Ereignis nicht serialisierbar: {e}")))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeitergeleitetesSignal<'a> {
    #[serde(rename = "type")]
    art: SignalArt,
    payload: Option<&'a RawValue>,
    sender_id: UserId,
}

/// Baut die weiterzuleitende Signal-Nachricht mit Absender
pub fn signal_text(
    art: SignalArt,
    payload: Option<&RawValue>,
    sender_id: UserId,
) -> SignalingResult<Arc<str>> {
    let signal = WeitergeleitetesSignal {
        art,
        payload,
        sender_id,
    };
    serde_json::to_string(&signal)
        .map(Arc::from)
        .map_err(|e| SignalingError::intern(format!("Signal nicht serialisierbar: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use uuid::Uuid;

    #[test]
    fn signal_mit_payload_parsen() {
        let text = r#"{"type":"offer","payload":{"sdp":"v=0 o=- 1","type":"offer"}}"#;
        match EingehendeNachricht::parsen(text).unwrap() {
            EingehendeNachricht::Signal { art, payload } => {
                assert_eq!(art, SignalArt::Offer);
                assert_eq!(payload.unwrap().get(), r#"{"sdp":"v=0 o=- 1","type":"offer"}"#);
            }
            andere => panic!("Signal erwartet, erhalten: {andere:?}"),
        }
    }

    #[test]
    fn data_ist_alias_fuer_payload() {
        let text = r#"{"type":"ice-candidate","data":{"candidate":"c1"}}"#;
        match EingehendeNachricht::parsen(text).unwrap() {
            EingehendeNachricht::Signal { art, payload } => {
                assert_eq!(art, SignalArt::IceCandidate);
                assert_eq!(payload.unwrap().get(), r#"{"candidate":"c1"}"#);
            }
            andere => panic!("Signal erwartet, erhalten: {andere:?}"),
        }
    }

    #[test]
    fn steuer_und_unbekannte_typen() {
        assert!(matches!(
            EingehendeNachricht::parsen(r#"{"type":"join"}"#).unwrap(),
            EingehendeNachricht::Join
        ));
        assert!(matches!(
            EingehendeNachricht::parsen(r#"{"type":"leave","payload":null}"#).unwrap(),
            EingehendeNachricht::Leave
        ));
        match EingehendeNachricht::parsen(r#"{"type":"chat","payload":"hi"}"#).unwrap() {
            EingehendeNachricht::Unbekannt(typ) => assert_eq!(typ, "chat"),
            andere => panic!("Unbekannt erwartet, erhalten: {andere:?}"),
        }
    }

    #[test]
    fn kaputtes_json_ist_fehler() {
        assert!(EingehendeNachricht::parsen("kein json").is_err());
        assert!(EingehendeNachricht::parsen(r#"{"payload":1}"#).is_err());
    }

    #[test]
    fn signal_wird_mit_absender_weitergeleitet() {
        let payload = RawValue::from_string(r#"{"sdp": "a b",  "x":[1,2]}"#.to_string()).unwrap();
        let absender = UserId(Uuid::nil());
        let text = signal_text(SignalArt::Answer, Some(&payload), absender).unwrap();

        // Payload bleibt byte-genau erhalten
        assert!(text.contains(r#""payload":{"sdp": "a b",  "x":[1,2]}"#));

        let wert: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(wert["type"], "answer");
        assert_eq!(wert["senderId"], "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn server_ereignisse_format() {
        let uid = UserId(Uuid::nil());
        let join: Value =
            serde_json::from_str(&ServerEreignis::Join { user_id: uid }.als_text().unwrap()).unwrap();
        assert_eq!(join["type"], "join");
        assert_eq!(join["payload"]["userId"], uid.inner().to_string());

        let denied = ServerEreignis::Denied {
            room_id: RoomId(Uuid::nil()),
            grund: GRUND_RAUM_GESCHLOSSEN.into(),
        };
        let wert: Value = serde_json::from_str(&denied.als_text().unwrap()).unwrap();
        assert_eq!(wert["type"], "denied");
        assert_eq!(wert["payload"]["reason"], "raum-geschlossen");

        let update = ServerEreignis::ParticipantUpdate {
            admitted: vec![uid],
            waiting: vec![],
        };
        let wert: Value = serde_json::from_str(&update.als_text().unwrap()).unwrap();
        assert_eq!(wert["type"], "participant-update");
        assert_eq!(wert["payload"]["admitted"][0], uid.inner().to_string());
    }
}
