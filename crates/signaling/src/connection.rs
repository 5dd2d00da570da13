//! Client-Verbindung – Empfangsschleife eines WebSocket-Clients
//!
//! Jede Verbindung laeuft in einem eigenen tokio-Task. Die Schleife wartet
//! nur an zwei Stellen: auf den naechsten eingehenden Frame und auf die
//! eigene Send-Queue. Der Transport ist abstrahiert (`Stream` + `Sink` von
//! `Rahmen`), damit die Schleife ohne echten Socket testbar ist.
//!
//! ## Ablauf
//! ```text
//! registrieren -> loop { Frame lesen | Queue senden } -> beenden (genau einmal)
//! ```
//!
//! Die Schleife endet bei Lesefehler, Close-Frame, Stream-Ende, `leave`
//! oder wenn die Registry die Verbindung fallen laesst (Queue zu).

use std::fmt::Display;
use std::sync::Arc;

use chimecast_core::{RoomId, UserId};
use futures_util::{Sink, SinkExt, Stream, StreamExt};

use crate::nachricht::{signal_text, EingehendeNachricht};
use crate::registry::VerbindungsRegistry;
use crate::verbindung::{TeilnehmerStatus, Verbindung, VerbindungsId};

/// Transportneutraler WebSocket-Frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rahmen {
    Text(String),
    Schliessen,
}

/// Ergebnis der Verarbeitung eines Frames
enum Weiter {
    Ja,
    Beenden,
}

/// Eine an (Raum, Benutzer) gebundene Verbindung, bereit zum Start
pub struct ClientVerbindung {
    registry: Arc<VerbindungsRegistry>,
    raum_id: RoomId,
    user_id: UserId,
    status: TeilnehmerStatus,
    queue_groesse: usize,
}

impl ClientVerbindung {
    pub fn neu(
        registry: Arc<VerbindungsRegistry>,
        raum_id: RoomId,
        user_id: UserId,
        status: TeilnehmerStatus,
        queue_groesse: usize,
    ) -> Self {
        Self {
            registry,
            raum_id,
            user_id,
            status,
            queue_groesse,
        }
    }

    /// Registriert die Verbindung und verarbeitet sie bis zum Ende
    pub async fn verarbeiten<S, K, E>(self, mut eingang: S, mut ausgang: K)
    where
        S: Stream<Item = Result<Rahmen, E>> + Unpin,
        K: Sink<Rahmen> + Unpin,
        E: Display,
    {
        let raum_id = self.raum_id;
        let user_id = self.user_id;

        let (verbindung, mut sende_rx) = Verbindung::neu(user_id, self.status, self.queue_groesse);
        let verbindungs_id = verbindung.id;
        self.registry.registrieren(raum_id, verbindung);

        tracing::info!(
            raum_id = %raum_id,
            user_id = %user_id,
            verbindung = %verbindungs_id,
            "WebSocket-Verbindung gestartet"
        );

        loop {
            tokio::select! {
                // Eingehende Nachricht vom Client
                rahmen = eingang.next() => {
                    match rahmen {
                        Some(Ok(Rahmen::Text(text))) => {
                            if let Weiter::Beenden = self.nachricht_verarbeiten(&text, verbindungs_id) {
                                break;
                            }
                        }
                        Some(Ok(Rahmen::Schliessen)) | None => {
                            tracing::info!(raum_id = %raum_id, user_id = %user_id, "Verbindung vom Client getrennt");
                            break;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                raum_id = %raum_id,
                                user_id = %user_id,
                                fehler = %e,
                                "Lesefehler"
                            );
                            break;
                        }
                    }
                }

                // Ausgehende Nachricht aus der Registry
                ausgehend = sende_rx.recv() => {
                    match ausgehend {
                        Some(text) => {
                            if ausgang.send(Rahmen::Text(text.to_string())).await.is_err() {
                                tracing::warn!(raum_id = %raum_id, user_id = %user_id, "Senden fehlgeschlagen");
                                break;
                            }
                        }
                        None => {
                            // Registry hat die Verbindung fallen lassen
                            tracing::debug!(raum_id = %raum_id, user_id = %user_id, "Send-Queue geschlossen");
                            let _ = ausgang.send(Rahmen::Schliessen).await;
                            break;
                        }
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende
        drop(sende_rx);
        let entfernt = self.registry.beenden(raum_id, user_id, verbindungs_id);
        let _ = ausgang.close().await;

        tracing::info!(
            raum_id = %raum_id,
            user_id = %user_id,
            verbindung = %verbindungs_id,
            entfernt = ?entfernt,
            "WebSocket-Verbindung beendet"
        );
    }

    fn nachricht_verarbeiten(&self, text: &str, verbindungs_id: VerbindungsId) -> Weiter {
        let raum_id = self.raum_id;
        let user_id = self.user_id;

        let nachricht = match EingehendeNachricht::parsen(text) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(raum_id = %raum_id, user_id = %user_id, fehler = %e, "Ungueltige Nachricht ignoriert");
                return Weiter::Ja;
            }
        };

        if let EingehendeNachricht::Leave = nachricht {
            tracing::debug!(raum_id = %raum_id, user_id = %user_id, "leave empfangen");
            return Weiter::Beenden;
        }

        // Status live abfragen: Zulassen passiert ausserhalb dieser Schleife
        match self.registry.status_fuer(raum_id, user_id, Some(verbindungs_id)) {
            Some(TeilnehmerStatus::Zugelassen) => {}
            Some(TeilnehmerStatus::Wartend) => {
                tracing::debug!(raum_id = %raum_id, user_id = %user_id, "Nachricht im Warteraum verworfen");
                return Weiter::Ja;
            }
            None => return Weiter::Beenden,
        }

        match nachricht {
            EingehendeNachricht::Signal { art, payload } => {
                match signal_text(art, payload.as_deref(), user_id) {
                    Ok(text) => {
                        let zugestellt = self.registry.an_raum_senden(raum_id, text, Some(user_id));
                        self.registry
                            .metriken()
                            .signale_weitergeleitet
                            .inc_by(zugestellt as u64);
                        tracing::trace!(raum_id = %raum_id, user_id = %user_id, art = ?art, zugestellt, "Signal weitergeleitet");
                    }
                    Err(e) => {
                        tracing::warn!(raum_id = %raum_id, user_id = %user_id, fehler = %e, "Signal verworfen");
                    }
                }
            }
            EingehendeNachricht::Join => {
                tracing::debug!(raum_id = %raum_id, user_id = %user_id, "join von bereits Zugelassenem ignoriert");
            }
            EingehendeNachricht::Unbekannt(typ) => {
                tracing::warn!(raum_id = %raum_id, user_id = %user_id, typ = %typ, "Unbekannter Nachrichtentyp");
            }
            EingehendeNachricht::Leave => return Weiter::Beenden,
        }
        Weiter::Ja
    }
}
