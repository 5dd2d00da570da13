//! Verbindungs-Registry – wer ist in welchem Raum zugelassen oder wartend
//!
//! Pro Raum ein `RaumEintrag` mit zwei disjunkten Maps. Die `DashMap`
//! sperrt pro Raum: Mutationen laufen vollstaendig unter dem exklusiven
//! Eintrag-Lock, Broadcasts unter dem geteilten. Innerhalb eines Locks wird
//! nur nicht-blockierend gesendet (`try_send`), nie awaited.
//!
//! ## Zustandsautomat pro (Raum, Benutzer)
//! ```text
//! Unregistriert -> Wartend -> Zugelassen -> Entfernt
//! Unregistriert ----------> Zugelassen -> Entfernt   (Host)
//!                  Wartend ------------> Entfernt   (abgelehnt / verlassen)
//! ```
//!
//! Leert sich die Menge der Zugelassenen, werden beide Maps des Raums
//! verworfen; Wartende erhalten vorher `denied`.

use std::collections::HashMap;
use std::sync::Arc;

use chimecast_core::{RoomId, UserId};
use chimecast_observability::ChimecastMetrics;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::Serialize;

use crate::broadcast::an_zugelassene;
use crate::error::{SignalingError, SignalingResult};
use crate::nachricht::{ServerEreignis, GRUND_RAUM_GESCHLOSSEN};
use crate::verbindung::{TeilnehmerStatus, Verbindung, VerbindungsId};

/// Belegung eines Raums
#[derive(Debug, Default)]
pub struct RaumEintrag {
    pub(crate) zugelassen: HashMap<UserId, Verbindung>,
    pub(crate) wartend: HashMap<UserId, Verbindung>,
}

impl RaumEintrag {
    fn ist_leer(&self) -> bool {
        self.zugelassen.is_empty() && self.wartend.is_empty()
    }

    /// Entfernt den Benutzer aus beiden Maps
    fn herausnehmen(&mut self, user_id: &UserId) -> Option<Verbindung> {
        self.zugelassen
            .remove(user_id)
            .or_else(|| self.wartend.remove(user_id))
    }

    fn teilnehmer_update(&self) -> ServerEreignis {
        ServerEreignis::ParticipantUpdate {
            admitted: sortierte_ids(&self.zugelassen),
            waiting: sortierte_ids(&self.wartend),
        }
    }
}

fn sortierte_ids(map: &HashMap<UserId, Verbindung>) -> Vec<UserId> {
    let mut verbindungen: Vec<&Verbindung> = map.values().collect();
    verbindungen.sort_by_key(|v| (v.beigetreten_am, v.user_id));
    verbindungen.into_iter().map(|v| v.user_id).collect()
}

fn passt(verbindung: &Verbindung, nur: Option<VerbindungsId>) -> bool {
    nur.map_or(true, |id| verbindung.id == id)
}

/// Oeffentliche Sicht auf einen Teilnehmer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeilnehmerInfo {
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

/// Teilnehmerliste eines Raums, jeweils nach Beitrittszeit sortiert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeilnehmerListe {
    #[serde(rename = "admitted")]
    pub zugelassen: Vec<TeilnehmerInfo>,
    #[serde(rename = "waiting")]
    pub wartend: Vec<TeilnehmerInfo>,
}

fn infos(map: &HashMap<UserId, Verbindung>) -> Vec<TeilnehmerInfo> {
    let mut liste: Vec<TeilnehmerInfo> = map
        .values()
        .map(|v| TeilnehmerInfo {
            user_id: v.user_id,
            joined_at: v.beigetreten_am,
        })
        .collect();
    liste.sort_by_key(|t| (t.joined_at, t.user_id));
    liste
}

/// Serialisiert ein Ereignis fuer Pfade ohne Fehlerrueckgabe
fn text_oder_log(ereignis: &ServerEreignis) -> Option<Arc<str>> {
    match ereignis.als_text() {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(fehler = %e, "Ereignis verworfen");
            None
        }
    }
}

/// Prozessweite Registry aller Raum-Verbindungen
pub struct VerbindungsRegistry {
    pub(crate) raeume: DashMap<RoomId, RaumEintrag>,
    pub(crate) metriken: ChimecastMetrics,
}

impl VerbindungsRegistry {
    pub fn neu(metriken: ChimecastMetrics) -> Self {
        Self {
            raeume: DashMap::new(),
            metriken,
        }
    }

    pub fn metriken(&self) -> &ChimecastMetrics {
        &self.metriken
    }

    /// Traegt eine Verbindung in die zu ihrem Status passende Menge ein
    ///
    /// Eine vorhandene Verbindung desselben Benutzers wird ersetzt und damit
    /// geschlossen. Zugelassene loesen `join` bei den uebrigen Zugelassenen
    /// aus, Wartende ein `participant-update`. Wird dabei ein Zugelassener
    /// zum Wartenden, gilt das wie `verlassen`.
    pub fn registrieren(&self, raum_id: RoomId, verbindung: Verbindung) {
        let user_id = verbindung.user_id;
        let status = verbindung.status;

        let mut eintrag = match self.raeume.entry(raum_id) {
            Entry::Occupied(belegt) => belegt.into_ref(),
            Entry::Vacant(frei) => {
                self.metriken.aktive_raeume.inc();
                frei.insert(RaumEintrag::default())
            }
        };

        let mut herabgestuft = false;
        if let Some(alt) = eintrag.herausnehmen(&user_id) {
            tracing::info!(
                raum_id = %raum_id,
                user_id = %user_id,
                alte_verbindung = %alt.id,
                "Vorherige Verbindung ersetzt"
            );
            herabgestuft = alt.status == TeilnehmerStatus::Zugelassen
                && status == TeilnehmerStatus::Wartend;
            self.verbindung_abmelden(&alt);
        }

        // Ein Zugelassener, der als Wartender zurueckkommt, hat den Raum
        // verlassen: entweder `leave` an die Uebrigen oder der Raum schliesst
        if herabgestuft {
            if eintrag.zugelassen.is_empty() {
                self.metriken.verbindungen.inc();
                self.metriken.wartende_teilnehmer.inc();
                eintrag.wartend.insert(user_id, verbindung);
                let wartende = self.warteraum_schliessen(raum_id, &mut eintrag);
                drop(eintrag);
                if self.raeume.remove_if(&raum_id, |_, e| e.ist_leer()).is_some() {
                    self.metriken.aktive_raeume.dec();
                }
                tracing::info!(
                    raum_id = %raum_id,
                    user_id = %user_id,
                    wartende_entfernt = wartende,
                    "Letzter Zugelassener als Wartender zurueck – Raum aus dem Speicher entfernt"
                );
                return;
            }
            if let Some(text) = text_oder_log(&ServerEreignis::Leave { user_id }) {
                an_zugelassene(&eintrag, &text, None, &self.metriken);
            }
        }

        match status {
            TeilnehmerStatus::Zugelassen => {
                if let Some(text) = text_oder_log(&ServerEreignis::Join { user_id }) {
                    an_zugelassene(&eintrag, &text, None, &self.metriken);
                }
                eintrag.zugelassen.insert(user_id, verbindung);
            }
            TeilnehmerStatus::Wartend => {
                eintrag.wartend.insert(user_id, verbindung);
                self.metriken.wartende_teilnehmer.inc();
                if let Some(text) = text_oder_log(&eintrag.teilnehmer_update()) {
                    an_zugelassene(&eintrag, &text, None, &self.metriken);
                }
            }
        }
        self.metriken.verbindungen.inc();

        tracing::info!(raum_id = %raum_id, user_id = %user_id, status = %status, "Verbindung registriert");
    }

    /// Verschiebt einen wartenden Teilnehmer zu den Zugelassenen
    ///
    /// Der Teilnehmer erhaelt `admitted`, die bisherigen Zugelassenen `join`.
    /// Ist der Benutzer nicht wartend, bleibt alles unveraendert.
    pub fn wartend_zulassen(&self, raum_id: RoomId, user_id: UserId) -> SignalingResult<()> {
        let admitted = ServerEreignis::Admitted { room_id: raum_id }.als_text()?;
        let join = ServerEreignis::Join { user_id }.als_text()?;

        let mut eintrag = self
            .raeume
            .get_mut(&raum_id)
            .ok_or_else(|| nicht_wartend(raum_id, user_id))?;
        let mut verbindung = eintrag
            .wartend
            .remove(&user_id)
            .ok_or_else(|| nicht_wartend(raum_id, user_id))?;

        verbindung.status = TeilnehmerStatus::Zugelassen;
        self.metriken.wartende_teilnehmer.dec();

        an_zugelassene(&eintrag, &join, None, &self.metriken);
        if !verbindung.senden(admitted) {
            self.metriken.zustellfehler.inc();
        }
        eintrag.zugelassen.insert(user_id, verbindung);

        tracing::info!(raum_id = %raum_id, user_id = %user_id, "Teilnehmer zugelassen");
        Ok(())
    }

    /// Entfernt einen wartenden Teilnehmer, sendet `denied` und schliesst
    /// seine Verbindung
    pub fn wartend_ablehnen(
        &self,
        raum_id: RoomId,
        user_id: UserId,
        grund: &str,
    ) -> SignalingResult<()> {
        let denied = ServerEreignis::Denied {
            room_id: raum_id,
            grund: grund.to_string(),
        }
        .als_text()?;

        let Entry::Occupied(mut belegt) = self.raeume.entry(raum_id) else {
            return Err(nicht_wartend(raum_id, user_id));
        };
        let verbindung = belegt
            .get_mut()
            .wartend
            .remove(&user_id)
            .ok_or_else(|| nicht_wartend(raum_id, user_id))?;

        verbindung.senden(denied);
        self.verbindung_abmelden(&verbindung);
        drop(verbindung);

        if belegt.get().ist_leer() {
            belegt.remove();
            self.metriken.aktive_raeume.dec();
        }

        tracing::info!(raum_id = %raum_id, user_id = %user_id, grund = %grund, "Teilnehmer abgelehnt");
        Ok(())
    }

    /// Cleanup einer Verbindungsschleife
    ///
    /// Entfernt nur, wenn die gespeicherte Verbindung noch dieselbe ist; eine
    /// inzwischen ersetzte Verbindung bleibt unberuehrt.
    pub fn beenden(
        &self,
        raum_id: RoomId,
        user_id: UserId,
        verbindungs_id: VerbindungsId,
    ) -> Option<TeilnehmerStatus> {
        self.entfernen(raum_id, user_id, Some(verbindungs_id))
    }

    /// Benutzer verlaesst den Raum, unabhaengig von seiner Verbindung
    pub fn verlassen(&self, raum_id: RoomId, user_id: UserId) -> Option<TeilnehmerStatus> {
        self.entfernen(raum_id, user_id, None)
    }

    fn entfernen(
        &self,
        raum_id: RoomId,
        user_id: UserId,
        nur: Option<VerbindungsId>,
    ) -> Option<TeilnehmerStatus> {
        let Entry::Occupied(mut belegt) = self.raeume.entry(raum_id) else {
            return None;
        };
        let eintrag = belegt.get_mut();

        if eintrag.zugelassen.get(&user_id).is_some_and(|v| passt(v, nur)) {
            if let Some(verbindung) = eintrag.zugelassen.remove(&user_id) {
                self.verbindung_abmelden(&verbindung);
            }

            if eintrag.zugelassen.is_empty() {
                let wartende = self.warteraum_schliessen(raum_id, eintrag);
                belegt.remove();
                self.metriken.aktive_raeume.dec();
                tracing::info!(
                    raum_id = %raum_id,
                    wartende_entfernt = wartende,
                    "Letzter Teilnehmer gegangen – Raum aus dem Speicher entfernt"
                );
            } else if let Some(text) = text_oder_log(&ServerEreignis::Leave { user_id }) {
                an_zugelassene(eintrag, &text, None, &self.metriken);
            }

            tracing::info!(raum_id = %raum_id, user_id = %user_id, "Zugelassener Teilnehmer entfernt");
            return Some(TeilnehmerStatus::Zugelassen);
        }

        if eintrag.wartend.get(&user_id).is_some_and(|v| passt(v, nur)) {
            if let Some(verbindung) = eintrag.wartend.remove(&user_id) {
                self.verbindung_abmelden(&verbindung);
            }
            if eintrag.ist_leer() {
                belegt.remove();
                self.metriken.aktive_raeume.dec();
            }
            tracing::info!(raum_id = %raum_id, user_id = %user_id, "Wartender Teilnehmer entfernt");
            return Some(TeilnehmerStatus::Wartend);
        }

        None
    }

    /// Sendet allen Wartenden `denied` und schliesst ihre Verbindungen
    ///
    /// Aufruf nur mit leerer Menge der Zugelassenen; danach ist der Eintrag
    /// leer und muss vom Aufrufer verworfen werden.
    fn warteraum_schliessen(&self, raum_id: RoomId, eintrag: &mut RaumEintrag) -> usize {
        let geschlossen = text_oder_log(&ServerEreignis::Denied {
            room_id: raum_id,
            grund: GRUND_RAUM_GESCHLOSSEN.to_string(),
        });
        let wartende = eintrag.wartend.len();
        for (_, wartend) in eintrag.wartend.drain() {
            if let Some(text) = &geschlossen {
                wartend.senden(Arc::clone(text));
            }
            self.verbindung_abmelden(&wartend);
        }
        wartende
    }

    /// Zaehler fuer eine Verbindung zuruecksetzen, die die Registry verlaesst
    fn verbindung_abmelden(&self, verbindung: &Verbindung) {
        self.metriken.verbindungen.dec();
        if verbindung.status == TeilnehmerStatus::Wartend {
            self.metriken.wartende_teilnehmer.dec();
        }
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    /// Status eines Benutzers im Raum
    pub fn status(&self, raum_id: RoomId, user_id: UserId) -> Option<TeilnehmerStatus> {
        self.status_fuer(raum_id, user_id, None)
    }

    /// Status einer bestimmten Verbindung; `None` wenn sie ersetzt oder
    /// entfernt wurde
    pub fn status_fuer(
        &self,
        raum_id: RoomId,
        user_id: UserId,
        nur: Option<VerbindungsId>,
    ) -> Option<TeilnehmerStatus> {
        let eintrag = self.raeume.get(&raum_id)?;
        if eintrag.zugelassen.get(&user_id).is_some_and(|v| passt(v, nur)) {
            Some(TeilnehmerStatus::Zugelassen)
        } else if eintrag.wartend.get(&user_id).is_some_and(|v| passt(v, nur)) {
            Some(TeilnehmerStatus::Wartend)
        } else {
            None
        }
    }

    pub fn teilnehmer(&self, raum_id: RoomId) -> TeilnehmerListe {
        match self.raeume.get(&raum_id) {
            Some(eintrag) => TeilnehmerListe {
                zugelassen: infos(&eintrag.zugelassen),
                wartend: infos(&eintrag.wartend),
            },
            None => TeilnehmerListe::default(),
        }
    }

    /// (zugelassen, wartend)
    pub fn anzahl(&self, raum_id: RoomId) -> (usize, usize) {
        self.raeume
            .get(&raum_id)
            .map(|e| (e.zugelassen.len(), e.wartend.len()))
            .unwrap_or((0, 0))
    }

    /// Anzahl Raeume mit Eintrag im Speicher
    pub fn raum_anzahl(&self) -> usize {
        self.raeume.len()
    }

    /// Prueft fuer jeden Raum, dass niemand in beiden Mengen steht
    pub fn mengen_disjunkt(&self) -> bool {
        self.raeume.iter().all(|eintrag| {
            eintrag
                .zugelassen
                .keys()
                .all(|uid| !eintrag.wartend.contains_key(uid))
        })
    }
}

fn nicht_wartend(raum_id: RoomId, user_id: UserId) -> SignalingError {
    SignalingError::nicht_gefunden(format!("{user_id} wartet nicht in {raum_id}"))
}
