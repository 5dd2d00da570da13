//! REST-Handler fuer Raum-Endpunkte
//!
//! Alle Handler laufen hinter `session_pruefen` und erhalten den Aufrufer
//! als `Identitaet`.

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use chimecast_core::{RoomId, UserId};
use chimecast_db::RaumRecord;
use chimecast_signaling::{RaumZustand, TeilnehmerListe};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{ApiFehler, ApiResult};
use crate::extract::JsonBody;
use crate::middleware::Identitaet;
use crate::state::ApiState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RaumErstellenBody {
    pub name: String,
}

fn uuid_parsen(wert: &str, feld: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(wert).map_err(|_| ApiFehler::validierung(format!("Ungueltige {feld}: {wert}")))
}

pub(crate) fn raum_id_parsen(wert: &str) -> ApiResult<RoomId> {
    uuid_parsen(wert, "roomID").map(RoomId)
}

fn user_id_parsen(wert: &str) -> ApiResult<UserId> {
    uuid_parsen(wert, "userID").map(UserId)
}

/// GET /api/room/v1/
pub async fn raeume_auflisten(State(state): State<ApiState>) -> ApiResult<Json<Vec<RaumRecord>>> {
    Ok(Json(state.raeume.raeume_auflisten().await?))
}

/// POST /api/room/v1/
pub async fn raum_erstellen(
    State(state): State<ApiState>,
    Extension(identitaet): Extension<Identitaet>,
    JsonBody(body): JsonBody<RaumErstellenBody>,
) -> ApiResult<Json<Value>> {
    let raum = state
        .raeume
        .raum_erstellen(&body.name, identitaet.user_id)
        .await?;

    Ok(Json(json!({
        "roomID": raum.id,
        "message": "Raum erstellt",
        "role": "host",
    })))
}

/// POST /api/room/v1/:room_id/join
pub async fn beitreten(
    State(state): State<ApiState>,
    Extension(identitaet): Extension<Identitaet>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let raum_id = raum_id_parsen(&room_id)?;
    let status = state.raeume.beitreten(raum_id, identitaet.user_id).await?;

    Ok(Json(json!({
        "roomID": raum_id,
        "status": status.to_string(),
        "message": "Raum beigetreten",
    })))
}

/// GET /api/room/v1/:room_id/participants
pub async fn teilnehmer(
    State(state): State<ApiState>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<TeilnehmerListe>> {
    let raum_id = raum_id_parsen(&room_id)?;
    Ok(Json(state.raeume.teilnehmer(raum_id).await?))
}

/// POST /api/room/v1/:room_id/admit/:user_id
pub async fn zulassen(
    State(state): State<ApiState>,
    Extension(identitaet): Extension<Identitaet>,
    Path((room_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let raum_id = raum_id_parsen(&room_id)?;
    let teilnehmer = user_id_parsen(&user_id)?;
    state
        .raeume
        .zulassen(raum_id, teilnehmer, identitaet.user_id)
        .await?;

    Ok(Json(json!({ "message": "Teilnehmer zugelassen" })))
}

/// POST /api/room/v1/:room_id/deny/:user_id
pub async fn ablehnen(
    State(state): State<ApiState>,
    Extension(identitaet): Extension<Identitaet>,
    Path((room_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let raum_id = raum_id_parsen(&room_id)?;
    let teilnehmer = user_id_parsen(&user_id)?;
    state
        .raeume
        .ablehnen(raum_id, teilnehmer, identitaet.user_id)
        .await?;

    Ok(Json(json!({ "message": "Teilnehmer abgelehnt" })))
}

/// POST /api/room/v1/:room_id/leave
pub async fn verlassen(
    State(state): State<ApiState>,
    Extension(identitaet): Extension<Identitaet>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let raum_id = raum_id_parsen(&room_id)?;
    state.raeume.verlassen(raum_id, identitaet.user_id).await?;

    Ok(Json(json!({ "message": "Raum verlassen" })))
}

/// GET /api/room/v1/:room_id/status
pub async fn zustand(
    State(state): State<ApiState>,
    Extension(identitaet): Extension<Identitaet>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<RaumZustand>> {
    let raum_id = raum_id_parsen(&room_id)?;
    Ok(Json(state.raeume.zustand(raum_id, identitaet.user_id).await?))
}
