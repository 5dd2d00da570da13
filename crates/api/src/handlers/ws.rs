//! WebSocket-Upgrade fuer das Raum-Signaling
//!
//! Raum und Zulassung werden vor dem Upgrade geprueft, damit ein
//! unbekannter Raum als normale 404-Antwort ankommt. Danach uebernimmt
//! `ClientVerbindung::verarbeiten` den Socket.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    Extension,
};
use chimecast_signaling::{ClientVerbindung, Rahmen};
use futures_util::{future, SinkExt, StreamExt};

use crate::error::ApiResult;
use crate::handlers::raeume::raum_id_parsen;
use crate::middleware::Identitaet;
use crate::state::ApiState;

/// GET /api/room/v1/:room_id/ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
    Extension(identitaet): Extension<Identitaet>,
    Path(room_id): Path<String>,
) -> ApiResult<Response> {
    let raum_id = raum_id_parsen(&room_id)?;
    let verbindung = state
        .raeume
        .verbindung_vorbereiten(raum_id, identitaet.user_id)
        .await?;

    Ok(ws.on_upgrade(move |socket| socket_verarbeiten(socket, verbindung)))
}

/// Uebersetzt axum-Nachrichten in `Rahmen` und startet die Schleife
async fn socket_verarbeiten(socket: WebSocket, verbindung: ClientVerbindung) {
    let (sink, stream) = socket.split();

    // Binary/Ping/Pong tragen kein Signaling, Pong beantwortet axum selbst
    let eingang = stream.filter_map(|nachricht| {
        future::ready(match nachricht {
            Ok(Message::Text(text)) => Some(Ok(Rahmen::Text(text))),
            Ok(Message::Close(_)) => Some(Ok(Rahmen::Schliessen)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
    });

    let ausgang = sink.with(|rahmen: Rahmen| {
        future::ready(Ok::<_, axum::Error>(match rahmen {
            Rahmen::Text(text) => Message::Text(text),
            Rahmen::Schliessen => Message::Close(None),
        }))
    });

    verbindung.verarbeiten(eingang, ausgang).await;
}
