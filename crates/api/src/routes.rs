//! Route-Definitionen fuer die REST-API (/api/...)

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::middleware::session_pruefen;
use crate::state::ApiState;

/// Auth-Routen, ohne Session erreichbar
fn auth_router() -> Router<ApiState> {
    Router::new()
        .route("/api/auth/v1/register", post(handlers::auth::registrieren))
        .route("/api/auth/v1/login", post(handlers::auth::anmelden))
        .route("/api/auth/v1/logout", post(handlers::auth::abmelden))
        .route("/api/auth/v1/validate", get(handlers::auth::validieren))
}

/// Raum-Routen, alle hinter der Session-Pruefung
fn raum_router(state: ApiState) -> Router<ApiState> {
    let liste = get(handlers::raeume::raeume_auflisten).post(handlers::raeume::raum_erstellen);

    Router::new()
        .route("/api/room/v1", liste.clone())
        .route("/api/room/v1/", liste)
        .route("/api/room/v1/:room_id/join", post(handlers::raeume::beitreten))
        .route("/api/room/v1/:room_id/ws", get(handlers::ws::ws_handler))
        .route(
            "/api/room/v1/:room_id/participants",
            get(handlers::raeume::teilnehmer),
        )
        .route(
            "/api/room/v1/:room_id/admit/:user_id",
            post(handlers::raeume::zulassen),
        )
        .route(
            "/api/room/v1/:room_id/deny/:user_id",
            post(handlers::raeume::ablehnen),
        )
        .route("/api/room/v1/:room_id/leave", post(handlers::raeume::verlassen))
        .route("/api/room/v1/:room_id/status", get(handlers::raeume::zustand))
        .route_layer(middleware::from_fn_with_state(state, session_pruefen))
}

/// Erstellt den vollstaendigen API-Router
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .merge(auth_router())
        .merge(raum_router(state.clone()))
        .with_state(state)
}
