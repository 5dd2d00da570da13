//! REST-Handler fuer Registrierung, Login, Logout und Session-Pruefung

use axum::{extract::State, response::Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chimecast_auth::{Registrierung, Session};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiFehler, ApiResult};
use crate::extract::JsonBody;
use crate::middleware::session_token;
use crate::state::{ApiState, CookieKonfig};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrierenBody {
    pub name: String,
    /// Login-Name
    pub user_id: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnmeldenBody {
    pub user_id: String,
    pub password: String,
}

fn session_cookie(konfig: &CookieKonfig, session: &Session) -> Cookie<'static> {
    Cookie::build((konfig.name.clone(), session.token.clone()))
        .http_only(true)
        .path("/")
        .secure(konfig.secure)
        .same_site(SameSite::Lax)
        .build()
}

/// POST /api/auth/v1/register
pub async fn registrieren(
    State(state): State<ApiState>,
    jar: CookieJar,
    JsonBody(body): JsonBody<RegistrierenBody>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let (benutzer, session) = state
        .auth
        .registrieren(Registrierung {
            name: &body.name,
            username: &body.user_id,
            email: &body.email,
            passwort: &body.password,
        })
        .await?;

    let jar = jar.add(session_cookie(&state.cookie, &session));
    Ok((
        jar,
        Json(json!({
            "message": "Benutzer registriert",
            "userId": benutzer.id,
            "userName": benutzer.username,
        })),
    ))
}

/// POST /api/auth/v1/login
pub async fn anmelden(
    State(state): State<ApiState>,
    jar: CookieJar,
    JsonBody(body): JsonBody<AnmeldenBody>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let (benutzer, session) = state.auth.anmelden(&body.user_id, &body.password).await?;

    let jar = jar.add(session_cookie(&state.cookie, &session));
    Ok((
        jar,
        Json(json!({
            "message": "Login erfolgreich",
            "userId": benutzer.id,
            "userName": benutzer.username,
        })),
    ))
}

/// POST /api/auth/v1/logout
pub async fn abmelden(
    State(state): State<ApiState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let token = session_token(&jar, &state.cookie.name)
        .ok_or_else(|| ApiFehler::validierung("Keine Session vorhanden"))?;

    state.auth.abmelden(&token).await;

    let jar = jar.remove(Cookie::build((state.cookie.name.clone(), "")).path("/"));
    Ok((jar, Json(json!({ "message": "Logout erfolgreich" }))))
}

/// GET /api/auth/v1/validate
pub async fn validieren(State(state): State<ApiState>, jar: CookieJar) -> ApiResult<Json<Value>> {
    let token = session_token(&jar, &state.cookie.name).ok_or(ApiFehler::NichtAngemeldet)?;
    let session = state.auth.validieren(&token).await?;

    Ok(Json(json!({
        "userId": session.subject_id,
        "userName": session.subject_name,
    })))
}
