// INICIO DEL ARCHIVO [apps/relay-gateway/src/handlers/stream.rs]
/*!
 * =================================================================
 * APARATO: SSE STREAM HANDLERS (V1.0)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L4)
 * RESPONSABILIDAD: TRADUCIR UNA SUSCRIPCIÓN `broadcast::Receiver<SseEvent>`
 *                   EN UNA RESPUESTA `text/event-stream`
 *
 * VISION HIPER-HOLÍSTICA:
 * Cada ruta de streaming está atada a exactamente un `ChannelKind`; si la
 * credencial presentada no está autorizada para ESE canal (por ejemplo,
 * una MobileKey golpeando el canal `all`), la estirpe pedida nunca
 * coincide con `channel_for_credential`, y el resultado es 404 — un SDK
 * equivocado de endpoint nunca debe enterarse de que la credencial era
 * válida para otro canal.
 * =================================================================
 */

use crate::middleware::resolve_environment;
use crate::state::AppState;
use async_stream::stream;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
};
use futures_util::stream::Stream;
use relay_core_models::Credential;
use relay_infra_data_store::ChannelKind;
use serde::Deserialize;
use std::convert::Infallible;
use tracing::instrument;

#[derive(Debug, Deserialize, Default)]
pub struct FilterQuery {
    #[serde(rename = "filterEnv")]
    pub filter_env: Option<String>,
}

fn render(event: relay_infra_data_store::SseEvent) -> Event {
    let (name, body) = event.render();
    match name {
        Some(name) => Event::default().event(name).data(body),
        None => Event::default().comment(""),
    }
}

async fn subscribe(state: &AppState, filter_env: Option<String>, credential: Credential, wanted: ChannelKind) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let environment = resolve_environment(state, filter_env, &credential).await?;

    if environment.channel_for_credential(&credential) != Some(wanted) {
        return Err(StatusCode::NOT_FOUND);
    }

    let store = environment.store().clone();
    let mut receiver = environment.streams().subscribe(wanted);

    let body = stream! {
        if let Some(initial) = store.replay(wanted).await {
            yield Ok(render(initial));
        }
        loop {
            match receiver.recv().await {
                Ok(event) => yield Ok(render(event)),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "SSE subscriber lagged behind broadcast channel");
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(body).keep_alive(KeepAlive::default()))
}

fn authorization_credential(headers: &HeaderMap, build: impl FnOnce(String) -> Credential) -> Result<Credential, StatusCode> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|raw| build(raw.to_string()))
        .ok_or(StatusCode::UNAUTHORIZED)
}

/// `GET /all` — full data-store replica stream, ServerKey SDKs only.
#[instrument(skip(state, headers))]
pub async fn all(State(state): State<AppState>, Query(filter): Query<FilterQuery>, headers: HeaderMap) -> Response {
    let credential = match authorization_credential(&headers, Credential::ServerKey) {
        Ok(credential) => credential,
        Err(status) => return status.into_response(),
    };
    match subscribe(&state, filter.filter_env, credential, ChannelKind::All).await {
        Ok(sse) => sse.into_response(),
        Err(status) => status.into_response(),
    }
}

/// `GET /flags` — flags-only stream, MobileKey SDKs only.
#[instrument(skip(state, headers))]
pub async fn flags(State(state): State<AppState>, Query(filter): Query<FilterQuery>, headers: HeaderMap) -> Response {
    let credential = match authorization_credential(&headers, Credential::MobileKey) {
        Ok(credential) => credential,
        Err(status) => return status.into_response(),
    };
    match subscribe(&state, filter.filter_env, credential, ChannelKind::Flags).await {
        Ok(sse) => sse.into_response(),
        Err(status) => status.into_response(),
    }
}

/// `GET /ping` — change-notification stream, EnvironmentID (browser) SDKs via `Authorization`.
#[instrument(skip(state, headers))]
pub async fn ping(State(state): State<AppState>, Query(filter): Query<FilterQuery>, headers: HeaderMap) -> Response {
    let credential = match authorization_credential(&headers, Credential::EnvironmentID) {
        Ok(credential) => credential,
        Err(status) => return status.into_response(),
    };
    match subscribe(&state, filter.filter_env, credential, ChannelKind::Ping).await {
        Ok(sse) => sse.into_response(),
        Err(status) => status.into_response(),
    }
}

/// `GET /ping/:env_id` — JS client ping stream, EnvironmentID supplied via URL (no `Authorization` available to browser script tags).
#[instrument(skip(state))]
pub async fn ping_js(State(state): State<AppState>, Path(env_id): Path<String>, Query(filter): Query<FilterQuery>) -> Response {
    match subscribe(&state, filter.filter_env, Credential::EnvironmentID(env_id), ChannelKind::Ping).await {
        Ok(sse) => sse.into_response(),
        Err(status) => status.into_response(),
    }
}
// FIN DEL ARCHIVO [apps/relay-gateway/src/handlers/stream.rs]
