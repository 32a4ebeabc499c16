// INICIO DEL ARCHIVO [apps/relay-gateway/src/handlers/analytics.rs]
/*!
 * =================================================================
 * APARATO: ANALYTICS INGESTION HANDLERS (V1.0)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L4)
 * RESPONSABILIDAD: TRADUCIR POST /bulk, /mobile, /events/bulk/:env_id
 *                   A `EventDispatcher::dispatch_analytics`
 *
 * VISION HIPER-HOLÍSTICA:
 * Cada handler solo decide DÓNDE vive la credencial (cabecera o ruta) y
 * QUÉ estirpe construir; toda la semántica de aceptación/rechazo vive
 * en el dispatcher, que es neutral a HTTP. Offline nunca tiene
 * dispatcher, así que siempre responde 503 aquí.
 * =================================================================
 */

use crate::middleware::resolve_environment;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use relay_core_models::Credential;
use relay_infra_event_pipeline::{DispatchOutcome, SdkKind};
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Deserialize, Default)]
pub struct FilterQuery {
    #[serde(rename = "filterEnv")]
    pub filter_env: Option<String>,
}

pub(crate) fn parse_schema(headers: &HeaderMap) -> u32 {
    headers
        .get("X-LaunchDarkly-Event-Schema")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(1)
}

pub(crate) fn parse_tags(headers: &HeaderMap) -> Option<String> {
    headers.get("X-LaunchDarkly-Tags").and_then(|value| value.to_str().ok()).map(str::to_string)
}

pub(crate) fn outcome_into_response(outcome: DispatchOutcome) -> Response {
    match outcome {
        DispatchOutcome::Accepted => StatusCode::ACCEPTED.into_response(),
        DispatchOutcome::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
        DispatchOutcome::Proxied { status, body, content_type } => {
            let mut builder = Response::builder().status(status);
            if let Some(content_type) = content_type {
                builder = builder.header(header::CONTENT_TYPE, content_type);
            }
            builder.body(axum::body::Body::from(body)).expect("a valid status/header pair always builds")
        }
    }
}

async fn ingest(state: &AppState, filter_env: Option<String>, credential: Credential, sdk: SdkKind, headers: &HeaderMap, body: Bytes) -> Response {
    let environment = match resolve_environment(state, filter_env, &credential).await {
        Ok(environment) => environment,
        Err(status) => return status.into_response(),
    };
    let Some(dispatcher) = environment.dispatcher() else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    outcome_into_response(dispatcher.dispatch_analytics(sdk, parse_schema(headers), parse_tags(headers), body))
}

/// `POST /bulk` — server-side SDK analytics, authorized via `Authorization: <ServerKey>`.
#[instrument(skip(state, headers, body))]
pub async fn ingest_server(State(state): State<AppState>, Query(filter): Query<FilterQuery>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(raw) = headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok()) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    ingest(&state, filter.filter_env, Credential::ServerKey(raw.to_string()), SdkKind::Server, &headers, body).await
}

/// `POST /mobile` (and its `/mobile/events/bulk` alias) — mobile SDK analytics.
#[instrument(skip(state, headers, body))]
pub async fn ingest_mobile(State(state): State<AppState>, Query(filter): Query<FilterQuery>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(raw) = headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok()) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    ingest(&state, filter.filter_env, Credential::MobileKey(raw.to_string()), SdkKind::Mobile, &headers, body).await
}

/// `POST /events/bulk/:env_id` — JS client SDK analytics, authorized by URL segment.
#[instrument(skip(state, headers, body))]
pub async fn ingest_js(State(state): State<AppState>, Path(env_id): Path<String>, Query(filter): Query<FilterQuery>, headers: HeaderMap, body: Bytes) -> Response {
    ingest(&state, filter.filter_env, Credential::EnvironmentID(env_id), SdkKind::JsClient, &headers, body).await
}
// FIN DEL ARCHIVO [apps/relay-gateway/src/handlers/analytics.rs]
