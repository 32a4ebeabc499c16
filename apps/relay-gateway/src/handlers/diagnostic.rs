// INICIO DEL ARCHIVO [apps/relay-gateway/src/handlers/diagnostic.rs]
/*!
 * =================================================================
 * APARATO: DIAGNOSTIC PASS-THROUGH HANDLERS (V1.0)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L4)
 * RESPONSABILIDAD: TRADUCIR POST /diagnostic Y SUS VARIANTES A
 *                   `EventDispatcher::dispatch_diagnostic`
 * =================================================================
 */

use crate::handlers::analytics::{outcome_into_response, FilterQuery};
use crate::middleware::resolve_environment;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use relay_core_models::Credential;
use relay_infra_event_pipeline::SdkKind;
use tracing::instrument;

async fn proxy(state: &AppState, filter_env: Option<String>, credential: Credential, sdk: SdkKind, authorization: &str, headers: &HeaderMap, body: Bytes) -> Response {
    let environment = match resolve_environment(state, filter_env, &credential).await {
        Ok(environment) => environment,
        Err(status) => return status.into_response(),
    };
    let Some(dispatcher) = environment.dispatcher() else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    let user_agent = headers.get(header::USER_AGENT).and_then(|value| value.to_str().ok()).unwrap_or("");
    outcome_into_response(dispatcher.dispatch_diagnostic(sdk, authorization, user_agent, body).await)
}

/// `POST /diagnostic` — server SDK diagnostic pass-through.
#[instrument(skip(state, headers, body))]
pub async fn server(State(state): State<AppState>, Query(filter): Query<FilterQuery>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(raw) = headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok()) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    proxy(&state, filter.filter_env, Credential::ServerKey(raw.to_string()), SdkKind::Server, raw, &headers, body).await
}

/// `POST /mobile/events/diagnostic` — mobile SDK diagnostic pass-through.
#[instrument(skip(state, headers, body))]
pub async fn mobile(State(state): State<AppState>, Query(filter): Query<FilterQuery>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(raw) = headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok()) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    proxy(&state, filter.filter_env, Credential::MobileKey(raw.to_string()), SdkKind::Mobile, raw, &headers, body).await
}

/// `POST /events/diagnostic/:env_id` — JS client SDK diagnostic pass-through.
/// Authorized by the URL `envId` segment, same as `analytics::ingest_js` — a
/// browser SDK never sends `Authorization` here, so none is required.
#[instrument(skip(state, headers, body))]
pub async fn js(State(state): State<AppState>, Path(env_id): Path<String>, Query(filter): Query<FilterQuery>, headers: HeaderMap, body: Bytes) -> Response {
    proxy(&state, filter.filter_env, Credential::EnvironmentID(env_id), SdkKind::JsClient, "", &headers, body).await
}
// FIN DEL ARCHIVO [apps/relay-gateway/src/handlers/diagnostic.rs]
