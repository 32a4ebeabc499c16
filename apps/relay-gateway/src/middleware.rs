// [apps/relay-gateway/src/middleware.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY SECURITY GUARDS (V1.0)
 * CLASIFICACIÓN: SECURITY GUARD (ESTRATO L4)
 * RESPONSABILIDAD: RESOLUCIÓN credential -> entorno Y CÓDIGOS DE ESTADO
 *
 * VISION HIPER-HOLÍSTICA:
 * A diferencia del portero único del orquestador original, este relay
 * admite tres estirpes de credencial, cada una extraída de un lugar
 * distinto (cabecera `Authorization` o segmento de ruta `:env_id`).
 * `resolve_environment` es el único punto de traducción entre "no
 * encontrado en la tabla de ruteo" (401), "encontrado pero el entorno
 * aún no tiene snapshot" (503) y "resuelto" — cada handler la invoca
 * directamente en vez de depender de un middleware global, porque la
 * fuente de la credencial varía por ruta.
 * =================================================================
 */

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use relay_core_environment::EnvironmentContext;
use relay_core_models::{Credential, ScopedCredential};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Blocks every request while the gateway is in a maintenance window.
pub async fn health_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(reason) = state.is_operational() {
        warn!(reason = %reason, "⛔ [ACCESS_DENIED]: gateway under maintenance");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "MAINTENANCE_ACTIVE", "reason": reason }))).into_response();
    }
    next.run(req).await
}

/// Resolves an inbound credential to its owning environment. Unknown
/// credentials are unauthorized; known credentials whose environment has
/// not yet taken its first control-plane snapshot are service-unavailable.
pub async fn resolve_environment(state: &AppState, filter_key: Option<String>, credential: &Credential) -> Result<Arc<EnvironmentContext>, StatusCode> {
    let scoped = ScopedCredential::new(filter_key, credential.clone());
    let environment = state.registry.lookup(&scoped).ok_or_else(|| {
        warn!(credential = %credential, "unknown or malformed credential");
        StatusCode::UNAUTHORIZED
    })?;

    match environment.store().is_initialized().await {
        Ok(true) => Ok(environment),
        Ok(false) => Err(StatusCode::SERVICE_UNAVAILABLE),
        Err(fault) => {
            warn!(error = %fault, "data store health check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

// FIN DEL ARCHIVO [apps/relay-gateway/src/middleware.rs]
