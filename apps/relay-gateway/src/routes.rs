// INICIO DEL ARCHIVO [apps/relay-gateway/src/routes.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY ROUTING MATRIX (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TOPOLOGÍA HTTP DE INGESTA, DIAGNÓSTICO Y STREAMING
 *
 * VISION HIPER-HOLÍSTICA:
 * La topología es deliberadamente plana: cada ruta mapea uno a uno con
 * una fila de la tabla de interfaces externas — ninguna anidación
 * agrupa por SDK, porque cada SDK nombra sus propias rutas de forma
 * independiente en la práctica (el cliente servidor nunca comparte
 * prefijo con el cliente móvil o JS).
 * =================================================================
 */

use crate::handlers::{analytics, diagnostic, stream};
use crate::middleware::health_guard;
use crate::state::AppState;
use axum::{
    http::{header, HeaderName, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const LD_EVENT_SCHEMA: HeaderName = HeaderName::from_static("x-launchdarkly-event-schema");
const LD_TAGS: HeaderName = HeaderName::from_static("x-launchdarkly-tags");
const LD_PAYLOAD_ID: HeaderName = HeaderName::from_static("x-launchdarkly-payload-id");
const LD_WRAPPER: HeaderName = HeaderName::from_static("x-launchdarkly-wrapper");

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_credentials(false)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::USER_AGENT,
            LD_EVENT_SCHEMA,
            LD_TAGS,
            LD_PAYLOAD_ID,
            LD_WRAPPER,
        ])
        .expose_headers([header::DATE, header::CACHE_CONTROL, header::CONTENT_TYPE, header::CONTENT_LENGTH, header::ACCEPT_ENCODING])
        .max_age(Duration::from_secs(300))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/bulk", post(analytics::ingest_server))
        .route("/mobile", post(analytics::ingest_mobile))
        .route("/mobile/events/bulk", post(analytics::ingest_mobile))
        .route("/events/bulk/:env_id", post(analytics::ingest_js))
        .route("/diagnostic", post(diagnostic::server))
        .route("/mobile/events/diagnostic", post(diagnostic::mobile))
        .route("/events/diagnostic/:env_id", post(diagnostic::js))
        .route("/all", get(stream::all))
        .route("/flags", get(stream::flags))
        .route("/ping", get(stream::ping))
        .route("/ping/:env_id", get(stream::ping_js))
        .layer(middleware::from_fn_with_state(state.clone(), health_guard))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}
// FIN DEL ARCHIVO [apps/relay-gateway/src/routes.rs]
