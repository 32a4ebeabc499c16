// [tests/mirror/apps/relay-gateway/handlers/stream_authorization.test.rs]
/**
 * =================================================================
 * APARATO: SSE STREAM AUTHORIZATION CERTIFIER
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-GATEWAY
 * RESPONSABILIDAD: GET /all, /flags, /ping CHANNEL<->CREDENTIAL BINDING
 * =================================================================
 */

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::StreamExt;
use relay_core_environment::{EnvironmentContext, EnvironmentRegistry, EnvironmentRuntimeConfig};
use relay_core_models::{AllData, Credential, EnvironmentIdentifiers, EnvironmentParams};
use relay_gateway::routes::build_router;
use relay_gateway::state::{AppState, GatewayRegistry};
use relay_infra_data_store::InMemoryDataStore;
use relay_infra_event_pipeline::NoFlagLookup;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt as _;

fn identifiers() -> EnvironmentIdentifiers {
    EnvironmentIdentifiers {
        project_key: "proj".into(),
        project_name: "Widgets Inc".into(),
        environment_key: "prod".into(),
        environment_name: "Production".into(),
        filter_key: None,
        configured_name: None,
    }
}

fn runtime() -> EnvironmentRuntimeConfig {
    EnvironmentRuntimeConfig {
        stream_base_url: "http://127.0.0.1:1".into(),
        events_uri: "http://127.0.0.1:1/bulk".into(),
        diagnostic_upstream_url: "http://127.0.0.1:1/diagnostic".into(),
        events_enabled: false,
        publisher_queue_capacity: 10,
        publisher_flush_interval: Duration::from_secs(5),
        summarizer_cleanup_interval: Duration::from_secs(60),
        credential_cleanup_interval: Duration::from_secs(60),
        ignore_connection_errors: true,
    }
}

async fn ready_state() -> AppState {
    let registry = Arc::new(GatewayRegistry::new());
    let context = EnvironmentContext::spawn(
        EnvironmentParams {
            environment_id: "env-live".into(),
            identifiers: identifiers(),
            primary_server_key: Credential::ServerKey("sdk-live".into()),
            mobile_key: Some(Credential::MobileKey("mob-live".into())),
            environment_id_credential: Some(Credential::EnvironmentID("envid-live".into())),
            expiring_server_key: None,
            php_ttl_seconds: 0,
            secure_mode: false,
            filter_key: None,
            offline: false,
        },
        Arc::new(InMemoryDataStore::new()),
        Arc::clone(&registry) as Arc<dyn EnvironmentRegistry>,
        Arc::new(NoFlagLookup),
        runtime(),
        Client::new(),
    )
    .expect("construction must succeed");

    context.ready().await.expect("bootstrap failure swallowed by ignore_connection_errors");
    context.store().init(AllData::default()).await.expect("manual snapshot init for deterministic tests");

    AppState::new(registry)
}

async fn first_chunk(response: axum::response::Response) -> Vec<u8> {
    let mut data_stream = response.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(2), data_stream.next())
        .await
        .expect("first SSE chunk must arrive well within the keep-alive window")
        .expect("stream must yield at least the replayed snapshot")
        .expect("chunk must not be an error");
    chunk.to_vec()
}

#[tokio::test]
async fn certify_scenario_server_key_subscribes_to_the_all_channel_and_receives_a_replay() {
    println!("\n📡 [PROVING_GROUNDS]: Scenario — a ServerKey on GET /all opens a 200 event-stream and immediately replays the current snapshot.");

    let app = build_router(ready_state().await);
    let request = Request::builder().method("GET").uri("/all").header("Authorization", "sdk-live").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/event-stream");

    let body = String::from_utf8(first_chunk(response).await).unwrap();
    assert!(body.contains("event:"), "expected a named SSE event in the replay, got: {body}");
    println!("   ✅ Scenario ServerKey -> all channel replay: OK.");
}

#[tokio::test]
async fn certify_scenario_mobile_key_on_the_all_channel_is_not_found() {
    println!("\n🙅 [PROVING_GROUNDS]: Scenario — a MobileKey hitting GET /all (the ServerKey-only channel) gets 404, not a leak of its validity elsewhere.");

    let app = build_router(ready_state().await);
    let request = Request::builder().method("GET").uri("/all").header("Authorization", "mob-live").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    println!("   ✅ Scenario channel-mismatch 404: OK.");
}

#[tokio::test]
async fn certify_scenario_unknown_credential_on_flags_is_unauthorized() {
    println!("\n🚫 [PROVING_GROUNDS]: Scenario — an unregistered MobileKey on GET /flags gets 401 before any channel comparison happens.");

    let app = build_router(ready_state().await);
    let request = Request::builder().method("GET").uri("/flags").header("Authorization", "mob-never-registered").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    println!("   ✅ Scenario unknown credential 401: OK.");
}

#[tokio::test]
async fn certify_scenario_js_client_ping_resolves_the_environment_id_from_the_url() {
    println!("\n🌐 [PROVING_GROUNDS]: Scenario — GET /ping/:env_id streams for a browser client with no Authorization header available.");

    let app = build_router(ready_state().await);
    let request = Request::builder().method("GET").uri("/ping/envid-live").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    println!("   ✅ Scenario JS client ping-by-URL: OK.");
}
