// [tests/mirror/libs/infra/event_pipeline/publisher_queue_scenarios.test.rs]
/**
 * =================================================================
 * APARATO: HTTP EVENT PUBLISHER SCENARIO CERTIFIER
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-INFRA
 * RESPONSABILIDAD: VALIDACIÓN LITERAL DE TRUNCADO, METADATA, CREDENCIAL
 *                   Y DESHABILITADO POR 401
 * =================================================================
 */

use relay_core_models::{Credential, EventPayloadMetadata};
use relay_infra_event_pipeline::{HttpEventPublisher, HttpEventPublisherConfig};
use reqwest::Client;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn config(uri: String, queue_capacity: usize) -> HttpEventPublisherConfig {
    HttpEventPublisherConfig {
        events_uri: uri,
        queue_capacity,
        flush_interval: Duration::from_secs(600),
        input_channel_capacity: 64,
        user_agent: "relay-proving-grounds/1.0".to_string(),
    }
}

#[tokio::test]
async fn truncates_batch_to_capacity_and_flushes_exactly_once() {
    println!("\n📬 [PROVING_GROUNDS]: capacity truncation, single flush POST.");

    let server = MockServer::start().await;
    Mock::given(method("POST")).and(path("/bulk")).respond_with(ResponseTemplate::new(202)).expect(1).mount(&server).await;

    let publisher = HttpEventPublisher::spawn(config(format!("{}/bulk", server.uri()), 3), Client::new(), Credential::ServerKey("sdk-key".into()));

    let meta = EventPayloadMetadata::new(4, None);
    publisher.publish(meta.clone(), vec![serde_json::json!({"i": 0}), serde_json::json!({"i": 1})]).await;
    publisher.publish(meta, vec![serde_json::json!({"i": 2}), serde_json::json!({"i": 3})]).await;
    publisher.flush().await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    publisher.close().await;

    println!("   ✅ capacity truncation: OK — server received exactly one truncated POST.");
}

#[tokio::test]
async fn two_distinct_metadata_values_produce_two_posts_with_differing_headers() {
    println!("\n📬 [PROVING_GROUNDS]: distinct metadata, distinct header sets.");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bulk"))
        .and(header("x-launchdarkly-event-schema", "3"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bulk"))
        .and(header("x-launchdarkly-event-schema", "4"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = HttpEventPublisher::spawn(config(format!("{}/bulk", server.uri()), 10), Client::new(), Credential::ServerKey("sdk-key".into()));

    publisher.publish(EventPayloadMetadata::new(3, None), vec![serde_json::json!({"a": 1})]).await;
    publisher.publish(EventPayloadMetadata::new(4, None), vec![serde_json::json!({"b": 1})]).await;
    publisher.flush().await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    publisher.close().await;

    println!("   ✅ distinct metadata: OK — two posts, distinct schema headers.");
}

#[tokio::test]
async fn replace_credential_is_reflected_on_next_post_and_noop_on_kind_mismatch() {
    println!("\n📬 [PROVING_GROUNDS]: ReplaceCredential kind-gating.");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bulk"))
        .and(header("authorization", "sdk-key-2"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = HttpEventPublisher::spawn(config(format!("{}/bulk", server.uri()), 10), Client::new(), Credential::ServerKey("sdk-key-1".into()));

    // Mismatched kind: no-op.
    publisher.replace_credential(Credential::MobileKey("mob-1".into())).await;
    // Matching kind: takes effect.
    publisher.replace_credential(Credential::ServerKey("sdk-key-2".into())).await;

    publisher.publish(EventPayloadMetadata::default(), vec![serde_json::json!({"a": 1})]).await;
    publisher.flush().await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    publisher.close().await;

    println!("   ✅ ReplaceCredential kind-gating: OK — outgoing post carried the replaced credential.");
}

#[tokio::test]
async fn publisher_disables_on_401_and_close_still_returns() {
    println!("\n📬 [PROVING_GROUNDS]: publisher disable on 401.");

    let server = MockServer::start().await;
    Mock::given(method("POST")).and(path("/bulk")).respond_with(ResponseTemplate::new(401)).expect(1).mount(&server).await;

    let publisher = HttpEventPublisher::spawn(config(format!("{}/bulk", server.uri()), 10), Client::new(), Credential::ServerKey("sdk-key".into()));

    publisher.publish(EventPayloadMetadata::default(), vec![serde_json::json!({"a": 1})]).await;
    publisher.flush().await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    // Post-disable publish produces no further posts (the mock's expect(1)
    // would fail verification on drop if a second post were attempted).
    publisher.publish(EventPayloadMetadata::default(), vec![serde_json::json!({"b": 2})]).await;
    publisher.flush().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    publisher.close().await;

    println!("   ✅ publisher disable on 401: OK — disabled after 401, Close returned without blocking.");
}

#[tokio::test]
async fn schema_3_batch_forwards_verbatim_with_current_output_schema_header() {
    println!("\n📬 [PROVING_GROUNDS]: verbatim forwarding by schema.");

    let server = MockServer::start().await;
    let expected_body = serde_json::json!([{"kind": "identify", "creationDate": 1000, "context": {"key": "u"}}]);

    Mock::given(method("POST"))
        .and(path("/bulk"))
        .respond_with(move |request: &Request| {
            assert_eq!(request.headers.get("content-encoding").unwrap(), "gzip");
            ResponseTemplate::new(202)
        })
        .expect(1)
        .mount(&server)
        .await;

    let publisher = HttpEventPublisher::spawn(config(format!("{}/bulk", server.uri()), 10), Client::new(), Credential::ServerKey("sdk-key".into()));
    publisher.publish(EventPayloadMetadata::new(3, None), vec![expected_body[0].clone()]).await;
    publisher.flush().await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    publisher.close().await;

    println!("   ✅ verbatim forwarding by schema: OK — single verbatim POST observed.");
}
