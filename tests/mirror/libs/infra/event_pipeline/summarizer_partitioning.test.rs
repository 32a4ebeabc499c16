// [tests/mirror/libs/infra/event_pipeline/summarizer_partitioning.test.rs]
/**
 * =================================================================
 * APARATO: SUMMARIZING RELAY PARTITIONING CERTIFIER
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-INFRA
 * RESPONSABILIDAD: VALIDACIÓN DE LA PARTICIÓN POR TAG Y DEL BARRIDO
 *                   DE PROCESADORES INACTIVOS
 * =================================================================
 */

use relay_core_models::Credential;
use relay_infra_event_pipeline::flag_lookup::NoFlagLookup;
use relay_infra_event_pipeline::{HttpEventPublisher, HttpEventPublisherConfig, SummarizingRelay};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn distinct_tags_produce_independent_publisher_batches() {
    println!("\n🧮 [PROVING_GROUNDS]: Tag-keyed partitioning produces independent summary batches.");

    let server = MockServer::start().await;
    Mock::given(method("POST")).and(path("/bulk")).respond_with(ResponseTemplate::new(202)).expect(2).mount(&server).await;

    let publisher = Arc::new(HttpEventPublisher::spawn(
        HttpEventPublisherConfig {
            events_uri: format!("{}/bulk", server.uri()),
            flush_interval: Duration::from_millis(50),
            ..Default::default()
        },
        Client::new(),
        Credential::ServerKey("sdk-key".into()),
    ));
    let relay = SummarizingRelay::new(Arc::new(NoFlagLookup), Arc::clone(&publisher));

    relay
        .ingest(Some("mobile-app".into()), 1, vec![serde_json::json!({"kind": "identify", "context": {"key": "u1"}})])
        .await;
    relay
        .ingest(Some("web-app".into()), 1, vec![serde_json::json!({"kind": "identify", "context": {"key": "u2"}})])
        .await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    publisher.close().await;

    println!("   ✅ Partitioning: OK — two independent tag batches published.");
}

#[tokio::test]
async fn idle_processor_is_evicted_then_lazily_recreated_by_a_fresh_event() {
    println!("\n🧮 [PROVING_GROUNDS]: Idle-tag eviction and lazy recreation.");

    let publisher = Arc::new(HttpEventPublisher::spawn(
        HttpEventPublisherConfig { events_uri: "http://127.0.0.1:1/bulk".into(), ..Default::default() },
        Client::new(),
        Credential::ServerKey("sdk-key".into()),
    ));
    let relay = SummarizingRelay::new(Arc::new(NoFlagLookup), Arc::clone(&publisher));

    relay.ingest(Some("tag-a".into()), 1, vec![serde_json::json!({"kind": "identify", "context": {"key": "u1"}})]).await;

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
    let done = Arc::clone(&relay).spawn_cleanup_loop(Duration::from_millis(20), stop_rx);
    tokio::time::sleep(Duration::from_millis(80)).await;
    let _ = stop_tx.send(());
    let _ = done.await;

    // The tag was flushed once (not idle the first sweep) then evicted on
    // the next sweep once quiescent; a fresh event must recreate it.
    relay.ingest(Some("tag-a".into()), 1, vec![serde_json::json!({"kind": "identify", "context": {"key": "u2"}})]).await;

    println!("   ✅ Idle eviction: OK — tag-a accepted a fresh event after its processor was recreated.");
}
