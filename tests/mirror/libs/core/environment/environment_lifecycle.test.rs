// [tests/mirror/libs/core/environment/environment_lifecycle.test.rs]
/**
 * =================================================================
 * APARATO: ENVIRONMENT CONTEXT LIFECYCLE CERTIFIER
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-CORE
 * RESPONSABILIDAD: CONSTRUCCIÓN, ROTACIÓN, Y CIERRE END-TO-END
 * =================================================================
 */

use chrono::Utc;
use relay_core_environment::{CredentialUpdate, EnvironmentContext, EnvironmentRegistry, EnvironmentRuntimeConfig, NullEnvironmentRegistry, RelayError};
use relay_core_models::{Credential, EnvironmentIdentifiers, EnvironmentParams, ScopedCredential};
use relay_infra_data_store::{ChannelKind, InMemoryDataStore};
use relay_infra_event_pipeline::NoFlagLookup;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

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

fn params(offline: bool) -> EnvironmentParams {
    EnvironmentParams {
        environment_id: "env-live".into(),
        identifiers: identifiers(),
        primary_server_key: Credential::ServerKey("sdk-original".into()),
        mobile_key: Some(Credential::MobileKey("mob-original".into())),
        environment_id_credential: Some(Credential::EnvironmentID("envid-original".into())),
        expiring_server_key: None,
        php_ttl_seconds: 0,
        secure_mode: false,
        filter_key: None,
        offline,
    }
}

fn runtime() -> EnvironmentRuntimeConfig {
    EnvironmentRuntimeConfig {
        stream_base_url: "http://127.0.0.1:1".into(),
        events_uri: "http://127.0.0.1:1/bulk".into(),
        diagnostic_upstream_url: "http://127.0.0.1:1/diagnostic".into(),
        events_enabled: true,
        publisher_queue_capacity: 100,
        publisher_flush_interval: Duration::from_secs(5),
        summarizer_cleanup_interval: Duration::from_secs(60),
        credential_cleanup_interval: Duration::from_secs(60),
        ignore_connection_errors: true,
    }
}

/// Counts mapping additions/removals without caring about the `Arc` payload
/// — standing in for the HTTP layer's real routing table in this crate.
#[derive(Default)]
struct CountingRegistry {
    added: AtomicUsize,
    removed: AtomicUsize,
}

impl EnvironmentRegistry for CountingRegistry {
    fn add_connection_mapping(&self, _scoped: ScopedCredential, _environment: Arc<EnvironmentContext>) {
        self.added.fetch_add(1, Ordering::SeqCst);
    }
    fn remove_connection_mapping(&self, _scoped: ScopedCredential) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn certify_scenario_online_construction_registers_all_three_channels() {
    println!("\n🌐 [PROVING_GROUNDS]: Scenario — online construction registers ServerKey/MobileKey/EnvironmentID.");

    let registry = Arc::new(CountingRegistry::default());
    let context = EnvironmentContext::spawn(
        params(false),
        Arc::new(InMemoryDataStore::new()),
        Arc::clone(&registry) as Arc<dyn EnvironmentRegistry>,
        Arc::new(NoFlagLookup),
        runtime(),
        Client::new(),
    )
    .expect("a defined primary ServerKey must construct successfully");

    context.ready().await.expect("bootstrap failure must be swallowed when ignore_connection_errors is set");

    assert_eq!(context.channel_for_credential(&Credential::ServerKey("sdk-original".into())), Some(ChannelKind::All));
    assert_eq!(context.channel_for_credential(&Credential::MobileKey("mob-original".into())), Some(ChannelKind::Flags));
    assert_eq!(context.channel_for_credential(&Credential::EnvironmentID("envid-original".into())), Some(ChannelKind::Ping));
    assert_eq!(registry.added.load(Ordering::SeqCst), 3, "all three initial credentials must register a mapping");
    assert!(context.get_client().is_some(), "the primary ServerKey must own a control-plane client");

    context.close().await;
    println!("   ✅ Scenario online construction: OK.");
}

#[tokio::test]
async fn certify_scenario_offline_construction_has_exactly_one_client() {
    println!("\n🌐 [PROVING_GROUNDS]: Scenario — offline construction skips the network and analytics dispatcher.");

    let context = EnvironmentContext::spawn(
        params(true),
        Arc::new(InMemoryDataStore::new()),
        Arc::new(NullEnvironmentRegistry),
        Arc::new(NoFlagLookup),
        runtime(),
        Client::new(),
    )
    .expect("offline construction must still succeed");

    context.ready().await.expect("offline ready resolves without any network round trip");
    assert!(context.get_client().is_some());
    assert!(context.dispatcher().is_none(), "offline environments never dispatch analytics");

    context.close().await;
    println!("   ✅ Scenario offline construction: OK.");
}

#[tokio::test]
async fn certify_scenario_immediate_rotation_swaps_the_active_server_key() {
    println!("\n🔁 [PROVING_GROUNDS]: Scenario — immediate rotation swaps the primary ServerKey end-to-end.");

    let registry = Arc::new(CountingRegistry::default());
    let context = EnvironmentContext::spawn(
        params(false),
        Arc::new(InMemoryDataStore::new()),
        Arc::clone(&registry) as Arc<dyn EnvironmentRegistry>,
        Arc::new(NoFlagLookup),
        runtime(),
        Client::new(),
    )
    .expect("construction must succeed");
    context.ready().await.expect("bootstrap must resolve");

    context
        .update_credential(CredentialUpdate::Rotate(Credential::ServerKey("sdk-rotated".into())), Utc::now())
        .await
        .expect("rotating a ServerKey primary must succeed");

    assert_eq!(context.channel_for_credential(&Credential::ServerKey("sdk-rotated".into())), Some(ChannelKind::All));
    assert!(
        context.channel_for_credential(&Credential::ServerKey("sdk-original".into())).is_none(),
        "the previous ServerKey is deprecated with an already-elapsed expiry, so it expires within the same StepTime sweep"
    );
    assert!(registry.removed.load(Ordering::SeqCst) >= 1, "the lapsed credential must be unregistered from the routing table");

    context.close().await;
    println!("   ✅ Scenario immediate rotation: OK.");
}

#[tokio::test]
async fn certify_scenario_construction_rejects_an_undefined_primary_server_key() {
    println!("\n🚫 [PROVING_GROUNDS]: Scenario — an undefined primary ServerKey fails construction synchronously.");

    let mut bad_params = params(false);
    bad_params.primary_server_key = Credential::ServerKey(String::new());

    let result = EnvironmentContext::spawn(
        bad_params,
        Arc::new(InMemoryDataStore::new()),
        Arc::new(NullEnvironmentRegistry),
        Arc::new(NoFlagLookup),
        runtime(),
        Client::new(),
    );

    assert!(matches!(result, Err(RelayError::Configuration(_))));
    println!("   ✅ Scenario rejects undefined primary: OK.");
}

#[tokio::test]
async fn certify_scenario_close_is_idempotent_and_tears_down_background_loops() {
    println!("\n🛑 [PROVING_GROUNDS]: Scenario — Close tears everything down and tolerates a second call.");

    let context = EnvironmentContext::spawn(
        params(false),
        Arc::new(InMemoryDataStore::new()),
        Arc::new(NullEnvironmentRegistry),
        Arc::new(NoFlagLookup),
        runtime(),
        Client::new(),
    )
    .expect("construction must succeed");
    context.ready().await.expect("bootstrap must resolve");

    context.spawn_cleanup_loop(Duration::from_millis(10));
    context.spawn_heartbeat(Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(30)).await;

    context.close().await;
    context.close().await;

    println!("   ✅ Scenario idempotent close: OK.");
}
