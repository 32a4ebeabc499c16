// [tests/mirror/apps/relay-gateway/state/registry_routing.test.rs]
/**
 * =================================================================
 * APARATO: GATEWAY REGISTRY ROUTING CERTIFIER
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-GATEWAY
 * RESPONSABILIDAD: GatewayRegistry COMO ÚNICO LECTOR credential -> ENTORNO
 * =================================================================
 */

use chrono::Utc;
use relay_core_environment::{CredentialUpdate, EnvironmentContext, EnvironmentRegistry, EnvironmentRuntimeConfig};
use relay_core_models::{Credential, EnvironmentIdentifiers, EnvironmentParams, ScopedCredential};
use relay_gateway::state::GatewayRegistry;
use relay_infra_data_store::InMemoryDataStore;
use relay_infra_event_pipeline::NoFlagLookup;
use reqwest::Client;
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

#[tokio::test]
async fn certify_scenario_construction_populates_the_registry_with_all_three_credentials() {
    println!("\n🗺️  [PROVING_GROUNDS]: Scenario — constructing one environment registers ServerKey, MobileKey, and EnvironmentID into the gateway's own registry.");

    let registry = Arc::new(GatewayRegistry::new());
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

    assert_eq!(registry.len(), 3);
    assert!(registry.lookup(&ScopedCredential::new(None, Credential::ServerKey("sdk-original".into()))).is_some());
    assert!(registry.lookup(&ScopedCredential::new(None, Credential::MobileKey("mob-original".into()))).is_some());
    assert!(registry.lookup(&ScopedCredential::new(None, Credential::EnvironmentID("envid-original".into()))).is_some());

    context.close().await;
    println!("   ✅ Scenario registry population on construction: OK.");
}

#[tokio::test]
async fn certify_scenario_rotation_moves_the_registry_entry_from_old_key_to_new_key() {
    println!("\n🔁 [PROVING_GROUNDS]: Scenario — rotating the primary ServerKey removes the old registry entry and adds the new one.");

    let registry = Arc::new(GatewayRegistry::new());
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
        .expect("rotation must succeed");

    assert!(registry.lookup(&ScopedCredential::new(None, Credential::ServerKey("sdk-rotated".into()))).is_some(), "the rotated key must be routable");
    assert!(
        registry.lookup(&ScopedCredential::new(None, Credential::ServerKey("sdk-original".into()))).is_none(),
        "the deprecated key expires in the same StepTime sweep and must no longer be routable"
    );
    assert_eq!(registry.len(), 3, "mobile and environment-id mappings are untouched by a ServerKey rotation");

    context.close().await;
    println!("   ✅ Scenario rotation moves the registry entry: OK.");
}

#[tokio::test]
async fn certify_scenario_two_environments_scoped_by_filter_key_do_not_collide() {
    println!("\n🧩 [PROVING_GROUNDS]: Scenario — two environments sharing a ServerKey body but distinct filter keys route independently.");

    let registry = Arc::new(GatewayRegistry::new());

    let mut shard_a = params(true);
    shard_a.primary_server_key = Credential::ServerKey("shared-sdk".into());
    shard_a.mobile_key = None;
    shard_a.environment_id_credential = None;
    shard_a.filter_key = Some("shard-a".into());

    let mut shard_b = params(true);
    shard_b.primary_server_key = Credential::ServerKey("shared-sdk".into());
    shard_b.mobile_key = None;
    shard_b.environment_id_credential = None;
    shard_b.filter_key = Some("shard-b".into());

    let context_a = EnvironmentContext::spawn(shard_a, Arc::new(InMemoryDataStore::new()), Arc::clone(&registry) as Arc<dyn EnvironmentRegistry>, Arc::new(NoFlagLookup), runtime(), Client::new())
        .expect("shard A must construct");
    let context_b = EnvironmentContext::spawn(shard_b, Arc::new(InMemoryDataStore::new()), Arc::clone(&registry) as Arc<dyn EnvironmentRegistry>, Arc::new(NoFlagLookup), runtime(), Client::new())
        .expect("shard B must construct");
    context_a.ready().await.expect("shard A ready");
    context_b.ready().await.expect("shard B ready");

    assert_eq!(registry.len(), 2);
    let resolved_a = registry.lookup(&ScopedCredential::new(Some("shard-a".into()), Credential::ServerKey("shared-sdk".into()))).expect("shard A must resolve under its own filter key");
    let resolved_b = registry.lookup(&ScopedCredential::new(Some("shard-b".into()), Credential::ServerKey("shared-sdk".into()))).expect("shard B must resolve under its own filter key");
    assert!(!Arc::ptr_eq(&resolved_a, &resolved_b), "each filter key must resolve to its own environment, not the other shard's");
    assert!(
        registry.lookup(&ScopedCredential::new(None, Credential::ServerKey("shared-sdk".into()))).is_none(),
        "the same credential body with no filter key must not collide with either shard"
    );

    context_a.close().await;
    context_b.close().await;
    println!("   ✅ Scenario filter-key-scoped routing: OK.");
}
