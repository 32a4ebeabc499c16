// [tests/mirror/libs/infra/control_plane_client/bootstrap_handshake.test.rs]
/**
 * =================================================================
 * APARATO: CONTROL PLANE UPLINK HANDSHAKE CERTIFIER
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-INFRA
 * =================================================================
 */

use relay_core_models::{AllData, Credential, FlagItem};
use relay_infra_control_plane_client::{ControlPlaneClient, ControlPlaneError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn certify_bootstrap_retries_then_recovers_from_transient_failure() {
    println!("\n🛰️  [PROVING_GROUNDS]: Bootstrap retry-then-recover.");

    let server = MockServer::start().await;
    let mut snapshot = AllData::default();
    snapshot.flags.insert(
        "f1".to_string(),
        FlagItem { key: "f1".into(), version: 1, payload: Some(serde_json::json!({"on": true})) },
    );

    Mock::given(method("GET"))
        .and(path("/all"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot.clone()))
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new(server.uri(), Credential::ServerKey("sdk-key".into()));
    let result = client.spawn_bootstrap().await.expect("bootstrap task must complete");
    assert_eq!(result.expect("second attempt must succeed"), snapshot);

    println!("   ✅ Bootstrap retry-then-recover: OK.");
}

#[tokio::test]
async fn certify_bootstrap_does_not_retry_on_unauthorized() {
    println!("\n🛰️  [PROVING_GROUNDS]: Bootstrap fails fast on 401.");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/all"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new(server.uri(), Credential::ServerKey("revoked".into()));
    let result = client.spawn_bootstrap().await.expect("bootstrap task must complete");
    assert!(matches!(result, Err(ControlPlaneError::Unauthorized)));

    println!("   ✅ Bootstrap fails fast on 401: OK.");
}
