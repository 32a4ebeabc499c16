// [apps/relay-gateway/src/main.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY MAIN ENTRY POINT (V1.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: CARGA DE ENTORNO, OBSERVABILIDAD E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Un cargador de configuración de archivo (TOML/YAML) es explícitamente
 * un no-objetivo: este binario hidrata `EnvironmentParams` desde
 * variables de entorno — una lista JSON en `RELAY_ENVIRONMENTS`, o, en
 * su ausencia, un único tenant construido a partir de variables sueltas
 * — precisamente hasta donde `EnvironmentContext::spawn` necesita, ni
 * un paso más.
 * =================================================================
 */

use dotenvy::dotenv;
use relay_core_environment::EnvironmentRuntimeConfig;
use relay_core_models::{Credential, EnvironmentIdentifiers, EnvironmentParams};
use relay_gateway::prelude::GatewayKernel;
use relay_shared_heimdall::init_tracing;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

/// One tenant, as hydrated straight from the environment. Intentionally
/// thinner than `EnvConfig`: this binary is the
/// minimal bootstrap path, not a general-purpose config loader.
#[derive(Debug, Deserialize)]
struct EnvSpec {
    project_key: String,
    project_name: String,
    environment_key: String,
    environment_name: String,
    sdk_key: String,
    mobile_key: Option<String>,
    environment_id: Option<String>,
    filter_key: Option<String>,
    #[serde(default)]
    offline: bool,
}

impl From<EnvSpec> for EnvironmentParams {
    fn from(spec: EnvSpec) -> Self {
        EnvironmentParams {
            environment_id: spec.environment_key.clone(),
            identifiers: EnvironmentIdentifiers {
                project_key: spec.project_key,
                project_name: spec.project_name,
                environment_key: spec.environment_key,
                environment_name: spec.environment_name,
                filter_key: spec.filter_key.clone(),
                configured_name: None,
            },
            primary_server_key: Credential::ServerKey(spec.sdk_key),
            mobile_key: spec.mobile_key.map(Credential::MobileKey),
            environment_id_credential: spec.environment_id.map(Credential::EnvironmentID),
            expiring_server_key: None,
            php_ttl_seconds: 0,
            secure_mode: false,
            filter_key: spec.filter_key,
            offline: spec.offline,
        }
    }
}

fn load_environments() -> Vec<EnvironmentParams> {
    if let Ok(raw) = std::env::var("RELAY_ENVIRONMENTS") {
        let specs: Vec<EnvSpec> = serde_json::from_str(&raw).expect("RELAY_ENVIRONMENTS must be a JSON array of environment specs");
        return specs.into_iter().map(EnvironmentParams::from).collect();
    }

    let fallback = EnvSpec {
        project_key: std::env::var("PROJECT_KEY").unwrap_or_else(|_| "default".into()),
        project_name: std::env::var("PROJECT_NAME").unwrap_or_else(|_| "Default Project".into()),
        environment_key: std::env::var("ENVIRONMENT_KEY").unwrap_or_else(|_| "production".into()),
        environment_name: std::env::var("ENVIRONMENT_NAME").unwrap_or_else(|_| "Production".into()),
        sdk_key: std::env::var("SDK_KEY").expect("CRITICAL_FAULT: SDK_KEY not defined in runtime environment"),
        mobile_key: std::env::var("MOBILE_KEY").ok(),
        environment_id: std::env::var("ENVIRONMENT_ID").ok(),
        filter_key: std::env::var("FILTER_KEY").ok(),
        offline: std::env::var("OFFLINE").map(|v| v == "true").unwrap_or(false),
    };
    vec![EnvironmentParams::from(fallback)]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("relay_gateway");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().thread_stack_size(4 * 1024 * 1024).build()?;

    runtime.block_on(async {
        info!("🛰️  [GATEWAY_BOOT]: ignition sequence starting...");

        let stream_base_url = std::env::var("STREAM_BASE_URL").unwrap_or_else(|_| "https://stream.example-control-plane.invalid".into());
        let events_uri = std::env::var("EVENTS_URI").unwrap_or_else(|_| "https://events.example-control-plane.invalid/bulk".into());
        let diagnostic_upstream_url = std::env::var("DIAGNOSTIC_UPSTREAM_URL").unwrap_or_else(|_| "https://events.example-control-plane.invalid/diagnostic".into());
        let ignore_connection_errors = std::env::var("IGNORE_CONNECTION_ERRORS").map(|v| v == "true").unwrap_or(false);
        let listening_port: u16 = std::env::var("PORT").unwrap_or_else(|_| "8030".to_string()).parse().unwrap_or(8030);

        let runtime_config = EnvironmentRuntimeConfig {
            stream_base_url,
            events_uri,
            diagnostic_upstream_url,
            events_enabled: true,
            publisher_queue_capacity: 10_000,
            publisher_flush_interval: Duration::from_secs(5),
            summarizer_cleanup_interval: Duration::from_secs(60),
            credential_cleanup_interval: Duration::from_secs(60),
            ignore_connection_errors,
        };

        let kernel = GatewayKernel::ignite(load_environments(), runtime_config, Duration::from_secs(15), reqwest::Client::new(), listening_port)
            .expect("CRITICAL_FAULT: environment construction failed");

        info!("🚀 [GATEWAY_READY]: {} environment(s) constructed, launching on port {}.", kernel.environments.len(), listening_port);
        kernel.launch().await;

        Ok(())
    })
}
// FIN DEL ARCHIVO [apps/relay-gateway/src/main.rs]
