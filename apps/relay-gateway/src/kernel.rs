// INICIO DEL ARCHIVO [apps/relay-gateway/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY SOVEREIGN KERNEL (V1.0)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: ENSAMBLAR UN ENTORNO POR TENANT Y LEVANTAR EL
 *                   SERVIDOR HTTP/SSE QUE LOS SIRVE A TODOS
 *
 * VISION HIPER-HOLÍSTICA:
 * `ignite` construye cada `EnvironmentContext` de forma síncrona — la
 * construcción nunca bloquea en red — y solo `launch` espera a
 * que cada uno alcance su primer snapshot antes de anunciar el puerto
 * como operativo. Un entorno que nunca se inicializa (control plane
 * caído) no impide que los demás sirvan tráfico: cada `ready()` se
 * espera de forma independiente.
 * =================================================================
 */

use crate::routes::build_router;
use crate::state::{AppState, GatewayRegistry};
use futures_util::future::join_all;
use relay_core_environment::{EnvironmentContext, EnvironmentRegistry, EnvironmentRuntimeConfig, RelayError};
use relay_core_models::EnvironmentParams;
use relay_infra_data_store::{DataStore, InMemoryDataStore};
use relay_infra_event_pipeline::NoFlagLookup;
use reqwest::Client;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub struct GatewayKernel {
    pub server_network_port: u16,
    pub application_state: AppState,
    pub environments: Vec<Arc<EnvironmentContext>>,
    credential_cleanup_interval: Duration,
    heartbeat_interval: Duration,
}

impl GatewayKernel {
    /// Constructs one `EnvironmentContext` per tenant and wires them all
    /// into a single routing table. Each tenant gets its own in-process
    /// data store; nothing here opens a network connection yet.
    #[instrument(skip(environments, runtime, http))]
    pub fn ignite(
        environments: Vec<EnvironmentParams>,
        runtime: EnvironmentRuntimeConfig,
        heartbeat_interval: Duration,
        http: Client,
        listening_port: u16,
    ) -> Result<Self, RelayError> {
        let registry = Arc::new(GatewayRegistry::new());
        let mut contexts = Vec::with_capacity(environments.len());

        for params in environments {
            let data_store: Arc<dyn DataStore> = Arc::new(InMemoryDataStore::new());
            let context = EnvironmentContext::spawn(
                params,
                data_store,
                Arc::clone(&registry) as Arc<dyn EnvironmentRegistry>,
                Arc::new(NoFlagLookup),
                runtime.clone(),
                http.clone(),
            )?;
            contexts.push(context);
        }

        Ok(Self {
            server_network_port: listening_port,
            application_state: AppState::new(registry),
            environments: contexts,
            credential_cleanup_interval: runtime.credential_cleanup_interval,
            heartbeat_interval,
        })
    }

    /// Waits for every environment's first snapshot, starts its background
    /// daemons, then binds and serves the HTTP/SSE router. Never returns
    /// unless the listener itself fails.
    ///
    /// Every `ready()` is awaited concurrently, not one after another: a
    /// tenant whose control plane never answers must not delay the other
    /// tenants' daemons from starting or the router from binding.
    pub async fn launch(self) {
        let readiness = join_all(self.environments.iter().map(|environment| environment.ready())).await;
        for (environment, outcome) in self.environments.iter().zip(readiness) {
            if let Err(fault) = outcome {
                warn!(error = %fault, environment = %environment.identifiers().display_name(), "environment did not reach ready state before launch");
            }
            environment.spawn_cleanup_loop(self.credential_cleanup_interval);
            environment.spawn_heartbeat(self.heartbeat_interval);
        }

        let router = build_router(self.application_state.clone());
        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().expect("static literal parses"), self.server_network_port);

        info!("🚀 [GATEWAY_ONLINE]: relay gateway listening at {}", bind_address);
        let listener = tokio::net::TcpListener::bind(bind_address).await.expect("CRITICAL_FAULT: failed to bind network port");

        if let Err(fault) = axum::serve(listener, router).await {
            error!("💀 [GATEWAY_COLLAPSE]: runtime failure: {}", fault);
            std::process::exit(1);
        }
    }
}
// FIN DEL ARCHIVO [apps/relay-gateway/src/kernel.rs]
