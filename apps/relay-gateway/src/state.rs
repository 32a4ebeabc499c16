// INICIO DEL ARCHIVO [apps/relay-gateway/src/state.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY APPLICATION STATE (V1.0)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L3)
 * RESPONSABILIDAD: TABLA DE RUTEO credential -> ENTORNO Y MODO DEL SISTEMA
 *
 * VISION HIPER-HOLÍSTICA:
 * `GatewayRegistry` es la única implementación real del contrato
 * `EnvironmentRegistry` en este monorepo (el núcleo solo escribe en él,
 * nunca lo consulta). La capa HTTP es su único lector, a través
 * de `lookup`, que no forma parte del contrato del núcleo.
 * =================================================================
 */

use relay_core_environment::{EnvironmentContext, EnvironmentRegistry};
use relay_core_models::ScopedCredential;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Mapea cada credencial activa (con su clave de filtro) al entorno que la
/// registró. Poblada exclusivamente por las llamadas del núcleo a
/// `add_connection_mapping`/`remove_connection_mapping`.
#[derive(Default)]
pub struct GatewayRegistry {
    mappings: RwLock<HashMap<ScopedCredential, Arc<EnvironmentContext>>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, scoped: &ScopedCredential) -> Option<Arc<EnvironmentContext>> {
        self.mappings.read().expect("registry lock poisoned").get(scoped).cloned()
    }

    pub fn len(&self) -> usize {
        self.mappings.read().expect("registry lock poisoned").len()
    }
}

impl EnvironmentRegistry for GatewayRegistry {
    fn add_connection_mapping(&self, scoped: ScopedCredential, environment: Arc<EnvironmentContext>) {
        self.mappings.write().expect("registry lock poisoned").insert(scoped, environment);
    }

    fn remove_connection_mapping(&self, scoped: ScopedCredential) {
        self.mappings.write().expect("registry lock poisoned").remove(&scoped);
    }
}

/// Whether the gateway is currently accepting traffic. A maintenance window
/// is the only reason this would ever flip — everyday credential rotation
/// and environment churn never touch it.
#[derive(Debug, Clone)]
pub enum SystemMode {
    Operational,
    Maintenance(String),
}

impl SystemMode {
    pub fn is_operational(&self) -> Result<(), String> {
        match self {
            SystemMode::Operational => Ok(()),
            SystemMode::Maintenance(reason) => Err(reason.clone()),
        }
    }
}

/// Shared application state handed to every handler via `axum::State`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<GatewayRegistry>,
    mode: Arc<RwLock<SystemMode>>,
}

impl AppState {
    pub fn new(registry: Arc<GatewayRegistry>) -> Self {
        Self { registry, mode: Arc::new(RwLock::new(SystemMode::Operational)) }
    }

    pub fn is_operational(&self) -> Result<(), String> {
        self.mode.read().expect("mode lock poisoned").is_operational()
    }

    pub fn enter_maintenance(&self, reason: impl Into<String>) {
        *self.mode.write().expect("mode lock poisoned") = SystemMode::Maintenance(reason.into());
    }

    pub fn resume_operations(&self) {
        *self.mode.write().expect("mode lock poisoned") = SystemMode::Operational;
    }
}

// FIN DEL ARCHIVO [apps/relay-gateway/src/state.rs]
