// INICIO DEL ARCHIVO [libs/core/environment/src/registry.rs]
/*!
 * =================================================================
 * APARATO: ENVIRONMENT REGISTRY CONTRACT (V1.0)
 * CLASIFICACIÓN: APPLICATION PORT (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE PUBLICACIÓN credential -> entorno, SIN
 *                   LECTURA DE VUELTA DESDE EL NÚCLEO
 *
 * VISION HIPER-HOLÍSTICA:
 * El núcleo solo escribe en este contrato; nunca lo consulta. La capa
 * HTTP (fuera de este crate) es la única lectora, y por tanto la única
 * dueña de una implementación real.
 * =================================================================
 */

use crate::context::EnvironmentContext;
use relay_core_models::ScopedCredential;
use std::sync::Arc;

/// Collaborator supplied at construction. `apps/relay-gateway` owns the
/// only implementation that matters in this workspace; the core only
/// ever calls the two mutating methods below.
pub trait EnvironmentRegistry: Send + Sync {
    fn add_connection_mapping(&self, scoped: ScopedCredential, environment: Arc<EnvironmentContext>);
    fn remove_connection_mapping(&self, scoped: ScopedCredential);
}

/// A registry that discards every mapping. Useful for unit tests of
/// `EnvironmentContext` that do not exercise the HTTP routing layer.
pub struct NullEnvironmentRegistry;

impl EnvironmentRegistry for NullEnvironmentRegistry {
    fn add_connection_mapping(&self, _scoped: ScopedCredential, _environment: Arc<EnvironmentContext>) {}
    fn remove_connection_mapping(&self, _scoped: ScopedCredential) {}
}
// FIN DEL ARCHIVO [libs/core/environment/src/registry.rs]
