// [apps/relay-gateway/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY LIBRARY ROOT (V1.0)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS DEL GATEWAY
 * =================================================================
 */

/// Adaptadores de entrada HTTP/SSE: analítica, diagnóstico y streaming.
pub mod handlers;
/// Núcleo de ignición: ensambla el registro, los entornos y el router.
pub mod kernel;
/// Guardias de seguridad y resolución credential -> entorno.
pub mod middleware;
/// Topología de rutas y CORS del transporte HTTP.
pub mod routes;
/// Tabla de ruteo credential -> entorno y modo del sistema.
pub mod state;

pub mod prelude {
    pub use crate::kernel::GatewayKernel;
    pub use crate::state::{AppState, GatewayRegistry, SystemMode};
}
// FIN DEL ARCHIVO [apps/relay-gateway/src/lib.rs]
