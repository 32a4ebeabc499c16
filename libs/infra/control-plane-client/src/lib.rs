// INICIO DEL ARCHIVO [libs/infra/control-plane-client/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CONTROL PLANE CLIENT LIBRARY BARREL (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LIB (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN PÚBLICA DEL CLIENTE DE UPLINK Y SUS ERRORES
 * =================================================================
 */

pub mod client;
pub mod errors;

pub use client::ControlPlaneClient;
pub use errors::ControlPlaneError;
// FIN DEL ARCHIVO [libs/infra/control-plane-client/src/lib.rs]
