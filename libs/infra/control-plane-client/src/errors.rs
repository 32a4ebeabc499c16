// INICIO DEL ARCHIVO [libs/infra/control-plane-client/src/errors.rs]
//! =================================================================
//! APARATO: CONTROL PLANE CLIENT ERRORS
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE COMUNICACIÓN CON EL UPSTREAM
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlPlaneError {
    #[error("NETWORK_UNREACHABLE: failed to reach control plane: {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("ENVELOPE_CORRUPTION: failed to decode control-plane payload: {0}")]
    DecodingFault(#[from] serde_json::Error),

    #[error("COMMAND_REJECTION: control plane returned status {0}")]
    ServerRejection(String),

    #[error("IDENTITY_REVOKED: credential rejected by control plane (401/403)")]
    Unauthorized,
}
// FIN DEL ARCHIVO [libs/infra/control-plane-client/src/errors.rs]
