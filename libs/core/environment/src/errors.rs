// INICIO DEL ARCHIVO [libs/core/environment/src/errors.rs]
//! =================================================================
//! APARATO: ENVIRONMENT CONTEXT ERRORS
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE ARRANQUE Y ROTACIÓN
//! =================================================================

use relay_core_credential::RotatorError;
use relay_infra_control_plane_client::ControlPlaneError;
use relay_infra_data_store::DataStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("CONFIGURATION_FAULT: invalid environment construction input: {0}")]
    Configuration(String),

    #[error("ROTATOR_FAULT: {0}")]
    Rotator(#[from] RotatorError),

    #[error("STORE_FAULT: {0}")]
    Store(#[from] DataStoreError),

    #[error("CONTROL_PLANE_FAULT: {0}")]
    ControlPlane(#[from] ControlPlaneError),
}
// FIN DEL ARCHIVO [libs/core/environment/src/errors.rs]
