// INICIO DEL ARCHIVO [libs/infra/event-pipeline/src/errors.rs]
//! =================================================================
//! APARATO: EVENT PIPELINE ERRORS
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE ENTREGA Y DE INGESTA
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("NETWORK_UNREACHABLE: failed to reach upstream event collector: {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("ENVELOPE_CORRUPTION: failed to encode outgoing batch: {0}")]
    EncodingFault(#[from] serde_json::Error),

    #[error("COMMAND_REJECTION: upstream collector returned status {0}")]
    ServerRejection(String),

    #[error("IDENTITY_REVOKED: credential rejected by upstream collector (401/403)")]
    Unauthorized,

    #[error("SEVERED: publisher has been closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("EMPTY_PAYLOAD: request body carried no bytes")]
    EmptyBody,

    #[error("MALFORMED_ENVELOPE: body was not a JSON array of event objects")]
    Unparseable,
}
// FIN DEL ARCHIVO [libs/infra/event-pipeline/src/errors.rs]
