// INICIO DEL ARCHIVO [libs/core/models/src/event.rs]
/*!
 * =================================================================
 * APARATO: EVENT PIPELINE METADATA (V1.0)
 * CLASIFICACIÓN: DOMAIN ENTITIES (L2)
 * RESPONSABILIDAD: CLAVES DE PARTICIÓN PARA LAS COLAS DEL PUBLISHER
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Partitions the HTTP Event Publisher's queues. Events with
/// different metadata differ in outbound headers, so they must never share
/// a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EventPayloadMetadata {
    pub schema_version: u32,
    pub tags: Option<String>,
}

impl EventPayloadMetadata {
    pub fn new(schema_version: u32, tags: Option<String>) -> Self {
        Self { schema_version, tags }
    }
}

impl Default for EventPayloadMetadata {
    fn default() -> Self {
        Self { schema_version: 1, tags: None }
    }
}

/// Current output schema version produced by the summarizing relay.
pub const CURRENT_OUTPUT_SCHEMA: u32 = 4;

/// Below this schema version, the dispatcher routes incoming analytics
/// batches through the summarizer instead of forwarding them verbatim.
pub const SUMMARY_SCHEMA_THRESHOLD: u32 = 3;

// FIN DEL ARCHIVO [libs/core/models/src/event.rs]
