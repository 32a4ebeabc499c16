// INICIO DEL ARCHIVO [libs/infra/data-store/src/channel.rs]
/*!
 * =================================================================
 * APARATO: SSE WIRE EVENTS (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE VALUE TYPES (ESTRATO L3)
 * RESPONSABILIDAD: FORMATO DE EVENTOS put/patch/delete/ping Y SU RUTEO
 *                   A LOS TRES CANALES LÓGICOS POR ESTIRPE DE CREDENCIAL
 *
 * VISION HIPER-HOLÍSTICA:
 * Este módulo no conoce HTTP ni axum: produce pares (nombre-de-evento,
 * cuerpo) neutrales que la capa de transporte (apps/relay-gateway)
 * traduce a `axum::response::sse::Event`. Mantener el adaptador sin
 * dependencia de un framework web concreto.
 * =================================================================
 */

use relay_core_models::CredentialKind;
use serde::Serialize;
use serde_json::Value;

/// One of the three logical broadcast channels. Each credential kind maps
/// to exactly one channel kind: ServerKey SDKs subscribe to
/// `All`, MobileKey SDKs to `Flags`, EnvironmentID (browser) SDKs to `Ping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    All,
    Flags,
    Ping,
}

impl ChannelKind {
    pub fn for_credential_kind(kind: CredentialKind) -> ChannelKind {
        match kind {
            CredentialKind::ServerKey => ChannelKind::All,
            CredentialKind::MobileKey => ChannelKind::Flags,
            CredentialKind::EnvironmentID => ChannelKind::Ping,
        }
    }
}

#[derive(Debug, Serialize)]
struct PutPayload<'a> {
    path: &'a str,
    data: Value,
}

#[derive(Debug, Serialize)]
struct PatchPayload<'a> {
    path: &'a str,
    data: &'a Value,
}

#[derive(Debug, Serialize)]
struct DeletePayload<'a> {
    path: &'a str,
    version: u64,
}

/// A broadcastable SSE message. `Heartbeat` renders as a bare comment line
/// (`:`), everything else as a named event with a JSON data line.
#[derive(Debug, Clone)]
pub enum SseEvent {
    Put { path: String, data: Value },
    Patch { path: String, data: Value },
    Delete { path: String, version: u64 },
    Ping,
    Heartbeat,
}

impl SseEvent {
    /// `(event name, data body)` — `event name` is `None` for the
    /// heartbeat comment line, which carries no event/data framing at all.
    pub fn render(&self) -> (Option<&'static str>, String) {
        match self {
            SseEvent::Put { path, data } => {
                let body = serde_json::to_string(&PutPayload { path, data: data.clone() })
                    .expect("put payload must serialize");
                (Some("put"), body)
            }
            SseEvent::Patch { path, data } => {
                let body = serde_json::to_string(&PatchPayload { path, data })
                    .expect("patch payload must serialize");
                (Some("patch"), body)
            }
            SseEvent::Delete { path, version } => {
                let body = serde_json::to_string(&DeletePayload { path, version: *version })
                    .expect("delete payload must serialize");
                (Some("delete"), body)
            }
            // Must contain at least a single-space data line so
            // intermediaries (proxies that drop empty-body SSE frames) do
            // not silently discard it.
            SseEvent::Ping => (Some("ping"), " ".to_string()),
            SseEvent::Heartbeat => (None, String::new()),
        }
    }
}

// FIN DEL ARCHIVO [libs/infra/data-store/src/channel.rs]
