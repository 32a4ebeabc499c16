// INICIO DEL ARCHIVO [libs/infra/data-store/src/adapter.rs]
/*!
 * =================================================================
 * APARATO: BROADCAST DATA STORE ADAPTER (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE SERVICE (ESTRATO L3)
 * RESPONSABILIDAD: TRANSFORMAR CADA ESCRITURA DEL STORE EN EVENTOS SSE
 *                   SOBRE LOS CANALES CORRESPONDIENTES
 *
 * VISION HIPER-HOLÍSTICA:
 * El evento SSE se emite de forma síncrona dentro de la misma llamada
 * a Upsert, justo después de que el store envuelto confirme el cambio.
 * Esto preserva la garantía de orden: el evento nunca precede
 * a la mutación, y nunca se intercala con una mutación posterior de
 * la misma clave, porque ambas ocurren bajo el mismo await secuencial.
 * =================================================================
 */

use crate::channel::{ChannelKind, SseEvent};
use crate::errors::DataStoreError;
use crate::store::DataStore;
use relay_core_models::{AllData, DataKind, VersionedItem};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, trace};

const BROADCAST_CHANNEL_CAPACITY: usize = 1024;

/// Holds the three logical broadcast senders for one environment. Shared
/// (`Arc`) between the adapter and every SSE handler task that subscribes
/// on behalf of an inbound connection.
pub struct EnvStreams {
    all: broadcast::Sender<SseEvent>,
    flags: broadcast::Sender<SseEvent>,
    ping: broadcast::Sender<SseEvent>,
}

impl Default for EnvStreams {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvStreams {
    pub fn new() -> Self {
        Self {
            all: broadcast::channel(BROADCAST_CHANNEL_CAPACITY).0,
            flags: broadcast::channel(BROADCAST_CHANNEL_CAPACITY).0,
            ping: broadcast::channel(BROADCAST_CHANNEL_CAPACITY).0,
        }
    }

    fn sender(&self, kind: ChannelKind) -> &broadcast::Sender<SseEvent> {
        match kind {
            ChannelKind::All => &self.all,
            ChannelKind::Flags => &self.flags,
            ChannelKind::Ping => &self.ping,
        }
    }

    pub fn subscribe(&self, kind: ChannelKind) -> broadcast::Receiver<SseEvent> {
        self.sender(kind).subscribe()
    }

    /// Publishing with zero subscribers is the common case (no SDK
    /// currently connected) and is not an error.
    fn publish(&self, kind: ChannelKind, event: SseEvent) {
        if self.sender(kind).send(event).is_err() {
            trace!(?kind, "no subscribers on channel; event dropped");
        }
    }
}

fn path_for(kind: DataKind, key: &str) -> String {
    format!("/{}/{}", kind.path_segment(), key)
}

/// Wraps an opaque `DataStore` and an `EnvStreams`, turning every
/// successful write into the SSE events the external SDK streaming
/// endpoints replay to connected clients.
pub struct BroadcastDataStoreAdapter {
    inner: Arc<dyn DataStore>,
    streams: Arc<EnvStreams>,
    closed: AtomicBool,
}

impl BroadcastDataStoreAdapter {
    pub fn new(inner: Arc<dyn DataStore>, streams: Arc<EnvStreams>) -> Self {
        Self { inner, streams, closed: AtomicBool::new(false) }
    }

    pub fn streams(&self) -> Arc<EnvStreams> {
        Arc::clone(&self.streams)
    }

    pub async fn init(&self, data: AllData) -> Result<(), DataStoreError> {
        self.inner.init(data.clone()).await?;

        self.streams.publish(
            ChannelKind::All,
            SseEvent::Put { path: "/".into(), data: serde_json::to_value(&data).expect("AllData serializes") },
        );
        self.streams.publish(
            ChannelKind::Flags,
            SseEvent::Put { path: "/".into(), data: serde_json::to_value(&data.flags).expect("flags serialize") },
        );
        self.streams.publish(ChannelKind::Ping, SseEvent::Ping);

        Ok(())
    }

    pub async fn upsert(
        &self,
        kind: DataKind,
        key: String,
        item: VersionedItem,
    ) -> Result<bool, DataStoreError> {
        let updated = self.inner.upsert(kind, key.clone(), item.clone()).await?;
        if !updated {
            // StaleUpdate: silently ignored, no SSE emitted.
            return Ok(false);
        }

        let all_path = path_for(kind, &key);
        let event = if item.is_tombstone() {
            SseEvent::Delete { path: all_path.clone(), version: item.version }
        } else {
            SseEvent::Patch {
                path: all_path.clone(),
                data: serde_json::to_value(&item).expect("item serializes"),
            }
        };
        self.streams.publish(ChannelKind::All, event);

        if kind == DataKind::Flags {
            let flags_path = format!("/{key}");
            let event = if item.is_tombstone() {
                SseEvent::Delete { path: flags_path, version: item.version }
            } else {
                SseEvent::Patch { path: flags_path, data: serde_json::to_value(&item).expect("item serializes") }
            };
            self.streams.publish(ChannelKind::Flags, event);
        }

        self.streams.publish(ChannelKind::Ping, SseEvent::Ping);

        Ok(true)
    }

    pub async fn get(&self, kind: DataKind, key: String) -> Result<Option<VersionedItem>, DataStoreError> {
        self.inner.get(kind, key).await
    }

    pub async fn get_all(&self) -> Result<AllData, DataStoreError> {
        self.inner.get_all().await
    }

    pub async fn is_initialized(&self) -> Result<bool, DataStoreError> {
        self.inner.is_initialized().await
    }

    pub async fn close(&self) -> Result<(), DataStoreError> {
        self.closed.store(true, Ordering::SeqCst);
        self.inner.close().await
    }

    /// Synthesizes the initial event a late subscriber on `kind` should
    /// receive, reading a snapshot via `GetAll`. Read errors are logged and
    /// produce no event — the client must tolerate missing initial data.
    pub async fn replay(&self, kind: ChannelKind) -> Option<SseEvent> {
        let snapshot = match self.inner.get_all().await {
            Ok(snapshot) => snapshot,
            Err(fault) => {
                error!(error = %fault, ?kind, "replay snapshot read failed");
                return None;
            }
        };

        Some(match kind {
            ChannelKind::All => SseEvent::Put {
                path: "/".into(),
                data: serde_json::to_value(&snapshot).expect("AllData serializes"),
            },
            ChannelKind::Flags => SseEvent::Put {
                path: "/".into(),
                data: serde_json::to_value(&snapshot.flags).expect("flags serialize"),
            },
            ChannelKind::Ping => SseEvent::Ping,
        })
    }

    /// Spawns the heartbeat daemon: one comment-line tick per interval on
    /// every owned channel, so intermediaries do not close idle SSE
    /// connections. Stops when `stop` resolves.
    pub fn spawn_heartbeat(self: Arc<Self>, interval: Duration, mut stop: tokio::sync::oneshot::Receiver<()>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.streams.publish(ChannelKind::All, SseEvent::Heartbeat);
                        self.streams.publish(ChannelKind::Flags, SseEvent::Heartbeat);
                        self.streams.publish(ChannelKind::Ping, SseEvent::Heartbeat);
                    }
                    _ = &mut stop => {
                        trace!("heartbeat loop received stop signal");
                        break;
                    }
                }
            }
        });
    }
}

// FIN DEL ARCHIVO [libs/infra/data-store/src/adapter.rs]
