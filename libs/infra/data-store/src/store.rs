// INICIO DEL ARCHIVO [libs/infra/data-store/src/store.rs]
/*!
 * =================================================================
 * APARATO: OPAQUE DATA STORE CONTRACT (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE PORT (ESTRATO L3)
 * RESPONSABILIDAD: CONTRATO MÍNIMO Init/Get/GetAll/Upsert/IsInitialized
 *
 * VISION HIPER-HOLÍSTICA:
 * El trait se define con futuros encajonados manualmente (sin macro
 * async_trait, ausente del stack heredado) para permitir `Arc<dyn
 * DataStore>` homogéneo sobre implementaciones en memoria, Redis,
 * Consul o DynamoDB sin contaminar al adaptador con genéricos.
 * =================================================================
 */

use crate::errors::DataStoreError;
use relay_core_models::{AllData, DataKind, VersionedItem};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The opaque "data store" the broadcast adapter wraps. Implementations are
/// pluggable (in-memory here; Redis/Consul/DynamoDB are non-goals of this
/// workspace — only the contract matters).
pub trait DataStore: Send + Sync {
    fn init(&self, data: AllData) -> BoxFuture<'_, Result<(), DataStoreError>>;

    /// Returns `Ok(true)` iff the write changed stored state (version >
    /// stored version, or key absent). The broadcast contract depends on
    /// this being accurate — see DESIGN NOTES, "Updated boolean".
    fn upsert(
        &self,
        kind: DataKind,
        key: String,
        item: VersionedItem,
    ) -> BoxFuture<'_, Result<bool, DataStoreError>>;

    fn get(&self, kind: DataKind, key: String) -> BoxFuture<'_, Result<Option<VersionedItem>, DataStoreError>>;

    fn get_all(&self) -> BoxFuture<'_, Result<AllData, DataStoreError>>;

    fn is_initialized(&self) -> BoxFuture<'_, Result<bool, DataStoreError>>;

    fn close(&self) -> BoxFuture<'_, Result<(), DataStoreError>>;
}

/// In-memory reference implementation, used by tests and by the
/// demonstration gateway binary.
#[derive(Default)]
pub struct InMemoryDataStore {
    data: RwLock<AllData>,
    initialized: AtomicBool,
    closed: AtomicBool,
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map_for(data: &mut AllData, kind: DataKind) -> &mut std::collections::BTreeMap<String, VersionedItem> {
        match kind {
            DataKind::Flags => &mut data.flags,
            DataKind::Segments => &mut data.segments,
        }
    }

    fn const_map_for(data: &AllData, kind: DataKind) -> &std::collections::BTreeMap<String, VersionedItem> {
        match kind {
            DataKind::Flags => &data.flags,
            DataKind::Segments => &data.segments,
        }
    }
}

impl DataStore for InMemoryDataStore {
    fn init(&self, data: AllData) -> BoxFuture<'_, Result<(), DataStoreError>> {
        Box::pin(async move {
            if self.closed.load(Ordering::SeqCst) {
                return Err(DataStoreError::Closed);
            }
            *self.data.write().await = data;
            self.initialized.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn upsert(
        &self,
        kind: DataKind,
        key: String,
        item: VersionedItem,
    ) -> BoxFuture<'_, Result<bool, DataStoreError>> {
        Box::pin(async move {
            if self.closed.load(Ordering::SeqCst) {
                return Err(DataStoreError::Closed);
            }
            let mut data = self.data.write().await;
            let map = Self::map_for(&mut data, kind);
            let updated = match map.get(&key) {
                Some(existing) if existing.version >= item.version => false,
                _ => {
                    map.insert(key, item);
                    true
                }
            };
            Ok(updated)
        })
    }

    fn get(&self, kind: DataKind, key: String) -> BoxFuture<'_, Result<Option<VersionedItem>, DataStoreError>> {
        Box::pin(async move {
            let data = self.data.read().await;
            Ok(Self::const_map_for(&data, kind).get(&key).cloned())
        })
    }

    fn get_all(&self) -> BoxFuture<'_, Result<AllData, DataStoreError>> {
        Box::pin(async move { Ok(self.data.read().await.clone()) })
    }

    fn is_initialized(&self) -> BoxFuture<'_, Result<bool, DataStoreError>> {
        Box::pin(async move { Ok(self.initialized.load(Ordering::SeqCst)) })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), DataStoreError>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}

// FIN DEL ARCHIVO [libs/infra/data-store/src/store.rs]
