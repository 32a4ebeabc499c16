pub mod adapter;
pub mod channel;
pub mod errors;
pub mod store;

pub use adapter::{BroadcastDataStoreAdapter, EnvStreams};
pub use channel::{ChannelKind, SseEvent};
pub use errors::DataStoreError;
pub use store::{DataStore, InMemoryDataStore};
