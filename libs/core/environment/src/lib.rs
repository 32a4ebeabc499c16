// INICIO DEL ARCHIVO [libs/core/environment/src/lib.rs]
pub mod config;
pub mod context;
pub mod errors;
pub mod registry;

pub use config::{EnvConfig, EventsConfig, MainConfig, ProxyConfig};
pub use context::{BigSegmentStore, CredentialUpdate, EnvironmentContext, EnvironmentRuntimeConfig, FlagEvaluator};
pub use errors::RelayError;
pub use registry::{EnvironmentRegistry, NullEnvironmentRegistry};
// FIN DEL ARCHIVO [libs/core/environment/src/lib.rs]
