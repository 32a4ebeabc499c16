
pub mod credential;
pub mod environment;
pub mod event;
pub mod flag;

pub use credential::{Credential, CredentialKind, ScopedCredential};
pub use environment::{EnvironmentIdentifiers, EnvironmentParams, ExpiringServerKey};
pub use event::{EventPayloadMetadata, CURRENT_OUTPUT_SCHEMA, SUMMARY_SCHEMA_THRESHOLD};
pub use flag::{AllData, DataKind, FlagItem, SegmentItem, VersionedItem};
