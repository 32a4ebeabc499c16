pub mod dispatcher;
pub mod errors;
pub mod flag_lookup;
pub mod processor;
pub mod publisher;
pub mod summarizer;

pub use dispatcher::{DispatchOutcome, EventDispatcher, SdkKind};
pub use errors::{DispatchError, PublisherError};
pub use flag_lookup::{FlagLookup, NoFlagLookup};
pub use publisher::{HttpEventPublisher, HttpEventPublisherConfig};
pub use summarizer::SummarizingRelay;
