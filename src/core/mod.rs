pub mod aggregate;
pub mod caller;
pub mod dialogflow;
pub mod dispatcher;
pub mod request;
pub mod target;

// Re-export commonly used types for convenience
pub use aggregate::{Outcome, OutcomeAggregator, RunSummary};
pub use caller::{AgentCaller, CallFailure, ResponseData};
pub use dialogflow::{AgentSummary, DialogflowCaller, GoogleAuth};
pub use dispatcher::{Dispatcher, RequestDescriptor};
pub use request::{DEFAULT_AUDIO_MODEL, QueryInput, QueryPayload, RequestBuilder};
pub use target::{TargetIdentity, TargetMode, TargetSet};
