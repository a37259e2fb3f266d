//! Remote caller interface
//!
//! The dispatcher drives the remote service exclusively through the
//! [`AgentCaller`] trait: one structured payload in, one typed result or
//! typed failure out. The production implementation lives in
//! [`crate::core::dialogflow`]; tests substitute instrumented mocks.

use async_trait::async_trait;
use thiserror::Error;

use super::request::QueryPayload;

/// Structured result of one successful remote call
#[derive(Debug, Clone)]
pub struct ResponseData {
    /// Whether the agent matched an intent for this query
    pub matched: bool,
    /// Speech-to-text transcript, present for audio queries
    pub transcript: Option<String>,
    /// Display name of the matched intent
    pub intent: Option<String>,
}

/// Typed failure of one remote call
///
/// `QuotaExceeded` is the only variant with batch-wide consequences: the
/// dispatcher reacts to it by signalling shutdown. Everything else stays
/// contained in the failing request's outcome.
#[derive(Error, Debug)]
pub enum CallFailure {
    /// The service reported resource exhaustion (rate/quota limiting)
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Any other request-level failure
    #[error("API error: {0}")]
    Other(String),
}

/// One opaque network call against the conversational agent service
///
/// Implementations must be safe for concurrent invocation from many tasks;
/// the dispatcher shares a single caller across the whole batch.
#[async_trait]
pub trait AgentCaller: Send + Sync {
    async fn call(&self, payload: &QueryPayload) -> Result<ResponseData, CallFailure>;
}
