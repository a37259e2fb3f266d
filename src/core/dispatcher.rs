//! Bounded-concurrency dispatcher with cooperative cancellation
//!
//! The dispatcher fans N logical requests out over the configured targets,
//! keeps at most `concurrency_limit` calls in flight, and reacts to the
//! first quota-exhaustion failure by cancelling a shared token so that no
//! further call begins. Already-in-flight calls are never interrupted; the
//! run always drains every unit before reporting.
//!
//! Per-unit lifecycle:
//!
//! ```text
//! Pending -> (Cancelled | WaitingForSlot)
//!         -> (Cancelled | InFlight)
//!         -> (Success | NoMatch | QuotaExceeded | ApiError)
//! ```
//!
//! No retries, no state re-entry. The semaphore permit is held for exactly
//! the duration of the remote call.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::aggregate::{Outcome, OutcomeAggregator, RunSummary};
use super::caller::{AgentCaller, CallFailure};
use super::request::{QueryInput, QueryPayload, RequestBuilder};
use super::target::{TargetIdentity, TargetSet};
use crate::errors::{ConfigError, DispatchError};

/// One unit of work: an index, its resolved target, and the payload to send
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub index: usize,
    pub target: Arc<TargetIdentity>,
    pub payload: QueryPayload,
}

/// Drives one batch of concurrent requests against a remote caller
pub struct Dispatcher {
    caller: Arc<dyn AgentCaller>,
    targets: TargetSet,
    builder: RequestBuilder,
    concurrency_limit: usize,
}

impl Dispatcher {
    /// Create a dispatcher
    ///
    /// Fails fast on invalid configuration: the concurrency limit must be at
    /// least 1. Target-set cardinality is validated by [`TargetSet::new`].
    pub fn new(
        caller: Arc<dyn AgentCaller>,
        targets: TargetSet,
        builder: RequestBuilder,
        concurrency_limit: usize,
    ) -> Result<Self, ConfigError> {
        if concurrency_limit < 1 {
            return Err(ConfigError::invalid(
                "concurrency limit must be at least 1",
            ));
        }
        Ok(Self {
            caller,
            targets,
            builder,
            concurrency_limit,
        })
    }

    /// Run the whole batch and return the aggregated summary
    ///
    /// Returns `Ok` even when every request failed; request-level failures
    /// are data in the summary. `Err` means the dispatch mechanism itself
    /// broke (duplicate outcome, task panic).
    pub async fn run(
        &self,
        total_requests: usize,
        input: QueryInput,
    ) -> Result<RunSummary, DispatchError> {
        let aggregator = Arc::new(OutcomeAggregator::new(total_requests));
        if total_requests == 0 {
            return aggregator.summarize();
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let shutdown = CancellationToken::new();

        info!(
            total_requests,
            concurrency_limit = self.concurrency_limit,
            mode = %self.targets.mode(),
            input = input.kind(),
            "dispatching batch"
        );

        let mut units = JoinSet::new();
        for index in 0..total_requests {
            let target = Arc::clone(self.targets.select(index));
            let payload = self.builder.build(&target, &input);
            let descriptor = RequestDescriptor {
                index,
                target,
                payload,
            };

            let caller = Arc::clone(&self.caller);
            let semaphore = Arc::clone(&semaphore);
            let shutdown = shutdown.clone();
            let aggregator = Arc::clone(&aggregator);
            units.spawn(async move {
                execute_unit(descriptor, caller, semaphore, shutdown, aggregator).await
            });
        }

        // Drain every unit even after a failure so no task outlives the run.
        let mut first_error: Option<DispatchError> = None;
        while let Some(joined) = units.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(join_error) => Err(DispatchError::Join(join_error.to_string())),
            };
            if let Err(error) = result {
                error!(%error, "dispatcher unit failed");
                first_error.get_or_insert(error);
            }
        }
        if let Some(error) = first_error {
            return Err(error);
        }

        let summary = aggregator.summarize()?;
        info!(%summary, "batch complete");
        Ok(summary)
    }
}

/// Execute one unit of work to a terminal outcome
async fn execute_unit(
    descriptor: RequestDescriptor,
    caller: Arc<dyn AgentCaller>,
    semaphore: Arc<Semaphore>,
    shutdown: CancellationToken,
    aggregator: Arc<OutcomeAggregator>,
) -> Result<(), DispatchError> {
    let request_num = descriptor.index + 1;

    // Short-circuit before queueing for a slot.
    if shutdown.is_cancelled() {
        warn!(request = request_num, "shutdown signalled, cancelling before start");
        return aggregator.record(descriptor.index, Outcome::Cancelled);
    }

    let permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        // The semaphore is never closed during a run; treat a closed gate as
        // a late cancellation rather than a hard failure.
        Err(_) => return aggregator.record(descriptor.index, Outcome::Cancelled),
    };

    // The signal may have been set while this unit waited for a slot.
    if shutdown.is_cancelled() {
        drop(permit);
        warn!(request = request_num, "shutdown signalled while waiting for slot, cancelling");
        return aggregator.record(descriptor.index, Outcome::Cancelled);
    }

    debug!(
        request = request_num,
        project = %descriptor.target.project_id,
        agent = %descriptor.target.agent_id,
        "slot acquired, sending request"
    );

    let outcome = match caller.call(&descriptor.payload).await {
        Ok(response) if response.matched => {
            info!(
                request = request_num,
                intent = response.intent.as_deref().unwrap_or("<unnamed>"),
                transcript = response.transcript.as_deref().unwrap_or(""),
                "request succeeded"
            );
            Outcome::Success {
                transcript: response.transcript,
                intent: response.intent,
            }
        }
        Ok(_) => {
            warn!(request = request_num, "request completed without an intent match");
            Outcome::NoMatch
        }
        Err(CallFailure::QuotaExceeded(message)) => {
            error!(request = request_num, %message, "quota exceeded, signalling shutdown");
            // Single point of batch-wide backpressure; idempotent.
            shutdown.cancel();
            Outcome::QuotaExceeded
        }
        Err(CallFailure::Other(message)) => {
            error!(request = request_num, %message, "request failed");
            Outcome::ApiError(message)
        }
    };

    drop(permit);
    aggregator.record(descriptor.index, outcome)
}
