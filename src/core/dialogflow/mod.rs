//! Dialogflow CX collaborator
//!
//! Production implementation of the remote caller interface over the
//! Dialogflow CX `Sessions.DetectIntent` gRPC API, plus the agent-listing
//! helper used by the `list-agents` subcommand.
//!
//! ## Authentication
//!
//! Uses Application Default Credentials. Point
//! `GOOGLE_APPLICATION_CREDENTIALS` at a service-account JSON file, or rely
//! on gcloud user credentials / the metadata server.
//!
//! ## Endpoint
//!
//! Agents are regional; the client connects to
//! `{location}-dialogflow.googleapis.com:443` and multiplexes all concurrent
//! calls over a single TLS channel.

mod auth;
mod client;

pub use auth::GoogleAuth;
pub use client::{AgentSummary, DialogflowCaller};
