//! Dialogflow CX sessions client
//!
//! Implements the remote caller against the regional Dialogflow CX gRPC
//! endpoint using tonic for transport and the generated `v3` API messages.
//! One channel is shared by all concurrent requests; tonic multiplexes calls
//! over it.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use google_api_proto::google::cloud::dialogflow::cx::v3 as cx;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Code, Request, Status};
use tracing::{debug, info};

use super::auth::GoogleAuth;
use crate::core::caller::{AgentCaller, CallFailure, ResponseData};
use crate::core::request::{QueryInput, QueryPayload};
use crate::errors::ConfigError;

/// Default connect timeout for the regional endpoint
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Regional Dialogflow endpoint authority (e.g. "us-central1-dialogflow.googleapis.com")
fn endpoint_authority(location: &str) -> String {
    format!("{location}-dialogflow.googleapis.com")
}

/// An agent as returned by `list-agents`
#[derive(Debug, Clone)]
pub struct AgentSummary {
    /// Full resource name (`projects/.../locations/.../agents/...`)
    pub name: String,
    pub display_name: String,
}

/// Production [`AgentCaller`] over the Dialogflow CX Sessions API
pub struct DialogflowCaller {
    channel: Channel,
    auth: GoogleAuth,
}

impl DialogflowCaller {
    /// Connect to the regional endpoint and resolve credentials
    pub async fn connect(location: &str) -> Result<Self, ConfigError> {
        let authority = endpoint_authority(location);
        let uri = format!("https://{authority}:443");

        let tls = ClientTlsConfig::new().domain_name(authority.clone());
        let channel = Endpoint::from_shared(uri.clone())
            .map_err(|e| ConfigError::invalid(format!("invalid endpoint {uri}: {e}")))?
            .tls_config(tls)
            .map_err(|e| ConfigError::invalid(format!("TLS config error: {e}")))?
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect()
            .await
            .map_err(|e| ConfigError::connection(authority.clone(), e))?;

        info!(endpoint = %authority, "connected to Dialogflow CX");

        let auth = GoogleAuth::new()?;
        Ok(Self { channel, auth })
    }

    /// Issue one `DetectIntent` call
    async fn detect_intent(
        &self,
        payload: &QueryPayload,
    ) -> Result<cx::DetectIntentResponse, CallFailure> {
        let mut request = Request::new(build_detect_intent_request(payload));
        self.decorate(&mut request, Some(&payload.session_path))
            .await?;

        let mut client = cx::sessions_client::SessionsClient::new(self.channel.clone());
        let response = client
            .detect_intent(request)
            .await
            .map_err(status_to_failure)?;
        Ok(response.into_inner())
    }

    /// List all agents in a project/location
    ///
    /// Follows pagination until the service stops returning page tokens.
    pub async fn list_agents(
        &self,
        project_id: &str,
        location: &str,
    ) -> Result<Vec<AgentSummary>, CallFailure> {
        let parent = format!("projects/{project_id}/locations/{location}");
        let mut client = cx::agents_client::AgentsClient::new(self.channel.clone());

        let mut agents = Vec::new();
        let mut page_token = String::new();
        loop {
            let mut request = Request::new(cx::ListAgentsRequest {
                parent: parent.clone(),
                page_token: page_token.clone(),
                ..Default::default()
            });
            self.decorate(&mut request, None).await?;

            let response = client
                .list_agents(request)
                .await
                .map_err(status_to_failure)?
                .into_inner();

            agents.extend(response.agents.into_iter().map(|agent| AgentSummary {
                name: agent.name,
                display_name: agent.display_name,
            }));

            if response.next_page_token.is_empty() {
                break;
            }
            page_token = response.next_page_token;
        }

        debug!(%parent, count = agents.len(), "listed agents");
        Ok(agents)
    }

    /// Attach auth and routing metadata to an outgoing request
    async fn decorate<T>(
        &self,
        request: &mut Request<T>,
        session_path: Option<&str>,
    ) -> Result<(), CallFailure> {
        let authorization = self.auth.authorization_value().await?;
        request.metadata_mut().insert(
            "authorization",
            authorization
                .parse()
                .map_err(|_| CallFailure::Other("invalid authorization header value".into()))?,
        );
        if let Some(session) = session_path {
            request.metadata_mut().insert(
                "x-goog-request-params",
                format!("session={session}")
                    .parse()
                    .map_err(|_| CallFailure::Other("invalid request params header".into()))?,
            );
        }
        Ok(())
    }
}

#[async_trait]
impl AgentCaller for DialogflowCaller {
    async fn call(&self, payload: &QueryPayload) -> Result<ResponseData, CallFailure> {
        let response = self.detect_intent(payload).await?;
        Ok(classify_response(response))
    }
}

/// Build the wire request from an assembled payload
fn build_detect_intent_request(payload: &QueryPayload) -> cx::DetectIntentRequest {
    let input = match &payload.input {
        QueryInput::Text(text) => cx::query_input::Input::Text(cx::TextInput {
            text: text.clone(),
        }),
        QueryInput::Audio {
            bytes,
            sample_rate_hertz,
            ..
        } => cx::query_input::Input::Audio(cx::AudioInput {
            config: Some(cx::InputAudioConfig {
                audio_encoding: cx::AudioEncoding::Linear16.into(),
                sample_rate_hertz: *sample_rate_hertz as i32,
                model: payload.audio_model.clone(),
                ..Default::default()
            }),
            audio: Bytes::clone(bytes),
        }),
    };

    // Output audio is only requested when the target specifies a synthesis
    // voice; text-only runs skip the TTS leg entirely.
    let output_audio_config = payload.voice_tag.as_ref().map(|voice| cx::OutputAudioConfig {
        synthesize_speech_config: Some(cx::SynthesizeSpeechConfig {
            voice: Some(cx::VoiceSelectionParams {
                name: voice.clone(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    });

    cx::DetectIntentRequest {
        session: payload.session_path.clone(),
        query_input: Some(cx::QueryInput {
            language_code: payload.language_code.clone(),
            input: Some(input),
        }),
        output_audio_config,
        ..Default::default()
    }
}

/// Reduce a wire response to the match/transcript/intent triple the
/// dispatcher cares about
fn classify_response(response: cx::DetectIntentResponse) -> ResponseData {
    let result = response.query_result.unwrap_or_default();

    let transcript = match result.query {
        Some(cx::query_result::Query::Transcript(transcript)) if !transcript.is_empty() => {
            Some(transcript)
        }
        _ => None,
    };

    let (matched, intent) = match result.r#match {
        Some(matched) => {
            let is_match = matched.match_type() != cx::r#match::MatchType::NoMatch;
            let intent = matched.intent.map(|intent| intent.display_name);
            (is_match, intent)
        }
        None => (false, None),
    };

    ResponseData {
        matched,
        transcript,
        intent,
    }
}

/// Map a gRPC status onto the caller failure taxonomy
///
/// `RESOURCE_EXHAUSTED` is the quota signal that aborts the batch; every
/// other status stays contained in the failing request.
fn status_to_failure(status: Status) -> CallFailure {
    match status.code() {
        Code::ResourceExhausted => CallFailure::QuotaExceeded(status.message().to_string()),
        code => CallFailure::Other(format!("{code:?}: {}", status.message())),
    }
}
