//! Request payload assembly
//!
//! Builds the immutable payload handed to the remote caller from a target
//! identity and a query input. Assembly is pure and deterministic; dispatch
//! concerns (ordering, concurrency, cancellation) never appear here.

use bytes::Bytes;

use super::target::TargetIdentity;

/// Recognition model used for audio queries, tuned for short 16 kHz commands
pub const DEFAULT_AUDIO_MODEL: &str = "telephony_short";

/// What each request sends to the agent
///
/// Audio input is expected to be 16 kHz mono LINEAR16. The WAV loader in
/// [`crate::utils::audio`] enforces this at the file boundary; the builder
/// treats it as a precondition and does not re-validate.
#[derive(Debug, Clone)]
pub enum QueryInput {
    /// A text utterance
    Text(String),
    /// Raw audio with its format metadata
    Audio {
        bytes: Bytes,
        sample_rate_hertz: u32,
        encoding: String,
    },
}

impl QueryInput {
    /// Short label for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            QueryInput::Text(_) => "text",
            QueryInput::Audio { .. } => "audio",
        }
    }
}

/// Immutable payload ready for the remote caller
#[derive(Debug, Clone)]
pub struct QueryPayload {
    /// Fully-qualified session resource name
    pub session_path: String,
    /// BCP-47 language code for the query
    pub language_code: String,
    /// The query content
    pub input: QueryInput,
    /// Recognition model for audio queries
    pub audio_model: String,
    /// Synthesis voice for output audio, when the target requests one
    pub voice_tag: Option<String>,
}

/// Assembles payloads for one run
///
/// Carries the run-wide request settings so that `build` is a pure function
/// of the target and input.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    language_code: String,
    audio_model: String,
}

impl RequestBuilder {
    pub fn new(language_code: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            audio_model: DEFAULT_AUDIO_MODEL.to_string(),
        }
    }

    /// Override the recognition model used for audio queries
    pub fn with_audio_model(mut self, model: impl Into<String>) -> Self {
        self.audio_model = model.into();
        self
    }

    /// Produce the payload for one request
    pub fn build(&self, target: &TargetIdentity, input: &QueryInput) -> QueryPayload {
        QueryPayload {
            session_path: target.session_path(),
            language_code: self.language_code.clone(),
            input: input.clone(),
            audio_model: self.audio_model.clone(),
            voice_tag: target.voice_tag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(voice: Option<&str>) -> TargetIdentity {
        TargetIdentity::new("proj", "agent", "us-central1", voice.map(str::to_string))
    }

    #[test]
    fn test_build_text_payload() {
        let builder = RequestBuilder::new("en-US");
        let payload = builder.build(&target(None), &QueryInput::Text("test".into()));

        assert_eq!(payload.language_code, "en-US");
        assert!(payload.session_path.contains("/agents/agent/"));
        assert!(payload.voice_tag.is_none());
        assert!(matches!(payload.input, QueryInput::Text(ref t) if t == "test"));
    }

    #[test]
    fn test_build_audio_payload_carries_format_metadata() {
        let builder = RequestBuilder::new("en-US");
        let input = QueryInput::Audio {
            bytes: Bytes::from_static(&[0, 1, 2, 3]),
            sample_rate_hertz: 16_000,
            encoding: "linear16".into(),
        };
        let payload = builder.build(&target(Some("en-US-Neural2-A")), &input);

        assert_eq!(payload.audio_model, DEFAULT_AUDIO_MODEL);
        assert_eq!(payload.voice_tag.as_deref(), Some("en-US-Neural2-A"));
        match payload.input {
            QueryInput::Audio {
                bytes,
                sample_rate_hertz,
                encoding,
            } => {
                assert_eq!(bytes.len(), 4);
                assert_eq!(sample_rate_hertz, 16_000);
                assert_eq!(encoding, "linear16");
            }
            other => panic!("expected audio input, got {other:?}"),
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = RequestBuilder::new("en-US");
        let t = target(None);
        let input = QueryInput::Text("hello".into());
        let a = builder.build(&t, &input);
        let b = builder.build(&t, &input);
        assert_eq!(a.session_path, b.session_path);
        assert_eq!(a.language_code, b.language_code);
    }
}
