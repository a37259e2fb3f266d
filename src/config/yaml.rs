use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration; anything left
/// unset falls back to environment variables and then defaults.
///
/// # Example YAML structure
/// ```yaml
/// run:
///   num_requests: 200
///   concurrency_limit: 10
///   mode: alternate
///   target_index: 0
///
/// targets:
///   location: "us-central1"
///   project_ids:
///     - "load-test-standard"
///     - "load-test-neural2"
///   agent_ids:
///     - "663759f3-d235-481d-8b5f-0e5f3fa8dd68"
///     - "627f6101-e1e6-4871-92dd-e1be42b51afe"
///   voice_tags:
///     - "en-US-Standard-A"
///     - "en-US-Neural2-A"
///
/// input:
///   language: "en-US"
///   text: "test"
///   audio_path: "./test_16khz.wav"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub run: Option<RunYaml>,
    pub targets: Option<TargetsYaml>,
    pub input: Option<InputYaml>,
}

/// Batch sizing and selection mode from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RunYaml {
    pub num_requests: Option<usize>,
    pub concurrency_limit: Option<usize>,
    /// "alternate" or "fixed"
    pub mode: Option<String>,
    /// Target index used when mode is "fixed"
    pub target_index: Option<usize>,
}

/// Agents under test from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TargetsYaml {
    pub location: Option<String>,
    pub project_ids: Option<Vec<String>>,
    pub agent_ids: Option<Vec<String>>,
    pub voice_tags: Option<Vec<String>>,
}

/// Query input from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct InputYaml {
    pub language: Option<String>,
    pub text: Option<String>,
    pub audio_path: Option<PathBuf>,
}
