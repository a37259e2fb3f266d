//! Run configuration
//!
//! Builds the [`RunConfig`] from several sources with the priority
//! YAML file > environment variables > `.env` values > defaults. CLI flags
//! are applied on top by the binary. Validation is fail-fast: nothing is
//! dispatched until the whole configuration is coherent.
//!
//! # Example
//! ```rust,no_run
//! use cx_loadtest::config::RunConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = RunConfig::from_env()?;
//!
//! // Load from a YAML file with environment variable fallback
//! let config = RunConfig::from_file(&PathBuf::from("loadtest.yaml"))?;
//!
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

mod yaml;

use yaml::YamlConfig;

use crate::core::target::{TargetIdentity, TargetMode, TargetSet};
use crate::errors::{ConfigError, ConfigResult};

/// Default number of requests per run
pub const DEFAULT_NUM_REQUESTS: usize = 200;

/// Default concurrency ceiling
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;

/// Default GCP region
pub const DEFAULT_LOCATION: &str = "us-central1";

/// Default query language
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Default text utterance
pub const DEFAULT_TEXT: &str = "test";

/// Everything one load-test run needs to know
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Total number of requests to dispatch
    pub num_requests: usize,
    /// Maximum simultaneous in-flight requests
    pub concurrency_limit: usize,
    /// How request indices map onto targets
    pub mode: TargetMode,
    /// GCP region hosting the agents
    pub location: String,
    /// Google Cloud projects owning the agents (one per target)
    pub project_ids: Vec<String>,
    /// Dialogflow CX agent ids (one per target)
    pub agent_ids: Vec<String>,
    /// Synthesis voices per target; empty to skip output audio
    pub voice_tags: Vec<String>,
    /// BCP-47 query language
    pub language: String,
    /// Text utterance sent when no audio file is configured
    pub text: String,
    /// WAV file to send instead of text (16 kHz mono LINEAR16)
    pub audio_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_requests: DEFAULT_NUM_REQUESTS,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            mode: TargetMode::Alternate,
            location: DEFAULT_LOCATION.to_string(),
            project_ids: Vec::new(),
            agent_ids: Vec::new(),
            voice_tags: Vec::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            text: DEFAULT_TEXT.to_string(),
            audio_path: None,
        }
    }
}

impl RunConfig {
    /// Build a configuration from environment variables over defaults
    ///
    /// Recognized variables: `CX_NUM_REQUESTS`, `CX_CONCURRENCY_LIMIT`,
    /// `CX_TARGET_MODE`, `CX_TARGET_INDEX`, `CX_LOCATION`, `CX_PROJECT_IDS`,
    /// `CX_AGENT_IDS`, `CX_VOICE_TAGS` (comma-separated lists),
    /// `CX_LANGUAGE`, `CX_TEXT`, `CX_AUDIO_PATH`.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(value) = env_parsed::<usize>("CX_NUM_REQUESTS")? {
            config.num_requests = value;
        }
        if let Some(value) = env_parsed::<usize>("CX_CONCURRENCY_LIMIT")? {
            config.concurrency_limit = value;
        }
        let mode_name = env_string("CX_TARGET_MODE");
        let target_index = env_parsed::<usize>("CX_TARGET_INDEX")?;
        if mode_name.is_some() || target_index.is_some() {
            config.mode = resolve_mode(mode_name.as_deref(), target_index)?;
        }
        if let Some(value) = env_string("CX_LOCATION") {
            config.location = value;
        }
        if let Some(value) = env_string("CX_PROJECT_IDS") {
            config.project_ids = parse_list(&value);
        }
        if let Some(value) = env_string("CX_AGENT_IDS") {
            config.agent_ids = parse_list(&value);
        }
        if let Some(value) = env_string("CX_VOICE_TAGS") {
            config.voice_tags = parse_list(&value);
        }
        if let Some(value) = env_string("CX_LANGUAGE") {
            config.language = value;
        }
        if let Some(value) = env_string("CX_TEXT") {
            config.text = value;
        }
        if let Some(value) = env_string("CX_AUDIO_PATH") {
            config.audio_path = Some(PathBuf::from(value));
        }

        Ok(config)
    }

    /// Build a configuration from a YAML file, with environment fallback
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let yaml: YamlConfig = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let mut config = Self::from_env()?;
        config.apply_yaml(yaml)?;
        Ok(config)
    }

    /// Overlay YAML values onto this configuration
    fn apply_yaml(&mut self, yaml: YamlConfig) -> ConfigResult<()> {
        if let Some(run) = yaml.run {
            if let Some(value) = run.num_requests {
                self.num_requests = value;
            }
            if let Some(value) = run.concurrency_limit {
                self.concurrency_limit = value;
            }
            if run.mode.is_some() || run.target_index.is_some() {
                self.mode = resolve_mode(run.mode.as_deref(), run.target_index)?;
            }
        }
        if let Some(targets) = yaml.targets {
            if let Some(value) = targets.location {
                self.location = value;
            }
            if let Some(value) = targets.project_ids {
                self.project_ids = value;
            }
            if let Some(value) = targets.agent_ids {
                self.agent_ids = value;
            }
            if let Some(value) = targets.voice_tags {
                self.voice_tags = value;
            }
        }
        if let Some(input) = yaml.input {
            if let Some(value) = input.language {
                self.language = value;
            }
            if let Some(value) = input.text {
                self.text = value;
            }
            if let Some(value) = input.audio_path {
                self.audio_path = Some(value);
            }
        }
        Ok(())
    }

    /// Validate the whole configuration before dispatch
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency_limit < 1 {
            return Err(ConfigError::invalid(
                "concurrency limit must be at least 1",
            ));
        }
        if self.project_ids.is_empty() {
            return Err(ConfigError::Missing(
                "project ids (CX_PROJECT_IDS, targets.project_ids, or --project-ids)".into(),
            ));
        }
        if self.project_ids.len() != self.agent_ids.len() {
            return Err(ConfigError::invalid(format!(
                "{} project id(s) but {} agent id(s); one agent per project is required",
                self.project_ids.len(),
                self.agent_ids.len()
            )));
        }
        if !self.voice_tags.is_empty() && self.voice_tags.len() != self.project_ids.len() {
            return Err(ConfigError::invalid(format!(
                "{} voice tag(s) for {} target(s); provide one per target or none",
                self.voice_tags.len(),
                self.project_ids.len()
            )));
        }
        match self.mode {
            TargetMode::Alternate if self.project_ids.len() != 2 => {
                return Err(ConfigError::invalid(format!(
                    "alternate mode requires exactly 2 targets, got {}",
                    self.project_ids.len()
                )));
            }
            TargetMode::Fixed(i) if i >= self.project_ids.len() => {
                return Err(ConfigError::invalid(format!(
                    "fixed target index {} out of range for {} target(s)",
                    i,
                    self.project_ids.len()
                )));
            }
            _ => {}
        }
        if self.location.is_empty() {
            return Err(ConfigError::Missing("location".into()));
        }
        if self.audio_path.is_none() && self.text.is_empty() {
            return Err(ConfigError::Missing("text utterance or audio file".into()));
        }
        Ok(())
    }

    /// Mint the per-run target identities (fresh session ids) as a validated set
    pub fn build_targets(&self) -> ConfigResult<TargetSet> {
        let targets = self
            .project_ids
            .iter()
            .zip(&self.agent_ids)
            .enumerate()
            .map(|(i, (project, agent))| {
                TargetIdentity::new(
                    project,
                    agent,
                    &self.location,
                    self.voice_tags.get(i).cloned(),
                )
            })
            .collect();
        TargetSet::new(targets, self.mode)
    }
}

/// Parse "alternate"/"fixed" plus the optional fixed index into a mode
///
/// A target index without an explicit mode implies fixed selection.
fn resolve_mode(name: Option<&str>, target_index: Option<usize>) -> ConfigResult<TargetMode> {
    let mode = match name {
        Some(name) => TargetMode::from_str(name)?,
        None => TargetMode::Fixed(0),
    };
    Ok(match (mode, target_index) {
        (TargetMode::Fixed(_), Some(index)) => TargetMode::Fixed(index),
        (mode, _) => mode,
    })
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn env_parsed<T: FromStr>(name: &str) -> ConfigResult<Option<T>> {
    match env_string(name) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::invalid(format!("{name} has an unparseable value: {value}"))),
        None => Ok(None),
    }
}

/// Split a comma-separated list, trimming whitespace and dropping empties
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_target_config() -> RunConfig {
        RunConfig {
            project_ids: vec!["proj-a".into(), "proj-b".into()],
            agent_ids: vec!["agent-a".into(), "agent-b".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.num_requests, 200);
        assert_eq!(config.concurrency_limit, 10);
        assert_eq!(config.mode, TargetMode::Alternate);
        assert_eq!(config.location, "us-central1");
        assert_eq!(config.text, "test");
    }

    #[test]
    fn test_validate_accepts_two_target_alternate() {
        two_target_config().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = RunConfig {
            concurrency_limit: 0,
            ..two_target_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_mismatched_agents() {
        let mut config = two_target_config();
        config.agent_ids.pop();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("one agent per project"));
    }

    #[test]
    fn test_validate_rejects_single_target_alternate() {
        let config = RunConfig {
            project_ids: vec!["proj-a".into()],
            agent_ids: vec!["agent-a".into()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exactly 2 targets"));
    }

    #[test]
    fn test_validate_rejects_partial_voice_tags() {
        let mut config = two_target_config();
        config.voice_tags = vec!["en-US-Standard-A".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_overlay() {
        let yaml: YamlConfig = serde_yaml::from_str(
            r#"
run:
  num_requests: 12
  concurrency_limit: 3
  mode: fixed
  target_index: 1
targets:
  project_ids: [p1, p2]
  agent_ids: [a1, a2]
input:
  text: "hello"
"#,
        )
        .unwrap();

        let mut config = RunConfig::default();
        config.apply_yaml(yaml).unwrap();

        assert_eq!(config.num_requests, 12);
        assert_eq!(config.concurrency_limit, 3);
        assert_eq!(config.mode, TargetMode::Fixed(1));
        assert_eq!(config.project_ids, vec!["p1", "p2"]);
        assert_eq!(config.text, "hello");
        config.validate().unwrap();
    }

    #[test]
    fn test_resolve_mode() {
        assert_eq!(
            resolve_mode(Some("alternate"), None).unwrap(),
            TargetMode::Alternate
        );
        assert_eq!(
            resolve_mode(Some("fixed"), Some(1)).unwrap(),
            TargetMode::Fixed(1)
        );
        // Index is ignored unless the selection is fixed
        assert_eq!(
            resolve_mode(Some("alternate"), Some(1)).unwrap(),
            TargetMode::Alternate
        );
        // An index without a mode implies fixed selection
        assert_eq!(resolve_mode(None, Some(1)).unwrap(), TargetMode::Fixed(1));
        assert!(resolve_mode(Some("bogus"), None).is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_list(""), Vec::<String>::new());
    }

    #[test]
    fn test_build_targets_assigns_voice_per_target() {
        let mut config = two_target_config();
        config.voice_tags = vec!["en-US-Standard-A".into(), "en-US-Neural2-A".into()];
        let set = config.build_targets().unwrap();
        assert_eq!(
            set.select(0).voice_tag.as_deref(),
            Some("en-US-Standard-A")
        );
        assert_eq!(set.select(1).voice_tag.as_deref(), Some("en-US-Neural2-A"));
    }
}
