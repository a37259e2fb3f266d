//! Target identities and per-request target selection
//!
//! A target identity is one conversational endpoint under test: a
//! (project, agent, location, session) tuple plus an optional synthesis voice.
//! Session ids are generated once per run and reused for every request routed
//! to that target, modelling conversational continuity within a load test.

use std::str::FromStr;
use std::sync::Arc;

use uuid::Uuid;

use crate::errors::ConfigError;

/// One conversational endpoint under test
///
/// Immutable after creation. The session id is minted at construction time
/// and shared by all requests dispatched to this target during the run.
#[derive(Debug, Clone)]
pub struct TargetIdentity {
    /// Google Cloud project that owns the agent
    pub project_id: String,
    /// Dialogflow CX agent id
    pub agent_id: String,
    /// GCP region where the agent is hosted (e.g. "us-central1")
    pub location: String,
    /// Per-run session token, unique to this target
    pub session_id: String,
    /// Synthesis voice requested for output audio (e.g. "en-US-Neural2-A")
    pub voice_tag: Option<String>,
}

impl TargetIdentity {
    /// Create a target identity with a fresh session id
    pub fn new(
        project_id: impl Into<String>,
        agent_id: impl Into<String>,
        location: impl Into<String>,
        voice_tag: Option<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            agent_id: agent_id.into(),
            location: location.into(),
            session_id: Uuid::new_v4().to_string(),
            voice_tag,
        }
    }

    /// Fully-qualified Dialogflow CX session resource name
    pub fn session_path(&self) -> String {
        format!(
            "projects/{}/locations/{}/agents/{}/sessions/{}",
            self.project_id, self.location, self.agent_id, self.session_id
        )
    }
}

/// How request indices map onto the configured targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    /// Alternate between the two configured targets (`index % 2`)
    Alternate,
    /// Route every request to the target at the given index
    Fixed(usize),
}

impl FromStr for TargetMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alternate" => Ok(TargetMode::Alternate),
            "fixed" => Ok(TargetMode::Fixed(0)),
            _ => Err(ConfigError::invalid(format!(
                "Unsupported target mode: {s}. Supported modes: alternate, fixed"
            ))),
        }
    }
}

impl std::fmt::Display for TargetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetMode::Alternate => write!(f, "alternate"),
            TargetMode::Fixed(i) => write!(f, "fixed[{i}]"),
        }
    }
}

/// A validated set of targets together with the selection mode
///
/// Cardinality is checked once at construction so that selection itself is a
/// pure, infallible function of the request index.
#[derive(Debug, Clone)]
pub struct TargetSet {
    targets: Vec<Arc<TargetIdentity>>,
    mode: TargetMode,
}

impl TargetSet {
    /// Validate targets against the selection mode
    ///
    /// `Alternate` requires exactly two targets; `Fixed(i)` requires `i` to
    /// index into the provided targets.
    pub fn new(targets: Vec<TargetIdentity>, mode: TargetMode) -> Result<Self, ConfigError> {
        match mode {
            TargetMode::Alternate if targets.len() != 2 => {
                return Err(ConfigError::invalid(format!(
                    "alternate mode requires exactly 2 targets, got {}",
                    targets.len()
                )));
            }
            TargetMode::Fixed(i) if i >= targets.len() => {
                return Err(ConfigError::invalid(format!(
                    "fixed target index {} out of range for {} target(s)",
                    i,
                    targets.len()
                )));
            }
            _ => {}
        }

        Ok(Self {
            targets: targets.into_iter().map(Arc::new).collect(),
            mode,
        })
    }

    /// Resolve a request index to its target
    ///
    /// Deterministic: the same index always resolves to the same target
    /// within a run.
    pub fn select(&self, index: usize) -> &Arc<TargetIdentity> {
        match self.mode {
            TargetMode::Alternate => &self.targets[index % 2],
            TargetMode::Fixed(i) => &self.targets[i],
        }
    }

    /// Selection mode for this set
    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    /// All configured targets, in declaration order
    pub fn targets(&self) -> &[Arc<TargetIdentity>] {
        &self.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(project: &str) -> TargetIdentity {
        TargetIdentity::new(project, "agent-1", "us-central1", None)
    }

    #[test]
    fn test_session_path_format() {
        let t = TargetIdentity::new("proj", "agent", "us-central1", None);
        let path = t.session_path();
        assert!(path.starts_with("projects/proj/locations/us-central1/agents/agent/sessions/"));
        assert_eq!(path.split('/').count(), 8);
    }

    #[test]
    fn test_session_ids_are_unique_per_target() {
        let a = target("p");
        let b = target("p");
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn test_alternate_selection_is_two_periodic() {
        let set = TargetSet::new(vec![target("a"), target("b")], TargetMode::Alternate).unwrap();
        for i in 0..16 {
            assert_eq!(
                set.select(i).project_id,
                set.select(i + 2).project_id,
                "select must be 2-periodic at index {i}"
            );
        }
        assert_eq!(set.select(0).project_id, "a");
        assert_eq!(set.select(1).project_id, "b");
    }

    #[test]
    fn test_fixed_selection_always_returns_same_target() {
        let set = TargetSet::new(vec![target("a"), target("b")], TargetMode::Fixed(1)).unwrap();
        for i in 0..8 {
            assert_eq!(set.select(i).project_id, "b");
        }
    }

    #[test]
    fn test_alternate_requires_two_targets() {
        let err = TargetSet::new(vec![target("a")], TargetMode::Alternate).unwrap_err();
        assert!(err.to_string().contains("exactly 2 targets"));
    }

    #[test]
    fn test_fixed_index_must_be_in_range() {
        let err = TargetSet::new(vec![target("a")], TargetMode::Fixed(3)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("alternate".parse::<TargetMode>().unwrap(), TargetMode::Alternate);
        assert_eq!("Fixed".parse::<TargetMode>().unwrap(), TargetMode::Fixed(0));
        assert!("roundrobin".parse::<TargetMode>().is_err());
    }
}
