//! Model identifier resolution
//!
//! The provider selects the generation model by a fully-qualified resource
//! name. A raw model id is turned into a foundation-model resource name; when
//! the provider rejects that, a fixed list of alternatives is tried in order.
//! The list is computed once, up front, and drives a small state machine:
//!
//! ```text
//! Resolving -> Attempting -> Succeeded
//!                  |
//!                  +-------> Exhausted
//! ```

use crate::config::{EngineConfig, ModelAlternative};
use std::fmt;

pub const RESOURCE_PREFIX: &str = "arn:aws:bedrock:";
const INFERENCE_PROFILE_MARKER: &str = ":inference-profile/";
const FOUNDATION_MODEL_MARKER: &str = ":foundation-model/";

/// Geographic prefixes of cross-region inference profile ids
const PROFILE_GEO_PREFIXES: &[&str] = &["us.", "eu.", "apac.", "us-gov.", "jp.", "au.", "global."];

/// Identifier handed to the provider to pick the generation model
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelIdentifier {
    /// `arn:aws:bedrock:<region>::foundation-model/<model-id>`
    FoundationModel(String),
    /// Resource name of an inference profile
    InferenceProfile(String),
    /// Any other fully-qualified resource name
    Resource(String),
}

impl ModelIdentifier {
    /// Synthesize the foundation-model resource name, version suffix included
    pub fn foundation_model(region: &str, model_id: &str) -> Self {
        Self::FoundationModel(format!(
            "{}{}::foundation-model/{}",
            RESOURCE_PREFIX, region, model_id
        ))
    }

    /// Classify an already fully-qualified resource name
    pub fn from_resource(name: &str) -> Option<Self> {
        if !name.starts_with(RESOURCE_PREFIX) {
            return None;
        }
        Some(if name.contains(INFERENCE_PROFILE_MARKER) {
            Self::InferenceProfile(name.to_string())
        } else if name.contains(FOUNDATION_MODEL_MARKER) {
            Self::FoundationModel(name.to_string())
        } else {
            Self::Resource(name.to_string())
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::FoundationModel(s) | Self::InferenceProfile(s) | Self::Resource(s) => s,
        }
    }

    pub fn is_inference_profile(&self) -> bool {
        matches!(self, Self::InferenceProfile(_))
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the model identifier and enumerates alternatives. Performs no I/O.
#[derive(Debug, Clone)]
pub struct ModelResolver {
    configured: String,
    region: String,
    alternatives: Vec<ModelAlternative>,
}

impl ModelResolver {
    pub fn new(
        configured_model_id: impl Into<String>,
        region: impl Into<String>,
        alternatives: Vec<ModelAlternative>,
    ) -> Self {
        Self {
            configured: configured_model_id.into().trim().to_string(),
            region: region.into(),
            alternatives,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.model_id.clone(),
            config.region.clone(),
            config.model_alternatives.clone(),
        )
    }

    pub fn configured(&self) -> &str {
        &self.configured
    }

    /// Identifier for the first attempt
    pub fn resolve(&self) -> ModelIdentifier {
        match ModelIdentifier::from_resource(&self.configured) {
            Some(id) => {
                if id.is_inference_profile() {
                    tracing::warn!(
                        "Inference profile {} configured; a foundation-model identifier may be substituted if the provider rejects it",
                        id
                    );
                } else {
                    tracing::debug!("Using provided model resource name: {}", id);
                }
                id
            }
            None => {
                let id = ModelIdentifier::foundation_model(&self.region, &self.configured);
                tracing::debug!("Constructed foundation model identifier: {}", id);
                id
            }
        }
    }

    /// The plain model id behind the configured value.
    ///
    /// For resource names this is the trailing path segment, with any
    /// cross-region geo prefix of an inference profile removed.
    fn base_model_id(&self) -> String {
        if !self.configured.starts_with(RESOURCE_PREFIX) {
            return self.configured.clone();
        }
        let tail = self
            .configured
            .rsplit('/')
            .next()
            .unwrap_or(&self.configured);
        if self.configured.contains(INFERENCE_PROFILE_MARKER) {
            for prefix in PROFILE_GEO_PREFIXES {
                if let Some(stripped) = tail.strip_prefix(prefix) {
                    return stripped.to_string();
                }
            }
        }
        tail.to_string()
    }

    /// Ordered, deduplicated alternatives to try after `first_tried` is rejected
    pub fn candidates(&self, first_tried: &ModelIdentifier) -> Vec<ModelIdentifier> {
        let base = self.base_model_id();
        let mut proposals = Vec::new();

        // Canonical foundation-model form
        proposals.push(ModelIdentifier::foundation_model(&self.region, &base));

        // Known-good siblings of the configured family
        let lower = base.to_lowercase();
        for alt in &self.alternatives {
            if lower.contains(&alt.family.to_lowercase()) && alt.model_id != base {
                proposals.push(ModelIdentifier::foundation_model(&self.region, &alt.model_id));
            }
        }

        // Version suffix stripped
        if let Some((stem, _)) = base.split_once(':') {
            if !stem.is_empty() {
                proposals.push(ModelIdentifier::foundation_model(&self.region, stem));
            }
        }

        let mut seen = vec![first_tried.as_str().to_string()];
        proposals.retain(|id| {
            if seen.iter().any(|s| s == id.as_str()) {
                false
            } else {
                seen.push(id.as_str().to_string());
                true
            }
        });
        proposals
    }

    /// First alternative not yet attempted, if any
    pub fn next_alternative(&self, previous_attempts: &[ModelIdentifier]) -> Option<ModelIdentifier> {
        let first = previous_attempts.first().cloned().unwrap_or_else(|| self.resolve());
        self.candidates(&first)
            .into_iter()
            .find(|candidate| !previous_attempts.contains(candidate))
    }

    /// Resolution plan for one query call
    pub fn plan(&self) -> ResolutionPlan {
        let initial = self.resolve();
        let candidates = self.candidates(&initial);
        ResolutionPlan {
            initial,
            candidates,
            attempted: Vec::new(),
            state: ResolutionState::Resolving,
        }
    }
}

/// Where a resolution plan stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Resolving,
    Attempting {
        current: ModelIdentifier,
        /// 0 is the initial identifier, 1.. are alternatives
        index: usize,
    },
    Succeeded(ModelIdentifier),
    Exhausted,
}

/// Sequential walk over the initial identifier and its alternatives
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    initial: ModelIdentifier,
    candidates: Vec<ModelIdentifier>,
    attempted: Vec<ModelIdentifier>,
    state: ResolutionState,
}

impl ResolutionPlan {
    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    pub fn attempted(&self) -> &[ModelIdentifier] {
        &self.attempted
    }

    pub fn candidates(&self) -> &[ModelIdentifier] {
        &self.candidates
    }

    /// Begin with the initial identifier
    pub fn start(&mut self) -> ModelIdentifier {
        let current = self.initial.clone();
        self.attempted.push(current.clone());
        self.state = ResolutionState::Attempting {
            current: current.clone(),
            index: 0,
        };
        current
    }

    /// The current identifier was rejected; move to the next one or exhaust
    pub fn record_failure(&mut self) -> Option<ModelIdentifier> {
        let index = match &self.state {
            ResolutionState::Attempting { index, .. } => *index,
            _ => return None,
        };

        match self.candidates.get(index) {
            Some(next) => {
                let next = next.clone();
                self.attempted.push(next.clone());
                self.state = ResolutionState::Attempting {
                    current: next.clone(),
                    index: index + 1,
                };
                Some(next)
            }
            None => {
                self.state = ResolutionState::Exhausted;
                None
            }
        }
    }

    /// The current identifier was accepted
    pub fn record_success(&mut self) -> Option<ModelIdentifier> {
        match std::mem::replace(&mut self.state, ResolutionState::Resolving) {
            ResolutionState::Attempting { current, .. } => {
                self.state = ResolutionState::Succeeded(current.clone());
                Some(current)
            }
            other => {
                self.state = other;
                None
            }
        }
    }
}
