//! Classifier configuration

use crate::registry::ModelClass;
use serde::{Deserialize, Serialize};

/// Task Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inputs longer than this are rejected before classification
    pub max_input_chars: usize,
    /// Winning share of matched signals below this uses the fallback class
    pub min_confidence: f32,
    /// Class used when no category clears the confidence bar
    pub fallback_class: ModelClass,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 4000,
            min_confidence: 0.25,
            fallback_class: ModelClass::Grammar100m,
        }
    }
}
