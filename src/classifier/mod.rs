//! Task Classifier module.
//!
//! Maps raw task text to the model class that should handle it, using
//! lexical signals only: no network, no model call, deterministic for
//! identical input. Every request must be routable, so low-confidence
//! input falls back to a configured default class instead of failing.

use crate::config::ClassifierConfig;
use crate::registry::ModelClass;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that reject input before classification.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("input is empty")]
    EmptyInput,

    #[error("input too large: {size} chars (limit {limit})")]
    InputTooLarge { size: usize, limit: usize },
}

/// Result of classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub model_class: ModelClass,
    /// Share of matched signals belonging to the winning class, 0.0-1.0.
    /// 0.0 means nothing matched and the fallback class was used.
    pub confidence: f32,
}

/// Single-word keywords are matched against the token set; multi-word
/// phrases against the lowercased text. Order is the tie-break: earlier
/// classes win equal scores, which keeps classification deterministic.
const RULES: &[(ModelClass, &[&str])] = &[
    (
        ModelClass::Grammar100m,
        &[
            "grammar", "typo", "typos", "correct", "fix", "proofread", "spelling", "punctuation",
            "grammatical",
        ],
    ),
    (
        ModelClass::Email7b,
        &[
            "email", "draft", "compose", "reply", "write to", "message to", "follow up with",
            "dear",
        ],
    ),
    (
        ModelClass::Summarize1b,
        &[
            "summarize", "summarise", "summary", "tldr", "shorten", "condense", "key points",
            "main points",
        ],
    ),
    (
        ModelClass::Search7b,
        &[
            "search", "find", "what", "how", "who", "when", "where", "why", "look up", "explain",
        ],
    ),
    (
        ModelClass::Classify100m,
        &[
            "classify", "categorize", "label", "sentiment", "tag", "which category",
            "spam or not",
        ],
    ),
    (
        ModelClass::Format100m,
        &[
            "format", "reformat", "bullet", "bullets", "table", "markdown", "convert to",
            "rewrite as",
        ],
    ),
];

/// Lexical task classifier. Cheap to construct, cheap to call.
pub struct Classifier {
    max_input_chars: usize,
    min_confidence: f32,
    fallback: ModelClass,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            max_input_chars: config.max_input_chars,
            min_confidence: config.min_confidence,
            fallback: config.fallback_class,
        }
    }

    /// Classify task text into a model class.
    ///
    /// Pure function of the input and the static rules. Rejects empty and
    /// oversized input; never fails for routable text.
    pub fn classify(&self, text: &str) -> Result<Classification, ClassifyError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }
        let size = trimmed.chars().count();
        if size > self.max_input_chars {
            return Err(ClassifyError::InputTooLarge {
                size,
                limit: self.max_input_chars,
            });
        }

        let lowered = trimmed.to_lowercase();
        let tokens: HashSet<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut best = self.fallback;
        let mut best_score = 0u32;
        let mut total_score = 0u32;

        for (class, keywords) in RULES {
            let mut score = 0u32;
            for keyword in *keywords {
                let hit = if keyword.contains(' ') {
                    lowered.contains(keyword)
                } else {
                    tokens.contains(keyword)
                };
                if hit {
                    score += 1;
                }
            }
            // Interrogative shape is a strong lookup signal on its own.
            if *class == ModelClass::Search7b && lowered.ends_with('?') {
                score += 1;
            }
            total_score += score;
            if score > best_score {
                best_score = score;
                best = *class;
            }
        }

        if best_score == 0 {
            return Ok(Classification {
                model_class: self.fallback,
                confidence: 0.0,
            });
        }

        let confidence = best_score as f32 / total_score as f32;
        if confidence < self.min_confidence {
            tracing::debug!(
                winner = %best,
                confidence,
                "Classification below confidence threshold, using fallback class"
            );
            return Ok(Classification {
                model_class: self.fallback,
                confidence,
            });
        }

        Ok(Classification {
            model_class: best,
            confidence,
        })
    }
}
