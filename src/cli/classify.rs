//! Classify command implementation

use crate::classifier::Classifier;
use crate::cli::ClassifyArgs;
use crate::config::VerdantConfig;
use colored::Colorize;

/// Handle `classify`: run the local classifier and show the routing class
/// without dispatching anything.
pub fn handle_classify(args: &ClassifyArgs) -> anyhow::Result<String> {
    let config = VerdantConfig::load(Some(&args.config)).unwrap_or_default();
    let classifier = Classifier::new(&config.classifier);

    let classification = classifier.classify(&args.text)?;
    let note = if classification.confidence == 0.0 {
        format!(" {}", "(fallback: no category matched)".yellow())
    } else {
        String::new()
    };

    Ok(format!(
        "{} {} (confidence {:.2}){}",
        "model class:".bold(),
        classification.model_class.as_str().green(),
        classification.confidence,
        note
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn classify_args(text: &str) -> ClassifyArgs {
        ClassifyArgs {
            text: text.to_string(),
            config: PathBuf::from("nonexistent.toml"),
        }
    }

    #[test]
    fn classify_prints_class() {
        let output = handle_classify(&classify_args("fix my grammar: i are happy")).unwrap();
        assert!(output.contains("grammar-100m"));
    }

    #[test]
    fn classify_rejects_empty_text() {
        assert!(handle_classify(&classify_args("  ")).is_err());
    }

    #[test]
    fn classify_marks_fallback() {
        let output = handle_classify(&classify_args("zzz qqq xxx")).unwrap();
        assert!(output.contains("fallback"));
    }
}
