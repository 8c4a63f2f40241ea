//! Structured logging helpers.
//!
//! Filter-directive construction for the tracing subscriber, plus small
//! utilities for content-safe request logging.

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level
/// and any component-specific log levels configured in the LoggingConfig.
///
/// # Examples
///
/// ```
/// use verdant::config::LoggingConfig;
/// use verdant::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("selector".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: verdant::config::LogFormat::Pretty,
///     component_levels: Some(component_levels),
///     enable_content_logging: false,
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,verdant::selector=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort(); // Deterministic directive order
        for (component, level) in components {
            filter_str.push_str(&format!(",verdant::{}={}", component, level));
        }
    }

    filter_str
}

/// Truncate task text for log lines, marking the cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}… [truncated]", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_level_only() {
        let config = crate::config::LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn truncation_marks_cut() {
        assert_eq!(truncate_text("short", 10), "short");
        let long = truncate_text("a".repeat(20).as_str(), 10);
        assert!(long.starts_with("aaaaaaaaaa"));
        assert!(long.ends_with("[truncated]"));
    }
}
