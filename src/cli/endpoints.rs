//! Endpoints command implementation

use crate::cli::output::format_endpoints_table;
use crate::cli::EndpointsArgs;
use crate::config::VerdantConfig;
use crate::registry::{ModelClass, Registry};

/// Handle `endpoints`: show the configured roster.
///
/// Health state shown here is the registration default; live status is
/// served by `GET /api/endpoints` on a running router.
pub fn handle_endpoints(args: &EndpointsArgs) -> anyhow::Result<String> {
    let config = VerdantConfig::load(Some(&args.config)).unwrap_or_default();

    let registry = Registry::new();
    crate::cli::serve::load_endpoints_from_config(&config, &registry);

    let mut views = registry.list_all();
    if let Some(ref class) = args.class {
        let model_class: ModelClass = class
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
        views.retain(|view| view.model_class == model_class);
    }
    views.sort_by(|a, b| a.id.cmp(&b.id));

    if args.json {
        Ok(serde_json::to_string_pretty(&views)?)
    } else {
        Ok(format_endpoints_table(&views))
    }
}
