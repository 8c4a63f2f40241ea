//! Output formatting helpers for CLI commands

use crate::api::RankingEntry;
use crate::registry::{EndpointStatus, EndpointView};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

/// Format endpoints as a table
pub fn format_endpoints_table(endpoints: &[EndpointView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Class", "Region", "URL", "Status", "In-flight"]);

    for endpoint in endpoints {
        let status_str = match endpoint.status {
            EndpointStatus::Healthy => "Healthy".green().to_string(),
            EndpointStatus::Degraded => "Degraded".yellow().to_string(),
            EndpointStatus::Unavailable => "Unavailable".red().to_string(),
        };

        table.add_row(vec![
            Cell::new(&endpoint.id),
            Cell::new(endpoint.model_class.as_str()),
            Cell::new(&endpoint.region),
            Cell::new(&endpoint.base_url),
            Cell::new(status_str),
            Cell::new(format!(
                "{}/{}",
                endpoint.in_flight, endpoint.max_concurrency
            )),
        ]);
    }

    table.to_string()
}

/// Format carbon rankings as a table, greenest first
pub fn format_rankings_table(rankings: &[RankingEntry]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Rank",
        "Region",
        "gCO2/kWh",
        "Renewable %",
        "Observed",
    ]);

    for entry in rankings {
        let region = if entry.stale {
            format!("{} {}", entry.region, "(stale)".yellow())
        } else {
            entry.region.clone()
        };

        table.add_row(vec![
            Cell::new(entry.rank),
            Cell::new(region),
            Cell::new(format!("{:.1}", entry.g_co2_per_kwh)),
            Cell::new(format!("{:.1}", entry.renewable_percent)),
            Cell::new(entry.observed_at.format("%Y-%m-%d %H:%M UTC")),
        ]);
    }

    table.to_string()
}
