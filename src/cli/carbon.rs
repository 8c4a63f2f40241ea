//! Carbon command implementation

use crate::api::RankingEntry;
use crate::cli::output::format_rankings_table;
use crate::cli::CarbonArgs;
use crate::cli::serve::build_carbon_cache;
use crate::config::VerdantConfig;

/// Handle `carbon`: one-shot feed refresh, then print the rankings.
pub async fn handle_carbon(args: &CarbonArgs) -> anyhow::Result<String> {
    let config = VerdantConfig::load(Some(&args.config)).unwrap_or_default();
    let cache = build_carbon_cache(&config);

    let refreshed = cache.refresh().await;
    if refreshed == 0 {
        anyhow::bail!(
            "no region could be refreshed; check network access and the {} environment variable",
            config.carbon.api_key_env
        );
    }

    let rankings: Vec<RankingEntry> = cache
        .rankings()
        .into_iter()
        .enumerate()
        .map(|(i, score)| RankingEntry {
            rank: i + 1,
            stale: cache.is_stale(&score),
            region: score.region,
            g_co2_per_kwh: score.g_co2_per_kwh,
            renewable_percent: score.renewable_percent,
            observed_at: score.observed_at,
        })
        .collect();

    if args.json {
        Ok(serde_json::to_string_pretty(&rankings)?)
    } else {
        Ok(format_rankings_table(&rankings))
    }
}
