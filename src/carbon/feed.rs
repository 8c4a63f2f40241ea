//! Grid carbon-intensity feed client.
//!
//! Pulls hourly generation-by-fuel-type data from an EIA-v2-style API, one
//! balancing authority per grid region, and converts the fuel mix into a
//! single gCO2/kWh figure using EPA eGRID emission factors.

use super::error::FeedError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// One observation pulled from the feed for a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedReading {
    /// Grid carbon intensity in grams CO2-equivalent per kWh
    pub g_co2_per_kwh: f64,
    /// Share of generation from renewable sources, 0-100
    pub renewable_percent: f64,
}

/// Read-only signal source for per-region carbon intensity.
///
/// The cache is the only consumer; implementations must not cache
/// internally (staleness accounting lives in [`super::CarbonCache`]).
#[async_trait]
pub trait CarbonFeed: Send + Sync + 'static {
    /// Fetch the current reading for one grid region.
    async fn fetch(&self, region: &str) -> Result<FeedReading, FeedError>;
}

/// EPA eGRID emission factor for a fuel code, in lbs CO2 per MWh.
///
/// Codes follow the EIA API fuel-type vocabulary; unknown fuels get a
/// conservative mid-range estimate rather than zero.
fn emission_factor(fuel: &str) -> f64 {
    match fuel {
        "col" | "coal" => 2249.0,
        "pet" | "oil" => 1672.0,
        "ng" | "gas" | "natural_gas" => 898.0,
        "bio" | "biomass" => 230.0,
        "nuc" | "nuclear" | "wat" | "hydro" | "ps" | "wnd" | "wind" | "sun" | "solar" | "geo"
        | "geothermal" | "bat" => 0.0,
        _ => 500.0,
    }
}

fn is_renewable(fuel: &str) -> bool {
    matches!(
        fuel,
        "wnd" | "wind" | "sun" | "solar" | "wat" | "hydro" | "ps" | "geo" | "geothermal" | "bio"
            | "biomass"
    )
}

#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    response: FeedBody,
}

#[derive(Debug, Deserialize)]
struct FeedBody {
    #[serde(default)]
    data: Vec<FeedRecord>,
}

#[derive(Debug, Deserialize)]
struct FeedRecord {
    #[serde(default)]
    fueltype: Option<String>,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    value: Option<f64>,
}

/// Convert a batch of hourly generation records into one [`FeedReading`].
///
/// Records span multiple hours; only the most recent period per fuel type
/// counts. Intensity is the generation-weighted emission factor, converted
/// from lbs/MWh to g/kWh (1 lb = 453.592 g, 1 MWh = 1000 kWh).
fn reading_from_records(records: &[FeedRecord]) -> Result<FeedReading, FeedError> {
    let mut latest: HashMap<String, (String, f64)> = HashMap::new();
    for record in records {
        let fuel = record
            .fueltype
            .as_deref()
            .unwrap_or("unknown")
            .to_lowercase()
            .replace('-', "_");
        let period = record.period.clone().unwrap_or_default();
        let generation = record.value.unwrap_or(0.0);

        match latest.get(&fuel) {
            Some((existing_period, _)) if *existing_period >= period => {}
            _ => {
                latest.insert(fuel, (period, generation));
            }
        }
    }

    let total: f64 = latest.values().map(|(_, mwh)| mwh).sum();
    if total <= 0.0 {
        return Err(FeedError::ParseError(
            "zero total generation in feed data".to_string(),
        ));
    }

    let mut weighted_lbs_per_mwh = 0.0;
    let mut renewable_mwh = 0.0;
    for (fuel, (_, mwh)) in &latest {
        weighted_lbs_per_mwh += emission_factor(fuel) * (mwh / total);
        if is_renewable(fuel) {
            renewable_mwh += mwh;
        }
    }

    Ok(FeedReading {
        g_co2_per_kwh: weighted_lbs_per_mwh * 453.592 / 1000.0,
        renewable_percent: renewable_mwh / total * 100.0,
    })
}

/// HTTP client for the EIA v2 fuel-type-data endpoint.
pub struct EiaGridFeed {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// region → balancing authority (e.g. "us-west1" → "BPAT")
    region_map: HashMap<String, String>,
    timeout_seconds: u64,
}

impl EiaGridFeed {
    pub fn new(
        base_url: String,
        api_key: String,
        region_map: HashMap<String, String>,
        timeout_seconds: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url,
            api_key,
            region_map,
            timeout_seconds,
        }
    }

    fn classify_error(&self, e: reqwest::Error) -> FeedError {
        if e.is_timeout() {
            FeedError::Timeout(self.timeout_seconds)
        } else {
            FeedError::ConnectionFailed(e.to_string())
        }
    }
}

#[async_trait]
impl CarbonFeed for EiaGridFeed {
    async fn fetch(&self, region: &str) -> Result<FeedReading, FeedError> {
        let authority = self
            .region_map
            .get(region)
            .ok_or_else(|| FeedError::UnmappedRegion(region.to_string()))?;

        let url = format!("{}/v2/electricity/rto/fuel-type-data/data/", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("frequency", "hourly"),
                ("data[0]", "value"),
                ("facets[respondent][]", authority.as_str()),
                ("sort[0][column]", "period"),
                ("sort[0][direction]", "desc"),
                ("length", "100"),
            ])
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        if !response.status().is_success() {
            return Err(FeedError::HttpError(response.status().as_u16()));
        }

        let envelope: FeedEnvelope = response
            .json()
            .await
            .map_err(|e| FeedError::ParseError(e.to_string()))?;

        reading_from_records(&envelope.response.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fuel: &str, period: &str, value: f64) -> FeedRecord {
        FeedRecord {
            fueltype: Some(fuel.to_string()),
            period: Some(period.to_string()),
            value: Some(value),
        }
    }

    #[test]
    fn all_renewable_mix_is_zero_carbon() {
        let records = vec![
            record("wnd", "2026-08-07T10", 500.0),
            record("sun", "2026-08-07T10", 300.0),
            record("wat", "2026-08-07T10", 200.0),
        ];
        let reading = reading_from_records(&records).unwrap();
        assert_eq!(reading.g_co2_per_kwh, 0.0);
        assert_eq!(reading.renewable_percent, 100.0);
    }

    #[test]
    fn coal_heavy_mix_is_dirty() {
        let records = vec![
            record("col", "2026-08-07T10", 900.0),
            record("wnd", "2026-08-07T10", 100.0),
        ];
        let reading = reading_from_records(&records).unwrap();
        // 2249 lbs/MWh * 0.9 * 453.592 / 1000 ≈ 918 g/kWh
        assert!((reading.g_co2_per_kwh - 918.1).abs() < 1.0);
        assert!((reading.renewable_percent - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn only_most_recent_period_per_fuel_counts() {
        let records = vec![
            record("ng", "2026-08-07T10", 100.0),
            record("ng", "2026-08-07T09", 9000.0),
            record("wnd", "2026-08-07T10", 100.0),
        ];
        let reading = reading_from_records(&records).unwrap();
        assert!((reading.renewable_percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_generation_is_a_parse_error() {
        let records = vec![record("ng", "2026-08-07T10", 0.0)];
        assert!(matches!(
            reading_from_records(&records),
            Err(FeedError::ParseError(_))
        ));
    }

    #[test]
    fn unknown_fuel_gets_conservative_factor() {
        let records = vec![record("mystery", "2026-08-07T10", 100.0)];
        let reading = reading_from_records(&records).unwrap();
        assert!((reading.g_co2_per_kwh - 500.0 * 453.592 / 1000.0).abs() < 0.01);
        assert_eq!(reading.renewable_percent, 0.0);
    }
}
