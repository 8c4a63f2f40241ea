//! Integration tests for the carbon feed client against a mock grid API.

use std::sync::Arc;
use verdant::carbon::{CarbonCache, CarbonFeed, EiaGridFeed, FeedError, ScoreLookup};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feed_for(server: &MockServer, regions: &[(&str, &str)]) -> EiaGridFeed {
    EiaGridFeed::new(
        server.uri(),
        "test-key".to_string(),
        regions
            .iter()
            .map(|(region, authority)| (region.to_string(), authority.to_string()))
            .collect(),
        5,
    )
}

fn fuel_mix_body(records: &[(&str, f64)]) -> serde_json::Value {
    let data: Vec<serde_json::Value> = records
        .iter()
        .map(|(fuel, value)| {
            serde_json::json!({
                "fueltype": fuel,
                "period": "2026-08-07T10",
                "value": value
            })
        })
        .collect();
    serde_json::json!({ "response": { "data": data } })
}

#[tokio::test]
async fn fetch_computes_intensity_from_fuel_mix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/electricity/rto/fuel-type-data/data/"))
        .and(query_param("facets[respondent][]", "BPAT"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fuel_mix_body(&[("wat", 800.0), ("ng", 200.0)])),
        )
        .mount(&server)
        .await;

    let feed = feed_for(&server, &[("us-west1", "BPAT")]);
    let reading = feed.fetch("us-west1").await.unwrap();

    // 20% gas at 898 lbs/MWh → 898 * 0.2 * 453.592 / 1000 ≈ 81.5 g/kWh
    assert!((reading.g_co2_per_kwh - 81.5).abs() < 0.5);
    assert!((reading.renewable_percent - 80.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn unmapped_region_is_rejected_without_network() {
    let server = MockServer::start().await;
    let feed = feed_for(&server, &[("us-west1", "BPAT")]);

    assert!(matches!(
        feed.fetch("eu-north1").await,
        Err(FeedError::UnmappedRegion(_))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn http_error_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let feed = feed_for(&server, &[("us-west1", "BPAT")]);
    assert!(matches!(
        feed.fetch("us-west1").await,
        Err(FeedError::HttpError(403))
    ));
}

#[tokio::test]
async fn empty_payload_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": { "data": [] }
            })),
        )
        .mount(&server)
        .await;

    let feed = feed_for(&server, &[("us-west1", "BPAT")]);
    assert!(matches!(
        feed.fetch("us-west1").await,
        Err(FeedError::ParseError(_))
    ));
}

#[tokio::test]
async fn cache_refresh_over_http_feed_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("facets[respondent][]", "BPAT"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(fuel_mix_body(&[("wnd", 1000.0)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("facets[respondent][]", "SCEG"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(fuel_mix_body(&[("col", 1000.0)])),
        )
        .mount(&server)
        .await;

    let feed = Arc::new(feed_for(&server, &[("us-west1", "BPAT"), ("us-east1", "SCEG")]))
        as Arc<dyn CarbonFeed>;
    let cache = CarbonCache::new(
        feed,
        vec!["us-west1".to_string(), "us-east1".to_string()],
        900,
        300,
    );

    assert_eq!(cache.refresh().await, 2);

    match cache.score_for("us-west1") {
        ScoreLookup::Known(score) => assert_eq!(score.g_co2_per_kwh, 0.0),
        ScoreLookup::Unknown => panic!("wind region should be known"),
    }

    let rankings = cache.rankings();
    assert_eq!(rankings[0].region, "us-west1");
    assert_eq!(rankings[1].region, "us-east1");
    assert!(rankings[1].g_co2_per_kwh > 900.0);
}

#[tokio::test]
async fn partial_outage_keeps_other_regions() {
    let server = MockServer::start().await;
    // Only BPAT answers; SCEG times out at the HTTP level with a 500.
    Mock::given(method("GET"))
        .and(query_param("facets[respondent][]", "BPAT"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(fuel_mix_body(&[("wnd", 1000.0)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("facets[respondent][]", "SCEG"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let feed = Arc::new(feed_for(&server, &[("us-west1", "BPAT"), ("us-east1", "SCEG")]))
        as Arc<dyn CarbonFeed>;
    let cache = CarbonCache::new(
        feed,
        vec!["us-west1".to_string(), "us-east1".to_string()],
        900,
        300,
    );

    assert_eq!(cache.refresh().await, 1);

    // The healthy region is cached; the failed one reads unknown.
    assert!(matches!(
        cache.score_for("us-west1"),
        ScoreLookup::Known(_)
    ));
    assert_eq!(cache.score_for("us-east1"), ScoreLookup::Unknown);
}
