//! Integration tests for the dispatcher with mock expert servers.

mod common;

use common::{carbon_cache, grammar_registry, mount_expert_failure, mount_expert_ok};
use std::sync::Arc;
use std::time::Duration;
use verdant::config::DispatchConfig;
use verdant::dispatch::{AttemptOutcome, DispatchError, Dispatcher, TaskRequest};
use verdant::expert::HttpExpertClient;
use verdant::registry::{EndpointStatus, ModelClass};
use verdant::selector::Selector;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(registry: &Arc<verdant::registry::Registry>, config: DispatchConfig) -> Dispatcher {
    Dispatcher::new(
        Arc::clone(registry),
        Arc::new(HttpExpertClient::new()),
        config,
    )
}

#[tokio::test]
async fn dispatch_uses_greenest_endpoint_first() {
    let green = MockServer::start().await;
    let dirty = MockServer::start().await;
    mount_expert_ok(&green, "from green").await;
    mount_expert_ok(&dirty, "from dirty").await;

    let registry = grammar_registry(&[
        ("a", "us-east1", &green.uri()),
        ("b", "us-west1", &dirty.uri()),
    ]);
    // us-east1 measures cleaner: endpoint "a" must be attempted first.
    let carbon = carbon_cache(&[("us-east1", 40.0), ("us-west1", 90.0)]).await;

    let selector = Selector::new(Arc::clone(&registry), carbon);
    let candidates = selector.select(ModelClass::Grammar100m).unwrap();

    let task = TaskRequest::new("fix my grammar: i are happy".to_string());
    let dispatched = dispatcher(&registry, DispatchConfig::default())
        .dispatch(ModelClass::Grammar100m, &task, &candidates)
        .await
        .unwrap();

    assert_eq!(dispatched.reply, "from green");
    assert_eq!(dispatched.decision.chosen_endpoint.id, "a");
    assert_eq!(dispatched.decision.attempts.len(), 1);
}

#[tokio::test]
async fn failover_to_next_candidate_records_both_attempts() {
    let broken = MockServer::start().await;
    let working = MockServer::start().await;
    mount_expert_failure(&broken).await;
    mount_expert_ok(&working, "corrected text").await;

    let registry = grammar_registry(&[
        ("a", "us-east1", &broken.uri()),
        ("b", "us-west1", &working.uri()),
    ]);
    let carbon = carbon_cache(&[("us-east1", 40.0), ("us-west1", 90.0)]).await;

    let selector = Selector::new(Arc::clone(&registry), carbon);
    let candidates = selector.select(ModelClass::Grammar100m).unwrap();

    let task = TaskRequest::new("fix my grammar: i are happy".to_string());
    let dispatched = dispatcher(&registry, DispatchConfig::default())
        .dispatch(ModelClass::Grammar100m, &task, &candidates)
        .await
        .unwrap();

    assert_eq!(dispatched.decision.chosen_endpoint.region, "us-west1");
    let attempts = &dispatched.decision.attempts;
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].endpoint_id, "a");
    assert_eq!(attempts[0].outcome, AttemptOutcome::Upstream { status: 500 });
    assert_eq!(attempts[1].endpoint_id, "b");
    assert_eq!(attempts[1].outcome, AttemptOutcome::Success);

    // Failure was reported: one strike against "a", success reset for "b".
    assert_eq!(registry.get("a").unwrap().consecutive_failures, 1);
    assert_eq!(registry.get("b").unwrap().consecutive_failures, 0);
}

#[tokio::test]
async fn exhaustion_carries_attempt_detail() {
    let broken_a = MockServer::start().await;
    let broken_b = MockServer::start().await;
    mount_expert_failure(&broken_a).await;
    mount_expert_failure(&broken_b).await;

    let registry = grammar_registry(&[
        ("a", "us-east1", &broken_a.uri()),
        ("b", "us-west1", &broken_b.uri()),
    ]);
    let carbon = carbon_cache(&[("us-east1", 40.0), ("us-west1", 90.0)]).await;

    let selector = Selector::new(Arc::clone(&registry), carbon);
    let candidates = selector.select(ModelClass::Grammar100m).unwrap();

    let task = TaskRequest::new("fix my grammar".to_string());
    let error = dispatcher(&registry, DispatchConfig::default())
        .dispatch(ModelClass::Grammar100m, &task, &candidates)
        .await
        .unwrap_err();

    let DispatchError::AllRegionsExhausted { attempts } = error;
    assert_eq!(attempts.len(), 2);
    assert!(attempts.iter().all(|a| !a.outcome.is_success()));
}

#[tokio::test]
async fn timeout_is_treated_as_failure_and_next_candidate_tried() {
    let slow = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"generated_text": "too late"}]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&slow)
        .await;

    let fast = MockServer::start().await;
    mount_expert_ok(&fast, "in time").await;

    let registry = grammar_registry(&[
        ("a", "us-east1", &slow.uri()),
        ("b", "us-west1", &fast.uri()),
    ]);
    let carbon = carbon_cache(&[("us-east1", 40.0), ("us-west1", 90.0)]).await;

    let selector = Selector::new(Arc::clone(&registry), carbon);
    let candidates = selector.select(ModelClass::Grammar100m).unwrap();

    let config = DispatchConfig {
        attempt_timeout_seconds: 1,
        max_attempts: 3,
    };

    let task = TaskRequest::new("fix my grammar".to_string());
    let dispatched = dispatcher(&registry, config)
        .dispatch(ModelClass::Grammar100m, &task, &candidates)
        .await
        .unwrap();

    assert_eq!(dispatched.reply, "in time");
    assert_eq!(
        dispatched.decision.attempts[0].outcome,
        AttemptOutcome::Timeout
    );
    // The abandoned attempt still counted against the slow endpoint.
    assert_eq!(registry.get("a").unwrap().consecutive_failures, 1);
}

#[tokio::test]
async fn max_attempts_bounds_latency_with_long_candidate_list() {
    let mut servers = Vec::new();
    for _ in 0..5 {
        let server = MockServer::start().await;
        mount_expert_failure(&server).await;
        servers.push(server);
    }

    let registry = Arc::new(verdant::registry::Registry::new());
    for (i, server) in servers.iter().enumerate() {
        registry.register(verdant::registry::Endpoint::new(
            format!("ep-{}", i),
            ModelClass::Grammar100m,
            "us-west1".to_string(),
            server.uri(),
            4,
        ));
    }
    let carbon = carbon_cache(&[("us-west1", 50.0)]).await;

    let selector = Selector::new(Arc::clone(&registry), carbon);
    let candidates = selector.select(ModelClass::Grammar100m).unwrap();
    assert_eq!(candidates.len(), 5);

    let config = DispatchConfig {
        attempt_timeout_seconds: 2,
        max_attempts: 2,
    };

    let task = TaskRequest::new("fix my grammar".to_string());
    let error = Dispatcher::new(Arc::clone(&registry), Arc::new(HttpExpertClient::new()), config)
        .dispatch(ModelClass::Grammar100m, &task, &candidates)
        .await
        .unwrap_err();

    // Only the permitted attempts ran, despite five candidates.
    let DispatchError::AllRegionsExhausted { attempts } = error;
    assert_eq!(attempts.len(), 2);
}

#[tokio::test]
async fn three_dispatch_failures_make_endpoint_unavailable() {
    let broken = MockServer::start().await;
    mount_expert_failure(&broken).await;

    let registry = grammar_registry(&[("a", "us-west1", &broken.uri())]);
    let carbon = carbon_cache(&[("us-west1", 50.0)]).await;
    let selector = Selector::new(Arc::clone(&registry), carbon);
    let dispatcher = dispatcher(&registry, DispatchConfig::default());

    for _ in 0..3 {
        let candidates = selector.select(ModelClass::Grammar100m).unwrap();
        let task = TaskRequest::new("fix my grammar".to_string());
        let _ = dispatcher
            .dispatch(ModelClass::Grammar100m, &task, &candidates)
            .await;
    }

    // Third consecutive failure crossed the threshold.
    assert_eq!(
        registry.get("a").unwrap().status,
        EndpointStatus::Unavailable
    );
    assert!(selector.select(ModelClass::Grammar100m).is_err());
}
