//! Serve command implementation

use crate::api::{create_router, AppState};
use crate::carbon::{CarbonCache, EiaGridFeed};
use crate::cli::ServeArgs;
use crate::config::{LogFormat, VerdantConfig};
use crate::health::RecoveryProber;
use crate::registry::{Endpoint, Registry};
use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(args: &ServeArgs) -> anyhow::Result<VerdantConfig> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        VerdantConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        VerdantConfig::default()
    };

    // Apply environment variable overrides
    config = config.with_env_overrides();

    // Apply CLI overrides (highest priority)
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.no_probes {
        config.health.enabled = false;
    }

    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(config: &crate::config::LoggingConfig) -> anyhow::Result<()> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // Warn if content logging is enabled
    if config.enable_content_logging {
        eprintln!("WARNING: Content logging is enabled. Task text will be logged.");
        eprintln!("         This may include sensitive data. Use only for debugging.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Load endpoints from configuration into the registry
pub fn load_endpoints_from_config(config: &VerdantConfig, registry: &Registry) {
    for endpoint_config in &config.endpoints {
        registry.register(Endpoint::new(
            endpoint_config.id.clone(),
            endpoint_config.model_class,
            endpoint_config.region.clone(),
            endpoint_config.url.clone(),
            endpoint_config.max_concurrency,
        ));
    }
}

/// Build the carbon cache from configuration.
pub fn build_carbon_cache(config: &VerdantConfig) -> Arc<CarbonCache> {
    let api_key = std::env::var(&config.carbon.api_key_env).unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!(
            env_var = %config.carbon.api_key_env,
            "Carbon feed API key not set; scores will stay unknown and routing \
             will fall back to load/id ordering"
        );
    }

    let feed = Arc::new(EiaGridFeed::new(
        config.carbon.feed_url.clone(),
        api_key,
        config.carbon.region_map(),
        config.carbon.feed_timeout_seconds,
    ));

    Arc::new(CarbonCache::new(
        feed,
        config.carbon.region_names(),
        config.carbon.staleness_seconds,
        config.carbon.refresh_interval_seconds,
    ))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    // 1. Load and merge configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;

    tracing::info!("Starting Verdant router");
    tracing::debug!(?config, "Loaded configuration");

    // 3. Install the Prometheus recorder before anything emits metrics
    let metrics_handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install metrics recorder; /metrics disabled");
            None
        }
    };

    // 4. Create registry and carbon cache, load static endpoints
    let registry = Arc::new(Registry::with_failure_threshold(
        config.health.failure_threshold,
    ));
    load_endpoints_from_config(&config, &registry);
    let carbon = build_carbon_cache(&config);

    // 5. Build the router
    let config_arc = Arc::new(config.clone());
    let state = Arc::new(AppState::new(
        Arc::clone(&registry),
        Arc::clone(&carbon),
        config_arc,
        metrics_handle,
    ));
    let app = create_router(Arc::clone(&state));

    // 6. Start background tasks
    let cancel_token = CancellationToken::new();

    tracing::info!("Starting carbon refresh loop");
    let carbon_handle = Arc::clone(&carbon).start(cancel_token.clone());

    let prober_handle = if config.health.enabled {
        tracing::info!("Starting recovery prober");
        let prober = RecoveryProber::new(Arc::clone(&registry), config.health.clone());
        Some(prober.start(cancel_token.clone()))
    } else {
        tracing::info!("Recovery probes disabled");
        None
    };

    // 7. Bind and serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %addr, "Verdant API listening");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    // 8. Cleanup
    tracing::info!("Waiting for carbon refresh loop to stop");
    carbon_handle.await?;

    if let Some(handle) = prober_handle {
        tracing::info!("Waiting for recovery prober to stop");
        handle.await?;
    }

    tracing::info!("Verdant router stopped");
    Ok(())
}
