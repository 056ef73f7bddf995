use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "quickcart_cache_hit_total",
            Unit::Count,
            "Catalog listings answered from the cache, by key."
        );
        describe_counter!(
            "quickcart_cache_miss_total",
            Unit::Count,
            "Catalog listings that were absent or expired in the cache, by key."
        );
        describe_counter!(
            "quickcart_cache_invalidate_total",
            Unit::Count,
            "Cache entries removed by writes or purges, by key."
        );
        describe_counter!(
            "quickcart_catalog_degraded_total",
            Unit::Count,
            "Catalog store queries that failed or timed out, by scope."
        );
        describe_histogram!(
            "quickcart_rollback_ms",
            Unit::Milliseconds,
            "Inventory rollback duration in milliseconds."
        );
    });
}
