use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::metric_names::{
    METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE_MS, METRIC_CACHE_MISS, METRIC_CACHE_WARM_MS,
    METRIC_CACHE_WRITE_ERROR,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber and describe the cache metrics.
///
/// Fails if a subscriber is already installed.
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
            METRIC_CACHE_HIT,
            Unit::Count,
            "Total number of query-cache hits, labelled by view."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Total number of query-cache misses, including undecodable entries and backend errors."
        );
        describe_counter!(
            METRIC_CACHE_WRITE_ERROR,
            Unit::Count,
            "Total number of failed query-cache writes."
        );
        describe_histogram!(
            METRIC_CACHE_WARM_MS,
            Unit::Milliseconds,
            "Start-up cache warm-up latency in milliseconds."
        );
        describe_histogram!(
            METRIC_CACHE_INVALIDATE_MS,
            Unit::Milliseconds,
            "Latency of one mutation-triggered invalidation plan in milliseconds."
        );
    });
}
