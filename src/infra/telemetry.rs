use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::scope::{METRIC_SCOPE_HIT_TOTAL, METRIC_SCOPE_MISS_TOTAL};
use crate::application::search::METRIC_INDEX_BUILD_MS;
use crate::config::{LogFormat, LoggingSettings};
use crate::infra::upstream::{METRIC_UPSTREAM_ERROR_TOTAL, METRIC_UPSTREAM_QUERY_TOTAL};

static METRIC_DESCRIPTIONS: Once = Once::new();

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
    describe_metrics();

    let level: tracing::level_filters::LevelFilter = logging.level.into();
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
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
        .map_err(|err| TelemetryError::Subscriber(err.to_string()))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_SCOPE_HIT_TOTAL,
            Unit::Count,
            "Total number of request-scope memoization hits."
        );
        describe_counter!(
            METRIC_SCOPE_MISS_TOTAL,
            Unit::Count,
            "Total number of request-scope memoization misses."
        );
        describe_counter!(
            METRIC_UPSTREAM_QUERY_TOTAL,
            Unit::Count,
            "Total number of queries issued to the upstream document store."
        );
        describe_counter!(
            METRIC_UPSTREAM_ERROR_TOTAL,
            Unit::Count,
            "Total number of upstream queries that failed."
        );
        describe_histogram!(
            METRIC_INDEX_BUILD_MS,
            Unit::Milliseconds,
            "Search index snapshot build latency in milliseconds."
        );
    });
}
