//! Prometheus metrics for the store and the API middleware.
//!
//! Recording goes through the `metrics` facade and is free until a
//! recorder is installed. [`MetricsServer::start`] installs the Prometheus
//! recorder and serves the scrape endpoint.
//!
//! | name | kind | labels |
//! |------|------|--------|
//! | `store.actions.total` | counter | |
//! | `store.reducer.duration_seconds` | histogram | |
//! | `store.effects.executed` | counter | `type` |
//! | `api.requests.total` | counter | `method` |
//! | `api.responses.total` | counter | `outcome` |
//! | `api.request.duration_seconds` | histogram | |
//!
//! ```rust,no_run
//! use press_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! // Scrape http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Metric names
pub mod names {
    /// Actions sent to a store
    pub const STORE_ACTIONS: &str = "store.actions.total";
    /// Time spent in the reducer per action
    pub const STORE_REDUCE_SECONDS: &str = "store.reducer.duration_seconds";
    /// Effects started, by kind
    pub const STORE_EFFECTS: &str = "store.effects.executed";
    /// API requests issued, by method
    pub const API_REQUESTS: &str = "api.requests.total";
    /// API calls settled, by outcome
    pub const API_RESPONSES: &str = "api.responses.total";
    /// API round-trip time
    pub const API_REQUEST_SECONDS: &str = "api.request.duration_seconds";
}

/// Latency buckets, in seconds, for every `*duration_seconds` histogram
const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Errors from metrics setup
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The Prometheus recorder or listener could not be built
    #[error("Failed to build metrics exporter: {0}")]
    Build(#[from] BuildError),
}

/// Prometheus scrape endpoint
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Server that will listen on `addr` once started
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint listens on
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Install the global recorder and spawn the HTTP listener.
    ///
    /// Must run inside a tokio runtime. A process has one global recorder:
    /// if another one is already installed this logs a warning, leaves the
    /// existing recorder in place and returns `Ok` without a handle.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] if the exporter cannot be built.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(Matcher::Suffix("duration_seconds".to_string()), LATENCY_BUCKETS)?
            .build()?;
        let handle = recorder.handle();

        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Metrics recorder already installed, keeping it");
            return Ok(());
        }

        describe_all();
        let addr = self.addr;
        tokio::spawn(async move {
            if exporter.await.is_err() {
                tracing::error!(%addr, "Metrics exporter stopped serving");
            }
        });
        tracing::info!(addr = %self.addr, "Serving metrics at http://{}/metrics", self.addr);

        self.handle = Some(handle);
        Ok(())
    }

    /// Handle of the installed recorder, if this server installed it
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Current metrics in Prometheus text format
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn describe_all() {
    describe_counter!(names::STORE_ACTIONS, "Actions sent to the store");
    describe_histogram!(names::STORE_REDUCE_SECONDS, "Time taken to reduce one action");
    describe_counter!(names::STORE_EFFECTS, "Effects started, labelled by type");
    describe_counter!(names::API_REQUESTS, "API requests issued, labelled by method");
    describe_counter!(names::API_RESPONSES, "API calls settled, labelled by outcome");
    describe_histogram!(names::API_REQUEST_SECONDS, "Round-trip time of API requests");
}

/// Store instrumentation
pub struct StoreMetrics;

impl StoreMetrics {
    /// An action entered the pipeline
    pub fn record_send() {
        counter!(names::STORE_ACTIONS).increment(1);
    }

    /// One reducer run finished
    pub fn record_reduce(duration: Duration) {
        histogram!(names::STORE_REDUCE_SECONDS).record(duration.as_secs_f64());
    }

    /// An effect of `kind` (`none`, `parallel`, `future`) was started
    pub fn record_effect(kind: &'static str) {
        counter!(names::STORE_EFFECTS, "type" => kind).increment(1);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_server_before_start() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert_eq!(server.addr(), addr);
        assert!(server.render().is_none());
    }

    #[tokio::test]
    async fn test_start_records_store_metrics() {
        let mut server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        server.start().unwrap();

        StoreMetrics::record_send();
        StoreMetrics::record_effect("future");

        // Only the first recorder in the test binary gets a handle
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("store_actions_total"));
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        StoreMetrics::record_send();
        StoreMetrics::record_reduce(Duration::from_millis(1));
        StoreMetrics::record_effect("parallel");
    }
}
