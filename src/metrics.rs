//! Query metrics (`metrics` feature) and tracing spans (`tracing` feature).

#[cfg(feature = "metrics")]
pub use self::prometheus_metrics::{TidemarkMetrics, METRICS};

#[cfg(feature = "metrics")]
mod prometheus_metrics {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider};
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Encoder, Registry, TextEncoder};

    pub static METRICS: Lazy<TidemarkMetrics> = Lazy::new(TidemarkMetrics::init);

    pub struct TidemarkMetrics {
        pub registry: Registry,
        pub provider: SdkMeterProvider,
        pub queries_total: Counter<u64>,
        pub query_errors_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub rows_mapped_total: Counter<u64>,
        pub registry_builds_total: Counter<u64>,
    }

    impl TidemarkMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let exporter = opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
                .expect("failed to build prometheus exporter");
            let provider = SdkMeterProvider::builder().with_reader(exporter).build();
            let meter = provider.meter("tidemark");

            let queries_total = meter
                .u64_counter("tidemark_queries_total")
                .with_description("Total SELECT statements executed")
                .build();

            let query_errors_total = meter
                .u64_counter("tidemark_query_errors_total")
                .with_description("SELECT statements that failed in the executor")
                .build();

            let query_duration = meter
                .f64_histogram("tidemark_query_duration_seconds")
                .with_description("Duration of executor round trips")
                .build();

            let rows_mapped_total = meter
                .u64_counter("tidemark_rows_mapped_total")
                .with_description("Result rows mapped back into domain instances")
                .build();

            let registry_builds_total = meter
                .u64_counter("tidemark_registry_builds_total")
                .with_description("Field registry entries computed, including lost races")
                .build();

            Self {
                registry,
                provider,
                queries_total,
                query_errors_total,
                query_duration,
                rows_mapped_total,
                registry_builds_total,
            }
        }

        pub fn record_query(&self, elapsed: std::time::Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_rows_mapped(&self, rows: usize) {
            self.rows_mapped_total.add(rows as u64, &[]);
        }

        pub fn record_registry_build(&self) {
            self.registry_builds_total.add(1, &[]);
        }

        /// Prometheus text exposition of every tidemark metric
        pub fn render(&self) -> String {
            let mut buffer = Vec::new();
            if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
                log::warn!("failed to encode metrics: {e}");
            }
            String::from_utf8_lossy(&buffer).into_owned()
        }
    }

}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    /// Span around one `list` call
    pub fn list_span(table: &'static str) -> Span {
        tracing::debug_span!("tidemark.list", table)
    }

    /// Span around one executor round trip
    pub fn execute_query_span(query: &str) -> Span {
        tracing::trace_span!("tidemark.execute", sql = query)
    }
}
