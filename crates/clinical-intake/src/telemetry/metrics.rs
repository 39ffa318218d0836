//! Prometheus metrics for the intake pipeline
//!
//! - `intake_files_total` (counter) - files routed, by outcome
//! - `intake_defects_total` (counter) - content and naming defects found
//! - `intake_validation_duration_seconds` (histogram) - content validation time
//! - `intake_token_fallbacks_total` (counter) - audit lines using a local token
//!
//! # Example
//!
//! ```rust,no_run
//! use clinical_intake::telemetry::IntakeMetricsRegistry;
//!
//! let registry = IntakeMetricsRegistry::new().unwrap();
//! registry.intake().record_outcome("archived");
//! println!("{}", registry.encode_text().unwrap());
//! ```

use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{IntakeError, Result};

/// Counters and histograms for one intake process
pub struct IntakeMetrics {
    files_total: CounterVec,
    defects_total: CounterVec,
    validation_duration: Histogram,
    token_fallbacks_total: Counter,
}

impl IntakeMetrics {
    /// Create the metrics and register them with `registry`
    pub fn new(registry: &Registry) -> Result<Self> {
        let files_total = CounterVec::new(
            Opts::new("files_total", "Files routed through the pipeline by outcome")
                .namespace("intake"),
            &["outcome"],
        )?;

        let defects_total = CounterVec::new(
            Opts::new("defects_total", "Defects found in incoming files").namespace("intake"),
            &["kind"],
        )?;

        let validation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "validation_duration_seconds",
                "Content validation duration in seconds",
            )
            .namespace("intake")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;

        let token_fallbacks_total = Counter::with_opts(
            Opts::new(
                "token_fallbacks_total",
                "Audit lines tagged with a locally generated identifier",
            )
            .namespace("intake"),
        )?;

        registry.register(Box::new(files_total.clone()))?;
        registry.register(Box::new(defects_total.clone()))?;
        registry.register(Box::new(validation_duration.clone()))?;
        registry.register(Box::new(token_fallbacks_total.clone()))?;

        Ok(Self {
            files_total,
            defects_total,
            validation_duration,
            token_fallbacks_total,
        })
    }

    /// Count a terminal state (`skipped`, `archived`, `rejected`, ...)
    pub fn record_outcome(&self, outcome: &str) {
        self.files_total.with_label_values(&[outcome]).inc();
    }

    /// Count defects of one kind (`naming` or `content`)
    pub fn record_defects(&self, kind: &str, count: usize) {
        self.defects_total
            .with_label_values(&[kind])
            .inc_by(count as f64);
    }

    pub fn record_token_fallback(&self) {
        self.token_fallbacks_total.inc();
    }

    /// Start a timer that observes validation duration when dropped
    pub fn start_validation_timer(&self) -> ValidationTimer<'_> {
        ValidationTimer {
            start: Instant::now(),
            metrics: self,
        }
    }

    pub fn outcome_count(&self, outcome: &str) -> f64 {
        self.files_total.with_label_values(&[outcome]).get()
    }

    pub fn defect_count(&self, kind: &str) -> f64 {
        self.defects_total.with_label_values(&[kind]).get()
    }

    pub fn token_fallbacks(&self) -> f64 {
        self.token_fallbacks_total.get()
    }
}

/// RAII guard for timing content validation
pub struct ValidationTimer<'a> {
    start: Instant,
    metrics: &'a IntakeMetrics,
}

impl Drop for ValidationTimer<'_> {
    fn drop(&mut self) {
        self.metrics
            .validation_duration
            .observe(self.start.elapsed().as_secs_f64());
    }
}

/// Owns the Prometheus registry and the intake metrics
pub struct IntakeMetricsRegistry {
    registry: Arc<Registry>,
    intake: Arc<IntakeMetrics>,
}

impl IntakeMetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let intake = Arc::new(IntakeMetrics::new(&registry)?);
        Ok(Self { registry, intake })
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Shared handle for the router and logger
    pub fn intake(&self) -> Arc<IntakeMetrics> {
        Arc::clone(&self.intake)
    }

    /// Encode metrics in the text exposition format
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| IntakeError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let registry = IntakeMetricsRegistry::new().unwrap();
        let metrics = registry.intake();

        metrics.record_outcome("archived");
        metrics.record_outcome("archived");
        metrics.record_outcome("rejected");

        assert_eq!(metrics.outcome_count("archived"), 2.0);
        assert_eq!(metrics.outcome_count("rejected"), 1.0);
        assert_eq!(metrics.outcome_count("failed"), 0.0);
    }

    #[test]
    fn test_defects_and_fallbacks() {
        let registry = IntakeMetricsRegistry::new().unwrap();
        let metrics = registry.intake();

        metrics.record_defects("content", 5);
        metrics.record_defects("naming", 1);
        metrics.record_token_fallback();

        assert_eq!(metrics.defect_count("content"), 5.0);
        assert_eq!(metrics.token_fallbacks(), 1.0);
    }

    #[test]
    fn test_encode_text() {
        let registry = IntakeMetricsRegistry::new().unwrap();
        let metrics = registry.intake();
        metrics.record_outcome("skipped");
        {
            let _timer = metrics.start_validation_timer();
        }

        let text = registry.encode_text().unwrap();
        assert!(text.contains("intake_files_total"));
        assert!(text.contains("intake_validation_duration_seconds"));
    }
}
