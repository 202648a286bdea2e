//! Optional metrics instrumentation for chronolog.
//!
//! When the `observe` feature is enabled, key operations emit counters,
//! histograms, and gauges via the [`metrics`] crate. A downstream
//! application must install a metrics recorder (e.g. `metrics-exporter-prometheus`)
//! to collect the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record one writer append (counter + latency histogram).
///
/// - `chronolog.writer.appends_total` – counter with `outcome` label
/// - `chronolog.writer.append_duration_seconds` – histogram
#[inline]
pub fn record_append(duration: std::time::Duration, success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("chronolog.writer.appends_total", "outcome" => outcome).increment(1);
        metrics::histogram!("chronolog.writer.append_duration_seconds")
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, success);
    }
}

/// Record an event dropped by a logger's level filter.
///
/// - `chronolog.logger.filtered_total` – counter
#[inline]
pub fn record_filtered() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("chronolog.logger.filtered_total").increment(1);
    }
}

/// Record a store opened for a new writer.
///
/// - `chronolog.registry.writers_opened_total` – counter
#[inline]
pub fn record_writer_opened() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("chronolog.registry.writers_opened_total").increment(1);
    }
}

/// Set the number of cached loggers.
///
/// - `chronolog.registry.loggers` – gauge
#[inline]
pub fn set_logger_count(count: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::gauge!("chronolog.registry.loggers").set(count as f64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = count;
    }
}
