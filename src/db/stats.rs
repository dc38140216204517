//! Query metrics: forwarded call count and cumulative execution time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Running counters for forwarded data operations.
///
/// Times are stored in microseconds, the same resolution the counters are
/// reported at. Counters only grow until [`QueryStats::reset`] is called.
///
/// A `QueryStats` can be shared (`Arc<QueryStats>`) between several
/// `Database` values to aggregate their metrics, or left private to each.
#[derive(Debug, Default)]
pub struct QueryStats {
    /// Number of forwarded data operations
    count: AtomicU64,
    /// Sum of their wall-clock durations in microseconds
    total_micros: AtomicU64,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one forwarded call that took `elapsed`.
    pub fn record(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Number of recorded calls.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Cumulative time in microseconds.
    pub fn total_micros(&self) -> u64 {
        self.total_micros.load(Ordering::Relaxed)
    }

    /// Cumulative time in seconds.
    pub fn total_seconds(&self) -> f64 {
        self.total_micros() as f64 / 1_000_000.0
    }

    /// Average time per call in microseconds (0 when nothing was recorded).
    pub fn average_micros(&self) -> u64 {
        let count = self.count();
        if count == 0 {
            return 0;
        }
        self.total_micros() / count
    }

    /// Clears both counters.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.total_micros.store(0, Ordering::Relaxed);
    }

    /// Logs a one-line summary at info level.
    pub fn log_summary(&self) {
        let count = self.count();
        if count == 0 {
            log::info!("No queries executed");
            return;
        }
        log::info!(
            "{} quer{} in {:.6}s (avg {}μs)",
            count,
            if count == 1 { "y" } else { "ies" },
            self.total_seconds(),
            self.average_micros()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = QueryStats::new();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.total_micros(), 0);
        assert_eq!(stats.total_seconds(), 0.0);
        assert_eq!(stats.average_micros(), 0);
    }

    #[test]
    fn test_record_accumulates_count_and_time() {
        let stats = QueryStats::new();
        stats.record(Duration::from_micros(1_500));
        stats.record(Duration::from_micros(500));
        stats.record(Duration::from_millis(3));

        assert_eq!(stats.count(), 3);
        assert_eq!(stats.total_micros(), 5_000);
        assert!((stats.total_seconds() - 0.005).abs() < f64::EPSILON);
        assert_eq!(stats.average_micros(), 1_666);
    }

    #[test]
    fn test_sub_microsecond_calls_still_count() {
        let stats = QueryStats::new();
        stats.record(Duration::from_nanos(200));
        assert_eq!(stats.count(), 1);
        assert_eq!(stats.total_micros(), 0);
    }

    #[test]
    fn test_reset_clears_counters() {
        let stats = QueryStats::new();
        stats.record(Duration::from_millis(1));
        stats.reset();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.total_micros(), 0);
    }
}
