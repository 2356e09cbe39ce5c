//! Rolling call statistics maintained for each tool as it executes.

use serde::{Deserialize, Serialize};

/// Running average latency and success rate for a tool, updated after every call.
///
/// Update is best-effort: a failure to record stats must never fail the call
/// itself (see `crate::executor::ToolExecutor::dispatch`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RollingStats {
    pub avg_latency_ms: f64,
    pub success_rate: f64,
    pub call_count: u64,
}

impl RollingStats {
    /// Folds one call's outcome into the running average.
    ///
    /// `avg_latency_ms' = (avg_latency_ms * n + latency_ms) / (n + 1)`
    /// `success_rate' = (success_rate * n + (success ? 1 : 0)) / (n + 1)`
    pub fn record(&mut self, latency_ms: f64, success: bool) {
        let n = self.call_count as f64;
        self.avg_latency_ms = (self.avg_latency_ms * n + latency_ms) / (n + 1.0);
        let success_value = if success { 1.0 } else { 0.0 };
        self.success_rate = (self.success_rate * n + success_value) / (n + 1.0);
        self.call_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_sets_average_directly() {
        let mut stats = RollingStats::default();
        stats.record(100.0, true);
        assert_eq!(stats.avg_latency_ms, 100.0);
        assert_eq!(stats.success_rate, 1.0);
        assert_eq!(stats.call_count, 1);
    }

    #[test]
    fn second_call_averages_with_first() {
        let mut stats = RollingStats::default();
        stats.record(100.0, true);
        stats.record(200.0, false);
        assert_eq!(stats.avg_latency_ms, 150.0);
        assert_eq!(stats.success_rate, 0.5);
        assert_eq!(stats.call_count, 2);
    }
}
