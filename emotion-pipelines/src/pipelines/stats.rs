use std::time::{Duration, Instant};

use serde::Serialize;

/// Statistics for one pipeline call.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    /// Wall-clock time of the call.
    #[serde(rename = "total_time_ms", serialize_with = "as_millis")]
    pub total_time: Duration,
    /// Number of texts predicted.
    pub items_processed: usize,
    /// How many of those produced a failure result.
    pub items_failed: usize,
}

impl PipelineStats {
    /// Start timing (call at the beginning of the operation).
    pub(crate) fn start() -> PipelineStatsBuilder {
        PipelineStatsBuilder {
            start_time: Instant::now(),
        }
    }
}

fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// Tracks timing from creation until [`finish`](Self::finish).
pub(crate) struct PipelineStatsBuilder {
    start_time: Instant,
}

impl PipelineStatsBuilder {
    pub fn finish(self, items_processed: usize, items_failed: usize) -> PipelineStats {
        PipelineStats {
            total_time: self.start_time.elapsed(),
            items_processed,
            items_failed,
        }
    }
}
