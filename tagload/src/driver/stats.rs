//! Response statistics and the end-of-run report

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use hdrhistogram::Histogram;

use super::load::CallCounters;
use super::transport::TransportError;

/// Significant figures kept by the latency histogram
const LATENCY_SIGFIGS: u8 = 3;

/// Latency distribution collected as responses arrive
///
/// Backed by an HDR histogram in microseconds, so memory depends on the
/// latency range seen, not on how many responses were recorded.
#[derive(Debug, Clone)]
pub struct LatencyStats {
    histogram: Histogram<u64>,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            histogram: Histogram::new(LATENCY_SIGFIGS)
                .expect("3 significant figures is within the histogram's supported range"),
        }
    }

    pub fn record(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.histogram.saturating_record(micros);
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Histogram buckets currently allocated
    pub fn buckets(&self) -> usize {
        self.histogram.distinct_values()
    }

    /// Calculate percentile (0-100)
    pub fn percentile(&self, p: f64) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        let micros = self.histogram.value_at_quantile(p / 100.0);
        Some(Duration::from_micros(micros))
    }

    pub fn p50(&self) -> Option<Duration> {
        self.percentile(50.0)
    }

    pub fn p99(&self) -> Option<Duration> {
        self.percentile(99.0)
    }

    pub fn max(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.max()))
    }
}

/// Outcome tallies for every completed call
#[derive(Debug, Clone, Default)]
pub struct ResponseStats {
    /// Responses per HTTP status code
    pub statuses: BTreeMap<u16, u64>,
    /// Calls that ended in a transport error
    pub transport_errors: u64,
    /// Time from issue to completion, errors included
    pub latencies: LatencyStats,
}

impl ResponseStats {
    pub fn record(&mut self, outcome: &Result<u16, TransportError>, latency: Duration) {
        match outcome {
            Ok(status) => *self.statuses.entry(*status).or_insert(0) += 1,
            Err(_) => self.transport_errors += 1,
        }
        self.latencies.record(latency);
    }

    /// Responses with a 2xx status
    pub fn successes(&self) -> u64 {
        self.statuses
            .iter()
            .filter(|(status, _)| (200..300).contains(*status))
            .map(|(_, count)| count)
            .sum()
    }

    pub fn completed(&self) -> u64 {
        self.statuses.values().sum::<u64>() + self.transport_errors
    }
}

/// Terminal status of a load run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub counters: CallCounters,
    pub stats: ResponseStats,
    pub elapsed: Duration,
}

impl RunReport {
    /// Calls issued per second over the whole run, drain included
    pub fn call_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.counters.calls as f64 / secs
        } else {
            0.0
        }
    }
}

fn fmt_latency(latency: Option<Duration>) -> String {
    latency
        .map(|d| format!("{:.1}ms", d.as_secs_f64() * 1000.0))
        .unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "done with calls: {} calls, {} responses in {:.1}s ({:.1} calls/s)",
            self.counters.calls,
            self.counters.responses,
            self.elapsed.as_secs_f64(),
            self.call_rate()
        )?;
        for (status, count) in &self.stats.statuses {
            writeln!(f, "  HTTP {}: {}", status, count)?;
        }
        if self.stats.transport_errors > 0 {
            writeln!(f, "  transport errors: {}", self.stats.transport_errors)?;
        }
        write!(
            f,
            "  latency p50={} p99={} max={}",
            fmt_latency(self.stats.latencies.p50()),
            fmt_latency(self.stats.latencies.p99()),
            fmt_latency(self.stats.latencies.max())
        )
    }
}
