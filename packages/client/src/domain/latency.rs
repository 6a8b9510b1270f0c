//! Round-trip samples and the statistics derived from them.

use std::collections::VecDeque;

use super::quality::{QualityBand, classify};

/// Default number of samples kept in a [`LatencyWindow`].
pub const DEFAULT_WINDOW_CAPACITY: usize = 30;

/// Stability score at or above which a connection counts as stable.
pub const STABILITY_THRESHOLD: f64 = 70.0;

/// A single measured round-trip time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    /// Round-trip time in milliseconds
    pub rtt_ms: f64,
    /// Wall-clock capture time (Unix milliseconds)
    pub captured_at: i64,
}

impl LatencySample {
    pub fn new(rtt_ms: f64, captured_at: i64) -> Self {
        Self {
            rtt_ms,
            captured_at,
        }
    }
}

/// Bounded window of the most recent samples; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: VecDeque<LatencySample>,
    capacity: usize,
}

impl LatencyWindow {
    /// Create an empty window. A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: LatencySample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &LatencySample> {
        self.samples.iter()
    }

    /// Statistics over the current contents, `None` while empty.
    pub fn stats(&self) -> Option<QualityStats> {
        let rtts: Vec<f64> = self.samples.iter().map(|s| s.rtt_ms).collect();
        QualityStats::from_rtts(&rtts)
    }
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

/// Quality estimate derived from a window of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityStats {
    pub avg_rtt: f64,
    pub min_rtt: f64,
    pub max_rtt: f64,
    pub jitter: f64,
    pub sample_count: usize,
    pub stability_score: f64,
    pub is_stable: bool,
    pub band: QualityBand,
}

impl QualityStats {
    /// Derive stats from RTTs in capture order.
    pub fn from_rtts(rtts: &[f64]) -> Option<Self> {
        if rtts.is_empty() {
            return None;
        }

        let avg_rtt = mean(rtts);
        let min_rtt = rtts.iter().copied().fold(f64::INFINITY, f64::min);
        let max_rtt = rtts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let jitter = jitter(rtts);
        let stability_score = stability_score(avg_rtt, jitter, std_dev(rtts, avg_rtt));

        Some(Self {
            avg_rtt,
            min_rtt,
            max_rtt,
            jitter,
            sample_count: rtts.len(),
            stability_score,
            is_stable: stability_score >= STABILITY_THRESHOLD,
            band: classify(avg_rtt, jitter),
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean absolute difference between consecutive samples.
fn jitter(rtts: &[f64]) -> f64 {
    if rtts.len() < 2 {
        return 0.0;
    }
    let total: f64 = rtts.windows(2).map(|pair| (pair[1] - pair[0]).abs()).sum();
    total / (rtts.len() - 1) as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Weighted blend: 40% RTT, 30% jitter, 30% variability.
fn stability_score(avg_rtt: f64, jitter: f64, std_dev: f64) -> f64 {
    let rtt_score = (100.0 - avg_rtt / 10.0).max(0.0);
    let jitter_score = (100.0 - jitter).max(0.0);
    let variability_score = (100.0 - std_dev / 2.0).max(0.0);
    0.4 * rtt_score + 0.3 * jitter_score + 0.3 * variability_score
}
