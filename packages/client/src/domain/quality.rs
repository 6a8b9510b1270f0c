//! Network quality classification.
//!
//! This module contains pure functions without side effects, making them
//! easy to test.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse user-facing classification of connection health.
///
/// Variants are ordered from best to worst, so `max` yields the worse band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityBand {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl QualityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityBand::Excellent => "excellent",
            QualityBand::Good => "good",
            QualityBand::Fair => "fair",
            QualityBand::Poor => "poor",
            QualityBand::Critical => "critical",
        }
    }
}

impl fmt::Display for QualityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds (exclusive) for excellent, good, fair and poor.
const RTT_THRESHOLDS_MS: [f64; 4] = [150.0, 300.0, 500.0, 1000.0];
const JITTER_THRESHOLDS_MS: [f64; 4] = [30.0, 60.0, 100.0, 200.0];

fn band_for(value: f64, thresholds: &[f64; 4]) -> QualityBand {
    const BANDS: [QualityBand; 4] = [
        QualityBand::Excellent,
        QualityBand::Good,
        QualityBand::Fair,
        QualityBand::Poor,
    ];

    // NaN fails every comparison and lands in Critical.
    thresholds
        .iter()
        .zip(BANDS)
        .find(|(limit, _)| value < **limit)
        .map(|(_, band)| band)
        .unwrap_or(QualityBand::Critical)
}

/// Classify by average round-trip time alone.
pub fn classify_rtt(avg_rtt_ms: f64) -> QualityBand {
    band_for(avg_rtt_ms, &RTT_THRESHOLDS_MS)
}

/// Classify by jitter alone.
pub fn classify_jitter(jitter_ms: f64) -> QualityBand {
    band_for(jitter_ms, &JITTER_THRESHOLDS_MS)
}

/// Classify a connection by RTT and jitter.
///
/// Either high latency or high variance degrades usability on its own, so
/// the worse of the two bands is reported.
pub fn classify(avg_rtt_ms: f64, jitter_ms: f64) -> QualityBand {
    classify_rtt(avg_rtt_ms).max(classify_jitter(jitter_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_low_rtt_low_jitter_is_excellent() {
        // テスト項目: RTT=100, jitter=10 は excellent
        // given (前提条件):
        let (rtt, jitter) = (100.0, 10.0);

        // when (操作):
        let band = classify(rtt, jitter);

        // then (期待する結果):
        assert_eq!(band, QualityBand::Excellent);
    }

    #[test]
    fn test_classify_rtt_400_is_fair() {
        // テスト項目: RTT=400, jitter=10 は fair
        // given (前提条件):
        let (rtt, jitter) = (400.0, 10.0);

        // when (操作):
        let band = classify(rtt, jitter);

        // then (期待する結果):
        assert_eq!(band, QualityBand::Fair);
    }

    #[test]
    fn test_classify_jitter_dominates_excellent_rtt() {
        // テスト項目: RTT が優秀でも jitter が大きければ critical になる（悪い方を採用）
        // given (前提条件):
        let (rtt, jitter) = (50.0, 250.0);

        // when (操作):
        let band = classify(rtt, jitter);

        // then (期待する結果):
        assert_eq!(band, QualityBand::Critical);
    }

    #[test]
    fn test_classify_is_monotonic_in_rtt() {
        // テスト項目: jitter 固定で RTT が増えると帯域は悪化方向にしか動かない
        // given (前提条件):
        let rtts = [0.0, 149.0, 150.0, 299.0, 300.0, 499.0, 500.0, 999.0, 1000.0, 5000.0];

        // when (操作):
        let bands: Vec<QualityBand> = rtts.iter().map(|rtt| classify(*rtt, 10.0)).collect();

        // then (期待する結果):
        assert!(bands.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(bands.first(), Some(&QualityBand::Excellent));
        assert_eq!(bands.last(), Some(&QualityBand::Critical));
    }

    #[test]
    fn test_classify_rtt_threshold_boundaries() {
        // テスト項目: RTT の境界値は上位の帯域に含まれない（未満判定）
        // given (前提条件):
        let cases = [
            (149.9, QualityBand::Excellent),
            (150.0, QualityBand::Good),
            (300.0, QualityBand::Fair),
            (500.0, QualityBand::Poor),
            (1000.0, QualityBand::Critical),
        ];

        // when (操作) / then (期待する結果):
        for (rtt, expected) in cases {
            assert_eq!(classify_rtt(rtt), expected, "rtt={rtt}");
        }
    }

    #[test]
    fn test_classify_jitter_threshold_boundaries() {
        // テスト項目: jitter の境界値の判定
        // given (前提条件):
        let cases = [
            (29.0, QualityBand::Excellent),
            (30.0, QualityBand::Good),
            (60.0, QualityBand::Fair),
            (100.0, QualityBand::Poor),
            (200.0, QualityBand::Critical),
        ];

        // when (操作) / then (期待する結果):
        for (jitter, expected) in cases {
            assert_eq!(classify_jitter(jitter), expected, "jitter={jitter}");
        }
    }

    #[test]
    fn test_classify_non_finite_is_critical() {
        // テスト項目: NaN や無限大は critical として扱われる
        // given (前提条件):
        let inputs = [(f64::NAN, 0.0), (0.0, f64::INFINITY)];

        // when (操作) / then (期待する結果):
        for (rtt, jitter) in inputs {
            assert_eq!(classify(rtt, jitter), QualityBand::Critical);
        }
    }

    #[test]
    fn test_band_ordering_worst_is_max() {
        // テスト項目: 帯域の順序は excellent < good < fair < poor < critical
        // given (前提条件):
        let mut bands = vec![
            QualityBand::Poor,
            QualityBand::Excellent,
            QualityBand::Critical,
            QualityBand::Fair,
            QualityBand::Good,
        ];

        // when (操作):
        bands.sort();

        // then (期待する結果):
        assert_eq!(
            bands,
            vec![
                QualityBand::Excellent,
                QualityBand::Good,
                QualityBand::Fair,
                QualityBand::Poor,
                QualityBand::Critical,
            ]
        );
    }
}
