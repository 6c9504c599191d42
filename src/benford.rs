//! Benford's Law digit-conformity analysis for transaction amounts.
//!
//! The score is `max(0, 1 - Σ (obs_d - exp_d)² / exp_d)` over leading digits 1-9,
//! computed on frequencies (not counts), so it does not grow with sample size.

use crate::types::verdict::round_dp;
use serde::{Deserialize, Serialize};

/// Expected Benford frequency of a leading digit
pub fn expected_frequency(digit: u8) -> f64 {
    (1.0 + 1.0 / digit as f64).log10()
}

/// Leading significant digit of a positive amount.
///
/// Leading zeros of the decimal form are stripped and the first remaining
/// character must be 1-9; amounts below one (`0.5` -> `.5`) yield `None`.
pub fn leading_digit(value: f64) -> Option<u8> {
    let magnitude = value.abs();
    if !magnitude.is_finite() || magnitude <= 0.0 {
        return None;
    }

    let text = magnitude.to_string();
    let first = text.trim_start_matches('0').chars().next()?;
    match first.to_digit(10) {
        Some(d @ 1..=9) => Some(d as u8),
        _ => None,
    }
}

/// Per-digit breakdown of a conformity analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitDistribution {
    /// Number of amounts that contributed a leading digit
    pub sample_size: usize,
    /// Observed frequency for digits 1-9 (index 0 is digit 1)
    pub observed: [f64; 9],
    /// Benford frequency for digits 1-9
    pub expected: [f64; 9],
    /// Chi-squared-style deviation, not normalized by sample size
    pub deviation: f64,
    /// Conformity score in [0, 1], 4 decimals
    pub score: f64,
}

/// Scores how closely a series of amounts follows Benford's Law
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitConformityAnalyzer;

impl DigitConformityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Conformity score in [0, 1]. Missing, zero or digit-less values are ignored;
    /// a series with nothing left scores 0.0.
    pub fn score<I>(&self, amounts: I) -> f64
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        self.analyze(amounts).score
    }

    /// Convenience for fully-populated columns
    pub fn score_values(&self, amounts: &[f64]) -> f64 {
        self.score(amounts.iter().copied().map(Some))
    }

    /// Full digit distribution behind the score
    pub fn analyze<I>(&self, amounts: I) -> DigitDistribution
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut counts = [0usize; 9];
        let mut sample_size = 0usize;

        for digit in amounts.into_iter().flatten().filter_map(leading_digit) {
            counts[(digit - 1) as usize] += 1;
            sample_size += 1;
        }

        let expected: [f64; 9] = std::array::from_fn(|i| expected_frequency(i as u8 + 1));

        if sample_size == 0 {
            return DigitDistribution {
                sample_size,
                observed: [0.0; 9],
                expected,
                deviation: expected.iter().sum(),
                score: 0.0,
            };
        }

        let observed: [f64; 9] =
            std::array::from_fn(|i| counts[i] as f64 / sample_size as f64);

        let deviation: f64 = observed
            .iter()
            .zip(expected.iter())
            .map(|(obs, exp)| (obs - exp).powi(2) / exp)
            .sum();

        DigitDistribution {
            sample_size,
            observed,
            expected,
            deviation,
            score: round_dp((1.0 - deviation).max(0.0), 4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1000 amounts whose leading digits follow Benford's proportions
    fn benford_series() -> Vec<f64> {
        let counts = [301, 176, 125, 97, 79, 67, 58, 51, 46];
        let mut series = Vec::new();
        for (i, &count) in counts.iter().enumerate() {
            let digit = (i + 1) as f64;
            for k in 0..count {
                series.push(digit * 1000.0 + k as f64 + 0.25);
            }
        }
        series
    }

    #[test]
    fn test_leading_digit() {
        assert_eq!(leading_digit(12345.0), Some(1));
        assert_eq!(leading_digit(9900.0), Some(9));
        assert_eq!(leading_digit(-450.75), Some(4));
        assert_eq!(leading_digit(0.0), None);
        assert_eq!(leading_digit(0.5), None);
        assert_eq!(leading_digit(f64::NAN), None);
    }

    #[test]
    fn test_benford_series_scores_near_one() {
        let analyzer = DigitConformityAnalyzer::new();
        let score = analyzer.score_values(&benford_series());
        assert!(score > 0.999, "score was {score}");
        assert!(score <= 1.0);
    }

    #[test]
    fn test_empty_after_filtering_scores_zero() {
        let analyzer = DigitConformityAnalyzer::new();
        assert_eq!(analyzer.score(Vec::new()), 0.0);
        assert_eq!(analyzer.score(vec![None, Some(0.0), None]), 0.0);
        assert_eq!(analyzer.score_values(&[0.0, -0.0]), 0.0);
    }

    #[test]
    fn test_negative_values_use_magnitude() {
        let analyzer = DigitConformityAnalyzer::new();
        let positive = analyzer.score_values(&benford_series());
        let negated: Vec<f64> = benford_series().iter().map(|v| -v).collect();
        assert_eq!(analyzer.score_values(&negated), positive);
    }

    #[test]
    fn test_uniform_nines_score_zero() {
        // Every amount starts with 9: deviation far above 1
        let analyzer = DigitConformityAnalyzer::new();
        let amounts = vec![9999.0; 200];
        let distribution = analyzer.analyze(amounts.iter().copied().map(Some));

        assert_eq!(distribution.sample_size, 200);
        assert_eq!(distribution.observed[8], 1.0);
        assert!(distribution.deviation > 1.0);
        assert_eq!(distribution.score, 0.0);
    }

    #[test]
    fn test_expected_frequencies_sum_to_one() {
        let total: f64 = (1..=9).map(expected_frequency).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
