//! Performance metrics and statistics tracking for the scoring pipeline.

use crate::error::ErrorKind;
use crate::types::verdict::{PredictionResult, RiskLevel};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline performance
pub struct PipelineMetrics {
    /// Contracts scored, including batch members
    pub contracts_scored: AtomicU64,
    /// Batch requests completed
    pub batches_scored: AtomicU64,
    /// Verdicts by risk level
    verdicts_by_level: RwLock<HashMap<RiskLevel, u64>>,
    /// Failed requests by error kind
    failures_by_kind: RwLock<HashMap<ErrorKind, u64>>,
    /// Request processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// CRI distribution buckets of width 0.1; the last bucket absorbs CRI >= 0.9
    cri_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            contracts_scored: AtomicU64::new(0),
            batches_scored: AtomicU64::new(0),
            verdicts_by_level: RwLock::new(HashMap::new()),
            failures_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            cri_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a scored contract
    pub fn record_prediction(&self, prediction: &PredictionResult) {
        self.contracts_scored.fetch_add(1, Ordering::Relaxed);

        *self
            .verdicts_by_level
            .write()
            .entry(prediction.risk_level)
            .or_insert(0) += 1;

        let bucket = (prediction.predicted_cri * 10.0).clamp(0.0, 9.0) as usize;
        self.cri_buckets.write()[bucket] += 1;
    }

    /// Record a completed batch
    pub fn record_batch(&self, predictions: &[PredictionResult]) {
        self.batches_scored.fetch_add(1, Ordering::Relaxed);
        for prediction in predictions {
            self.record_prediction(prediction);
        }
    }

    /// Record a failed request
    pub fn record_failure(&self, kind: ErrorKind) {
        *self.failures_by_kind.write().entry(kind).or_insert(0) += 1;
    }

    /// Record request processing time
    pub fn record_latency(&self, processing_time: Duration) {
        let mut times = self.processing_times.write();
        times.push(processing_time.as_micros() as u64);
        // Keep only last 10000 for memory efficiency
        if times.len() > 10000 {
            times.drain(0..5000);
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (contracts per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.contracts_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_cri_distribution(&self) -> [u64; 10] {
        *self.cri_buckets.read()
    }

    pub fn get_verdicts_by_level(&self) -> HashMap<RiskLevel, u64> {
        self.verdicts_by_level.read().clone()
    }

    pub fn get_failures_by_kind(&self) -> HashMap<ErrorKind, u64> {
        self.failures_by_kind.read().clone()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let scored = self.contracts_scored.load(Ordering::Relaxed);
        let batches = self.batches_scored.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          PROCUREMENT RISK PIPELINE - METRICS SUMMARY         ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Contracts Scored: {:>8}  │  Throughput: {:>6.1} contracts/s ║",
            scored, throughput
        );
        info!("║ Batches Scored:   {:>8}                                   ║", batches);
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Verdicts by Risk Level:                                      ║");
        let by_level = self.get_verdicts_by_level();
        for level in [RiskLevel::Critical, RiskLevel::High, RiskLevel::Moderate, RiskLevel::Low] {
            let count = by_level.get(&level).copied().unwrap_or(0);
            let pct = if scored > 0 {
                (count as f64 / scored as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:10}: {:>6} ({:>5.1}%)", level.as_str(), count, pct);
        }
        let failures = self.get_failures_by_kind();
        if !failures.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Failures:                                                    ║");
            for (kind, count) in &failures {
                info!("║   {:20}: {:>6}", kind.as_str(), count);
            }
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ CRI Distribution:                                            ║");
        let distribution = self.get_cri_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that logs periodic summaries
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::verdict::{FeatureBreakdown, RiskLevelThresholds};

    fn prediction(cri: f64) -> PredictionResult {
        let level = RiskLevel::from_cri(cri, &RiskLevelThresholds::default());
        PredictionResult {
            contract_name: "c".to_string(),
            predicted_cri: cri,
            risk_level: level,
            recommendation: level.recommendation().to_string(),
            fraud_signals: Vec::new(),
            feature_breakdown: FeatureBreakdown {
                price_efficiency: 1.0,
                is_round_number: false,
                single_bidder: false,
                title_length: 40,
                award_month: 6,
                cost_overrun_percent: 0.0,
            },
        }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_prediction(&prediction(0.75));
        metrics.record_batch(&[prediction(0.1), prediction(1.4)]);
        metrics.record_failure(ErrorKind::ServiceUnavailable);
        metrics.record_latency(Duration::from_micros(100));
        metrics.record_latency(Duration::from_micros(300));

        assert_eq!(metrics.contracts_scored.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.batches_scored.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_verdicts_by_level()[&RiskLevel::Critical], 2);
        assert_eq!(metrics.get_failures_by_kind()[&ErrorKind::ServiceUnavailable], 1);

        let distribution = metrics.get_cri_distribution();
        assert_eq!(distribution[1], 1);
        assert_eq!(distribution[7], 1);
        assert_eq!(distribution[9], 1);

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_us, 200);
        assert_eq!(stats.max_us, 300);
    }

    #[test]
    fn test_negative_cri_lands_in_first_bucket() {
        let metrics = PipelineMetrics::new();
        metrics.record_prediction(&prediction(-0.2));
        assert_eq!(metrics.get_cri_distribution()[0], 1);
    }
}
