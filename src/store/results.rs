//! Report store.
//!
//! Holds oracle reports by run id for whichever layer needs persistence.
//! The oracle core itself never writes here; callers pass a store in.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::canonical::canonical_hash_hex;
use crate::oracle::OracleReport;

/// Aggregate over stored reports. Means are 0.0 for an empty store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Reports stored.
    pub runs: usize,
    /// Mean path coherence.
    pub mean_coherence: f32,
    /// Mean repair reliability.
    pub mean_reliability: f32,
    /// Mean hallucination rate.
    pub mean_hallucination_rate: f32,
    /// Mean end-to-end latency.
    pub mean_latency_ms: f64,
    /// Runs whose optimized traversal fell back to classical.
    pub fell_back_runs: usize,
}

/// Thread-safe store of oracle reports keyed by run id.
#[derive(Debug, Default)]
pub struct ReportStore {
    reports: RwLock<BTreeMap<Uuid, OracleReport>>,
}

impl ReportStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a report. Replaces any report with the same run id.
    pub fn insert(&self, report: OracleReport) -> Uuid {
        let run_id = report.run_id;
        self.reports.write().insert(run_id, report);
        run_id
    }

    /// Fetch a report by run id.
    pub fn get(&self, run_id: &Uuid) -> Option<OracleReport> {
        self.reports.read().get(run_id).cloned()
    }

    /// All reports in chronological order (ties by run id).
    pub fn list(&self) -> Vec<OracleReport> {
        let mut reports: Vec<OracleReport> = self.reports.read().values().cloned().collect();
        reports.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.run_id.cmp(&b.run_id)));
        reports
    }

    /// Number of reports.
    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }

    /// Fingerprint of the stored run ids. Changes whenever a run is added.
    pub fn fingerprint(&self) -> String {
        let ids: Vec<Uuid> = self.reports.read().keys().copied().collect();
        canonical_hash_hex(&ids)
    }

    /// Aggregate metrics over every stored report.
    pub fn summary(&self) -> ReportSummary {
        let reports = self.reports.read();
        let runs = reports.len();
        if runs == 0 {
            return ReportSummary::default();
        }

        let n = runs as f64;
        let mut coherence = 0.0f64;
        let mut reliability = 0.0f64;
        let mut hallucination_rate = 0.0f64;
        let mut latency = 0.0f64;
        let mut fell_back_runs = 0usize;

        for report in reports.values() {
            coherence += report.metrics.coherence as f64;
            reliability += report.metrics.reliability as f64;
            hallucination_rate += report.metrics.hallucination_rate as f64;
            latency += report.metrics.total_latency_ms;
            if report.traversal.fell_back {
                fell_back_runs += 1;
            }
        }

        ReportSummary {
            runs,
            mean_coherence: (coherence / n) as f32,
            mean_reliability: (reliability / n) as f32,
            mean_hallucination_rate: (hallucination_rate / n) as f32,
            mean_latency_ms: latency / n,
            fell_back_runs,
        }
    }
}
