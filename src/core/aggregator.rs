use crate::domain::model::{Bucket, ProbeResult, Report, Target};
use chrono::{DateTime, Utc};

/// Accumulates classified results into the three report buckets.
///
/// Results must be folded in input order; `fold_wave` restores that order for one wave.
#[derive(Debug)]
pub struct Aggregator {
    target: Target,
    total_issued: usize,
    positives: Vec<ProbeResult>,
    negatives: Vec<ProbeResult>,
    errors: Vec<ProbeResult>,
    waves: usize,
    started_at: DateTime<Utc>,
}

impl Aggregator {
    pub fn new(target: Target, total_issued: usize) -> Self {
        Self {
            target,
            total_issued,
            positives: Vec::new(),
            negatives: Vec::new(),
            errors: Vec::new(),
            waves: 0,
            started_at: Utc::now(),
        }
    }

    pub fn fold(&mut self, result: ProbeResult) {
        match result.outcome.bucket() {
            Bucket::Positives => self.positives.push(result),
            Bucket::Negatives => self.negatives.push(result),
            Bucket::Errors => self.errors.push(result),
        }
    }

    pub fn fold_wave(&mut self, mut results: Vec<ProbeResult>) {
        if results.is_empty() {
            return;
        }
        results.sort_by_key(|r| r.index);
        for result in results {
            self.fold(result);
        }
        self.waves += 1;
    }

    pub fn folded(&self) -> usize {
        self.positives.len() + self.negatives.len() + self.errors.len()
    }

    pub fn finish(self) -> Report {
        debug_assert_eq!(
            self.folded(),
            self.total_issued,
            "every issued spec must land in exactly one bucket"
        );
        Report {
            target: self.target,
            positives: self.positives,
            negatives: self.negatives,
            errors: self.errors,
            total_issued: self.total_issued,
            waves: self.waves,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Folds a complete result set, in any order, into a report.
pub fn aggregate(target: Target, results: Vec<ProbeResult>) -> Report {
    let mut aggregator = Aggregator::new(target, results.len());
    aggregator.fold_wave(results);
    aggregator.finish()
}
