//! Sequential batch processing

use crate::db::{SnapshotRepository, TaskRepository};
use crate::engine::Reconciler;
use crate::identifier::Batch;
use crate::sink::ReportSink;
use serde::Serialize;
use std::fmt;
use tracing::{error, info};

/// Outcome counts of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub batches: usize,
    pub written: usize,
    pub failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} batches, {} reports written, {} failed",
            self.batches, self.written, self.failed
        )
    }
}

/// Analyze every batch in order and hand each report to `sink`.
///
/// A failed batch (repository error, deadline, write error) is logged and
/// skipped; the remaining batches still run.
pub async fn run_batches<S, T, K>(
    reconciler: &mut Reconciler<S, T>,
    batches: &[Batch],
    sink: &K,
) -> RunSummary
where
    S: SnapshotRepository,
    T: TaskRepository,
    K: ReportSink + ?Sized,
{
    let mut summary = RunSummary {
        batches: batches.len(),
        ..Default::default()
    };

    for batch in batches {
        if !batch.invalid_ids.is_empty() {
            info!(
                "Batch {}: ignoring {} unrecognized ids",
                batch.name,
                batch.invalid_ids.len()
            );
        }

        let result = match reconciler.analyze(batch).await {
            Ok(result) => result,
            Err(e) => {
                error!("Failed to analyze batch {}: {}", batch.name, e);
                summary.failed += 1;
                continue;
            }
        };

        match sink.write_report(&result) {
            Ok(()) => summary.written += 1,
            Err(e) => {
                error!("Failed to write report for batch {}: {}", batch.name, e);
                summary.failed += 1;
            }
        }
    }

    info!("Run complete: {}", summary);
    summary
}
