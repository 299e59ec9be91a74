//! Retry controller.
//!
//! After a full run, if any suites failed the gate and the run was not
//! itself a forced retry, offer a bounded re-scan restricted to those
//! suites. The re-run is a re-entrant call into the same scanner, scoped to
//! the failed suites and to artifacts still unmatched; already-matched
//! artifacts are never rescanned and results are merged, not duplicated.

use std::collections::HashMap;

use crate::error::CoreResult;
use crate::model::GateState;
use crate::providers::RetryDecider;
use crate::scan::{RunOutcome, Scanner};

/// Offer and, on acceptance, execute a forced retry over the suites that
/// failed the gate. Returns the (possibly merged) outcome; the original gate
/// state is preserved so the caller still reports the gate failures.
pub async fn offer_retry(
    scanner: &Scanner,
    outcome: RunOutcome,
    decider: &dyn RetryDecider,
) -> CoreResult<RunOutcome> {
    if outcome.gate.forced || outcome.gate.failed.is_empty() {
        return Ok(outcome);
    }

    let unmatched: Vec<_> = outcome
        .unmatched()
        .map(|scan| scan.artifact.clone())
        .collect();
    if unmatched.is_empty() {
        // Idempotency: nothing left to rescan, no offer needed.
        return Ok(outcome);
    }

    let failed = outcome.gate.failed_suites();
    if !decider.confirm_retry(&failed).await {
        tracing::info!("forced retry declined");
        return Ok(outcome);
    }
    tracing::info!(suites = ?failed, "forced retry accepted, rescanning failed suites");

    let retry_sources: Vec<_> = scanner
        .sources()
        .iter()
        .filter(|s| outcome.gate.failed.contains(&s.suite))
        .cloned()
        .collect();
    let retry_scanner = scanner.scoped(retry_sources, GateState::forced(failed));

    let retry_outcome = retry_scanner.run(unmatched).await?;
    Ok(merge(outcome, retry_outcome))
}

/// Replace each still-unmatched result with its retry counterpart. Matched
/// results from the first pass are untouched; the row count never changes.
fn merge(mut base: RunOutcome, retry: RunOutcome) -> RunOutcome {
    let mut retried: HashMap<_, _> = retry
        .results
        .into_iter()
        .map(|scan| (scan.artifact.source_path.clone(), scan))
        .collect();

    for slot in &mut base.results {
        if !slot.result.is_matched() {
            if let Some(scan) = retried.remove(&slot.artifact.source_path) {
                *slot = scan;
            }
        }
    }

    base
}
