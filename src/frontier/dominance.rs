//! Pairwise dominance and a quadratic reference frontier.
//!
//! `naive_frontier` checks every pair directly. It is slower than the scan in
//! `extract` but has no ordering invariant to get wrong, which makes it a
//! useful cross-check.

use crate::domain::{FrontierPoint, Trial};
use crate::error::AnalysisError;
use crate::frontier::extract::{frontier_order, score_trials};

/// `q` dominates `p`: at least as accurate, no more costly, strictly better in one.
pub fn dominates(q: &FrontierPoint, p: &FrontierPoint) -> bool {
    q.accuracy_pct >= p.accuracy_pct
        && q.cost <= p.cost
        && (q.accuracy_pct > p.accuracy_pct || q.cost < p.cost)
}

/// Same objectives in both dimensions.
pub fn same_objectives(q: &FrontierPoint, p: &FrontierPoint) -> bool {
    q.accuracy_pct == p.accuracy_pct && q.cost == p.cost
}

/// O(n²) frontier: every non-dominated trial, one representative per distinct
/// `(accuracy, cost)` pair (the first in `(accuracy desc, cost asc)` stable order).
pub fn naive_frontier(
    trials: &[Trial],
    ground_truth: u64,
) -> Result<Vec<FrontierPoint>, AnalysisError> {
    let mut scored = score_trials(trials, ground_truth)?;
    scored.sort_by(frontier_order);

    let mut out: Vec<FrontierPoint> = Vec::new();
    for (i, p) in scored.iter().enumerate() {
        let dominated = scored
            .iter()
            .enumerate()
            .any(|(j, q)| j != i && dominates(q, p));
        let duplicate = out.iter().any(|q| same_objectives(q, p));
        if !dominated && !duplicate {
            out.push(p.clone());
        }
    }
    Ok(out)
}
