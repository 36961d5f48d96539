//! Pareto-frontier extraction (maximize accuracy, minimize cost).
//!
//! Trials are stable-sorted by `(accuracy desc, cost asc)`. In that order a
//! trial can only be non-dominated if it is strictly cheaper than every trial
//! before it, so one scan with a running minimum cost is enough.

use std::cmp::Ordering;

use tracing::debug;

use crate::domain::{FrontierPoint, GroundTruth, Trial};
use crate::error::AnalysisError;

/// Frontier plus the context the report needs.
#[derive(Debug, Clone)]
pub struct FrontierSummary {
    pub ground_truth: u64,
    pub trials: usize,
    pub points: Vec<FrontierPoint>,
    pub threshold_pct: f64,
    /// Frontier points with `accuracy_pct >= threshold_pct`.
    pub above_threshold: usize,
}

/// Percentage of the reference detections found, capped at 100.
pub fn accuracy_pct(detections: u64, ground_truth: u64) -> f64 {
    (detections as f64 * 100.0 / ground_truth as f64).min(100.0)
}

/// Resolve the reference detection count for a set of trials.
pub fn resolve_ground_truth(trials: &[Trial], policy: GroundTruth) -> Result<u64, AnalysisError> {
    let count = match policy {
        GroundTruth::Count(n) => n,
        GroundTruth::First => trials
            .first()
            .map(|t| t.detection_count)
            .ok_or(AnalysisError::EmptyInput)?,
        GroundTruth::Max => trials
            .iter()
            .map(|t| t.detection_count)
            .max()
            .ok_or(AnalysisError::EmptyInput)?,
    };
    if count == 0 {
        return Err(AnalysisError::InvalidGroundTruth(count));
    }
    Ok(count)
}

/// Extract the Pareto-optimal trials, ordered by descending accuracy.
pub fn extract_frontier(
    trials: &[Trial],
    ground_truth: u64,
) -> Result<Vec<FrontierPoint>, AnalysisError> {
    let scored = score_trials(trials, ground_truth)?;

    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by(|&i, &j| frontier_order(&scored[i], &scored[j]));

    let mut best_cost = f64::INFINITY;
    let mut frontier = Vec::new();
    for idx in order {
        let point = &scored[idx];
        if point.cost < best_cost {
            best_cost = point.cost;
            frontier.push(point.clone());
        }
    }

    // Accepted points come out of the scan already in descending accuracy.
    debug!(
        trials = trials.len(),
        frontier = frontier.len(),
        ground_truth,
        "extracted Pareto frontier"
    );
    Ok(frontier)
}

/// Run `extract_frontier` and count how many points clear `threshold_pct`.
pub fn summarize_frontier(
    trials: &[Trial],
    ground_truth: u64,
    threshold_pct: f64,
) -> Result<FrontierSummary, AnalysisError> {
    let points = extract_frontier(trials, ground_truth)?;
    let above_threshold = points
        .iter()
        .filter(|p| p.accuracy_pct >= threshold_pct)
        .count();
    Ok(FrontierSummary {
        ground_truth,
        trials: trials.len(),
        points,
        threshold_pct,
        above_threshold,
    })
}

/// Validate inputs and attach `accuracy_pct` to every trial.
pub(crate) fn score_trials(
    trials: &[Trial],
    ground_truth: u64,
) -> Result<Vec<FrontierPoint>, AnalysisError> {
    if trials.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    if ground_truth == 0 {
        return Err(AnalysisError::InvalidGroundTruth(ground_truth));
    }

    trials
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if !(t.cost.is_finite() && t.cost >= 0.0) {
                return Err(AnalysisError::InvalidTrial(format!(
                    "trial {i} has cost {} (must be finite and >= 0)",
                    t.cost
                )));
            }
            Ok(FrontierPoint {
                parameters: t.parameters.clone(),
                accuracy_pct: accuracy_pct(t.detection_count, ground_truth),
                cost: t.cost,
                detection_count: t.detection_count,
            })
        })
        .collect()
}

/// `(accuracy desc, cost asc)`.
pub(crate) fn frontier_order(p: &FrontierPoint, q: &FrontierPoint) -> Ordering {
    q.accuracy_pct
        .total_cmp(&p.accuracy_pct)
        .then_with(|| p.cost.total_cmp(&q.cost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParameterSet;

    fn trial(step: f64, detections: u64, cost: f64) -> Trial {
        Trial::new(ParameterSet::new().with("step_ratio", step), cost, detections)
    }

    fn pairs(points: &[FrontierPoint]) -> Vec<(f64, f64)> {
        points.iter().map(|p| (p.accuracy_pct, p.cost)).collect()
    }

    #[test]
    fn documented_scenario() {
        // Ground truth 100 so detections == accuracy.
        let trials = vec![
            trial(9.0, 100, 10.0),
            trial(8.0, 95, 4.0),
            trial(7.0, 80, 4.0),
            trial(6.0, 60, 9.0),
        ];
        let frontier = extract_frontier(&trials, 100).unwrap();
        assert_eq!(pairs(&frontier), vec![(100.0, 10.0), (95.0, 4.0)]);
        assert_eq!(frontier[1].parameters.get("step_ratio"), Some(8.0));
    }

    #[test]
    fn cheaper_lower_accuracy_trials_stay_on_frontier() {
        let trials = vec![
            trial(1.0, 100, 10.0),
            trial(2.0, 90, 6.0),
            trial(3.0, 70, 2.0),
            trial(4.0, 90, 8.0),
        ];
        let frontier = extract_frontier(&trials, 100).unwrap();
        assert_eq!(pairs(&frontier), vec![(100.0, 10.0), (90.0, 6.0), (70.0, 2.0)]);
    }

    #[test]
    fn identical_trials_keep_first_in_stable_order() {
        let trials = vec![trial(1.0, 50, 3.0), trial(2.0, 50, 3.0)];
        let frontier = extract_frontier(&trials, 50).unwrap();
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier[0].parameters.get("step_ratio"), Some(1.0));
    }

    #[test]
    fn accuracy_is_capped_at_100() {
        assert_eq!(accuracy_pct(120, 100), 100.0);
        assert!((accuracy_pct(49, 98) - 50.0).abs() < 1e-12);

        // Over-detection ties the reference at 100%; only the cheaper one survives.
        let trials = vec![trial(1.0, 100, 10.0), trial(2.0, 104, 12.0)];
        let frontier = extract_frontier(&trials, 100).unwrap();
        assert_eq!(pairs(&frontier), vec![(100.0, 10.0)]);
    }

    #[test]
    fn zero_ground_truth_is_rejected() {
        let trials = vec![trial(1.0, 0, 1.0)];
        assert_eq!(
            extract_frontier(&trials, 0).unwrap_err(),
            AnalysisError::InvalidGroundTruth(0)
        );
        assert_eq!(
            resolve_ground_truth(&trials, GroundTruth::First).unwrap_err(),
            AnalysisError::InvalidGroundTruth(0)
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(extract_frontier(&[], 10).unwrap_err(), AnalysisError::EmptyInput);
        assert_eq!(
            resolve_ground_truth(&[], GroundTruth::Max).unwrap_err(),
            AnalysisError::EmptyInput
        );
    }

    #[test]
    fn non_finite_cost_is_rejected() {
        let trials = vec![trial(1.0, 10, f64::NAN)];
        assert!(matches!(
            extract_frontier(&trials, 10),
            Err(AnalysisError::InvalidTrial(_))
        ));
    }

    #[test]
    fn ground_truth_policies() {
        let trials = vec![trial(1.0, 90, 1.0), trial(2.0, 120, 2.0)];
        assert_eq!(resolve_ground_truth(&trials, GroundTruth::First).unwrap(), 90);
        assert_eq!(resolve_ground_truth(&trials, GroundTruth::Max).unwrap(), 120);
        assert_eq!(resolve_ground_truth(&trials, GroundTruth::Count(7)).unwrap(), 7);
    }

    #[test]
    fn summary_counts_points_above_threshold() {
        let trials = vec![
            trial(1.0, 1000, 10.0),
            trial(2.0, 990, 7.0),
            trial(3.0, 970, 5.0),
        ];
        let summary = summarize_frontier(&trials, 1000, 98.0).unwrap();
        assert_eq!(summary.points.len(), 3);
        assert_eq!(summary.above_threshold, 2);
        assert_eq!(summary.trials, 3);
    }
}
