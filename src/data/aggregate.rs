//! Averaging repeated configurations and splitting trials into groups.
//!
//! Benchmarks run each configuration several times. Before fitting, repeated
//! runs of the same configuration collapse to their mean so every distinct
//! parameter value contributes one observation.

use std::collections::HashMap;

use crate::domain::{ParameterSet, Trial};

/// Collapse trials with identical parameters into one trial holding the mean
/// cost and the rounded mean detection count.
///
/// Output order follows the first appearance of each configuration.
pub fn aggregate_trials(trials: &[Trial]) -> Vec<Trial> {
    let mut index: HashMap<Vec<(String, u64)>, usize> = HashMap::new();
    let mut groups: Vec<(Trial, f64, f64, usize)> = Vec::new();

    for trial in trials {
        let key = trial.parameters.group_key();
        match index.get(&key) {
            Some(&slot) => {
                let entry = &mut groups[slot];
                entry.1 += trial.cost;
                entry.2 += trial.detection_count as f64;
                entry.3 += 1;
            }
            None => {
                index.insert(key, groups.len());
                groups.push((trial.clone(), trial.cost, trial.detection_count as f64, 1));
            }
        }
    }

    groups
        .into_iter()
        .map(|(first, cost_sum, det_sum, n)| {
            let n = n as f64;
            Trial::new(first.parameters, cost_sum / n, (det_sum / n).round() as u64)
        })
        .collect()
}

/// One independent slice of the input.
#[derive(Debug, Clone)]
pub struct TrialGroup {
    pub label: String,
    pub trials: Vec<Trial>,
}

/// Split trials by the value of `column`, ordered by that value.
///
/// The grouping column is removed from the trials' parameters so it does not
/// keep otherwise-identical configurations apart downstream.
pub fn group_by_column(trials: &[Trial], column: &str) -> Vec<TrialGroup> {
    let mut groups: Vec<(f64, Vec<Trial>)> = Vec::new();

    for trial in trials {
        let Some(value) = trial.parameters.get(column) else {
            continue;
        };
        let mut stripped = trial.clone();
        stripped.parameters = trial
            .parameters
            .iter()
            .filter(|(name, _)| *name != column)
            .fold(ParameterSet::new(), |acc, (n, v)| acc.with(n, v));

        match groups.iter_mut().find(|(v, _)| *v == value) {
            Some((_, members)) => members.push(stripped),
            None => groups.push((value, vec![stripped])),
        }
    }

    groups.sort_by(|a, b| a.0.total_cmp(&b.0));
    groups
        .into_iter()
        .map(|(value, trials)| TrialGroup {
            label: format!("{column}={value}"),
            trials,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(tol: f64, prepass: f64, cost: f64, det: u64) -> Trial {
        Trial::new(
            ParameterSet::new().with("tolerance_km", tol).with("prepass_km", prepass),
            cost,
            det,
        )
    }

    #[test]
    fn repeated_configurations_are_averaged() {
        let trials = vec![
            trial(40.0, 10.0, 10.0, 100),
            trial(60.0, 10.0, 8.0, 90),
            trial(40.0, 10.0, 12.0, 103),
        ];
        let agg = aggregate_trials(&trials);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg[0].parameters.get("tolerance_km"), Some(40.0));
        assert_eq!(agg[0].cost, 11.0);
        assert_eq!(agg[0].detection_count, 102); // 101.5 rounds half away from zero
        assert_eq!(agg[1].cost, 8.0);
    }

    #[test]
    fn groups_are_split_and_ordered_by_value() {
        let trials = vec![
            trial(40.0, 20.0, 10.0, 1),
            trial(40.0, 5.0, 9.0, 1),
            trial(60.0, 20.0, 11.0, 1),
        ];
        let groups = group_by_column(&trials, "prepass_km");
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["prepass_km=5", "prepass_km=20"]);
        assert_eq!(groups[1].trials.len(), 2);
        assert_eq!(groups[1].trials[0].parameters.get("prepass_km"), None);
        assert_eq!(groups[1].trials[0].parameters.get("tolerance_km"), Some(40.0));
    }
}
