//! Ranking state and its snapshot history.

use rand::Rng;
use serde::Serialize;
use tracing::warn;

use crate::config::LearnerConfig;
use crate::tableau::{ConstraintType, Tableau};

/// One non-negative ranking value (or weight) per constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingState {
    values: Vec<f64>,
}

impl RankingState {
    /// Build a state from explicit values, clamping negatives to 0.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            values: values.into_iter().map(|v| v.max(0.0)).collect(),
        }
    }

    /// Seed each constraint from its declared type.
    pub fn seeded<R: Rng + ?Sized>(tableau: &Tableau, cfg: &LearnerConfig, rng: &mut R) -> Self {
        let values = tableau
            .constraints()
            .iter()
            .map(|c| {
                let v = match c.ctype {
                    ConstraintType::Markedness => cfg.initial_markedness,
                    ConstraintType::Faithfulness => cfg.initial_faithfulness,
                    ConstraintType::Random => rng.gen_range(0.0..1.0),
                    ConstraintType::Initial(v) => v,
                    ConstraintType::Unspecified => cfg.initial_default,
                };
                if v < 0.0 {
                    warn!(constraint = %c.name, value = v, "negative initial value clamped to 0");
                }
                v.max(0.0)
            })
            .collect();
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, constraint: usize) -> f64 {
        self.values[constraint]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add `delta` to a constraint's value, clamping the result at 0.
    pub fn adjust(&mut self, constraint: usize, delta: f64) {
        let v = &mut self.values[constraint];
        *v = (*v + delta).max(0.0);
    }

    /// Constraint indices sorted by descending value (stable on ties).
    pub fn descending(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| {
            self.values[b]
                .partial_cmp(&self.values[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingSnapshot {
    /// Number of completed trials when the snapshot was taken.
    pub trial: usize,
    pub values: Vec<f64>,
}

/// Append-only time series of ranking states.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingHistory {
    pub constraint_names: Vec<String>,
    pub snapshots: Vec<RankingSnapshot>,
}

impl RankingHistory {
    pub fn new(constraint_names: Vec<String>) -> Self {
        Self {
            constraint_names,
            snapshots: Vec::new(),
        }
    }

    pub fn record(&mut self, trial: usize, state: &RankingState) {
        if self.snapshots.last().is_some_and(|s| s.trial == trial) {
            return;
        }
        self.snapshots.push(RankingSnapshot {
            trial,
            values: state.values().to_vec(),
        });
    }

    pub fn last(&self) -> Option<&RankingSnapshot> {
        self.snapshots.last()
    }

    /// Values of one constraint across all snapshots.
    pub fn series(&self, constraint: usize) -> Vec<(usize, f64)> {
        self.snapshots
            .iter()
            .filter_map(|s| s.values.get(constraint).map(|&v| (s.trial, v)))
            .collect()
    }
}
