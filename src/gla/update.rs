//! Error-driven update rules.
//!
//! Both rules compare the violation vector of the wrongly predicted
//! candidate against the observed target and move ranking values so the
//! target gains ground. Values never drop below 0.

use serde::{Deserialize, Serialize};

use super::state::RankingState;
use crate::selector::Regime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRule {
    /// Plasticity-scaled perceptron update over MaxEnt weights.
    Perceptron,
    /// Magri's convergent promotion/demotion over ranking values.
    Magri,
}

impl UpdateRule {
    /// Selection regime the rule is trained against.
    pub fn regime(self) -> Regime {
        match self {
            UpdateRule::Perceptron => Regime::MaxEnt,
            UpdateRule::Magri => Regime::Categorical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UpdateRule::Perceptron => "perceptron",
            UpdateRule::Magri => "magri",
        }
    }
}

/// What an update changed, for logging and tracing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateSummary {
    /// Constraints whose value was raised.
    pub promoted: Vec<usize>,
    /// Constraints whose value was lowered (before clamping).
    pub demoted: Vec<usize>,
    /// Per-constraint promotion step (Magri rule only).
    pub promotion_step: Option<f64>,
}

/// ranking[c] += plasticity * (predicted[c] - target[c]), clamped at 0.
pub fn perceptron_update(
    state: &mut RankingState,
    predicted: &[u32],
    target: &[u32],
    plasticity: f64,
) -> UpdateSummary {
    let mut summary = UpdateSummary::default();
    for c in 0..state.len() {
        let diff = f64::from(predicted[c]) - f64::from(target[c]);
        if diff > 0.0 {
            summary.promoted.push(c);
        } else if diff < 0.0 {
            summary.demoted.push(c);
        }
        state.adjust(c, plasticity * diff);
    }
    summary
}

/// Magri's promotion/demotion step.
///
/// Winner-preferrers are constraints on which the wrong prediction has more
/// violations than the target. Every loser-preferrer ranked at or above the
/// highest winner-preferrer is demoted by `plasticity`; then every
/// winner-preferrer is promoted by
/// `plasticity * undominated / (winner_preferrers + margin)`.
pub fn magri_update(
    state: &mut RankingState,
    predicted: &[u32],
    target: &[u32],
    plasticity: f64,
    margin: f64,
) -> UpdateSummary {
    let n = state.len();
    let winner_preferrers: Vec<usize> = (0..n).filter(|&c| predicted[c] > target[c]).collect();
    let highest_winner_preferrer = winner_preferrers
        .iter()
        .map(|&c| state.get(c))
        .fold(0.0, f64::max);

    let undominated: Vec<usize> = (0..n)
        .filter(|&c| target[c] > predicted[c] && state.get(c) >= highest_winner_preferrer)
        .collect();
    for &c in &undominated {
        state.adjust(c, -plasticity);
    }

    let step = undominated.len() as f64 / (winner_preferrers.len() as f64 + margin);
    for &c in &winner_preferrers {
        state.adjust(c, plasticity * step);
    }

    UpdateSummary {
        promoted: winner_preferrers,
        demoted: undominated,
        promotion_step: Some(plasticity * step),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magri_promotion_and_demotion_arithmetic() {
        // c0 prefers the loser and sits above both winner-preferrers.
        let mut state = RankingState::from_values(vec![5.0, 3.0, 2.0]);
        let predicted = [0, 1, 1];
        let target = [1, 0, 0];
        let summary = magri_update(&mut state, &predicted, &target, 0.1, 1.0);

        assert_eq!(summary.demoted, vec![0]);
        assert_eq!(summary.promoted, vec![1, 2]);
        assert!((state.get(0) - 4.9).abs() < 1e-12);
        assert!((state.get(1) - (3.0 + 0.1 / 3.0)).abs() < 1e-12);
        assert!((state.get(2) - (2.0 + 0.1 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn magri_leaves_dominated_loser_preferrers_alone() {
        let mut state = RankingState::from_values(vec![1.0, 3.0]);
        // c0 prefers the loser but is already below the winner-preferrer c1.
        let summary = magri_update(&mut state, &[0, 1], &[1, 0], 0.1, 1.0);
        assert!(summary.demoted.is_empty());
        assert_eq!(state.values(), &[1.0, 3.0]);
    }

    #[test]
    fn perceptron_clamps_at_zero() {
        let mut state = RankingState::from_values(vec![0.05, 1.0]);
        perceptron_update(&mut state, &[0, 2], &[1, 0], 0.1);
        assert_eq!(state.get(0), 0.0);
        assert!((state.get(1) - 1.2).abs() < 1e-12);
    }
}
