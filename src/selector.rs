//! Candidate selection under a ranking state.
//!
//! Two regimes:
//! - Categorical: resolve the ranking values into a strict order (ties
//!   shuffled), then eliminate candidates by mark cancellation.
//! - MaxEnt: score each candidate by exp(-harmony), normalize, sample.
//!
//! Both are pure functions of (input, values) apart from the RNG.

use std::cmp::Ordering;

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tableau::Input;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Classical OT evaluation over a strict order.
    Categorical,
    /// Log-linear sampling over weighted violations.
    MaxEnt,
}

/// Result of one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Unique(usize),
    /// Several candidates survived every constraint; one was picked at random.
    Tied { chosen: usize, survivors: Vec<usize> },
    /// Nothing survived (an input with no candidates).
    Empty,
}

impl Selection {
    pub fn winner(&self) -> Option<usize> {
        match self {
            Selection::Unique(idx) => Some(*idx),
            Selection::Tied { chosen, .. } => Some(*chosen),
            Selection::Empty => None,
        }
    }
}

// ---------------------------------------------------------------------
//  Categorical selection
// ---------------------------------------------------------------------

/// Constraint indices by descending value, each block of equal values
/// shuffled uniformly.
pub fn resolve_order<R: Rng + ?Sized>(values: &[f64], rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap_or(Ordering::Equal));

    let mut start = 0;
    while start < order.len() {
        let value = values[order[start]];
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == value {
            end += 1;
        }
        if end - start > 1 {
            order[start..end].shuffle(rng);
        }
        start = end;
    }
    order
}

/// Mark cancellation over a strict constraint order.
///
/// At each constraint every contender with more violations than the best
/// remaining contender is eliminated; evaluation stops once one remains.
pub fn harmonic_select<R: Rng + ?Sized>(input: &Input, order: &[usize], rng: &mut R) -> Selection {
    let mut contenders: Vec<usize> = (0..input.candidates.len()).collect();
    if contenders.is_empty() {
        return Selection::Empty;
    }

    for &con in order {
        if contenders.len() <= 1 {
            break;
        }
        let min = contenders
            .iter()
            .map(|&c| input.candidates[c].violations[con])
            .min()
            .unwrap_or(0);
        contenders.retain(|&c| input.candidates[c].violations[con] <= min);
    }

    match contenders.len() {
        0 => Selection::Empty,
        1 => Selection::Unique(contenders[0]),
        _ => {
            let chosen = contenders.choose(rng).copied().unwrap_or(contenders[0]);
            Selection::Tied {
                chosen,
                survivors: contenders,
            }
        }
    }
}

pub fn categorical_select<R: Rng + ?Sized>(input: &Input, values: &[f64], rng: &mut R) -> Selection {
    let order = resolve_order(values, rng);
    harmonic_select(input, &order, rng)
}

// ---------------------------------------------------------------------
//  MaxEnt selection
// ---------------------------------------------------------------------

/// Per-candidate MaxEnt quantities for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaxEntScores {
    /// Weighted violation sum per candidate.
    pub harmonies: Vec<f64>,
    /// exp(-harmony), unnormalized. May underflow to 0 for large harmonies.
    pub scores: Vec<f64>,
    /// Normalized probabilities, computed in log space.
    pub probabilities: Vec<f64>,
}

pub fn harmony(violations: &[u32], weights: &[f64]) -> f64 {
    violations
        .iter()
        .zip(weights.iter())
        .map(|(&v, &w)| f64::from(v) * w)
        .sum()
}

/// Normalize log-scores into probabilities, subtracting the maximum first.
pub fn softmax(log_scores: &[f64]) -> Vec<f64> {
    if log_scores.is_empty() {
        return Vec::new();
    }
    let max = log_scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        let uniform = 1.0 / log_scores.len() as f64;
        return vec![uniform; log_scores.len()];
    }
    let exp: Vec<f64> = log_scores.iter().map(|&s| (s - max).exp()).collect();
    let z: f64 = exp.iter().sum();
    exp.iter().map(|&e| e / z).collect()
}

/// Normalize non-negative scores into a probability distribution.
pub fn normalize_scores(scores: &[f64]) -> Vec<f64> {
    let log_scores: Vec<f64> = scores.iter().map(|&s| s.ln()).collect();
    softmax(&log_scores)
}

pub fn maxent_scores(input: &Input, weights: &[f64]) -> MaxEntScores {
    let harmonies: Vec<f64> = input
        .candidates
        .iter()
        .map(|c| harmony(&c.violations, weights))
        .collect();
    let scores = harmonies.iter().map(|h| (-h).exp()).collect();
    let log_scores: Vec<f64> = harmonies.iter().map(|h| -h).collect();
    let probabilities = softmax(&log_scores);
    MaxEntScores {
        harmonies,
        scores,
        probabilities,
    }
}

/// Draw one candidate from the MaxEnt distribution.
pub fn maxent_select<R: Rng + ?Sized>(input: &Input, weights: &[f64], rng: &mut R) -> Selection {
    let probs = maxent_scores(input, weights).probabilities;
    match WeightedIndex::new(&probs) {
        Ok(dist) => Selection::Unique(dist.sample(rng)),
        Err(_) => Selection::Empty,
    }
}

pub fn select<R: Rng + ?Sized>(
    regime: Regime,
    input: &Input,
    values: &[f64],
    rng: &mut R,
) -> Selection {
    match regime {
        Regime::Categorical => categorical_select(input, values, rng),
        Regime::MaxEnt => maxent_select(input, values, rng),
    }
}
