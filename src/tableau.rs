//! Tableau model: constraints, inputs, candidates and the training corpus.
//!
//! A [`Tableau`] is built once and never mutated afterwards. Learners read
//! violation vectors and frequencies from it and sample training pairs
//! through a [`TrainingCorpus`].

use std::collections::HashSet;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FormatError, TableauError};

// ---------------------------------------------------------------------
//  Constraints
// ---------------------------------------------------------------------

/// Declared constraint type, used only to seed the initial ranking value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConstraintType {
    Markedness,
    Faithfulness,
    /// Seed with a uniform draw from [0, 1).
    Random,
    /// Seed with this exact value.
    Initial(f64),
    #[default]
    Unspecified,
}

impl ConstraintType {
    /// Normalize a type token from a constraint-type file.
    ///
    /// Returns `None` for tokens that name no known type.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let mut chars = token.chars();
        match chars.next() {
            Some('M' | 'm') => return Some(Self::Markedness),
            Some('F' | 'f') => return Some(Self::Faithfulness),
            Some('R' | 'r') => {
                let rest = chars.as_str();
                let rest = rest.strip_prefix('a').unwrap_or(rest);
                if rest.starts_with("nd") {
                    return Some(Self::Random);
                }
            }
            _ => {}
        }
        match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(Self::Initial(v)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub ctype: ConstraintType,
}

impl Constraint {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            ctype: ConstraintType::Unspecified,
        }
    }

    pub fn with_type(mut self, ctype: ConstraintType) -> Self {
        self.ctype = ctype;
        self
    }
}

/// One `name \t type` line from a constraint-type file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintTypeEntry {
    pub name: String,
    pub token: String,
}

/// Non-fatal problems found while applying constraint types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeWarning {
    /// The token names no known type; the general default applies.
    UnknownType { constraint: String, token: String },
    /// The entry names a constraint that is not in the tableau.
    UnknownConstraint { name: String },
}

// ---------------------------------------------------------------------
//  Inputs and candidates
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub form: String,
    /// Observed frequency; 0 for unattested candidates.
    pub frequency: u32,
    /// One count per constraint, in constraint order.
    pub violations: Vec<u32>,
}

impl Candidate {
    pub fn new(form: impl Into<String>, frequency: u32, violations: Vec<u32>) -> Self {
        Self {
            form: form.into(),
            frequency,
            violations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub form: String,
    pub candidates: Vec<Candidate>,
}

impl Input {
    pub fn new(form: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            form: form.into(),
            candidates,
        }
    }

    pub fn total_frequency(&self) -> u64 {
        self.candidates.iter().map(|c| u64::from(c.frequency)).sum()
    }

    /// Indices of candidates with positive frequency.
    pub fn attested(&self) -> Vec<usize> {
        self.candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.frequency > 0)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Relative frequency of each candidate (all zeros for unattested inputs).
    pub fn given_probabilities(&self) -> Vec<f64> {
        let total = self.total_frequency();
        self.candidates
            .iter()
            .map(|c| {
                if total == 0 {
                    0.0
                } else {
                    f64::from(c.frequency) / total as f64
                }
            })
            .collect()
    }
}

/// Whether an input may have more than one attested candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerPolicy {
    /// Strict ranking: at most one attested candidate per input.
    SingleWinner,
    /// Several attested candidates are free variation, sampled by frequency.
    FreeVariation,
}

// ---------------------------------------------------------------------
//  Tableau
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tableau {
    constraints: Vec<Constraint>,
    inputs: Vec<Input>,
}

impl Tableau {
    /// Validate and assemble a tableau.
    ///
    /// Every candidate must carry exactly one violation count per constraint,
    /// constraint names must be unique and every input needs a candidate.
    /// Under [`WinnerPolicy::SingleWinner`] an input with several attested
    /// candidates is rejected.
    pub fn new(
        constraints: Vec<Constraint>,
        inputs: Vec<Input>,
        policy: WinnerPolicy,
    ) -> Result<Self, TableauError> {
        let mut seen = HashSet::new();
        for c in &constraints {
            if !seen.insert(c.name.as_str()) {
                return Err(FormatError::DuplicateConstraint(c.name.clone()).into());
            }
        }

        let expected = constraints.len();
        for input in &inputs {
            if input.candidates.is_empty() {
                return Err(FormatError::NoCandidates(input.form.clone()).into());
            }
            for cand in &input.candidates {
                if cand.violations.len() != expected {
                    return Err(FormatError::ViolationLength {
                        input: input.form.clone(),
                        candidate: cand.form.clone(),
                        expected,
                        found: cand.violations.len(),
                    }
                    .into());
                }
            }
        }

        let tableau = Self {
            constraints,
            inputs,
        };
        match policy {
            WinnerPolicy::SingleWinner => tableau.check_single_winners()?,
            WinnerPolicy::FreeVariation => {
                for (idx, input) in tableau.inputs.iter().enumerate() {
                    if input.attested().len() > 1 {
                        tracing::debug!(input = idx, form = %input.form, "free variation");
                    }
                }
            }
        }
        Ok(tableau)
    }

    /// Reject any input with more than one attested candidate.
    pub fn check_single_winners(&self) -> Result<(), TableauError> {
        for (idx, input) in self.inputs.iter().enumerate() {
            if input.attested().len() > 1 {
                return Err(TableauError::MultipleWinners {
                    input: input.form.clone(),
                    index: idx + 1,
                });
            }
        }
        Ok(())
    }

    /// Apply declared constraint types, returning the re-typed tableau.
    pub fn with_constraint_types(
        mut self,
        entries: &[ConstraintTypeEntry],
    ) -> (Self, Vec<TypeWarning>) {
        let mut warnings = Vec::new();
        for entry in entries {
            let Some(constraint) = self.constraints.iter_mut().find(|c| c.name == entry.name)
            else {
                warn!(constraint = %entry.name, "unknown constraint in constraint types");
                warnings.push(TypeWarning::UnknownConstraint {
                    name: entry.name.clone(),
                });
                continue;
            };
            constraint.ctype = match ConstraintType::parse(&entry.token) {
                Some(ctype) => ctype,
                None => {
                    warn!(
                        constraint = %entry.name,
                        token = %entry.token,
                        "unknown constraint type; using the general default"
                    );
                    warnings.push(TypeWarning::UnknownType {
                        constraint: entry.name.clone(),
                        token: entry.token.clone(),
                    });
                    ConstraintType::Unspecified
                }
            };
        }
        (self, warnings)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraint_names(&self) -> Vec<String> {
        self.constraints.iter().map(|c| c.name.clone()).collect()
    }

    pub fn constraint_index(&self, name: &str) -> Option<usize> {
        self.constraints.iter().position(|c| c.name == name)
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn input(&self, idx: usize) -> Option<&Input> {
        self.inputs.get(idx)
    }

    pub fn candidates(&self, input: usize) -> &[Candidate] {
        self.inputs
            .get(input)
            .map(|i| i.candidates.as_slice())
            .unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------
//  Training corpus
// ---------------------------------------------------------------------

/// Frequency-weighted multiset of (input, candidate) pairs.
///
/// Sampling is uniform over the multiset, so a pair is drawn with
/// probability proportional to its observed frequency.
#[derive(Debug, Clone)]
pub struct TrainingCorpus {
    pairs: Vec<(usize, usize)>,
    total: u64,
    index: WeightedIndex<u64>,
}

impl TrainingCorpus {
    pub fn from_tableau(tableau: &Tableau) -> Result<Self, TableauError> {
        let mut pairs = Vec::new();
        let mut weights = Vec::new();
        for (i, input) in tableau.inputs().iter().enumerate() {
            for (c, cand) in input.candidates.iter().enumerate() {
                if cand.frequency > 0 {
                    pairs.push((i, c));
                    weights.push(u64::from(cand.frequency));
                }
            }
        }
        let total = weights.iter().sum();
        let index = WeightedIndex::new(&weights).map_err(|_| TableauError::EmptyCorpus)?;
        Ok(Self {
            pairs,
            total,
            index,
        })
    }

    /// Draw one (input, candidate) pair.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        self.pairs[self.index.sample(rng)]
    }

    /// Size of the multiset (sum of all frequencies).
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Distinct attested (input, candidate) pairs.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_tokens() {
        assert_eq!(ConstraintType::parse("M"), Some(ConstraintType::Markedness));
        assert_eq!(ConstraintType::parse("markedness"), Some(ConstraintType::Markedness));
        assert_eq!(ConstraintType::parse("faith"), Some(ConstraintType::Faithfulness));
        assert_eq!(ConstraintType::parse("rnd"), Some(ConstraintType::Random));
        assert_eq!(ConstraintType::parse("Random"), Some(ConstraintType::Random));
        assert_eq!(ConstraintType::parse("12.5"), Some(ConstraintType::Initial(12.5)));
        assert_eq!(ConstraintType::parse(" 3 "), Some(ConstraintType::Initial(3.0)));
    }

    #[test]
    fn rejects_unknown_type_tokens() {
        assert_eq!(ConstraintType::parse("r"), None);
        assert_eq!(ConstraintType::parse("Rx"), None);
        assert_eq!(ConstraintType::parse("nan"), None);
        assert_eq!(ConstraintType::parse("inf"), None);
        assert_eq!(ConstraintType::parse(""), None);
        assert_eq!(ConstraintType::parse("optional"), None);
    }

    #[test]
    fn given_probabilities_of_unattested_input_are_zero() {
        let input = Input::new(
            "x",
            vec![Candidate::new("a", 0, vec![]), Candidate::new("b", 0, vec![])],
        );
        assert_eq!(input.given_probabilities(), vec![0.0, 0.0]);
    }
}
