//! Recursive Constraint Demotion (Tesar & Smolensky) over comparative
//! mark-data pairs.
//!
//! Each round installs every constraint that prefers no loser among the
//! still-unexplained pairs, marks the pairs those constraints explain, and
//! demotes the rest. The rounds run as a loop over two owned working sets
//! (unranked constraints, unexplained pairs); nothing is shared between
//! rounds.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::TableauError;
use crate::tableau::Tableau;

/// Comparative sign of one constraint on one winner/loser pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Preference {
    /// The loser has more violations: the constraint favors the winner.
    W,
    /// The winner has more violations: the constraint favors the loser.
    L,
    /// Equal violations.
    E,
}

impl Preference {
    pub fn compare(winner: u32, loser: u32) -> Self {
        match loser.cmp(&winner) {
            std::cmp::Ordering::Greater => Preference::W,
            std::cmp::Ordering::Less => Preference::L,
            std::cmp::Ordering::Equal => Preference::E,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkDataPair {
    pub input: usize,
    pub winner: usize,
    pub loser: usize,
    /// One sign per constraint.
    pub signs: Vec<Preference>,
}

impl MarkDataPair {
    pub fn from_signs(signs: Vec<Preference>) -> Self {
        Self {
            input: 0,
            winner: 0,
            loser: 0,
            signs,
        }
    }

    fn sign(&self, constraint: usize) -> Preference {
        self.signs.get(constraint).copied().unwrap_or(Preference::E)
    }
}

/// Build one pair per non-winning candidate of every attested input.
///
/// Inputs with no attested candidate contribute nothing; inputs with more
/// than one are rejected.
pub fn mark_data_pairs(tableau: &Tableau) -> Result<Vec<MarkDataPair>, TableauError> {
    tableau.check_single_winners()?;
    let mut mdps = Vec::new();
    for (i, input) in tableau.inputs().iter().enumerate() {
        let Some(&winner) = input.attested().first() else {
            debug!(input = %input.form, "no attested candidate; skipping");
            continue;
        };
        let winner_violations = &input.candidates[winner].violations;
        for (c, cand) in input.candidates.iter().enumerate() {
            if c == winner {
                continue;
            }
            let signs = winner_violations
                .iter()
                .zip(cand.violations.iter())
                .map(|(&w, &l)| Preference::compare(w, l))
                .collect();
            mdps.push(MarkDataPair {
                input: i,
                winner,
                loser: c,
                signs,
            });
        }
    }
    Ok(mdps)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "constraints", rename_all = "snake_case")]
pub enum Stratum {
    Ranked(Vec<usize>),
    /// Constraints left over when no remaining constraint could be installed.
    Paradox(Vec<usize>),
}

impl Stratum {
    pub fn constraints(&self) -> &[usize] {
        match self {
            Stratum::Ranked(c) | Stratum::Paradox(c) => c,
        }
    }

    pub fn is_paradox(&self) -> bool {
        matches!(self, Stratum::Paradox(_))
    }
}

/// Strata, highest first. Only the last stratum can be a paradox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hierarchy {
    pub strata: Vec<Stratum>,
}

impl Hierarchy {
    pub fn is_consistent(&self) -> bool {
        !self.strata.last().is_some_and(Stratum::is_paradox)
    }

    /// Constraints that could not be ranked, if any.
    pub fn paradox(&self) -> Option<&[usize]> {
        match self.strata.last() {
            Some(Stratum::Paradox(c)) => Some(c),
            _ => None,
        }
    }

    /// Strict total order, ties inside a stratum kept in index order.
    pub fn flatten(&self) -> Vec<usize> {
        self.strata
            .iter()
            .flat_map(|s| s.constraints().iter().copied())
            .collect()
    }

    pub fn named(&self, names: &[String]) -> Vec<Vec<String>> {
        self.strata
            .iter()
            .map(|s| s.constraints().iter().map(|&c| names[c].clone()).collect())
            .collect()
    }
}

/// Stratify `constraint_count` constraints against `mdps`.
pub fn recursive_constraint_demotion(mdps: &[MarkDataPair], constraint_count: usize) -> Hierarchy {
    let mut strata = Vec::new();
    let mut unranked: Vec<usize> = (0..constraint_count).collect();
    let mut active: Vec<&MarkDataPair> = mdps.iter().collect();

    while !unranked.is_empty() {
        let (rankable, demoted): (Vec<usize>, Vec<usize>) = unranked
            .iter()
            .partition(|&&c| !active.iter().any(|m| m.sign(c) == Preference::L));

        if demoted.is_empty() {
            strata.push(Stratum::Ranked(rankable));
            break;
        }
        if rankable.is_empty() {
            warn!(
                unranked = ?demoted,
                unexplained = active.len(),
                "ranking paradox: no remaining constraint can be installed"
            );
            strata.push(Stratum::Paradox(demoted));
            break;
        }

        active.retain(|m| !rankable.iter().any(|&c| m.sign(c) == Preference::W));
        debug!(
            stratum = strata.len() + 1,
            installed = ?rankable,
            remaining = active.len(),
            "installed stratum"
        );
        strata.push(Stratum::Ranked(rankable));
        unranked = demoted;
    }

    Hierarchy { strata }
}

/// Whether a strict order explains every pair: for each pair, the highest
/// ordered constraint with a non-neutral sign must favor the winner.
pub fn order_explains(order: &[usize], mdps: &[MarkDataPair]) -> bool {
    mdps.iter().all(|m| {
        order
            .iter()
            .map(|&c| m.sign(c))
            .find(|&s| s != Preference::E)
            .map_or(true, |s| s == Preference::W)
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct RcdResult {
    pub mdps: Vec<MarkDataPair>,
    pub hierarchy: Hierarchy,
}

/// Build mark-data pairs from `tableau` and stratify its constraints.
pub fn rank(tableau: &Tableau) -> Result<RcdResult, TableauError> {
    let mdps = mark_data_pairs(tableau)?;
    let hierarchy = recursive_constraint_demotion(&mdps, tableau.constraint_count());
    Ok(RcdResult { mdps, hierarchy })
}
