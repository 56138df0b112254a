//! Text and JSON reports for learning and RCD runs.

use std::fmt::Write as _;

use serde::Serialize;

use crate::gla::{LearningReport, RankingHistory, StopReason, UpdateRule};
use crate::rcd::{Hierarchy, Stratum};
use crate::tableau::Tableau;

pub const CANDIDATE_TABLE_HEADER: &str =
    "Input\tOutput\tHarmony\tMaxEnt Score\tPredicted Prob\tGiven Prob\tTrained Freq";

pub const PARADOX_BANNER: &str = "****A ranking contradiction prevented RCD from arriving at a \
                                  working ranking. The data is not OT-consistent.";

/// Per-candidate results, one tab-separated row per candidate.
pub fn render_candidate_table(report: &LearningReport) -> String {
    let mut out = String::new();
    out.push_str(CANDIDATE_TABLE_HEADER);
    out.push('\n');
    for row in &report.candidates {
        let _ = writeln!(
            out,
            "/{}/\t[{}]\t{}\t{}\t{}\t{}\t{}",
            row.input,
            row.candidate,
            row.harmony,
            row.maxent_score,
            row.predicted_probability,
            row.given_probability,
            row.sampled_frequency
        );
    }
    out
}

/// Ranking-value time series: a `Time` column, then one column per constraint.
pub fn render_history_tsv(history: &RankingHistory) -> String {
    let mut out = String::new();
    out.push_str("Time");
    for name in &history.constraint_names {
        out.push('\t');
        out.push_str(name);
    }
    out.push('\n');
    for snap in &history.snapshots {
        out.push_str(&snap.trial.to_string());
        for v in &snap.values {
            let _ = write!(out, "\t{v}");
        }
        out.push('\n');
    }
    out
}

/// Final values, highest first.
pub fn render_final_values(report: &LearningReport) -> String {
    let mut out = String::new();
    for cv in &report.ranked {
        let _ = writeln!(out, "\t{}\t{}", cv.name, cv.value);
    }
    out
}

/// Numbered strata; a paradox stratum is flagged and the banner leads.
pub fn render_hierarchy(hierarchy: &Hierarchy, names: &[String]) -> String {
    let mut out = String::new();
    if !hierarchy.is_consistent() {
        out.push_str(PARADOX_BANNER);
        out.push('\n');
    }
    for (s, stratum) in hierarchy.strata.iter().enumerate() {
        let _ = writeln!(out, "\nStratum {}:", s + 1);
        for &c in stratum.constraints() {
            let _ = writeln!(out, "\t{}", names[c]);
        }
        if stratum.is_paradox() {
            out.push_str("***** Ranking paradox *****\n");
        }
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct RcdReport {
    pub tableau_hash: String,
    pub consistent: bool,
    pub mark_data_pairs: usize,
    pub strata: Vec<Vec<String>>,
    /// Constraints that could not be ranked.
    pub paradox: Option<Vec<String>>,
}

impl RcdReport {
    pub fn new(tableau: &Tableau, hierarchy: &Hierarchy, mark_data_pairs: usize) -> Self {
        let names = tableau.constraint_names();
        let paradox = hierarchy
            .strata
            .iter()
            .find_map(|s| match s {
                Stratum::Paradox(c) => Some(c.iter().map(|&i| names[i].clone()).collect()),
                Stratum::Ranked(_) => None,
            });
        Self {
            tableau_hash: tableau_hash(tableau),
            consistent: hierarchy.is_consistent(),
            mark_data_pairs,
            strata: hierarchy.named(&names),
            paradox,
        }
    }
}

/// What is needed to reproduce a learning run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStamp {
    pub tableau_hash: String,
    pub rule: UpdateRule,
    pub rng_seed: u64,
    pub trials: usize,
}

impl RunStamp {
    pub fn new(tableau: &Tableau, rule: UpdateRule, rng_seed: u64, trials: usize) -> Self {
        Self {
            tableau_hash: tableau_hash(tableau),
            rule,
            rng_seed,
            trials,
        }
    }
}

pub fn render_learning_markdown(report: &LearningReport, stamp: &RunStamp) -> String {
    let mut out = String::new();
    out.push_str("# Learning Report\n\n");
    let _ = writeln!(out, "- Tableau hash: `{}`", stamp.tableau_hash);
    let _ = writeln!(out, "- Update rule: {}", stamp.rule.as_str());
    let _ = writeln!(out, "- RNG seed: {}", stamp.rng_seed);
    let _ = writeln!(
        out,
        "- Trials run: {} of {}",
        report.trials_run, stamp.trials
    );
    if report.stop_reason == StopReason::Cancelled {
        out.push_str("- Stopped early: cancelled\n");
    }
    let _ = writeln!(out, "- Updates: {}", report.updates);
    let _ = writeln!(out, "- Final plasticity: {:.6}", report.final_plasticity);
    let _ = writeln!(out, "- Corpus size: {}", report.corpus_size);
    let _ = writeln!(out, "- Sampling anomalies: {}", report.anomalies.len());

    out.push_str("\n## Final values\n\n");
    for cv in &report.ranked {
        let _ = writeln!(out, "- {}: {:.4}", cv.name, cv.value);
    }

    out.push_str("\n## Candidates\n\n");
    out.push_str("| Input | Output | Harmony | Predicted | Given | Trained |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for row in &report.candidates {
        let _ = writeln!(
            out,
            "| /{}/ | [{}] | {:.4} | {:.4} | {:.4} | {} |",
            row.input,
            row.candidate,
            row.harmony,
            row.predicted_probability,
            row.given_probability,
            row.sampled_frequency
        );
    }
    out
}

pub fn tableau_hash(tableau: &Tableau) -> String {
    let bytes = serde_json::to_vec(tableau).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_banner_only_on_paradox() {
        let names = vec!["A".to_string(), "B".to_string()];
        let ok = Hierarchy {
            strata: vec![Stratum::Ranked(vec![0]), Stratum::Ranked(vec![1])],
        };
        let text = render_hierarchy(&ok, &names);
        assert!(!text.contains(PARADOX_BANNER));
        assert!(text.contains("Stratum 2:\n\tB\n"));

        let bad = Hierarchy {
            strata: vec![Stratum::Paradox(vec![0, 1])],
        };
        let text = render_hierarchy(&bad, &names);
        assert!(text.starts_with(PARADOX_BANNER));
        assert!(text.contains("***** Ranking paradox *****"));
    }
}
