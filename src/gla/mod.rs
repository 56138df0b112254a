//! Online ranking learner (Gradual Learning Algorithm family).
//!
//! A run is `Initializing -> Training(t = 0..N-1) -> Finalizing`:
//! - `OnlineLearner::new` seeds the ranking state from constraint types.
//! - Each `step` decays plasticity, samples a training pair, predicts an
//!   output under the current state and applies the update rule on error.
//! - `finalize` scores every candidate under the final state.
//!
//! Trials are atomic: the loop may stop at any trial boundary (see
//! [`OnlineLearner::run_with`]) and the state stays consistent. All
//! randomness comes from one `StdRng` seeded from the config.

pub mod hooks;
pub mod state;
pub mod update;

use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LearnerConfig;
use crate::error::LearnerError;
use crate::selector::{self, Selection};
use crate::tableau::{Tableau, TrainingCorpus};

pub use hooks::{NoopObserver, ObserverError, TrialObserver};
pub use state::{RankingHistory, RankingSnapshot, RankingState};
pub use update::{magri_update, perceptron_update, UpdateRule, UpdateSummary};

/// A selection that did not end with exactly one survivor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingAnomaly {
    pub trial: usize,
    pub input: usize,
    pub kind: AnomalyKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Identical candidates survived every constraint; one was picked at random.
    MultipleSurvivors { survivors: Vec<usize> },
    /// No candidate survived; the trial was skipped.
    NoSurvivors,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyKind::MultipleSurvivors { survivors } => {
                write!(f, "multiple survivors {survivors:?}")
            }
            AnomalyKind::NoSurvivors => write!(f, "no survivors"),
        }
    }
}

/// Everything that happened in one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    /// 0-based trial index.
    pub trial: usize,
    pub input: usize,
    /// Sampled (observed) candidate.
    pub target: usize,
    /// Candidate the grammar produced; `None` when the trial was skipped.
    pub predicted: Option<usize>,
    /// Plasticity used for this trial.
    pub plasticity: f64,
    /// Present when the prediction was wrong and the state was updated.
    /// A wrong pick among identical candidates updates nothing.
    pub update: Option<UpdateSummary>,
    pub anomaly: Option<SamplingAnomaly>,
}

/// Why the training loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintValue {
    pub name: String,
    pub value: f64,
}

/// Final per-candidate row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateReport {
    pub input_index: usize,
    pub input: String,
    pub candidate: String,
    /// Summed weighted violations.
    pub harmony: f64,
    /// exp(-harmony), unnormalized.
    pub maxent_score: f64,
    pub predicted_probability: f64,
    /// Relative observed frequency within the input.
    pub given_probability: f64,
    /// How often this pair was sampled during training.
    pub sampled_frequency: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningReport {
    pub rule: UpdateRule,
    pub stop_reason: StopReason,
    pub trials_run: usize,
    /// Trials that changed the ranking state: the prediction disagreed
    /// with the sample and the two forms differ in some violation count.
    pub updates: usize,
    pub final_plasticity: f64,
    pub corpus_size: u64,
    /// Final values in constraint order.
    pub values: Vec<f64>,
    /// Final values, highest first.
    pub ranked: Vec<ConstraintValue>,
    pub history: RankingHistory,
    pub candidates: Vec<CandidateReport>,
    pub anomalies: Vec<SamplingAnomaly>,
}

pub struct OnlineLearner<'t> {
    tableau: &'t Tableau,
    corpus: TrainingCorpus,
    config: LearnerConfig,
    rule: UpdateRule,
    state: RankingState,
    plasticity: f64,
    rng: StdRng,
    trial: usize,
    sampled: Vec<Vec<u64>>,
    history: RankingHistory,
    anomalies: Vec<SamplingAnomaly>,
    updates: usize,
    stop_reason: StopReason,
}

impl<'t> OnlineLearner<'t> {
    pub fn new(
        tableau: &'t Tableau,
        rule: UpdateRule,
        config: LearnerConfig,
    ) -> Result<Self, LearnerError> {
        config.validate()?;
        let corpus = TrainingCorpus::from_tableau(tableau)?;
        let mut rng = StdRng::seed_from_u64(config.rng_seed);
        let state = RankingState::seeded(tableau, &config, &mut rng);

        let mut history = RankingHistory::new(tableau.constraint_names());
        history.record(0, &state);

        let sampled = tableau
            .inputs()
            .iter()
            .map(|i| vec![0; i.candidates.len()])
            .collect();

        info!(
            rule = rule.as_str(),
            constraints = tableau.constraint_count(),
            inputs = tableau.inputs().len(),
            corpus = corpus.total(),
            trials = config.trials,
            "starting online learning"
        );
        debug!(initial = ?state.values(), "seeded ranking state");

        Ok(Self {
            tableau,
            corpus,
            plasticity: config.initial_plasticity,
            config,
            rule,
            state,
            rng,
            trial: 0,
            sampled,
            history,
            anomalies: Vec::new(),
            updates: 0,
            stop_reason: StopReason::Completed,
        })
    }

    pub fn state(&self) -> &RankingState {
        &self.state
    }

    pub fn history(&self) -> &RankingHistory {
        &self.history
    }

    /// Completed trials so far.
    pub fn trial(&self) -> usize {
        self.trial
    }

    pub fn plasticity(&self) -> f64 {
        self.plasticity
    }

    pub fn anomalies(&self) -> &[SamplingAnomaly] {
        &self.anomalies
    }

    /// Sample counts per input and candidate.
    pub fn sampled_frequencies(&self) -> &[Vec<u64>] {
        &self.sampled
    }

    /// Run one trial.
    pub fn step(&mut self) -> TrialOutcome {
        let tableau = self.tableau;
        if self.plasticity > 0.0 {
            self.plasticity *= 1.0 - self.config.plasticity_decrement;
        }

        let (input_idx, target) = self.corpus.sample(&mut self.rng);
        self.sampled[input_idx][target] += 1;
        let input = &tableau.inputs()[input_idx];

        let trial = self.trial;
        let selection = selector::select(
            self.rule.regime(),
            input,
            self.state.values(),
            &mut self.rng,
        );
        let (predicted, anomaly) = match selection {
            Selection::Unique(idx) => (Some(idx), None),
            Selection::Tied { chosen, survivors } => {
                warn!(
                    trial,
                    input = %input.form,
                    survivors = ?survivors,
                    "multiple candidates survived evaluation; picked one at random"
                );
                let kind = AnomalyKind::MultipleSurvivors { survivors };
                (Some(chosen), Some(kind))
            }
            Selection::Empty => {
                warn!(trial, input = %input.form, "no candidate survived evaluation; trial skipped");
                (None, Some(AnomalyKind::NoSurvivors))
            }
        };
        let anomaly = anomaly.map(|kind| SamplingAnomaly {
            trial,
            input: input_idx,
            kind,
        });
        if let Some(a) = &anomaly {
            self.anomalies.push(a.clone());
        }

        let update = match predicted {
            Some(pred) if pred == target => None,
            Some(pred)
                if input.candidates[pred].violations == input.candidates[target].violations =>
            {
                // No constraint separates the two forms.
                debug!(
                    trial,
                    input = %input.form,
                    observed = %input.candidates[target].form,
                    produced = %input.candidates[pred].form,
                    "identical violation profiles; nothing to learn"
                );
                None
            }
            Some(pred) => {
                let produced = &input.candidates[pred];
                let observed = &input.candidates[target];
                let summary = match self.rule {
                    UpdateRule::Perceptron => perceptron_update(
                        &mut self.state,
                        &produced.violations,
                        &observed.violations,
                        self.plasticity,
                    ),
                    UpdateRule::Magri => magri_update(
                        &mut self.state,
                        &produced.violations,
                        &observed.violations,
                        self.plasticity,
                        self.config.promotion_margin,
                    ),
                };
                debug!(
                    trial,
                    input = %input.form,
                    observed = %observed.form,
                    produced = %produced.form,
                    promoted = ?summary.promoted,
                    demoted = ?summary.demoted,
                    "learning required"
                );
                self.updates += 1;
                Some(summary)
            }
            None => None,
        };

        self.trial += 1;
        if self.trial % self.config.snapshot_interval == 0 {
            self.history.record(self.trial, &self.state);
        }

        TrialOutcome {
            trial,
            input: input_idx,
            target,
            predicted,
            plasticity: self.plasticity,
            update,
            anomaly,
        }
    }

    /// Run the remaining configured trials.
    pub fn run(&mut self) -> StopReason {
        self.run_with(None, None)
    }

    /// Run the remaining trials, notifying `observer` after each one and
    /// checking `cancel` before each one.
    pub fn run_with(
        &mut self,
        observer: Option<&dyn TrialObserver>,
        cancel: Option<&AtomicBool>,
    ) -> StopReason {
        while self.trial < self.config.trials {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                info!(trial = self.trial, "learning cancelled");
                self.stop_reason = StopReason::Cancelled;
                return StopReason::Cancelled;
            }
            let outcome = self.step();
            if let Some(obs) = observer {
                if let Err(err) = obs.on_trial(self.tableau, &outcome, self.state.values()) {
                    warn!(trial = outcome.trial, error = %err, "trial observer failed");
                }
            }
        }
        self.stop_reason = StopReason::Completed;
        StopReason::Completed
    }

    /// Score every candidate under the final state and build the report.
    pub fn finalize(mut self) -> LearningReport {
        self.history.record(self.trial, &self.state);

        let values = self.state.values().to_vec();
        let names = self.tableau.constraint_names();
        let ranked = self
            .state
            .descending()
            .into_iter()
            .map(|c| ConstraintValue {
                name: names[c].clone(),
                value: values[c],
            })
            .collect();

        let mut candidates = Vec::new();
        for (i, input) in self.tableau.inputs().iter().enumerate() {
            let scores = selector::maxent_scores(input, &values);
            let given = input.given_probabilities();
            for (c, cand) in input.candidates.iter().enumerate() {
                candidates.push(CandidateReport {
                    input_index: i,
                    input: input.form.clone(),
                    candidate: cand.form.clone(),
                    harmony: scores.harmonies[c],
                    maxent_score: scores.scores[c],
                    predicted_probability: scores.probabilities[c],
                    given_probability: given[c],
                    sampled_frequency: self.sampled[i][c],
                });
            }
        }

        info!(
            rule = self.rule.as_str(),
            trials = self.trial,
            updates = self.updates,
            anomalies = self.anomalies.len(),
            "learning finished"
        );

        LearningReport {
            rule: self.rule,
            stop_reason: self.stop_reason,
            trials_run: self.trial,
            updates: self.updates,
            final_plasticity: self.plasticity,
            corpus_size: self.corpus.total(),
            values,
            ranked,
            history: self.history,
            candidates,
            anomalies: self.anomalies,
        }
    }
}

/// Train with `rule` for the configured number of trials and report.
pub fn learn(
    tableau: &Tableau,
    rule: UpdateRule,
    config: LearnerConfig,
) -> Result<LearningReport, LearnerError> {
    let mut learner = OnlineLearner::new(tableau, rule, config)?;
    learner.run();
    Ok(learner.finalize())
}
