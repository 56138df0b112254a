#![forbid(unsafe_code)]

//! # ot-learner
//!
//! Learning constraint rankings and weights for Optimality Theory grammars.
//!
//! A [`Tableau`] lists inputs, their candidate outputs, observed frequencies
//! and per-constraint violation counts. Two learners run over it:
//!
//! - [`rcd`]: Recursive Constraint Demotion, a batch stratifier that either
//!   finds a stratified hierarchy consistent with every winner/loser pair or
//!   reports a ranking paradox.
//! - [`gla`]: an online learner that samples observed forms, predicts an
//!   output under the current state and nudges constraint values on error,
//!   either with Magri's promotion/demotion rule over a strict ranking or
//!   with a perceptron update over MaxEnt weights.

pub mod config;
pub mod error;
pub mod format;
pub mod gla;
pub mod rcd;
pub mod report;
pub mod selector;
pub mod tableau;
pub mod trace;

pub use config::{load_config_from_path, ConfigError, LearnerConfig};
pub use error::{FormatError, LearnerError, TableauError};
pub use format::{load_constraint_types, load_tableau, parse_constraint_types, parse_tableau};
pub use gla::{
    learn, LearningReport, ObserverError, OnlineLearner, RankingHistory, RankingState,
    StopReason, TrialObserver, TrialOutcome, UpdateRule,
};
pub use rcd::{rank, recursive_constraint_demotion, Hierarchy, MarkDataPair, Preference, Stratum};
pub use selector::{Regime, Selection};
pub use tableau::{
    Candidate, Constraint, ConstraintType, Input, Tableau, TrainingCorpus, WinnerPolicy,
};
pub use trace::{JsonlTraceSink, TraceError, TraceSink, TraceWorker, TrialTrace};
