//! Error types for tableau construction and learning runs.

use thiserror::Error;

use crate::config::ConfigError;

/// A malformed tableau or constraint-type description.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The file has no constraint-name header.
    #[error("missing constraint name header")]
    MissingHeader,

    /// A row could not be interpreted.
    #[error("line {line}: {message}")]
    Line { line: usize, message: String },

    /// A cell that must hold a non-negative integer holds something else.
    #[error("line {line}, column {column}: expected a non-negative integer, found {token:?}")]
    NotACount {
        line: usize,
        column: usize,
        token: String,
    },

    /// A candidate's violation vector does not line up with the constraint list.
    #[error(
        "candidate [{candidate}] of input /{input}/ has {found} violation counts, expected {expected}"
    )]
    ViolationLength {
        input: String,
        candidate: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate constraint name {0:?}")]
    DuplicateConstraint(String),

    #[error("input /{0}/ has no candidates")]
    NoCandidates(String),
}

/// Errors that stop a run before learning starts.
#[derive(Debug, Error)]
pub enum TableauError {
    #[error(transparent)]
    Format(#[from] FormatError),

    /// More than one attested candidate for an input where a strict ranking is required.
    #[error(
        "multiple winners for input {index} (/{input}/): a strict ranking cannot represent free variation"
    )]
    MultipleWinners { input: String, index: usize },

    /// No candidate has positive frequency, so there is nothing to train on.
    #[error("training corpus is empty: no candidate has a positive frequency")]
    EmptyCorpus,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while setting up an online learning run.
#[derive(Debug, Error)]
pub enum LearnerError {
    #[error(transparent)]
    Tableau(#[from] TableauError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
