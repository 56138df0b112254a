//! Extension hooks for observing a learning run.
//!
//! Callers can inject per-trial side effects (tracing to disk, progress
//! reporting) without the learner knowing about them. Observers only read;
//! the ranking state is never handed out mutably.

use crate::tableau::Tableau;

use super::TrialOutcome;

#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("{0}")]
    Message(String),
}

pub trait TrialObserver {
    fn on_trial(
        &self,
        tableau: &Tableau,
        outcome: &TrialOutcome,
        values: &[f64],
    ) -> Result<(), ObserverError>;
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TrialObserver for NoopObserver {
    fn on_trial(&self, _: &Tableau, _: &TrialOutcome, _: &[f64]) -> Result<(), ObserverError> {
        Ok(())
    }
}
