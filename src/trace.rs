//! Per-trial trace capture for learning runs.
//!
//! Trials are sent over a channel to a writer thread that appends one JSON
//! object per line, so tracing never reorders or blocks the training loop.

use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::mpsc;

use tracing::debug;

use crate::gla::{ObserverError, TrialObserver, TrialOutcome};
use crate::tableau::Tableau;

#[derive(Debug, Clone, Serialize)]
pub struct TrialTrace {
    pub trial: usize,
    pub input_index: usize,
    pub input: String,
    pub observed: String,
    pub produced: Option<String>,
    pub plasticity: f64,
    pub updated: bool,
    pub promoted: Vec<String>,
    pub demoted: Vec<String>,
    pub anomaly: Option<String>,
    /// Ranking state after the trial; only present when the trial updated it.
    pub values: Option<Vec<f64>>,
}

impl TrialTrace {
    pub fn from_outcome(tableau: &Tableau, outcome: &TrialOutcome, values: &[f64]) -> Self {
        let names = tableau.constraints();
        let input = tableau.input(outcome.input);
        let form = |idx: usize| {
            input
                .and_then(|i| i.candidates.get(idx))
                .map(|c| c.form.clone())
                .unwrap_or_default()
        };
        let named = |ids: &[usize]| -> Vec<String> {
            ids.iter()
                .filter_map(|&c| names.get(c).map(|n| n.name.clone()))
                .collect()
        };
        let (promoted, demoted) = match &outcome.update {
            Some(u) => (named(&u.promoted), named(&u.demoted)),
            None => (Vec::new(), Vec::new()),
        };
        Self {
            trial: outcome.trial,
            input_index: outcome.input,
            input: input.map(|i| i.form.clone()).unwrap_or_default(),
            observed: form(outcome.target),
            produced: outcome.predicted.map(form),
            plasticity: outcome.plasticity,
            updated: outcome.update.is_some(),
            promoted,
            demoted,
            anomaly: outcome.anomaly.as_ref().map(|a| a.kind.to_string()),
            values: outcome.update.as_ref().map(|_| values.to_vec()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("trace channel closed")]
    Closed,
    #[error("trace worker failed: {0}")]
    Join(String),
}

pub trait TraceSink {
    fn record(&self, event: TrialTrace) -> Result<(), TraceError>;
}

#[derive(Clone)]
pub struct JsonlTraceSink {
    sender: mpsc::Sender<TrialTrace>,
    errors_only: bool,
}

pub struct TraceWorker {
    handle: Option<std::thread::JoinHandle<Result<usize, TraceError>>>,
}

impl TraceWorker {
    /// Wait for the writer to drain and flush, returning the number of
    /// trials written. Drop every sink first.
    pub fn join(mut self) -> Result<usize, TraceError> {
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        let rows = handle
            .join()
            .map_err(|_| TraceError::Join("trace worker panicked".to_string()))??;
        debug!(rows, "trial trace flushed");
        Ok(rows)
    }
}

impl JsonlTraceSink {
    pub fn new(path: impl AsRef<Path>) -> Result<(Self, TraceWorker), TraceError> {
        let file = std::fs::File::create(path)?;
        let (sender, receiver) = mpsc::channel::<TrialTrace>();
        let handle = std::thread::spawn(move || write_trace_loop(file, receiver));
        Ok((
            Self {
                sender,
                errors_only: false,
            },
            TraceWorker {
                handle: Some(handle),
            },
        ))
    }

    /// Only record trials that updated the state or hit an anomaly.
    pub fn errors_only(mut self, yes: bool) -> Self {
        self.errors_only = yes;
        self
    }
}

impl TraceSink for JsonlTraceSink {
    fn record(&self, event: TrialTrace) -> Result<(), TraceError> {
        self.sender.send(event).map_err(|_| TraceError::Closed)
    }
}

impl TrialObserver for JsonlTraceSink {
    fn on_trial(
        &self,
        tableau: &Tableau,
        outcome: &TrialOutcome,
        values: &[f64],
    ) -> Result<(), ObserverError> {
        if self.errors_only && outcome.update.is_none() && outcome.anomaly.is_none() {
            return Ok(());
        }
        self.record(TrialTrace::from_outcome(tableau, outcome, values))
            .map_err(|e| ObserverError::Message(e.to_string()))
    }
}

/// Drain the channel until every sender is gone; one line per trial.
fn write_trace_loop(
    file: std::fs::File,
    receiver: mpsc::Receiver<TrialTrace>,
) -> Result<usize, TraceError> {
    let mut writer = BufWriter::new(file);
    let mut rows = 0;
    for event in receiver {
        serde_json::to_writer(&mut writer, &event)
            .map_err(|e| TraceError::Serde(format!("trial {}: {e}", event.trial)))?;
        writer.write_all(b"\n")?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}
