#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ot_learner::format::sibling_constraints_path;
use ot_learner::report::{
    render_candidate_table, render_final_values, render_hierarchy, render_history_tsv,
    render_learning_markdown, RcdReport, RunStamp,
};
use ot_learner::{
    load_config_from_path, load_constraint_types, load_tableau, rank, JsonlTraceSink,
    LearnerConfig, LearningReport, OnlineLearner, TrialObserver, UpdateRule, WinnerPolicy,
};

#[derive(Parser)]
#[command(name = "otlearn", version, about = "OT ranking and weight learners")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stratify constraints with Recursive Constraint Demotion
    Rcd {
        /// Tab-delimited tableau file
        #[arg(long)]
        input: PathBuf,

        /// Also write the hierarchy text here
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write the hierarchy as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Train an online learner on sampled forms
    Gla {
        /// Tab-delimited tableau file
        #[arg(long)]
        input: PathBuf,

        /// Constraint-type file (default: <input stem>.constraints, if present)
        #[arg(long)]
        constraints: Option<PathBuf>,

        /// Learner config JSON
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "magri")]
        rule: CliUpdateRule,

        /// Override the configured number of trials
        #[arg(long)]
        trials: Option<usize>,

        /// Override the configured RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for .out and history files (default: next to the input)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Per-trial JSONL trace
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Only trace trials that updated or hit an anomaly
        #[arg(long)]
        trace_errors_only: bool,

        /// Write the full learning report as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write a markdown summary
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Write the default learner config as JSON
    DefaultConfig {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CliUpdateRule {
    Magri,
    Perceptron,
}

impl From<CliUpdateRule> for UpdateRule {
    fn from(value: CliUpdateRule) -> Self {
        match value {
            CliUpdateRule::Magri => UpdateRule::Magri,
            CliUpdateRule::Perceptron => UpdateRule::Perceptron,
        }
    }
}

#[derive(Serialize)]
struct LearningOutput<'a> {
    run_stamp: &'a RunStamp,
    report: &'a LearningReport,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rcd { input, out, json } => {
            let tableau = load_tableau(&input, WinnerPolicy::SingleWinner)?;
            let result = rank(&tableau)?;
            let names = tableau.constraint_names();

            let mut text = format!("Results of applying RCD to the file {}\n", input.display());
            text.push_str(&render_hierarchy(&result.hierarchy, &names));
            io::stdout().write_all(text.as_bytes())?;
            if let Some(path) = out {
                std::fs::write(path, &text)?;
            }
            if let Some(path) = json {
                let report = RcdReport::new(&tableau, &result.hierarchy, result.mdps.len());
                write_json(&path, &report)?;
            }
            if !result.hierarchy.is_consistent() {
                warn!(input = %input.display(), "data is not OT-consistent");
            }
        }
        Commands::Gla {
            input,
            constraints,
            config,
            rule,
            trials,
            seed,
            out_dir,
            trace,
            trace_errors_only,
            json,
            report,
        } => {
            let rule = UpdateRule::from(rule);
            let mut cfg = match config {
                Some(path) => load_config_from_path(path)?,
                None => LearnerConfig::default(),
            };
            if let Some(trials) = trials {
                cfg.trials = trials;
            }
            if let Some(seed) = seed {
                cfg.rng_seed = seed;
            }

            let tableau = load_tableau(&input, WinnerPolicy::FreeVariation)?;
            let types_path = constraints.or_else(|| {
                let sibling = sibling_constraints_path(&input);
                sibling.is_file().then_some(sibling)
            });
            let tableau = match types_path {
                Some(path) => {
                    info!(path = %path.display(), "reading constraint types");
                    let entries = load_constraint_types(&path)?;
                    tableau.with_constraint_types(&entries).0
                }
                None => tableau,
            };

            let stamp = RunStamp::new(&tableau, rule, cfg.rng_seed, cfg.trials);
            let mut learner = OnlineLearner::new(&tableau, rule, cfg)?;

            let (trace_sink, trace_worker) = if let Some(path) = trace {
                let (sink, worker) = JsonlTraceSink::new(path)?;
                (Some(sink.errors_only(trace_errors_only)), Some(worker))
            } else {
                (None, None)
            };
            let observer = trace_sink.as_ref().map(|s| s as &dyn TrialObserver);
            learner.run_with(observer, None);
            drop(trace_sink);
            if let Some(worker) = trace_worker {
                let rows = worker.join()?;
                info!(rows, "trial trace written");
            }

            let result = learner.finalize();

            let stem = file_stem(&input);
            let dir = out_dir.unwrap_or_else(|| {
                input
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default()
            });
            std::fs::create_dir_all(&dir)?;
            let history_ext = match rule {
                UpdateRule::Magri => "rankings",
                UpdateRule::Perceptron => "weights",
            };
            std::fs::write(
                dir.join(format!("{stem}.out")),
                render_candidate_table(&result),
            )?;
            std::fs::write(
                dir.join(format!("{stem}.{history_ext}")),
                render_history_tsv(&result.history),
            )?;

            let mut stdout = io::stdout();
            writeln!(stdout, "{} after learning:", history_ext)?;
            stdout.write_all(render_final_values(&result).as_bytes())?;

            if let Some(path) = json {
                write_json(
                    &path,
                    &LearningOutput {
                        run_stamp: &stamp,
                        report: &result,
                    },
                )?;
            }
            if let Some(path) = report {
                std::fs::write(path, render_learning_markdown(&result, &stamp))?;
            }
        }
        Commands::DefaultConfig { out } => {
            write_json(&out, &LearnerConfig::default())?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("OTLEARN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

fn write_json<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    std::fs::write(path, json)
}
