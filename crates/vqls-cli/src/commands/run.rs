//! Run command implementation.

use std::fs;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use vqls_adapter_sim::StatevectorOracle;
use vqls_core::{
    CancelToken, CostFunctional, CostSample, ErrorKind, ExpectationOracle, OptimizationReport,
    Optimizer, OptimizerState,
};

use super::common::{format_parameters, load_problem};

/// Why a run stopped early.
#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub kind: ErrorKind,
    pub message: String,
}

/// JSON report written after every run, successful or not.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub oracle: String,
    pub state: OptimizerState,
    pub iterations: usize,
    pub parameters: Vec<f64>,
    pub final_cost: Option<f64>,
    pub best: Option<CostSample>,
    pub history: Vec<CostSample>,
    pub failure: Option<FailureReport>,
}

impl RunReport {
    fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        oracle: String,
        report: &OptimizationReport,
    ) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            oracle,
            state: report.state,
            iterations: report.iterations,
            parameters: report.parameters.clone(),
            final_cost: report.final_cost,
            best: report.best().cloned(),
            history: report.history.clone(),
            failure: report.failure.as_ref().map(|e| FailureReport {
                kind: e.kind(),
                message: e.to_string(),
            }),
        }
    }
}

/// Execute the run command.
pub async fn execute(config: &str, output: Option<&str>, json: bool, progress: bool) -> Result<()> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    let problem = load_problem(config)?;
    let run = problem.run;

    let oracle = StatevectorOracle::with_config(problem.simulator)
        .context("Invalid simulator configuration")?;
    let oracle_name = oracle.name().to_string();
    let ansatz = run.ansatz()?;
    let cost = CostFunctional::new(oracle, ansatz, run.operator()?)?;
    let gradient = run.gradient()?;
    let mut optimizer = Optimizer::new(cost, gradient, run.optimizer_config())?;

    if !json {
        println!(
            "{} Running {} ({} qubits, {} layers, {} parameters, {} gradient)",
            style("→").cyan().bold(),
            style(config).green(),
            ansatz.num_qubits(),
            ansatz.num_layers(),
            ansatz.parameter_count(),
            style(gradient.method()).yellow(),
        );
    }

    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling after the current evaluation");
                cancel.cancel();
            }
        })
    };

    let bar = if progress && !json {
        let bar = ProgressBar::new(run.max_iterations as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} cost {msg}")
                .context("Invalid progress template")?
                .progress_chars("=> "),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let initial = run.initial_parameters.clone();
    let observer_bar = bar.clone();
    let report = tokio::task::spawn_blocking(move || {
        optimizer.run_with_observer(initial, &cancel, |sample| {
            observer_bar.set_position(sample.iteration as u64 + 1);
            observer_bar.set_message(format!("{:.6}", sample.cost));
        })
    })
    .await
    .context("Optimizer task panicked")?;

    interrupt.abort();
    bar.finish_and_clear();

    let run_report = RunReport::new(run_id, started_at, oracle_name, &report);
    let rendered = serde_json::to_string_pretty(&run_report)?;

    if let Some(path) = output {
        fs::write(path, &rendered).with_context(|| format!("Failed to write report: {path}"))?;
    }

    if json {
        println!("{rendered}");
    } else {
        print_summary(&report);
        if let Some(path) = output {
            println!("  Report written to {}", style(path).green());
        }
    }

    match report.failure {
        None => Ok(()),
        Some(e) => {
            if let Some(last) = report.history.last() {
                eprintln!(
                    "  Last valid sample: iteration {}, cost {:.6}, θ = {}",
                    last.iteration,
                    last.cost,
                    format_parameters(&last.parameters)
                );
            }
            let kind = e.kind();
            Err(anyhow::Error::new(e).context(format!("Optimization stopped ({kind})")))
        }
    }
}

fn print_summary(report: &OptimizationReport) {
    let state = match report.state {
        OptimizerState::Converged => style(report.state.to_string()).green().bold(),
        OptimizerState::Exhausted => style(report.state.to_string()).yellow().bold(),
        _ => style(report.state.to_string()).red().bold(),
    };
    println!("\n{} {}", style("State:").bold(), state);
    println!("  Iterations: {}", report.iterations);
    if let Some(cost) = report.final_cost {
        println!("  Final cost: {cost:.8}");
    }
    if let Some(best) = report.best() {
        println!("  Best cost:  {:.8} (iteration {})", best.cost, best.iteration);
    }
    println!("  Parameters: {}", format_parameters(&report.parameters));
}
