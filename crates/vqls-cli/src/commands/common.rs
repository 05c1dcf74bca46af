//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vqls_adapter_sim::SimulatorConfig;
use vqls_core::RunConfig;

/// On-disk problem file: the run configuration plus simulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemFile {
    #[serde(flatten)]
    pub run: RunConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Load and validate a problem file. `.json` is read as JSON, anything else
/// as YAML.
pub fn load_problem(path: &str) -> Result<ProblemFile> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    let ext = path_obj.extension().and_then(|e| e.to_str()).unwrap_or("");

    let problem: ProblemFile = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&source)
            .with_context(|| format!("Failed to parse JSON config: {path}"))?,
        _ => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Failed to parse YAML config: {path}"))?,
    };

    problem
        .run
        .validate()
        .with_context(|| format!("Invalid run configuration: {path}"))?;

    Ok(problem)
}

/// Format a parameter vector compactly.
pub fn format_parameters(params: &[f64]) -> String {
    let parts: Vec<String> = params.iter().map(|p| format!("{p:.6}")).collect();
    format!("[{}]", parts.join(", "))
}
