//! Inspect command implementation.

use anyhow::Result;
use console::style;

use vqls_core::{AnsatzGate, CostFunctional};

use vqls_adapter_sim::StatevectorOracle;

use super::common::load_problem;

/// Execute the inspect command.
pub fn execute(config: &str) -> Result<()> {
    let problem = load_problem(config)?;
    let run = &problem.run;

    let operator = run.operator()?;
    let ansatz = run.ansatz()?;
    let gradient = run.gradient()?;
    let oracle = StatevectorOracle::with_config(problem.simulator)?;
    let cost = CostFunctional::new(oracle, ansatz, operator)?;

    println!("{} {}", style("Problem:").bold(), style(config).green());
    println!();
    print!("{}", cost.operator());
    println!(
        "  Hermitian: {}",
        if cost.operator().is_hermitian(1e-12) {
            style("yes").green()
        } else {
            style("no").yellow()
        }
    );
    println!();
    println!("{} A†A", style("Gram").bold());
    print!("{}", cost.gram_operator());
    println!();

    let gates = ansatz.gates();
    let entanglers = gates.iter().filter(|g| g.param().is_none()).count();
    let rotations = gates.len() - entanglers;
    println!("{}", style("Ansatz").bold());
    println!("  Qubits:      {}", ansatz.num_qubits());
    println!("  Layers:      {}", ansatz.num_layers());
    println!("  Rotations:   {rotations} ({:?})", ansatz.rotations());
    println!("  Entanglers:  {entanglers} ({:?})", ansatz.entangler());
    println!("  Parameters:  {}", ansatz.parameter_count());
    if let Some(AnsatzGate::Cx { control, target }) =
        gates.iter().find(|g| matches!(g, AnsatzGate::Cx { .. }))
    {
        println!("  CNOT:        control {control} → target {target}, chained");
    }
    println!();

    println!("{}", style("Optimizer").bold());
    println!("  Reference ⟨A⟩: {:.8}", cost.reference_overlap());
    println!(
        "  Gradient:      {} ({} evaluations per step)",
        gradient.method(),
        gradient.evaluations_per_gradient(ansatz.parameter_count(), true) + 1
    );
    println!("  Learning rate: {} ({:?})", run.learning_rate, run.schedule);
    println!("  Iterations:    {}", run.max_iterations);
    if let Some(tol) = run.tolerance {
        println!("  Tolerance:     {tol:e}");
    }

    Ok(())
}
