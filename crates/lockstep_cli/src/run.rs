//! `lockstep run`: run the selected scenarios.
//!
//! Loads the suite file, builds the scenario catalog, narrows it to the
//! selected circuit and filter, then runs every scenario against its device.
//! Reports per-scenario status and a summary line, or the whole report as
//! JSON.

use std::path::PathBuf;

use lockstep_bench::{run_catalog, Catalog, RunOptions, RunReport, ScenarioOutcome, Selection};
use lockstep_config::RunConfig;

use crate::{GlobalArgs, ReportFormat, RunArgs};

/// Runs the `lockstep run` command.
///
/// Returns exit code 0 if every selected scenario passes, 1 if any fails.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = global.load_suite()?;
    let catalog = Catalog::from_config(&config)?.select(&Selection {
        circuit: args.circuit,
        filter: args.filter.clone(),
    });
    tracing::debug!(
        scenarios = catalog.len(),
        circuit = ?args.circuit,
        filter = ?args.filter,
        "catalog selected"
    );

    if catalog.is_empty() {
        if !global.quiet {
            eprintln!("warning: no scenarios match the given selection");
        }
        return Ok(0);
    }

    let options = run_options(args, &config.run);
    let text = args.format == ReportFormat::Text && !global.quiet;
    if text {
        eprintln!(
            "   Running {} scenario(s), seed {}, mode {}",
            catalog.len(),
            options.seed,
            options.mode
        );
        if let Some(fault) = options.fault {
            eprintln!("   Injecting {fault}");
        }
    }

    let report = run_catalog(&catalog, &options)?;

    match args.format {
        ReportFormat::Json => println!("{}", report.to_json()?),
        ReportFormat::Text if text => print_report(&report),
        ReportFormat::Text => {}
    }

    Ok(if report.all_passed() { 0 } else { 1 })
}

/// Suite file run settings with command-line overrides applied.
fn run_options(args: &RunArgs, run: &RunConfig) -> RunOptions {
    let mut options = RunOptions::from(run);
    if let Some(seed) = args.seed {
        options.seed = seed;
    }
    if let Some(mode) = args.mode {
        options.mode = mode.into();
    }
    if let Some(limit) = args.time_limit {
        options.time_limit = limit;
    }
    if let Some(ref dir) = args.trace {
        options.trace_dir = Some(PathBuf::from(dir));
    }
    options.fault = args.inject;
    options
}

fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        print_outcome(outcome);
    }
    eprintln!();
    eprintln!(
        "   Result: {passed} passed, {failed} failed out of {} scenario(s)",
        report.outcomes.len(),
        passed = report.passed(),
        failed = report.failed(),
    );
}

fn print_outcome(outcome: &ScenarioOutcome) {
    match outcome.failure {
        None => eprintln!(
            "   PASS  {name} ({time})",
            name = outcome.full_name(),
            time = outcome.sim_time,
        ),
        Some(ref failure) => eprintln!(
            "   FAIL  {name}: {message}",
            name = outcome.full_name(),
            message = failure.message,
        ),
    }
}
