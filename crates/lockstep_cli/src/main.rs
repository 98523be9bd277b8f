//! Lockstep CLI, the command-line front end of the lockstep verification
//! engine.
//!
//! Provides `lockstep run` for running the scenario catalog against the
//! device stand-ins and `lockstep list` for printing the catalog.

#![warn(missing_docs)]

mod list;
mod run;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use lockstep_bench::{Circuit, Fault};
use lockstep_config::{ConfigError, RunMode, SuiteConfig};
use lockstep_sim::SimTime;
use tracing_subscriber::EnvFilter;

/// Lockstep, cycle-accurate reference models checked against devices.
#[derive(Parser, Debug)]
#[command(name = "lockstep", version, about = "Lockstep verification engine")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `lockstep.toml` suite file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the selected scenarios.
    Run(RunArgs),
    /// Print the scenario catalog.
    List(ListArgs),
}

/// Arguments for the `lockstep run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Only run scenarios of this circuit.
    #[arg(long)]
    pub circuit: Option<Circuit>,

    /// Substring filter on `<parameter set>/<scenario>` names.
    #[arg(long)]
    pub filter: Option<String>,

    /// Base seed, overriding the suite file.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Scenario isolation, overriding the suite file.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Simulated time limit per scenario (e.g. "10us").
    #[arg(long)]
    pub time_limit: Option<SimTime>,

    /// Output format for results.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Directory receiving one VCD trace per bench.
    #[arg(long)]
    pub trace: Option<String>,

    /// Inject a known fault into the devices it applies to.
    #[arg(long)]
    pub inject: Option<Fault>,
}

/// Arguments for the `lockstep list` subcommand.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only list scenarios of this circuit.
    #[arg(long)]
    pub circuit: Option<Circuit>,
}

/// Scenario isolation selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Fresh bench per scenario.
    Each,
    /// One bench per parameter set.
    Shared,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Each => RunMode::Each,
            ModeArg::Shared => RunMode::Shared,
        }
    }
}

/// Result output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom suite file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// Loads the suite file named by `--config`, or `lockstep.toml` from the
    /// current directory.
    pub fn load_suite(&self) -> Result<SuiteConfig, ConfigError> {
        match &self.config {
            Some(path) => lockstep_config::load_config_file(Path::new(path)),
            None => lockstep_config::load_config(&std::env::current_dir()?),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::List(ref args) => list::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over the verbosity flags.
fn init_tracing(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_run_default() {
        let cli = Cli::parse_from(["lockstep", "run"]);
        match cli.command {
            Command::Run(ref args) => {
                assert!(args.circuit.is_none());
                assert!(args.filter.is_none());
                assert!(args.seed.is_none());
                assert!(args.mode.is_none());
                assert_eq!(args.format, ReportFormat::Text);
                assert!(args.trace.is_none());
                assert!(args.inject.is_none());
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn parse_run_with_args() {
        let cli = Cli::parse_from([
            "lockstep",
            "run",
            "--circuit",
            "counter",
            "--filter",
            "fuzz",
            "--seed",
            "7",
            "--mode",
            "shared",
            "--time-limit",
            "10us",
            "--format",
            "json",
            "--trace",
            "out",
            "--inject",
            "counter-wraps",
        ]);
        match cli.command {
            Command::Run(ref args) => {
                assert_eq!(args.circuit, Some(Circuit::Counter));
                assert_eq!(args.filter.as_deref(), Some("fuzz"));
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.mode, Some(ModeArg::Shared));
                assert_eq!(args.time_limit, Some(SimTime::from_ns(10_000)));
                assert_eq!(args.format, ReportFormat::Json);
                assert_eq!(args.trace.as_deref(), Some("out"));
                assert_eq!(args.inject, Some(Fault::CounterWraps));
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn parse_unknown_circuit_fails() {
        assert!(Cli::try_parse_from(["lockstep", "run", "--circuit", "alu"]).is_err());
    }

    #[test]
    fn parse_unknown_fault_fails() {
        assert!(Cli::try_parse_from(["lockstep", "run", "--inject", "melts"]).is_err());
    }

    #[test]
    fn parse_list() {
        let cli = Cli::parse_from(["lockstep", "list", "--circuit", "konami"]);
        match cli.command {
            Command::List(ref args) => assert_eq!(args.circuit, Some(Circuit::Konami)),
            _ => panic!("expected List command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["lockstep", "--quiet", "--config", "/tmp/lockstep.toml", "list"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("/tmp/lockstep.toml"));
    }

    #[test]
    fn parse_verbose_flag_after_subcommand() {
        let cli = Cli::parse_from(["lockstep", "run", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn mode_arg_maps_to_run_mode() {
        assert_eq!(RunMode::from(ModeArg::Each), RunMode::Each);
        assert_eq!(RunMode::from(ModeArg::Shared), RunMode::Shared);
    }

    #[test]
    fn explicit_suite_file_is_loaded() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("suite.toml");
        std::fs::write(&path, "[run]\nseed = 9\n").unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(path.to_str().unwrap().to_string()),
        };
        assert_eq!(global.load_suite().unwrap().run.seed, 9);
    }

    #[test]
    fn missing_suite_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(tmp.path().join("nope.toml").to_str().unwrap().to_string()),
        };
        assert!(matches!(global.load_suite(), Err(ConfigError::IoError(_))));
    }
}
