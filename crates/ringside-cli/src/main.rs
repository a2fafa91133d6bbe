//! `ringside` – runs the sumo controller against the simulated rig.
//!
//! The binary:
//!
//! 1. Loads `~/.ringside/config.toml` (defaults when absent) and applies
//!    `RINGSIDE_*` environment overrides.
//! 2. Loads a scripted scenario (`--scenario path.toml`) or the built-in demo.
//! 3. Runs the configured number of rounds, printing each decision as a
//!    coloured line or, with `--json`, as one JSON object per line.
//! 4. Intercepts **Ctrl-C** as the abort button: the current round ends at
//!    the next cycle boundary and no further rounds start.

mod config;
mod scenario;

use colored::Colorize;
use ringside_hal::sim::SimWorld;
use ringside_runtime::{ControlLoop, MotionController, RoundOutcome, RoundReport};
use ringside_types::{Branch, Decision, ProximityCounts};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

use crate::scenario::{Scenario, ScenarioPlayer};

fn main() -> ExitCode {
    let _telemetry = ringside_runtime::init_tracing("ringside");

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}: {}", "Argument error".red(), e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    if args.init_config {
        return init_config();
    }

    if !args.json {
        print_banner();
    }

    let mut cfg = match config::load() {
        Ok(Some(cfg)) => {
            if !args.json {
                println!("  Config loaded from {}", config::config_path().display().to_string().bold());
            }
            cfg
        }
        Ok(None) => default_config(),
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            default_config()
        }
    };
    args.apply_to(&mut cfg);

    let scenario = match &args.scenario {
        Some(path) => match Scenario::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}: {}", "Scenario error".red(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Scenario::demo(),
    };
    if !args.json {
        println!(
            "  Scenario {} ({} event(s)), {} round(s)\n",
            scenario.name.bold(),
            scenario.events.len(),
            cfg.rounds
        );
    }

    let world = SimWorld::new();

    // ── Ctrl-C acts as the abort button ───────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = shutdown.clone();
    let abort = world.abort_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("{}", "⚠  Ctrl-C received – aborting the round …".yellow().bold());
        abort.store(true, Ordering::SeqCst);
        shutdown_handler.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; rounds can only end by scenario or cycle limit");
    }

    let controller = match cfg.seed {
        Some(seed) => MotionController::with_seed(cfg.tuning.clone(), seed),
        None => MotionController::new(cfg.tuning.clone()),
    };
    let mut control = match ControlLoop::new(world.rig(), world.accelerometer(), controller) {
        Ok(control) => control,
        Err(e) => {
            eprintln!("{}: {}", "Tuning error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut player = ScenarioPlayer::new(&scenario);
    for round in 1..=cfg.rounds {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        reset_arena(&world);
        player.rewind();

        if let Err(e) = control.await_start() {
            error!(error = %e, round, "failed to start round");
            eprintln!("{}: {}", "Hardware fault".red().bold(), e);
            return ExitCode::FAILURE;
        }

        let round_start = world.now_ms();
        player.apply_due(&world, 0);
        let mut printer = DecisionPrinter::new(round, round_start, args.json);
        let handle = world.clone();
        let result = control.run_round(Some(cfg.max_cycles), |decision| {
            printer.print(decision);
            player.apply_due(&handle, handle.now_ms().saturating_sub(round_start));
        });

        match result {
            Ok(report) => {
                if !player.is_finished() {
                    warn!(round, outcome = ?report.outcome, "round ended before the scenario finished");
                }
                print_report(round, round_start, &report, args.json);
            }
            Err(e) => {
                eprintln!("{}: {}", "Hardware fault".red().bold(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn default_config() -> config::Config {
    let mut cfg = config::Config::default();
    config::apply_env_overrides(&mut cfg);
    cfg
}

/// Write a default config file unless one already exists.
fn init_config() -> ExitCode {
    let path = config::config_path();
    if path.exists() {
        println!("  Config already present at {}", path.display().to_string().bold());
        return ExitCode::SUCCESS;
    }
    match config::save(&config::Config::default()) {
        Ok(()) => {
            println!("  {} Config saved to {}", "✓".green().bold(), path.display().to_string().bold());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error saving config".red(), e);
            ExitCode::FAILURE
        }
    }
}

/// Put the robot back on a clean, empty ring and drop the previous round's
/// motor, alert and display history.
fn reset_arena(world: &SimWorld) {
    world.clear_border();
    world.set_proximity(ProximityCounts::default());
    world.set_acceleration(0, 0);
    world.clear_logs();
}

// ─────────────────────────────────────────────────────────────────────────────
// Arguments
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    json: bool,
    help: bool,
    init_config: bool,
    scenario: Option<PathBuf>,
    rounds: Option<u32>,
    cycles: Option<u64>,
    seed: Option<u64>,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut parsed = CliArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--json" => parsed.json = true,
                "-h" | "--help" => parsed.help = true,
                "--init-config" => parsed.init_config = true,
                "--scenario" => parsed.scenario = Some(PathBuf::from(value_for(&arg, &mut args)?)),
                "--rounds" => parsed.rounds = Some(number_for(&arg, &mut args)?),
                "--cycles" => parsed.cycles = Some(number_for(&arg, &mut args)?),
                "--seed" => parsed.seed = Some(number_for(&arg, &mut args)?),
                other => return Err(format!("unknown argument `{other}`")),
            }
        }
        Ok(parsed)
    }

    fn apply_to(&self, cfg: &mut config::Config) {
        if let Some(rounds) = self.rounds {
            cfg.rounds = rounds;
        }
        if let Some(cycles) = self.cycles {
            cfg.max_cycles = cycles;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
    }
}

fn value_for(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<String, String> {
    args.next().ok_or_else(|| format!("`{flag}` needs a value"))
}

fn number_for<T: std::str::FromStr>(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<T, String> {
    let raw = value_for(flag, args)?;
    raw.parse().map_err(|_| format!("`{flag}` expects a number, got `{raw}`"))
}

fn print_usage() {
    println!("Usage: ringside [OPTIONS]");
    println!();
    println!("  --scenario <PATH>  scripted arena (TOML); built-in demo otherwise");
    println!("  --rounds <N>       rounds to run");
    println!("  --cycles <N>       per-round cycle limit");
    println!("  --seed <N>         fixed seed for randomized turns");
    println!("  --json             one JSON object per decision");
    println!("  --init-config      write ~/.ringside/config.toml with defaults");
    println!("  -h, --help         show this help");
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

/// Prints decisions; in text mode only when the branch changes.
struct DecisionPrinter {
    round: u32,
    round_start: u64,
    json: bool,
    last: Option<Branch>,
}

impl DecisionPrinter {
    fn new(round: u32, round_start: u64, json: bool) -> Self {
        Self {
            round,
            round_start,
            json,
            last: None,
        }
    }

    fn print(&mut self, decision: &Decision) {
        if self.json {
            let line = serde_json::json!({ "round": self.round, "decision": decision });
            println!("{line}");
            return;
        }
        if self.last == Some(decision.branch) {
            return;
        }
        self.last = Some(decision.branch);
        println!(
            "  {:>7} ms  {:<28} ({:>4}, {:>4})",
            decision.at_ms.saturating_sub(self.round_start),
            branch_label(&decision.branch),
            decision.command.left,
            decision.command.right
        );
    }
}

fn branch_label(branch: &Branch) -> colored::ColoredString {
    match branch {
        Branch::BorderTurn { border, toward } => {
            format!("border {border:?} → turn {toward:?}").to_lowercase().yellow().bold()
        }
        Branch::Contact => "contact".red().bold(),
        Branch::Charge => "charge".red(),
        Branch::SharpPivot { toward } => format!("sharp pivot {toward:?}").to_lowercase().cyan(),
        Branch::Pivot { toward } => format!("pivot {toward:?}").to_lowercase().cyan(),
        Branch::Arc { toward } => format!("arc {toward:?}").to_lowercase().cyan(),
        Branch::Search { slowed: false } => "search".dimmed(),
        Branch::Search { slowed: true } => "search (slowed)".dimmed(),
    }
}

fn print_report(round: u32, round_start: u64, report: &RoundReport, json: bool) {
    if json {
        let line = serde_json::json!({ "round": round, "report": report });
        println!("{line}");
        return;
    }
    let outcome = match report.outcome {
        RoundOutcome::Aborted => "aborted".yellow(),
        RoundOutcome::CycleLimit => "cycle limit".green(),
    };
    println!();
    println!(
        "  Round {} finished ({}) after {} cycles, {} ms",
        round.to_string().bold(),
        outcome,
        report.cycles,
        report.ended_at_ms.saturating_sub(round_start)
    );
    println!(
        "    contacts made {}  contacts lost {}  border turns {}",
        report.stats.contacts_made, report.stats.contacts_lost, report.stats.border_turns
    );
    println!();
}

fn print_banner() {
    println!();
    println!("{}", r#"   ___  _             _    __    "#.bold().cyan());
    println!("{}", r#"  / _ \(_)__  ___ ___(_)__/ /__  "#.bold().cyan());
    println!("{}", r#" / , _/ / _ \/ _ `(_-</ / _  / -_)"#.bold().cyan());
    println!("{}", r#"/_/|_/_/_//_/\_, /___/_/\_,_/\__/ "#.bold().cyan());
    println!("{}", r#"            /___/                  "#.bold().cyan());
    println!();
    println!("  {} {}", "Ringside".bold(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  Reactive sumo controller, simulated rig");
    println!();
}
