//! `calcctl` – headless harness for the chained calculator engine.
//!
//! Plays the part of a front-end: routes keys into an engine session,
//! renders the display, and owns configuration and logging.

mod config;
mod logging;
mod repl;
mod serve;

use anyhow::Context;
use clap::{Parser, Subcommand};
use engine::types::*;
use engine::{CommandRegistry, CommandResult, KeyMap, Session};
use std::path::{Path, PathBuf};

// ===========================================================================
// CLI definition
// ===========================================================================

#[derive(Parser)]
#[command(
    name = "calcctl",
    version,
    about = "Headless harness for the chained calculator engine"
)]
struct Cli {
    /// Extra configuration file layered over calc_config.yaml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type a key string into a fresh calculator and print the display.
    Eval {
        /// Keys, e.g. "2+3*4=" or "12{Backspace}5".
        keys: String,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Invoke a session command by name with JSON args.
    Call {
        /// Command name (e.g. "digit", "operator", "equals", "state").
        cmd: String,
        /// JSON args to pass to the command.
        #[arg(long, default_value = "{}")]
        args: String,
        /// Keys to type before running the command.
        #[arg(long)]
        keys: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive session on the terminal.
    Repl,

    /// Run a scripted scenario from a YAML file.
    RunScenario {
        /// Path to the scenario YAML file.
        file: PathBuf,
        /// Directory for artifacts output.
        #[arg(long)]
        artifacts: Option<PathBuf>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start daemon mode over a Unix socket.
    Serve {
        /// Path for the Unix domain socket.
        #[arg(long)]
        socket: PathBuf,
    },

    /// Print the effective configuration as JSON.
    Config,
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (cfg, keymap) = match setup(cli.config.as_deref()) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(2);
        }
    };
    let options = cfg.engine_options();
    let registry = CommandRegistry::new();

    match cli.command {
        Commands::Eval { keys, json } => {
            let mut session = Session::new(options, keymap);
            let args = serde_json::json!({ "keys": keys });
            let result = registry.execute("keys", args, &mut session);
            output_display(&result, json);
        }
        Commands::Call {
            cmd,
            args,
            keys,
            json,
        } => {
            let session = Session::new(options, keymap);
            cmd_call(&cmd, &args, keys.as_deref(), json, session, &registry)
        }
        Commands::Repl => repl::run_repl(Session::new(options, keymap)),
        Commands::RunScenario {
            file,
            artifacts,
            json,
        } => cmd_run_scenario(&file, json, artifacts, &keymap, &registry),
        Commands::Serve { socket } => serve::run_daemon(socket, options, keymap).await,
        Commands::Config => {
            let j = serde_json::to_string_pretty(&cfg).unwrap_or_default();
            println!("{}", j);
        }
    }
}

/// Load configuration, start logging, and build the key map.
fn setup(explicit: Option<&Path>) -> anyhow::Result<(config::CalcConfig, KeyMap)> {
    let cfg = config::load_config(explicit).context("failed to load configuration")?;
    logging::init_logging(&cfg.logging);
    let keymap = cfg.keymap().context("invalid key binding in configuration")?;
    tracing::debug!(options = ?cfg.engine_options(), "configuration loaded");
    Ok((cfg, keymap))
}

// ===========================================================================
// Subcommand implementations
// ===========================================================================

fn cmd_call(
    cmd: &str,
    args_str: &str,
    keys: Option<&str>,
    json: bool,
    mut session: Session,
    registry: &CommandRegistry,
) {
    let args: serde_json::Value = match serde_json::from_str(args_str) {
        Ok(v) => v,
        Err(e) => {
            let r = result_err(
                "call",
                cmd,
                &new_run_id(),
                0,
                ErrorCode::InvalidInput,
                format!("invalid JSON args: {}", e),
            );
            output_result(&r, json);
            return;
        }
    };

    if let Some(keys) = keys {
        let prelude_args = serde_json::json!({ "keys": keys });
        let prelude = registry.execute("keys", prelude_args, &mut session);
        if prelude.status != Status::Pass {
            output_result(&prelude, json);
            return;
        }
    }

    let result = registry.execute(cmd, args, &mut session);
    output_result(&result, json);
}

fn cmd_run_scenario(
    file: &Path,
    json: bool,
    artifacts: Option<PathBuf>,
    keymap: &KeyMap,
    registry: &CommandRegistry,
) {
    let yaml = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let r = result_err(
                "run-scenario",
                &file.display().to_string(),
                &new_run_id(),
                0,
                ErrorCode::IoError,
                format!("cannot read scenario file: {}", e),
            );
            output_result(&r, json);
            return;
        }
    };

    let scenario = match engine::scenario::load_scenario(&yaml) {
        Ok(s) => s,
        Err(e) => {
            let r = result_err(
                "run-scenario",
                &file.display().to_string(),
                &new_run_id(),
                0,
                ErrorCode::InvalidInput,
                e.to_string(),
            );
            output_result(&r, json);
            return;
        }
    };

    let scenario_result = engine::scenario::run_scenario(&scenario, keymap, registry);

    if json {
        let j = serde_json::to_string_pretty(&scenario_result).unwrap_or_default();
        println!("{}", j);
    } else {
        println!(
            "Scenario: {}",
            scenario_result.name.as_deref().unwrap_or("<unnamed>")
        );
        println!("Overall: {:?}", scenario_result.overall_status);
        for (i, sr) in scenario_result.step_results.iter().enumerate() {
            let display = sr
                .data
                .as_ref()
                .and_then(|d| d.get("display"))
                .and_then(|v| v.as_str())
                .unwrap_or("-");
            println!(
                "  Step {}: {} -> {:?} [{}] ({}ms)",
                i, sr.target, sr.status, display, sr.timing_ms.total
            );
        }
        println!("Display: {}", scenario_result.final_display);
    }

    if let Some(ref dir) = artifacts {
        match write_scenario_artifacts(dir, &scenario_result) {
            Ok(art_dir) => tracing::info!(path = %art_dir.display(), "artifacts written"),
            Err(e) => {
                tracing::error!(dir = %dir.display(), error = %e, "cannot write artifacts");
                eprintln!("error: cannot write artifacts to {}: {}", dir.display(), e);
                std::process::exit(2);
            }
        }
    }

    if scenario_result.overall_status == Status::Fail {
        std::process::exit(1);
    }
}

/// Write `result.json` and per-step `events.jsonl` under `dir/<run id>/`.
fn write_scenario_artifacts(
    dir: &Path,
    scenario_result: &ScenarioResult,
) -> std::io::Result<PathBuf> {
    let art_dir = dir.join(new_run_id());
    std::fs::create_dir_all(&art_dir)?;

    let j = serde_json::to_string_pretty(scenario_result)?;
    std::fs::write(art_dir.join("result.json"), j)?;

    let mut lines = String::new();
    for sr in &scenario_result.step_results {
        lines.push_str(&serde_json::to_string(sr)?);
        lines.push('\n');
    }
    std::fs::write(art_dir.join("events.jsonl"), lines)?;
    Ok(art_dir)
}

// ===========================================================================
// Output helpers
// ===========================================================================

/// `eval` prints only the display unless JSON was asked for. Unbound keys
/// go to stderr so stdout stays just the display.
fn output_display(result: &CommandResult, json: bool) {
    let display = result
        .data
        .as_ref()
        .and_then(|d| d.get("display"))
        .and_then(|v| v.as_str());
    match (json, display) {
        (false, Some(d)) => {
            let ignored = ignored_keys(result);
            if !ignored.is_empty() {
                eprintln!("ignored keys: {}", ignored.join(" "));
            }
            println!("{}", d);
        }
        _ => output_result(result, json),
    }
}

/// Keys a `keys` command skipped because nothing was bound to them.
fn ignored_keys(result: &CommandResult) -> Vec<String> {
    result
        .data
        .as_ref()
        .and_then(|d| d.get("ignored"))
        .and_then(|v| v.as_array())
        .map(|keys| {
            keys.iter()
                .filter_map(|k| k.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn output_result(result: &CommandResult, json: bool) {
    if json {
        let j = serde_json::to_string_pretty(result).unwrap_or_default();
        println!("{}", j);
    } else {
        print_human(result);
    }

    // Exit with non-zero status on error/fail
    match result.status {
        Status::Pass => {}
        Status::Fail => std::process::exit(1),
        Status::Error => std::process::exit(2),
    }
}

fn print_human(r: &CommandResult) {
    let status_icon = match r.status {
        Status::Pass => "PASS",
        Status::Fail => "FAIL",
        Status::Error => "ERROR",
    };

    println!("[{}] {} {}", status_icon, r.command, r.target);
    println!("  run_id: {}", r.run_id);
    println!("  timing: {}ms", r.timing_ms.total);

    if let Some(ref err) = r.error {
        println!("  error:  {} – {}", err.code, err.message);
    }

    if let Some(ref data) = r.data {
        if let Ok(s) = serde_json::to_string_pretty(data) {
            for line in s.lines() {
                println!("  {}", line);
            }
        }
    }
}
