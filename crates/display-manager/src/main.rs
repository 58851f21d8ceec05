//! `display-negotiator` command-line entry point.
//!
//! Loads a topology fixture into the in-memory [`ScriptedBackend`], wires it
//! to a [`DisplayConfigManager`], and runs one negotiation against it.  Useful
//! for trying out mode changes and the layout adjustment without a real
//! compositor.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load settings + init logging
//!  └─ load_topology(--topology)
//!  └─ ScriptedBackend ──attach──► DisplayConfigManager
//!  └─ run subcommand
//!       ├─ show       export_screen_info
//!       ├─ exclusive  set_mode_exclusive
//!       ├─ roundtrip  set_mode_exclusive + restore_mode
//!       └─ adjust     adjust_display over the fixture
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use display_core::{
    adjust_display, DisplayConfig, IRect, ModeInfo, MonitorId, ScreenInfo, Status,
};
use display_manager::application::backend::DisplayBackend;
use display_manager::application::config_manager::DisplayConfigManager;
use display_manager::infrastructure::logging::init_logging;
use display_manager::infrastructure::scripted_backend::ScriptedBackend;
use display_manager::infrastructure::storage::config::{load_settings, load_settings_from};
use display_manager::infrastructure::storage::topology::{load_topology, save_topology};

/// Negotiate display modes against a topology fixture.
#[derive(Debug, Parser)]
#[command(name = "display-negotiator", version, about)]
struct Cli {
    /// Topology fixture (TOML) served by the in-memory backend.
    #[arg(long, value_name = "FILE")]
    topology: PathBuf,

    /// Settings file; defaults to the platform settings location.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Write the backend's final topology to this file.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print results as JSON instead of text.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print monitors, their modes and the primary monitor.
    Show,
    /// Switch one monitor to a mode, keeping the others as they are.
    Exclusive(ModeArgs),
    /// Switch one monitor to a mode, then restore the previous configuration.
    Roundtrip(ModeArgs),
    /// Run the layout adjustment over the fixture and print the result.
    Adjust,
}

#[derive(Debug, Args)]
struct ModeArgs {
    /// Connector name of the monitor, or "primary".
    #[arg(long)]
    monitor: String,

    /// Mode as WIDTHxHEIGHT[@HZ], e.g. 2560x1440@144.
    #[arg(long, conflicts_with_all = ["preferred", "current"])]
    mode: Option<ModeInfo>,

    /// Use the monitor's preferred mode.
    #[arg(long, conflicts_with = "current")]
    preferred: bool,

    /// Keep the monitor's current mode.
    #[arg(long)]
    current: bool,
}

impl ModeArgs {
    fn mode(&self) -> ModeInfo {
        match (self.mode, self.current) {
            (Some(mode), _) => mode,
            (None, true) => ModeInfo::CURRENT,
            (None, false) => ModeInfo::PREFERRED,
        }
    }
}

// ── Report types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Step {
    operation: &'static str,
    status: Status,
    applied: Option<DisplayConfig>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Report {
    Screens(ScreenInfo),
    Steps(Vec<Step>),
    Layout(DisplayConfig),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    }
    .context("failed to load settings")?;
    init_logging(&settings.manager.log_level);

    let topology = load_topology(&cli.topology)
        .with_context(|| format!("failed to load topology {}", cli.topology.display()))?;
    let scaling_mode = settings.manager.scaling_mode;
    info!(
        monitors = topology.monitors.len(),
        ?scaling_mode,
        "display-negotiator starting"
    );

    let backend = Arc::new(ScriptedBackend::new(topology.clone()));
    let manager = Arc::new(DisplayConfigManager::new(
        Arc::clone(&backend) as Arc<dyn DisplayBackend>,
        scaling_mode,
    ));
    backend.attach(&manager);
    manager.init(|config| info!(serial = config.serial, "display configuration changed"));
    manager.handle_config_changed(topology.clone());

    let report = match &cli.command {
        Command::Show => {
            let mut info = ScreenInfo::default();
            manager.export_screen_info(&mut info);
            Report::Screens(info)
        }
        Command::Exclusive(args) => {
            let monitor = resolve_monitor(&topology, &args.monitor)?;
            let status = manager.set_mode_exclusive(monitor, args.mode()).await;
            Report::Steps(vec![step("exclusive", status, &backend, 0)])
        }
        Command::Roundtrip(args) => {
            let monitor = resolve_monitor(&topology, &args.monitor)?;
            let status = manager.set_mode_exclusive(monitor, args.mode()).await;
            let first = step("exclusive", status, &backend, 0);
            let applied_so_far = backend.applied().len();
            let status = manager.restore_mode().await;
            let second = step("restore", status, &backend, applied_so_far);
            Report::Steps(vec![first, second])
        }
        Command::Adjust => {
            let mut adjusted = topology.clone();
            adjust_display(&mut adjusted, scaling_mode);
            Report::Layout(adjusted)
        }
    };

    if let Some(path) = &cli.output {
        let live = backend.topology().unwrap_or(topology);
        save_topology(path, &live)
            .with_context(|| format!("failed to write topology {}", path.display()))?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Maps a CLI monitor name to the full identity (name plus EDID) in `topology`.
fn resolve_monitor(topology: &DisplayConfig, name: &str) -> anyhow::Result<MonitorId> {
    if name == "primary" {
        return Ok(MonitorId::primary());
    }
    topology
        .monitors
        .iter()
        .find(|m| m.id.name == name)
        .map(|m| m.id.clone())
        .with_context(|| format!("no monitor named {name:?} in topology"))
}

/// Captures the target applied by this step, if the backend was called.
///
/// `index` is the number of targets the backend had received before the step.
fn step(operation: &'static str, status: Status, backend: &ScriptedBackend, index: usize) -> Step {
    let applied = backend
        .applied()
        .get(index)
        .map(|target| (**target).clone());
    Step {
        operation,
        status,
        applied,
    }
}

// ── Text output ───────────────────────────────────────────────────────────────

fn print_report(report: &Report) {
    match report {
        Report::Screens(info) => {
            for (index, monitor) in info.monitors.iter().enumerate() {
                let marker = if index == info.primary_monitor { "*" } else { " " };
                println!("{marker} {}", monitor.name);
                for (mode_index, mode) in monitor.modes.iter().enumerate() {
                    let mut flags = Vec::new();
                    if mode_index == monitor.current_mode {
                        flags.push("current");
                    }
                    if mode_index == monitor.preferred_mode {
                        flags.push("preferred");
                    }
                    println!("    {mode} {}", flags.join(" "));
                }
            }
        }
        Report::Steps(steps) => {
            for step in steps {
                println!("{}: {}", step.operation, step.status);
                match &step.applied {
                    Some(target) => print_layout(target),
                    None => println!("    (backend not called)"),
                }
            }
        }
        Report::Layout(config) => print_layout(config),
    }
}

fn print_layout(config: &DisplayConfig) {
    for monitor in &config.monitors {
        match monitor.modes.first() {
            Some(mode) => println!("    {} {}", monitor.id, mode.mode),
            None => println!("    {} (no mode)", monitor.id),
        }
    }
    for logical in &config.logical {
        let IRect {
            x,
            y,
            width,
            height,
        } = logical.rect;
        let names: Vec<String> = logical.monitors.iter().map(|m| m.to_string()).collect();
        println!(
            "    [{}] {width}x{height}+{x}+{y} scale {}",
            names.join(","),
            logical.scale
        );
    }
}
