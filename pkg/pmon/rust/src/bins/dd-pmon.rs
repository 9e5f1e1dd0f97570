// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dd_pmon::config::{PmonConfig, config_path, load_config, parse_log_level};
use dd_pmon::format::{render_manager_list, render_unit_status};
use dd_pmon::poll::{wait_for_registration, wait_for_run_state};
use dd_pmon::resolver::PMON_EXECUTABLE;
use dd_pmon::{ManagerOptions, ManagerStartMode, Outcome, PmonClient, RunState};
use log::{debug, info};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "dd-pmon")]
#[command(about = "Drive a process monitor (WCCILpmon) from the command line", long_about = None)]
struct Cli {
    /// YAML configuration file (default: $DD_PMON_CONFIG or /etc/pmon/pmon.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Supervisor executable, overriding the configuration
    #[arg(long, global = true)]
    pmon: Option<PathBuf>,

    /// Product version used to locate the executable under the install root
    #[arg(long, global = true)]
    version_id: Option<String>,

    /// error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a unit from its config file
    Register {
        config_path: PathBuf,
        /// Poll until the supervisor knows this unit
        #[arg(long)]
        wait_for: Option<String>,
    },
    /// Unregister a unit
    Unregister { unit: String },
    /// Register a sub-project
    RegisterSub { path: PathBuf },
    /// Report whether the supervisor for a unit is running
    Status { unit: String },
    /// Start the supervisor without its managers
    Start {
        unit: String,
        /// Poll until the supervisor reports running
        #[arg(long)]
        wait: bool,
    },
    /// Start every manager of a unit
    StartAll { unit: String },
    /// Stop every manager of a unit
    StopAll { unit: String },
    /// Stop every manager and then the supervisor
    Stop { unit: String },
    /// Restart every manager of a unit
    RestartAll { unit: String },
    /// Switch the supervisor to wait mode
    WaitMode { unit: String },
    /// Show the configured managers
    List { unit: String },
    /// Show the runtime status of every manager
    Stati { unit: String },
    /// Act on a single manager
    Manager {
        #[command(subcommand)]
        action: ManagerAction,
    },
    /// Insert a manager at a table position
    Insert {
        unit: String,
        index: usize,
        component: String,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Replace the options of the manager at a table position
    SetOptions {
        unit: String,
        index: usize,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Send a debug flag to a manager
    Debug {
        unit: String,
        index: usize,
        flag: String,
    },
}

#[derive(Subcommand, Debug)]
enum ManagerAction {
    Start { unit: String, index: usize },
    Stop { unit: String, index: usize },
    Kill { unit: String, index: usize },
    Remove { unit: String, index: usize },
}

#[derive(clap::Args, Debug)]
struct OptionArgs {
    /// manual, once or always
    #[arg(long, default_value = "always", value_parser = parse_start_mode)]
    mode: ManagerStartMode,
    #[arg(long, default_value_t = 30, allow_negative_numbers = true)]
    seconds_to_kill: i32,
    #[arg(long, default_value_t = 3)]
    restart_count: i32,
    #[arg(long, default_value_t = 1)]
    reset_start_counter: i32,
    /// Start options passed to the manager verbatim
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    options: String,
}

impl OptionArgs {
    fn into_manager(self, component: String) -> ManagerOptions {
        ManagerOptions {
            component,
            start_mode: self.mode,
            seconds_to_kill: self.seconds_to_kill,
            reset_start_counter: self.reset_start_counter,
            restart_count: self.restart_count,
            start_options: self.options,
        }
    }
}

fn parse_start_mode(raw: &str) -> Result<ManagerStartMode, String> {
    ManagerStartMode::from_label(raw)
        .ok_or_else(|| format!("'{raw}' is not manual, once or always"))
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            // The logger may not be up yet when configuration fails.
            eprintln!("dd-pmon: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let path = cli.config.clone().unwrap_or_else(config_path);
    let config = load_config(&path)?;
    let level = match cli.log_level {
        Some(ref raw) => parse_log_level(raw)?,
        None => config.log_level()?,
    };
    simple_logger::init_with_level(level)?;
    debug!("configuration loaded from {}", path.display());

    let client = build_client(&cli, &config)?;
    info!(
        "dd-pmon {} using {}",
        env!("CARGO_PKG_VERSION"),
        client.executable().display()
    );
    dispatch(cli.command, &client, &config).await
}

fn build_client(cli: &Cli, config: &PmonConfig) -> Result<PmonClient> {
    let version = cli.version_id.clone().or_else(|| config.version.clone());
    let client = match cli.pmon {
        Some(ref path) => PmonClient::new(path),
        None => {
            let resolver = config.resolver().context(concat!(
                "no supervisor executable configured: ",
                "pass --pmon or set executable or install_root"
            ))?;
            let path = resolver.resolve(version.as_deref()).with_context(|| {
                format!(
                    "no {PMON_EXECUTABLE} found for version {}",
                    version.as_deref().unwrap_or("<unset>")
                )
            })?;
            PmonClient::new(path)
        }
    };
    let client = match version {
        Some(version) => client.with_version(version),
        None => client,
    };
    Ok(client.with_settings(config.client_settings()))
}

#[allow(clippy::print_stdout)]
async fn dispatch(command: Command, client: &PmonClient, config: &PmonConfig) -> Result<bool> {
    let outcome = match command {
        Command::Register {
            config_path,
            wait_for,
        } => {
            let outcome = client.register_unit(&config_path).await?;
            if let (true, Some(unit)) = (outcome.is_success(), wait_for) {
                let registered =
                    wait_for_registration(client, &unit, config.poll_settings()).await;
                return Ok(report(outcome) && registered);
            }
            outcome
        }
        Command::Unregister { unit } => client.unregister_unit(&unit).await?,
        Command::RegisterSub { path } => client.register_sub_unit(&path).await?,
        Command::Status { unit } => {
            let state = client.query_run_state(&unit).await;
            println!("{state}");
            return Ok(state != RunState::Unknown);
        }
        Command::Start { unit, wait } => {
            let outcome = client.start_unit_only(&unit).await?;
            if wait && outcome.is_success() {
                let running =
                    wait_for_run_state(client, &unit, RunState::Running, config.poll_settings())
                        .await;
                return Ok(report(outcome) && running);
            }
            outcome
        }
        Command::StartAll { unit } => client.start_unit_all(&unit).await?,
        Command::StopAll { unit } => client.stop_unit_all(&unit).await?,
        Command::Stop { unit } => client.stop_unit_and_supervisor(&unit).await?,
        Command::RestartAll { unit } => client.restart_unit_all(&unit).await?,
        Command::WaitMode { unit } => client.set_wait_mode(&unit).await?,
        Command::List { unit } => {
            let managers = client.list_manager_options(&unit).await?;
            print!("{}", render_manager_list(&managers));
            return Ok(true);
        }
        Command::Stati { unit } => {
            let snapshot = client.get_unit_status(&unit).await?;
            print!("{}", render_unit_status(&snapshot));
            return Ok(true);
        }
        Command::Manager { action } => match action {
            ManagerAction::Start { unit, index } => client.start_manager(&unit, index).await?,
            ManagerAction::Stop { unit, index } => client.stop_manager(&unit, index).await?,
            ManagerAction::Kill { unit, index } => client.kill_manager(&unit, index).await?,
            ManagerAction::Remove { unit, index } => client.remove_manager(&unit, index).await?,
        },
        Command::Insert {
            unit,
            index,
            component,
            options,
        } => {
            let manager = options.into_manager(component);
            client.insert_manager_at(&manager, &unit, index).await?
        }
        Command::SetOptions {
            unit,
            index,
            options,
        } => {
            let manager = options.into_manager(String::new());
            client.set_manager_options_at(&manager, &unit, index).await?
        }
        Command::Debug { unit, index, flag } => {
            client.send_debug_flag(&flag, &unit, index).await?
        }
    };
    Ok(report(outcome))
}

#[allow(clippy::print_stdout)]
fn report(outcome: Outcome) -> bool {
    println!("{outcome}");
    outcome.is_success()
}
