// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::errors::{Error, Result};
use crate::protocol::{parse_manager_list, parse_manager_status};
use crate::resolver::{ExecutableResolver, PMON_EXECUTABLE};
use crate::runner::{CommandRunner, ProcessRunner, RunOptions, RunOutput};
use crate::state::{ManagerOptions, ManagerStartMode, ManagerStatus, RunState, UnitStatusSnapshot};
use log::{info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Exit codes meaning "registered" for the register commands; 3 is
/// "registered but not running".
const REGISTER_OK: &[i32] = &[0, 3];
const COMMAND_OK: &[i32] = &[0];

/// Table row of the supervisor itself. Single-manager commands never target it.
pub const SUPERVISOR_INDEX: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Limit for every blocking command. `None` waits as long as the supervisor takes.
    pub command_timeout: Option<Duration>,
    /// Extra attempts for register/unregister after a failure outcome.
    pub register_retries: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            command_timeout: None,
            register_retries: 1,
        }
    }
}

/// Result of a mutation command: the supervisor ran and either accepted or
/// rejected the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure { exit_code: i32 },
}

impl Outcome {
    fn from_exit_code(exit_code: i32, accepted: &[i32]) -> Self {
        if accepted.contains(&exit_code) {
            Outcome::Success
        } else {
            Outcome::Failure { exit_code }
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failure { exit_code } => write!(f, "failure (exit code {exit_code})"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ManagerCommand {
    Start,
    Stop,
    Kill,
    Remove,
}

impl ManagerCommand {
    fn as_wire(self) -> &'static str {
        match self {
            ManagerCommand::Start => "SINGLE_MGR:START",
            ManagerCommand::Stop => "SINGLE_MGR:STOP",
            ManagerCommand::Kill => "SINGLE_MGR:KILL",
            ManagerCommand::Remove => "SINGLE_MGR:DEL",
        }
    }
}

/// Command façade for one installed supervisor executable.
///
/// The client keeps no connection: every call spawns the executable once and
/// forgets it. Calls are not serialised against each other, so two mutation
/// commands sent concurrently for the same unit race inside the supervisor.
/// Callers that need ordering must await one call before issuing the next.
///
/// Manager indices are table positions as the supervisor counts them. Index 0
/// is the supervisor's own row, so application managers start at 1.
#[derive(Clone)]
pub struct PmonClient {
    executable: PathBuf,
    version: Option<String>,
    settings: ClientSettings,
    runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for PmonClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PmonClient")
            .field("executable", &self.executable)
            .field("version", &self.version)
            .field("settings", &self.settings)
            .finish()
    }
}

impl PmonClient {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            version: None,
            settings: ClientSettings::default(),
            runner: Arc::new(ProcessRunner),
        }
    }

    /// Build a client for `version`, failing with [`Error::NotFound`] when the
    /// resolver has no executable for it.
    pub fn from_resolver(resolver: &dyn ExecutableResolver, version: &str) -> Result<Self> {
        let executable = resolver
            .resolve(Some(version))
            .ok_or_else(|| Error::NotFound {
                path: PathBuf::from(format!("{PMON_EXECUTABLE} ({version})")),
            })?;
        Ok(Self::new(executable).with_version(version))
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    // -- registration --

    /// Register the unit described by `config_path` with this client's version.
    /// Exit code 3 ("registered, not running") counts as success.
    pub async fn register_unit(&self, config_path: &Path) -> Result<Outcome> {
        if config_path.as_os_str().is_empty() {
            return Err(Error::InvalidArgument(
                "config path must not be empty".to_string(),
            ));
        }
        let args = strings([
            "-config",
            &config_path.to_string_lossy(),
            "-log",
            "+stderr",
            "-autofreg",
            "-status",
        ]);
        self.command_with_retry("register", args, REGISTER_OK).await
    }

    pub async fn unregister_unit(&self, unit: &str) -> Result<Outcome> {
        require_unit(unit)?;
        let args = strings(["-unreg", unit, "-log", "+stderr"]);
        self.command_with_retry("unregister", args, COMMAND_OK).await
    }

    pub async fn register_sub_unit(&self, path: &Path) -> Result<Outcome> {
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidArgument(
                "sub-project path must not be empty".to_string(),
            ));
        }
        let args = strings([
            "-regsubf",
            "-proj",
            &path.to_string_lossy(),
            "-log",
            "+stderr",
        ]);
        self.command_with_retry("register sub-project", args, REGISTER_OK)
            .await
    }

    // -- unit lifecycle --

    /// Ask whether the supervisor for `unit` is up. Never fails: anything that
    /// prevents an answer is reported as [`RunState::Unknown`].
    pub async fn query_run_state(&self, unit: &str) -> RunState {
        if let Err(e) = require_unit(unit) {
            warn!("run state query rejected: {e}");
            return RunState::Unknown;
        }
        let args = strings(["-status", "-proj", unit, "-log", "+stdout"]);
        match self.exec(args, self.blocking()).await {
            Ok(output) => RunState::from_exit_code(output.exit_code),
            Err(e) => {
                warn!("[{unit}] run state query failed: {e}");
                RunState::Unknown
            }
        }
    }

    /// Start the supervisor for `unit` without starting its managers.
    ///
    /// Fire and forget: the call returns as soon as the process is spawned.
    /// Poll [`Self::query_run_state`] to learn when it is up.
    pub async fn start_unit_only(&self, unit: &str) -> Result<Outcome> {
        require_unit(unit)?;
        let args = strings(["-proj", unit, "-noAutostart"]);
        let output = self.exec(args, RunOptions::detached()).await?;
        Ok(Outcome::from_exit_code(output.exit_code, COMMAND_OK))
    }

    pub async fn start_unit_all(&self, unit: &str) -> Result<Outcome> {
        self.unit_command(unit, "START_ALL:").await
    }

    pub async fn stop_unit_all(&self, unit: &str) -> Result<Outcome> {
        self.unit_command(unit, "STOP_ALL:").await
    }

    /// Stop every manager and then the supervisor itself.
    pub async fn stop_unit_and_supervisor(&self, unit: &str) -> Result<Outcome> {
        require_unit(unit)?;
        let args = strings(["-proj", unit, "-stopWait"]);
        self.command(args, COMMAND_OK).await
    }

    pub async fn restart_unit_all(&self, unit: &str) -> Result<Outcome> {
        self.unit_command(unit, "RESTART_ALL:").await
    }

    /// Put the supervisor into wait mode: managers stopped, supervisor waiting for commands.
    pub async fn set_wait_mode(&self, unit: &str) -> Result<Outcome> {
        self.unit_command(unit, "WAIT_MODE:").await
    }

    // -- single managers --

    pub async fn start_manager(&self, unit: &str, index: usize) -> Result<Outcome> {
        self.manager_command(unit, index, ManagerCommand::Start).await
    }

    pub async fn stop_manager(&self, unit: &str, index: usize) -> Result<Outcome> {
        self.manager_command(unit, index, ManagerCommand::Stop).await
    }

    pub async fn kill_manager(&self, unit: &str, index: usize) -> Result<Outcome> {
        self.manager_command(unit, index, ManagerCommand::Kill).await
    }

    pub async fn remove_manager(&self, unit: &str, index: usize) -> Result<Outcome> {
        self.manager_command(unit, index, ManagerCommand::Remove).await
    }

    /// Insert a manager so that it ends up at table position `index`.
    pub async fn insert_manager_at(
        &self,
        options: &ManagerOptions,
        unit: &str,
        index: usize,
    ) -> Result<Outcome> {
        require_unit(unit)?;
        require_manager_index(index)?;
        if options.component.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "manager component must not be empty".to_string(),
            ));
        }
        let start_mode = wire_start_mode(options.start_mode)?;
        let args = strings([
            "-proj",
            unit,
            "-command",
            "SINGLE_MGR:INS",
            &index.to_string(),
            &options.component,
            &start_mode.to_string(),
            &options.seconds_to_kill.to_string(),
            &options.restart_count.to_string(),
            &options.reset_start_counter.to_string(),
            &options.start_options,
        ]);
        self.command(args, COMMAND_OK).await
    }

    /// Overwrite the options of the manager at `index`. The component is not changed.
    pub async fn set_manager_options_at(
        &self,
        options: &ManagerOptions,
        unit: &str,
        index: usize,
    ) -> Result<Outcome> {
        require_unit(unit)?;
        require_manager_index(index)?;
        let start_mode = wire_start_mode(options.start_mode)?;
        let args = strings([
            "-proj",
            unit,
            "-command",
            "SINGLE_MGR:PROP_PUT",
            &index.to_string(),
            &start_mode.to_string(),
            &options.seconds_to_kill.to_string(),
            &options.reset_start_counter.to_string(),
            &options.restart_count.to_string(),
            &options.start_options,
        ]);
        self.command(args, COMMAND_OK).await
    }

    pub async fn send_debug_flag(&self, flag: &str, unit: &str, index: usize) -> Result<Outcome> {
        require_unit(unit)?;
        require_manager_index(index)?;
        if flag.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "debug flag must not be empty".to_string(),
            ));
        }
        let args = strings([
            "-proj",
            unit,
            "-command",
            "SINGLE_MGR:DEBUG",
            &index.to_string(),
            flag,
        ]);
        self.command(args, COMMAND_OK).await
    }

    // -- queries --

    /// Configured managers in table order; element 0 is the supervisor.
    pub async fn list_manager_options(&self, unit: &str) -> Result<Vec<ManagerOptions>> {
        require_unit(unit)?;
        let output = self.query(unit, "MGRLIST:LIST").await?;
        Ok(parse_manager_list(&output.stdout)?)
    }

    /// Convenience over [`Self::list_manager_options`]; `None` when `index` is past the end.
    pub async fn manager_options_at(
        &self,
        unit: &str,
        index: usize,
    ) -> Result<Option<ManagerOptions>> {
        let mut managers = self.list_manager_options(unit).await?;
        Ok((index < managers.len()).then(|| managers.swap_remove(index)))
    }

    pub async fn get_unit_status(&self, unit: &str) -> Result<UnitStatusSnapshot> {
        require_unit(unit)?;
        let output = self.query(unit, "MGRLIST:STATI").await?;
        Ok(parse_manager_status(&output.stdout)?)
    }

    pub async fn manager_status_at(
        &self,
        unit: &str,
        index: usize,
    ) -> Result<Option<ManagerStatus>> {
        let mut snapshot = self.get_unit_status(unit).await?;
        Ok((index < snapshot.managers.len()).then(|| snapshot.managers.swap_remove(index)))
    }

    // -- plumbing --

    fn blocking(&self) -> RunOptions {
        RunOptions::with_timeout(self.settings.command_timeout)
    }

    async fn exec(&self, args: Vec<String>, options: RunOptions) -> Result<RunOutput> {
        self.runner.run(&self.executable, &args, options).await
    }

    async fn command(&self, args: Vec<String>, accepted: &[i32]) -> Result<Outcome> {
        let output = self.exec(args, self.blocking()).await?;
        let outcome = Outcome::from_exit_code(output.exit_code, accepted);
        if let Outcome::Failure { exit_code } = outcome {
            warn!(
                "{} rejected the command (exit code {exit_code}): {}",
                self.executable.display(),
                output.stderr.trim()
            );
        }
        Ok(outcome)
    }

    /// One extra attempt per configured retry when the supervisor rejects the
    /// command. Process-level errors are returned at once.
    async fn command_with_retry(
        &self,
        what: &str,
        args: Vec<String>,
        accepted: &[i32],
    ) -> Result<Outcome> {
        let mut attempt = 0;
        loop {
            let outcome = self.command(args.clone(), accepted).await?;
            if outcome.is_success() || attempt >= self.settings.register_retries {
                info!("{what}: {outcome}");
                return Ok(outcome);
            }
            attempt += 1;
            warn!("{what} failed ({outcome}), retrying");
        }
    }

    async fn unit_command(&self, unit: &str, command: &str) -> Result<Outcome> {
        require_unit(unit)?;
        let args = strings(["-proj", unit, "-command", command]);
        self.command(args, COMMAND_OK).await
    }

    async fn manager_command(
        &self,
        unit: &str,
        index: usize,
        command: ManagerCommand,
    ) -> Result<Outcome> {
        require_unit(unit)?;
        require_manager_index(index)?;
        let args = strings([
            "-proj",
            unit,
            "-command",
            command.as_wire(),
            &index.to_string(),
        ]);
        self.command(args, COMMAND_OK).await
    }

    async fn query(&self, unit: &str, command: &str) -> Result<RunOutput> {
        let args = strings(["-proj", unit, "-command", command, "-log", "+stdout"]);
        let output = self.exec(args, self.blocking()).await?;
        if output.exit_code != 0 {
            if output.stdout.trim().is_empty() {
                return Err(Error::Rejected {
                    exit_code: output.exit_code,
                    stderr: output.stderr.trim().to_string(),
                });
            }
            warn!(
                "[{unit}] {command} exited with code {}, parsing its output anyway",
                output.exit_code
            );
        }
        Ok(output)
    }
}

fn strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.into_iter().map(String::from).collect()
}

fn require_unit(unit: &str) -> Result<()> {
    if unit.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "unit id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn require_manager_index(index: usize) -> Result<()> {
    if index == SUPERVISOR_INDEX {
        return Err(Error::InvalidArgument(
            "manager index 0 is the supervisor itself; managers start at 1".to_string(),
        ));
    }
    Ok(())
}

fn wire_start_mode(mode: ManagerStartMode) -> Result<i32> {
    if mode == ManagerStartMode::Unknown {
        return Err(Error::InvalidArgument(
            "start mode must be manual, once or always".to_string(),
        ));
    }
    Ok(mode.code())
}
