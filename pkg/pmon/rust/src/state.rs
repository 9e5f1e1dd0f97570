// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;
use time::PrimitiveDateTime;

/// Whether the supervisor restarts a manager after it exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerStartMode {
    Unknown,
    Manual,
    Once,
    Always,
}

impl ManagerStartMode {
    /// Strict mapping of the wire code. Only 0, 1 and 2 are start modes.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ManagerStartMode::Manual),
            1 => Some(ManagerStartMode::Once),
            2 => Some(ManagerStartMode::Always),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ManagerStartMode::Unknown => -1,
            ManagerStartMode::Manual => 0,
            ManagerStartMode::Once => 1,
            ManagerStartMode::Always => 2,
        }
    }

    /// Lowercase name used in progs files and operator output. Unknown has none.
    pub fn as_label(self) -> &'static str {
        match self {
            ManagerStartMode::Manual => "manual",
            ManagerStartMode::Once => "once",
            ManagerStartMode::Always => "always",
            ManagerStartMode::Unknown => "",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "manual" => Some(ManagerStartMode::Manual),
            "once" => Some(ManagerStartMode::Once),
            "always" => Some(ManagerStartMode::Always),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerRunningState {
    Unknown,
    NotRunning,
    Init,
    Running,
    Blocked,
}

impl ManagerRunningState {
    /// Status is read-only telemetry, so unknown codes fall back to NotRunning.
    pub fn from_code_lenient(code: i64) -> Self {
        match code {
            0 => ManagerRunningState::NotRunning,
            1 => ManagerRunningState::Init,
            2 => ManagerRunningState::Running,
            3 => ManagerRunningState::Blocked,
            _ => ManagerRunningState::NotRunning,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ManagerRunningState::Unknown => -1,
            ManagerRunningState::NotRunning => 0,
            ManagerRunningState::Init => 1,
            ManagerRunningState::Running => 2,
            ManagerRunningState::Blocked => 3,
        }
    }

    pub fn is_alive(self) -> bool {
        matches!(
            self,
            ManagerRunningState::Init | ManagerRunningState::Running | ManagerRunningState::Blocked
        )
    }
}

impl fmt::Display for ManagerRunningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerRunningState::Unknown => write!(f, "Unknown"),
            ManagerRunningState::NotRunning => write!(f, "NotRunning"),
            ManagerRunningState::Init => write!(f, "Init"),
            ManagerRunningState::Running => write!(f, "Running"),
            ManagerRunningState::Blocked => write!(f, "Blocked"),
        }
    }
}

/// Overall state of a unit as carried by the STATI sentinel line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    Unknown,
    Down,
    Starting,
    Monitoring,
    Stopping,
    Restarting,
}

impl UnitState {
    /// Code 4 is not used by the protocol; it and every other unlisted code map to Unknown.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => UnitState::Down,
            1 => UnitState::Starting,
            2 => UnitState::Monitoring,
            3 => UnitState::Stopping,
            5 => UnitState::Restarting,
            _ => UnitState::Unknown,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            UnitState::Unknown => -1,
            UnitState::Down => 0,
            UnitState::Starting => 1,
            UnitState::Monitoring => 2,
            UnitState::Stopping => 3,
            UnitState::Restarting => 5,
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Unknown => write!(f, "Unknown"),
            UnitState::Down => write!(f, "Stopped"),
            UnitState::Starting => write!(f, "Starting"),
            UnitState::Monitoring => write!(f, "Started"),
            UnitState::Stopping => write!(f, "Stopping"),
            UnitState::Restarting => write!(f, "Restarting"),
        }
    }
}

/// Answer of `-status`: whether the supervisor for a unit is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    NotRunning,
    Unknown,
}

impl RunState {
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => RunState::Running,
            3 => RunState::NotRunning,
            _ => RunState::Unknown,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Running => write!(f, "running"),
            RunState::NotRunning => write!(f, "not-running"),
            RunState::Unknown => write!(f, "unknown"),
        }
    }
}

/// One row of `MGRLIST:LIST`. Row 0 is always the supervisor itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    pub component: String,
    pub start_mode: ManagerStartMode,
    /// Grace period before force-kill. Kept signed; negative values appear in real tables.
    pub seconds_to_kill: i32,
    pub reset_start_counter: i32,
    pub restart_count: i32,
    /// Raw trailing command line, may contain `;`.
    pub start_options: String,
}

/// One row of `MGRLIST:STATI`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerStatus {
    pub state: ManagerRunningState,
    pub pid: Option<u32>,
    pub start_mode: ManagerStartMode,
    /// Supervisor host local wall-clock time; the wire carries no offset.
    pub start_time: Option<PrimitiveDateTime>,
    /// Not the table position and not necessarily sequential.
    pub manager_number: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitStatus {
    pub state: UnitState,
    pub raw_code: i32,
    pub raw_text: String,
    pub emergency: bool,
    pub demo: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitStatusSnapshot {
    pub managers: Vec<ManagerStatus>,
    /// Absent when the sentinel line is missing or unreadable.
    pub unit: Option<UnitStatus>,
}
