// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Correctness
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
// Panicking code
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

//! Client for the process monitor (PMON) command-line protocol.
//!
//! Every operation spawns the supervisor executable with a command line,
//! captures what it prints and, for the list queries, parses the
//! semicolon-delimited response into typed records.

pub mod client;
pub mod config;
mod errors;
pub mod format;
pub mod poll;
pub mod protocol;
pub mod resolver;
pub mod runner;
pub mod state;

pub use client::{ClientSettings, Outcome, PmonClient};
pub use errors::{Error, ParseError, Result};
pub use protocol::{parse_manager_list, parse_manager_status};
pub use resolver::{ExecutableResolver, FixedPathResolver, InstallRootResolver};
pub use runner::{CommandRunner, OutputStream, ProcessRunner, RunOptions, RunOutput};
pub use state::{
    ManagerOptions, ManagerRunningState, ManagerStartMode, ManagerStatus, RunState, UnitState,
    UnitStatus, UnitStatusSnapshot,
};
