// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures of a single client call. A supervisor that ran and answered with an
/// unexpected exit code is not an error; see [`crate::Outcome`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("executable not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to spawn {}: {source}", path.display())]
    SpawnFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} did not exit within {}ms and was killed", path.display(), after.as_millis())]
    Timeout { path: PathBuf, after: Duration },

    /// A query ran but the supervisor answered with a failing exit code and no output.
    #[error("supervisor rejected the query (exit code {exit_code}): {stderr}")]
    Rejected { exit_code: i32, stderr: String },

    #[error("could not parse supervisor response: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("i/o error while talking to the supervisor: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures where the supervisor never produced an answer.
    pub fn is_process_failure(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::SpawnFailed { .. } | Error::Timeout { .. }
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line_no} '{line}': {reason}")]
    MalformedLine {
        line_no: usize,
        line: String,
        reason: String,
    },

    #[error("response has no ';' terminator line")]
    MissingTerminator,
}

pub type Result<T> = std::result::Result<T, Error>;
