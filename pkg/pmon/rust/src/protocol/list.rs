// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use super::DELIMITER;
use super::lines::{Line, Response};
use crate::errors::ParseError;
use crate::state::{ManagerOptions, ManagerStartMode};

const LEADING_FIELDS: usize = 5;

/// Parse a `MGRLIST:LIST` response.
///
/// Strict: one malformed row fails the whole response. Mutation commands
/// address managers by table index, so a table with a dropped row would point
/// them at the wrong manager.
///
/// Row layout: `component;startMode;secondsToKill;restartCount;resetStartCounter;startOptions`.
/// Everything after the fifth delimiter is the start options text, kept verbatim.
pub fn parse_manager_list(text: &str) -> Result<Vec<ManagerOptions>, ParseError> {
    let response = Response::scan(text);
    let managers = response
        .lines
        .iter()
        .map(parse_line)
        .collect::<Result<Vec<_>, _>>()?;
    response.check_count(managers.len());
    Ok(managers)
}

fn parse_line(line: &Line<'_>) -> Result<ManagerOptions, ParseError> {
    let malformed = |reason: String| ParseError::MalformedLine {
        line_no: line.number,
        line: line.text.to_string(),
        reason,
    };

    let fields: Vec<&str> = line.text.splitn(LEADING_FIELDS + 1, DELIMITER).collect();
    let [component, start_mode, seconds_to_kill, restart_count, reset_start_counter, rest @ ..] =
        fields.as_slice()
    else {
        return Err(malformed(format!(
            "expected at least {LEADING_FIELDS} fields, found {}",
            fields.len()
        )));
    };

    let component = component.trim();
    if component.is_empty() {
        return Err(malformed("empty component name".to_string()));
    }

    let int = |name: &str, raw: &str| -> Result<i32, ParseError> {
        raw.trim()
            .parse::<i32>()
            .map_err(|_| malformed(format!("{name} '{raw}' is not an integer")))
    };

    let start_mode_code = int("start mode", start_mode)?;
    let start_mode = ManagerStartMode::from_code(i64::from(start_mode_code)).ok_or_else(|| {
        malformed(format!(
            "invalid start mode {start_mode_code}, expected 0, 1 or 2"
        ))
    })?;

    Ok(ManagerOptions {
        component: component.to_string(),
        start_mode,
        seconds_to_kill: int("seconds to kill", seconds_to_kill)?,
        restart_count: int("restart count", restart_count)?,
        reset_start_counter: int("reset start counter", reset_start_counter)?,
        start_options: rest.first().map(|s| s.to_string()).unwrap_or_default(),
    })
}
