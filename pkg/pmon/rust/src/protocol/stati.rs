// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use super::DELIMITER;
use super::lines::{Line, Response};
use crate::errors::ParseError;
use crate::state::{
    ManagerRunningState, ManagerStartMode, ManagerStatus, UnitState, UnitStatus,
    UnitStatusSnapshot,
};
use log::warn;
use time::PrimitiveDateTime;
use time::macros::format_description;

const STATUS_FIELDS: usize = 5;
const PID_NOT_RUNNING: i64 = -1;

/// Parse a `MGRLIST:STATI` response into manager rows and the unit state.
///
/// Row layout: `runningState;pid;startMode;startTime;managerNumber`. The line
/// right before the terminator is the unit state line
/// (`statusCode text emergency demo`), found with a one-line lookahead. It is
/// never read as a manager row, even when it does not parse as a unit line.
///
/// Individual fields are read leniently since this is read-only telemetry; only
/// a response with no terminator at all is rejected.
pub fn parse_manager_status(text: &str) -> Result<UnitStatusSnapshot, ParseError> {
    let response = Response::scan(text);
    if response.is_blank() {
        return Ok(UnitStatusSnapshot::default());
    }
    if !response.terminated {
        return Err(ParseError::MissingTerminator);
    }

    let mut snapshot = UnitStatusSnapshot::default();
    let mut lines = response.lines.iter().peekable();
    while let Some(line) = lines.next() {
        if lines.peek().is_some() {
            snapshot.managers.extend(parse_status_line(line));
            continue;
        }
        match parse_unit_line(line.text) {
            Some(unit) => snapshot.unit = Some(unit),
            None => warn!(
                "line {}: unrecognised unit state line '{}', skipping",
                line.number, line.text
            ),
        }
    }

    response.check_count(snapshot.managers.len());
    Ok(snapshot)
}

fn parse_unit_line(text: &str) -> Option<UnitStatus> {
    if text.contains(DELIMITER) {
        return None;
    }
    let mut tokens = text.split_whitespace();
    let raw_code: i32 = tokens.next()?.parse().ok()?;
    let raw_text = tokens.next()?.to_string();
    let emergency = flag(tokens.next()?);
    let demo = flag(tokens.next()?);

    Some(UnitStatus {
        state: UnitState::from_code(i64::from(raw_code)),
        raw_code,
        raw_text,
        emergency,
        demo,
    })
}

fn flag(token: &str) -> bool {
    token.parse::<i32>() == Ok(1)
}

fn parse_status_line(line: &Line<'_>) -> Option<ManagerStatus> {
    let fields: Vec<&str> = line.text.split(DELIMITER).map(str::trim).collect();
    let [state, pid, start_mode, start_time, manager_number, ..] = fields.as_slice() else {
        warn!(
            "line {}: expected {STATUS_FIELDS} fields, skipping '{}'",
            line.number, line.text
        );
        return None;
    };

    let Ok(manager_number) = manager_number.parse::<i32>() else {
        warn!(
            "line {}: manager number '{manager_number}' is not an integer, skipping",
            line.number
        );
        return None;
    };

    let state = state
        .parse::<i64>()
        .map(ManagerRunningState::from_code_lenient)
        .unwrap_or(ManagerRunningState::NotRunning);
    let start_mode = start_mode
        .parse::<i64>()
        .ok()
        .and_then(ManagerStartMode::from_code)
        .unwrap_or(ManagerStartMode::Manual);

    Some(ManagerStatus {
        state,
        pid: parse_pid(pid, line.number),
        start_mode,
        start_time: parse_start_time(start_time),
        manager_number,
    })
}

fn parse_pid(raw: &str, line_no: usize) -> Option<u32> {
    match raw.parse::<i64>() {
        Ok(PID_NOT_RUNNING) => None,
        Ok(pid) => match u32::try_from(pid) {
            Ok(pid) => Some(pid),
            Err(_) => {
                warn!("line {line_no}: pid {pid} is out of range");
                None
            }
        },
        Err(_) => {
            warn!("line {line_no}: pid '{raw}' is not an integer");
            None
        }
    }
}

/// `YYYY.MM.DD HH:MM:SS.mmm` in the supervisor's local time. `0`, `-1`, an
/// empty field and anything in 1970 mean the manager never started.
fn parse_start_time(raw: &str) -> Option<PrimitiveDateTime> {
    if matches!(raw, "" | "0" | "-1") || raw.starts_with("1970") {
        return None;
    }
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match PrimitiveDateTime::parse(
        &normalized,
        format_description!("[year].[month].[day] [hour]:[minute]:[second].[subsecond digits:3]"),
    ) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("unparseable start time '{raw}': {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NINE_MANAGERS: &str = "STATI:9
2;33540;0;2025.12.04 08:51:42.036;  1
0;   -1;0;1970.01.01 01:00:00.000;  1
0;   -1;0;1970.01.01 01:00:00.000;  1
0;   -1;0;1970.01.01 01:00:00.000;  1
0;   -1;0;1970.01.01 01:00:00.000;  1
0;   -1;0;1970.01.01 01:00:00.000;  1
0;   -1;0;1970.01.01 01:00:00.000;  1
0;   -1;2;1970.01.01 01:00:00.000;  2
0;   -1;1;1970.01.01 01:00:00.000;  4
0 WAIT_MODE 0 0
;
";

    #[test]
    fn test_parse_nine_managers_and_unit() {
        let snapshot = parse_manager_status(NINE_MANAGERS).unwrap();
        assert_eq!(snapshot.managers.len(), 9);

        let pmon = &snapshot.managers[0];
        assert_eq!(pmon.state, ManagerRunningState::Running);
        assert_eq!(pmon.pid, Some(33540));
        assert_eq!(pmon.start_mode, ManagerStartMode::Manual);
        assert_eq!(pmon.start_time, Some(datetime!(2025-12-04 08:51:42.036)));
        assert_eq!(pmon.manager_number, 1);

        let stopped = &snapshot.managers[1];
        assert_eq!(stopped.state, ManagerRunningState::NotRunning);
        assert_eq!(stopped.pid, None);
        assert_eq!(stopped.start_time, None);

        assert_eq!(snapshot.managers[7].start_mode, ManagerStartMode::Always);
        assert_eq!(snapshot.managers[7].manager_number, 2);
        assert_eq!(snapshot.managers[8].start_mode, ManagerStartMode::Once);
        assert_eq!(snapshot.managers[8].manager_number, 4);

        assert_eq!(
            snapshot.unit,
            Some(UnitStatus {
                state: UnitState::Down,
                raw_code: 0,
                raw_text: "WAIT_MODE".to_string(),
                emergency: false,
                demo: false,
            })
        );
    }

    #[test]
    fn test_list_tag_header_accepted() {
        let text = NINE_MANAGERS.replacen("STATI:9", "LIST:9", 1);
        let snapshot = parse_manager_status(&text).unwrap();
        assert_eq!(snapshot.managers.len(), 9);
        assert!(snapshot.unit.is_some());
    }

    #[test]
    fn test_timestamp_parsing() {
        assert_eq!(
            parse_start_time("2025.10.15 13:54:33.236"),
            Some(datetime!(2025-10-15 13:54:33.236))
        );
        assert_eq!(
            parse_start_time("2025.10.15   13:54:33.236"),
            Some(datetime!(2025-10-15 13:54:33.236))
        );
        for sentinel in ["", "0", "-1", "1970.01.01 01:00:00.000", "1970"] {
            assert_eq!(parse_start_time(sentinel), None, "sentinel {sentinel:?}");
        }
        assert_eq!(parse_start_time("yesterday"), None);
        assert_eq!(parse_start_time("2025-10-15 13:54:33.236"), None);
        assert_eq!(parse_start_time("2025.10.15 13:54:33"), None);
    }

    #[test]
    fn test_pid_sentinel() {
        let snapshot =
            parse_manager_status("2;4711;2;0;3\n0;-1;0;0;4\n2 MONITOR_MODE 0 0\n;").unwrap();
        assert_eq!(snapshot.managers[0].pid, Some(4711));
        assert_eq!(snapshot.managers[1].pid, None);
    }

    #[test]
    fn test_out_of_range_pid_is_dropped() {
        let snapshot =
            parse_manager_status("2;-7;2;0;3\n2;4294967296;2;0;4\n2 MONITOR_MODE 0 0\n;")
                .unwrap();
        assert_eq!(snapshot.managers.len(), 2);
        assert_eq!(snapshot.managers[0].pid, None);
        assert_eq!(snapshot.managers[1].pid, None);
    }

    #[test]
    fn test_unknown_running_state_falls_back() {
        let snapshot = parse_manager_status("9;12;7;0;1\n0 WAIT_MODE 0 0\n;").unwrap();
        assert_eq!(snapshot.managers.len(), 1);
        assert_eq!(snapshot.managers[0].state, ManagerRunningState::NotRunning);
        assert_eq!(snapshot.managers[0].start_mode, ManagerStartMode::Manual);
    }

    #[test]
    fn test_unit_state_codes() {
        let snapshot = parse_manager_status("2 MONITOR_MODE 1 1\n;").unwrap();
        let unit = snapshot.unit.unwrap();
        assert_eq!(unit.state, UnitState::Monitoring);
        assert!(unit.emergency);
        assert!(unit.demo);

        let unit = parse_manager_status("4 RESERVED 0 0\n;").unwrap().unit.unwrap();
        assert_eq!(unit.state, UnitState::Unknown);
        assert_eq!(unit.raw_code, 4);

        let unit = parse_manager_status("5 RESTART 0 0\n;").unwrap().unit.unwrap();
        assert_eq!(unit.state, UnitState::Restarting);
    }

    #[test]
    fn test_sentinel_requires_terminator_next() {
        // A unit-looking line in the middle of the table is not the sentinel.
        let text = "0 WAIT_MODE 0 0\n2;1;0;0;1\n1 STARTING 0 0\n\n\n;\n";
        let snapshot = parse_manager_status(text).unwrap();
        assert_eq!(
            snapshot.unit.map(|u| u.raw_text),
            Some("STARTING".to_string())
        );
        assert_eq!(snapshot.managers.len(), 1);
    }

    #[test]
    fn test_blank_lines_before_terminator_are_looked_past() {
        let snapshot = parse_manager_status("2;1;0;0;1\n0 WAIT_MODE 0 0\n\n  \n;\n").unwrap();
        assert_eq!(snapshot.unit.map(|u| u.raw_text), Some("WAIT_MODE".to_string()));
    }

    #[test]
    fn test_unreadable_unit_line_is_skipped() {
        let snapshot = parse_manager_status("2;1;0;0;1\nWAIT_MODE\n;").unwrap();
        assert_eq!(snapshot.managers.len(), 1);
        assert!(snapshot.unit.is_none());
    }

    #[test]
    fn test_row_in_unit_position_is_skipped() {
        let snapshot = parse_manager_status("2;1;0;0;1\n0;-1;0;0;2\n;").unwrap();
        assert_eq!(snapshot.managers.len(), 1);
        assert_eq!(snapshot.managers[0].manager_number, 1);
        assert!(snapshot.unit.is_none());
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let text = "2;1;0\n2;1;0;0;x\n2;1;0;0;7\n0 WAIT_MODE 0 0\n;";
        let snapshot = parse_manager_status(text).unwrap();
        assert_eq!(snapshot.managers.len(), 1);
        assert_eq!(snapshot.managers[0].manager_number, 7);
    }

    #[test]
    fn test_missing_terminator_is_an_error() {
        assert_eq!(
            parse_manager_status("STATI:1\n2;1;0;0;1\n"),
            Err(ParseError::MissingTerminator)
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            parse_manager_status("").unwrap(),
            UnitStatusSnapshot::default()
        );
        assert_eq!(
            parse_manager_status("STATI:0\n;").unwrap(),
            UnitStatusSnapshot::default()
        );
    }
}
