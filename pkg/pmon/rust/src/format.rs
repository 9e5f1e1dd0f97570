// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Plain-text rendering of query results for the command-line tool.

use crate::state::{ManagerOptions, ManagerStatus, UnitStatusSnapshot};
use std::fmt::Write;
use time::PrimitiveDateTime;
use time::macros::format_description;

/// Same layout the supervisor prints, `YYYY.MM.DD HH:MM:SS.mmm`; `-` when never started.
pub fn format_start_time(start_time: Option<PrimitiveDateTime>) -> String {
    let Some(start_time) = start_time else {
        return "-".to_string();
    };
    start_time
        .format(format_description!(
            "[year].[month].[day] [hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .unwrap_or_else(|_| start_time.to_string())
}

pub fn render_manager_list(managers: &[ManagerOptions]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<20} {:<7} {:>6} {:>8} {:>6}  OPTIONS",
        "IDX", "COMPONENT", "MODE", "KILL", "RESTARTS", "RESET"
    );
    for (idx, manager) in managers.iter().enumerate() {
        let _ = writeln!(
            out,
            "{idx:>3}  {:<20} {:<7} {:>6} {:>8} {:>6}  {}",
            manager.component,
            manager.start_mode.as_label(),
            manager.seconds_to_kill,
            manager.restart_count,
            manager.reset_start_counter,
            manager.start_options
        );
    }
    out
}

fn render_status_row(out: &mut String, idx: usize, status: &ManagerStatus) {
    let pid = status
        .pid
        .map(|pid| pid.to_string())
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(
        out,
        "{idx:>3}  {:<10} {:>8} {:<7} {:<23} {:>4}",
        status.state.to_string(),
        pid,
        status.start_mode.as_label(),
        format_start_time(status.start_time),
        status.manager_number
    );
}

pub fn render_unit_status(snapshot: &UnitStatusSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<10} {:>8} {:<7} {:<23} {:>4}",
        "IDX", "STATE", "PID", "MODE", "STARTED", "NUM"
    );
    for (idx, status) in snapshot.managers.iter().enumerate() {
        render_status_row(&mut out, idx, status);
    }
    match snapshot.unit {
        Some(ref unit) => {
            let _ = writeln!(
                out,
                "unit: {} ({} {}) emergency={} demo={}",
                unit.state, unit.raw_code, unit.raw_text, unit.emergency, unit.demo
            );
        }
        None => out.push_str("unit: unknown\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ManagerRunningState, ManagerStartMode, UnitState, UnitStatus};
    use time::macros::datetime;

    #[test]
    fn test_format_start_time() {
        assert_eq!(
            format_start_time(Some(datetime!(2025-10-15 13:54:33.236))),
            "2025.10.15 13:54:33.236"
        );
        assert_eq!(
            format_start_time(Some(datetime!(2025-01-02 03:04:05))),
            "2025.01.02 03:04:05.000"
        );
        assert_eq!(format_start_time(None), "-");
    }

    #[test]
    fn test_render_manager_list() {
        let managers = vec![
            ManagerOptions {
                component: "WCCILpmon".to_string(),
                start_mode: ManagerStartMode::Manual,
                seconds_to_kill: 30,
                reset_start_counter: 1,
                restart_count: 3,
                start_options: String::new(),
            },
            ManagerOptions {
                component: "WCCOAui".to_string(),
                start_mode: ManagerStartMode::Once,
                seconds_to_kill: -30,
                reset_start_counter: 1,
                restart_count: 3,
                start_options: "-m gedi".to_string(),
            },
        ];
        let rendered = render_manager_list(&managers);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("IDX"));
        assert!(lines[1].starts_with("  0  WCCILpmon"));
        assert!(lines[2].contains("once"));
        assert!(lines[2].contains("-30"));
        assert!(lines[2].ends_with("-m gedi"));
    }

    #[test]
    fn test_render_unit_status() {
        let snapshot = UnitStatusSnapshot {
            managers: vec![
                ManagerStatus {
                    state: ManagerRunningState::Running,
                    pid: Some(4711),
                    start_mode: ManagerStartMode::Always,
                    start_time: Some(datetime!(2025-10-15 13:54:33.236)),
                    manager_number: 1,
                },
                ManagerStatus {
                    state: ManagerRunningState::NotRunning,
                    pid: None,
                    start_mode: ManagerStartMode::Manual,
                    start_time: None,
                    manager_number: 2,
                },
            ],
            unit: Some(UnitStatus {
                state: UnitState::Monitoring,
                raw_code: 2,
                raw_text: "MONITOR_MODE".to_string(),
                emergency: false,
                demo: true,
            }),
        };
        let rendered = render_unit_status(&snapshot);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("Running"));
        assert!(lines[1].contains("4711"));
        assert!(lines[1].contains("2025.10.15 13:54:33.236"));
        assert!(lines[2].contains("NotRunning"));
        assert_eq!(
            lines[3],
            "unit: Started (2 MONITOR_MODE) emergency=false demo=true"
        );
    }

    #[test]
    fn test_render_unit_status_without_unit_line() {
        let rendered = render_unit_status(&UnitStatusSnapshot::default());
        assert!(rendered.ends_with("unit: unknown\n"));
    }
}
