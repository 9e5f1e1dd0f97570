// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const LIST_FIXTURE: &str = include_str!("../fixtures/list.txt");
pub const STATI_FIXTURE: &str = include_str!("../fixtures/stati.txt");

/// A scripted stand-in for the supervisor executable.
///
/// Each instance owns a temp directory holding a `WCCILpmon` symlink to
/// `fixtures/fake_pmon.sh`, the canned responses and `calls.log`, where the
/// script appends one tab-separated line per invocation.
pub struct FakePmon {
    dir: TempDir,
    executable: PathBuf,
}

impl FakePmon {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let script = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fake_pmon.sh");
        let executable = dir.path().join("WCCILpmon");
        std::os::unix::fs::symlink(&script, &executable)
            .unwrap_or_else(|e| panic!("failed to link {}: {e}", script.display()));

        let fake = Self { dir, executable };
        fake.write("list.txt", LIST_FIXTURE);
        fake.write("stati.txt", STATI_FIXTURE);
        fake
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Exit code for every command except `-status`.
    pub fn set_exit_code(&self, code: i32) {
        self.write("exit_code", &code.to_string());
    }

    /// Exit code for `-status` queries. Defaults to 3 (registered, not running).
    pub fn set_status_code(&self, code: i32) {
        self.write("status_code", &code.to_string());
    }

    pub fn set_list(&self, text: &str) {
        self.write("list.txt", text);
    }

    pub fn set_stati(&self, text: &str) {
        self.write("stati.txt", text);
    }

    pub fn set_stderr(&self, text: &str) {
        self.write("stderr.txt", text);
    }

    /// Make every command except `-status` sleep before exiting.
    pub fn set_sleep(&self, secs: u32) {
        self.write("sleep", &secs.to_string());
    }

    /// Argument vectors of all completed invocations, oldest first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        let log = match std::fs::read_to_string(self.dir.path().join("calls.log")) {
            Ok(log) => log,
            Err(_) => return Vec::new(),
        };
        log.lines()
            .map(|line| {
                let line = line.strip_suffix('\t').unwrap_or(line);
                if line.is_empty() {
                    Vec::new()
                } else {
                    line.split('\t').map(String::from).collect()
                }
            })
            .collect()
    }

    /// Wait until at least `n` invocations have been logged, or timeout.
    pub fn wait_for_calls(&self, n: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.calls().len() >= n {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    fn write(&self, name: &str, contents: &str) {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents)
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    }
}

/// Turn string literals into an owned argument vector.
pub fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
