// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Waiting for the supervisor to reach a state.
//!
//! Registration and `start_unit_only` return before the supervisor is ready
//! to accept commands; these helpers poll [`PmonClient::query_run_state`]
//! until it reports what the caller expects.

use crate::client::PmonClient;
use crate::state::RunState;
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;

pub const REGISTRATION_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const REGISTRATION_POLL_ATTEMPTS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: REGISTRATION_POLL_INTERVAL,
            attempts: REGISTRATION_POLL_ATTEMPTS,
        }
    }
}

/// Run `probe` up to `settings.attempts` times, sleeping `settings.interval`
/// between tries. Returns true as soon as one probe succeeds.
pub async fn wait_until<F, Fut>(settings: PollSettings, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=settings.attempts {
        if probe().await {
            debug!("condition met after {attempt} attempt(s)");
            return true;
        }
        if attempt < settings.attempts {
            tokio::time::sleep(settings.interval).await;
        }
    }
    false
}

/// Poll until the run state of `unit` equals `expected`.
pub async fn wait_for_run_state(
    client: &PmonClient,
    unit: &str,
    expected: RunState,
    settings: PollSettings,
) -> bool {
    let reached = wait_until(settings, || async {
        client.query_run_state(unit).await == expected
    })
    .await;
    if reached {
        info!("[{unit}] reached run state {expected}");
    } else {
        warn!(
            "[{unit}] not {expected} after {} attempt(s)",
            settings.attempts
        );
    }
    reached
}

/// Poll until the supervisor knows `unit`, running or not.
pub async fn wait_for_registration(
    client: &PmonClient,
    unit: &str,
    settings: PollSettings,
) -> bool {
    let registered = wait_until(settings, || async {
        client.query_run_state(unit).await != RunState::Unknown
    })
    .await;
    if !registered {
        warn!(
            "[{unit}] still unknown to the supervisor after {} attempt(s)",
            settings.attempts
        );
    }
    registered
}
