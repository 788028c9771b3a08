use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::Context as _;
use async_trait::async_trait;

use crate::config::ConsoleConfig;

/// Hard cap on one probe round-trip. A slow network transitions to
/// `Offline` instead of parking the monitor in `Checking`.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(1200);

const MAX_REASON_CHARS: usize = 240;

/// Observed health of the supervisor endpoint, gating self-upgrade actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SupervisorHealth {
    Idle,
    Checking {
        last_ok_at: Option<String>,
        last_error_at: Option<String>,
        last_error: Option<String>,
    },
    Ok {
        ok_at: String,
    },
    Offline {
        error_at: String,
        error: String,
        last_ok_at: Option<String>,
    },
}

impl SupervisorHealth {
    fn last_ok_at(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Checking { last_ok_at, .. } => last_ok_at.clone(),
            Self::Ok { ok_at } => Some(ok_at.clone()),
            Self::Offline { last_ok_at, .. } => last_ok_at.clone(),
        }
    }

    fn last_error_parts(&self) -> (Option<String>, Option<String>) {
        match self {
            Self::Checking {
                last_error_at,
                last_error,
                ..
            } => (last_error_at.clone(), last_error.clone()),
            Self::Offline {
                error_at, error, ..
            } => (Some(error_at.clone()), Some(error.clone())),
            _ => (None, None),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

/// One GET against the supervisor's authenticated status endpoint. The seam
/// exists so the monitor's state machine is testable without a network.
#[async_trait]
pub trait SupervisorProbe: Send + Sync {
    async fn probe(&self) -> anyhow::Result<ProbeResponse>;
}

pub struct HttpSupervisorProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpSupervisorProbe {
    pub fn new(config: &ConsoleConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            url: format!("{}self-upgrade", config.self_upgrade_url),
        })
    }
}

#[async_trait]
impl SupervisorProbe for HttpSupervisorProbe {
    async fn probe(&self) -> anyhow::Result<ProbeResponse> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(ProbeResponse { status, body })
    }
}

/// Asynchronous health-probe state machine:
/// `idle → checking → ok | offline`, with `check()` re-entrant from any
/// state. History (`last_ok_at`, prior error) is carried through `checking`
/// so a retry does not forget what it knew. Overlapping `check()` calls are
/// permitted; the last one to settle determines the visible state.
pub struct SupervisorMonitor {
    probe: Arc<dyn SupervisorProbe>,
    state: Mutex<SupervisorHealth>,
}

impl SupervisorMonitor {
    pub fn new(probe: Arc<dyn SupervisorProbe>) -> Self {
        Self {
            probe,
            state: Mutex::new(SupervisorHealth::Idle),
        }
    }

    pub fn health(&self) -> SupervisorHealth {
        self.lock().clone()
    }

    /// Run one probe. Consumers call this once on mount and again on manual
    /// retry. Never errors past its own boundary: every failure mode settles
    /// in `Offline` with a human-readable reason.
    pub async fn check(&self) {
        {
            let mut st = self.lock();
            let last_ok_at = st.last_ok_at();
            let (last_error_at, last_error) = st.last_error_parts();
            *st = SupervisorHealth::Checking {
                last_ok_at,
                last_error_at,
                last_error,
            };
        }

        let outcome = tokio::time::timeout(PROBE_TIMEOUT, self.probe.probe()).await;
        let settled: Result<(), String> = match outcome {
            Err(_) => Err(format!(
                "supervisor probe timed out after {}ms",
                PROBE_TIMEOUT.as_millis()
            )),
            Ok(Err(e)) => Err(e.to_string()),
            Ok(Ok(resp)) if (200..300).contains(&resp.status) => Ok(()),
            Ok(Ok(resp)) if resp.status == 401 => Err("needs authentication".to_string()),
            Ok(Ok(resp)) => Err(failure_reason(resp.status, &resp.body)),
        };

        let now = now_rfc3339();
        let mut st = self.lock();
        match settled {
            Ok(()) => {
                *st = SupervisorHealth::Ok { ok_at: now };
            }
            Err(reason) => {
                tracing::warn!(error = %reason, "supervisor probe failed");
                let last_ok_at = st.last_ok_at();
                *st = SupervisorHealth::Offline {
                    error_at: now,
                    error: reason,
                    last_ok_at,
                };
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SupervisorHealth> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Best-effort short diagnostic from an error response body: a JSON
/// `message` (top-level or under `error`) wins, then truncated body text,
/// then the bare status code.
fn failure_reason(status: u16, body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        let msg = v
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
            })
            .map(str::trim)
            .filter(|m| !m.is_empty());
        if let Some(m) = msg {
            return truncate_reason(m);
        }
    }

    let text = body.trim();
    if !text.is_empty() {
        return truncate_reason(text);
    }
    format!("HTTP {status}")
}

fn truncate_reason(input: &str) -> String {
    if input.chars().count() <= MAX_REASON_CHARS {
        input.to_string()
    } else {
        input.chars().take(MAX_REASON_CHARS).collect()
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| {
            time::OffsetDateTime::now_utc()
                .unix_timestamp()
                .to_string()
        })
}
