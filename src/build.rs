//! Build submission client and status tracker.
//!
//! A build advances through a fixed lifecycle: Pending -> Submitted ->
//! Building -> Succeeded or Failed, with Cancelled reachable from any
//! non-terminal state. Every transition is appended to an immutable
//! history; terminal states accept no further transitions.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::BuildError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Pending,
    Submitted,
    Building,
    Succeeded,
    Failed,
    Cancelled,
}

impl BuildState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    fn can_advance_to(&self, to: BuildState) -> bool {
        use BuildState::*;
        match (self, to) {
            (Pending, Submitted) => true,
            (Submitted, Building) => true,
            (Building, Succeeded) => true,
            (Pending | Submitted | Building, Failed) => true,
            (Pending | Submitted | Building, Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Building => "building",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One recorded state change. History entries are append-only.
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub from: BuildState,
    pub to: BuildState,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

/// Everything known about one build attempt.
#[derive(Debug)]
pub struct BuildRecord {
    pub build_id: Uuid,
    pub state: BuildState,
    pub history: Vec<Transition>,
    pub artifact_url: Option<String>,
}

impl BuildRecord {
    pub fn new() -> Self {
        Self {
            build_id: Uuid::new_v4(),
            state: BuildState::Pending,
            history: Vec::new(),
            artifact_url: None,
        }
    }

    /// Apply one transition, or refuse it. Terminal states are frozen;
    /// skipping states is not allowed either.
    pub fn transition(&mut self, to: BuildState, note: Option<String>) -> Result<(), BuildError> {
        if self.state.is_terminal() {
            return Err(BuildError::TerminalState { from: self.state });
        }
        if !self.state.can_advance_to(to) {
            return Err(BuildError::Transport {
                detail: format!("illegal transition {} -> {}", self.state, to),
            });
        }
        self.history.push(Transition {
            from: self.state,
            to,
            at: Utc::now(),
            note,
        });
        self.state = to;
        Ok(())
    }
}

impl Default for BuildRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// What goes to the build server: identity plus the zipped project tree.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub package_id: String,
    pub app_name: String,
    pub version: String,
    pub archive: Vec<u8>,
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    build_id: Uuid,
    package_id: &'a str,
    app_name: &'a str,
    version: &'a str,
    source_archive: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub artifact_url: Option<String>,
}

/// Transport seam between the tracker and the build server.
pub trait BuildSubmitter {
    fn submit(&self, build_id: Uuid, req: &BuildRequest) -> Result<(), BuildError>;
    fn status(&self, build_id: Uuid) -> Result<StatusResponse, BuildError>;
    fn cancel(&self, build_id: Uuid) -> Result<(), BuildError>;
}

/// HTTP client against a remote build server.
pub struct HttpBuildClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBuildClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, BuildError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BuildError::Transport { detail: e.to_string() })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn with_auth(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

impl BuildSubmitter for HttpBuildClient {
    fn submit(&self, build_id: Uuid, req: &BuildRequest) -> Result<(), BuildError> {
        let body = SubmitBody {
            build_id,
            package_id: &req.package_id,
            app_name: &req.app_name,
            version: &req.version,
            source_archive: base64::engine::general_purpose::STANDARD.encode(&req.archive),
        };
        let url = format!("{}/api/builds", self.base_url);
        let response = self
            .with_auth(self.http.post(&url))
            .json(&body)
            .send()
            .map_err(|e| BuildError::Transport { detail: e.to_string() })?;

        if !response.status().is_success() {
            return Err(BuildError::Transport {
                detail: format!("build server returned {}", response.status()),
            });
        }
        Ok(())
    }

    fn status(&self, build_id: Uuid) -> Result<StatusResponse, BuildError> {
        let url = format!("{}/api/builds/{}/status", self.base_url, build_id);
        let response = self
            .with_auth(self.http.get(&url))
            .send()
            .map_err(|e| BuildError::Transport { detail: e.to_string() })?;

        if !response.status().is_success() {
            return Err(BuildError::Transport {
                detail: format!("status endpoint returned {}", response.status()),
            });
        }
        response
            .json()
            .map_err(|e| BuildError::Transport { detail: e.to_string() })
    }

    fn cancel(&self, build_id: Uuid) -> Result<(), BuildError> {
        let url = format!("{}/api/builds/{}/cancel", self.base_url, build_id);
        let response = self
            .with_auth(self.http.post(&url))
            .send()
            .map_err(|e| BuildError::Transport { detail: e.to_string() })?;

        if !response.status().is_success() {
            return Err(BuildError::Transport {
                detail: format!("cancel endpoint returned {}", response.status()),
            });
        }
        Ok(())
    }
}

/// Bounded exponential backoff for submission retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // attempt 1 waits base, attempt 2 waits 2x base, then 4x...
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Drives one build through its lifecycle against a submitter.
///
/// The record sits behind a mutex so transitions serialize even when the
/// tracker is shared; state can never interleave mid-transition.
pub struct BuildTracker<C: BuildSubmitter> {
    client: C,
    policy: RetryPolicy,
    record: Mutex<BuildRecord>,
}

impl<C: BuildSubmitter> BuildTracker<C> {
    pub fn new(client: C, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            record: Mutex::new(BuildRecord::new()),
        }
    }

    pub fn build_id(&self) -> Uuid {
        self.record.lock().expect("record lock").build_id
    }

    pub fn state(&self) -> BuildState {
        self.record.lock().expect("record lock").state
    }

    pub fn artifact_url(&self) -> Option<String> {
        self.record.lock().expect("record lock").artifact_url.clone()
    }

    pub fn history(&self) -> Vec<Transition> {
        self.record.lock().expect("record lock").history.clone()
    }

    /// Submit the build, retrying transport failures with backoff.
    ///
    /// Idempotent: once the build is past Pending the same build_id is in
    /// flight and resubmission is a no-op returning the current state.
    pub fn submit(&self, req: &BuildRequest) -> Result<BuildState, BuildError> {
        let mut record = self.record.lock().expect("record lock");
        if record.state != BuildState::Pending {
            debug!(build_id = %record.build_id, state = %record.state, "already submitted");
            return Ok(record.state);
        }

        let mut last_err: Option<BuildError> = None;
        for attempt in 1..=self.policy.max_attempts {
            match self.client.submit(record.build_id, req) {
                Ok(()) => {
                    info!(build_id = %record.build_id, attempt, "build submitted");
                    record.transition(BuildState::Submitted, None)?;
                    return Ok(record.state);
                }
                Err(BuildError::Transport { detail }) => {
                    warn!(build_id = %record.build_id, attempt, %detail, "submission failed");
                    last_err = Some(BuildError::Transport { detail });
                    if attempt < self.policy.max_attempts {
                        std::thread::sleep(self.policy.delay_for(attempt));
                    }
                }
                Err(other) => return Err(other),
            }
        }

        let detail = match &last_err {
            Some(e) => e.to_string(),
            None => "submission failed".to_string(),
        };
        record.transition(BuildState::Failed, Some(detail.clone()))?;
        Err(BuildError::Transport { detail })
    }

    /// Ask the server for the current status and fold the answer into the
    /// record. Transport failures retry under the same policy as
    /// submission; exhausting them fails the build with the last detail
    /// recorded in the history. Returns the state after the poll.
    pub fn poll_once(&self) -> Result<BuildState, BuildError> {
        let mut record = self.record.lock().expect("record lock");
        if record.state.is_terminal() {
            return Ok(record.state);
        }

        let status = self.fetch_status(&mut record)?;
        match status.status.as_str() {
            "pending" | "queued" | "submitted" => {}
            "building" => {
                if record.state == BuildState::Submitted {
                    record.transition(BuildState::Building, None)?;
                }
            }
            "succeeded" | "success" => {
                if record.state == BuildState::Submitted {
                    record.transition(BuildState::Building, None)?;
                }
                record.transition(BuildState::Succeeded, None)?;
                record.artifact_url = status.artifact_url;
                info!(build_id = %record.build_id, "build succeeded");
            }
            "failed" => {
                let detail = status.detail.unwrap_or_else(|| "no detail".to_string());
                if record.state == BuildState::Submitted {
                    record.transition(BuildState::Building, None)?;
                }
                record.transition(BuildState::Failed, Some(detail.clone()))?;
                warn!(build_id = %record.build_id, %detail, "build failed");
            }
            other => {
                return Err(BuildError::RemoteBuild {
                    detail: format!("unknown status '{other}'"),
                })
            }
        }
        Ok(record.state)
    }

    fn fetch_status(&self, record: &mut BuildRecord) -> Result<StatusResponse, BuildError> {
        let mut last = String::new();
        for attempt in 1..=self.policy.max_attempts {
            match self.client.status(record.build_id) {
                Ok(status) => return Ok(status),
                Err(BuildError::Transport { detail }) => {
                    warn!(build_id = %record.build_id, attempt, %detail, "status poll failed");
                    last = detail;
                    if attempt < self.policy.max_attempts {
                        std::thread::sleep(self.policy.delay_for(attempt));
                    }
                }
                Err(other) => return Err(other),
            }
        }
        record.transition(BuildState::Failed, Some(last.clone()))?;
        Err(BuildError::Transport { detail: last })
    }

    /// Poll until the build reaches a terminal state, giving up after
    /// `max_polls` rounds so a server stuck on "pending" cannot hold the
    /// caller forever.
    pub fn track(&self, poll_interval: Duration, max_polls: u32) -> Result<BuildState, BuildError> {
        for _ in 0..max_polls {
            let state = self.poll_once()?;
            if state.is_terminal() {
                return Ok(state);
            }
            std::thread::sleep(poll_interval);
        }

        let detail = format!("no terminal state after {max_polls} status polls");
        let mut record = self.record.lock().expect("record lock");
        if !record.state.is_terminal() {
            record.transition(BuildState::Failed, Some(detail.clone()))?;
        }
        Err(BuildError::RemoteBuild { detail })
    }

    /// Best-effort cancel: tell the server, then mark the record. Fails if
    /// the build already reached a terminal state.
    pub fn cancel(&self) -> Result<(), BuildError> {
        let mut record = self.record.lock().expect("record lock");
        if record.state.is_terminal() {
            return Err(BuildError::TerminalState { from: record.state });
        }
        if let Err(e) = self.client.cancel(record.build_id) {
            warn!(build_id = %record.build_id, error = %e, "remote cancel failed");
        }
        record.transition(BuildState::Cancelled, None)
    }
}
