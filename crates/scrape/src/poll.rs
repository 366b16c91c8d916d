use reviewlens_core::{Error, Result};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Lifecycle states reported by the scrape-job provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ready,
    Queued,
    Running,
    Succeeded,
    Failed,
    Aborted,
    TimedOut,
    Unknown,
}

impl RunStatus {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "READY" => Self::Ready,
            "QUEUED" => Self::Queued,
            "RUNNING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "ABORTED" | "ABORTING" => Self::Aborted,
            "TIMED-OUT" | "TIMING-OUT" => Self::TimedOut,
            _ => Self::Unknown,
        }
    }

    /// Still worth another status check.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Ready | Self::Queued | Self::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ready => "READY",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Aborted => "ABORTED",
            Self::TimedOut => "TIMED-OUT",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Drive a pending job to a terminal state with fixed-interval polling
/// and a hard attempt cap. The cap is the only cancellation mechanism:
/// exhausting it while the job is still pending is reported as a
/// timeout, distinct from the job itself ending in a non-success state.
pub async fn poll_until_terminal<F, Fut>(mut fetch_status: F, policy: &PollPolicy) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RunStatus>>,
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;
        let status = fetch_status().await?;
        debug!(attempt, %status, "Scrape job status");
        if status.is_pending() {
            continue;
        }
        if status == RunStatus::Succeeded {
            return Ok(());
        }
        return Err(Error::Scrape(format!("Job ended with status {}", status)));
    }
    Err(Error::Timeout(format!(
        "Job still pending after {} status checks",
        policy.max_attempts
    )))
}
