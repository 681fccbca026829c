//! Readiness polling of the preview server

use crate::supervisor::process::ExitWatch;
use crate::ExportError;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Upper bound for a single readiness probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the client used for readiness probes
///
/// Redirects are not followed: a redirect at the root already proves the
/// server is answering.
pub fn build_probe_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .redirect(Policy::none())
        .timeout(PROBE_TIMEOUT)
        .build()
}

/// Returns true if a probe response means the server is ready
pub fn is_ready_status(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND
}

/// Polls `origin` until it answers or the deadline passes
///
/// # Behavior
///
/// - A 2xx, 301 or 302 response ends the wait successfully
/// - Connection errors and other statuses are retried every `poll_interval`
/// - If `exit` reports that the server process ended, fails immediately with
///   [`ExportError::ProcessExitedEarly`]; this is checked on every iteration
///   and while sleeping between probes
/// - Once `startup_timeout` has elapsed, fails with
///   [`ExportError::StartupTimeout`]
///
/// Pass `None` for `exit` when the origin is not a child of this process.
pub async fn wait_until_ready(
    client: &Client,
    origin: &Url,
    startup_timeout: Duration,
    poll_interval: Duration,
    mut exit: Option<ExitWatch>,
) -> Result<(), ExportError> {
    let started = Instant::now();
    let deadline = started + startup_timeout;
    let timeout_error = || ExportError::StartupTimeout {
        timeout_ms: startup_timeout.as_millis() as u64,
    };
    let mut attempts: u32 = 0;

    loop {
        if let Some(status) = exit.as_ref().and_then(ExitWatch::exited) {
            return Err(ExportError::ProcessExitedEarly {
                status: status.to_string(),
            });
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(timeout_error());
        }

        attempts += 1;
        let probe = client.get(origin.as_str()).send();
        match tokio::time::timeout(remaining.min(PROBE_TIMEOUT), probe).await {
            Ok(Ok(response)) if is_ready_status(response.status()) => {
                tracing::info!(
                    "Preview server ready after {:?} ({} probes, HTTP {})",
                    started.elapsed(),
                    attempts,
                    response.status().as_u16()
                );
                return Ok(());
            }
            Ok(Ok(response)) => {
                tracing::trace!("Readiness probe got HTTP {}", response.status().as_u16());
            }
            Ok(Err(e)) => {
                tracing::trace!("Readiness probe failed: {}", e);
            }
            Err(_) => {
                tracing::trace!("Readiness probe timed out");
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(timeout_error());
        }
        let pause = poll_interval.min(remaining);

        match exit.as_mut() {
            Some(exit) => {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    status = exit.wait() => {
                        return Err(ExportError::ProcessExitedEarly {
                            status: status.to_string(),
                        });
                    }
                }
            }
            None => tokio::time::sleep(pause).await,
        }
    }
}
