// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Async poll loop for status feeds.
//!
//! Fetches a status document from a URL on a fixed interval and publishes
//! the mapped result through a watch channel. Polls are strictly
//! sequential: at most one request is in flight per poller, so a slow
//! response can never race a later timer tick. Supports manual refresh,
//! URL hot-reload, per-request timeouts, and graceful cancellation.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::model::{ServiceStatus, StatusDocument};

/// Errors surfaced by a single poll attempt.
#[derive(Debug, Error)]
pub enum PollError {
    /// Network-level failure (DNS, connect, timeout, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    /// The body was not a valid status document.
    #[error("malformed status document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Latest known state of one polled endpoint.
///
/// A new value replaces the previous one in the watch channel on every
/// completed poll. On failure the services and fetch timestamp of the last
/// successful poll are retained and only the error string changes.
#[derive(Debug, Clone, Default)]
pub struct PollResult {
    /// Mapped display rows from the last successful fetch.
    pub services: Vec<ServiceStatus>,

    /// When the last successful fetch completed.
    pub fetched_at: Option<DateTime<Utc>>,

    /// Error from the most recent attempt, if it failed.
    pub error: Option<String>,

    /// Wall time of the most recent attempt in milliseconds.
    pub last_poll_ms: Option<f64>,

    /// Total completed attempts, successful or not.
    pub polls: u64,
}

impl PollResult {
    /// True until the first poll attempt has completed.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.polls == 0
    }

    /// Number of rows currently reported operational.
    #[must_use]
    pub fn operational_count(&self) -> usize {
        self.services.iter().filter(|s| s.operational).count()
    }

    /// Next state after a successful fetch.
    #[must_use]
    pub fn succeeded(
        &self,
        services: Vec<ServiceStatus>,
        fetched_at: DateTime<Utc>,
        elapsed_ms: f64,
    ) -> Self {
        Self {
            services,
            fetched_at: Some(fetched_at),
            error: None,
            last_poll_ms: Some(elapsed_ms),
            polls: self.polls + 1,
        }
    }

    /// Next state after a failed fetch. Previous data stays on screen.
    #[must_use]
    pub fn failed(&self, error: String, elapsed_ms: f64) -> Self {
        Self {
            services: self.services.clone(),
            fetched_at: self.fetched_at,
            error: Some(error),
            last_poll_ms: Some(elapsed_ms),
            polls: self.polls + 1,
        }
    }
}

/// Run the poll loop for one endpoint until cancelled.
///
/// The first poll fires immediately, then on `interval`. A bump on
/// `refresh_rx` or a new URL on `url_rx` triggers an immediate poll
/// out of cadence.
pub async fn poll_status_feed(
    endpoint_name: String,
    mut url_rx: watch::Receiver<String>,
    mut refresh_rx: watch::Receiver<u64>,
    result_tx: watch::Sender<PollResult>,
    interval: Duration,
    request_timeout: Duration,
    cancel_token: CancellationToken,
) {
    let client = match reqwest::Client::builder().timeout(request_timeout).build() {
        Ok(client) => client,
        Err(e) => {
            error!("[{}] Failed to build HTTP client: {}", endpoint_name, e);
            return;
        }
    };

    info!(
        "[{}] Polling {} every {}s",
        endpoint_name,
        url_rx.borrow().clone(),
        interval.as_secs()
    );

    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // Scheduled poll (fires immediately on the first iteration)
            _ = tick.tick() => {
                poll_once(&endpoint_name, &client, &mut url_rx, &result_tx).await;
            }

            // Manual refresh requested from the UI
            changed = refresh_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                info!("[{}] Manual refresh requested", endpoint_name);
                poll_once(&endpoint_name, &client, &mut url_rx, &result_tx).await;
            }

            // React immediately to endpoint URL changes
            changed = url_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                info!(
                    "[{}] Endpoint URL changed to {}, polling immediately",
                    endpoint_name,
                    url_rx.borrow().clone()
                );
                poll_once(&endpoint_name, &client, &mut url_rx, &result_tx).await;
            }

            _ = cancel_token.cancelled() => {
                info!("[{}] Poller cancelled", endpoint_name);
                return;
            }
        }
    }
}

async fn poll_once(
    endpoint_name: &str,
    client: &reqwest::Client,
    url_rx: &mut watch::Receiver<String>,
    result_tx: &watch::Sender<PollResult>,
) {
    let url = url_rx.borrow_and_update().clone();
    let started = Instant::now();

    let outcome = fetch_document(client, &url).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    let next = match outcome {
        Ok(document) => {
            let services = document.into_services();
            info!(
                "[{}] Fetched {} services in {:.0}ms",
                endpoint_name,
                services.len(),
                elapsed_ms
            );
            result_tx.borrow().succeeded(services, Utc::now(), elapsed_ms)
        }
        Err(e) => {
            let previous = result_tx.borrow();
            if previous.fetched_at.is_some() {
                warn!(
                    "[{}] Poll failed, keeping data from last good fetch: {}",
                    endpoint_name, e
                );
            } else {
                error!("[{}] Poll failed: {}", endpoint_name, e);
            }
            previous.failed(e.to_string(), elapsed_ms)
        }
    };

    let _ = result_tx.send(next);
}

async fn fetch_document(
    client: &reqwest::Client,
    url: &str,
) -> Result<StatusDocument, PollError> {
    let response = client
        .get(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(PollError::Status(status));
    }

    // Decode from text so that body and decode failures are distinguishable
    let body = response.text().await?;
    let document = serde_json::from_str(&body)?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ServiceKind, ServiceStatus};

    fn service(name: &str, operational: bool) -> ServiceStatus {
        ServiceStatus {
            name: name.to_string(),
            kind: ServiceKind::Ecs,
            operational,
            uptime: "5 days".to_string(),
            downtime: "N/A".to_string(),
            running_count: u32::from(operational),
            stopped_count: u32::from(!operational),
            public_ip: None,
            docker_images: Vec::new(),
            running_details: Vec::new(),
            stopped_details: Vec::new(),
        }
    }

    #[test]
    fn test_initial_result_is_loading() {
        let result = PollResult::default();
        assert!(result.is_loading());
        assert!(result.services.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_success_replaces_data_and_clears_error() {
        let fetched_at = Utc::now();
        let start = PollResult::default().failed("boom".to_string(), 10.0);
        let result = start.succeeded(vec![service("api", true)], fetched_at, 42.0);

        assert!(!result.is_loading());
        assert_eq!(result.services.len(), 1);
        assert_eq!(result.fetched_at, Some(fetched_at));
        assert!(result.error.is_none());
        assert_eq!(result.polls, 2);
    }

    #[test]
    fn test_failure_retains_previous_data() {
        let fetched_at = Utc::now();
        let good = PollResult::default().succeeded(
            vec![service("api", true), service("worker", false)],
            fetched_at,
            30.0,
        );

        let after = good.failed("request failed: timeout".to_string(), 5000.0);

        // Previously rendered data is unchanged except for the error marker
        assert_eq!(after.services.len(), 2);
        assert_eq!(after.services[0].name, "api");
        assert_eq!(after.fetched_at, Some(fetched_at));
        assert_eq!(after.error.as_deref(), Some("request failed: timeout"));
        assert_eq!(after.polls, 2);
    }

    #[tokio::test]
    async fn test_poll_loop_publishes_error_and_stops_on_cancel() {
        // Unreachable local address: connection is refused immediately
        let (_url_tx, url_rx) = watch::channel("http://127.0.0.1:9/status".to_string());
        let (_refresh_tx, refresh_rx) = watch::channel(0u64);
        let (result_tx, mut result_rx) = watch::channel(PollResult::default());
        let cancel_token = CancellationToken::new();

        let handle = tokio::spawn(poll_status_feed(
            "test".to_string(),
            url_rx,
            refresh_rx,
            result_tx,
            Duration::from_secs(3600),
            Duration::from_secs(5),
            cancel_token.clone(),
        ));

        tokio::time::timeout(Duration::from_secs(10), result_rx.changed())
            .await
            .expect("first poll should complete")
            .expect("poller should still be running");

        {
            let result = result_rx.borrow();
            assert_eq!(result.polls, 1);
            assert!(result.error.is_some());
            assert!(result.services.is_empty());
            assert!(result.fetched_at.is_none());
        }

        cancel_token.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller should exit after cancellation")
            .expect("poller task should not panic");
    }

    #[test]
    fn test_operational_count() {
        let result = PollResult::default().succeeded(
            vec![
                service("a", true),
                service("b", false),
                service("c", true),
            ],
            Utc::now(),
            1.0,
        );
        assert_eq!(result.operational_count(), 2);
    }
}
