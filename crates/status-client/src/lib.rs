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

//! Status client library for polling cloud service health feeds.
//!
//! This library provides a small, reusable stack for fetching JSON status
//! documents from REST endpoints and mapping them into a uniform display
//! model. It is split into two layers that can be used independently:
//!
//! - **Model layer**: serde types for the raw status document (EC2
//!   instances, ECS services, AmazonMQ brokers) and the mapping into
//!   [`ServiceStatus`] rows
//! - **Poller layer**: an async poll loop with a fixed interval, manual
//!   refresh trigger, URL hot-reload, per-request timeout, and graceful
//!   cancellation
//!
//! # Quick Start
//!
//! Spawn the poll loop and watch its results:
//!
//! ```no_run
//! use status_client::{poll_status_feed, PollResult};
//! use std::time::Duration;
//! use tokio::sync::watch;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (url_tx, url_rx) =
//!         watch::channel("https://example.com/prod/ecs-status".to_string());
//!     let (refresh_tx, refresh_rx) = watch::channel(0u64);
//!     let (result_tx, mut result_rx) = watch::channel(PollResult::default());
//!     let cancel_token = CancellationToken::new();
//!
//!     tokio::spawn(poll_status_feed(
//!         "example".to_string(),
//!         url_rx,
//!         refresh_rx,
//!         result_tx,
//!         Duration::from_secs(20 * 60),
//!         Duration::from_secs(30),
//!         cancel_token.clone(),
//!     ));
//!
//!     while result_rx.changed().await.is_ok() {
//!         let result = result_rx.borrow().clone();
//!         println!("{} services, error: {:?}", result.services.len(), result.error);
//!     }
//!
//!     drop((url_tx, refresh_tx, cancel_token));
//! }
//! ```
//!
//! # Model Layer Only
//!
//! The mapping can be used without any network at all:
//!
//! ```
//! use status_client::model::StatusDocument;
//!
//! let doc: StatusDocument = serde_json::from_str(
//!     r#"{"ECS":[{"serviceName":"payments","runningTasks":2,"stoppedTasks":0}]}"#,
//! ).unwrap();
//!
//! let services = doc.into_services();
//! assert!(services[0].operational);
//! ```

pub mod model;
pub mod poller;

pub use model::{ServiceKind, ServiceStatus, StatusDocument};
pub use poller::{poll_status_feed, PollError, PollResult};
