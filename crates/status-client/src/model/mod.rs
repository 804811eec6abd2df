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

//! Raw status document types and the display model mapping.
//!
//! The status feeds return a JSON document shaped as
//! `{ "EC2": [...], "ECS": [...], "AmazonMQ": [...] }`. Every section is
//! optional; a missing section maps to an empty list rather than a parse
//! error, so a feed that only reports ECS services still decodes cleanly.
//!
//! [`StatusDocument::into_services`] flattens the heterogeneous sections
//! into uniform [`ServiceStatus`] rows for display.

use serde::Deserialize;

/// Placeholder shown when a feed does not report a field.
pub const UNKNOWN_FIELD: &str = "N/A";

/// Top-level status document returned by a status endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusDocument {
    #[serde(rename = "EC2", default)]
    pub ec2: Vec<Ec2Instance>,

    #[serde(rename = "ECS", default)]
    pub ecs: Vec<EcsService>,

    #[serde(rename = "AmazonMQ", default)]
    pub amazon_mq: Vec<MqBroker>,
}

/// A running EC2 instance as reported by the feed.
///
/// The feed only enumerates running instances, so presence in the document
/// implies the instance is operational.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ec2Instance {
    pub instance_id: String,

    #[serde(default)]
    pub instance_name: Option<String>,

    #[serde(default)]
    pub public_ip: Option<String>,

    #[serde(default)]
    pub docker_images: DockerImageReport,
}

/// Nested docker image listing for an EC2 instance.
///
/// The feed wraps the list one level deep (`dockerImages.dockerImages`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerImageReport {
    #[serde(default)]
    pub docker_images: Vec<String>,
}

/// An ECS service with running/stopped task counts and per-task detail.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcsService {
    pub service_name: String,

    #[serde(default)]
    pub running_tasks: u32,

    #[serde(default)]
    pub stopped_tasks: u32,

    #[serde(default)]
    pub running_details: Vec<RunningTask>,

    #[serde(default)]
    pub stopped_details: Vec<StoppedTask>,
}

/// Detail for a single running ECS task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningTask {
    #[serde(default)]
    pub task_arn: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub uptime: Option<String>,
}

/// Detail for a single stopped ECS task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoppedTask {
    #[serde(default)]
    pub task_arn: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub downtime: Option<String>,
}

/// An AmazonMQ broker as reported by the feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqBroker {
    pub broker_name: String,

    #[serde(default)]
    pub broker_state: Option<String>,

    #[serde(default)]
    pub engine_type: Option<String>,

    #[serde(default)]
    pub uptime: Option<String>,
}

/// Which cloud service a status row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKind {
    Ec2,
    Ecs,
    AmazonMq,
}

impl ServiceKind {
    /// Human-readable label, also used for search matching.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ec2 => "EC2",
            Self::Ecs => "ECS",
            Self::AmazonMq => "AmazonMQ",
        }
    }
}

/// Uniform display row derived from one raw feed item.
///
/// Recomputed on every fetch; never persisted.
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub name: String,
    pub kind: ServiceKind,
    pub operational: bool,
    pub uptime: String,
    pub downtime: String,
    pub running_count: u32,
    pub stopped_count: u32,

    // Carry-along raw detail used by sublists in the view
    pub public_ip: Option<String>,
    pub docker_images: Vec<String>,
    pub running_details: Vec<RunningTask>,
    pub stopped_details: Vec<StoppedTask>,
}

impl StatusDocument {
    /// Flatten all sections into display rows, EC2 first, then ECS, then
    /// AmazonMQ. Output length always equals the sum of section lengths.
    #[must_use]
    pub fn into_services(self) -> Vec<ServiceStatus> {
        let mut services =
            Vec::with_capacity(self.ec2.len() + self.ecs.len() + self.amazon_mq.len());
        services.extend(self.ec2.into_iter().map(map_ec2_instance));
        services.extend(self.ecs.into_iter().map(map_ecs_service));
        services.extend(self.amazon_mq.into_iter().map(map_mq_broker));
        services
    }
}

fn map_ec2_instance(instance: Ec2Instance) -> ServiceStatus {
    // Name falls back to the instance ID when no Name tag is set
    let name = instance
        .instance_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| instance.instance_id.clone());

    ServiceStatus {
        name,
        kind: ServiceKind::Ec2,
        // The feed only reports running instances
        operational: true,
        uptime: UNKNOWN_FIELD.to_string(),
        downtime: UNKNOWN_FIELD.to_string(),
        running_count: 1,
        stopped_count: 0,
        public_ip: instance.public_ip,
        docker_images: instance.docker_images.docker_images,
        running_details: Vec::new(),
        stopped_details: Vec::new(),
    }
}

fn map_ecs_service(service: EcsService) -> ServiceStatus {
    let uptime = service
        .running_details
        .first()
        .and_then(|task| task.uptime.clone())
        .unwrap_or_else(|| UNKNOWN_FIELD.to_string());

    let downtimes: Vec<&str> = service
        .stopped_details
        .iter()
        .filter_map(|task| task.downtime.as_deref())
        .collect();
    let downtime = if downtimes.is_empty() {
        UNKNOWN_FIELD.to_string()
    } else {
        downtimes.join(", ")
    };

    ServiceStatus {
        name: service.service_name,
        kind: ServiceKind::Ecs,
        operational: service.running_tasks > 0,
        uptime,
        downtime,
        running_count: service.running_tasks,
        stopped_count: service.stopped_tasks,
        public_ip: None,
        docker_images: Vec::new(),
        running_details: service.running_details,
        stopped_details: service.stopped_details,
    }
}

fn map_mq_broker(broker: MqBroker) -> ServiceStatus {
    let operational = broker
        .broker_state
        .as_deref()
        .is_some_and(|state| state.eq_ignore_ascii_case("RUNNING"));

    let downtime = match (&operational, broker.broker_state.as_deref()) {
        (false, Some(state)) => state.to_string(),
        _ => UNKNOWN_FIELD.to_string(),
    };

    ServiceStatus {
        name: broker.broker_name,
        kind: ServiceKind::AmazonMq,
        operational,
        uptime: broker
            .uptime
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        downtime,
        running_count: u32::from(operational),
        stopped_count: u32::from(!operational),
        public_ip: None,
        docker_images: Vec::new(),
        running_details: Vec::new(),
        stopped_details: Vec::new(),
    }
}
