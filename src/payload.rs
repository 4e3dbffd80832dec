// Procstat -- per-process telemetry agent for Linux
// Copyright (C) 2026  Procstat authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

// Per-process metric normalization and the submission payload.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::metric::{MetricGroup, MetricValue};
use crate::process::WatchedProcess;

/// Flatten metric groups into the per-process metrics mapping.
///
/// Groups are inserted in evaluation order; a later point whose key
/// collides with an earlier one silently overwrites it.
pub fn normalize(groups: &[MetricGroup]) -> BTreeMap<String, MetricValue> {
    let mut metrics = BTreeMap::new();
    for group in groups {
        for point in group.points() {
            metrics.insert(point.key(group.class()), point.value());
        }
    }
    metrics
}

/// Identity of the reporting agent.
#[derive(Clone, Debug, Serialize)]
pub struct AgentInfo {
    host: String,
    pid: u32,
    version: String,
}

impl AgentInfo {
    pub fn new(host: &str, version: &str) -> Self {
        AgentInfo {
            host: host.to_string(),
            pid: std::process::id(),
            version: version.to_string(),
        }
    }
}

/// Per-process unit of the submitted payload.
#[derive(Clone, Debug, Serialize)]
pub struct Component {
    name: String,
    guid: String,
    duration: u64,
    metrics: BTreeMap<String, MetricValue>,
}

impl Component {
    pub fn new(
        process: &WatchedProcess,
        hostname: &str,
        guid: &str,
        duration: u64,
        groups: &[MetricGroup],
    ) -> Self {
        Component {
            name: format!("{}-{}-{}", process.pid(), process.name(), hostname),
            guid: guid.to_string(),
            duration,
            metrics: normalize(groups),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &BTreeMap<String, MetricValue> {
        &self.metrics
    }
}

/// One submission. Built fresh each cycle and discarded afterwards.
#[derive(Clone, Debug, Serialize)]
pub struct Payload {
    agent: AgentInfo,
    components: Vec<Component>,
}

impl Payload {
    pub fn new(agent: AgentInfo, components: Vec<Component>) -> Self {
        Payload { agent, components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }
}

/// Name of the host, as the kernel reports it.
pub fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|_| String::from("localhost"))
}
