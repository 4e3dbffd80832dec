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

// The four per-process samplers, one metric group each.

use log::debug;
use std::collections::BTreeMap;

use crate::metric::{MetricClass, MetricGroup, Unit};
use crate::pidstat::{ExternalSampler, SampleMode, parse_columns};
use crate::process::{InspectorResult, WatchedProcess};

/// Produces one metric group for one process during one cycle.
///
/// Samplers are independent: none reads another's output. A failure to
/// access the underlying process drops the process from the current cycle.
pub trait Sampler {
    fn sample(&self, process: &WatchedProcess) -> InspectorResult<MetricGroup>;
}

/// Context switches and thread count from the inspector, CPU utilization
/// percentages from the external sampler.
pub struct CpuSampler<'a> {
    external: &'a dyn ExternalSampler,
}

impl<'a> CpuSampler<'a> {
    pub fn new(external: &'a dyn ExternalSampler) -> Self {
        CpuSampler { external }
    }
}

impl Sampler for CpuSampler<'_> {
    fn sample(&self, process: &WatchedProcess) -> InspectorResult<MetricGroup> {
        let mut group = MetricGroup::new(MetricClass::Cpu);
        let (voluntary, involuntary) = process.handle().context_switches()?;
        group.push(Unit::Count, "v_csw", voluntary, Some("csw"));
        group.push(Unit::Count, "i_csw", involuntary, Some("csw"));
        group.push(Unit::Count, "threads", process.handle().thread_count()?, None);
        // Absent utilization data is not an error: the group is simply
        // reported without it, never as zero.
        match self.external.collect(SampleMode::Cpu, process.pid()) {
            Ok(output) => {
                if let Some(values) = parse_columns(&output, &["%usr", "%system"]) {
                    group.push(Unit::Percentage, "usr", values[0], Some("utilization"));
                    group.push(Unit::Percentage, "sys", values[1], Some("utilization"));
                }
            }
            Err(err) => debug!("pid {}: no CPU utilization sample: {err}", process.pid()),
        }
        Ok(group)
    }
}

/// Memory usage from the inspector, page fault rates from the external
/// sampler.
pub struct MemorySampler<'a> {
    external: &'a dyn ExternalSampler,
}

impl<'a> MemorySampler<'a> {
    pub fn new(external: &'a dyn ExternalSampler) -> Self {
        MemorySampler { external }
    }
}

impl Sampler for MemorySampler<'_> {
    fn sample(&self, process: &WatchedProcess) -> InspectorResult<MetricGroup> {
        let mut group = MetricGroup::new(MetricClass::Mem);
        group.push(
            Unit::Percentage,
            "percentage_usage",
            process.handle().memory_percent()?,
            None,
        );
        let detail = process.handle().memory_detail()?;
        let fields: [(&'static str, Option<u64>); 7] = [
            ("rss", detail.rss),
            ("vms", detail.vms),
            ("shared", detail.shared),
            ("text", detail.text),
            ("lib", detail.lib),
            ("data", detail.data),
            ("dirty", detail.dirty),
        ];
        for (name, value) in fields {
            // Fields missing on this platform are skipped.
            if let Some(value) = value {
                group.push(Unit::Count, name, value, Some("usage"));
            }
        }
        match self.external.collect(SampleMode::PageFaults, process.pid()) {
            Ok(output) => {
                if let Some(values) = parse_columns(&output, &["minflt/s", "majflt/s"]) {
                    group.push(Unit::Count, "minflts", values[0], Some("faults"));
                    group.push(Unit::Count, "majflts", values[1], Some("faults"));
                }
            }
            Err(err) => debug!("pid {}: no page fault sample: {err}", process.pid()),
        }
        Ok(group)
    }
}

/// Open connection tally per state. Byte and error counters are not
/// available through this strategy.
pub struct NetworkSampler;

impl Sampler for NetworkSampler {
    fn sample(&self, process: &WatchedProcess) -> InspectorResult<MetricGroup> {
        let mut group = MetricGroup::new(MetricClass::Net);
        let mut tally = BTreeMap::new();
        for state in process.handle().connection_states()? {
            *tally.entry(state).or_insert(0u64) += 1;
        }
        for (state, count) in tally {
            group.push(Unit::Count, state.into(), count, Some("connections"));
        }
        Ok(group)
    }
}

/// File descriptor count and cumulative I/O counters.
pub struct DiskSampler;

impl Sampler for DiskSampler {
    fn sample(&self, process: &WatchedProcess) -> InspectorResult<MetricGroup> {
        let mut group = MetricGroup::new(MetricClass::Disk);
        group.push(Unit::Count, "fd", process.handle().fd_count()?, None);
        let io = process.handle().io_counters()?;
        group.push(Unit::Count, "read", io.read_bytes, Some("bytecounters"));
        group.push(Unit::Count, "write", io.write_bytes, Some("bytecounters"));
        group.push(Unit::Count, "write", io.write_ops, Some("iocounters"));
        group.push(Unit::Count, "read", io.read_ops, Some("iocounters"));
        Ok(group)
    }
}
