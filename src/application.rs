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

// The reporting cycle: locate, sample, normalize, submit, sleep.

use log::{debug, info, warn};
use std::time::Duration;
use strum::Display as StrumDisplay;

use crate::cfg::Settings;
use crate::clock::Timer;
use crate::metric::MetricGroup;
use crate::payload::{AgentInfo, Component, Payload, hostname};
use crate::pidstat::ExternalSampler;
use crate::process::{InspectorResult, ProcessInspector, WatchedProcess, locate};
use crate::samplers::{CpuSampler, DiskSampler, MemorySampler, NetworkSampler, Sampler};
use crate::sighdr::ShutdownFlag;
use crate::sink::TelemetrySink;

/// Lifecycle of the reporting cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, StrumDisplay)]
pub enum Phase {
    #[strum(serialize = "init")]
    Init,
    #[strum(serialize = "running")]
    Running,
    #[strum(serialize = "shutting down")]
    ShuttingDown,
    #[strum(serialize = "terminated")]
    Terminated,
}

/// Orchestrates one locate-sample-normalize-submit pass per tick.
pub struct Application<'a> {
    settings: &'a Settings,
    inspector: &'a dyn ProcessInspector,
    external: &'a dyn ExternalSampler,
    sink: &'a dyn TelemetrySink,
    hostname: String,
    /// Effective reporting interval, floor already applied.
    duration: u64,
}

impl<'a> Application<'a> {
    pub fn new(
        settings: &'a Settings,
        inspector: &'a dyn ProcessInspector,
        external: &'a dyn ExternalSampler,
        sink: &'a dyn TelemetrySink,
    ) -> Application<'a> {
        debug!("entering {} phase", Phase::Init);
        Application {
            settings,
            inspector,
            external,
            sink,
            hostname: hostname(),
            duration: settings.effective_duration(),
        }
    }

    /// Sample the four metric classes for one process.
    ///
    /// Evaluation order is CPU, NET, MEM, DISK; on key collision the later
    /// group wins during normalization.
    fn sample(&self, process: &WatchedProcess) -> InspectorResult<Vec<MetricGroup>> {
        let cpu = CpuSampler::new(self.external);
        let mem = MemorySampler::new(self.external);
        let samplers: [&dyn Sampler; 4] = [&cpu, &NetworkSampler, &mem, &DiskSampler];
        samplers
            .iter()
            .map(|sampler| sampler.sample(process))
            .collect()
    }

    /// Build the payload for the current cycle.
    ///
    /// The watched process list is re-resolved by name on every cycle so a
    /// recycled pid is never sampled. A process that fails mid-sampling is
    /// omitted entirely.
    fn collect(&self) -> Payload {
        let names = self.settings.process_names();
        let watched = match locate(self.inspector, &names) {
            Ok(watched) => watched,
            Err(err) => {
                warn!("{err}");
                Vec::new()
            }
        };
        let mut components = Vec::new();
        for process in &watched {
            match self.sample(process) {
                Ok(groups) => components.push(Component::new(
                    process,
                    &self.hostname,
                    self.settings.general().guid(),
                    self.duration,
                    &groups,
                )),
                Err(err) => {
                    debug!(
                        "{} (pid {}): dropped from this cycle: {err}",
                        process.name(),
                        process.pid()
                    );
                }
            }
        }
        let version = env!("CARGO_PKG_VERSION");
        Payload::new(AgentInfo::new(&self.hostname, version), components)
    }

    /// One full tick: collect and submit. Submission failures are logged
    /// and otherwise ignored; the next tick is unaffected.
    fn tick(&self) {
        let payload = self.collect();
        debug!("reporting {} components", payload.components().len());
        if let Err(err) = self.sink.submit(&payload) {
            warn!("submission failed: {err}");
        }
    }

    /// Run until a shutdown request arrives, or for a single cycle.
    pub fn run(&self, shutdown: &ShutdownFlag, once: bool) {
        let mut phase = Phase::Running;
        debug!("entering {phase} phase");
        info!(
            "watching {} process names every {} seconds",
            self.settings.process().len(),
            self.duration
        );
        let mut timer = Timer::new(Duration::from_secs(self.duration), true);
        loop {
            if shutdown.requested() {
                phase = Phase::ShuttingDown;
                break;
            }
            self.tick();
            if once {
                break;
            }
            timer.reset();
            if !timer.sleep_unless(|| shutdown.requested()) {
                phase = Phase::ShuttingDown;
                break;
            }
        }
        if phase == Phase::ShuttingDown {
            debug!("entering {phase} phase");
        }
        info!("entering {} phase", Phase::Terminated);
    }
}

#[cfg(test)]
mod tests {

    use super::Application;
    use crate::cfg::Settings;
    use crate::pidstat::testing::CannedSampler;
    use crate::process::mocks::{FakeInspector, FakeProcess};
    use crate::sighdr::ShutdownFlag;
    use crate::sink::testing::{FailingSink, RecordingSink};

    const EXTERNAL: CannedSampler = CannedSampler {
        cpu: "\
04:47:53          PID    %usr %system  %guest    %CPU   CPU  Command
04:47:53         3736    0.00    0.00    0.00    0.00     1  sshd
",
        faults: "\
20:23:58      UID       PID  minflt/s  majflt/s     VSZ    RSS   %MEM  Command
20:23:58     1000      2736      0.11      0.00   22440   3720   0.74  bash
",
    };

    fn settings() -> Settings {
        toml::from_str("process = [\"sshd\", \"nginx\"]\n[general]\nlicense = \"k\"\n").unwrap()
    }

    #[test]
    fn one_component_per_watched_process() {
        let settings = settings();
        let inspector = FakeInspector::new(vec![
            FakeProcess::new(10, "sshd"),
            FakeProcess::new(20, "nginx"),
            FakeProcess::new(30, "bash"),
        ]);
        let sink = RecordingSink::default();
        let app = Application::new(&settings, &inspector, &EXTERNAL, &sink);
        app.run(&ShutdownFlag::preset(false), true);
        let submitted = sink.submitted.borrow();
        assert_eq!(1, submitted.len());
        let components = submitted[0].components();
        assert_eq!(2, components.len());
        let hostname = crate::payload::hostname();
        assert_eq!(format!("10-sshd-{hostname}"), components[0].name());
        assert_eq!(format!("20-nginx-{hostname}"), components[1].name());
    }

    #[test]
    fn component_metrics_cover_all_classes() {
        let settings = settings();
        let inspector = FakeInspector::new(vec![FakeProcess::new(10, "sshd")]);
        let sink = RecordingSink::default();
        let app = Application::new(&settings, &inspector, &EXTERNAL, &sink);
        app.run(&ShutdownFlag::preset(false), true);
        let submitted = sink.submitted.borrow();
        let metrics = submitted[0].components()[0].metrics();
        for key in [
            "Component/cpu/csw/v_csw[count]",
            "Component/cpu/utilization/usr[percentage]",
            "Component/net/connections/established[count]",
            "Component/mem/percentage_usage[percentage]",
            "Component/mem/faults/minflts[count]",
            "Component/disk/fd[count]",
            "Component/disk/iocounters/read[count]",
        ] {
            assert!(metrics.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn vanished_process_is_omitted_without_affecting_others() {
        let settings = settings();
        let inspector = FakeInspector::new(vec![
            FakeProcess::new(10, "sshd").exits_after_scan(),
            FakeProcess::new(20, "nginx"),
        ]);
        let sink = RecordingSink::default();
        let app = Application::new(&settings, &inspector, &EXTERNAL, &sink);
        app.run(&ShutdownFlag::preset(false), true);
        let submitted = sink.submitted.borrow();
        let components = submitted[0].components();
        assert_eq!(1, components.len());
        assert!(components[0].name().starts_with("20-nginx-"));
    }

    #[test]
    fn submission_failure_does_not_abort_the_cycle() {
        let settings = settings();
        let inspector = FakeInspector::new(vec![FakeProcess::new(10, "sshd")]);
        let sink = FailingSink::default();
        let app = Application::new(&settings, &inspector, &EXTERNAL, &sink);
        app.run(&ShutdownFlag::preset(false), true);
        assert_eq!(1, *sink.attempts.borrow());
        // A second cycle proceeds normally after the failure.
        app.run(&ShutdownFlag::preset(false), true);
        assert_eq!(2, *sink.attempts.borrow());
    }

    #[test]
    fn pending_shutdown_prevents_any_tick() {
        let settings = settings();
        let inspector = FakeInspector::new(vec![FakeProcess::new(10, "sshd")]);
        let sink = RecordingSink::default();
        let app = Application::new(&settings, &inspector, &EXTERNAL, &sink);
        app.run(&ShutdownFlag::preset(true), false);
        assert!(sink.submitted.borrow().is_empty());
    }
}
