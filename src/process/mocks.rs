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

// Fake process inspector for tests.

use libc::pid_t;

use super::inspector::{
    ConnectionState, InspectorError, InspectorResult, IoCounters, MemoryDetail, ProcessHandle,
    ProcessInspector,
};

/// Canned process description served by [`FakeInspector`].
#[derive(Clone)]
pub struct FakeProcess {
    pub pid: pid_t,
    pub name: &'static str,
    /// Every access fails as if the process had exited.
    pub vanished: bool,
    /// Name resolution succeeds but every later access fails, as if the
    /// process exited between location and sampling.
    pub exits_after_scan: bool,
    pub context_switches: (u64, u64),
    pub threads: u64,
    pub memory_percent: f64,
    pub memory: MemoryDetail,
    pub connections: Vec<ConnectionState>,
    pub fds: u64,
    pub io: IoCounters,
}

impl FakeProcess {
    pub fn new(pid: pid_t, name: &'static str) -> Self {
        FakeProcess {
            pid,
            name,
            vanished: false,
            exits_after_scan: false,
            context_switches: (120, 30),
            threads: 4,
            memory_percent: 0.74,
            memory: MemoryDetail {
                rss: Some(3_809_280),
                vms: Some(22_978_560),
                shared: Some(1_048_576),
                text: Some(819_200),
                lib: Some(0),
                data: Some(2_097_152),
                dirty: Some(0),
            },
            connections: vec![ConnectionState::Established, ConnectionState::Listen],
            fds: 12,
            io: IoCounters {
                read_bytes: 4096,
                write_bytes: 8192,
                read_ops: 7,
                write_ops: 9,
            },
        }
    }

    pub fn vanished(mut self) -> Self {
        self.vanished = true;
        self
    }

    pub fn exits_after_scan(mut self) -> Self {
        self.exits_after_scan = true;
        self
    }

    pub fn with_connections(mut self, connections: Vec<ConnectionState>) -> Self {
        self.connections = connections;
        self
    }

    fn check(&self) -> InspectorResult<()> {
        if self.vanished || self.exits_after_scan {
            Err(InspectorError::Vanished(self.pid))
        } else {
            Ok(())
        }
    }
}

impl ProcessHandle for FakeProcess {
    fn pid(&self) -> pid_t {
        self.pid
    }

    fn name(&self) -> InspectorResult<String> {
        if self.vanished {
            return Err(InspectorError::Vanished(self.pid));
        }
        Ok(self.name.to_string())
    }

    fn context_switches(&self) -> InspectorResult<(u64, u64)> {
        self.check()?;
        Ok(self.context_switches)
    }

    fn thread_count(&self) -> InspectorResult<u64> {
        self.check()?;
        Ok(self.threads)
    }

    fn memory_percent(&self) -> InspectorResult<f64> {
        self.check()?;
        Ok(self.memory_percent)
    }

    fn memory_detail(&self) -> InspectorResult<MemoryDetail> {
        self.check()?;
        Ok(self.memory)
    }

    fn connection_states(&self) -> InspectorResult<Vec<ConnectionState>> {
        self.check()?;
        Ok(self.connections.clone())
    }

    fn fd_count(&self) -> InspectorResult<u64> {
        self.check()?;
        Ok(self.fds)
    }

    fn io_counters(&self) -> InspectorResult<IoCounters> {
        self.check()?;
        Ok(self.io)
    }
}

/// Inspector serving a fixed process table.
pub struct FakeInspector {
    table: Vec<FakeProcess>,
}

impl FakeInspector {
    pub fn new(table: Vec<FakeProcess>) -> Self {
        FakeInspector { table }
    }
}

impl ProcessInspector for FakeInspector {
    fn processes(&self) -> InspectorResult<Vec<Box<dyn ProcessHandle>>> {
        Ok(self
            .table
            .iter()
            .map(|process| Box::new(process.clone()) as Box<dyn ProcessHandle>)
            .collect())
    }
}
