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

// Per-process statistics access through the procfs interface.

use libc::pid_t;
use procfs::{
    Current, Meminfo, ProcError,
    net::TcpState,
    process::{FDTarget, Process, all_processes},
};
use std::collections::HashSet;
use strum::IntoStaticStr;

#[derive(thiserror::Error, Debug)]
pub enum InspectorError {
    #[error("process {0} has vanished")]
    Vanished(pid_t),
    #[error("process {0}: permission denied")]
    PermissionDenied(pid_t),
    #[error("process {0}: {1}")]
    Access(pid_t, String),
    #[error("cannot enumerate processes: {0}")]
    Enumeration(String),
    #[error("cannot read system memory size: {0}")]
    SystemMemory(String),
}

pub type InspectorResult<T> = Result<T, InspectorError>;

fn access_error(pid: pid_t, err: ProcError) -> InspectorError {
    match err {
        ProcError::NotFound(_) => InspectorError::Vanished(pid),
        ProcError::PermissionDenied(_) => InspectorError::PermissionDenied(pid),
        err => InspectorError::Access(pid, format!("{err}")),
    }
}

/// State of an open network connection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
}

impl From<TcpState> for ConnectionState {
    fn from(state: TcpState) -> Self {
        match state {
            TcpState::Established => ConnectionState::Established,
            TcpState::SynSent => ConnectionState::SynSent,
            TcpState::SynRecv | TcpState::NewSynRecv => ConnectionState::SynRecv,
            TcpState::FinWait1 => ConnectionState::FinWait1,
            TcpState::FinWait2 => ConnectionState::FinWait2,
            TcpState::TimeWait => ConnectionState::TimeWait,
            TcpState::Close => ConnectionState::Close,
            TcpState::CloseWait => ConnectionState::CloseWait,
            TcpState::LastAck => ConnectionState::LastAck,
            TcpState::Listen => ConnectionState::Listen,
            TcpState::Closing => ConnectionState::Closing,
        }
    }
}

/// Memory breakdown of one process in bytes.
///
/// Fields unsupported on the running platform are `None` and silently
/// skipped by the memory sampler.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryDetail {
    pub rss: Option<u64>,
    pub vms: Option<u64>,
    pub shared: Option<u64>,
    pub text: Option<u64>,
    pub lib: Option<u64>,
    pub data: Option<u64>,
    pub dirty: Option<u64>,
}

/// Cumulative I/O counters of one process.
#[derive(Clone, Copy, Debug, Default)]
pub struct IoCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_ops: u64,
    pub write_ops: u64,
}

/// Access to one running process for the duration of one cycle.
///
/// Handles must not outlive the cycle they were obtained in: the kernel may
/// recycle a pid for an unrelated process between cycles.
pub trait ProcessHandle {
    fn pid(&self) -> pid_t;
    fn name(&self) -> InspectorResult<String>;
    /// Voluntary and involuntary context-switch counts.
    fn context_switches(&self) -> InspectorResult<(u64, u64)>;
    fn thread_count(&self) -> InspectorResult<u64>;
    /// Share of system memory used by the process, in percent.
    fn memory_percent(&self) -> InspectorResult<f64>;
    fn memory_detail(&self) -> InspectorResult<MemoryDetail>;
    /// State of every open network connection, one entry per connection.
    fn connection_states(&self) -> InspectorResult<Vec<ConnectionState>>;
    fn fd_count(&self) -> InspectorResult<u64>;
    fn io_counters(&self) -> InspectorResult<IoCounters>;
}

/// Enumeration of the currently running processes.
pub trait ProcessInspector {
    fn processes(&self) -> InspectorResult<Vec<Box<dyn ProcessHandle>>>;
}

/// Process inspector backed by /proc.
pub struct ProcfsInspector {
    page_size: u64,
    memory_total: u64,
}

impl ProcfsInspector {
    pub fn new() -> InspectorResult<Self> {
        let meminfo =
            Meminfo::current().map_err(|err| InspectorError::SystemMemory(format!("{err}")))?;
        Ok(ProcfsInspector {
            page_size: procfs::page_size(),
            memory_total: meminfo.mem_total,
        })
    }
}

impl ProcessInspector for ProcfsInspector {
    fn processes(&self) -> InspectorResult<Vec<Box<dyn ProcessHandle>>> {
        let mut handles: Vec<Box<dyn ProcessHandle>> = Vec::new();
        let processes =
            all_processes().map_err(|err| InspectorError::Enumeration(format!("{err}")))?;
        for process in processes {
            // A process may exit while the table is being read.
            if let Ok(process) = process {
                handles.push(Box::new(ProcfsHandle {
                    process,
                    page_size: self.page_size,
                    memory_total: self.memory_total,
                }));
            }
        }
        Ok(handles)
    }
}

struct ProcfsHandle {
    process: Process,
    page_size: u64,
    memory_total: u64,
}

impl ProcessHandle for ProcfsHandle {
    fn pid(&self) -> pid_t {
        self.process.pid()
    }

    fn name(&self) -> InspectorResult<String> {
        let stat = self
            .process
            .stat()
            .map_err(|err| access_error(self.pid(), err))?;
        Ok(stat.comm)
    }

    fn context_switches(&self) -> InspectorResult<(u64, u64)> {
        let status = self
            .process
            .status()
            .map_err(|err| access_error(self.pid(), err))?;
        Ok((
            status.voluntary_ctxt_switches.unwrap_or(0),
            status.nonvoluntary_ctxt_switches.unwrap_or(0),
        ))
    }

    fn thread_count(&self) -> InspectorResult<u64> {
        let stat = self
            .process
            .stat()
            .map_err(|err| access_error(self.pid(), err))?;
        Ok(stat.num_threads.max(0) as u64)
    }

    fn memory_percent(&self) -> InspectorResult<f64> {
        let stat = self
            .process
            .stat()
            .map_err(|err| access_error(self.pid(), err))?;
        let rss_bytes = stat.rss * self.page_size;
        Ok(rss_bytes as f64 * 100.0 / self.memory_total as f64)
    }

    fn memory_detail(&self) -> InspectorResult<MemoryDetail> {
        let statm = self
            .process
            .statm()
            .map_err(|err| access_error(self.pid(), err))?;
        let pages = |count: u64| Some(count * self.page_size);
        Ok(MemoryDetail {
            rss: pages(statm.resident),
            vms: pages(statm.size),
            shared: pages(statm.shared),
            text: pages(statm.text),
            lib: pages(statm.lib),
            data: pages(statm.data),
            dirty: pages(statm.dt),
        })
    }

    fn connection_states(&self) -> InspectorResult<Vec<ConnectionState>> {
        let mut inodes = HashSet::new();
        let fds = self
            .process
            .fd()
            .map_err(|err| access_error(self.pid(), err))?;
        for fd in fds {
            let fd = fd.map_err(|err| access_error(self.pid(), err))?;
            if let FDTarget::Socket(inode) = fd.target {
                inodes.insert(inode);
            }
        }
        let mut states = Vec::new();
        // The tables may be unreadable in minimal containers; report no
        // connections rather than failing the whole process.
        for entries in [procfs::net::tcp(), procfs::net::tcp6()].into_iter().flatten() {
            for entry in entries {
                if inodes.contains(&entry.inode) {
                    states.push(ConnectionState::from(entry.state));
                }
            }
        }
        Ok(states)
    }

    fn fd_count(&self) -> InspectorResult<u64> {
        let count = self
            .process
            .fd_count()
            .map_err(|err| access_error(self.pid(), err))?;
        Ok(count as u64)
    }

    fn io_counters(&self) -> InspectorResult<IoCounters> {
        let io = self
            .process
            .io()
            .map_err(|err| access_error(self.pid(), err))?;
        Ok(IoCounters {
            read_bytes: io.read_bytes,
            write_bytes: io.write_bytes,
            read_ops: io.syscr,
            write_ops: io.syscw,
        })
    }
}
