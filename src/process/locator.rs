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

use libc::pid_t;
use log::debug;
use std::collections::HashSet;

use super::inspector::{InspectorResult, ProcessHandle, ProcessInspector};

/// One monitored process, valid for a single cycle.
pub struct WatchedProcess {
    pid: pid_t,
    name: String,
    handle: Box<dyn ProcessHandle>,
}

impl WatchedProcess {
    pub fn pid(&self) -> pid_t {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &dyn ProcessHandle {
        self.handle.as_ref()
    }
}

/// Return the running processes whose name is a member of the set.
///
/// Matching is exact on the OS-reported process name. Entries that exit or
/// become inaccessible during the scan are skipped. Order is stable within
/// one call only; the OS gives no enumeration order guarantee.
pub fn locate(
    inspector: &dyn ProcessInspector,
    names: &HashSet<String>,
) -> InspectorResult<Vec<WatchedProcess>> {
    let mut watched = Vec::new();
    for handle in inspector.processes()? {
        match handle.name() {
            Ok(name) if names.contains(&name) => {
                let pid = handle.pid();
                watched.push(WatchedProcess { pid, name, handle });
            }
            Ok(_) => (),
            Err(err) => debug!("pid {}: skipped during scan: {err}", handle.pid()),
        }
    }
    Ok(watched)
}
