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

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shutdown request raised by SIGINT or SIGTERM.
///
/// The flag only ever goes from false to true; the reporting cycle polls it
/// between and during sleeps.
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Install the signal handler. Can only be done once per process.
    pub fn install() -> Result<ShutdownFlag, ctrlc::Error> {
        let requested = Arc::new(AtomicBool::new(false));
        let flag = requested.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })?;
        Ok(ShutdownFlag { requested })
    }

    pub fn requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Flag not wired to any signal, for tests.
    #[cfg(test)]
    pub fn preset(requested: bool) -> ShutdownFlag {
        ShutdownFlag {
            requested: Arc::new(AtomicBool::new(requested)),
        }
    }
}
