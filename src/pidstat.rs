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

// External sampling with pidstat(1) and parsing of its tabular output.

use libc::pid_t;
use log::debug;
use smart_default::SmartDefault;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};
use strum::IntoStaticStr;

#[derive(thiserror::Error, Debug)]
pub enum SamplerError {
    #[error("cannot run sampler: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("sampler exceeded the {0:?} deadline")]
    Timeout(Duration),
}

pub type SamplerResult<T> = Result<T, SamplerError>;

/// Sampling mode of the external utility.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoStaticStr)]
pub enum SampleMode {
    /// CPU percentage breakdown (default pidstat report).
    #[strum(serialize = "cpu")]
    Cpu,
    /// Minor/major page fault rates (pidstat -r).
    #[strum(serialize = "faults")]
    PageFaults,
}

/// Per-process sampling utility invoked as a subprocess.
///
/// One call covers a short fixed sampling window and returns raw tabular
/// text. An empty or unparseable report is not an error for callers, only
/// a missing metric group.
pub trait ExternalSampler {
    fn collect(&self, mode: SampleMode, pid: pid_t) -> SamplerResult<String>;
}

/// Runs `pidstat <window> 1 [-r] -p <pid>` with a bounded deadline.
#[derive(Debug, SmartDefault)]
pub struct Pidstat {
    #[default = "pidstat"]
    command: String,
    /// Sampling window passed to pidstat, one iteration.
    #[default(Duration::from_secs(1))]
    window: Duration,
    /// Hard deadline; a hung subprocess is killed past this point.
    #[default(Duration::from_secs(5))]
    timeout: Duration,
}

impl ExternalSampler for Pidstat {
    fn collect(&self, mode: SampleMode, pid: pid_t) -> SamplerResult<String> {
        let mut command = Command::new(&self.command);
        command.arg(self.window.as_secs().to_string()).arg("1");
        if let SampleMode::PageFaults = mode {
            command.arg("-r");
        }
        command.arg("-p").arg(pid.to_string());
        debug!("running {command:?}");
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let deadline = Instant::now() + self.timeout;
        let poll_delay = Duration::from_millis(50);
        loop {
            match child.try_wait()? {
                Some(_status) => break,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SamplerError::Timeout(self.timeout));
                }
                None => sleep(poll_delay),
            }
        }
        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_string(&mut output)?;
        }
        debug!("pidstat {} for pid {pid}: {} bytes", <&str>::from(mode), output.len());
        Ok(output)
    }
}

/// Extract one value per expected column from tabular text output.
///
/// Empty lines are discarded. The first remaining line containing every
/// column label is the header; the zero-based word index of each label is
/// recorded there. The next non-empty line is the data row: the fields at
/// the recorded indices are parsed as floats and rounded to the nearest
/// integer, returned in column order.
///
/// Exhausting the input without finding a header is not an error, there is
/// simply no data.
pub fn parse_columns(output: &str, columns: &[&str]) -> Option<Vec<i64>> {
    let mut indices: Option<Vec<usize>> = None;
    for line in output.lines().filter(|line| !line.trim().is_empty()) {
        match indices {
            None => {
                if columns.iter().all(|column| line.contains(column)) {
                    let words = line.split_whitespace().collect::<Vec<&str>>();
                    let mut recorded = Vec::with_capacity(columns.len());
                    for column in columns {
                        recorded.push(words.iter().position(|word| word == column)?);
                    }
                    indices = Some(recorded);
                }
            }
            Some(ref indices) => {
                let words = line.split_whitespace().collect::<Vec<&str>>();
                let mut values = Vec::with_capacity(indices.len());
                for index in indices {
                    let value = words.get(*index)?.parse::<f64>().ok()?;
                    values.push(value.round() as i64);
                }
                return Some(values);
            }
        }
    }
    None
}
