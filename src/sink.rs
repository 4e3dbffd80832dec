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

use log::{debug, info};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;

use crate::payload::Payload;

const LICENSE_HEADER: &str = "X-License-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("cannot serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cannot reach telemetry endpoint: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("telemetry endpoint answered {0}")]
    Status(StatusCode),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Destination of the per-cycle payload. Delivery is best-effort: a failed
/// submission is dropped, never retried.
pub trait TelemetrySink {
    fn submit(&self, payload: &Payload) -> SinkResult<()>;
}

/// HTTPS POST to the ingestion endpoint.
pub struct HttpSink {
    endpoint: String,
    license: String,
    client: Client,
}

impl HttpSink {
    pub fn new(endpoint: &str, license: &str) -> SinkResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(HttpSink {
            endpoint: endpoint.to_string(),
            license: license.to_string(),
            client,
        })
    }
}

impl TelemetrySink for HttpSink {
    fn submit(&self, payload: &Payload) -> SinkResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(LICENSE_HEADER, &self.license)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()?;
        let status = response.status();
        let body = response.text().unwrap_or_default();
        debug!("telemetry endpoint answered {status}: {body}");
        if !status.is_success() {
            return Err(SinkError::Status(status));
        }
        Ok(())
    }
}

/// Logs the payload instead of posting it. Used in dry-run mode.
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn submit(&self, payload: &Payload) -> SinkResult<()> {
        info!("payload: {}", serde_json::to_string(payload)?);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {

    use std::cell::RefCell;

    use super::{SinkError, SinkResult, TelemetrySink};
    use crate::payload::Payload;

    /// Sink recording every submitted payload.
    #[derive(Default)]
    pub struct RecordingSink {
        pub submitted: RefCell<Vec<Payload>>,
    }

    impl TelemetrySink for RecordingSink {
        fn submit(&self, payload: &Payload) -> SinkResult<()> {
            self.submitted.borrow_mut().push(payload.clone());
            Ok(())
        }
    }

    /// Sink failing every submission, as a broken network would.
    #[derive(Default)]
    pub struct FailingSink {
        pub attempts: RefCell<usize>,
    }

    impl TelemetrySink for FailingSink {
        fn submit(&self, _payload: &Payload) -> SinkResult<()> {
            *self.attempts.borrow_mut() += 1;
            Err(SinkError::Status(super::StatusCode::SERVICE_UNAVAILABLE))
        }
    }
}
