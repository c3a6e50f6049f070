//! Blocking HTTP client reading point present values from an OBIX gateway.

use std::thread;
use std::time::Duration;

use obixgw_core::PointReading;
use reqwest::Url;

use crate::connection::GatewayConnection;
use crate::decode::decode_reply;
use crate::error::{GatewayConfigError, RemoteReadError};
use crate::reader::PointReader;

/// Real OBIX reader over HTTP.
///
/// Transport failures (connection refused, timeout, ...) are retried up
/// to `max_attempts` times with a fixed delay; an HTTP error status or an
/// `<err>` reply is returned as-is.
pub struct ObixClient {
    connection: GatewayConnection,
    http: reqwest::blocking::Client,
}

impl ObixClient {
    pub fn new(connection: GatewayConnection) -> Result<Self, GatewayConfigError> {
        connection.validate()?;
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(connection.timeout_seconds))
            .user_agent(concat!("obixgw/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { connection, http })
    }

    /// Build from the pass-through `gateway_connection` config value.
    pub fn from_config(value: &serde_json::Value) -> Result<Self, GatewayConfigError> {
        Self::new(GatewayConnection::from_value(value)?)
    }

    pub fn connection(&self) -> &GatewayConnection {
        &self.connection
    }

    fn fetch(&self, url: Url) -> Result<String, RemoteReadError> {
        let max_attempts = self.connection.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.http.get(url.clone()).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        return Err(RemoteReadError::Status {
                            status: status.as_u16(),
                            reason: status.canonical_reason().unwrap_or("").to_string(),
                        });
                    }
                    return resp.text().map_err(|e| RemoteReadError::Transport {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
                Err(e) if attempt < max_attempts => {
                    tracing::debug!(
                        %url,
                        attempt,
                        "gateway request failed, retrying in {}s: {e}",
                        self.connection.retry_delay_seconds
                    );
                    thread::sleep(Duration::from_secs(self.connection.retry_delay_seconds));
                }
                Err(e) => {
                    return Err(RemoteReadError::Transport {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

impl PointReader for ObixClient {
    fn read(&self, remote_id: &str) -> Result<PointReading, RemoteReadError> {
        let url = self
            .connection
            .point_url(remote_id)
            .map_err(|e| RemoteReadError::Url(e.to_string()))?;
        let body = self.fetch(url)?;
        decode_reply(&body)
    }
}
