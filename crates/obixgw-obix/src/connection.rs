//! Gateway connection parameters, deserialized from the opaque
//! `gateway_connection` section of the mapping config.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::GatewayConfigError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConnection {
    /// Host name or IP, optionally with a `:port` suffix.
    pub host: String,
    /// Node id as defined in the gateway.
    pub node_id: String,
    /// Device id as defined in the gateway.
    pub device_id: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Attempts per read, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay() -> u64 {
    DEFAULT_RETRY_DELAY_SECS
}

impl GatewayConnection {
    pub fn new(
        host: impl Into<String>,
        node_id: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            node_id: node_id.into(),
            device_id: device_id.into(),
            scheme: default_scheme(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_seconds: DEFAULT_RETRY_DELAY_SECS,
        }
    }

    /// Interpret the pass-through `gateway_connection` JSON value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, GatewayConfigError> {
        if value.is_null() {
            return Err(GatewayConfigError::MissingParameter("host"));
        }
        let conn: Self = serde_json::from_value(value.clone())?;
        conn.validate()?;
        Ok(conn)
    }

    pub fn validate(&self) -> Result<(), GatewayConfigError> {
        for (name, v) in [
            ("host", &self.host),
            ("node_id", &self.node_id),
            ("device_id", &self.device_id),
        ] {
            if v.trim().is_empty() {
                return Err(GatewayConfigError::MissingParameter(name));
            }
        }
        if !matches!(self.scheme.as_str(), "http" | "https") {
            return Err(GatewayConfigError::InvalidParameter {
                name: "scheme",
                detail: format!("expected http or https, got {}", self.scheme),
            });
        }
        self.base_url()?;
        if self.max_attempts == 0 {
            return Err(GatewayConfigError::InvalidParameter {
                name: "max_attempts",
                detail: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn base_url(&self) -> Result<Url, GatewayConfigError> {
        Url::parse(&format!("{}://{}/", self.scheme, self.host)).map_err(|e| {
            GatewayConfigError::InvalidParameter {
                name: "host",
                detail: e.to_string(),
            }
        })
    }

    /// URL of the present value of a point. Ids are percent-encoded as
    /// single path segments.
    pub fn point_url(&self, remote_id: &str) -> Result<Url, GatewayConfigError> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|()| GatewayConfigError::InvalidParameter {
                name: "host",
                detail: format!("{} cannot carry a path", self.host),
            })?
            .clear()
            .extend([
                "obix",
                "network",
                self.node_id.as_str(),
                self.device_id.as_str(),
                remote_id,
                "Present_Value",
                "",
            ]);
        Ok(url)
    }
}
