//! Error types for the OBIX gateway boundary.

use obixgw_core::ValueError;
use thiserror::Error;

/// A single point could not be read this cycle.
#[derive(Debug, Error)]
pub enum RemoteReadError {
    #[error("gateway unreachable after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    #[error("gateway replied {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("gateway reported an error: {0}")]
    Gateway(String),

    #[error("unexpected tag <{0}> in reply")]
    UnexpectedTag(String),

    #[error("cannot build point URL: {0}")]
    Url(String),

    #[error("malformed reply: {0}")]
    Decode(String),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("reader task failed: {0}")]
    Task(String),
}

/// The `gateway_connection` section cannot be used to build a reader.
#[derive(Debug, Error)]
pub enum GatewayConfigError {
    #[error("malformed gateway_connection: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("gateway \"{0}\" parameter is mandatory")]
    MissingParameter(&'static str),

    #[error("gateway \"{name}\" parameter is invalid: {detail}")]
    InvalidParameter { name: &'static str, detail: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
