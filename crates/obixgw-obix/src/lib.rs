//! obixgw-obix: OBIX gateway IO boundary.
//! Provides the `PointReader` capability consumed by the poll scheduler,
//! OBIX reply decoding, and a blocking HTTP client. No polling policy
//! lives here.

pub mod client;
pub mod connection;
pub mod decode;
pub mod error;
pub mod reader;

pub use client::ObixClient;
pub use connection::GatewayConnection;
pub use decode::decode_reply;
pub use error::{GatewayConfigError, RemoteReadError};
pub use reader::PointReader;
