//! # swell-gateway
//!
//! Auto-reconnecting client for the Swell gateway.
//!
//! A [`GatewayClient`] owns the whole connection lifecycle: it dials the
//! gateway, performs the hello handshake, heartbeats on the advertised
//! interval, resumes interrupted sessions, and backs off with jitter when
//! the transport fails. The caller holds a [`GatewayHandle`] to receive
//! dispatched events and queue outbound frames, which are paced to the
//! gateway's send budget.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod shared;
pub mod transport;

mod heartbeat;
mod receiver;
mod session;
mod writer;

pub use client::GatewayClient;
pub use config::{BackoffConfig, GatewayConfig};
pub use error::{ClientError, GatewayError, TransportError};
pub use shared::{ConnectionState, GatewayEvent, GatewayHandle};
pub use transport::WsConnector;
