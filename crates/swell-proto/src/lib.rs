//! # swell-proto
//!
//! Wire protocol for Swell gateway connections.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod close;
pub mod error;
pub mod events;
pub mod frames;

pub use close::ClosePolicy;
pub use error::ProtoError;
pub use events::{DispatchEvent, Presence, PresenceStatus, READY_EVENT};
pub use frames::{ClientFrame, ServerFrame, PROTOCOL_VERSION};
