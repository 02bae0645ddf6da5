//! Everything between a trial's abstract stimulus and the bytes on the wire.
//!
//! The core only ever sees [`Transport`]; the concrete sinks run behind a
//! [`DetachedTransport`] so a slow or dead link can never hold up a trial.

pub mod encoder;
pub mod error;
pub mod gateway;
pub mod serial;
pub mod udp;

pub use encoder::{Command, Encoding};
pub use error::TransportError;
pub use gateway::{CommandSink, DetachedTransport, NullTransport, SendOutcome, Transport};
pub use serial::SerialSink;
pub use udp::UdpSink;
