//! Audio storage and I/O: the delay ring, level metering, and the cpal
//! duplex host.

pub mod host;
pub mod meter;
pub mod ring;

pub use host::{DuplexHost, list_devices};
pub use ring::{AbsPos, DelayRing, RingError};
