//! Application core: sampling orchestration and the status message.
//!
//! All interaction with hardware and the network happens through the
//! **port traits** in [`ports`], keeping this layer testable without real
//! peripherals.

pub mod events;
pub mod ports;
pub mod publisher;
pub mod status;
