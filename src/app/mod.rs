//! Application core boundary.
//!
//! All interaction with hardware, storage and logging happens through
//! the **port traits** defined in [`ports`], keeping the control core
//! testable without real peripherals.  [`service`] is the entry point for
//! external callers; [`events`] is what the core reports outward.

pub mod events;
pub mod ports;
pub mod service;
