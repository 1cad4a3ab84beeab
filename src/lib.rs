//! HVAC-gated diffuser controller library.
//!
//! Drives an air pump and a fan in a timed duty cycle while the HVAC
//! blower is running, inside an optional business-hours window, and
//! tracks runtime for an oil consumption estimate.  Exposes the control
//! core and its adapters for the daemon binary and integration tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod consumption;
pub mod error;
pub mod fsm;
pub mod gate;
pub mod history;
pub mod monitor;
pub mod pins;
pub mod runtime;
pub mod state;
