//! GPIO pin assignments for the diffuser relay board.
//!
//! Single source of truth: the hardware adapter references this module
//! rather than hard-coding pin numbers.  BCM numbering.

// ---------------------------------------------------------------------------
// Actuators (relay inputs, active HIGH)
// ---------------------------------------------------------------------------

/// Digital output: air pump relay.
pub const PUMP_GPIO: u64 = 25;
/// Digital output: 12 V fan relay.
pub const FAN_GPIO: u64 = 24;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Digital input: HVAC blower sense line, no pull resistor.
/// LOW = blower running, HIGH = blower off.
pub const HVAC_SENSE_GPIO: u64 = 16;
