//! Context threaded through every phase handler.
//!
//! `ControlContext` is the blackboard the handlers read from and write
//! to: the inputs sampled for this tick, the timing of the current phase,
//! and the actuator command the phase wants applied.

use std::time::{Duration, Instant};

use crate::config::DutyCycle;

/// The shared context passed to every phase handler.
#[derive(Debug, Clone)]
pub struct ControlContext {
    // -- Inputs (refreshed before each tick) --
    /// Monotonic time of the current tick.
    pub now: Instant,
    /// Last sampled HVAC signal.
    pub signal: bool,
    /// Live preset, re-read from shared state every tick.
    pub duty_cycle: DutyCycle,

    // -- Timing --
    /// Signal confirmation window.
    pub arm_delay: Duration,
    /// When the current phase was entered.  Set by the engine.
    pub phase_entered_at: Instant,
    /// When the signal was first seen high.  `Some` only while arming.
    pub armed_at: Option<Instant>,

    // -- Output --
    /// Desired state for both actuators after this tick.
    pub command_on: bool,
}

impl ControlContext {
    pub fn new(arm_delay: Duration, now: Instant) -> Self {
        Self {
            now,
            signal: false,
            duty_cycle: DutyCycle::default(),
            arm_delay,
            phase_entered_at: now,
            armed_at: None,
            command_on: false,
        }
    }

    /// Time spent in the current phase.
    pub fn in_phase(&self) -> Duration {
        self.now.saturating_duration_since(self.phase_entered_at)
    }

    /// Time since the signal was first seen high, zero if not arming.
    pub fn since_armed(&self) -> Duration {
        self.armed_at
            .map_or(Duration::ZERO, |t| self.now.saturating_duration_since(t))
    }

    pub fn on_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duty_cycle.on_secs()))
    }

    pub fn off_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duty_cycle.off_secs()))
    }
}
