//! Outbound application events.
//!
//! The monitor, the controller and the service emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::app::ports::Actuator;
use crate::config::DutyCycle;
use crate::error::{ActuatorWriteError, SignalReadError};
use crate::fsm::Phase;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A loop has started (carries the settings it started with).
    Started {
        enabled: bool,
        duty_cycle: DutyCycle,
    },

    /// The controller moved between phases.
    PhaseChanged { from: Phase, to: Phase },

    /// An actuator write succeeded and changed its state.
    ActuatorSwitched { actuator: Actuator, on: bool },

    /// An actuator write failed; the recorded state is unchanged.
    ActuatorFault {
        actuator: Actuator,
        requested: bool,
        error: ActuatorWriteError,
    },

    /// The sampled signal changed value.
    SignalChanged { active: bool },

    /// A signal read failed; the last known value is kept.
    SignalFault(SignalReadError),

    /// Settings were updated (names of the accepted fields).
    SettingsChanged(Vec<&'static str>),

    /// Runtime counters were reset.
    CountersReset,

    /// A loop is exiting.
    Stopped,
}
