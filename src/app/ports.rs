//! Port traits: the hexagonal boundary between control logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ monitor / controller / ControlService
//! ```
//!
//! Driven adapters (GPIO pins, JSON files, event sinks, clocks) implement
//! these traits.  The loops and the service consume them via generics, so
//! the control core never touches hardware or the filesystem directly.

use std::time::Instant;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ActuatorWriteError, PersistenceError, SignalReadError};
use crate::history::HistorySample;

// ───────────────────────────────────────────────────────────────
// Signal port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// The external boolean condition the system polls.
pub trait SignalPort {
    /// Sample the signal.  `true` means active (HVAC blower running).
    fn read(&mut self) -> Result<bool, SignalReadError>;
}

impl<T: SignalPort + ?Sized> SignalPort for Box<T> {
    fn read(&mut self) -> Result<bool, SignalReadError> {
        (**self).read()
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The two outputs driven by the duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actuator {
    Pump,
    Fan,
}

impl Actuator {
    /// Both actuators, in the order they are commanded.
    pub const ALL: [Actuator; 2] = [Self::Pump, Self::Fan];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Pump => "pump",
            Self::Fan => "fan",
        }
    }
}

impl core::fmt::Display for Actuator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Write-side port: switch one actuator on or off.
pub trait ActuatorPort {
    fn set(&mut self, actuator: Actuator, on: bool) -> Result<(), ActuatorWriteError>;
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for Box<T> {
    fn set(&mut self, actuator: Actuator, on: bool) -> Result<(), ActuatorWriteError> {
        (**self).set(actuator, on)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Persistence ports (driven adapters: domain ↔ storage)
// ───────────────────────────────────────────────────────────────

/// Loads and persists user settings and runtime counters.
///
/// The stored document is handed back raw so each field can be validated
/// on its own: one bad value must not discard the rest.
pub trait ConfigPort {
    /// The stored document, or `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<Value>, PersistenceError>;

    /// Persist the document.  Implementations must write atomically.
    fn save(&self, document: &Value) -> Result<(), PersistenceError>;
}

/// Loads and persists the signal history.
pub trait HistoryPort {
    /// Stored samples; empty if nothing has been stored yet.
    fn load(&self) -> Result<Vec<HistorySample>, PersistenceError>;

    fn save(&self, samples: &[HistorySample]) -> Result<(), PersistenceError>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Clock used by the periodic loops.
///
/// Elapsed-time decisions use the monotonic reading; the wall clock is
/// only used for the business-hours gate and for timestamps.
pub trait TimePort {
    fn monotonic(&self) -> Instant;

    fn wall(&self) -> DateTime<Local>;
}
