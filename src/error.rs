//! Unified error types for the diffuser controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! supervisor loops' error handling uniform.  The hardware-facing variants
//! are `Copy` so they can be passed through the controller and the
//! reader thread without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The HVAC signal could not be sampled.
    SignalRead(SignalReadError),
    /// An actuator write failed.
    ActuatorWrite(ActuatorWriteError),
    /// A configured value could not be parsed.
    ConfigParse(ConfigParseError),
    /// A persistence collaborator failed.
    Persistence(PersistenceError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignalRead(e) => write!(f, "signal: {e}"),
            Self::ActuatorWrite(e) => write!(f, "actuator: {e}"),
            Self::ConfigParse(e) => write!(f, "config: {e}"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Signal read errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalReadError {
    /// The GPIO input could not be read.
    Gpio,
    /// The read did not complete before its deadline.
    Timeout,
    /// No signal hardware is attached (degraded mode) or the reader
    /// thread has gone away.
    Disconnected,
}

impl fmt::Display for SignalReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio => write!(f, "GPIO read failed"),
            Self::Timeout => write!(f, "read timed out"),
            Self::Disconnected => write!(f, "signal source unavailable"),
        }
    }
}

impl std::error::Error for SignalReadError {}

impl From<SignalReadError> for Error {
    fn from(e: SignalReadError) -> Self {
        Self::SignalRead(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator write errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorWriteError {
    /// The GPIO output could not be set.
    Gpio,
    /// The output pin is not attached.
    Detached,
}

impl fmt::Display for ActuatorWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio => write!(f, "GPIO write failed"),
            Self::Detached => write!(f, "output not attached"),
        }
    }
}

impl ActuatorWriteError {
    /// A permanent failure will repeat on every retry until the hardware
    /// changes, so it is worth reporting only once.
    pub const fn is_permanent(self) -> bool {
        matches!(self, Self::Detached)
    }
}

impl std::error::Error for ActuatorWriteError {}

impl From<ActuatorWriteError> for Error {
    fn from(e: ActuatorWriteError) -> Self {
        Self::ActuatorWrite(e)
    }
}

// ---------------------------------------------------------------------------
// Config parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigParseError {
    /// A business-hours bound is not a valid time of day.
    InvalidTime(String),
}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTime(raw) => write!(f, "invalid time of day {raw:?}"),
        }
    }
}

impl std::error::Error for ConfigParseError {}

impl From<ConfigParseError> for Error {
    fn from(e: ConfigParseError) -> Self {
        Self::ConfigParse(e)
    }
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Filesystem error (message from the OS).
    Io(String),
    /// Stored data failed to deserialize.
    Corrupted(String),
    /// Data could not be serialized.
    Serialize(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Corrupted(msg) => write!(f, "stored data corrupted: {msg}"),
            Self::Serialize(msg) => write!(f, "serialization failed: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<PersistenceError> for Error {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
