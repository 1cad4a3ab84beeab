//! Mock adapters for integration tests.
//!
//! Records every actuator write so tests can assert on the full command
//! history without touching real GPIO.  Handles are cloneable and share
//! their recordings, so a test can keep one while a loop thread owns the
//! other.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use diffuser::app::events::AppEvent;
use diffuser::app::ports::{Actuator, ActuatorPort, ConfigPort, EventSink, HistoryPort, SignalPort};
use diffuser::error::{ActuatorWriteError, PersistenceError, SignalReadError};
use diffuser::history::HistorySample;
use parking_lot::Mutex;
use serde_json::Value;

// ── Actuator write record ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCall {
    pub actuator: Actuator,
    pub on: bool,
}

#[derive(Default)]
struct Relays {
    calls: Vec<ActuatorCall>,
    pump: bool,
    fan: bool,
    fail: Option<Actuator>,
}

// ── MockActuators ─────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockActuators {
    inner: Arc<Mutex<Relays>>,
}

#[allow(dead_code)]
impl MockActuators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.inner.lock().calls.clone()
    }

    pub fn pump_on(&self) -> bool {
        self.inner.lock().pump
    }

    pub fn fan_on(&self) -> bool {
        self.inner.lock().fan
    }

    /// Make every write to `actuator` fail until cleared.
    pub fn fail(&self, actuator: Option<Actuator>) {
        self.inner.lock().fail = actuator;
    }
}

impl ActuatorPort for MockActuators {
    fn set(&mut self, actuator: Actuator, on: bool) -> Result<(), ActuatorWriteError> {
        let mut relays = self.inner.lock();
        relays.calls.push(ActuatorCall { actuator, on });
        if relays.fail == Some(actuator) {
            return Err(ActuatorWriteError::Gpio);
        }
        match actuator {
            Actuator::Pump => relays.pump = on,
            Actuator::Fan => relays.fan = on,
        }
        Ok(())
    }
}

// ── Signals ───────────────────────────────────────────────────

/// Signal whose level a test flips directly.
#[derive(Clone, Default)]
pub struct MockSignal {
    level: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockSignal {
    pub fn new(level: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(level)),
        }
    }

    pub fn set(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
    }
}

impl SignalPort for MockSignal {
    fn read(&mut self) -> Result<bool, SignalReadError> {
        Ok(self.level.load(Ordering::SeqCst))
    }
}

/// Signal that replays a fixed script, then reports disconnection.
pub struct ScriptedSignal(pub VecDeque<Result<bool, SignalReadError>>);

impl SignalPort for ScriptedSignal {
    fn read(&mut self) -> Result<bool, SignalReadError> {
        self.0.pop_front().unwrap_or(Err(SignalReadError::Disconnected))
    }
}

// ── Persistence ───────────────────────────────────────────────

#[derive(Default)]
pub struct MemConfigStore {
    pub doc: Mutex<Option<Value>>,
    pub saves: Mutex<u32>,
}

impl ConfigPort for MemConfigStore {
    fn load(&self) -> Result<Option<Value>, PersistenceError> {
        Ok(self.doc.lock().clone())
    }

    fn save(&self, document: &Value) -> Result<(), PersistenceError> {
        *self.doc.lock() = Some(document.clone());
        *self.saves.lock() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemHistoryStore {
    pub samples: Mutex<Vec<HistorySample>>,
    pub saves: Mutex<u32>,
}

impl HistoryPort for MemHistoryStore {
    fn load(&self) -> Result<Vec<HistorySample>, PersistenceError> {
        Ok(self.samples.lock().clone())
    }

    fn save(&self, samples: &[HistorySample]) -> Result<(), PersistenceError> {
        *self.samples.lock() = samples.to_vec();
        *self.saves.lock() += 1;
        Ok(())
    }
}

// ── Events ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().push(event.clone());
    }
}

// ── Time helpers ──────────────────────────────────────────────

/// A fixed local wall-clock time on an arbitrary date.
#[allow(dead_code)]
pub fn local_at(hour: u32, minute: u32) -> DateTime<Local> {
    let naive = NaiveDate::from_ymd_opt(2024, 6, 3)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap();
    Local.from_local_datetime(&naive).earliest().unwrap()
}

/// Scratch directory under the system temp dir, emptied first.
#[allow(dead_code)]
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("diffuser_it_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
