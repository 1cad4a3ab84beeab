//! Shared control state: the single source of truth read by every
//! component.
//!
//! [`ControlState`] holds both the user settings and the live status.
//! [`SharedState`] is the cloneable handle injected into the monitor, the
//! controller and the service; it guards the record with one coarse lock
//! and only exposes whole-record snapshots plus a small set of mutations,
//! each of which runs inside a single critical section.  That keeps every
//! `*_on` / `*_started_at` pair consistent for any reader.

use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::app::ports::Actuator;
use crate::config::{DutyCycle, SettingsUpdate};
use crate::gate::BusinessHours;

/// Settings and live status of the diffuser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    // --- Settings ---
    /// Master switch.
    pub enabled: bool,
    /// Active on/off timing preset.
    pub duty_cycle: DutyCycle,
    pub business_hours_enabled: bool,
    /// Window start as entered (`HH:MM`).  Parsed by the gate.
    pub business_hours_start: String,
    /// Window end as entered (`HH:MM`).  Parsed by the gate.
    pub business_hours_end: String,
    /// Oil consumed per hour of pump runtime.
    pub consumption_rate_ml_per_hour: f64,
    /// Bottle capacity.
    pub reservoir_capacity_ml: f64,

    // --- Live status ---
    /// Last sampled HVAC blower state.
    pub signal_state: bool,
    pub pump_on: bool,
    pub fan_on: bool,
    pub pump_runtime_minutes: f64,
    pub fan_runtime_minutes: f64,
    /// Set iff `pump_on`.
    pub pump_started_at: Option<DateTime<Local>>,
    /// Set iff `fan_on`.
    pub fan_started_at: Option<DateTime<Local>>,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            enabled: false,
            duty_cycle: DutyCycle::default(),
            business_hours_enabled: false,
            business_hours_start: "09:00".to_owned(),
            business_hours_end: "17:00".to_owned(),
            consumption_rate_ml_per_hour: 10.0,
            reservoir_capacity_ml: 500.0,
            signal_state: false,
            pump_on: false,
            fan_on: false,
            pump_runtime_minutes: 0.0,
            fan_runtime_minutes: 0.0,
            pump_started_at: None,
            fan_started_at: None,
        }
    }
}

impl ControlState {
    /// The configured business-hours window.
    pub fn business_hours(&self) -> BusinessHours<'_> {
        BusinessHours {
            enabled: self.business_hours_enabled,
            start: &self.business_hours_start,
            end: &self.business_hours_end,
        }
    }

    pub fn actuator_on(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::Pump => self.pump_on,
            Actuator::Fan => self.fan_on,
        }
    }

    /// Record a successful actuator write.  The flag and its start time
    /// change together; a start time already present is kept.
    fn set_actuator(&mut self, actuator: Actuator, on: bool, at: DateTime<Local>) {
        let (flag, started) = match actuator {
            Actuator::Pump => (&mut self.pump_on, &mut self.pump_started_at),
            Actuator::Fan => (&mut self.fan_on, &mut self.fan_started_at),
        };
        *flag = on;
        *started = if on { started.or(Some(at)) } else { None };
    }

    /// Credit one tick of runtime to every actuator that is on.
    fn accrue(&mut self, quantum_minutes: f64) {
        if self.pump_on {
            self.pump_runtime_minutes += quantum_minutes;
        }
        if self.fan_on {
            self.fan_runtime_minutes += quantum_minutes;
        }
    }

    /// Zero both accumulators.  An actuator that is still on restarts its
    /// start time at `now` so `*_on == *_started_at.is_some()` holds.
    fn reset_counters(&mut self, now: DateTime<Local>) {
        self.pump_runtime_minutes = 0.0;
        self.fan_runtime_minutes = 0.0;
        self.pump_started_at = self.pump_on.then_some(now);
        self.fan_started_at = self.fan_on.then_some(now);
    }

    /// Apply a partial settings update.  Returns the names of the fields
    /// that were present and accepted.
    pub fn apply(&mut self, update: &SettingsUpdate) -> Vec<&'static str> {
        let mut applied = Vec::new();
        if let Some(v) = update.enabled {
            self.enabled = v;
            applied.push("enabled");
        }
        if let Some(v) = update.duty_cycle {
            self.duty_cycle = v;
            applied.push("duty_cycle");
        }
        if let Some(v) = update.business_hours_enabled {
            self.business_hours_enabled = v;
            applied.push("business_hours_enabled");
        }
        if let Some(v) = &update.business_hours_start {
            self.business_hours_start.clone_from(v);
            applied.push("business_hours_start");
        }
        if let Some(v) = &update.business_hours_end {
            self.business_hours_end.clone_from(v);
            applied.push("business_hours_end");
        }
        if let Some(v) = update.consumption_rate_ml_per_hour {
            self.consumption_rate_ml_per_hour = v;
            applied.push("consumption_rate_ml_per_hour");
        }
        if let Some(v) = update.reservoir_capacity_ml {
            self.reservoir_capacity_ml = v;
            applied.push("reservoir_capacity_ml");
        }
        applied
    }

    /// The persisted document: settings plus runtime counters.  Live
    /// fields are left out.
    pub fn persisted(&self) -> Value {
        json!({
            "enabled": self.enabled,
            "duty_cycle": self.duty_cycle,
            "business_hours_enabled": self.business_hours_enabled,
            "business_hours_start": self.business_hours_start,
            "business_hours_end": self.business_hours_end,
            "consumption_rate_ml_per_hour": self.consumption_rate_ml_per_hour,
            "reservoir_capacity_ml": self.reservoir_capacity_ml,
            "pump_runtime_minutes": self.pump_runtime_minutes,
            "fan_runtime_minutes": self.fan_runtime_minutes,
        })
    }

    /// Overlay persisted values on top of this state.
    ///
    /// Settings go through the same validation as live updates; runtime
    /// counters are restored when they are non-negative numbers.  Live
    /// fields (signal, actuator flags, start times) are never restored.
    pub fn overlay_persisted(&mut self, persisted: &Value) {
        self.apply(&SettingsUpdate::from_json(persisted));
        let counter = |key: &str| {
            persisted
                .get(key)
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite() && *v >= 0.0)
        };
        if let Some(v) = counter("pump_runtime_minutes") {
            self.pump_runtime_minutes = v;
        }
        if let Some(v) = counter("fan_runtime_minutes") {
            self.fan_runtime_minutes = v;
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Shared handle
// ═══════════════════════════════════════════════════════════════

/// Cloneable, lock-guarded handle to the one [`ControlState`].
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<ControlState>>,
}

impl SharedState {
    pub fn new(state: ControlState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// A consistent copy of the whole record.
    pub fn snapshot(&self) -> ControlState {
        self.inner.lock().clone()
    }

    /// Last sampled signal value.
    pub fn signal(&self) -> bool {
        self.inner.lock().signal_state
    }

    /// Store a new signal sample.  Returns the previous value.
    pub fn set_signal(&self, value: bool) -> bool {
        core::mem::replace(&mut self.inner.lock().signal_state, value)
    }

    pub fn actuator_on(&self, actuator: Actuator) -> bool {
        self.inner.lock().actuator_on(actuator)
    }

    /// Record that `actuator` was successfully switched.
    pub fn record_actuator(&self, actuator: Actuator, on: bool, at: DateTime<Local>) {
        self.inner.lock().set_actuator(actuator, on, at);
    }

    /// Credit one controller tick of runtime to the running actuators.
    pub fn accrue_runtime(&self, quantum_minutes: f64) {
        self.inner.lock().accrue(quantum_minutes);
    }

    /// Apply a partial settings update; see [`ControlState::apply`].
    pub fn apply_settings(&self, update: &SettingsUpdate) -> Vec<&'static str> {
        self.inner.lock().apply(update)
    }

    /// Zero both runtime accumulators.
    pub fn reset_counters(&self, now: DateTime<Local>) {
        self.inner.lock().reset_counters(now);
    }
}
