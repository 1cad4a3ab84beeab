//! Application service: the boundary external callers talk to.
//!
//! [`ControlService`] owns the shared state and history handles plus the
//! persistence ports.  It loads persisted settings at start, answers
//! status and history queries, applies settings updates, resets the
//! runtime counters, and flushes everything at shutdown.  The periodic
//! loops get clones of the same handles via [`ControlService::state`] and
//! [`ControlService::history_handle`].
//!
//! ```text
//!  caller ──▶ ┌────────────────────────┐ ──▶ ConfigPort / HistoryPort
//!             │     ControlService      │
//!             │  SharedState · History  │ ──▶ EventSink
//!             └────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::config::{DaemonConfig, PresetInfo, SettingsUpdate, duty_cycle_presets};
use crate::consumption::ConsumptionEstimate;
use crate::error::{PersistenceError, Result};
use crate::history::{HistoryBuffer, HistorySample, SharedHistory};
use crate::state::{ControlState, SharedState};

use super::events::AppEvent;
use super::ports::{ConfigPort, EventSink, HistoryPort};

/// Read-only status: the shared state plus the consumption projection,
/// rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    #[serde(flatten)]
    pub state: ControlState,
    #[serde(flatten)]
    pub consumption: ConsumptionEstimate,
}

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

pub struct ControlService<C: ConfigPort, H: HistoryPort, E: EventSink> {
    state: SharedState,
    history: SharedHistory,
    config_store: C,
    history_store: Arc<H>,
    events: Mutex<E>,
    /// Held across snapshot and save so saves land in snapshot order.
    persist: Mutex<()>,
}

impl<C: ConfigPort, H: HistoryPort, E: EventSink> ControlService<C, H, E> {
    /// Build the service from defaults overlaid by whatever was persisted.
    ///
    /// Persistence errors are logged and start-up continues with
    /// defaults; live fields always start cleared.
    pub fn load(cfg: &DaemonConfig, config_store: C, history_store: Arc<H>, events: E, now: DateTime<Utc>) -> Self {
        let mut state = ControlState::default();
        match config_store.load() {
            Ok(Some(doc)) => {
                state.overlay_persisted(&doc);
                info!(
                    "settings loaded: enabled={} duty_cycle={}",
                    state.enabled, state.duty_cycle
                );
            }
            Ok(None) => info!("no stored settings, using defaults"),
            Err(e) => warn!("could not load settings, using defaults: {e}"),
        }

        let samples = history_store.load().unwrap_or_else(|e| {
            warn!("could not load history, starting empty: {e}");
            Vec::new()
        });
        let buffer = HistoryBuffer::restore(cfg.history_horizon, samples, now);
        info!("history loaded: {} samples", buffer.len());

        Self {
            state: SharedState::new(state),
            history: SharedHistory::new(buffer),
            config_store,
            history_store,
            events: Mutex::new(events),
            persist: Mutex::new(()),
        }
    }

    /// Handle to the shared state for the periodic loops.
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Handle to the history buffer for the monitor loop.
    pub fn history_handle(&self) -> SharedHistory {
        self.history.clone()
    }

    /// The history port, shared with the monitor loop.
    pub fn history_store(&self) -> Arc<H> {
        Arc::clone(&self.history_store)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Snapshot of settings and live status with the consumption estimate.
    pub fn status(&self) -> StatusReport {
        let state = self.state.snapshot();
        let consumption = ConsumptionEstimate::from_runtime(
            state.pump_runtime_minutes,
            state.consumption_rate_ml_per_hour,
            state.reservoir_capacity_ml,
        )
        .rounded();
        StatusReport { state, consumption }
    }

    /// Samples inside the retention horizon at `now`.
    pub fn history(&self, now: DateTime<Utc>) -> Vec<HistorySample> {
        self.history.snapshot(now)
    }

    /// The preset table for discovery.
    pub fn duty_cycles(&self) -> Vec<PresetInfo> {
        duty_cycle_presets()
    }

    // ── Mutations ─────────────────────────────────────────────

    /// Apply a partial settings update from a JSON object.  Unknown,
    /// malformed and out-of-range values are ignored.  Accepted changes
    /// are persisted.  Returns the names of the accepted fields.
    pub fn apply_settings(&self, body: &Value) -> Vec<&'static str> {
        let update = SettingsUpdate::from_json(body);
        if update.is_empty() {
            return Vec::new();
        }
        let applied = self.state.apply_settings(&update);
        self.events.lock().emit(&AppEvent::SettingsChanged(applied.clone()));
        self.save_settings();
        applied
    }

    /// Zero both runtime counters and persist.
    pub fn reset_counters(&self, now: DateTime<Local>) {
        self.state.reset_counters(now);
        self.events.lock().emit(&AppEvent::CountersReset);
        self.save_settings();
    }

    /// Persist settings, counters and history.  Both are attempted; the
    /// first failure is returned.
    pub fn flush(&self, now: DateTime<Utc>) -> Result<()> {
        let settings = self.persist_settings();
        let history = self.history_store.save(&self.history.compact(now));
        settings?;
        history?;
        Ok(())
    }

    fn save_settings(&self) {
        if let Err(e) = self.persist_settings() {
            warn!("could not persist settings: {e}");
        }
    }

    fn persist_settings(&self) -> core::result::Result<(), PersistenceError> {
        let _guard = self.persist.lock();
        self.config_store.save(&self.state.snapshot().persisted())
    }
}
