//! HVAC monitor: samples the blower signal into shared state and history.
//!
//! A pure sampler: arming and debounce live in the controller.  Every
//! successful read updates `signal_state`, appends a history sample, and
//! every `flush_every`-th sample the history is written out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, HistoryPort, SignalPort};
use crate::error::Result;
use crate::history::{HistorySample, SharedHistory};
use crate::state::SharedState;

/// Owns the signal port for the lifetime of the monitor loop.
pub struct HvacMonitor<S: SignalPort, H: HistoryPort, E: EventSink> {
    signal: S,
    store: Arc<H>,
    events: E,
    state: SharedState,
    history: SharedHistory,
    flush_every: u32,
    /// Successful samples since the last flush.
    since_flush: u32,
}

impl<S: SignalPort, H: HistoryPort, E: EventSink> HvacMonitor<S, H, E> {
    pub fn new(
        signal: S,
        store: Arc<H>,
        events: E,
        state: SharedState,
        history: SharedHistory,
        flush_every: u32,
    ) -> Self {
        Self {
            signal,
            store,
            events,
            state,
            history,
            flush_every: flush_every.max(1),
            since_flush: 0,
        }
    }

    /// Take one sample.  A failed read leaves the last known value in
    /// place and is returned; the next tick simply tries again.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let value = match self.signal.read() {
            Ok(v) => v,
            Err(e) => {
                self.events.emit(&AppEvent::SignalFault(e));
                return Err(e.into());
            }
        };

        let previous = self.state.set_signal(value);
        if previous != value {
            self.events.emit(&AppEvent::SignalChanged { active: value });
        }
        self.history.append(HistorySample::new(now, value));
        debug!("monitor: signal={value}");

        self.since_flush += 1;
        if self.since_flush >= self.flush_every {
            self.since_flush = 0;
            self.flush(now);
        }
        Ok(value)
    }

    /// Persist the retained history.  Failures are logged only.
    pub fn flush(&self, now: DateTime<Utc>) {
        let samples = self.history.compact(now);
        match self.store.save(&samples) {
            Ok(()) => debug!("monitor: flushed {} history samples", samples.len()),
            Err(e) => warn!("monitor: history flush failed: {e}"),
        }
    }
}
