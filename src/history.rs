//! Time-windowed history of HVAC signal samples.
//!
//! Samples are appended in time order and evicted lazily once they fall
//! behind the retention horizon.  [`SharedHistory`] is the lock-guarded
//! handle shared by the monitor (writer) and status callers (readers).

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One sampled signal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySample {
    pub timestamp: DateTime<Utc>,
    pub signal_state: bool,
}

impl HistorySample {
    pub fn new(timestamp: DateTime<Utc>, signal_state: bool) -> Self {
        Self {
            timestamp,
            signal_state,
        }
    }
}

/// Ordered, horizon-bounded sample buffer.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<HistorySample>,
    horizon: TimeDelta,
}

impl HistoryBuffer {
    pub fn new(horizon: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            horizon: TimeDelta::from_std(horizon).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Rebuild from persisted samples, keeping only those inside the
    /// horizon relative to `now`.
    pub fn restore(horizon: Duration, mut samples: Vec<HistorySample>, now: DateTime<Utc>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        let mut buf = Self::new(horizon);
        buf.samples = samples.into();
        buf.evict(now);
        buf
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.horizon)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Append a sample and evict anything older than the horizon relative
    /// to the sample's own timestamp.
    pub fn append(&mut self, sample: HistorySample) {
        self.samples.push_back(sample);
        self.evict(sample.timestamp);
    }

    /// Drop samples older than `now - horizon`.  Order is preserved.
    pub fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = self.cutoff(now);
        while self.samples.front().is_some_and(|s| s.timestamp < cutoff) {
            self.samples.pop_front();
        }
    }

    /// The retained samples, filtered to the horizon at `now`.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<HistorySample> {
        let cutoff = self.cutoff(now);
        self.samples
            .iter()
            .filter(|s| s.timestamp >= cutoff)
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Cloneable, lock-guarded handle to the one [`HistoryBuffer`].
#[derive(Debug, Clone)]
pub struct SharedHistory {
    inner: Arc<Mutex<HistoryBuffer>>,
}

impl SharedHistory {
    pub fn new(buffer: HistoryBuffer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }

    pub fn append(&self, sample: HistorySample) {
        self.inner.lock().append(sample);
    }

    /// Evict expired samples, then return what is left.  Used on the
    /// persistence path so the stored file never grows past the horizon.
    pub fn compact(&self, now: DateTime<Utc>) -> Vec<HistorySample> {
        let mut buf = self.inner.lock();
        buf.evict(now);
        buf.snapshot(now)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<HistorySample> {
        self.inner.lock().snapshot(now)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
