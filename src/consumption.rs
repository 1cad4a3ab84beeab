//! Oil consumption estimate.
//!
//! Projects used and remaining oil from the pump's accumulated runtime.
//! The pump is what draws oil through the nebulizer, so fan runtime does
//! not count.

use serde::Serialize;

/// Used / remaining oil projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsumptionEstimate {
    pub used_ml: f64,
    pub remaining_ml: f64,
    /// Remaining as a share of capacity, 0–100.  Zero when capacity is zero.
    pub percentage: f64,
}

impl ConsumptionEstimate {
    /// Estimate from pump runtime, consumption rate and bottle capacity.
    pub fn from_runtime(pump_runtime_minutes: f64, rate_ml_per_hour: f64, capacity_ml: f64) -> Self {
        let used_ml = pump_runtime_minutes / 60.0 * rate_ml_per_hour;
        let remaining_ml = (capacity_ml - used_ml).max(0.0);
        let percentage = if capacity_ml > 0.0 {
            remaining_ml / capacity_ml * 100.0
        } else {
            0.0
        };
        Self {
            used_ml,
            remaining_ml,
            percentage,
        }
    }

    /// The same estimate rounded to one decimal place, as reported.
    pub fn rounded(self) -> Self {
        Self {
            used_ml: round1(self.used_ml),
            remaining_ml: round1(self.remaining_ml),
            percentage: round1(self.percentage),
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
