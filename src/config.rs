//! Configuration: the duty-cycle preset table, process settings, and the
//! partial settings update accepted from external callers.
//!
//! User-facing settings (enabled flag, preset, business hours, consumption
//! parameters) live in the shared [`ControlState`](crate::state::ControlState)
//! and are persisted through the [`ConfigPort`](crate::app::ports::ConfigPort).
//! Process settings ([`DaemonConfig`]) are fixed at startup.

use core::fmt;
use core::str::FromStr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ═══════════════════════════════════════════════════════════════
//  Duty-cycle presets
// ═══════════════════════════════════════════════════════════════

/// Fixed on/off timing presets, keyed by their serialized names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DutyCycle {
    #[serde(rename = "60s_240s")]
    On60Off240,
    #[default]
    #[serde(rename = "60s_120s")]
    On60Off120,
    #[serde(rename = "60s_90s")]
    On60Off90,
    #[serde(rename = "60s_60s")]
    On60Off60,
    #[serde(rename = "60s_45s")]
    On60Off45,
    #[serde(rename = "60s_30s")]
    On60Off30,
    #[serde(rename = "90s_30s")]
    On90Off30,
    #[serde(rename = "120s_30s")]
    On120Off30,
    #[serde(rename = "240s_30s")]
    On240Off30,
    #[serde(rename = "360s_30s")]
    On360Off30,
}

impl DutyCycle {
    /// Every preset, in display order.
    pub const ALL: [DutyCycle; 10] = [
        Self::On60Off240,
        Self::On60Off120,
        Self::On60Off90,
        Self::On60Off60,
        Self::On60Off45,
        Self::On60Off30,
        Self::On90Off30,
        Self::On120Off30,
        Self::On240Off30,
        Self::On360Off30,
    ];

    /// `(on_secs, off_secs)` for this preset.
    pub const fn timing(self) -> (u32, u32) {
        match self {
            Self::On60Off240 => (60, 240),
            Self::On60Off120 => (60, 120),
            Self::On60Off90 => (60, 90),
            Self::On60Off60 => (60, 60),
            Self::On60Off45 => (60, 45),
            Self::On60Off30 => (60, 30),
            Self::On90Off30 => (90, 30),
            Self::On120Off30 => (120, 30),
            Self::On240Off30 => (240, 30),
            Self::On360Off30 => (360, 30),
        }
    }

    pub const fn on_secs(self) -> u32 {
        self.timing().0
    }

    pub const fn off_secs(self) -> u32 {
        self.timing().1
    }

    /// The preset's key, e.g. `"60s_120s"`.
    pub const fn key(self) -> &'static str {
        match self {
            Self::On60Off240 => "60s_240s",
            Self::On60Off120 => "60s_120s",
            Self::On60Off90 => "60s_90s",
            Self::On60Off60 => "60s_60s",
            Self::On60Off45 => "60s_45s",
            Self::On60Off30 => "60s_30s",
            Self::On90Off30 => "90s_30s",
            Self::On120Off30 => "120s_30s",
            Self::On240Off30 => "240s_30s",
            Self::On360Off30 => "360s_30s",
        }
    }

    /// Look a preset up by key.  Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }
}

impl fmt::Display for DutyCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when parsing an unknown preset key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDutyCycle(pub String);

impl fmt::Display for UnknownDutyCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown duty cycle preset {:?}", self.0)
    }
}

impl std::error::Error for UnknownDutyCycle {}

impl FromStr for DutyCycle {
    type Err = UnknownDutyCycle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| UnknownDutyCycle(s.to_owned()))
    }
}

/// One row of the preset table, as exposed for discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetInfo {
    pub key: &'static str,
    pub on: u32,
    pub off: u32,
    pub label: String,
}

/// The full preset table for discovery.
pub fn duty_cycle_presets() -> Vec<PresetInfo> {
    DutyCycle::ALL
        .iter()
        .map(|d| {
            let (on, off) = d.timing();
            PresetInfo {
                key: d.key(),
                on,
                off,
                label: format!("{on}s / {off}s"),
            }
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════
//  Process settings
// ═══════════════════════════════════════════════════════════════

/// Process-level configuration, fixed for the lifetime of the daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Directory holding `config.json` and `history.json`.
    pub data_dir: PathBuf,
    /// HVAC monitor sampling period.
    pub monitor_interval: Duration,
    /// Duty-cycle controller tick period.
    pub control_interval: Duration,
    /// Signal confirmation window before duty cycling starts.
    pub arm_delay: Duration,
    /// History retention horizon.
    pub history_horizon: Duration,
    /// Flush history every this many successful samples.
    pub history_flush_every: u32,
    /// Deadline for a single signal read.
    pub signal_read_timeout: Duration,
    /// Value reported by the simulated signal when no GPIO backend is built.
    pub simulated_signal: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            monitor_interval: Duration::from_secs(5),
            control_interval: Duration::from_secs(1),
            arm_delay: Duration::from_secs(10),
            history_horizon: Duration::from_secs(24 * 3600),
            history_flush_every: 60, // ~5 min at 5 s sampling
            signal_read_timeout: Duration::from_secs(2),
            simulated_signal: true,
        }
    }
}

impl DaemonConfig {
    /// Defaults, overridden by `DIFFUSER_DATA_DIR` and
    /// `DIFFUSER_SIMULATED_SIGNAL` when set.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(dir) = std::env::var("DIFFUSER_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var("DIFFUSER_SIMULATED_SIGNAL") {
            match parse_flag(&raw) {
                Some(v) => cfg.simulated_signal = v,
                None => log::warn!("DIFFUSER_SIMULATED_SIGNAL={raw:?} not understood, keeping default"),
            }
        }
        cfg
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    /// Runtime credited per controller tick, in minutes.
    pub fn tick_quantum_minutes(&self) -> f64 {
        self.control_interval.as_secs_f64() / 60.0
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════
//  Partial settings update
// ═══════════════════════════════════════════════════════════════

/// A partial update of the user settings.  Fields that are absent or of
/// the wrong shape are `None` and leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub enabled: Option<bool>,
    pub duty_cycle: Option<DutyCycle>,
    pub business_hours_enabled: Option<bool>,
    pub business_hours_start: Option<String>,
    pub business_hours_end: Option<String>,
    pub consumption_rate_ml_per_hour: Option<f64>,
    pub reservoir_capacity_ml: Option<f64>,
}

impl SettingsUpdate {
    /// Extract an update from a JSON object.  Anything that is not an
    /// object yields an empty update.
    ///
    /// The consumption fields also accept the legacy keys
    /// `oil_usage_rate_ml_per_hour` and `oil_bottle_capacity_ml`.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let field = |keys: &[&str]| keys.iter().find_map(|k| obj.get(*k));

        Self {
            enabled: field(&["enabled"]).and_then(Value::as_bool),
            duty_cycle: field(&["duty_cycle"])
                .and_then(Value::as_str)
                .and_then(DutyCycle::from_key),
            business_hours_enabled: field(&["business_hours_enabled"]).and_then(Value::as_bool),
            business_hours_start: field(&["business_hours_start"])
                .and_then(Value::as_str)
                .map(str::to_owned),
            business_hours_end: field(&["business_hours_end"])
                .and_then(Value::as_str)
                .map(str::to_owned),
            consumption_rate_ml_per_hour: field(&[
                "consumption_rate_ml_per_hour",
                "oil_usage_rate_ml_per_hour",
            ])
            .and_then(non_negative_number),
            reservoir_capacity_ml: field(&["reservoir_capacity_ml", "oil_bottle_capacity_ml"])
                .and_then(non_negative_number),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Numbers and numeric strings that are finite and ≥ 0.
fn non_negative_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}
