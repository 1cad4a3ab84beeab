//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one line
//! through the `log` facade.  Faults go out at `warn`/`error`, everything
//! else at `info`.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                enabled,
                duty_cycle,
            } => {
                info!("START | enabled={enabled} | duty_cycle={duty_cycle}");
            }
            AppEvent::PhaseChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::ActuatorSwitched { actuator, on } => {
                info!("ACT | {actuator} {}", on_off(*on));
            }
            AppEvent::ActuatorFault {
                actuator,
                requested,
                error: e,
            } => {
                error!("ACT | {actuator} {} failed: {e}", on_off(*requested));
            }
            AppEvent::SignalChanged { active } => {
                info!("SIGNAL | HVAC {}", on_off(*active));
            }
            AppEvent::SignalFault(e) => {
                warn!("SIGNAL | read failed: {e}; keeping last value");
            }
            AppEvent::SettingsChanged(fields) => {
                info!("CONFIG | updated {}", fields.join(", "));
            }
            AppEvent::CountersReset => {
                info!("CONFIG | runtime counters reset");
            }
            AppEvent::Stopped => {
                info!("STOP | actuators released");
            }
        }
    }
}
