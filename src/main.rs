//! Diffuser daemon: entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioSignal/TimeoutSignal  RelayBoard   JsonConfigFile         │
//! │  (SignalPort)              (Actuator)   JsonHistoryFile        │
//! │  LogEventSink (EventSink)  SystemClock (TimePort)              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  HvacMonitor (5 s)      DutyCycleController (1 s)      │    │
//! │  │        └──── SharedState · SharedHistory ────┘         │    │
//! │  │                   ControlService                       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};

use diffuser::adapters::file_store::{JsonConfigFile, JsonHistoryFile};
use diffuser::adapters::hardware::TimeoutSignal;
use diffuser::adapters::log_sink::LogEventSink;
use diffuser::adapters::signals;
use diffuser::adapters::time::SystemClock;
use diffuser::app::ports::{ActuatorPort, SignalPort};
use diffuser::app::service::ControlService;
use diffuser::config::DaemonConfig;
use diffuser::runtime::{Runtime, Wiring};

type BoxedSignal = Box<dyn SignalPort + Send>;
type BoxedActuators = Box<dyn ActuatorPort + Send>;

// ── Hardware ──────────────────────────────────────────────────

/// Claim the sysfs GPIO lines.  Whatever cannot be claimed is replaced
/// by a degraded stand-in so the daemon still runs and reports status.
#[cfg(feature = "sysfs")]
fn open_hardware(_cfg: &DaemonConfig) -> (BoxedSignal, BoxedActuators) {
    use diffuser::adapters::hardware::{DetachedActuators, GpioSignal, RelayBoard, UnavailableSignal};
    use diffuser::adapters::sysfs::SysfsPin;
    use diffuser::pins::{FAN_GPIO, HVAC_SENSE_GPIO, PUMP_GPIO};
    use log::error;

    let actuators: BoxedActuators = match (SysfsPin::output(PUMP_GPIO), SysfsPin::output(FAN_GPIO)) {
        (Ok(pump), Ok(fan)) => Box::new(RelayBoard::new(pump, fan)),
        (pump, fan) => {
            for e in [pump.err(), fan.err()].into_iter().flatten() {
                error!("relay init failed: {e}");
            }
            warn!("actuators detached, running without output");
            Box::new(DetachedActuators)
        }
    };

    let signal: BoxedSignal = match SysfsPin::input(HVAC_SENSE_GPIO) {
        Ok(pin) => Box::new(GpioSignal::active_low(pin)),
        Err(e) => {
            error!("HVAC sense init failed: {e}");
            warn!("signal unavailable, the controller will stay idle");
            Box::new(UnavailableSignal)
        }
    };

    (signal, actuators)
}

/// Simulated pins: the sense line holds the configured level and the
/// relays are in-memory.
#[cfg(not(feature = "sysfs"))]
fn open_hardware(cfg: &DaemonConfig) -> (BoxedSignal, BoxedActuators) {
    use diffuser::adapters::hardware::{GpioSignal, RelayBoard, SimPin};

    info!(
        "no GPIO backend built in, simulating (HVAC {})",
        if cfg.simulated_signal { "running" } else { "off" }
    );
    // Active-low sense line: LOW while the blower runs.
    let sense = SimPin::new(!cfg.simulated_signal);
    (
        Box::new(GpioSignal::active_low(sense)),
        Box::new(RelayBoard::new(SimPin::default(), SimPin::default())),
    )
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("diffuser v{}", env!("CARGO_PKG_VERSION"));

    let cfg = DaemonConfig::from_env();
    info!("data directory: {}", cfg.data_dir.display());

    let service = ControlService::load(
        &cfg,
        JsonConfigFile::new(cfg.config_path()),
        Arc::new(JsonHistoryFile::new(cfg.history_path())),
        LogEventSink,
        Utc::now(),
    );

    signals::install().context("installing SIGINT/SIGTERM handlers")?;

    let (signal, actuators) = open_hardware(&cfg);
    let signal = TimeoutSignal::spawn(signal, cfg.signal_read_timeout).context("starting signal reader")?;

    let mut runtime = Runtime::spawn(
        &cfg,
        Wiring {
            signal,
            actuators,
            history_store: service.history_store(),
            events: LogEventSink,
            clock: SystemClock,
            state: service.state(),
            history: service.history_handle(),
        },
    )
    .context("starting control loops")?;

    signals::wait_for_termination(&runtime.stop_signal(), Duration::from_millis(250));

    info!("shutting down");
    runtime.shutdown();
    if let Err(e) = service.flush(Utc::now()) {
        warn!("final flush incomplete: {e}");
    }
    info!("shutdown complete");
    Ok(())
}
