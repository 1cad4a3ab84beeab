//! Runtime supervisor: the two periodic loops and their shutdown.
//!
//! ```text
//!   main ──spawn──▶ monitor thread    (5 s)  ── HvacMonitor::tick
//!        └─spawn──▶ controller thread (1 s)  ── DutyCycleController::tick
//!   main ──raise──▶ StopSignal ──wakes──▶ both threads exit, join
//! ```
//!
//! Each thread owns its hardware capability object; it is dropped when the
//! thread exits, on every exit path.  Loops are scheduled against absolute
//! deadlines so a slow tick does not accumulate drift.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::app::ports::{ActuatorPort, EventSink, HistoryPort, SignalPort, TimePort};
use crate::config::DaemonConfig;
use crate::error::Result;
use crate::fsm::controller::DutyCycleController;
use crate::history::SharedHistory;
use crate::monitor::HvacMonitor;
use crate::state::SharedState;

// ═══════════════════════════════════════════════════════════════
//  Stop signal
// ═══════════════════════════════════════════════════════════════

/// Cloneable stop flag that also wakes sleeping loops.
///
/// Raising drops the only sender, which disconnects every receiver at
/// once.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<Mutex<Option<Sender<()>>>>,
    rx: Receiver<()>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, rx) = channel::bounded(0);
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
            rx,
        }
    }

    /// Ask every loop to stop.  Idempotent.
    pub fn raise(&self) {
        self.tx.lock().take();
    }

    pub fn is_raised(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleep until `deadline` or until stop is raised.  Returns `true` if
    /// stop was raised.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        !matches!(self.rx.recv_deadline(deadline), Err(RecvTimeoutError::Timeout))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Periodic loop
// ═══════════════════════════════════════════════════════════════

/// Call `tick` every `interval` until `stop` is raised.  The first tick
/// runs immediately.  Tick errors are logged and the schedule continues.
pub fn run_periodic<F>(name: &str, interval: Duration, stop: &StopSignal, mut tick: F)
where
    F: FnMut() -> Result<()>,
{
    info!("{name}: running every {interval:?}");
    let mut next = Instant::now();
    while !stop.is_raised() {
        let started = Instant::now();
        if let Err(e) = tick() {
            debug!("{name}: tick failed: {e}");
        }

        next += interval;
        let now = Instant::now();
        if now > next {
            warn!(
                "{name}: tick overran its {interval:?} period ({:?}), re-anchoring",
                now - started
            );
            next = now;
        }
        if stop.wait_until(next) {
            break;
        }
    }
    info!("{name}: stopped");
}

// ═══════════════════════════════════════════════════════════════
//  Runtime
// ═══════════════════════════════════════════════════════════════

/// Everything the two loops need, handed over at spawn time.
pub struct Wiring<S, A, H, E, T> {
    pub signal: S,
    pub actuators: A,
    pub history_store: Arc<H>,
    pub events: E,
    pub clock: T,
    pub state: SharedState,
    pub history: SharedHistory,
}

/// Handles to the running monitor and controller threads.
pub struct Runtime {
    stop: StopSignal,
    threads: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Start the monitor and controller threads.
    pub fn spawn<S, A, H, E, T>(cfg: &DaemonConfig, wiring: Wiring<S, A, H, E, T>) -> std::io::Result<Self>
    where
        S: SignalPort + Send + 'static,
        A: ActuatorPort + Send + 'static,
        H: HistoryPort + Send + Sync + 'static,
        E: EventSink + Clone + Send + 'static,
        T: TimePort + Clone + Send + 'static,
    {
        let Wiring {
            signal,
            actuators,
            history_store,
            events,
            clock,
            state,
            history,
        } = wiring;
        let mut runtime = Self {
            stop: StopSignal::new(),
            threads: Vec::with_capacity(2),
        };

        let monitor = {
            let stop = runtime.stop.clone();
            let clock = clock.clone();
            let interval = cfg.monitor_interval;
            let mut monitor = HvacMonitor::new(
                signal,
                history_store,
                events.clone(),
                state.clone(),
                history,
                cfg.history_flush_every,
            );
            std::thread::Builder::new()
                .name("hvac-monitor".into())
                .spawn(move || {
                    run_periodic("monitor", interval, &stop, || {
                        monitor.tick(clock.wall().with_timezone(&Utc)).map(|_| ())
                    });
                })?
        };
        runtime.threads.push(monitor);

        let controller = {
            let stop = runtime.stop.clone();
            let interval = cfg.control_interval;
            let mut controller = DutyCycleController::new(
                state,
                actuators,
                events,
                cfg.arm_delay,
                cfg.tick_quantum_minutes(),
                clock.monotonic(),
            );
            std::thread::Builder::new()
                .name("duty-cycle".into())
                .spawn(move || {
                    controller.announce();
                    run_periodic("controller", interval, &stop, || {
                        controller.tick(clock.monotonic(), clock.wall())
                    });
                    if let Err(e) = controller.shutdown(clock.monotonic(), clock.wall()) {
                        error!("controller: failed to switch actuators off on exit: {e}");
                    }
                })
        };
        match controller {
            Ok(handle) => runtime.threads.push(handle),
            Err(e) => {
                runtime.shutdown();
                return Err(e);
            }
        }

        Ok(runtime)
    }

    /// A handle that can stop this runtime from elsewhere.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Raise the stop signal and join both threads.  Idempotent.
    pub fn shutdown(&mut self) {
        self.stop.raise();
        for handle in self.threads.drain(..) {
            let name = handle.thread().name().unwrap_or("loop").to_owned();
            if handle.join().is_err() {
                error!("{name}: thread panicked");
            }
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
