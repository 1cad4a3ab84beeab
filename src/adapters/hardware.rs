//! Hardware adapter: bridges digital pins to the signal and actuator ports.
//!
//! The pin types are anything implementing the `embedded-hal` digital
//! traits: sysfs GPIO on the Pi (see [`super::sysfs`]), [`SimPin`] on a
//! host.  This is the only module that decides what a pin level means.
//!
//! [`TimeoutSignal`] wraps any signal port so a stuck read cannot hang the
//! monitor loop.  [`DetachedActuators`] and [`UnavailableSignal`] stand in
//! when hardware could not be initialised.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use log::{debug, error};

use crate::app::ports::{Actuator, ActuatorPort, SignalPort};
use crate::error::{ActuatorWriteError, SignalReadError};

// ── Signal input ──────────────────────────────────────────────

/// HVAC sense line read through a digital input.
pub struct GpioSignal<P: InputPin> {
    pin: P,
    active_low: bool,
}

impl<P: InputPin> GpioSignal<P> {
    /// The blower pulls the sense line LOW while running.
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }
}

impl<P: InputPin> SignalPort for GpioSignal<P> {
    fn read(&mut self) -> Result<bool, SignalReadError> {
        let high = self.pin.is_high().map_err(|e| {
            error!("signal: GPIO read failed: {e:?}");
            SignalReadError::Gpio
        })?;
        Ok(high != self.active_low)
    }
}

// ── Actuator outputs ──────────────────────────────────────────

/// Pump and fan relays, both active HIGH.
pub struct RelayBoard<P: OutputPin, F: OutputPin> {
    pump: P,
    fan: F,
}

impl<P: OutputPin, F: OutputPin> RelayBoard<P, F> {
    pub fn new(pump: P, fan: F) -> Self {
        Self { pump, fan }
    }
}

fn drive<O: OutputPin>(pin: &mut O, on: bool) -> Result<(), O::Error> {
    if on { pin.set_high() } else { pin.set_low() }
}

impl<P: OutputPin, F: OutputPin> ActuatorPort for RelayBoard<P, F> {
    fn set(&mut self, actuator: Actuator, on: bool) -> Result<(), ActuatorWriteError> {
        let result = match actuator {
            Actuator::Pump => drive(&mut self.pump, on).map_err(|e| format!("{e:?}")),
            Actuator::Fan => drive(&mut self.fan, on).map_err(|e| format!("{e:?}")),
        };
        result.map_err(|e| {
            error!("{actuator}: GPIO write failed: {e}");
            ActuatorWriteError::Gpio
        })
    }
}

// ── Degraded mode ─────────────────────────────────────────────

/// Actuator port used when the relay pins could not be claimed.
/// Every write fails, so the recorded state stays off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedActuators;

impl ActuatorPort for DetachedActuators {
    fn set(&mut self, _: Actuator, _: bool) -> Result<(), ActuatorWriteError> {
        Err(ActuatorWriteError::Detached)
    }
}

/// Signal port used when the sense pin could not be claimed.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSignal;

impl SignalPort for UnavailableSignal {
    fn read(&mut self) -> Result<bool, SignalReadError> {
        Err(SignalReadError::Disconnected)
    }
}

// ── Simulated pin ─────────────────────────────────────────────

/// In-memory digital pin for hosts without GPIO.  Clones share the level,
/// so a test or the simulator can drive an input or observe an output.
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    level: Arc<AtomicBool>,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(high)),
        }
    }

    pub fn level(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }

    pub fn set_level(&self, high: bool) {
        self.level.store(high, Ordering::Release);
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_level(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_level(true);
        Ok(())
    }
}

// ── Deadline-bounded reads ────────────────────────────────────

type Reply = Result<bool, SignalReadError>;

/// Runs reads of the wrapped port on a dedicated reader thread and gives
/// up after `timeout`.
///
/// While a timed-out read is still outstanding no new read is issued;
/// callers get [`SignalReadError::Timeout`] until the reader answers, and
/// that late answer is discarded.  The reader thread exits when this
/// handle is dropped.
pub struct TimeoutSignal {
    requests: Sender<()>,
    replies: Receiver<Reply>,
    timeout: Duration,
    outstanding: bool,
}

impl TimeoutSignal {
    pub fn spawn<S: SignalPort + Send + 'static>(mut inner: S, timeout: Duration) -> std::io::Result<Self> {
        let (requests, request_rx) = channel::bounded::<()>(1);
        let (reply_tx, replies) = channel::bounded::<Reply>(1);
        std::thread::Builder::new()
            .name("signal-reader".into())
            .spawn(move || {
                for () in request_rx.iter() {
                    if reply_tx.send(inner.read()).is_err() {
                        break;
                    }
                }
                debug!("signal reader: exiting");
            })?;
        Ok(Self {
            requests,
            replies,
            timeout,
            outstanding: false,
        })
    }
}

impl SignalPort for TimeoutSignal {
    fn read(&mut self) -> Result<bool, SignalReadError> {
        if self.outstanding {
            match self.replies.try_recv() {
                Ok(_stale) => self.outstanding = false,
                Err(TryRecvError::Empty) => return Err(SignalReadError::Timeout),
                Err(TryRecvError::Disconnected) => return Err(SignalReadError::Disconnected),
            }
        }

        match self.requests.try_send(()) {
            Ok(()) => {}
            Err(TrySendError::Full(())) => return Err(SignalReadError::Timeout),
            Err(TrySendError::Disconnected(())) => return Err(SignalReadError::Disconnected),
        }

        match self.replies.recv_timeout(self.timeout) {
            Ok(reply) => reply,
            Err(RecvTimeoutError::Timeout) => {
                self.outstanding = true;
                Err(SignalReadError::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => Err(SignalReadError::Disconnected),
        }
    }
}
