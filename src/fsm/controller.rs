//! Duty-cycle controller: drives the phase machine from shared state and
//! applies its command to the actuators.
//!
//! One [`tick`](DutyCycleController::tick) per control period:
//!
//! 1. Snapshot shared state (signal, enabled flag, preset, gate window).
//! 2. Closed gate → force `Idle`; otherwise advance the phase machine.
//! 3. Apply the phase's command through guarded writes: an actuator is
//!    only written when its recorded state differs, and its recorded state
//!    only changes after the write succeeds.
//! 4. Credit one tick of runtime to every actuator recorded as on.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use super::context::ControlContext;
use super::{Fsm, Phase, states};
use crate::app::events::AppEvent;
use crate::app::ports::{Actuator, ActuatorPort, EventSink};
use crate::error::{ActuatorWriteError, Result};
use crate::state::SharedState;

/// Owns the actuator port for the lifetime of the control loop.
pub struct DutyCycleController<A: ActuatorPort, E: EventSink> {
    fsm: Fsm,
    ctx: ControlContext,
    actuators: A,
    events: E,
    state: SharedState,
    /// Runtime credited per tick, in minutes.
    quantum_minutes: f64,
    /// Last permanent fault reported per actuator, cleared by a
    /// successful write.
    reported: [Option<ActuatorWriteError>; 2],
}

impl<A: ActuatorPort, E: EventSink> DutyCycleController<A, E> {
    pub fn new(
        state: SharedState,
        actuators: A,
        events: E,
        arm_delay: Duration,
        quantum_minutes: f64,
        now: Instant,
    ) -> Self {
        let mut ctx = ControlContext::new(arm_delay, now);
        let mut fsm = Fsm::new(states::build_state_table(), Phase::Idle);
        fsm.start(&mut ctx);
        Self {
            fsm,
            ctx,
            actuators,
            events,
            state,
            quantum_minutes,
            reported: [None; 2],
        }
    }

    pub fn phase(&self) -> Phase {
        self.fsm.current_phase()
    }

    /// The wrapped actuator port.
    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    pub fn actuators_mut(&mut self) -> &mut A {
        &mut self.actuators
    }

    /// Announce start-up through the event sink.
    pub fn announce(&mut self) {
        let snap = self.state.snapshot();
        self.events.emit(&AppEvent::Started {
            enabled: snap.enabled,
            duty_cycle: snap.duty_cycle,
        });
    }

    /// Run one control tick.
    ///
    /// `now` drives phase timing; `wall` is used for the business-hours
    /// gate and actuator start timestamps.  Write failures are reported
    /// through the event sink and the first one is returned; the tick is
    /// otherwise complete and the next tick retries.
    pub fn tick(&mut self, now: Instant, wall: DateTime<Local>) -> Result<()> {
        let snap = self.state.snapshot();
        self.ctx.now = now;
        self.ctx.signal = snap.signal_state;
        self.ctx.duty_cycle = snap.duty_cycle;

        let from = self.fsm.current_phase();
        let gate_open = snap.enabled && snap.business_hours().admits(wall.time());
        if gate_open {
            self.fsm.tick(&mut self.ctx);
        } else {
            self.fsm.force_transition(Phase::Idle, &mut self.ctx);
        }
        let to = self.fsm.current_phase();
        if from != to {
            self.events.emit(&AppEvent::PhaseChanged { from, to });
        }

        let applied = self.apply(self.ctx.command_on, wall);
        self.state.accrue_runtime(self.quantum_minutes);
        applied
    }

    /// Force both actuators off and return to `Idle`.  Called when the
    /// control loop exits.
    pub fn shutdown(&mut self, now: Instant, wall: DateTime<Local>) -> Result<()> {
        self.ctx.now = now;
        let from = self.fsm.current_phase();
        self.fsm.force_transition(Phase::Idle, &mut self.ctx);
        if from != Phase::Idle {
            self.events.emit(&AppEvent::PhaseChanged {
                from,
                to: Phase::Idle,
            });
        }
        let result = self.apply(false, wall);
        self.events.emit(&AppEvent::Stopped);
        result
    }

    /// Guarded write of `on` to both actuators.  Both are attempted even
    /// if the first fails.
    fn apply(&mut self, on: bool, wall: DateTime<Local>) -> Result<()> {
        let mut first_err: Option<ActuatorWriteError> = None;
        for actuator in Actuator::ALL {
            if self.state.actuator_on(actuator) == on {
                continue;
            }
            // No lock is held across the hardware write.
            let reported = &mut self.reported[actuator as usize];
            match self.actuators.set(actuator, on) {
                Ok(()) => {
                    *reported = None;
                    self.state.record_actuator(actuator, on, wall);
                    self.events.emit(&AppEvent::ActuatorSwitched { actuator, on });
                }
                Err(error) => {
                    // A permanent fault is reported once, not every tick.
                    if *reported != Some(error) {
                        self.events.emit(&AppEvent::ActuatorFault {
                            actuator,
                            requested: on,
                            error,
                        });
                    }
                    *reported = error.is_permanent().then_some(error);
                    first_err.get_or_insert(error);
                }
            }
        }
        first_err.map_or(Ok(()), |e| Err(e.into()))
    }
}
