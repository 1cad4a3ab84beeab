//! Function-pointer finite state machine for the duty cycle.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌──────────┬───────────┬──────────┬───────────────────┐ │
//! │  │ Phase    │ on_enter  │ on_exit  │ on_update         │ │
//! │  ├──────────┼───────────┼──────────┼───────────────────┤ │
//! │  │ Idle     │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ ArmDelay │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │ │
//! │  │ On       │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Off      │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  └──────────┴───────────┴──────────┴───────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** phase.
//! If it returns `Some(next)`, the engine runs `on_exit` for the current
//! phase, stamps the entry time, then runs `on_enter` for the next.  All
//! functions receive `&mut ControlContext`.
//!
//! [`controller::DutyCycleController`] drives the engine from shared
//! state and applies the resulting command to the actuators.

pub mod context;
pub mod controller;
pub mod states;

use context::ControlContext;
use log::debug;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// Duty-cycle phases.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Phase {
    Idle = 0,
    ArmDelay = 1,
    On = 2,
    Off = 3,
}

impl Phase {
    /// Total number of phases; sizes the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `Phase`.  Out-of-range falls back to
    /// `Idle`, the phase with every actuator off.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::ArmDelay,
            2 => Self::On,
            3 => Self::Off,
            _ => {
                debug_assert!(false, "invalid phase index: {idx}");
                Self::Idle
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit` actions, run once per transition.
pub type StateActionFn = fn(&mut ControlContext);

/// Per-tick handler.  `Some(next)` triggers a transition.
pub type StateUpdateFn = fn(&mut ControlContext) -> Option<Phase>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct StateDescriptor {
    pub id: Phase,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Indexed by `Phase as usize`.
    table: [StateDescriptor; Phase::COUNT],
    current: usize,
    tick_count: u64,
    /// Tick at which the current phase was entered.
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; Phase::COUNT], initial: Phase) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter`.  Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut ControlContext) {
        debug!("FSM starting in phase: {}", self.table[self.current].name);
        ctx.phase_entered_at = ctx.now;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance by one tick: run `on_update` for the current phase and
    /// perform the transition it asks for, if any.
    pub fn tick(&mut self, ctx: &mut ControlContext) {
        self.tick_count += 1;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Transition immediately, regardless of what `on_update` would say.
    /// A no-op when already in `next`.
    pub fn force_transition(&mut self, next: Phase, ctx: &mut ControlContext) {
        self.tick_count += 1;
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_phase(&self) -> Phase {
        Phase::from_index(self.current)
    }

    /// Ticks spent in the current phase.
    pub fn ticks_in_current_phase(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: Phase, ctx: &mut ControlContext) {
        let next_idx = next_id as usize;

        debug!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.phase_entered_at = ctx.now;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
