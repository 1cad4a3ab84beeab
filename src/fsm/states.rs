//! Concrete phase handler functions and table builder.
//!
//! Each phase is defined by plain `fn` pointers, no closures, no dynamic
//! dispatch.  The enabled flag and business-hours gate are enforced by the
//! controller before the table is consulted, so the handlers only ever
//! see an open gate.
//!
//! ```text
//!  IDLE ──[signal high]──▶ ARM_DELAY ──[held for arm delay]──▶ ON
//!    ▲                        │                               │  ▲
//!    │                  [signal low]                  [on_secs] [off_secs]
//!    │                        │                               ▼  │
//!    └────────────────────────┴──────────[signal low]──────── OFF
//!
//!  Any phase ──[disabled / outside business hours]──▶ IDLE
//! ```

use super::context::ControlContext;
use super::{Phase, StateDescriptor};
use log::debug;

// ═══════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════

/// Build the phase table.  Called once per controller.
pub fn build_state_table() -> [StateDescriptor; Phase::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: Phase::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: ArmDelay
        StateDescriptor {
            id: Phase::ArmDelay,
            name: "ArmDelay",
            on_enter: Some(arm_enter),
            on_exit: Some(arm_exit),
            on_update: arm_update,
        },
        // Index 2: On
        StateDescriptor {
            id: Phase::On,
            name: "On",
            on_enter: Some(on_enter),
            on_exit: None,
            on_update: on_update,
        },
        // Index 3: Off
        StateDescriptor {
            id: Phase::Off,
            name: "Off",
            on_enter: Some(off_enter),
            on_exit: None,
            on_update: off_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut ControlContext) {
    ctx.command_on = false;
    ctx.armed_at = None;
}

fn idle_update(ctx: &mut ControlContext) -> Option<Phase> {
    ctx.signal.then_some(Phase::ArmDelay)
}

// ═══════════════════════════════════════════════════════════════
//  ARM_DELAY: confirming the signal before cycling
// ═══════════════════════════════════════════════════════════════

fn arm_enter(ctx: &mut ControlContext) {
    ctx.command_on = false;
    ctx.armed_at = Some(ctx.now);
    debug!("ARM: signal high, confirming for {:?}", ctx.arm_delay);
}

fn arm_exit(ctx: &mut ControlContext) {
    ctx.armed_at = None;
}

fn arm_update(ctx: &mut ControlContext) -> Option<Phase> {
    if !ctx.signal {
        return Some(Phase::Idle);
    }
    (ctx.since_armed() >= ctx.arm_delay).then_some(Phase::On)
}

// ═══════════════════════════════════════════════════════════════
//  ON: actuators running
// ═══════════════════════════════════════════════════════════════

fn on_enter(ctx: &mut ControlContext) {
    ctx.command_on = true;
}

fn on_update(ctx: &mut ControlContext) -> Option<Phase> {
    if !ctx.signal {
        return Some(Phase::Idle);
    }
    (ctx.in_phase() >= ctx.on_duration()).then_some(Phase::Off)
}

// ═══════════════════════════════════════════════════════════════
//  OFF: resting between bursts
// ═══════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut ControlContext) {
    ctx.command_on = false;
}

fn off_update(ctx: &mut ControlContext) -> Option<Phase> {
    if !ctx.signal {
        return Some(Phase::Idle);
    }
    (ctx.in_phase() >= ctx.off_duration()).then_some(Phase::On)
}
