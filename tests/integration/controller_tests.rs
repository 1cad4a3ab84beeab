//! Duty-cycle controller driven tick by tick against mock actuators.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, TimeDelta};
use diffuser::app::events::AppEvent;
use diffuser::app::ports::Actuator;
use diffuser::config::{DutyCycle, SettingsUpdate};
use diffuser::fsm::Phase;
use diffuser::fsm::controller::DutyCycleController;
use diffuser::state::SharedState;

use crate::mock_hw::{ActuatorCall, MockActuators, RecordingSink, local_at};

struct Bench {
    ctl: DutyCycleController<MockActuators, RecordingSink>,
    hw: MockActuators,
    sink: RecordingSink,
    state: SharedState,
    t0: Instant,
    wall0: DateTime<Local>,
}

impl Bench {
    fn new(wall0: DateTime<Local>) -> Self {
        let state = SharedState::default();
        state.apply_settings(&SettingsUpdate {
            enabled: Some(true),
            ..SettingsUpdate::default()
        });
        let hw = MockActuators::new();
        let sink = RecordingSink::default();
        let t0 = Instant::now();
        let ctl = DutyCycleController::new(
            state.clone(),
            hw.clone(),
            sink.clone(),
            Duration::from_secs(10),
            1.0 / 60.0,
            t0,
        );
        Self {
            ctl,
            hw,
            sink,
            state,
            t0,
            wall0,
        }
    }

    fn tick(&mut self, secs: u64) {
        let _ = self.ctl.tick(
            self.t0 + Duration::from_secs(secs),
            self.wall0 + TimeDelta::seconds(secs as i64),
        );
    }

    fn update(&self, update: SettingsUpdate) {
        self.state.apply_settings(&update);
    }
}

fn both(on: bool) -> [ActuatorCall; 2] {
    [
        ActuatorCall {
            actuator: Actuator::Pump,
            on,
        },
        ActuatorCall {
            actuator: Actuator::Fan,
            on,
        },
    ]
}

#[test]
fn preset_60_120_cycles_after_arm_delay() {
    let mut b = Bench::new(local_at(12, 0));
    b.state.set_signal(true);

    let mut on_ticks = Vec::new();
    for s in 0..430 {
        b.tick(s);
        assert_eq!(b.hw.pump_on(), b.hw.fan_on(), "pump and fan move together");
        if b.hw.pump_on() {
            on_ticks.push(s);
        }
    }

    // Arm 0..10, ON 10..70, OFF 70..190, ON 190..250, OFF 250..370, ON 370..430
    let expected: Vec<u64> = (10..70).chain(190..250).chain(370..430).collect();
    assert_eq!(on_ticks, expected);

    // Each write happens exactly once per transition.
    let calls = b.hw.calls();
    assert_eq!(calls.len(), 2 * 5);
    assert_eq!(&calls[0..2], &both(true));
    assert_eq!(&calls[2..4], &both(false));

    // Runtime equals the ON durations: 3 × 60 s.
    let s = b.state.snapshot();
    assert!((s.pump_runtime_minutes - 3.0).abs() < 1e-9);
    assert!((s.fan_runtime_minutes - 3.0).abs() < 1e-9);
}

#[test]
fn disabled_keeps_everything_off() {
    let mut b = Bench::new(local_at(12, 0));
    b.update(SettingsUpdate {
        enabled: Some(false),
        ..SettingsUpdate::default()
    });
    b.state.set_signal(true);
    for s in 0..200 {
        b.tick(s);
        assert_eq!(b.ctl.phase(), Phase::Idle);
    }
    assert!(b.hw.calls().is_empty());
    assert_eq!(b.state.snapshot().pump_runtime_minutes, 0.0);
}

#[test]
fn disabling_mid_cycle_turns_off_next_tick() {
    let mut b = Bench::new(local_at(12, 0));
    b.state.set_signal(true);
    for s in 0..=30 {
        b.tick(s);
    }
    assert!(b.hw.pump_on());
    b.update(SettingsUpdate {
        enabled: Some(false),
        ..SettingsUpdate::default()
    });
    b.tick(31);
    assert!(!b.hw.pump_on() && !b.hw.fan_on());
    assert_eq!(b.ctl.phase(), Phase::Idle);

    // Re-enabling starts over with a fresh arm delay.
    b.update(SettingsUpdate {
        enabled: Some(true),
        ..SettingsUpdate::default()
    });
    b.tick(32);
    assert_eq!(b.ctl.phase(), Phase::ArmDelay);
    b.tick(41);
    assert!(!b.hw.pump_on());
    b.tick(42);
    assert!(b.hw.pump_on());
}

#[test]
fn outside_business_hours_stays_idle() {
    let mut b = Bench::new(local_at(8, 0));
    b.update(SettingsUpdate {
        business_hours_enabled: Some(true),
        business_hours_start: Some("09:00".into()),
        business_hours_end: Some("17:00".into()),
        ..SettingsUpdate::default()
    });
    b.state.set_signal(true);
    for s in 0..120 {
        b.tick(s);
        assert_eq!(b.ctl.phase(), Phase::Idle);
    }
    assert!(b.hw.calls().is_empty());
}

#[test]
fn overnight_window_admits_after_midnight() {
    let mut b = Bench::new(local_at(2, 0));
    b.update(SettingsUpdate {
        business_hours_enabled: Some(true),
        business_hours_start: Some("22:00".into()),
        business_hours_end: Some("06:00".into()),
        ..SettingsUpdate::default()
    });
    b.state.set_signal(true);
    for s in 0..=10 {
        b.tick(s);
    }
    assert!(b.hw.pump_on());
}

#[test]
fn window_closing_mid_cycle_forces_off() {
    // 16:59:30 → the window closes 30 s later, during the ON phase.
    let mut b = Bench::new(local_at(16, 59) + TimeDelta::seconds(30));
    b.update(SettingsUpdate {
        business_hours_enabled: Some(true),
        business_hours_start: Some("09:00".into()),
        business_hours_end: Some("17:00".into()),
        ..SettingsUpdate::default()
    });
    b.state.set_signal(true);
    for s in 0..=30 {
        b.tick(s);
    }
    assert!(b.hw.pump_on(), "17:00:00 is still inside the window");
    b.tick(31);
    assert!(!b.hw.pump_on());
    assert_eq!(b.ctl.phase(), Phase::Idle);
}

#[test]
fn malformed_window_fails_open() {
    let mut b = Bench::new(local_at(3, 0));
    b.update(SettingsUpdate {
        business_hours_enabled: Some(true),
        business_hours_start: Some("nine".into()),
        ..SettingsUpdate::default()
    });
    b.state.set_signal(true);
    for s in 0..=10 {
        b.tick(s);
    }
    assert!(b.hw.pump_on());
}

#[test]
fn signal_drop_turns_off_within_one_tick() {
    for drop_at in [5, 40, 100] {
        let mut b = Bench::new(local_at(12, 0));
        b.state.set_signal(true);
        for s in 0..drop_at {
            b.tick(s);
        }
        b.state.set_signal(false);
        b.tick(drop_at);
        assert_eq!(b.ctl.phase(), Phase::Idle, "drop at {drop_at}s");
        assert!(!b.hw.pump_on() && !b.hw.fan_on());
        let s = b.state.snapshot();
        assert!(s.pump_started_at.is_none() && s.fan_started_at.is_none());
    }
}

#[test]
fn preset_change_applies_on_next_tick() {
    let mut b = Bench::new(local_at(12, 0));
    b.state.set_signal(true);
    for s in 0..=20 {
        b.tick(s);
    }
    // Mid-ON switch to a shorter OFF time: the current ON phase keeps its
    // 60 s, the following OFF phase lasts 30 s instead of 120 s.
    b.update(SettingsUpdate {
        duty_cycle: Some(DutyCycle::On60Off30),
        ..SettingsUpdate::default()
    });
    for s in 21..=69 {
        b.tick(s);
        assert!(b.hw.pump_on());
    }
    b.tick(70);
    assert_eq!(b.ctl.phase(), Phase::Off);
    for s in 71..100 {
        b.tick(s);
    }
    assert!(!b.hw.pump_on());
    b.tick(100);
    assert!(b.hw.pump_on());
    assert_eq!(b.ctl.phase(), Phase::On);
}

#[test]
fn longer_on_time_extends_running_phase() {
    let mut b = Bench::new(local_at(12, 0));
    b.state.set_signal(true);
    for s in 0..=20 {
        b.tick(s);
    }
    b.update(SettingsUpdate {
        duty_cycle: Some(DutyCycle::On360Off30),
        ..SettingsUpdate::default()
    });
    for s in 21..=369 {
        b.tick(s);
    }
    assert!(b.hw.pump_on(), "ON lasts 360 s from tick 10");
    b.tick(370);
    assert!(!b.hw.pump_on());
}

#[test]
fn failed_write_is_retried_and_never_recorded() {
    let mut b = Bench::new(local_at(12, 0));
    b.hw.fail(Some(Actuator::Pump));
    b.state.set_signal(true);
    for s in 0..=15 {
        b.tick(s);
    }
    let s = b.state.snapshot();
    assert!(!s.pump_on && s.pump_started_at.is_none());
    assert_eq!(s.pump_runtime_minutes, 0.0);
    assert!(s.fan_on);
    let pump_attempts = b
        .hw
        .calls()
        .iter()
        .filter(|c| c.actuator == Actuator::Pump)
        .count();
    assert_eq!(pump_attempts, 6, "one attempt per ON tick 10..=15");

    b.hw.fail(None);
    b.tick(16);
    assert!(b.state.snapshot().pump_on);
    assert!(b.sink.events().iter().any(|e| matches!(
        e,
        AppEvent::ActuatorFault {
            actuator: Actuator::Pump,
            ..
        }
    )));
}

#[test]
fn reset_while_running_keeps_started_at() {
    let mut b = Bench::new(local_at(12, 0));
    b.state.set_signal(true);
    for s in 0..=40 {
        b.tick(s);
    }
    let now = b.wall0 + TimeDelta::seconds(40);
    b.state.reset_counters(now);
    let s = b.state.snapshot();
    assert_eq!(s.pump_runtime_minutes, 0.0);
    assert_eq!(s.pump_started_at, Some(now));
    b.tick(41);
    assert!((b.state.snapshot().pump_runtime_minutes - 1.0 / 60.0).abs() < 1e-12);
}

#[test]
fn shutdown_forces_off_and_reports_stop() {
    let mut b = Bench::new(local_at(12, 0));
    b.state.set_signal(true);
    for s in 0..=12 {
        b.tick(s);
    }
    b.ctl
        .shutdown(b.t0 + Duration::from_secs(13), b.wall0 + TimeDelta::seconds(13))
        .unwrap();
    assert!(!b.hw.pump_on() && !b.hw.fan_on());
    assert_eq!(b.sink.events().last(), Some(&AppEvent::Stopped));
}
