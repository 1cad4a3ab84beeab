//! Both loops running on real threads with short periods.

use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use diffuser::adapters::time::SystemClock;
use diffuser::app::events::AppEvent;
use diffuser::config::{DaemonConfig, SettingsUpdate};
use diffuser::history::{HistoryBuffer, SharedHistory};
use diffuser::runtime::{Runtime, Wiring};
use diffuser::state::SharedState;

use crate::mock_hw::{MemHistoryStore, MockActuators, MockSignal, RecordingSink};

struct Harness {
    runtime: Runtime,
    signal: MockSignal,
    hw: MockActuators,
    sink: RecordingSink,
    state: SharedState,
}

fn fast_config() -> DaemonConfig {
    DaemonConfig {
        monitor_interval: Duration::from_millis(20),
        control_interval: Duration::from_millis(5),
        arm_delay: Duration::from_millis(30),
        history_flush_every: 5,
        ..DaemonConfig::default()
    }
}

fn start(signal_level: bool, enabled: bool) -> Harness {
    let cfg = fast_config();
    let signal = MockSignal::new(signal_level);
    let hw = MockActuators::new();
    let sink = RecordingSink::default();
    let state = SharedState::default();
    state.apply_settings(&SettingsUpdate {
        enabled: Some(enabled),
        ..SettingsUpdate::default()
    });
    let runtime = Runtime::spawn(
        &cfg,
        Wiring {
            signal: signal.clone(),
            actuators: hw.clone(),
            history_store: Arc::new(MemHistoryStore::default()),
            events: sink.clone(),
            clock: SystemClock,
            state: state.clone(),
            history: SharedHistory::new(HistoryBuffer::new(cfg.history_horizon)),
        },
    )
    .unwrap();
    Harness {
        runtime,
        signal,
        hw,
        sink,
        state,
    }
}

fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn running_hvac_starts_duty_cycle_and_shutdown_stops_it() {
    let mut h = start(true, true);
    assert!(wait_for(Duration::from_secs(2), || h.hw.pump_on() && h.hw.fan_on()));
    assert!(h.state.signal());

    h.runtime.shutdown();
    assert!(!h.hw.pump_on() && !h.hw.fan_on());
    let s = h.state.snapshot();
    assert!(!s.pump_on && !s.fan_on);
    assert!(s.pump_started_at.is_none());

    let events = h.sink.events();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, AppEvent::Started { enabled: true, .. }))
    );
    assert_eq!(events.last(), Some(&AppEvent::Stopped));
}

#[test]
fn signal_loss_switches_off() {
    let mut h = start(true, true);
    assert!(wait_for(Duration::from_secs(2), || h.hw.pump_on()));
    h.signal.set(false);
    assert!(wait_for(Duration::from_secs(2), || !h.hw.pump_on() && !h.hw.fan_on()));
    assert!(!h.state.signal());
    h.runtime.shutdown();
}

#[test]
fn disabled_never_writes() {
    let mut h = start(true, false);
    sleep(Duration::from_millis(200));
    h.runtime.shutdown();
    assert!(h.hw.calls().is_empty());
}

#[test]
fn external_stop_ends_both_loops() {
    let mut h = start(false, true);
    let stop = h.runtime.stop_signal();
    sleep(Duration::from_millis(50));
    stop.raise();
    assert!(stop.is_raised());
    h.runtime.shutdown();
    h.runtime.shutdown();
    assert_eq!(
        h.sink.events().iter().filter(|e| **e == AppEvent::Stopped).count(),
        1
    );
}
