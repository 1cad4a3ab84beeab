//! SIGINT / SIGTERM handling.
//!
//! The handler only stores into a static flag; [`wait_for_termination`]
//! polls that flag from the main thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::info;

use crate::runtime::StopSignal;

static TERMINATE: AtomicBool = AtomicBool::new(false);

extern "C" fn on_terminate(_signum: libc::c_int) {
    TERMINATE.store(true, Ordering::SeqCst);
}

/// Install the handler for SIGINT and SIGTERM.
pub fn install() -> std::io::Result<()> {
    let handler = on_terminate as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signum in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only performs an atomic store, which is
        // async-signal-safe.
        let previous = unsafe { libc::signal(signum, handler) };
        if previous == libc::SIG_ERR {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Whether a termination signal has been received.
pub fn terminate_requested() -> bool {
    TERMINATE.load(Ordering::SeqCst)
}

/// Block until SIGINT/SIGTERM arrives or `stop` is raised elsewhere.
pub fn wait_for_termination(stop: &StopSignal, poll: Duration) {
    while !terminate_requested() {
        if stop.wait_until(std::time::Instant::now() + poll) {
            return;
        }
    }
    info!("termination signal received");
}
