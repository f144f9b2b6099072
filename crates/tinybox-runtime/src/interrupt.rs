//! Ctrl+C handling for the two waiting roles.
//!
//! Each role waits on exactly one child. An interrupt is passed on to that
//! child instead of ending the waiting process, so the child's status is
//! still collected and reported. The initializer needs this in particular:
//! as PID 1 of its namespace it would otherwise never see the signal.

use std::sync::atomic::{AtomicI32, Ordering};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

/// Child currently receiving forwarded interrupts; 0 when there is none.
static FORWARD_TO: AtomicI32 = AtomicI32::new(0);

/// Installs the process-wide interrupt handler. `waiting_for` names the
/// child in log events.
pub fn install(waiting_for: &'static str) {
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!(waiting_for, "interrupt received, forwarding");
        let _ = forward(&FORWARD_TO, Signal::SIGINT);
    }) {
        tracing::warn!(error = %e, "could not install interrupt handler");
    }
}

/// Makes `pid` the receiver of forwarded interrupts.
pub fn forward_to(pid: Pid) {
    FORWARD_TO.store(pid.as_raw(), Ordering::SeqCst);
}

/// Stops forwarding once the child has been reaped.
pub fn stop_forwarding() {
    FORWARD_TO.store(0, Ordering::SeqCst);
}

/// Sends `signal` to the process recorded in `slot`. Returns whether a
/// signal was delivered.
fn forward(slot: &AtomicI32, signal: Signal) -> bool {
    let raw = slot.load(Ordering::SeqCst);
    if raw <= 0 {
        return false;
    }
    match kill(Pid::from_raw(raw), signal) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(pid = raw, error = %e, "could not forward signal");
            false
        }
    }
}
