// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Asynchronous lifecycle signals — resize and interrupt.
//
// Policy: a handler may set a flag or terminate the process. It may
// never emit escape sequences or call into the renderer, because it can
// fire in the middle of an in-flight write. The two handlers here obey
// that split exactly:
//
//   SIGWINCH → store `true` into an atomic. The main loop consumes the
//   flag at the top of its next iteration and repaints from there.
//
//   SIGINT → write the fixed restore bytes straight to fd 1, restore
//   the line discipline through the one-shot gate, and `_exit(0)`.
//   Execution never returns to the loop.
//
// SIGWINCH is installed *without* SA_RESTART on purpose: the blocking
// `read` in `read_key` then fails with EINTR, the loop wakes, and the
// repaint happens without waiting for the next keypress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use crate::terminal;

/// Set by the SIGWINCH handler; consumed by [`take_resize`].
static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);

/// Handler installation guard — at most once per process.
static HANDLERS_INSTALLED: Once = Once::new();

/// Install the SIGWINCH and SIGINT handlers. Idempotent.
///
/// On platforms without SIGWINCH the resize flag simply never sets and
/// the application relies on manual repaint.
#[cfg(unix)]
pub fn install_handlers() {
    HANDLERS_INSTALLED.call_once(|| unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = on_sigwinch as *const () as usize;
        // No SA_RESTART: the resize must interrupt the blocking read.
        sa.sa_flags = 0;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());

        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = on_sigint as *const () as usize;
        sa.sa_flags = 0;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGINT, &raw const sa, std::ptr::null_mut());
    });
}

#[cfg(not(unix))]
pub fn install_handlers() {}

/// Consume the pending-resize flag.
///
/// Returns `true` at most once per resize burst; the caller repaints
/// with a fresh size query.
#[must_use]
pub fn take_resize() -> bool {
    RESIZE_PENDING.swap(false, Ordering::Relaxed)
}

/// SIGWINCH: flag only. Storing to an atomic is one of the few
/// operations permitted inside a signal handler.
#[cfg(unix)]
extern "C" fn on_sigwinch(_sig: libc::c_int) {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
}

/// SIGINT: restore the terminal and terminate immediately, from
/// wherever execution was interrupted. `_exit` skips atexit handlers
/// and Drop impls — the restore just performed is the cleanup.
#[cfg(unix)]
extern "C" fn on_sigint(_sig: libc::c_int) {
    terminal::restore_display_now();
    terminal::restore_termios_once();
    unsafe {
        libc::_exit(0);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_flag_starts_clear() {
        RESIZE_PENDING.store(false, Ordering::Relaxed);
        assert!(!take_resize());
    }

    #[test]
    fn take_resize_consumes_the_flag() {
        RESIZE_PENDING.store(true, Ordering::Relaxed);
        assert!(take_resize());
        assert!(!take_resize(), "flag must be consumed by the first take");
    }

    #[cfg(unix)]
    #[test]
    fn sigwinch_handler_only_sets_the_flag() {
        // Invoke the handler directly: its entire observable effect must
        // be the flag mutation — no output, no repaint, no panic.
        RESIZE_PENDING.store(false, Ordering::Relaxed);
        on_sigwinch(libc::SIGWINCH);
        assert!(take_resize());
    }

    #[cfg(unix)]
    #[test]
    fn repeated_sigwinch_coalesces() {
        RESIZE_PENDING.store(false, Ordering::Relaxed);
        on_sigwinch(libc::SIGWINCH);
        on_sigwinch(libc::SIGWINCH);
        on_sigwinch(libc::SIGWINCH);
        // Three signals, one repaint.
        assert!(take_resize());
        assert!(!take_resize());
    }
}
