// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, size queries, and crash-safe restore.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control — there is no safe
// alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// This module owns the raw-mode lifecycle. The original line-discipline
// settings are saved exactly once on entry and restored exactly once on
// exit — the `RAW_ACTIVE` gate makes the restore a one-shot transition
// no matter which path reaches it first: normal exit, panic hook, or the
// SIGINT handler in `signal`.
//
// The panic hook bypasses Rust's stdout lock entirely, writing the
// restore sequence directly to fd 1. This prevents deadlock if the panic
// happened while the lock was held mid-write. One raw write, everything
// restored, then the original panic handler prints its message to a
// working terminal.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Once, OnceLock};

// ─── Size ───────────────────────────────────────────────────────────────────

use crate::error::{Error, Result};

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

/// Fallback dimensions when the size query fails (tests, pipes).
const FALLBACK_SIZE: Size = Size { rows: 24, cols: 80 };

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
/// Always hits the OS — the result is never cached, so a query after a
/// resize reflects the new dimensions.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            rows: ws.ws_row,
            cols: ws.ws_col,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// The current terminal size, falling back to 24×80 when the query fails.
#[must_use]
pub fn size() -> Size {
    get_size().unwrap_or(FALLBACK_SIZE)
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Crash-Safe Restore ─────────────────────────────────────────────────────

/// Display restore sequence: show cursor, reset SGR attributes, clear
/// the screen, home the cursor.
///
/// This exact byte string is emitted on every termination path — clean
/// quit, panic, SIGINT — so the user never gets back a session with a
/// hidden cursor or leftover colors.
pub const RESTORE_SEQUENCE: &[u8] = b"\x1b[?25h\x1b[0m\x1b[2J\x1b[H";

/// Whether raw mode is currently in effect. The restore path swaps this
/// to `false`, so only the first caller performs the termios restore.
static RAW_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Original termios, saved once on the first raw-mode entry. Read from
/// the panic hook and the SIGINT handler, which cannot reach the owned
/// [`RawMode`] value. `OnceLock::get` is lock-free, so reading it from a
/// signal handler is safe.
#[cfg(unix)]
static ORIGINAL_TERMIOS: OnceLock<libc::termios> = OnceLock::new();

#[cfg(not(unix))]
static ORIGINAL_TERMIOS: OnceLock<()> = OnceLock::new();

/// Claim the one-shot restore transition.
///
/// Returns `true` for exactly one caller after each raw-mode entry;
/// every later caller gets `false` and must not touch the line
/// discipline again.
pub(crate) fn take_restore_gate() -> bool {
    RAW_ACTIVE.swap(false, Ordering::SeqCst)
}

/// Write the display restore sequence directly to stdout's fd.
///
/// Bypasses Rust's `io::stdout()` lock to avoid deadlocking if a panic
/// or signal arrived while the lock was held mid-write. Best-effort.
pub fn restore_display_now() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            RESTORE_SEQUENCE.as_ptr().cast::<libc::c_void>(),
            RESTORE_SEQUENCE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        use std::io::Write;
        let _ = io::stdout().write_all(RESTORE_SEQUENCE);
        let _ = io::stdout().flush();
    }
}

/// Restore the saved line discipline if this caller wins the gate.
///
/// Async-signal-safe: an atomic swap, a lock-free read, and `tcsetattr`.
/// Ignores errors — the emergency paths have no one to report to.
pub(crate) fn restore_termios_once() {
    if !take_restore_gate() {
        return;
    }

    #[cfg(unix)]
    if let Some(original) = ORIGINAL_TERMIOS.get() {
        unsafe {
            let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
        }
    }
}

/// Panic hook guard — the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the
/// error. Without this, a panic in raw mode leaves the user's terminal
/// unusable: no echo, no line editing, no way to read the message.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_display_now();
            restore_termios_once();
            original(info);
        }));
    });
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// Raw-mode handle owning the saved line-discipline snapshot.
///
/// Call [`enter`](Self::enter) to switch the terminal to unbuffered,
/// unechoed, byte-at-a-time input; [`exit`](Self::exit) restores the
/// saved settings. Both are idempotent, and `exit` on a handle that
/// never entered is a no-op. Dropping an active handle restores
/// best-effort.
pub struct RawMode {
    /// Settings saved on entry; `None` before entry and after restore.
    #[cfg(unix)]
    original: Option<libc::termios>,

    /// Whether this handle entered raw mode and has not yet exited.
    active: bool,
}

impl RawMode {
    /// Create an inactive handle. Does **not** touch the terminal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            original: None,
            active: false,
        }
    }

    /// Whether this handle currently holds the terminal in raw mode.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode.
    ///
    /// Saves the current settings, then switches to unbuffered,
    /// unechoed, byte-at-a-time input (cfmakeraw-equivalent flags,
    /// VMIN=1/VTIME=0 so `read` blocks for exactly one byte).
    /// Idempotent: entering while active is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalUnavailable`] if stdin has no controlling
    /// terminal — checked before any mutation is attempted — or
    /// [`Error::Io`] if a termios call fails.
    #[cfg(unix)]
    pub fn enter(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }
        if !is_tty() {
            return Err(Error::TerminalUnavailable);
        }

        install_panic_hook();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error().into());
            }

            // Save for restore: owned copy for exit(), global copy for
            // the panic hook and the SIGINT handler. The global is set
            // exactly once per process.
            self.original = Some(termios);
            let _ = ORIGINAL_TERMIOS.set(termios);

            // cfmakeraw equivalent: disable all line processing.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=1, VTIME=0: read() blocks until exactly 1 byte is available.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                self.original = None;
                return Err(io::Error::last_os_error().into());
            }
        }

        RAW_ACTIVE.store(true, Ordering::SeqCst);
        self.active = true;
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn enter(&mut self) -> Result<()> {
        Err(Error::TerminalUnavailable)
    }

    /// Exit raw mode, restoring the saved settings.
    ///
    /// Safe to call on a handle that never entered (no-op), and safe to
    /// call twice: the restore gate guarantees the line discipline is
    /// written back at most once per entry.
    ///
    /// # Errors
    ///
    /// [`Error::RestoreFailed`] if tcsetattr rejects the saved settings.
    /// The caller should have emitted the display restore sequence by
    /// this point, so the session stays usable even then.
    #[cfg(unix)]
    pub fn exit(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let Some(original) = self.original.take() else {
            return Ok(());
        };

        // Someone else (panic hook, SIGINT handler) already restored.
        if !take_restore_gate() {
            return Ok(());
        }

        unsafe {
            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) != 0 {
                return Err(Error::RestoreFailed(io::Error::last_os_error()));
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    pub fn exit(&mut self) -> Result<()> {
        self.active = false;
        Ok(())
    }
}

impl Default for RawMode {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if self.active {
            let _ = self.exit();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn size_equality() {
        assert_eq!(Size { rows: 24, cols: 80 }, Size { rows: 24, cols: 80 });
        assert_ne!(Size { rows: 24, cols: 80 }, Size { rows: 40, cols: 120 });
    }

    #[test]
    fn size_is_copy() {
        let a = Size { rows: 24, cols: 80 };
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn get_size_does_not_panic() {
        let _ = get_size();
    }

    #[test]
    fn size_falls_back_to_positive_dimensions() {
        let s = size();
        assert!(s.rows > 0);
        assert!(s.cols > 0);
    }

    #[test]
    fn is_tty_does_not_panic() {
        let _ = is_tty();
    }

    // ── Restore sequence ──────────────────────────────────────────────

    #[test]
    fn restore_sequence_is_valid_utf8() {
        std::str::from_utf8(RESTORE_SEQUENCE).unwrap();
    }

    #[test]
    fn restore_sequence_shows_cursor_first() {
        let s = std::str::from_utf8(RESTORE_SEQUENCE).unwrap();
        assert!(s.starts_with("\x1b[?25h"));
    }

    #[test]
    fn restore_sequence_homes_cursor_last() {
        let s = std::str::from_utf8(RESTORE_SEQUENCE).unwrap();
        assert!(s.ends_with("\x1b[H"));
    }

    #[test]
    fn restore_sequence_contains_all_steps() {
        let s = std::str::from_utf8(RESTORE_SEQUENCE).unwrap();
        assert!(s.contains("\x1b[?25h"), "must show cursor");
        assert!(s.contains("\x1b[0m"), "must reset attributes");
        assert!(s.contains("\x1b[2J"), "must clear screen");
        assert!(s.contains("\x1b[H"), "must home cursor");
    }

    // ── Restore gate ──────────────────────────────────────────────────

    #[test]
    fn restore_gate_fires_exactly_once() {
        RAW_ACTIVE.store(true, Ordering::SeqCst);
        assert!(take_restore_gate(), "first claimer wins the gate");
        assert!(!take_restore_gate(), "second claimer must not restore");
        assert!(!take_restore_gate(), "nor any later one");
    }

    // ── RawMode ───────────────────────────────────────────────────────

    #[test]
    fn new_handle_is_inactive() {
        let raw = RawMode::new();
        assert!(!raw.is_active());
    }

    #[test]
    fn exit_without_enter_is_noop() {
        let mut raw = RawMode::new();
        raw.exit().unwrap();
        raw.exit().unwrap();
        assert!(!raw.is_active());
    }

    #[test]
    fn drop_without_enter_is_harmless() {
        let raw = RawMode::new();
        drop(raw);
    }

    #[test]
    fn enter_off_tty_fails_before_mutation() {
        // Test stdin is not a terminal, so enter must refuse up front
        // and leave the handle inactive.
        if is_tty() {
            return; // Developer ran tests on a real TTY — skip.
        }
        let mut raw = RawMode::new();
        assert!(matches!(raw.enter(), Err(Error::TerminalUnavailable)));
        assert!(!raw.is_active());
    }

    #[test]
    fn default_matches_new() {
        let raw = RawMode::default();
        assert!(!raw.is_active());
    }
}
