// SPDX-License-Identifier: MIT
//
// Error types for the terminal layer.
//
// Malformed escape input is deliberately *not* represented here: an
// unrecognized multi-byte sequence is discarded inside `read_key` and
// never crosses the API boundary.

use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Terminal-layer errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Stdin is not connected to a controlling terminal. Raised before
    /// any raw-mode mutation is attempted.
    #[error("no controlling terminal on stdin")]
    TerminalUnavailable,

    /// Restoring the saved line-discipline settings failed. The display
    /// restore sequence has already been emitted best-effort by the time
    /// this is reported.
    #[error("failed to restore terminal settings: {0}")]
    RestoreFailed(#[source] io::Error),

    /// A blocking read was interrupted by a signal (EINTR). The caller
    /// should re-enter its loop so pending lifecycle flags are observed.
    #[error("read interrupted by signal")]
    Interrupted,

    /// Any other I/O failure on the terminal device.
    #[error(transparent)]
    Io(#[from] io::Error),
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_unavailable_message() {
        let e = Error::TerminalUnavailable;
        assert_eq!(e.to_string(), "no controlling terminal on stdin");
    }

    #[test]
    fn restore_failed_carries_source() {
        use std::error::Error as _;
        let e = Error::RestoreFailed(io::Error::new(io::ErrorKind::Other, "tcsetattr"));
        assert!(e.to_string().contains("restore"));
        assert!(e.source().is_some());
    }

    #[test]
    fn io_error_converts() {
        let e: Error = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(e, Error::Io(_)));
    }

    #[test]
    fn interrupted_message() {
        assert_eq!(
            Error::Interrupted.to_string(),
            "read interrupted by signal"
        );
    }
}
