// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Raw keyboard input — one blocking read, one key event.
//
// `read_key` blocks until a keystroke is available and returns exactly
// one `Key`. The hard case is the Escape byte: on its own it is the
// Escape key, but it is also the first byte of every arrow sequence.
// The decoder resolves the ambiguity with a bounded poll — if nothing
// more arrives within the window, the byte was a bare Escape; otherwise
// exactly two more bytes are read and `ESC [ A/B/C/D` maps to an arrow.
// Any other pair is discarded silently and the read continues, so
// malformed sequences never surface as stray characters.
//
// The decode logic is split from the I/O behind the small `ByteStream`
// seam, so every branch of the algorithm is unit-testable without a
// terminal. `KeySource` is the application-facing seam: the POSIX
// implementation below is the only one specified; tests script their
// own.

use crate::error::{Error, Result};
use crate::terminal::RawMode;

// ─── Key Events ─────────────────────────────────────────────────────────────

/// A decoded keystroke. One is produced per keypress and consumed
/// immediately — there is no key queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable Unicode character.
    Char(char),
    /// A control byte (0x00–0x1F or 0x7F), delivered verbatim.
    Control(u8),
    /// Arrow keys, decoded from `ESC [ A/B/C/D`.
    Up,
    Down,
    Left,
    Right,
    /// A bare Escape keypress.
    Escape,
}

impl Key {
    /// Whether this key means Enter. Raw mode delivers CR (0x0D); LF is
    /// accepted too for terminals with translation left on.
    #[inline]
    #[must_use]
    pub const fn is_enter(self) -> bool {
        matches!(self, Self::Control(0x0D) | Self::Control(0x0A))
    }

    /// Whether this key means Backspace (DEL 0x7F or BS 0x08).
    #[inline]
    #[must_use]
    pub const fn is_backspace(self) -> bool {
        matches!(self, Self::Control(0x7F) | Self::Control(0x08))
    }
}

/// A blocking source of decoded keystrokes.
///
/// The seam between the controller and the keyboard backend. This crate
/// ships the POSIX raw-mode implementation ([`PosixInput`]); alternate
/// backends are out of scope but plug in here.
pub trait KeySource {
    /// Block until one keystroke is available and return it.
    ///
    /// # Errors
    ///
    /// [`Error::Interrupted`] when a signal cut the read short — the
    /// caller should re-enter its loop — or [`Error::Io`] on a real
    /// read failure.
    fn read_key(&mut self) -> Result<Key>;
}

// ─── Decode ─────────────────────────────────────────────────────────────────

/// Window granted to the remainder of an escape sequence.
///
/// If no byte follows ESC within this many milliseconds, the byte was a
/// bare Escape keypress. The reference behavior polled with a zero
/// timeout, which misreads arrow keys over slow links; a small bounded
/// window is imperceptible to a human releasing the Escape key.
const ESC_POLL_MS: i32 = 10;

/// First-byte classification.
#[derive(Debug, PartialEq, Eq)]
enum First {
    /// Complete single-byte key.
    Key(Key),
    /// ESC — needs the poll to disambiguate.
    EscapeIntro,
    /// UTF-8 lead byte expecting this total length.
    Utf8Lead(usize),
    /// Invalid lead byte, drop it.
    Discard,
}

/// Classify the first byte of a keystroke.
const fn decode_byte(b: u8) -> First {
    match b {
        0x1B => First::EscapeIntro,
        0x00..=0x1A | 0x1C..=0x1F | 0x7F => First::Key(Key::Control(b)),
        0x20..=0x7E => First::Key(Key::Char(b as char)),
        0xC2..=0xDF => First::Utf8Lead(2),
        0xE0..=0xEF => First::Utf8Lead(3),
        0xF0..=0xF4 => First::Utf8Lead(4),
        // Bare continuation bytes and invalid leads.
        _ => First::Discard,
    }
}

/// Map the two bytes following ESC to an arrow key.
///
/// Only `[ A/B/C/D` is recognized; anything else is an unrecognized
/// sequence and yields `None` so the caller can discard it.
const fn decode_escape(b1: u8, b2: u8) -> Option<Key> {
    if b1 != b'[' {
        return None;
    }
    match b2 {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        _ => None,
    }
}

/// Byte-level terminal input: one blocking byte at a time, plus a
/// bounded readability poll for the ESC disambiguation.
trait ByteStream {
    /// Block until one byte is available and return it.
    fn next_byte(&mut self) -> Result<u8>;

    /// Whether a byte is already pending within `ms` milliseconds.
    fn pending_within(&mut self, ms: i32) -> Result<bool>;
}

/// The decode algorithm, driven over any byte stream.
///
/// Loops until a complete keystroke decodes; discarded bytes (malformed
/// escape pairs, invalid UTF-8) never escape this function.
fn read_key_from(src: &mut impl ByteStream) -> Result<Key> {
    loop {
        let first = src.next_byte()?;
        match decode_byte(first) {
            First::Key(key) => return Ok(key),

            First::EscapeIntro => {
                if !src.pending_within(ESC_POLL_MS)? {
                    return Ok(Key::Escape);
                }
                // Read exactly two more bytes; unknown pairs are dropped.
                let b1 = src.next_byte()?;
                let b2 = src.next_byte()?;
                if let Some(key) = decode_escape(b1, b2) {
                    return Ok(key);
                }
            }

            First::Utf8Lead(len) => {
                let mut bytes = [first, 0, 0, 0];
                for slot in bytes.iter_mut().take(len).skip(1) {
                    *slot = src.next_byte()?;
                }
                if let Ok(s) = std::str::from_utf8(&bytes[..len]) {
                    if let Some(ch) = s.chars().next() {
                        return Ok(Key::Char(ch));
                    }
                }
                // Invalid continuation — drop the whole run.
            }

            First::Discard => {}
        }
    }
}

// ─── POSIX Implementation ───────────────────────────────────────────────────

/// Stdin as a [`ByteStream`], via `libc::read` and `libc::poll`.
#[cfg(unix)]
struct StdinBytes;

#[cfg(unix)]
impl ByteStream for StdinBytes {
    fn next_byte(&mut self) -> Result<u8> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };
        if n == 1 {
            return Ok(byte);
        }
        if n == 0 {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::Interrupted {
            // A signal (usually SIGWINCH) woke the read. Surface it so
            // the loop can consume its flags before blocking again.
            return Err(Error::Interrupted);
        }
        Err(err.into())
    }

    fn pending_within(&mut self, ms: i32) -> Result<bool> {
        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd: libc::STDIN_FILENO,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, ms)
        };
        // A signal during the window counts as nothing pending: the ESC
        // resolves to a bare Escape and the flag is seen next iteration.
        Ok(ready > 0)
    }
}

/// Raw-mode keyboard input on a POSIX terminal.
///
/// Acquiring the input enters raw mode; [`release`](Self::release) (or
/// drop) restores the saved line discipline. One instance owns the
/// terminal's input for its whole lifetime — there is exactly one input
/// stream.
pub struct PosixInput {
    raw: RawMode,
}

impl PosixInput {
    /// Enter raw mode and take ownership of keyboard input.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalUnavailable`] if stdin has no controlling
    /// terminal; no raw-mode mutation is attempted in that case.
    pub fn acquire() -> Result<Self> {
        let mut raw = RawMode::new();
        raw.enter()?;
        Ok(Self { raw })
    }

    /// Restore the saved line discipline.
    ///
    /// Safe to call more than once.
    ///
    /// # Errors
    ///
    /// [`Error::RestoreFailed`] if the saved settings cannot be written
    /// back.
    pub fn release(&mut self) -> Result<()> {
        self.raw.exit()
    }
}

impl KeySource for PosixInput {
    #[cfg(unix)]
    fn read_key(&mut self) -> Result<Key> {
        read_key_from(&mut StdinBytes)
    }

    #[cfg(not(unix))]
    fn read_key(&mut self) -> Result<Key> {
        Err(Error::TerminalUnavailable)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
