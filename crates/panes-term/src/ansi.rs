// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No
// state, no decisions about when to emit — that's the `Cursor`'s job.
// This module just knows the byte-level encoding of every terminal
// command the system uses: clear, absolute and relative cursor motion,
// cursor visibility, a fixed foreground palette, and inverse video.
//
// Positions are 1-indexed throughout, matching both the ANSI CUP
// encoding and the crate's public coordinate model.
//
// All functions return `io::Result` propagated from the underlying
// writer. In practice they never fail when writing to a `Vec<u8>`.

use std::io::{self, Write};

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2). Does not move the cursor.
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

// ─── Cursor Motion ───────────────────────────────────────────────────────────

/// Move the cursor to `(row, col)` using the CUP (Cursor Position)
/// sequence. Both coordinates are 1-indexed; `(1, 1)` is the top-left.
#[inline]
pub fn cursor_to(w: &mut impl Write, row: u16, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{row};{col}H")
}

/// Move the cursor to the top-left corner (CUP with no parameters).
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Move the cursor up `n` lines (CUU). The column is unchanged.
#[inline]
pub fn cursor_up(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}A")
}

/// Move the cursor down `n` lines (CUD). The column is unchanged.
#[inline]
pub fn cursor_down(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}B")
}

// ─── Cursor Visibility ───────────────────────────────────────────────────────

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Colors & Attributes ─────────────────────────────────────────────────────

/// The eight standard foreground colors (SGR 30–37).
///
/// This system draws with a fixed palette — no 256-color or truecolor
/// escapes, and no capability negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    /// The SGR foreground parameter for this color.
    #[must_use]
    const fn sgr(self) -> u8 {
        match self {
            Self::Black => 30,
            Self::Red => 31,
            Self::Green => 32,
            Self::Yellow => 33,
            Self::Blue => 34,
            Self::Magenta => 35,
            Self::Cyan => 36,
            Self::White => 37,
        }
    }
}

/// Set the foreground (text) color.
#[inline]
pub fn fg(w: &mut impl Write, color: Color) -> io::Result<()> {
    write!(w, "\x1b[{}m", color.sgr())
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Enable inverse video (SGR 7).
#[inline]
pub fn inverse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[7m")
}

/// Disable inverse video (SGR 27), leaving other attributes intact.
#[inline]
pub fn inverse_off(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[27m")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
