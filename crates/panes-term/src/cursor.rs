// SPDX-License-Identifier: MIT
//
// Position-tracking cursor — the single writer to the terminal.
//
// `Cursor` wraps the output stream and maintains the position a terminal
// emulator would compute by replaying every escape sequence emitted so
// far. The invariant is strict: tracked position and replayed position
// are always identical, never ahead or behind. The tests enforce it with
// an actual replay of the byte log.
//
// Two consequences shape the API:
//
//   Plain text and escape emission are separate methods. `write` takes
//   text only (its column arithmetic would be corrupted by embedded
//   escapes); styling goes through dedicated passthroughs that the
//   bookkeeping knows move nothing.
//
//   Every mutating operation flushes before returning. Later logic
//   overwrites regions in place and assumes prior output has already
//   reached the terminal.

use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

use crate::ansi::{self, Color};
use crate::terminal;

/// Tracked terminal cursor over an output stream.
///
/// Coordinates are 1-indexed; `(1, 1)` is the top-left cell. A newly
/// created cursor assumes the terminal cursor is at home — callers
/// start with a [`move_to`](Self::move_to) or
/// [`clear`](Self::clear_screen) anyway.
pub struct Cursor<W: Write> {
    out: W,
    row: u16,
    col: u16,
}

impl<W: Write> Cursor<W> {
    /// Wrap an output stream with the position at `(1, 1)`.
    pub fn new(out: W) -> Self {
        Self { out, row: 1, col: 1 }
    }

    /// Current 1-indexed row.
    #[inline]
    #[must_use]
    pub const fn row(&self) -> u16 {
        self.row
    }

    /// Current 1-indexed column.
    #[inline]
    #[must_use]
    pub const fn col(&self) -> u16 {
        self.col
    }

    /// Current `(row, col)` position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> (u16, u16) {
        (self.row, self.col)
    }

    /// Borrow the underlying writer (tests inspect the byte log).
    #[inline]
    pub const fn get_ref(&self) -> &W {
        &self.out
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    // ── Motion ──────────────────────────────────────────────────────

    /// Move to an absolute `(row, col)`, resetting the tracked position
    /// unconditionally.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn move_to(&mut self, row: u16, col: u16) -> io::Result<()> {
        ansi::cursor_to(&mut self.out, row, col)?;
        self.row = row;
        self.col = col;
        self.out.flush()
    }

    /// Move down `n` lines. The column is unchanged; `n == 0` emits
    /// nothing (CUD treats a zero parameter as 1).
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn lines_down(&mut self, n: u16) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        ansi::cursor_down(&mut self.out, n)?;
        self.row = self.row.saturating_add(n);
        self.out.flush()
    }

    /// Move up `n` lines, clamping at the top row exactly as the
    /// terminal does. The column is unchanged; `n == 0` emits nothing.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn lines_up(&mut self, n: u16) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        ansi::cursor_up(&mut self.out, n)?;
        self.row = self.row.saturating_sub(n).max(1);
        self.out.flush()
    }

    // ── Text ────────────────────────────────────────────────────────

    /// Write text at the current position and advance the column by its
    /// display width.
    ///
    /// Each embedded `\n` continues the block on the next row at the
    /// column that was current when this call began — the anchor column
    /// — so callers compose left-aligned multi-line blocks at an
    /// arbitrary column. The continuation is emitted as an absolute
    /// position sequence, which is what keeps the byte log and the
    /// tracked position in lockstep.
    ///
    /// `text` must not contain escape bytes; styling goes through the
    /// dedicated passthroughs.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn write(&mut self, text: &str) -> io::Result<()> {
        let anchor = self.col;
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                let next = self.row.saturating_add(1);
                ansi::cursor_to(&mut self.out, next, anchor)?;
                self.row = next;
                self.col = anchor;
            }
            if !segment.is_empty() {
                self.out.write_all(segment.as_bytes())?;
                let w = u16::try_from(segment.width()).unwrap_or(u16::MAX);
                self.col = self.col.saturating_add(w);
            }
        }
        self.out.flush()
    }

    // ── Style & screen passthroughs (no position change) ────────────

    /// Clear the whole screen. ED 2 does not move the cursor.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn clear_screen(&mut self) -> io::Result<()> {
        ansi::clear_screen(&mut self.out)?;
        self.out.flush()
    }

    /// Set the foreground color.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn set_fg(&mut self, color: Color) -> io::Result<()> {
        ansi::fg(&mut self.out, color)?;
        self.out.flush()
    }

    /// Reset all text attributes.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn reset_style(&mut self) -> io::Result<()> {
        ansi::reset(&mut self.out)?;
        self.out.flush()
    }

    /// Enable inverse video.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn inverse(&mut self) -> io::Result<()> {
        ansi::inverse(&mut self.out)?;
        self.out.flush()
    }

    /// Disable inverse video.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn inverse_off(&mut self) -> io::Result<()> {
        ansi::inverse_off(&mut self.out)?;
        self.out.flush()
    }

    /// Hide the terminal cursor glyph.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn hide_cursor(&mut self) -> io::Result<()> {
        ansi::cursor_hide(&mut self.out)?;
        self.out.flush()
    }

    /// Show the terminal cursor glyph.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn show_cursor(&mut self) -> io::Result<()> {
        ansi::cursor_show(&mut self.out)?;
        self.out.flush()
    }

    // ── Restore ─────────────────────────────────────────────────────

    /// Emit the full display restore sequence: show cursor, reset
    /// attributes, clear, home. These are the exact bytes the crash
    /// paths write, so every exit leaves the terminal in one state.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn restore(&mut self) -> io::Result<()> {
        self.out.write_all(terminal::RESTORE_SEQUENCE)?;
        self.row = 1;
        self.col = 1;
        self.out.flush()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use unicode_width::UnicodeWidthChar;

    fn cursor() -> Cursor<Vec<u8>> {
        Cursor::new(Vec::new())
    }

    /// Model terminal: replay an emitted byte log and return the final
    /// `(row, col)` a VT100-compatible emulator would land on.
    ///
    /// Understands exactly the sequences this crate emits: CUP, CUU,
    /// CUD, ED 2, DECTCEM, and SGR (the latter three move nothing).
    fn replay(bytes: &[u8]) -> (u16, u16) {
        let text = std::str::from_utf8(bytes).unwrap();
        let mut chars = text.chars().peekable();
        let (mut row, mut col) = (1u16, 1u16);

        while let Some(ch) = chars.next() {
            if ch != '\x1b' {
                let w = ch.width().unwrap_or(0) as u16;
                col = col.saturating_add(w);
                continue;
            }
            assert_eq!(chars.next(), Some('['), "only CSI sequences are emitted");
            let mut params = String::new();
            let terminator = loop {
                let c = chars.next().expect("unterminated sequence");
                if c.is_ascii_alphabetic() {
                    break c;
                }
                params.push(c);
            };
            match terminator {
                'H' => {
                    let mut it = params.split(';');
                    row = it.next().and_then(|p| p.parse().ok()).unwrap_or(1);
                    col = it.next().and_then(|p| p.parse().ok()).unwrap_or(1);
                }
                'A' => {
                    let n: u16 = params.parse().unwrap_or(1);
                    row = row.saturating_sub(n).max(1);
                }
                'B' => {
                    let n: u16 = params.parse().unwrap_or(1);
                    row = row.saturating_add(n);
                }
                'J' | 'm' | 'l' | 'h' => {}
                other => panic!("replay does not understand CSI ..{other}"),
            }
        }
        (row, col)
    }

    /// Assert the position invariant: tracked == replayed.
    fn assert_consistent(cur: &Cursor<Vec<u8>>) {
        assert_eq!(
            cur.position(),
            replay(cur.get_ref()),
            "tracked position must equal byte-log replay"
        );
    }

    // ── Basics ──────────────────────────────────────────────────────────

    #[test]
    fn starts_at_home() {
        assert_eq!(cursor().position(), (1, 1));
    }

    #[test]
    fn move_to_emits_cup_and_tracks() {
        let mut c = cursor();
        c.move_to(5, 10).unwrap();
        assert_eq!(c.get_ref().as_slice(), b"\x1b[5;10H");
        assert_eq!(c.position(), (5, 10));
        assert_consistent(&c);
    }

    #[test]
    fn write_advances_column_by_width() {
        let mut c = cursor();
        c.move_to(3, 4).unwrap();
        c.write("abc").unwrap();
        assert_eq!(c.position(), (3, 7));
        assert_consistent(&c);
    }

    #[test]
    fn write_wide_chars_advance_two_columns() {
        let mut c = cursor();
        c.write("你好").unwrap();
        assert_eq!(c.position(), (1, 5));
        assert_consistent(&c);
    }

    #[test]
    fn write_empty_is_a_noop_on_position() {
        let mut c = cursor();
        c.move_to(2, 2).unwrap();
        c.write("").unwrap();
        assert_eq!(c.position(), (2, 2));
    }

    // ── Anchor column across line breaks ────────────────────────────────

    #[test]
    fn newline_returns_to_anchor_column() {
        let mut c = cursor();
        c.move_to(5, 10).unwrap();
        c.write("abc\ndef").unwrap();
        // Continuation re-anchors at column 10, not the left edge.
        assert_eq!(
            c.get_ref().as_slice(),
            b"\x1b[5;10Habc\x1b[6;10Hdef".as_slice()
        );
        assert_eq!(c.position(), (6, 13));
        assert_consistent(&c);
    }

    #[test]
    fn trailing_newline_lands_on_anchor() {
        let mut c = cursor();
        c.move_to(2, 7).unwrap();
        c.write("xy\n").unwrap();
        assert_eq!(c.position(), (3, 7));
        assert_consistent(&c);
    }

    #[test]
    fn multiple_newlines_step_one_row_each() {
        let mut c = cursor();
        c.move_to(1, 3).unwrap();
        c.write("a\n\nb").unwrap();
        assert_eq!(c.position(), (3, 4));
        assert_consistent(&c);
    }

    // ── Relative motion ─────────────────────────────────────────────────

    #[test]
    fn lines_down_updates_row_only() {
        let mut c = cursor();
        c.move_to(4, 9).unwrap();
        c.lines_down(3).unwrap();
        assert_eq!(c.position(), (7, 9));
        assert_consistent(&c);
    }

    #[test]
    fn lines_up_updates_row_only() {
        let mut c = cursor();
        c.move_to(8, 2).unwrap();
        c.lines_up(5).unwrap();
        assert_eq!(c.position(), (3, 2));
        assert_consistent(&c);
    }

    #[test]
    fn lines_up_clamps_at_top() {
        let mut c = cursor();
        c.move_to(2, 6).unwrap();
        c.lines_up(10).unwrap();
        assert_eq!(c.position(), (1, 6));
        assert_consistent(&c);
    }

    #[test]
    fn zero_line_motion_emits_nothing() {
        let mut c = cursor();
        c.move_to(5, 5).unwrap();
        let before = c.get_ref().len();
        c.lines_down(0).unwrap();
        c.lines_up(0).unwrap();
        assert_eq!(c.get_ref().len(), before);
        assert_eq!(c.position(), (5, 5));
    }

    // ── Style passthroughs ──────────────────────────────────────────────

    #[test]
    fn style_and_clear_do_not_move() {
        let mut c = cursor();
        c.move_to(6, 12).unwrap();
        c.set_fg(Color::Red).unwrap();
        c.inverse().unwrap();
        c.inverse_off().unwrap();
        c.reset_style().unwrap();
        c.clear_screen().unwrap();
        c.hide_cursor().unwrap();
        c.show_cursor().unwrap();
        assert_eq!(c.position(), (6, 12));
        assert_consistent(&c);
    }

    // ── Restore ─────────────────────────────────────────────────────────

    #[test]
    fn restore_emits_the_shared_sequence_and_homes() {
        let mut c = cursor();
        c.move_to(9, 9).unwrap();
        c.write("junk").unwrap();
        c.restore().unwrap();
        assert!(c.get_ref().ends_with(terminal::RESTORE_SEQUENCE));
        assert_eq!(c.position(), (1, 1));
        assert_consistent(&c);
    }

    // ── Position invariant over mixed sequences ─────────────────────────

    #[test]
    fn invariant_holds_across_mixed_operations() {
        let mut c = cursor();
        c.clear_screen().unwrap();
        c.move_to(1, 1).unwrap();
        c.write("header line\n").unwrap();
        c.set_fg(Color::Red).unwrap();
        c.move_to(10, 30).unwrap();
        c.write("block one\nblock two\nblock three").unwrap();
        c.reset_style().unwrap();
        c.lines_up(4).unwrap();
        c.write("over").unwrap();
        c.lines_down(2).unwrap();
        c.move_to(24, 1).unwrap();
        c.write("footer").unwrap();
        assert_consistent(&c);
    }

    #[test]
    fn invariant_holds_for_anchored_block_at_far_column() {
        let mut c = cursor();
        c.move_to(12, 40).unwrap();
        c.write("a\nbb\nccc\ndddd").unwrap();
        assert_eq!(c.position(), (15, 44));
        assert_consistent(&c);
    }
}
