// SPDX-License-Identifier: MIT
//
// panes — a minimal two-pane terminal display.
//
// The binary wires the terminal layer to the application:
//
//   panes-term → raw mode, key decoding, cursor tracking, signals
//   this file  → frame renderer, insert sub-mode, controller loop
//
// Each keypress flows through:
//
//   stdin → read_key → controller dispatch → renderer / editor
//        → Cursor → escape sequences + position bookkeeping
//
// Layout (border glyphs in the configured color):
//
//   +---------+--------------------+
//   |  left   |  right             |   ← rows - 8 body lines
//   +         +--------------------+   ← mid rule, left span open
//   |         |                    |   ← 5-line lower band
//   +---------+--------------------+
//
// Resize and interrupt arrive asynchronously. The handlers only set a
// flag or terminate; every repaint here runs from the loop, between
// discrete operations, so partial output is never interleaved with an
// in-flight write.

use std::io::{self, Write};
use std::process;

use unicode_width::UnicodeWidthStr;

use panes_term::ansi::Color;
use panes_term::cursor::Cursor;
use panes_term::error::{Error, Result};
use panes_term::input::{Key, KeySource, PosixInput};
use panes_term::signal;
use panes_term::terminal::{self, Size};

/// Ctrl-C arrives as a plain byte because raw mode disables ISIG.
const CTRL_C: u8 = 0x03;
/// Ctrl-L forces a repaint — the fallback on platforms without SIGWINCH.
const CTRL_L: u8 = 0x0C;

/// Display width of a string, saturated into cell coordinates.
fn text_width(s: &str) -> u16 {
    u16::try_from(s.width()).unwrap_or(u16::MAX)
}

// ─── Config ─────────────────────────────────────────────────────────────────

/// Application settings. One owned table instead of scattered globals.
#[derive(Debug, Clone)]
struct Config {
    /// Key that terminates the loop cleanly.
    quit_key: char,
    /// Key that activates the insert sub-mode.
    insert_key: char,
    /// Column that status text, echo, and edit sessions anchor to.
    anchor_col: u16,
    /// Row of the first status line inside the frame.
    status_row: u16,
    /// Row where ordinary keys echo their identity.
    echo_row: u16,
    /// Color of the border glyphs and the size readout.
    border_color: Color,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quit_key: 'q',
            insert_key: 'i',
            anchor_col: 5,
            status_row: 3,
            echo_row: 10,
            border_color: Color::Red,
        }
    }
}

// ─── Renderer ───────────────────────────────────────────────────────────────

/// Rows reserved for chrome: top rule, mid rule, the lower band, and
/// the bottom rule. The upper body gets everything else.
const CHROME_ROWS: u16 = 8;
/// Height of the band between the mid and bottom rules.
const LOWER_BAND_ROWS: u16 = 5;

/// Computed pane geometry for one terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    /// Interior width of the left pane.
    left: usize,
    /// Interior width of the right pane.
    right: usize,
    /// Body rows between the top and mid rules.
    upper: u16,
}

/// Split the terminal: left pane a third of the width, right pane the
/// remainder minus the three border columns. Saturating throughout so
/// absurdly small terminals degrade instead of panicking.
fn layout(size: Size) -> Layout {
    let cols = size.cols as usize;
    let left = cols / 3;
    Layout {
        left,
        right: cols.saturating_sub(3 + left),
        upper: size.rows.saturating_sub(CHROME_ROWS),
    }
}

/// A run of one character, for border fills and blanking.
fn run_of(c: char, n: usize) -> String {
    c.to_string().repeat(n)
}

/// Draw a horizontal rule: `+` posts with separate fills per pane span.
/// The mid rule passes a blank left fill, leaving that span open.
fn rule<W: Write>(
    cur: &mut Cursor<W>,
    cfg: &Config,
    row: u16,
    lay: Layout,
    left_fill: char,
    right_fill: char,
) -> io::Result<()> {
    cur.move_to(row, 1)?;
    cur.set_fg(cfg.border_color)?;
    cur.write(&format!(
        "+{}+{}+",
        run_of(left_fill, lay.left),
        run_of(right_fill, lay.right)
    ))?;
    cur.reset_style()
}

/// Draw one body row: colored `|` posts with open interiors.
fn body_row<W: Write>(cur: &mut Cursor<W>, cfg: &Config, row: u16, lay: Layout) -> io::Result<()> {
    cur.move_to(row, 1)?;
    for span in [lay.left, lay.right] {
        cur.set_fg(cfg.border_color)?;
        cur.write("|")?;
        cur.reset_style()?;
        cur.write(&run_of(' ', span))?;
    }
    cur.set_fg(cfg.border_color)?;
    cur.write("|")?;
    cur.reset_style()
}

/// Paint the full frame: clear, home, the two-pane border layout, and
/// the status lines.
///
/// Idempotent by construction — every row is addressed absolutely and
/// the call ends with the cursor homed, so repeated calls at the same
/// size emit identical bytes and land on the same position. Never
/// called from a signal handler; only the loop invokes it.
fn paint_frame<W: Write>(cur: &mut Cursor<W>, size: Size, cfg: &Config) -> io::Result<()> {
    let lay = layout(size);

    cur.clear_screen()?;
    cur.move_to(1, 1)?;

    let mut row = 1u16;
    rule(cur, cfg, row, lay, '-', '-')?;
    for _ in 0..lay.upper {
        row += 1;
        body_row(cur, cfg, row, lay)?;
    }
    row += 1;
    rule(cur, cfg, row, lay, ' ', '-')?;
    for _ in 0..LOWER_BAND_ROWS {
        row += 1;
        body_row(cur, cfg, row, lay)?;
    }
    row += 1;
    rule(cur, cfg, row, lay, '-', '-')?;

    cur.move_to(cfg.status_row, cfg.anchor_col)?;
    cur.write(&format!(
        "Press '{}' to quit, '{}' to insert.",
        cfg.quit_key, cfg.insert_key
    ))?;
    cur.move_to(cfg.status_row + 1, cfg.anchor_col)?;
    cur.set_fg(cfg.border_color)?;
    cur.write(&format!(
        "terminal size: {} rows x {} cols",
        size.rows, size.cols
    ))?;
    cur.reset_style()?;

    cur.move_to(1, 1)
}

// ─── InputEditor ────────────────────────────────────────────────────────────

/// Inverse-video label drawn one row above the edit anchor.
const PROMPT_LABEL: &str = "INSERT";
/// Plain hint following the label.
const PROMPT_HINT: &str = " type your message, Esc to finish";

/// What the editor tells the session loop after a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditorAction {
    /// Stay in the editing session.
    Continue,
    /// Escape pressed — the session is over.
    Done,
}

/// One text-entry session of the insert sub-mode.
///
/// The session owns its buffer and its fixed anchor. Every keystroke
/// redraws the whole buffer from the anchor; blanking always covers the
/// widest and tallest region this session has ever rendered, so no
/// stale glyph survives a shrink. The buffer is discarded on exit —
/// nothing downstream ever sees the text.
struct InputEditor {
    buffer: String,
    anchor_row: u16,
    anchor_col: u16,
    /// Widest line this session has rendered.
    widest: u16,
    /// Most lines this session has rendered.
    tallest: u16,
}

impl InputEditor {
    /// Start a session: draw the prompt above the anchor and begin with
    /// an empty buffer.
    fn begin<W: Write>(cur: &mut Cursor<W>, anchor_row: u16, anchor_col: u16) -> io::Result<Self> {
        cur.move_to(anchor_row.saturating_sub(1).max(1), anchor_col)?;
        cur.inverse()?;
        cur.write(PROMPT_LABEL)?;
        cur.inverse_off()?;
        cur.write(PROMPT_HINT)?;
        cur.move_to(anchor_row, anchor_col)?;
        Ok(Self {
            buffer: String::new(),
            anchor_row,
            anchor_col,
            widest: 0,
            tallest: 0,
        })
    }

    /// Handle one keystroke.
    fn handle<W: Write>(&mut self, cur: &mut Cursor<W>, key: Key) -> io::Result<EditorAction> {
        match key {
            Key::Escape => return Ok(EditorAction::Done),
            k if k.is_backspace() => {
                if self.buffer.pop().is_some() {
                    self.redraw(cur)?;
                }
            }
            k if k.is_enter() => {
                self.buffer.push('\n');
                self.redraw(cur)?;
            }
            Key::Char(c) => {
                self.buffer.push(c);
                self.redraw(cur)?;
            }
            // Arrows and other control bytes have no meaning here.
            _ => {}
        }
        Ok(EditorAction::Continue)
    }

    /// End the session: blank the rendered region and the prompt line,
    /// dropping the buffer.
    fn finish<W: Write>(self, cur: &mut Cursor<W>) -> io::Result<()> {
        self.blank_region(cur)?;
        let prompt_width = text_width(PROMPT_LABEL) + text_width(PROMPT_HINT);
        cur.move_to(self.anchor_row.saturating_sub(1).max(1), self.anchor_col)?;
        cur.write(&run_of(' ', prompt_width as usize))?;
        Ok(())
    }

    /// Blank then re-emit the full buffer from the anchor. Embedded
    /// line breaks re-anchor automatically through `Cursor::write`.
    fn redraw<W: Write>(&mut self, cur: &mut Cursor<W>) -> io::Result<()> {
        self.blank_region(cur)?;
        cur.move_to(self.anchor_row, self.anchor_col)?;
        cur.write(&self.buffer)?;

        let mut lines = 0u16;
        let mut widest = 0u16;
        for line in self.buffer.split('\n') {
            lines += 1;
            widest = widest.max(text_width(line));
        }
        self.tallest = self.tallest.max(lines);
        self.widest = self.widest.max(widest);
        Ok(())
    }

    /// Overwrite the session's longest-ever-rendered region with spaces.
    fn blank_region<W: Write>(&self, cur: &mut Cursor<W>) -> io::Result<()> {
        let blank = run_of(' ', self.widest as usize);
        for i in 0..self.tallest {
            cur.move_to(self.anchor_row.saturating_add(i), self.anchor_col)?;
            cur.write(&blank)?;
        }
        Ok(())
    }
}

// ─── Controller ─────────────────────────────────────────────────────────────

/// Human-readable identity of a key, for the status echo.
fn describe(key: Key) -> String {
    match key {
        Key::Char(c) => format!("key '{c}'"),
        Key::Up => "key Up".to_owned(),
        Key::Down => "key Down".to_owned(),
        Key::Left => "key Left".to_owned(),
        Key::Right => "key Right".to_owned(),
        Key::Escape => "key Esc".to_owned(),
        Key::Control(b) => match b {
            0x0D | 0x0A => "key Enter".to_owned(),
            0x09 => "key Tab".to_owned(),
            0x7F | 0x08 => "key Backspace".to_owned(),
            // A control byte is its letter with bit 6 cleared.
            _ => format!("key Ctrl-{}", char::from(b + 0x40)),
        },
    }
}

/// The main dispatch loop: owns the cursor, the mode transitions, and
/// the consumption of lifecycle flags.
struct Controller<W: Write> {
    cursor: Cursor<W>,
    config: Config,
    /// Widest echo line drawn so far, for stale-glyph blanking.
    echo_width: u16,
}

impl<W: Write> Controller<W> {
    fn new(out: W, config: Config) -> Self {
        Self {
            cursor: Cursor::new(out),
            config,
            echo_width: 0,
        }
    }

    /// Repaint the frame with a fresh size query — the size is never
    /// cached across a resize boundary.
    fn repaint(&mut self) -> io::Result<()> {
        paint_frame(&mut self.cursor, terminal::size(), &self.config)
    }

    /// Run until the quit key. The blocking `read_key` is the only
    /// suspension point; the resize flag is consumed at the top of each
    /// iteration, between discrete operations.
    fn run_loop(&mut self, input: &mut impl KeySource) -> Result<()> {
        self.cursor.hide_cursor()?;
        self.repaint()?;
        self.cursor.show_cursor()?;

        loop {
            if signal::take_resize() {
                self.repaint()?;
            }

            let key = match input.read_key() {
                Ok(key) => key,
                // A signal woke the read; loop back to the flag check.
                Err(Error::Interrupted) => continue,
                Err(e) => return Err(e),
            };

            match key {
                Key::Char(c) if c == self.config.quit_key => return Ok(()),
                Key::Char(c) if c == self.config.insert_key => self.insert_session(input)?,
                Key::Control(CTRL_C) => return Ok(()),
                Key::Control(CTRL_L) => self.repaint()?,
                key => self.echo(key)?,
            }
        }
    }

    /// Run one insert session to completion. Blocking — there is one
    /// input stream, so the main loop simply waits.
    fn insert_session(&mut self, input: &mut impl KeySource) -> Result<()> {
        let size = terminal::size();
        let anchor_row = size.rows.saturating_sub(3).max(2);
        let mut editor = InputEditor::begin(&mut self.cursor, anchor_row, self.config.anchor_col)?;

        loop {
            let key = match input.read_key() {
                Ok(key) => key,
                // The resize flag stays pending until the main loop.
                Err(Error::Interrupted) => continue,
                Err(e) => return Err(e),
            };
            if editor.handle(&mut self.cursor, key)? == EditorAction::Done {
                break;
            }
        }

        editor.finish(&mut self.cursor)?;
        Ok(())
    }

    /// Echo a key's identity at the fixed status location, blanking out
    /// to the widest echo yet so shorter names leave no residue.
    fn echo(&mut self, key: Key) -> io::Result<()> {
        let text = describe(key);
        self.cursor
            .move_to(self.config.echo_row, self.config.anchor_col)?;
        self.cursor.write(&run_of(' ', self.echo_width as usize))?;
        self.cursor
            .move_to(self.config.echo_row, self.config.anchor_col)?;
        self.cursor.write(&text)?;
        self.echo_width = self.echo_width.max(text_width(&text));
        Ok(())
    }
}

/// Wire everything together and guarantee cleanup on every return path:
/// display restore first (best-effort even when the termios restore
/// fails), then the line discipline.
fn run(config: Config) -> Result<()> {
    // Fails with TerminalUnavailable before any raw-mode mutation.
    let mut input = PosixInput::acquire()?;
    signal::install_handlers();

    let mut controller = Controller::new(io::stdout(), config);
    let result = controller.run_loop(&mut input);

    let display = controller.cursor.restore();
    let released = input.release();

    result?;
    display?;
    released
}

fn main() {
    if let Err(e) = run(Config::default()) {
        eprintln!("panes: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
