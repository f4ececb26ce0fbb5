// SPDX-License-Identifier: MIT
//
// panes-term — raw terminal control for panes.
//
// A small terminal backend built directly on ANSI escape sequences and
// POSIX termios, with no terminal-control library in between. The crate
// owns three hard problems: cursor-position bookkeeping that stays
// byte-exact with the emitted escape stream, crash-safe raw-mode entry
// and exit on every termination path, and single-keystroke input
// decoding that disambiguates a bare Escape from the start of an arrow
// sequence with a bounded poll.
//
// Every byte sent to the terminal is accounted for: `Cursor` tracks the
// position a terminal emulator would compute by replaying the output,
// and the tests verify exactly that.

pub mod ansi;
pub mod cursor;
pub mod error;
pub mod input;
pub mod signal;
pub mod terminal;

pub use error::{Error, Result};
