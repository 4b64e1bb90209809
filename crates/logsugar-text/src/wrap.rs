#![forbid(unsafe_code)]

//! Decoration-safe payload wrapping.
//!
//! Payloads are cut into display lines of at most `budget` visible cells:
//! - Embedded `'\n'` split the payload first. Runs of breaks collapse, so
//!   blank lines inside a payload are not reproduced.
//! - Cuts happen on grapheme boundaries (never inside an emoji, ZWJ sequence
//!   or combining sequence). A single grapheme wider than the budget gets a
//!   line of its own.
//! - Decorations are zero width and travel whole. When a cut lands inside a
//!   run of decorations, leading SGR resets close the earlier line and the
//!   rest open the later one.
//! - Blank segments (nothing but undecorated whitespace) are dropped like
//!   empty ones. Styled whitespace is content.
//! - A payload with no visible content still yields exactly one line.
//!
//! Joining every produced line reproduces the payload minus its `'\n'` and
//! minus the whitespace of blank segments.
//!
//! # Example
//! ```
//! use logsugar_text::wrap::wrap;
//!
//! let lines: Vec<String> = wrap("hello world", 5).unwrap().collect();
//! assert_eq!(lines, vec!["hello", " worl", "d"]);
//!
//! let colored: Vec<String> = wrap("\x1b[31mabcd\x1b[0m", 2).unwrap().collect();
//! assert_eq!(colored, vec!["\x1b[31mab", "cd\x1b[0m"]);
//! ```

use std::fmt;
use std::str::Split;

use crate::ansi::{self, Token, Tokens, is_reset};

/// Error returned when wrapping cannot produce any line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapError {
    /// The visible width budget was zero.
    ZeroBudget,
}

impl fmt::Display for WrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBudget => write!(f, "wrap budget must be at least one cell"),
        }
    }
}

impl std::error::Error for WrapError {}

/// Lazily wrap `text` into lines of at most `budget` visible cells.
///
/// # Errors
///
/// Returns [`WrapError::ZeroBudget`] when `budget` is zero.
pub fn wrap(text: &str, budget: usize) -> Result<Wrap<'_>, WrapError> {
    if budget == 0 {
        return Err(WrapError::ZeroBudget);
    }
    Ok(Wrap {
        segments: text.split('\n'),
        chunker: None,
        budget,
        carry: String::new(),
        held: None,
        produced: false,
        finished: false,
    })
}

/// Convenience wrapper that collects every line.
///
/// # Errors
///
/// Returns [`WrapError::ZeroBudget`] when `budget` is zero.
pub fn wrap_to_vec(text: &str, budget: usize) -> Result<Vec<String>, WrapError> {
    Ok(wrap(text, budget)?.collect())
}

/// Iterator returned by [`wrap`].
///
/// Holds at most one finished line back, so decorations that trail the last
/// visible grapheme can still be attached to it.
#[derive(Debug)]
pub struct Wrap<'a> {
    segments: Split<'a, char>,
    chunker: Option<Chunker<'a>>,
    budget: usize,
    /// Decorations from segments without visible content, waiting for a line.
    carry: String,
    held: Option<String>,
    produced: bool,
    finished: bool,
}

impl Wrap<'_> {
    /// Produce the next line from the segment stream, ignoring the hold slot.
    fn advance(&mut self) -> Option<String> {
        loop {
            if let Some(chunker) = self.chunker.as_mut() {
                if let Some(mut line) = chunker.next_line() {
                    if !self.carry.is_empty() {
                        line.insert_str(0, &self.carry);
                        self.carry.clear();
                    }
                    return Some(line);
                }
                self.chunker = None;
            }

            let segment = self.segments.next()?;
            if is_blank(segment) {
                continue;
            }
            if ansi::has_visible_content(segment) {
                self.chunker = Some(Chunker::new(segment, self.budget));
            } else {
                self.carry.push_str(segment);
            }
        }
    }
}

impl Iterator for Wrap<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if let Some(line) = self.advance() {
            self.produced = true;
            return match self.held.replace(line) {
                Some(previous) => Some(previous),
                None => self.next(),
            };
        }

        self.finished = true;
        let carry = std::mem::take(&mut self.carry);
        match self.held.take() {
            Some(mut last) => {
                last.push_str(&carry);
                Some(last)
            }
            None if !self.produced => Some(carry),
            None => None,
        }
    }
}

/// Cuts one newline-free segment into budget-sized lines.
#[derive(Debug)]
struct Chunker<'a> {
    tokens: Tokens<'a>,
    budget: usize,
    /// Decorations that open the next line.
    pending: String,
}

impl<'a> Chunker<'a> {
    fn new(segment: &'a str, budget: usize) -> Self {
        Self {
            tokens: ansi::tokens(segment),
            budget,
            pending: String::new(),
        }
    }

    fn next_line(&mut self) -> Option<String> {
        if self.tokens.as_str().is_empty() {
            return None;
        }

        let mut line = std::mem::take(&mut self.pending);
        let mut run = String::new();
        let mut width = 0;
        let mut has_grapheme = false;

        loop {
            let mut probe = self.tokens.clone();
            match probe.next() {
                None => break,
                Some(Token::Decoration(seq)) => run.push_str(seq),
                Some(Token::Grapheme(g)) => {
                    let w = Token::Grapheme(g).width();
                    if has_grapheme && width + w > self.budget {
                        // The grapheme opens the next line; leave it unconsumed.
                        let split = leading_reset_len(&run);
                        line.push_str(&run[..split]);
                        self.pending.push_str(&run[split..]);
                        return Some(line);
                    }
                    if w > self.budget {
                        tracing::trace!(grapheme = g, width = w, budget = self.budget, "grapheme exceeds wrap budget");
                    }
                    line.push_str(&run);
                    run.clear();
                    line.push_str(g);
                    width += w;
                    has_grapheme = true;
                }
            }
            self.tokens = probe;
        }

        line.push_str(&run);
        Some(line)
    }
}

fn is_blank(segment: &str) -> bool {
    segment.chars().all(char::is_whitespace)
}

/// Byte length of the leading run of SGR resets in a decoration run.
fn leading_reset_len(run: &str) -> usize {
    let mut len = 0;
    for token in ansi::tokens(run) {
        match token {
            Token::Decoration(seq) if is_reset(seq) => len += seq.len(),
            _ => break,
        }
    }
    len
}
