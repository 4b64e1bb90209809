#![forbid(unsafe_code)]

//! Zero-width decoration handling.
//!
//! Log payloads routinely carry terminal styling escapes. They occupy no
//! cells on screen, so every width computation in this crate runs over the
//! *visible projection* of a string: the text with all decorations removed.
//!
//! # Recognised decorations
//!
//! | Kind | Shape | Terminator |
//! |------|-------|------------|
//! | CSI | `ESC [ params intermediates final` | final byte `0x40..=0x7E` |
//! | OSC | `ESC ] ...` | `BEL` or `ESC \` |
//! | Two-byte | `ESC x` | the single character after `ESC` |
//!
//! An unterminated sequence swallows the rest of its input. It is still
//! zero width and is never split.
//!
//! # Example
//! ```
//! use logsugar_text::ansi::{Color, colorize, strip_decorations, visible_width};
//!
//! let red = colorize("alert", &[Color::BrightRed]);
//! assert_eq!(red, "\x1b[31;1malert\x1b[0m");
//! assert_eq!(strip_decorations(&red), "alert");
//! assert_eq!(visible_width(&red), 5);
//! ```

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ESC: char = '\x1b';
const BEL: u8 = 0x07;

/// SGR reset: `CSI 0 m`.
pub const SGR_RESET: &str = "\x1b[0m";

// =============================================================================
// Scanning
// =============================================================================

/// Length in bytes of the decoration at the start of `text`, if any.
///
/// Returns `None` when `text` does not start with `ESC`.
#[must_use]
pub fn scan_decoration(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&(ESC as u8)) {
        return None;
    }

    let Some(&introducer) = bytes.get(1) else {
        return Some(1);
    };

    match introducer {
        b'[' => {
            for (i, &b) in bytes.iter().enumerate().skip(2) {
                match b {
                    // parameter and intermediate bytes
                    0x20..=0x3F => {}
                    0x40..=0x7E => return Some(i + 1),
                    // malformed: end the sequence before the stray byte
                    _ => return Some(i),
                }
            }
            Some(bytes.len())
        }
        b']' => {
            let mut i = 2;
            while i < bytes.len() {
                if bytes[i] == BEL {
                    return Some(i + 1);
                }
                if bytes[i] == ESC as u8 && bytes.get(i + 1) == Some(&b'\\') {
                    return Some(i + 2);
                }
                i += 1;
            }
            Some(bytes.len())
        }
        _ => {
            let next = text[1..].chars().next().map_or(0, char::len_utf8);
            Some(1 + next)
        }
    }
}

/// Whether `seq` is an SGR reset (`ESC[0m` or `ESC[m`).
#[inline]
#[must_use]
pub fn is_reset(seq: &str) -> bool {
    seq == SGR_RESET || seq == "\x1b[m"
}

/// A lexical unit of decorated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A zero-width styling sequence.
    Decoration(&'a str),
    /// One extended grapheme cluster of visible text.
    Grapheme(&'a str),
}

impl Token<'_> {
    /// Display width in terminal cells.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Decoration(_) => 0,
            Self::Grapheme(g) => g.width(),
        }
    }

    /// The underlying text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Decoration(s) | Self::Grapheme(s) => s,
        }
    }
}

/// Iterator over the [`Token`]s of a string.
///
/// Cloning is cheap, which lets callers look ahead without consuming.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    /// The not-yet-tokenized remainder.
    #[must_use]
    pub fn as_str(&self) -> &'a str {
        self.rest
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        // ESC is a grapheme control, so it never merges with neighbours.
        if let Some(len) = scan_decoration(self.rest) {
            let (seq, rest) = self.rest.split_at(len);
            self.rest = rest;
            return Some(Token::Decoration(seq));
        }

        let grapheme = self.rest.graphemes(true).next()?;
        self.rest = &self.rest[grapheme.len()..];
        Some(Token::Grapheme(grapheme))
    }
}

/// Tokenize decorated text.
#[must_use]
pub fn tokens(text: &str) -> Tokens<'_> {
    Tokens { rest: text }
}

// =============================================================================
// Measurement
// =============================================================================

/// The visible projection of `text` (all decorations removed).
#[must_use]
pub fn strip_decorations(text: &str) -> String {
    if !text.contains(ESC) {
        return text.to_string();
    }
    tokens(text)
        .filter_map(|t| match t {
            Token::Grapheme(g) => Some(g),
            Token::Decoration(_) => None,
        })
        .collect()
}

/// Width in terminal cells of the visible projection of `text`.
///
/// Summed per grapheme cluster, which is exactly how the wrapper fills lines.
#[must_use]
pub fn visible_width(text: &str) -> usize {
    tokens(text).map(|t| t.width()).sum()
}

/// Whether `text` contains anything besides decorations.
#[must_use]
pub fn has_visible_content(text: &str) -> bool {
    tokens(text).any(|t| matches!(t, Token::Grapheme(_)))
}

// =============================================================================
// Colors
// =============================================================================

/// The SGR colors used by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Green,
    BrightGreen,
    Yellow,
    BrightYellow,
    Blue,
    BrightBlue,
    Red,
    BrightRed,
    BrightBlack,
    RedBg,
    WhiteBg,
    BrightYellowBg,
}

impl Color {
    /// The SGR escape selecting this color.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Green => "\x1b[32m",
            Self::BrightGreen => "\x1b[32;1m",
            Self::Yellow => "\x1b[33m",
            Self::BrightYellow => "\x1b[33;1m",
            Self::Blue => "\x1b[34m",
            Self::BrightBlue => "\x1b[34;1m",
            Self::Red => "\x1b[31m",
            Self::BrightRed => "\x1b[31;1m",
            Self::BrightBlack => "\x1b[30;1m",
            Self::RedBg => "\x1b[41m",
            Self::WhiteBg => "\x1b[47m",
            Self::BrightYellowBg => "\x1b[43;1m",
        }
    }
}

/// Wrap `text` in the given colors followed by a reset.
///
/// An empty color list returns `text` unchanged.
#[must_use]
pub fn colorize(text: &str, colors: &[Color]) -> String {
    if colors.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + colors.len() * 8 + SGR_RESET.len());
    for color in colors {
        out.push_str(color.code());
    }
    out.push_str(text);
    out.push_str(SGR_RESET);
    out
}
