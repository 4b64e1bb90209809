#![forbid(unsafe_code)]

//! Text handling for logsugar.
//!
//! This crate provides the width-aware primitives the formatter is built on:
//! - [`visible_width`] - cell width of decorated (escape-styled) text
//! - [`strip_decorations`] - the visible projection of decorated text
//! - [`colorize`] / [`Color`] - SGR styling helpers
//! - [`wrap()`] - lazy, decoration-safe chunking into fixed-width lines
//!
//! # Example
//! ```
//! use logsugar_text::{Color, colorize, visible_width, wrap};
//!
//! let header = colorize("main()", &[Color::BrightGreen]);
//! assert_eq!(visible_width(&header), 6);
//!
//! let lines: Vec<String> = wrap("first\nsecond line", 6).unwrap().collect();
//! assert_eq!(lines, vec!["first", "second", " line"]);
//! ```

pub mod ansi;
pub mod wrap;

pub use ansi::{
    Color, SGR_RESET, Token, Tokens, colorize, has_visible_content, is_reset, scan_decoration,
    strip_decorations, tokens, visible_width,
};
pub use wrap::{Wrap, WrapError, wrap, wrap_to_vec};
