#![forbid(unsafe_code)]

//! Row rendering.
//!
//! Each log call runs straight through, with no state kept between calls
//! other than the shared config and its aggregate:
//!
//! ```text
//! resolve tag -> measure -> align -> wrap -> emit
//! ```
//!
//! The first display line carries the real left metadata:
//!
//! ```text
//! tag           | elapsed + padding + header + divider + chunk
//! .(main.rs:12) | 0.153s     connect() 🍬 opening socket to 10.0.0.1:
//! ```
//!
//! Continuation lines repeat neither tag nor header. The tag becomes blank
//! space ending in a continuation marker, and the left column is pure padding
//! so the divider lines up:
//!
//! ```text
//!             ↘ |                     🍬 8080 with a 30s timeout
//! ```
//!
//! Exactly one sink call is made per display line, in payload order.

use std::borrow::Cow;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use logsugar_text::{Color, Token, colorize, tokens, visible_width, wrap};

use crate::align::ColumnAligner;
use crate::breadcrumb::{CallSite, function_header};
use crate::config::Config;
use crate::error::{Result, SugarError};

/// Separator between metadata and payload.
pub const DIVIDER: &str = " \u{1F36C} ";
/// Visible width of [`DIVIDER`].
pub const DIVIDER_WIDTH: usize = 4;
/// Marks a physical line as the wrapped remainder of the previous one.
pub const CONTINUATION_MARKER: char = '\u{2198}';

const COMBINING_LOW_LINE: char = '\u{332}';

/// Source of elapsed time for the left metadata column.
pub type Clock = Arc<dyn Fn() -> Duration + Send + Sync>;

/// Format an elapsed duration as `seconds.millis` + `s`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}s", elapsed.as_secs_f64())
}

/// The formatter.
///
/// Thread-safe: the config snapshot is swapped atomically and the running
/// aggregate serializes its own updates.
pub struct Renderer {
    config: RwLock<Arc<Config>>,
    clock: Clock,
}

impl Renderer {
    /// Create a renderer whose clock starts now.
    ///
    /// # Errors
    ///
    /// [`SugarError::InvalidConfiguration`] if `config` does not validate.
    pub fn new(config: Config) -> Result<Self> {
        let start = Instant::now();
        Self::with_clock(config, move || start.elapsed())
    }

    /// Create a renderer with an injected clock.
    ///
    /// # Errors
    ///
    /// [`SugarError::InvalidConfiguration`] if `config` does not validate.
    pub fn with_clock<F>(config: Config, clock: F) -> Result<Self>
    where
        F: Fn() -> Duration + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self {
            config: RwLock::new(Arc::new(config)),
            clock: Arc::new(clock),
        })
    }

    /// Current config snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        match self.config.read() {
            Ok(cfg) => Arc::clone(&cfg),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the config wholesale. Calls already in flight finish with
    /// the snapshot they started with.
    ///
    /// # Errors
    ///
    /// [`SugarError::InvalidConfiguration`] if `config` does not validate;
    /// the previous config stays in place.
    pub fn reconfigure(&self, config: Config) -> Result<()> {
        config.validate()?;
        tracing::debug!(?config, "logsugar reconfigured");
        let mut slot = match self.config.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Arc::new(config);
        Ok(())
    }

    /// Elapsed time on this renderer's clock.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        (self.clock)()
    }

    /// Render one logical log call.
    ///
    /// `header` defaults to the calling function's name (see
    /// [`function_header`]). The payload is split on line breaks and
    /// wrapped to the width left over after the metadata column.
    ///
    /// # Errors
    ///
    /// [`SugarError::DegenerateLayout`] when no payload width remains, or
    /// [`SugarError::Sink`] when the sink rejects a row.
    pub fn log(&self, header: Option<&str>, payload: &str, site: &CallSite) -> Result<()> {
        let config = self.config();
        let mut rows = self.layout(&config, header, site)?;
        for chunk in wrap(payload, rows.budget)? {
            rows.emit(&chunk)?;
        }
        Ok(())
    }

    /// Render a logical call made of several lines, each wrapped on its own.
    ///
    /// An empty iterator still produces one empty row.
    ///
    /// # Errors
    ///
    /// Same as [`Renderer::log`].
    pub fn log_lines<I>(&self, header: Option<&str>, lines: I, site: &CallSite) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let config = self.config();
        let mut rows = self.layout(&config, header, site)?;
        for line in lines {
            for chunk in wrap(line.as_ref(), rows.budget)? {
                rows.emit(&chunk)?;
            }
        }
        if rows.emitted == 0 {
            rows.emit("")?;
        }
        Ok(())
    }

    /// Resolve the tag, measure and align the left column, and size the
    /// payload budget.
    fn layout<'c>(
        &self,
        config: &'c Config,
        header: Option<&str>,
        site: &CallSite,
    ) -> Result<Rows<'c>> {
        let tag = config.tag_for(site);
        let tag_width = visible_width(&tag);

        let header = header.map_or_else(|| function_header(site), str::to_string);
        let elapsed = format_elapsed(self.elapsed());
        let (info_left, info_right) = if config.colors_enabled() {
            (
                colorize(&elapsed, &[Color::Yellow]),
                colorize(&header, &[Color::BrightGreen]),
            )
        } else {
            (elapsed, header)
        };
        let left_used = visible_width(&info_left) + visible_width(&info_right);
        let minimum_left_width = left_used + 1;

        let left_width = ColumnAligner::for_config(config).align(tag_width, minimum_left_width);
        debug_assert!(left_width >= minimum_left_width);

        let budget = config
            .line_width()
            .checked_sub(left_width + DIVIDER_WIDTH)
            .filter(|&b| b > 0)
            .ok_or(SugarError::DegenerateLayout {
                max_line_width: config.line_width(),
                left_width,
                divider_width: DIVIDER_WIDTH,
            })?;

        tracing::trace!(%tag, left_width, budget, "log call laid out");

        let mut continuation_tag = " ".repeat(tag_width.saturating_sub(1));
        continuation_tag.push(CONTINUATION_MARKER);

        Ok(Rows {
            config,
            tag,
            continuation_tag,
            info_left,
            info_right,
            first_padding: left_width - left_used,
            left_width,
            budget,
            emitted: 0,
        })
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config())
            .finish_non_exhaustive()
    }
}

/// Emits the rows of one logical call.
struct Rows<'c> {
    config: &'c Config,
    tag: String,
    continuation_tag: String,
    info_left: String,
    info_right: String,
    first_padding: usize,
    left_width: usize,
    budget: usize,
    emitted: usize,
}

impl Rows<'_> {
    fn padding(&self, count: usize) -> String {
        std::iter::repeat_n(self.config.padding_char(), count).collect()
    }

    fn emit(&mut self, chunk: &str) -> Result<()> {
        let (tag, message) = if self.emitted == 0 {
            let message = format!(
                "{}{}{}{DIVIDER}{chunk}",
                self.info_left,
                self.padding(self.first_padding),
                self.info_right,
            );
            (&self.tag, message)
        } else {
            let message = format!("{}{DIVIDER}{chunk}", self.padding(self.left_width));
            (&self.continuation_tag, message)
        };

        let message = if self.config.replaces_ats() {
            replace_ats(&message)
        } else {
            Cow::Borrowed(message.as_str())
        };

        self.config.row_sink().write_row(tag, &message)?;
        self.emitted += 1;
        Ok(())
    }
}

/// Underline every standalone word `at`.
///
/// Only visible graphemes are rewritten. Decorations pass through untouched
/// and are skipped when looking for word boundaries.
fn replace_ats(message: &str) -> Cow<'_, str> {
    if !message.contains("at") {
        return Cow::Borrowed(message);
    }

    let parts: Vec<Token<'_>> = tokens(message).collect();
    let visible: Vec<usize> = parts
        .iter()
        .enumerate()
        .filter_map(|(i, t)| matches!(t, Token::Grapheme(_)).then_some(i))
        .collect();
    let is_word = |g: &str| {
        g.chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    };

    let mut underlined = vec![false; parts.len()];
    for (n, pair) in visible.windows(2).enumerate() {
        let (a, t) = (pair[0], pair[1]);
        if parts[a].as_str() != "a" || parts[t].as_str() != "t" {
            continue;
        }
        let before = n.checked_sub(1).map(|p| parts[visible[p]].as_str());
        let after = visible.get(n + 2).map(|&i| parts[i].as_str());
        if before.is_some_and(is_word) || after.is_some_and(is_word) {
            continue;
        }
        underlined[a] = true;
        underlined[t] = true;
    }

    if !underlined.contains(&true) {
        return Cow::Borrowed(message);
    }
    let mut out = String::with_capacity(message.len() + 8);
    for (part, underline) in parts.iter().zip(underlined) {
        out.push_str(part.as_str());
        if underline {
            out.push(COMBINING_LOW_LINE);
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Constant, MatchLongest};
    use crate::sink::CaptureSink;
    use std::io;

    fn site() -> CallSite {
        CallSite::new("src/app.rs", 7)
    }

    fn renderer(config: Config) -> (Renderer, CaptureSink) {
        let sink = CaptureSink::new();
        let renderer =
            Renderer::with_clock(config.sink(sink.clone()), || Duration::from_millis(1234))
                .unwrap();
        (renderer, sink)
    }

    #[test]
    fn elapsed_format() {
        assert_eq!(format_elapsed(Duration::ZERO), "0.000s");
        assert_eq!(format_elapsed(Duration::from_millis(61_005)), "61.005s");
    }

    #[test]
    fn divider_width_matches_glyphs() {
        assert_eq!(visible_width(DIVIDER), DIVIDER_WIDTH);
    }

    #[test]
    fn single_row_layout() {
        let (r, sink) = renderer(Config::new().aggregation(Constant(0)));
        r.log(Some("main()"), "hello", &site()).unwrap();
        let rows = sink.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tag, ".(app.rs:7)");
        assert_eq!(rows[0].message, "1.234s main() \u{1F36C} hello");
    }

    #[test]
    fn continuation_rows_are_blank_with_marker() {
        // left = "1.234s" + 1 + "foo()" = 12; budget = 20 - 12 - 4 = 4
        let (r, sink) = renderer(Config::new().aggregation(Constant(0)).max_line_width(20));
        r.log(Some("foo()"), "abcdefgh", &site()).unwrap();
        let rows = sink.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].message, "1.234s foo() \u{1F36C} abcd");
        assert_eq!(rows[1].tag, "          \u{2198}");
        assert_eq!(rows[1].message, format!("{}{DIVIDER}efgh", " ".repeat(12)));
    }

    #[test]
    fn alignment_pads_shorter_calls() {
        let (r, sink) = renderer(Config::new().aggregation(MatchLongest::new(75)));
        r.log(Some("a_long_function_name()"), "x", &site()).unwrap();
        r.log(Some("f()"), "y", &site()).unwrap();
        let msgs = sink.messages();
        let divider_col = |m: &str| visible_width(&m[..m.find(DIVIDER).unwrap()]);
        assert_eq!(divider_col(&msgs[0]), divider_col(&msgs[1]));
        assert!(msgs[1].starts_with("1.234s "));
        assert!(msgs[1].contains("f() \u{1F36C} y"));
    }

    #[test]
    fn custom_padding_char() {
        let (r, sink) = renderer(Config::new().aggregation(Constant(30)).padding('.'));
        r.log(Some("f()"), "y", &site()).unwrap();
        // combined target 30 minus tag width 11 leaves 19; 19 - 6 - 3 = 10 dots
        assert_eq!(sink.messages()[0], "1.234s..........f() \u{1F36C} y");
    }

    #[test]
    fn empty_payload_still_emits_a_row() {
        let (r, sink) = renderer(Config::new());
        r.log(Some("f()"), "", &site()).unwrap();
        assert_eq!(sink.len(), 1);
        assert!(sink.messages()[0].ends_with(DIVIDER));
    }

    #[test]
    fn blank_payload_emits_one_empty_row() {
        let (r, sink) = renderer(Config::new().aggregation(Constant(0)));
        r.log(Some("f()"), "    ", &site()).unwrap();
        r.log(Some("f()"), " \n\t\n ", &site()).unwrap();
        assert_eq!(
            sink.messages(),
            vec![format!("1.234s f(){DIVIDER}"), format!("1.234s f(){DIVIDER}")]
        );
    }

    #[test]
    fn multi_line_payload_emits_in_order() {
        let (r, sink) = renderer(Config::new());
        r.log(Some("f()"), "one\ntwo\n\nthree", &site()).unwrap();
        let msgs = sink.messages();
        assert_eq!(msgs.len(), 3);
        assert!(msgs[0].ends_with("one"));
        assert!(msgs[1].ends_with("two"));
        assert!(msgs[2].ends_with("three"));
    }

    #[test]
    fn header_defaults_to_function_name() {
        let (r, sink) = renderer(Config::new());
        let site = site().with_function("app::worker::drain");
        r.log(None, "x", &site).unwrap();
        assert!(sink.messages()[0].contains("drain() \u{1F36C} x"));
    }

    #[test]
    fn colors_do_not_shift_layout() {
        let (plain, plain_sink) = renderer(Config::new().aggregation(Constant(0)));
        let (colored, colored_sink) =
            renderer(Config::new().aggregation(Constant(0)).use_colors(true));
        plain.log(Some("f()"), "x", &site()).unwrap();
        colored.log(Some("f()"), "x", &site()).unwrap();
        let colored_msg = &colored_sink.messages()[0];
        assert!(colored_msg.contains("\x1b[33m1.234s\x1b[0m"));
        assert!(colored_msg.contains("\x1b[32;1mf()\x1b[0m"));
        assert_eq!(
            visible_width(colored_msg),
            visible_width(&plain_sink.messages()[0])
        );
    }

    #[test]
    fn degenerate_layout_fails_fast() {
        // left 12 + divider 4 == 16 leaves nothing
        let (r, sink) = renderer(Config::new().aggregation(Constant(0)).max_line_width(16));
        let err = r.log(Some("foo()"), "abc", &site()).unwrap_err();
        assert!(matches!(
            err,
            SugarError::DegenerateLayout {
                max_line_width: 16,
                left_width: 12,
                divider_width: 4,
            }
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn sink_errors_propagate() {
        let r = Renderer::with_clock(
            Config::new().sink(|_: &str, _: &str| -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            }),
            || Duration::ZERO,
        )
        .unwrap();
        let err = r.log(Some("f()"), "x", &site()).unwrap_err();
        assert!(matches!(err, SugarError::Sink(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        assert!(Renderer::new(Config::new().max_line_width(0)).is_err());
        assert!(Renderer::new(Config::new().padding('\u{FF3F}')).is_err());
    }

    #[test]
    fn reconfigure_swaps_snapshot() {
        let (r, _sink) = renderer(Config::new());
        let other = CaptureSink::new();
        r.reconfigure(Config::new().sink(other.clone())).unwrap();
        r.log(Some("f()"), "x", &site()).unwrap();
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn reconfigure_rejects_invalid_and_keeps_old() {
        let (r, sink) = renderer(Config::new());
        assert!(r.reconfigure(Config::new().max_line_width(0)).is_err());
        r.log(Some("f()"), "x", &site()).unwrap();
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn reconfigure_resets_aggregate() {
        let (r, _) = renderer(Config::new());
        r.log(Some("a_very_long_header_name()"), "x", &site()).unwrap();
        assert!(r.config().aggregate().get() > 0);
        r.reconfigure(Config::new()).unwrap();
        assert_eq!(r.config().aggregate().get(), 0);
    }

    #[test]
    fn log_lines_wraps_each_item() {
        let (r, sink) = renderer(Config::new().aggregation(Constant(0)).max_line_width(20));
        r.log_lines(Some("foo()"), ["abcdef", "gh"], &site()).unwrap();
        let msgs = sink.messages();
        assert_eq!(msgs.len(), 3);
        assert!(msgs[0].ends_with("abcd"));
        assert!(msgs[1].ends_with("ef"));
        assert!(msgs[2].ends_with("gh"));
    }

    #[test]
    fn log_lines_empty_item_emits_blank_row() {
        let (r, sink) = renderer(Config::new().aggregation(Constant(0)));
        r.log_lines(Some("f()"), ["one", "", "two"], &site()).unwrap();
        let msgs = sink.messages();
        assert_eq!(msgs.len(), 3);
        assert!(msgs[0].ends_with("one"));
        assert_eq!(msgs[1], format!("{}{DIVIDER}", " ".repeat(10)));
        assert!(msgs[2].ends_with("two"));
    }

    #[test]
    fn log_lines_empty_iterator_emits_one_row() {
        let (r, sink) = renderer(Config::new());
        r.log_lines(Some("f()"), Vec::<String>::new(), &site()).unwrap();
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn replace_ats_only_whole_words() {
        assert_eq!(replace_ats("look at this"), "look a\u{332}t\u{332} this");
        assert_eq!(replace_ats("at"), "a\u{332}t\u{332}");
        assert_eq!(replace_ats("cat attic at_x"), "cat attic at_x");
        assert!(matches!(replace_ats("nothing here"), Cow::Borrowed(_)));
        assert!(matches!(replace_ats("cat"), Cow::Borrowed(_)));
    }

    #[test]
    fn replace_ats_leaves_decorations_alone() {
        let link = "\x1b]8;;https://x.io/at/y\x07link\x1b]8;;\x07";
        assert_eq!(replace_ats(link), link);
        assert_eq!(
            replace_ats("\x1b[1mat\x1b[0m home"),
            "\x1b[1ma\u{332}t\u{332}\x1b[0m home"
        );
        // boundaries are judged on visible text
        assert_eq!(replace_ats("c\x1b[1mat"), "c\x1b[1mat");
    }

    #[test]
    fn replace_ats_keeps_hyperlink_targets_in_rows() {
        let (r, sink) = renderer(Config::new().aggregation(Constant(0)).replace_ats(true));
        let payload = "see \x1b]8;;https://x.io/at/y\x07link\x1b]8;;\x07 at once";
        r.log(Some("f()"), payload, &site()).unwrap();
        let msg = &sink.messages()[0];
        assert!(msg.contains("https://x.io/at/y"), "{msg:?}");
        assert!(msg.ends_with(" a\u{332}t\u{332} once"));
    }

    #[test]
    fn replace_ats_applies_to_rows_without_changing_width() {
        let (r, sink) = renderer(Config::new().aggregation(Constant(0)).replace_ats(true));
        r.log(Some("f()"), "failed at step 3", &site()).unwrap();
        let msg = &sink.messages()[0];
        assert!(msg.ends_with("failed a\u{332}t\u{332} step 3"));
        assert_eq!(visible_width(msg), visible_width("1.234s f()") + DIVIDER_WIDTH + 16);
    }
}
