#![forbid(unsafe_code)]

//! Formatter configuration.
//!
//! A [`Config`] is an immutable snapshot. Reconfiguring replaces it
//! wholesale (see [`Renderer::reconfigure`](crate::Renderer::reconfigure)),
//! and the running aggregate it owns goes with it.
//!
//! ```
//! use logsugar::Config;
//! use logsugar::aggregate::SlidingPercentile;
//! use logsugar::sink::CaptureSink;
//!
//! let config = Config::default()
//!     .max_line_width(120)
//!     .max_left_section_width(60)
//!     .aggregation(SlidingPercentile::p95())
//!     .padding('.')
//!     .sink(CaptureSink::new());
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;
use std::sync::Arc;

use logsugar_text::visible_width;

use crate::aggregate::{MatchLongest, RunningAggregate, SharedAggregate};
use crate::breadcrumb::{BreadcrumbProvider, CallSite, file_line_breadcrumb};
use crate::error::{Result, SugarError};
use crate::sink::{Sink, StdoutSink};

/// Default total budget per physical line.
pub const DEFAULT_MAX_LINE_WIDTH: usize = 4000;
/// Default outlier-rejection threshold for alignment.
pub const DEFAULT_MAX_LEFT_SECTION_WIDTH: usize = 75;

/// Formatter configuration.
#[derive(Clone)]
pub struct Config {
    max_line_width: usize,
    max_left_section_width: usize,
    aggregation: SharedAggregate,
    padding: char,
    use_colors: bool,
    replace_ats: bool,
    log_panics: bool,
    breadcrumb: BreadcrumbProvider,
    sink: Arc<dyn Sink>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_line_width: DEFAULT_MAX_LINE_WIDTH,
            max_left_section_width: DEFAULT_MAX_LEFT_SECTION_WIDTH,
            aggregation: SharedAggregate::new(MatchLongest::new(DEFAULT_MAX_LEFT_SECTION_WIDTH)),
            padding: ' ',
            use_colors: false,
            replace_ats: false,
            log_panics: true,
            breadcrumb: Arc::new(file_line_breadcrumb),
            sink: Arc::new(StdoutSink),
        }
    }
}

impl Config {
    /// Same as [`Config::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: total visible width of one physical line.
    #[must_use]
    pub fn max_line_width(mut self, width: usize) -> Self {
        self.max_line_width = width;
        self
    }

    /// Builder: left columns wider than this bypass the aggregate.
    ///
    /// They are still rendered in full, never truncated.
    #[must_use]
    pub fn max_left_section_width(mut self, width: usize) -> Self {
        self.max_left_section_width = width;
        self
    }

    /// Builder: the strategy governing column width.
    ///
    /// Use [`Constant(0)`](crate::aggregate::Constant) to disable alignment.
    #[must_use]
    pub fn aggregation(mut self, aggregate: impl RunningAggregate + 'static) -> Self {
        self.aggregation = SharedAggregate::new(aggregate);
        self
    }

    /// Builder: share an existing aggregate instance.
    #[must_use]
    pub fn shared_aggregation(mut self, aggregate: SharedAggregate) -> Self {
        self.aggregation = aggregate;
        self
    }

    /// Builder: fill character for left-column alignment.
    ///
    /// Must occupy exactly one terminal cell.
    #[must_use]
    pub fn padding(mut self, padding: char) -> Self {
        self.padding = padding;
        self
    }

    /// Builder: color the elapsed time and header.
    #[must_use]
    pub fn use_colors(mut self, enabled: bool) -> Self {
        self.use_colors = enabled;
        self
    }

    /// Builder: rewrite the word `at` as `a̲t̲` so IDE consoles do not
    /// mistake log lines for stack frames.
    #[must_use]
    pub fn replace_ats(mut self, enabled: bool) -> Self {
        self.replace_ats = enabled;
        self
    }

    /// Builder: log panics through the formatter once installed globally.
    #[must_use]
    pub fn log_panics(mut self, enabled: bool) -> Self {
        self.log_panics = enabled;
        self
    }

    /// Builder: how the sink tag is derived from a call site.
    #[must_use]
    pub fn breadcrumb<F>(mut self, provider: F) -> Self
    where
        F: Fn(&CallSite) -> String + Send + Sync + 'static,
    {
        self.breadcrumb = Arc::new(provider);
        self
    }

    /// Builder: destination for rendered rows.
    #[must_use]
    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Builder: share an existing sink.
    #[must_use]
    pub fn shared_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = sink;
        self
    }

    /// Check every value is in range.
    ///
    /// # Errors
    ///
    /// [`SugarError::InvalidConfiguration`] for a zero `max_line_width`, or
    /// a `padding` character that is not exactly one cell wide.
    pub fn validate(&self) -> Result<()> {
        if self.max_line_width == 0 {
            return Err(SugarError::invalid("max_line_width", "must be at least 1"));
        }
        let one_cell = visible_width(self.padding.encode_utf8(&mut [0; 4])) == 1;
        if self.padding.is_control() || !one_cell {
            return Err(SugarError::invalid(
                "padding",
                format!("{:?} is not one cell wide", self.padding),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn line_width(&self) -> usize {
        self.max_line_width
    }

    #[must_use]
    pub fn left_section_limit(&self) -> usize {
        self.max_left_section_width
    }

    #[must_use]
    pub fn aggregate(&self) -> &SharedAggregate {
        &self.aggregation
    }

    #[must_use]
    pub fn padding_char(&self) -> char {
        self.padding
    }

    #[must_use]
    pub fn colors_enabled(&self) -> bool {
        self.use_colors
    }

    #[must_use]
    pub fn replaces_ats(&self) -> bool {
        self.replace_ats
    }

    #[must_use]
    pub fn logs_panics(&self) -> bool {
        self.log_panics
    }

    /// Resolve the sink tag for `site`.
    #[must_use]
    pub fn tag_for(&self, site: &CallSite) -> String {
        (self.breadcrumb)(site)
    }

    #[must_use]
    pub fn row_sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("max_line_width", &self.max_line_width)
            .field("max_left_section_width", &self.max_left_section_width)
            .field("aggregation", &self.aggregation)
            .field("padding", &self.padding)
            .field("use_colors", &self.use_colors)
            .field("replace_ats", &self.replace_ats)
            .field("log_panics", &self.log_panics)
            .finish_non_exhaustive()
    }
}
