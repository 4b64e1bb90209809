#![forbid(unsafe_code)]

//! Adaptive console log formatter.
//!
//! Every log call becomes one or more physical rows of the form
//!
//! ```text
//! tag | elapsed  header 🍬 payload
//! ```
//!
//! where the metadata column on the left self-aligns across calls:
//! - [`aggregate`] - running statistics that pick the column width
//! - [`ColumnAligner`] - applies the statistic, rejecting outliers
//! - [`Renderer`] - lays out, wraps and emits rows
//! - [`sink`] - where rows go (stdout, any writer, an in-memory capture)
//! - [`global`] - a process-wide renderer plus [`log!`] / [`log_wtf!`]
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use logsugar::{CallSite, Config, Renderer};
//! use logsugar::aggregate::Constant;
//! use logsugar::sink::CaptureSink;
//!
//! let sink = CaptureSink::new();
//! let config = Config::default()
//!     .max_line_width(40)
//!     .aggregation(Constant(0))
//!     .sink(sink.clone());
//! let renderer = Renderer::with_clock(config, || Duration::from_millis(250)).unwrap();
//!
//! renderer
//!     .log(Some("main()"), "started", &CallSite::new("src/main.rs", 3))
//!     .unwrap();
//! assert_eq!(sink.tags(), vec![".(main.rs:3)"]);
//! assert_eq!(sink.messages(), vec!["0.250s main() \u{1F36C} started"]);
//! ```

pub mod aggregate;
pub mod align;
pub mod breadcrumb;
pub mod config;
pub mod error;
pub mod global;
pub mod helpers;
pub mod inspect;
pub mod render;
pub mod sink;

#[cfg(feature = "tracing-layer")]
pub mod layer;

pub use aggregate::{Constant, MatchLongest, RunningAggregate, SharedAggregate, SlidingPercentile};
pub use align::ColumnAligner;
pub use breadcrumb::{BreadcrumbProvider, CallSite, file_line_breadcrumb, function_header};
pub use config::{Config, DEFAULT_MAX_LEFT_SECTION_WIDTH, DEFAULT_MAX_LINE_WIDTH};
pub use error::{Result, SugarError};
pub use helpers::MAX_DIVIDER_WEIGHT;
pub use inspect::Inspect;
pub use render::{CONTINUATION_MARKER, Clock, DIVIDER, DIVIDER_WIDTH, Renderer, format_elapsed};
pub use sink::{CaptureSink, Sink, StdoutSink, WriterSink};

pub use logsugar_text::{Color, colorize, strip_decorations, visible_width};
