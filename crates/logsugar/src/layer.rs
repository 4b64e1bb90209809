#![forbid(unsafe_code)]

//! `tracing` integration.
//!
//! [`SugarLayer`] turns every `tracing` event into one formatter call:
//!
//! ```text
//! .(server.rs:88) | 2.031s  server 🍬 INFO accepted connection peer=10.0.0.7
//! ```
//!
//! The header is the last segment of the event target, the tag comes from
//! the event's file/line, and the payload is the level, the message and any
//! structured fields.
//!
//! ```no_run
//! use logsugar::layer::SugarLayer;
//! use tracing_subscriber::prelude::*;
//!
//! tracing_subscriber::registry().with(SugarLayer::global()).init();
//! tracing::info!(port = 8080, "listening");
//! ```

use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::breadcrumb::CallSite;
use crate::global;
use crate::render::Renderer;

/// Collects message and fields from an event.
#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl EventVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name(), value));
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value.to_string());
    }
}

fn level_str(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Header for an event target: its last path segment.
fn target_header(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// The formatter's own diagnostics must not loop back into it.
fn is_own_target(target: &str) -> bool {
    ["logsugar", "logsugar_text"].into_iter().any(|own| {
        target
            .strip_prefix(own)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// A `tracing_subscriber::Layer` that renders events through a [`Renderer`].
///
/// Rendering errors cannot propagate out of a layer; they are dropped.
pub struct SugarLayer {
    renderer: Option<Arc<Renderer>>,
}

impl SugarLayer {
    /// Render through a specific renderer.
    #[must_use]
    pub fn new(renderer: Arc<Renderer>) -> Self {
        Self {
            renderer: Some(renderer),
        }
    }

    /// Render through whatever renderer is installed globally when each
    /// event fires.
    #[must_use]
    pub fn global() -> Self {
        Self { renderer: None }
    }

    fn write_event(&self, event: &Event<'_>) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut payload = String::from(level_str(*metadata.level()));
        if let Some(message) = visitor.message {
            payload.push(' ');
            payload.push_str(&message);
        }
        for (key, value) in &visitor.fields {
            let _ = write!(payload, " {key}={value}");
        }

        let site = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => CallSite::new(file, line),
            (Some(file), None) => CallSite::new(file, 0),
            _ => CallSite::UNKNOWN,
        };

        let renderer = match &self.renderer {
            Some(renderer) => Arc::clone(renderer),
            None => match global::current() {
                Ok(renderer) => renderer,
                Err(_) => return,
            },
        };
        let _ = renderer.log(Some(target_header(metadata.target())), &payload, &site);
    }
}

impl fmt::Debug for SugarLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SugarLayer")
            .field("global", &self.renderer.is_none())
            .finish()
    }
}

impl<S> Layer<S> for SugarLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.write_event(event);
    }
}
