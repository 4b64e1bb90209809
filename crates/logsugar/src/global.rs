#![forbid(unsafe_code)]

//! Process-wide facade.
//!
//! One [`Renderer`] shared by the whole process, behind free functions and
//! the [`log!`](crate::log) / [`log_wtf!`](crate::log_wtf) macros.
//!
//! ```no_run
//! use logsugar::Config;
//!
//! logsugar::global::init(Config::default().use_colors(true)).unwrap();
//! logsugar::log!("listening on {}", 8080).unwrap();
//! ```
//!
//! # Lifecycle
//!
//! - [`init`] builds the renderer, or reconfigures the existing one. The first
//!   `init` after startup (or after [`reset`]) opens the session with a heavy
//!   "Begin Session" divider and, when the config asks for it, installs the
//!   panic hook.
//! - Logging before `init` lazily installs [`Config::default`] without the
//!   session divider.
//! - [`reset`] drops the renderer. The panic hook stays installed but goes
//!   quiet until the next `init`.

use std::any::Any;
use std::error::Error;
use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock, RwLockWriteGuard};

use crate::breadcrumb::CallSite;
use crate::config::Config;
use crate::error::Result;
use crate::helpers::MAX_DIVIDER_WEIGHT;
use crate::render::Renderer;

static RENDERER: RwLock<Option<Arc<Renderer>>> = RwLock::new(None);
static SESSION_STARTED: AtomicBool = AtomicBool::new(false);

const SESSION_BANNER: &str = "Begin Session";
const PANIC_BANNER: &str = "FATAL PANIC";

fn write_slot() -> RwLockWriteGuard<'static, Option<Arc<Renderer>>> {
    match RENDERER.write() {
        Ok(slot) => slot,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Install `config` as the process-wide configuration.
///
/// # Errors
///
/// [`SugarError::InvalidConfiguration`](crate::SugarError::InvalidConfiguration)
/// if `config` does not validate (the previous config stays in place), or
/// any error from logging the session divider.
#[track_caller]
pub fn init(config: Config) -> Result<()> {
    let site = CallSite::caller();
    let log_panics = config.logs_panics();

    let renderer = {
        let mut slot = write_slot();
        match slot.as_ref() {
            Some(existing) => {
                existing.reconfigure(config)?;
                Arc::clone(existing)
            }
            None => {
                let renderer = Arc::new(Renderer::new(config)?);
                *slot = Some(Arc::clone(&renderer));
                renderer
            }
        }
    };

    if log_panics {
        install_panic_hook();
    }

    if !SESSION_STARTED.swap(true, Ordering::AcqRel) {
        tracing::debug!("logsugar session started");
        renderer.log_divider(Some(SESSION_BANNER), MAX_DIVIDER_WEIGHT, &site)?;
    }
    Ok(())
}

/// Drop the process-wide renderer. The next `init` starts a new session.
pub fn reset() {
    *write_slot() = None;
    SESSION_STARTED.store(false, Ordering::Release);
}

/// The installed renderer, if any.
#[must_use]
pub fn renderer() -> Option<Arc<Renderer>> {
    match RENDERER.read() {
        Ok(slot) => slot.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// The installed renderer, installing the default config first if needed.
///
/// # Errors
///
/// Only if the default config fails to build a renderer.
pub fn current() -> Result<Arc<Renderer>> {
    if let Some(renderer) = renderer() {
        return Ok(renderer);
    }
    let mut slot = write_slot();
    if let Some(renderer) = slot.as_ref() {
        return Ok(Arc::clone(renderer));
    }
    let renderer = Arc::new(Renderer::new(Config::default())?);
    *slot = Some(Arc::clone(&renderer));
    Ok(renderer)
}

// ============================================================================
// Free functions
// ============================================================================

/// Log `payload` under an optional header through the global renderer.
///
/// # Errors
///
/// Same as [`Renderer::log`].
#[track_caller]
pub fn log(header: Option<&str>, payload: &str) -> Result<()> {
    log_at(&CallSite::caller(), header, payload)
}

/// [`log`] with an explicit call site.
///
/// # Errors
///
/// Same as [`Renderer::log`].
pub fn log_at(site: &CallSite, header: Option<&str>, payload: &str) -> Result<()> {
    current()?.log(header, payload, site)
}

/// Log several logical lines as one call.
///
/// # Errors
///
/// Same as [`Renderer::log_lines`].
#[track_caller]
pub fn log_lines<I>(header: Option<&str>, lines: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let site = CallSite::caller();
    current()?.log_lines(header, lines, &site)
}

/// See [`Renderer::log_wtf`].
///
/// # Errors
///
/// Same as [`Renderer::log`].
#[track_caller]
pub fn log_wtf(details: Option<&str>) -> Result<()> {
    log_wtf_at(&CallSite::caller(), details)
}

/// [`log_wtf`] with an explicit call site.
///
/// # Errors
///
/// Same as [`Renderer::log`].
pub fn log_wtf_at(site: &CallSite, details: Option<&str>) -> Result<()> {
    current()?.log_wtf(None, details, site)
}

/// See [`Renderer::log_divider`].
///
/// # Errors
///
/// Same as [`Renderer::log`].
#[track_caller]
pub fn log_divider(message: Option<&str>, weight: u8) -> Result<()> {
    let site = CallSite::caller();
    current()?.log_divider(message, weight, &site)
}

/// See [`Renderer::log_error`].
///
/// # Errors
///
/// Same as [`Renderer::log`].
#[track_caller]
pub fn log_error(header: Option<&str>, error: &(dyn Error + 'static)) -> Result<()> {
    let site = CallSite::caller();
    current()?.log_error(header, error, &site)
}

// ============================================================================
// Panic hook
// ============================================================================

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            log_panic(info);
            previous(info);
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "Box<dyn Any>"
    }
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let Some(renderer) = renderer() else {
        return;
    };
    if !renderer.config().logs_panics() {
        return;
    }

    let mut lines = vec![panic_message(info.payload()).to_string()];
    if let Some(location) = info.location() {
        lines.push(format!(
            "panicked at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }

    let logged = renderer
        .log_wtf(None, Some(PANIC_BANNER), &CallSite::UNKNOWN)
        .and_then(|()| renderer.log_lines(Some("panic()"), &lines, &CallSite::UNKNOWN));
    if let Err(err) = logged {
        tracing::warn!(error = %err, "failed to log panic");
    }
}

// ============================================================================
// Macros
// ============================================================================

/// Log through the global renderer, capturing the call site.
///
/// ```no_run
/// # fn main() -> logsugar::Result<()> {
/// let user = "ada";
/// logsugar::log!("signed in as {user}")?;
/// logsugar::log!(header: "auth", "token refreshed")?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! log {
    (header: $header:expr, $($arg:tt)+) => {
        $crate::global::log_at(&$crate::call_site!(), Some($header), &format!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::global::log_at(&$crate::call_site!(), None, &format!($($arg)+))
    };
}

/// Log something that should never happen, capturing the call site.
#[macro_export]
macro_rules! log_wtf {
    () => {
        $crate::global::log_wtf_at(&$crate::call_site!(), None)
    };
    ($($arg:tt)+) => {
        $crate::global::log_wtf_at(&$crate::call_site!(), Some(format!($($arg)+).as_str()))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_downcasts() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(s.as_ref()), "Box<dyn Any>");
    }
}
