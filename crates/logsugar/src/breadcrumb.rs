#![forbid(unsafe_code)]

//! Call-site tags and headers.
//!
//! A [`CallSite`] carries compile-time information about where a log call
//! was written: the file/line from `#[track_caller]` or `file!()`/`line!()`
//! and, when the [`log!`](crate::log) macro is used, the enclosing function's
//! path. Nothing here inspects the runtime stack.

use std::panic::Location;
use std::sync::Arc;

/// Produces the sink tag for a call site.
pub type BreadcrumbProvider = Arc<dyn Fn(&CallSite) -> String + Send + Sync>;

/// Where a log call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallSite {
    pub file: Option<&'static str>,
    pub line: u32,
    /// Full path of the enclosing function, e.g. `my_crate::net::connect`.
    pub function: Option<&'static str>,
}

impl CallSite {
    /// A call site with nothing known about it.
    pub const UNKNOWN: Self = Self {
        file: None,
        line: 0,
        function: None,
    };

    #[must_use]
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self {
            file: Some(file),
            line,
            function: None,
        }
    }

    #[must_use]
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }

    /// The location of whoever called the current `#[track_caller]` chain.
    #[track_caller]
    #[must_use]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    #[must_use]
    pub const fn with_function(mut self, function: &'static str) -> Self {
        self.function = Some(function);
        self
    }
}

/// Default tag: `.(file.rs:LINE)`, the minimum syntax IDE consoles turn
/// into a clickable link.
#[must_use]
pub fn file_line_breadcrumb(site: &CallSite) -> String {
    match site.file {
        Some(file) => {
            let name = file.rsplit(['/', '\\']).next().unwrap_or(file);
            format!(".({name}:{})", site.line)
        }
        None => ".(unknown)".to_string(),
    }
}

/// Header used when the caller gives none: `name()` of the enclosing
/// function, else `log()`.
#[must_use]
pub fn function_header(site: &CallSite) -> String {
    site.function
        .and_then(short_function_name)
        .map_or_else(|| "log()".to_string(), |name| format!("{name}()"))
}

/// Last meaningful path segment, skipping closure frames.
fn short_function_name(path: &str) -> Option<&str> {
    path.rsplit("::")
        .find(|segment| !segment.is_empty() && *segment != "{{closure}}")
}

/// Full path of the enclosing function, as a `&'static str`.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_path {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        name.strip_suffix("::__here").unwrap_or(name)
    }};
}

/// The [`CallSite`] of the macro invocation.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(file!(), line!()).with_function($crate::__function_path!())
    };
}
