#![forbid(unsafe_code)]

//! Error types.

use std::fmt;
use std::io;

use logsugar_text::WrapError;

/// Errors surfaced by configuration and rendering.
#[derive(Debug)]
pub enum SugarError {
    /// A configuration value is out of range. Never silently clamped.
    InvalidConfiguration {
        field: &'static str,
        reason: String,
    },
    /// The left column plus divider leave no room for the payload.
    DegenerateLayout {
        max_line_width: usize,
        left_width: usize,
        divider_width: usize,
    },
    /// The sink failed to accept a row.
    Sink(io::Error),
}

impl SugarError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SugarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration { field, reason } => {
                write!(f, "invalid configuration for {field}: {reason}")
            }
            Self::DegenerateLayout {
                max_line_width,
                left_width,
                divider_width,
            } => write!(
                f,
                "no room for payload: line width {max_line_width} leaves nothing after \
                 left column {left_width} and divider {divider_width}"
            ),
            Self::Sink(err) => write!(f, "sink write failed: {err}"),
        }
    }
}

impl std::error::Error for SugarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sink(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SugarError {
    fn from(err: io::Error) -> Self {
        Self::Sink(err)
    }
}

impl From<WrapError> for SugarError {
    fn from(err: WrapError) -> Self {
        Self::invalid("wrap budget", err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SugarError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_invalid_configuration() {
        let err = SugarError::invalid("percentile", "must be in (0, 1]");
        assert_eq!(
            err.to_string(),
            "invalid configuration for percentile: must be in (0, 1]"
        );
    }

    #[test]
    fn display_degenerate_layout() {
        let err = SugarError::DegenerateLayout {
            max_line_width: 10,
            left_width: 8,
            divider_width: 4,
        };
        assert!(err.to_string().contains("line width 10"));
    }

    #[test]
    fn sink_error_has_source() {
        let err = SugarError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn wrap_error_maps_to_invalid_configuration() {
        let err = SugarError::from(WrapError::ZeroBudget);
        assert!(matches!(
            err,
            SugarError::InvalidConfiguration {
                field: "wrap budget",
                ..
            }
        ));
    }
}
