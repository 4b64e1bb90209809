#![forbid(unsafe_code)]

//! Shared left-column width.

use crate::aggregate::SharedAggregate;
use crate::config::Config;

/// Decides how wide the left column of the current call should be.
///
/// The combined width (tag plus minimum left column) feeds the aggregate
/// only when it is at most `max_left_section_width`; wider outliers are
/// laid out at their own width and never skew later calls.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAligner<'a> {
    aggregate: &'a SharedAggregate,
    max_left_section_width: usize,
}

impl<'a> ColumnAligner<'a> {
    #[must_use]
    pub fn new(aggregate: &'a SharedAggregate, max_left_section_width: usize) -> Self {
        Self {
            aggregate,
            max_left_section_width,
        }
    }

    #[must_use]
    pub fn for_config(config: &'a Config) -> Self {
        Self::new(config.aggregate(), config.left_section_limit())
    }

    /// Left width to use, never less than `minimum_left_width`.
    pub fn align(&self, tag_width: usize, minimum_left_width: usize) -> usize {
        let combined = tag_width + minimum_left_width;
        let representative = if combined <= self.max_left_section_width {
            self.aggregate.add(combined)
        } else {
            tracing::debug!(
                combined,
                limit = self.max_left_section_width,
                "left column over limit, bypassing aggregate"
            );
            combined
        };
        representative.max(combined) - tag_width
    }
}
