#![forbid(unsafe_code)]

//! Log a value in the middle of an expression.
//!
//! ```no_run
//! use logsugar::Inspect;
//!
//! # fn main() -> logsugar::Result<()> {
//! let total: u32 = [1, 2, 3].iter().sum::<u32>().inspect_log("sum")? * 2;
//! let name = String::from("ada").inspect_log_with("name", |s| s.to_uppercase())?;
//! # let _ = (total, name);
//! # Ok(())
//! # }
//! ```

use std::fmt::{Debug, Display};

use crate::breadcrumb::CallSite;
use crate::error::Result;
use crate::global;

/// Pass a value through the global renderer and get it back.
pub trait Inspect: Sized {
    /// Log `self` with its `Debug` rendering under `header`.
    ///
    /// # Errors
    ///
    /// Any rendering or sink error. The value is dropped in that case.
    #[track_caller]
    fn inspect_log(self, header: &str) -> Result<Self>
    where
        Self: Debug,
    {
        let site = CallSite::caller();
        global::current()?.log(Some(header), &format!("{self:?}"), &site)?;
        Ok(self)
    }

    /// Log a custom rendering of `self` under `header`.
    ///
    /// # Errors
    ///
    /// Any rendering or sink error. The value is dropped in that case.
    #[track_caller]
    fn inspect_log_with<F, D>(self, header: &str, render: F) -> Result<Self>
    where
        F: FnOnce(&Self) -> D,
        D: Display,
    {
        let site = CallSite::caller();
        global::current()?.log(Some(header), &render(&self).to_string(), &site)?;
        Ok(self)
    }
}

impl<T> Inspect for T {}
