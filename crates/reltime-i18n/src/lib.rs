#![forbid(unsafe_code)]

//! Locale tables for reltime.
//!
//! Provides the eight-bucket phrase tables that drive relative-time
//! rendering, validation of those tables at registration time, and an
//! explicit [`LocaleContext`] holding the registered tables plus the
//! current locale selection.

pub mod builtin;
pub mod context;
#[cfg(feature = "serde")]
pub mod json;
pub mod table;

pub use builtin::DEFAULT_LOCALE;
pub use context::LocaleContext;
#[cfg(feature = "serde")]
pub use json::tables_from_json;
pub use table::{Bucket, BucketTemplate, I18nError, LocaleTable, PLACEHOLDER, TableDefect};
