#![forbid(unsafe_code)]

//! Relative-time formatting for reltime.
//!
//! # Role
//! `reltime-core` turns a `(now, since)` pair into a localized phrase such
//! as "5 minutes ago" plus an absolute date/time title. It is pure: clocks
//! are read by callers (or by `reltime-runtime`'s scheduler) and passed in.
//!
//! # Primary responsibilities
//! - **Instant**: millisecond timestamps and normalization of raw host values.
//! - **Clock**: wall and manual clock sources.
//! - **RelativeTimeFormatter**: bucket selection, rounding, pluralization.
//! - **AbsoluteFormat**: locale-aware absolute rendering for titles and the
//!   max-age fallback.

pub mod absolute;
pub mod clock;
pub mod error;
pub mod format;
pub mod instant;

pub use absolute::AbsoluteFormat;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::FormatError;
pub use format::{CustomFormatter, FormatOptions, Formatted, RelativeTimeFormatter, Span, format};
pub use instant::Instant;

pub use reltime_i18n as i18n;
