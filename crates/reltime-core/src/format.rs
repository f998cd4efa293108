//! Relative-time formatting.
//!
//! Maps the seconds elapsed between `since` and `now` onto one of eight
//! buckets, rounds the count in that bucket's unit, and renders the
//! matching locale template.
//!
//! # Invariants
//!
//! 1. **Pure**: [`RelativeTimeFormatter::format`] reads no clock and holds
//!    no state; identical inputs give identical output.
//!
//! 2. **Exhaustive buckets**: every elapsed value selects exactly one
//!    bucket. Thresholds use fixed 30-day months and 365-day years.
//!
//! 3. **Title always absolute**: `title` is the absolute rendering of
//!    `since` whichever bucket is chosen.
//!
//! 4. **Future instants are "just now"**: a negative elapsed time satisfies
//!    the `<= 5` just-now condition and never errors.
//!
//! # Bucket table
//!
//! | Bucket | Elapsed seconds | Unit |
//! |--------|-----------------|------|
//! | just-now | `<= 5` | fixed phrase |
//! | seconds | `(5, 60)` | 1 |
//! | minutes | `[60, 3600)` | 60 |
//! | hours | `[3600, 86400)` | 3600 |
//! | days | `[86400, 604800)` | 86400 |
//! | weeks | `[604800, 2592000)` | 604800 |
//! | months | `[2592000, 31536000)` | 2592000 |
//! | years | `>= 31536000` | 31536000 |

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use reltime_i18n::{Bucket, LocaleContext, LocaleTable};

use crate::absolute::AbsoluteFormat;
use crate::error::FormatError;
use crate::instant::Instant;

pub const JUST_NOW_SECS: f64 = 5.0;
pub const MINUTE_SECS: f64 = 60.0;
pub const HOUR_SECS: f64 = MINUTE_SECS * 60.0;
pub const DAY_SECS: f64 = HOUR_SECS * 24.0;
pub const WEEK_SECS: f64 = DAY_SECS * 7.0;
pub const MONTH_SECS: f64 = DAY_SECS * 30.0;
pub const YEAR_SECS: f64 = DAY_SECS * 365.0;

/// Caller-supplied absolute renderer, replacing the locale-aware default.
pub type CustomFormatter = Rc<dyn Fn(Instant) -> String>;

/// Selected bucket and the rounded count within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub bucket: Bucket,
    /// Always 0 for [`Bucket::JustNow`].
    pub count: i64,
}

impl Span {
    /// Classify an elapsed duration in seconds.
    #[must_use]
    pub fn from_elapsed(elapsed_secs: f64) -> Self {
        if elapsed_secs <= JUST_NOW_SECS {
            return Self {
                bucket: Bucket::JustNow,
                count: 0,
            };
        }
        let (bucket, unit) = if elapsed_secs < MINUTE_SECS {
            (Bucket::Seconds, 1.0)
        } else if elapsed_secs < HOUR_SECS {
            (Bucket::Minutes, MINUTE_SECS)
        } else if elapsed_secs < DAY_SECS {
            (Bucket::Hours, HOUR_SECS)
        } else if elapsed_secs < WEEK_SECS {
            (Bucket::Days, DAY_SECS)
        } else if elapsed_secs < MONTH_SECS {
            (Bucket::Weeks, WEEK_SECS)
        } else if elapsed_secs < YEAR_SECS {
            (Bucket::Months, MONTH_SECS)
        } else {
            (Bucket::Years, YEAR_SECS)
        };
        Self {
            bucket,
            count: (elapsed_secs / unit).round() as i64,
        }
    }

    /// Render with a locale table.
    #[must_use]
    pub fn render(self, table: &LocaleTable) -> String {
        table.render(self.bucket, self.count)
    }
}

/// Per-call formatting options.
#[derive(Clone, Default)]
pub struct FormatOptions {
    /// Past this age the output switches to the absolute rendering.
    /// `None` or zero disables the ceiling.
    pub max_age: Option<Duration>,
    /// Replaces the default absolute rendering.
    pub custom_formatter: Option<CustomFormatter>,
    /// Locale override; `None` uses the context's current locale.
    pub locale: Option<String>,
    /// Offset for the default absolute rendering.
    pub absolute: AbsoluteFormat,
}

impl FormatOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, f: impl Fn(Instant) -> String + 'static) -> Self {
        self.custom_formatter = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn with_locale(mut self, id: impl Into<String>) -> Self {
        self.locale = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_absolute(mut self, absolute: AbsoluteFormat) -> Self {
        self.absolute = absolute;
        self
    }

    /// The effective ceiling in seconds, if any.
    #[must_use]
    pub fn max_age_secs(&self) -> Option<f64> {
        self.max_age
            .filter(|d| !d.is_zero())
            .map(|d| d.as_secs_f64())
    }
}

impl fmt::Debug for FormatOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatOptions")
            .field("max_age", &self.max_age)
            .field("custom_formatter", &self.custom_formatter.is_some())
            .field("locale", &self.locale)
            .field("absolute", &self.absolute)
            .finish()
    }
}

/// Result handed to a rendering adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    /// Relative phrase, or the absolute rendering once expired.
    pub display: String,
    /// Absolute rendering of `since`.
    pub title: String,
    /// Selected bucket; `None` once expired.
    pub span: Option<Span>,
    /// `max_age` was exceeded; the output will not change any more and
    /// refreshing can stop.
    pub expired: bool,
}

/// Formats against one resolved locale table.
#[derive(Debug, Clone, Copy)]
pub struct RelativeTimeFormatter<'a> {
    locale_id: &'a str,
    table: &'a LocaleTable,
}

impl<'a> RelativeTimeFormatter<'a> {
    #[must_use]
    pub fn new(locale_id: &'a str, table: &'a LocaleTable) -> Self {
        Self { locale_id, table }
    }

    /// Resolve the options' locale override, or the current locale.
    pub fn resolve(ctx: &'a LocaleContext, options: &'a FormatOptions) -> Result<Self, FormatError> {
        let locale_id = options
            .locale
            .as_deref()
            .unwrap_or_else(|| ctx.current_locale());
        let table = ctx.table(locale_id)?;
        Ok(Self::new(locale_id, table))
    }

    #[must_use]
    pub fn locale_id(&self) -> &str {
        self.locale_id
    }

    /// Absolute rendering of `at`: the custom formatter if set, otherwise
    /// the locale-aware date/time.
    #[must_use]
    pub fn absolute(&self, at: Instant, options: &FormatOptions) -> String {
        match &options.custom_formatter {
            Some(f) => f(at),
            None => options.absolute.render(at, self.locale_id),
        }
    }

    #[must_use]
    pub fn format(&self, now: Instant, since: Instant, options: &FormatOptions) -> Formatted {
        let elapsed = now.seconds_since(since);
        let title = self.absolute(since, options);

        if let Some(max_age) = options.max_age_secs()
            && elapsed > max_age
        {
            return Formatted {
                display: title.clone(),
                title,
                span: None,
                expired: true,
            };
        }

        let span = Span::from_elapsed(elapsed);
        Formatted {
            display: span.render(self.table),
            title,
            span: Some(span),
            expired: false,
        }
    }
}

/// Resolve the locale in `ctx` and format.
///
/// # Example
///
/// ```
/// use reltime_core::{format, FormatOptions, Instant};
/// use reltime_i18n::LocaleContext;
///
/// let ctx = LocaleContext::new();
/// let now = Instant::from_millis(1_000_000);
/// let since = Instant::from_millis(1_000_000 - 125_000);
/// let out = format(&ctx, now, since, &FormatOptions::new().with_formatter(|_| "t".into())).unwrap();
/// assert_eq!(out.display, "2 minutes ago");
/// ```
pub fn format(
    ctx: &LocaleContext,
    now: Instant,
    since: Instant,
    options: &FormatOptions,
) -> Result<Formatted, FormatError> {
    Ok(RelativeTimeFormatter::resolve(ctx, options)?.format(now, since, options))
}
