//! Locale tables: eight phrase templates, one per elapsed-time bucket.
//!
//! # Invariants
//!
//! 1. **Fixed shape**: a [`LocaleTable`] always holds exactly eight
//!    templates, ordered like [`Bucket::ALL`].
//!
//! 2. **Validated on construction**: the just-now entry is a plain phrase,
//!    every other template carries exactly one [`PLACEHOLDER`]. A table that
//!    violates this never exists, so formatting cannot fail on table shape.
//!
//! 3. **Single substitution**: [`BucketTemplate::render`] replaces the first
//!    placeholder only; no recursive expansion takes place.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Wrong bucket count | not eight templates | `InvalidTable(WrongBucketCount)` |
//! | Plural just-now | entry 0 is a pair | `InvalidTable(PluralJustNow)` |
//! | Missing `%s` | counted template without marker | `InvalidTable(MissingPlaceholder)` |
//! | Repeated `%s` | more than one marker | `InvalidTable(ExtraPlaceholder)` |

use std::fmt;

/// Marker replaced by the rounded count.
pub const PLACEHOLDER: &str = "%s";

/// One of the eight mutually exclusive elapsed-time ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    JustNow,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl Bucket {
    /// All buckets in table order.
    pub const ALL: [Bucket; 8] = [
        Bucket::JustNow,
        Bucket::Seconds,
        Bucket::Minutes,
        Bucket::Hours,
        Bucket::Days,
        Bucket::Weeks,
        Bucket::Months,
        Bucket::Years,
    ];

    /// Position of this bucket inside a [`LocaleTable`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name, used in error messages and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Bucket::JustNow => "just-now",
            Bucket::Seconds => "seconds",
            Bucket::Minutes => "minutes",
            Bucket::Hours => "hours",
            Bucket::Days => "days",
            Bucket::Weeks => "weeks",
            Bucket::Months => "months",
            Bucket::Years => "years",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What is wrong with a rejected table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableDefect {
    /// The table did not contain exactly eight templates.
    WrongBucketCount(usize),
    /// A template list had an arity other than one string or a pair.
    WrongArity { bucket: Bucket, found: usize },
    /// The just-now entry was given singular/plural forms.
    PluralJustNow,
    /// A counted template has no placeholder.
    MissingPlaceholder(Bucket),
    /// A counted template has more than one placeholder.
    ExtraPlaceholder(Bucket),
}

impl fmt::Display for TableDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongBucketCount(n) => write!(f, "expected 8 bucket templates, found {n}"),
            Self::WrongArity { bucket, found } => write!(
                f,
                "bucket '{bucket}' must be a string or a [singular, plural] pair, found {found} forms"
            ),
            Self::PluralJustNow => f.write_str("bucket 'just-now' must be a single phrase"),
            Self::MissingPlaceholder(bucket) => {
                write!(f, "bucket '{bucket}' template is missing '{PLACEHOLDER}'")
            }
            Self::ExtraPlaceholder(bucket) => {
                write!(f, "bucket '{bucket}' template has more than one '{PLACEHOLDER}'")
            }
        }
    }
}

/// Errors from locale registration and lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nError {
    /// A locale set was built with no locales at all.
    EmptyRegistry,
    /// A locale id was looked up but never registered.
    UnknownLocale(String),
    /// A table failed validation.
    InvalidTable {
        locale: Option<String>,
        defect: TableDefect,
    },
    /// A locale document could not be parsed.
    Parse(String),
}

impl I18nError {
    /// Attach the locale id to a table validation error.
    #[must_use]
    pub fn for_locale(self, id: &str) -> Self {
        match self {
            Self::InvalidTable { defect, .. } => Self::InvalidTable {
                locale: Some(id.to_string()),
                defect,
            },
            other => other,
        }
    }
}

impl fmt::Display for I18nError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRegistry => f.write_str("expected at least one locale"),
            Self::UnknownLocale(id) => write!(f, "unknown locale: {id}"),
            Self::InvalidTable {
                locale: Some(id),
                defect,
            } => write!(f, "invalid locale table '{id}': {defect}"),
            Self::InvalidTable {
                locale: None,
                defect,
            } => write!(f, "invalid locale table: {defect}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for I18nError {}

impl From<TableDefect> for I18nError {
    fn from(defect: TableDefect) -> Self {
        Self::InvalidTable {
            locale: None,
            defect,
        }
    }
}

/// A phrase template for one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketTemplate {
    /// Used for every count.
    Single(String),
    /// Singular form for counts up to one, plural form above.
    Pair { singular: String, plural: String },
}

impl BucketTemplate {
    /// A template used for both singular and plural counts.
    #[must_use]
    pub fn single(template: impl Into<String>) -> Self {
        Self::Single(template.into())
    }

    /// A singular/plural pair.
    #[must_use]
    pub fn pair(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self::Pair {
            singular: singular.into(),
            plural: plural.into(),
        }
    }

    /// Pick the template for `count`: counts of 0 and 1 are singular.
    #[must_use]
    pub fn select(&self, count: i64) -> &str {
        match self {
            Self::Single(s) => s,
            Self::Pair { singular, .. } if count <= 1 => singular,
            Self::Pair { plural, .. } => plural,
        }
    }

    /// Select the form for `count` and substitute it for the placeholder.
    #[must_use]
    pub fn render(&self, count: i64) -> String {
        self.select(count)
            .replacen(PLACEHOLDER, &count.to_string(), 1)
    }

    fn forms(&self) -> [&str; 2] {
        match self {
            Self::Single(s) => [s.as_str(), s.as_str()],
            Self::Pair { singular, plural } => [singular.as_str(), plural.as_str()],
        }
    }

    fn check(&self, bucket: Bucket) -> Result<(), TableDefect> {
        if bucket == Bucket::JustNow {
            return match self {
                Self::Single(_) => Ok(()),
                Self::Pair { .. } => Err(TableDefect::PluralJustNow),
            };
        }
        for form in self.forms() {
            match form.matches(PLACEHOLDER).count() {
                0 => return Err(TableDefect::MissingPlaceholder(bucket)),
                1 => {}
                _ => return Err(TableDefect::ExtraPlaceholder(bucket)),
            }
        }
        Ok(())
    }
}

impl From<&str> for BucketTemplate {
    fn from(s: &str) -> Self {
        Self::single(s)
    }
}

impl From<(&str, &str)> for BucketTemplate {
    fn from((singular, plural): (&str, &str)) -> Self {
        Self::pair(singular, plural)
    }
}

/// Eight validated bucket templates for one language/region.
///
/// # Example
///
/// ```
/// use reltime_i18n::{Bucket, BucketTemplate, LocaleTable};
///
/// let table = LocaleTable::new(vec![
///     "just now".into(),
///     ("%s second ago", "%s seconds ago").into(),
///     ("%s minute ago", "%s minutes ago").into(),
///     ("%s hour ago", "%s hours ago").into(),
///     ("%s day ago", "%s days ago").into(),
///     ("%s week ago", "%s weeks ago").into(),
///     ("%s month ago", "%s months ago").into(),
///     ("%s year ago", "%s years ago").into(),
/// ])
/// .unwrap();
///
/// assert_eq!(table.render(Bucket::Minutes, 2), "2 minutes ago");
/// assert_eq!(table.render(Bucket::JustNow, 0), "just now");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleTable {
    pub(crate) buckets: [BucketTemplate; 8],
}

impl LocaleTable {
    /// Validate and build a table from eight templates in bucket order.
    pub fn new(templates: Vec<BucketTemplate>) -> Result<Self, I18nError> {
        let buckets: [BucketTemplate; 8] = templates
            .try_into()
            .map_err(|v: Vec<BucketTemplate>| TableDefect::WrongBucketCount(v.len()))?;
        Self::from_array(buckets)
    }

    /// Validate and build a table from a fixed-size array.
    pub fn from_array(buckets: [BucketTemplate; 8]) -> Result<Self, I18nError> {
        for (bucket, template) in Bucket::ALL.into_iter().zip(&buckets) {
            template.check(bucket)?;
        }
        Ok(Self { buckets })
    }

    /// Template for a bucket.
    #[must_use]
    pub fn template(&self, bucket: Bucket) -> &BucketTemplate {
        &self.buckets[bucket.index()]
    }

    /// The fixed just-now phrase.
    #[must_use]
    pub fn just_now(&self) -> &str {
        self.template(Bucket::JustNow).select(0)
    }

    /// Render `bucket` for `count`. The just-now phrase ignores the count.
    #[must_use]
    pub fn render(&self, bucket: Bucket, count: i64) -> String {
        match bucket {
            Bucket::JustNow => self.just_now().to_string(),
            _ => self.template(bucket).render(count),
        }
    }

    /// Iterate over `(bucket, template)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &BucketTemplate)> {
        Bucket::ALL.into_iter().zip(self.buckets.iter())
    }
}
