//! Absolute date/time rendering used for titles and the max-age fallback.

use chrono::{FixedOffset, Local, Locale, Offset, Utc};

use crate::instant::Instant;

/// Localized date followed by localized time.
pub const ABSOLUTE_PATTERN: &str = "%x %X";

/// Offset applied when rendering an instant as an absolute date/time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbsoluteFormat {
    /// The host's local offset.
    #[default]
    Local,
    /// A fixed offset; deterministic across hosts.
    Fixed(FixedOffset),
}

impl AbsoluteFormat {
    #[must_use]
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Render `at` with the date/time conventions of `locale_id`.
    ///
    /// Locale ids use POSIX form (`fr_FR`); `fr-FR` is accepted too. Ids
    /// chrono does not know render with POSIX conventions. Instants outside
    /// chrono's range render as their raw millisecond count.
    #[must_use]
    pub fn render(self, at: Instant, locale_id: &str) -> String {
        let Some(utc) = at.to_datetime() else {
            return at.as_millis().to_string();
        };
        let locale = chrono_locale(locale_id);
        match self {
            Self::Local => utc
                .with_timezone(&Local)
                .format_localized(ABSOLUTE_PATTERN, locale)
                .to_string(),
            Self::Fixed(offset) => utc
                .with_timezone(&offset)
                .format_localized(ABSOLUTE_PATTERN, locale)
                .to_string(),
        }
    }
}

fn chrono_locale(id: &str) -> Locale {
    let posix = id.replace('-', "_");
    Locale::try_from(posix.as_str()).unwrap_or(Locale::POSIX)
}
