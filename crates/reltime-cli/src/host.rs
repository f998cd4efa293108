#![forbid(unsafe_code)]

//! Host event loop: sleep until the scheduler's next deadline, step it,
//! print the refreshed output.
//!
//! The loop ends when no timer is armed (auto-update disabled, or the
//! element stopped itself after exceeding its max age) or after the
//! requested number of ticks.

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use reltime_core::{AbsoluteFormat, FormatError, FormatOptions, Formatted};
use reltime_i18n::{I18nError, LocaleContext};
use reltime_runtime::{LiveTimeAgo, RefreshScheduler};
use tracing::{debug, info};

use crate::cli::Opts;

/// Failure of a `reltime` run.
#[derive(Debug)]
pub enum RunError {
    /// The locale file could not be read.
    LocaleFile { path: PathBuf, source: io::Error },
    /// Locale registration or selection failed.
    Locale(I18nError),
    Format(FormatError),
    Output(io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocaleFile { path, source } => {
                write!(f, "cannot read locale file {}: {source}", path.display())
            }
            Self::Locale(e) => write!(f, "locale configuration: {e}"),
            Self::Format(e) => write!(f, "{e}"),
            Self::Output(e) => write!(f, "write failed: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::LocaleFile { source, .. } => Some(source),
            Self::Locale(e) => Some(e),
            Self::Format(e) => Some(e),
            Self::Output(e) => Some(e),
        }
    }
}

impl From<I18nError> for RunError {
    fn from(e: I18nError) -> Self {
        Self::Locale(e)
    }
}

impl From<FormatError> for RunError {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        Self::Output(e)
    }
}

/// Build the locale registry: built-in English, plus the locale file, with
/// the requested locale selected.
pub fn load_locales(opts: &Opts) -> Result<LocaleContext, RunError> {
    let mut ctx = LocaleContext::new();
    if let Some(path) = &opts.locale_file {
        let json = fs::read_to_string(path).map_err(|source| RunError::LocaleFile {
            path: path.clone(),
            source,
        })?;
        let n = ctx.extend_from_json(&json)?;
        debug!(path = %path.display(), tables = n, "locale file loaded");
    }
    if let Some(id) = &opts.locale {
        if !ctx.contains(id) {
            return Err(I18nError::UnknownLocale(id.clone()).into());
        }
        ctx.set_current_locale(id.as_str());
    }
    Ok(ctx)
}

/// Formatting options derived from the command line.
#[must_use]
pub fn format_options(opts: &Opts) -> FormatOptions {
    let mut options = FormatOptions::new();
    if let Some(max_age) = opts.max_age {
        options = options.with_max_age(max_age);
    }
    if opts.utc {
        options = options.with_absolute(AbsoluteFormat::utc());
    }
    options
}

fn print_line(out: &mut impl Write, formatted: &Formatted) -> io::Result<()> {
    writeln!(out, "{}\t{}", formatted.display, formatted.title)?;
    out.flush()
}

/// Run until no timer remains or `opts.ticks` refreshes have been printed.
///
/// `sleep` blocks for the requested duration; tests pass a closure that
/// advances a manual clock instead. Returns the number of refresh ticks.
pub fn run<W: Write>(
    opts: &Opts,
    scheduler: &RefreshScheduler,
    mut sleep: impl FnMut(Duration),
    out: &mut W,
) -> Result<u64, RunError> {
    let locales = Rc::new(RefCell::new(load_locales(opts)?));
    let since = opts.since.unwrap_or_else(|| scheduler.now());
    let live = LiveTimeAgo::new(
        scheduler,
        locales,
        since,
        format_options(opts),
        opts.auto_update,
    )?;
    info!(since = %live.datetime(), auto_update = ?opts.auto_update, "reltime started");
    print_line(out, &live.output()?)?;

    let mut ticks = 0u64;
    while opts.ticks == 0 || ticks < opts.ticks {
        let Some(deadline) = scheduler.next_deadline() else {
            debug!("no refresh timer armed; exiting");
            break;
        };
        let wait = scheduler.now().until(deadline);
        if !wait.is_zero() {
            sleep(wait);
        }
        let step = scheduler.step();
        if step.ticks_fired == 0 {
            continue;
        }
        ticks += 1;
        print_line(out, &live.output()?)?;
    }
    Ok(ticks)
}
