#![forbid(unsafe_code)]

//! Command-line argument parsing for `reltime`.
//!
//! Flags use the `--name=value` form. `RELTIME_*` environment variables
//! supply defaults; explicit flags win.

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use reltime_core::Instant;
use reltime_runtime::RefreshInterval;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the `tracing` filter directive.
pub const LOG_ENV: &str = "RELTIME_LOG";

const HELP_TEXT: &str = "\
reltime: print how long ago a timestamp was, and keep it current

USAGE:
    reltime [OPTIONS]

OPTIONS:
    --since=TIME         Timestamp: RFC 3339, YYYY-MM-DD[ HH:MM:SS] (UTC), or
                         epoch milliseconds (default: now)
    --locale=ID          Locale id to format with (default: en_US)
    --locale-file=PATH   JSON document of extra locale tables to register
    --max-age=SECS       Show the absolute date once older than SECS (0 = never)
    --auto-update=SECS   Refresh every SECS seconds (0 = print once)
    --ticks=N            Exit after N refreshes (0 = until max age is reached)
    --utc                Render absolute dates in UTC instead of local time
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    RELTIME_LOCALE        Override --locale
    RELTIME_LOCALE_FILE   Override --locale-file
    RELTIME_AUTO_UPDATE   Override --auto-update
    RELTIME_MAX_AGE       Override --max-age
    RELTIME_LOG           tracing filter (default: warn), logs go to stderr";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Instant to describe; `None` means the clock reading at startup.
    pub since: Option<Instant>,
    /// Locale id; `None` keeps the built-in default.
    pub locale: Option<String>,
    /// Extra locale tables to load.
    pub locale_file: Option<PathBuf>,
    pub max_age: Option<Duration>,
    pub auto_update: RefreshInterval,
    /// Refresh ticks before exiting (0 = unbounded).
    pub ticks: u64,
    pub utc: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            since: None,
            locale: None,
            locale_file: None,
            max_age: None,
            auto_update: RefreshInterval::Disabled,
            ticks: 0,
            utc: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

/// Seconds as `f64`; negative or zero maps to "off", NaN is rejected.
fn parse_secs(val: &str) -> Option<f64> {
    val.trim().parse::<f64>().ok().filter(|s| !s.is_nan())
}

fn max_age_from_secs(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Exits the process on `--help`, `--version` (status 0) and on usage
    /// errors (status 2).
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("reltime {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(2);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(2);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Environment defaults; unparsable values are ignored.
        if let Some(val) = get_env("RELTIME_LOCALE")
            && !val.is_empty()
        {
            opts.locale = Some(val);
        }
        if let Some(val) = get_env("RELTIME_LOCALE_FILE")
            && !val.is_empty()
        {
            opts.locale_file = Some(PathBuf::from(val));
        }
        if let Some(val) = get_env("RELTIME_AUTO_UPDATE")
            && let Some(secs) = parse_secs(&val)
        {
            opts.auto_update = RefreshInterval::from_secs_f64(secs);
        }
        if let Some(val) = get_env("RELTIME_MAX_AGE")
            && let Some(secs) = parse_secs(&val)
        {
            opts.max_age = max_age_from_secs(secs);
        }

        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                "--utc" => opts.utc = true,
                other => {
                    let invalid = |flag: &'static str, val: &str| ParseError::InvalidValue {
                        flag,
                        value: val.to_string(),
                    };
                    if let Some(val) = other.strip_prefix("--since=") {
                        opts.since = Some(val.parse().map_err(|_| invalid("--since", val))?);
                    } else if let Some(val) = other.strip_prefix("--locale=") {
                        if val.is_empty() {
                            return Err(invalid("--locale", val));
                        }
                        opts.locale = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--locale-file=") {
                        if val.is_empty() {
                            return Err(invalid("--locale-file", val));
                        }
                        opts.locale_file = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--max-age=") {
                        let secs = parse_secs(val).ok_or_else(|| invalid("--max-age", val))?;
                        opts.max_age = max_age_from_secs(secs);
                    } else if let Some(val) = other.strip_prefix("--auto-update=") {
                        let secs = parse_secs(val).ok_or_else(|| invalid("--auto-update", val))?;
                        opts.auto_update = RefreshInterval::from_secs_f64(secs);
                    } else if let Some(val) = other.strip_prefix("--ticks=") {
                        opts.ticks = val.parse().map_err(|_| invalid("--ticks", val))?;
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        Ok(opts)
    }
}
