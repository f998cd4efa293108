#![forbid(unsafe_code)]

//! Command-line demo for reltime.
//!
//! Parses options, builds a [`reltime_runtime::LiveTimeAgo`] on a wall-clock
//! scheduler, and prints its output once per refresh tick.

pub mod cli;
pub mod host;
