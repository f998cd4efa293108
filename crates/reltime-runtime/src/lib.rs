#![forbid(unsafe_code)]

//! Auto-refresh runtime for reltime.
//!
//! # Role
//! The formatter in `reltime-core` is pure. This crate keeps relative-time
//! output current: a [`RefreshScheduler`] owns periodic timers that the host
//! event loop drives with [`RefreshScheduler::step`], and [`LiveTimeAgo`]
//! ties one timestamp to one timer.
//!
//! # How it fits in the system
//! The host decides when to wake (see [`RefreshScheduler::next_deadline`]);
//! nothing here spawns threads or sleeps. Locale switches go through a
//! [`SharedLocales`] handle and show up on the next tick of every element.

pub mod live;
pub mod scheduler;

pub use live::{LiveTimeAgo, SharedLocales};
pub use scheduler::{RefreshInterval, RefreshScheduler, StepResult, SubId, Subscription};
