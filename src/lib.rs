//! rebasebot - keep a downstream fork in sync with its upstream
//!
//! Rebuilds a destination branch on top of the latest upstream source,
//! replays the downstream carry patches that are still needed, pushes the
//! result to a rebase branch and opens or refreshes a PR for it.

pub mod auth;
pub mod config;
pub mod error;
pub mod lockfile;
pub mod notify;
pub mod platform;
pub mod rebase;
pub mod repo;
pub mod sync;
pub mod types;

pub use error::{Error, Result};
