// src/watch/mod.rs

//! Watch mode.
//!
//! This module is responsible for:
//! - Turning filesystem changes into debounced rebuild requests (`notifier`),
//!   after exclusion and optional content-hash filtering (`filter`, `cache`).
//! - Running the rebuild-and-run loop and owning the notifier's lifetime
//!   (`session`).
//! - Routing each build outcome to the run layer (`handler`).

pub mod cache;
pub mod filter;
pub mod handler;
pub mod notifier;
pub mod patterns;
pub mod session;

pub use filter::ChangeFilter;
pub use handler::RunOnSuccess;
pub use notifier::{spawn_notifier, start_watch, watch_filter, work_dir_excludes, NotifyHandle};
pub use patterns::build_globset;
pub use session::{NotifierHandle, OutcomeHandler, WatchEvent, WatchSession};
