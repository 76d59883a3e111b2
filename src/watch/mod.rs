// src/watch/mod.rs

//! File watching and the monitor service.
//!
//! This module is responsible for:
//! - Binding each watched category's globs to its task (`patterns`).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Content hashing so a save without changes does not re-run a task.
//! - The [`Monitor`] service that runs `task -> reload` per category.

pub mod cache;
pub mod event_handler;
pub mod hash;
pub mod monitor;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use monitor::Monitor;
pub use patterns::{WATCHED_CATEGORIES, WatchBinding, bindings_from_config, watch_dirs};
pub use watcher::{WatchSignal, WatcherHandle, spawn_watcher};
