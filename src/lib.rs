#![forbid(unsafe_code)]

//! Attractor view: the view-state engine behind a churn/complexity hotspot
//! dashboard.
//!
//! Four cooperating pieces:
//! 1. **Dataset loader**: fetches the metric list and file prefix concurrently
//!    and joins them into one result
//! 2. **View state + reducer**: one source of truth for filters, display
//!    settings and the loaded dataset
//! 3. **Derived view**: the filtered, metric-projected points a renderer draws
//! 4. **Lifecycle controller**: type selection, load cycles and stale-result
//!    discard, driven by [`view::runtime::DashboardRuntime`]
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use attractor_view::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use attractor_view::core::config::Config;
//! use attractor_view::view::loader::{DatasetLoader, MemoryMetricSource};
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod view;
