//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use attractor_view::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{AttractorError, LoadError, LoadSource, Result};

// Model
pub use crate::view::model::{
    DashboardModel, DashboardMsg, DatasetType, LoadPhase, MetricRecord, MetricType, PlotType,
    RegressionType, ViewAction, ViewState,
};

// Transitions and projection
pub use crate::view::derive::{ChartKind, DerivedView, derive};
pub use crate::view::update::{reduce, update};

// Loading
#[cfg(feature = "http")]
pub use crate::view::loader::HttpMetricSource;
pub use crate::view::loader::{
    DatasetLoader, LoadedDataset, MemoryMetricSource, MetricSource, StaticData,
};

// Runtime
pub use crate::view::catalog::DatasetCatalog;
pub use crate::view::runtime::{DashboardRuntime, LoadObserver};
