//! Elm-style state model for the churn/complexity dashboard.
//!
//! Display settings and the loaded dataset live in [`ViewState`]; the load
//! lifecycle wraps it in [`DashboardModel`]. User interactions arrive as
//! [`ViewAction`] values, controller inputs as [`DashboardMsg`], and
//! side-effects leave the update function as [`DashboardCmd`] values.
//!
//! **Design invariant:** nothing in this module performs I/O.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::config::ViewConfig;
use crate::core::errors::LoadError;
use crate::view::loader::LoadedDataset;

// ──────────────────── records ────────────────────

/// One file's metrics as served by the metric list endpoint.
///
/// Fields the engine does not interpret (line counts, history, ...) are kept
/// verbatim in `details` so the render layer can show them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Path of the file, unique within a dataset.
    pub filename: String,
    /// Number of commits touching the file.
    pub churn: f64,
    /// Complexity score of the file.
    pub complexity: f64,
    /// Remaining descriptive fields.
    #[serde(flatten)]
    pub details: BTreeMap<String, Value>,
}

impl MetricRecord {
    /// Record with no descriptive fields.
    #[must_use]
    pub fn new(filename: impl Into<String>, churn: f64, complexity: f64) -> Self {
        Self {
            filename: filename.into(),
            churn,
            complexity,
            details: BTreeMap::new(),
        }
    }
}

// ──────────────────── dataset type ────────────────────

/// Key of a dataset type, e.g. `rb` or `js`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetType(String);

impl DatasetType {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ──────────────────── selectors ────────────────────

/// Scalar metric plotted per record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// `churn * complexity`.
    #[default]
    ChurnComplexity,
    /// Complexity alone.
    Complexity,
    /// Churn alone.
    Churn,
}

impl MetricType {
    /// Metric value of one record.
    #[must_use]
    pub fn value_of(self, record: &MetricRecord) -> f64 {
        match self {
            Self::ChurnComplexity => record.churn * record.complexity,
            Self::Complexity => record.complexity,
            Self::Churn => record.churn,
        }
    }

    /// Human-readable label for selector display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ChurnComplexity => "Churn * Complexity",
            Self::Complexity => "Complexity",
            Self::Churn => "Churn",
        }
    }
}

/// Curve-fit family overlaid by the render layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionType {
    #[default]
    PowerLaw,
    Linear,
}

/// Which plot family is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotType {
    /// Scatter plot, or histogram for single-axis metrics.
    #[default]
    ScatterPlot,
    TreeMap,
}

// ──────────────────── view state ────────────────────

/// Single source of truth for filter/display settings and the loaded dataset.
///
/// Mutated only through [`crate::view::update::reduce`].
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ViewState {
    /// Full, unfiltered dataset for the current type.
    pub values: Vec<MetricRecord>,
    /// Server-supplied path segment prepended to the user filter.
    pub file_prefix: String,
    /// User-entered filter, stored verbatim.
    pub path: String,
    pub metric_type: MetricType,
    pub regression_type: RegressionType,
    pub display_regression: bool,
    pub display_filenames: bool,
    pub plot_type: PlotType,
    /// Record selected for the details panel.
    pub active_file: Option<MetricRecord>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            file_prefix: String::new(),
            path: String::new(),
            metric_type: MetricType::default(),
            regression_type: RegressionType::default(),
            display_regression: false,
            display_filenames: false,
            plot_type: PlotType::default(),
            active_file: None,
        }
    }
}

impl ViewState {
    /// Empty state carrying the configured display defaults.
    #[must_use]
    pub fn from_config(view: &ViewConfig) -> Self {
        Self {
            metric_type: view.metric_type,
            regression_type: view.regression_type,
            display_regression: view.display_regression,
            display_filenames: view.display_filenames,
            plot_type: view.plot_type,
            ..Self::default()
        }
    }
}

/// User interactions and load commits, one variant per transition.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    /// Replace the dataset wholesale.
    SetValues(Vec<MetricRecord>),
    SetFilePrefix(String),
    SetPath(String),
    SetMetricType(MetricType),
    /// Select a record for the details panel, or clear with `None`.
    SetActiveFile(Option<MetricRecord>),
    SetRegressionType(RegressionType),
    SetDisplayRegression(bool),
    SetDisplayFilenames(bool),
    SetPlotType(PlotType),
    /// Drop everything tied to the previous dataset type.
    ResetDataset,
}

// ──────────────────── lifecycle ────────────────────

/// Token identifying one load cycle.
///
/// A result is committed only while its ticket is the controller's current
/// one; generations never repeat within a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub dataset: DatasetType,
}

/// Load lifecycle phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading(LoadTicket),
    Ready,
    Failed(LoadError),
}

impl LoadPhase {
    /// Short label for logs and status lines.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading(_) => "loading",
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

/// Dashboard state: the view plus its load lifecycle.
#[derive(Debug)]
pub struct DashboardModel {
    /// Currently selected dataset type.
    pub dataset: DatasetType,
    pub view: ViewState,
    pub phase: LoadPhase,
    /// Static pages switch dataset by navigation, never in place.
    pub serve_static: bool,
    /// Last generation handed out.
    pub generation: u64,
    /// Cycles that reached `Ready` or `Failed`.
    pub loads_completed: u64,
    /// Results dropped because a newer cycle superseded them.
    pub loads_discarded: u64,
}

impl DashboardModel {
    #[must_use]
    pub fn new(dataset: DatasetType, view: ViewState, serve_static: bool) -> Self {
        Self {
            dataset,
            view,
            phase: LoadPhase::Idle,
            serve_static,
            generation: 0,
            loads_completed: 0,
            loads_discarded: 0,
        }
    }

    /// Whether plots are suspended behind the loading indicator.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading(_))
    }

    /// Error flag consumed by the render layer.
    #[must_use]
    pub fn loading_error(&self) -> bool {
        matches!(self.phase, LoadPhase::Failed(_))
    }

    /// Ticket of the in-flight cycle, if any.
    #[must_use]
    pub fn current_ticket(&self) -> Option<&LoadTicket> {
        match &self.phase {
            LoadPhase::Loading(ticket) => Some(ticket),
            _ => None,
        }
    }

    /// Issue the ticket for a new cycle on the current dataset type.
    pub(crate) fn next_ticket(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
            dataset: self.dataset.clone(),
        }
    }
}

// ──────────────────── messages ────────────────────

/// Events that drive the dashboard controller.
#[derive(Debug, Clone)]
pub enum DashboardMsg {
    /// Dashboard mounted: start the first load.
    Start,
    /// Navigation selected a dataset type.
    SelectDataset(DatasetType),
    /// A load cycle settled.
    LoadFinished {
        ticket: LoadTicket,
        result: Result<LoadedDataset, LoadError>,
    },
    /// A user interaction on the view controls.
    View(ViewAction),
    /// A rendered point was clicked.
    SelectFile(MetricRecord),
    /// The details panel was closed.
    CloseDetails,
}

/// Lifecycle facts reported to the session log.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    DatasetSelected {
        dataset: DatasetType,
    },
    LoadStarted {
        ticket: LoadTicket,
    },
    LoadSucceeded {
        ticket: LoadTicket,
        records: usize,
        file_prefix: Option<String>,
    },
    LoadFailed {
        ticket: LoadTicket,
        error: LoadError,
    },
    StaleLoadDiscarded {
        ticket: LoadTicket,
    },
    ActiveFileChanged {
        filename: Option<String>,
    },
}

// ──────────────────── commands ────────────────────

/// Side-effects returned by the update function for the runtime to execute.
#[derive(Debug, PartialEq)]
pub enum DashboardCmd {
    /// No side-effect.
    None,
    /// Run the dataset loader for this cycle and deliver `LoadFinished`.
    Load(LoadTicket),
    /// Tell the chrome the loading indicator can stop.
    NotifyFinishedLoading,
    /// Record a lifecycle event.
    Emit(LifecycleEvent),
    /// Execute multiple commands in order.
    Batch(Vec<Self>),
}

impl DashboardCmd {
    /// Flatten nested batches into execution order.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

// ──────────────────── tests ────────────────────
