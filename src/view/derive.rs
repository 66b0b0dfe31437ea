//! Plot-ready projection of the view state.
//!
//! [`derive`] borrows the [`ViewState`] and is recomputed on every call, so a
//! derived view can never outlive the dataset it was built from.

#![allow(missing_docs)]

use serde::Serialize;

use super::model::{MetricRecord, MetricType, PlotType, RegressionType, ViewState};

/// One record that passed the path filter, with its metric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint<'a> {
    pub record: &'a MetricRecord,
    pub value: f64,
}

/// Renderer the current settings select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Churn against complexity.
    Scatter,
    /// Distribution of a single-axis metric.
    Histogram,
    TreeMap,
}

impl ChartKind {
    #[must_use]
    pub const fn select(plot: PlotType, metric: MetricType) -> Self {
        match (plot, metric) {
            (PlotType::ScatterPlot, MetricType::ChurnComplexity) => Self::Scatter,
            (PlotType::ScatterPlot, MetricType::Complexity | MetricType::Churn) => Self::Histogram,
            (PlotType::TreeMap, _) => Self::TreeMap,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scatter => "scatter",
            Self::Histogram => "histogram",
            Self::TreeMap => "treemap",
        }
    }
}

/// Display flags forwarded untouched to the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayFlags {
    pub display_regression: bool,
    pub display_filenames: bool,
    pub regression_type: RegressionType,
    pub metric_type: MetricType,
}

/// Aggregate of the metric over the filtered points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Everything the render layer consumes for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedView<'a> {
    /// Filtered records in dataset order.
    pub points: Vec<PlotPoint<'a>>,
    pub chart: ChartKind,
    pub flags: DisplayFlags,
    /// Adornment shown before the path input, e.g. `./app/`.
    pub path_label: String,
    pub active_file: Option<&'a MetricRecord>,
}

impl DerivedView<'_> {
    /// Metric accessor for the selected metric type.
    #[must_use]
    pub fn metric_value(&self, record: &MetricRecord) -> f64 {
        self.flags.metric_type.value_of(record)
    }

    /// Whether the details panel takes part of the layout.
    #[must_use]
    pub fn detail_open(&self) -> bool {
        self.active_file.is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Count/min/max/mean of the point values; `None` for an empty view.
    #[must_use]
    pub fn summary(&self) -> Option<MetricSummary> {
        let first = self.points.first()?.value;
        let (min, max, sum) = self
            .points
            .iter()
            .fold((first, first, 0.0_f64), |(min, max, sum), p| {
                (min.min(p.value), max.max(p.value), sum + p.value)
            });
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / self.points.len() as f64;
        Some(MetricSummary {
            count: self.points.len(),
            min,
            max,
            mean,
        })
    }
}

/// Prefix a filename must start with to be plotted.
#[must_use]
pub fn effective_prefix(state: &ViewState) -> String {
    format!("{}{}", state.file_prefix, state.path)
}

/// Build the derived view for the current state.
#[must_use]
pub fn derive(state: &ViewState) -> DerivedView<'_> {
    let prefix = effective_prefix(state);
    let metric = state.metric_type;
    let points = state
        .values
        .iter()
        .filter(|record| record.filename.starts_with(prefix.as_str()))
        .map(|record| PlotPoint {
            record,
            value: metric.value_of(record),
        })
        .collect();

    DerivedView {
        points,
        chart: ChartKind::select(state.plot_type, metric),
        flags: DisplayFlags {
            display_regression: state.display_regression,
            display_filenames: state.display_filenames,
            regression_type: state.regression_type,
            metric_type: metric,
        },
        path_label: format!("./{}", state.file_prefix),
        active_file: state.active_file.as_ref(),
    }
}
