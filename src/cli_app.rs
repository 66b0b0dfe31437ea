//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use thiserror::Error;

use attractor_view::core::config::Config;
use attractor_view::core::errors::LoadError;
use attractor_view::logger::jsonl::{JsonlConfig, JsonlWriter};
use attractor_view::view::catalog::DatasetCatalog;
use attractor_view::view::derive::DerivedView;
use attractor_view::view::loader::{DatasetLoader, HttpMetricSource, StaticData};
use attractor_view::view::model::{
    DashboardModel, DashboardMsg, DatasetType, LoadPhase, MetricType, PlotType, ViewAction,
    ViewState,
};
use attractor_view::view::runtime::DashboardRuntime;

/// Attractor view: churn/complexity hotspots from the command line.
#[derive(Debug, Parser)]
#[command(
    name = "attractor-view",
    author,
    version,
    about = "Churn/complexity hotspot viewer",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Print lifecycle details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Load a dataset and print the derived view.
    Show(ShowArgs),
    /// List the known dataset types.
    Types,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MetricArg {
    ChurnComplexity,
    Complexity,
    Churn,
}

impl From<MetricArg> for MetricType {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::ChurnComplexity => Self::ChurnComplexity,
            MetricArg::Complexity => Self::Complexity,
            MetricArg::Churn => Self::Churn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlotArg {
    Scatter,
    Treemap,
}

impl From<PlotArg> for PlotType {
    fn from(value: PlotArg) -> Self {
        match value {
            PlotArg::Scatter => Self::ScatterPlot,
            PlotArg::Treemap => Self::TreeMap,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct ShowArgs {
    /// Dataset type key (defaults to `datasets.default_type`).
    #[arg(long = "type", value_name = "TYPE")]
    dataset: Option<String>,
    /// Path filter appended to the server file prefix.
    #[arg(long, value_name = "PATH")]
    path: Option<String>,
    /// Metric to plot.
    #[arg(long, value_enum, value_name = "METRIC")]
    metric: Option<MetricArg>,
    /// Plot family.
    #[arg(long, value_enum, value_name = "PLOT")]
    plot: Option<PlotArg>,
    /// Read the metric list from a JSON file instead of the server.
    #[arg(long, value_name = "FILE")]
    values_file: Option<PathBuf>,
    /// Use this file prefix instead of asking the server.
    #[arg(long, value_name = "PREFIX")]
    file_prefix: Option<String>,
    /// Open the details panel for this filename.
    #[arg(long, value_name = "FILENAME")]
    select: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// The load cycle ended in the failed state.
    #[error("{0}")]
    Load(#[from] LoadError),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) | Self::Load(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Show(args) => run_show(cli, args),
        Command::Types => run_types(cli),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn run_show(cli: &Cli, args: &ShowArgs) -> Result<(), CliError> {
    let mut config =
        Config::load(cli.config.as_deref()).map_err(|e| CliError::Runtime(e.to_string()))?;
    apply_show_overrides(&mut config, args);

    let dataset = args
        .dataset
        .as_deref()
        .map_or_else(|| config.datasets.default_dataset(), DatasetType::from);
    let config_hash = config
        .stable_hash()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    if cli.verbose {
        eprintln!(
            "attractor-view: config {} (hash {config_hash})",
            config.config_file.display()
        );
    }

    let static_data =
        StaticData::from_config(&config.static_data).map_err(|e| CliError::User(e.to_string()))?;
    let source = HttpMetricSource::new(&config.server.base_url, config.server.timeout());
    let loader = DatasetLoader::new(Box::new(source), static_data);
    let model = DashboardModel::new(
        dataset,
        ViewState::from_config(&config.view),
        config.static_data.serve_static,
    );

    let mut runtime = DashboardRuntime::new(model, loader);
    if let Some(jsonl) = JsonlConfig::from_logging(&config.logging) {
        runtime = runtime.with_session_log(JsonlWriter::open(jsonl), &config_hash);
    }

    runtime.dispatch(DashboardMsg::Start);
    runtime
        .wait_for_settle(config.server.timeout() + Duration::from_secs(1))
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    if cli.verbose {
        let model = runtime.model();
        eprintln!(
            "attractor-view: phase={} generation={} completed={} discarded={}",
            model.phase.label(),
            model.generation,
            model.loads_completed,
            model.loads_discarded
        );
    }
    if let LoadPhase::Failed(error) = &runtime.model().phase {
        return Err(CliError::Load(error.clone()));
    }

    for action in show_actions(args) {
        runtime.dispatch(DashboardMsg::View(action));
    }
    if let Some(filename) = &args.select {
        let record = runtime
            .model()
            .view
            .values
            .iter()
            .find(|r| &r.filename == filename)
            .cloned()
            .ok_or_else(|| CliError::User(format!("no record named {filename}")))?;
        runtime.dispatch(DashboardMsg::SelectFile(record));
    }

    let catalog = DatasetCatalog::from_config(&config.datasets, config.static_data.serve_static);
    let model = runtime.model();
    let view = runtime.view();
    match output_mode(cli) {
        OutputMode::Human => print_view(&catalog, &model.dataset, &view)?,
        OutputMode::Json => {
            let payload = json!({
                "command": "show",
                "dataset": model.dataset,
                "phase": model.phase.label(),
                "generation": model.generation,
                "summary": view.summary(),
                "view": view,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn apply_show_overrides(config: &mut Config, args: &ShowArgs) {
    if let Some(path) = &args.values_file {
        config.static_data.values_file = Some(path.clone());
    }
    if let Some(prefix) = &args.file_prefix {
        config.static_data.file_prefix = Some(prefix.clone());
    }
}

fn show_actions(args: &ShowArgs) -> Vec<ViewAction> {
    let mut actions = Vec::new();
    if let Some(path) = &args.path {
        actions.push(ViewAction::SetPath(path.clone()));
    }
    if let Some(metric) = args.metric {
        actions.push(ViewAction::SetMetricType(metric.into()));
    }
    if let Some(plot) = args.plot {
        actions.push(ViewAction::SetPlotType(plot.into()));
    }
    actions
}

fn print_view(
    catalog: &DatasetCatalog,
    dataset: &DatasetType,
    view: &DerivedView<'_>,
) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} ({dataset})  chart: {}  metric: {}",
        catalog.label(dataset),
        view.chart.label(),
        view.flags.metric_type.label()
    )?;
    writeln!(out, "path: {}", view.path_label)?;
    writeln!(out)?;
    writeln!(out, "{:>14}  {:>8}  {:>10}  FILE", "VALUE", "CHURN", "COMPLEXITY")?;
    for point in &view.points {
        writeln!(
            out,
            "{:>14.2}  {:>8}  {:>10.2}  {}",
            point.value, point.record.churn, point.record.complexity, point.record.filename
        )?;
    }
    writeln!(out)?;
    match view.summary() {
        Some(s) => writeln!(
            out,
            "{} files  min {:.2}  max {:.2}  mean {:.2}",
            s.count, s.min, s.max, s.mean
        )?,
        None => writeln!(out, "no files match")?,
    }
    if let Some(active) = view.active_file {
        writeln!(out)?;
        writeln!(out, "selected: {}", active.filename)?;
        writeln!(out, "  churn: {}", active.churn)?;
        writeln!(out, "  complexity: {}", active.complexity)?;
        for (key, value) in &active.details {
            writeln!(out, "  {key}: {value}")?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// types
// ---------------------------------------------------------------------------

fn run_types(cli: &Cli) -> Result<(), CliError> {
    let config =
        Config::load(cli.config.as_deref()).map_err(|e| CliError::Runtime(e.to_string()))?;
    let catalog = DatasetCatalog::from_config(&config.datasets, config.static_data.serve_static);
    let entries = catalog.entries(&config.datasets.default_dataset());

    match output_mode(cli) {
        OutputMode::Human => {
            let mut out = io::stdout().lock();
            for entry in &entries {
                let marker = if entry.active { "*" } else { " " };
                match &entry.href {
                    Some(href) => writeln!(out, "{marker} {:<6} {}  {href}", entry.key, entry.label)?,
                    None => writeln!(out, "{marker} {:<6} {}", entry.key, entry.label)?,
                }
            }
        }
        OutputMode::Json => {
            write_json_line(&json!({ "command": "types", "types": entries }))?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// output
// ---------------------------------------------------------------------------

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("ATTRACTOR_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_before_and_after_subcommand() {
        let before = Cli::try_parse_from([
            "attractor-view",
            "--config",
            "/tmp/view.toml",
            "--json",
            "-v",
            "types",
        ]);
        assert!(before.is_ok());

        let after = Cli::try_parse_from(["attractor-view", "show", "--json", "-v"]);
        assert!(after.is_ok());
    }

    #[test]
    fn parses_show_options() {
        let cli = Cli::try_parse_from([
            "attractor-view",
            "show",
            "--type",
            "js",
            "--path",
            "src/",
            "--metric",
            "churn-complexity",
            "--plot",
            "treemap",
            "--select",
            "src/app.js",
        ])
        .unwrap();
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.dataset.as_deref(), Some("js"));
        assert_eq!(args.metric, Some(MetricArg::ChurnComplexity));
        assert_eq!(args.plot, Some(PlotArg::Treemap));
        assert_eq!(
            show_actions(&args),
            vec![
                ViewAction::SetPath("src/".into()),
                ViewAction::SetMetricType(MetricType::ChurnComplexity),
                ViewAction::SetPlotType(PlotType::TreeMap),
            ]
        );
    }

    #[test]
    fn rejects_unknown_metric() {
        let parsed = Cli::try_parse_from(["attractor-view", "show", "--metric", "lines"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn overrides_land_in_static_data() {
        let cli = Cli::try_parse_from([
            "attractor-view",
            "show",
            "--values-file",
            "/tmp/values.json",
            "--file-prefix",
            "app/",
        ])
        .unwrap();
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        let mut config = Config::default();
        apply_show_overrides(&mut config, &args);
        assert_eq!(
            config.static_data.values_file,
            Some(PathBuf::from("/tmp/values.json"))
        );
        assert_eq!(config.static_data.file_prefix.as_deref(), Some("app/"));
    }

    #[test]
    fn output_mode_resolution_honors_precedence() {
        assert_eq!(
            resolve_output_mode(true, Some("human"), true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode(false, Some("json"), true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode(false, Some("human"), false),
            OutputMode::Human
        );
        assert_eq!(
            resolve_output_mode(false, Some("auto"), true),
            OutputMode::Human
        );
        assert_eq!(resolve_output_mode(false, None, false), OutputMode::Json);
    }

    #[test]
    fn load_errors_exit_with_one() {
        let err = CliError::from(LoadError::new(
            attractor_view::core::errors::LoadSource::Values,
            "not found",
        ));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "values request failed: not found");
        assert_eq!(CliError::Runtime("x".into()).exit_code(), 2);
    }
}
