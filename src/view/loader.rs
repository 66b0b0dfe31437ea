//! Dataset loader: metric list + file prefix, fetched concurrently and joined.
//!
//! Sources sit behind the [`MetricSource`] trait. Pre-injected
//! [`StaticData`] is handed to the loader at construction and wins over the
//! source for whichever half it provides.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::core::config::StaticDataConfig;
use crate::core::errors::{AttractorError, LoadError, LoadSource, Result};
use crate::view::model::{DatasetType, MetricRecord};

// ──────────────────── payloads ────────────────────

/// What one request produced: data, or a structured error message.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    Data(T),
    Error(String),
}

/// Successful result of a full load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub values: Vec<MetricRecord>,
    /// `None` when the server reported no (or an empty) prefix.
    pub file_prefix: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValuesWire {
    Records(Vec<MetricRecord>),
    Failure { error: Value },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilePrefixWire {
    Failure {
        error: Value,
    },
    Prefix {
        #[serde(default)]
        file_prefix: Option<String>,
    },
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Classify a metric list response body.
#[must_use]
pub fn parse_values(body: &str) -> Payload<Vec<MetricRecord>> {
    match serde_json::from_str::<ValuesWire>(body) {
        Ok(ValuesWire::Records(records)) => Payload::Data(records),
        Ok(ValuesWire::Failure { error }) => Payload::Error(error_message(&error)),
        Err(e) => Payload::Error(format!("undecodable metric list: {e}")),
    }
}

/// Classify a file-prefix response body.
#[must_use]
pub fn parse_file_prefix(body: &str) -> Payload<Option<String>> {
    match serde_json::from_str::<FilePrefixWire>(body) {
        Ok(FilePrefixWire::Prefix { file_prefix }) => {
            Payload::Data(file_prefix.filter(|p| !p.is_empty()))
        }
        Ok(FilePrefixWire::Failure { error }) => Payload::Error(error_message(&error)),
        Err(e) => Payload::Error(format!("undecodable file prefix: {e}")),
    }
}

// ──────────────────── sources ────────────────────

/// Origin of metric data. Implementations must be callable from two worker
/// threads at once.
pub trait MetricSource: Send + Sync {
    fn fetch_values(&self, dataset: &DatasetType) -> Payload<Vec<MetricRecord>>;

    fn fetch_file_prefix(&self) -> Payload<Option<String>>;
}

/// HTTP source: `GET {base}/values?type=..` and `GET {base}/file_prefix`.
#[cfg(feature = "http")]
pub struct HttpMetricSource {
    agent: ureq::Agent,
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpMetricSource {
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn get(&self, path: &str, query: Option<(&str, &str)>) -> std::result::Result<String, String> {
        let mut request = self.agent.get(&format!("{}{path}", self.base_url));
        if let Some((key, value)) = query {
            request = request.query(key, value);
        }
        match request.call() {
            Ok(response) => response
                .into_string()
                .map_err(|e| format!("failed to read {path} response: {e}")),
            // Error statuses may still carry an `{error}` body worth surfacing.
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                match serde_json::from_str::<ErrorBody>(&body) {
                    Ok(parsed) => Err(error_message(&parsed.error)),
                    Err(_) => Err(format!("{path} responded with HTTP {code}")),
                }
            }
            Err(e) => Err(format!("{path} request failed: {e}")),
        }
    }
}

#[cfg(feature = "http")]
#[derive(Deserialize)]
struct ErrorBody {
    error: Value,
}

#[cfg(feature = "http")]
impl MetricSource for HttpMetricSource {
    fn fetch_values(&self, dataset: &DatasetType) -> Payload<Vec<MetricRecord>> {
        match self.get("/values", Some(("type", dataset.as_str()))) {
            Ok(body) => parse_values(&body),
            Err(message) => Payload::Error(message),
        }
    }

    fn fetch_file_prefix(&self) -> Payload<Option<String>> {
        match self.get("/file_prefix", None) {
            Ok(body) => parse_file_prefix(&body),
            Err(message) => Payload::Error(message),
        }
    }
}

/// In-process source keyed by dataset type, with optional per-type latency.
///
/// Unknown types answer with a `not found` error payload, like the server.
#[derive(Debug, Clone)]
pub struct MemoryMetricSource {
    datasets: BTreeMap<DatasetType, Payload<Vec<MetricRecord>>>,
    delays: BTreeMap<DatasetType, Duration>,
    file_prefix: Payload<Option<String>>,
}

impl Default for MemoryMetricSource {
    fn default() -> Self {
        Self {
            datasets: BTreeMap::new(),
            delays: BTreeMap::new(),
            file_prefix: Payload::Data(None),
        }
    }
}

impl MemoryMetricSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dataset(
        mut self,
        dataset: impl Into<DatasetType>,
        values: Vec<MetricRecord>,
    ) -> Self {
        self.datasets.insert(dataset.into(), Payload::Data(values));
        self
    }

    #[must_use]
    pub fn with_failure(mut self, dataset: impl Into<DatasetType>, message: &str) -> Self {
        self.datasets
            .insert(dataset.into(), Payload::Error(message.to_owned()));
        self
    }

    #[must_use]
    pub fn with_delay(mut self, dataset: impl Into<DatasetType>, delay: Duration) -> Self {
        self.delays.insert(dataset.into(), delay);
        self
    }

    #[must_use]
    pub fn with_file_prefix(mut self, prefix: Payload<Option<String>>) -> Self {
        self.file_prefix = prefix;
        self
    }
}

impl MetricSource for MemoryMetricSource {
    fn fetch_values(&self, dataset: &DatasetType) -> Payload<Vec<MetricRecord>> {
        if let Some(delay) = self.delays.get(dataset) {
            thread::sleep(*delay);
        }
        self.datasets
            .get(dataset)
            .cloned()
            .unwrap_or_else(|| Payload::Error("not found".to_owned()))
    }

    fn fetch_file_prefix(&self) -> Payload<Option<String>> {
        self.file_prefix.clone()
    }
}

// ──────────────────── static data ────────────────────

/// Pre-loaded data for offline rendering. Each present field short-circuits
/// the matching request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticData {
    pub values: Option<Vec<MetricRecord>>,
    pub file_prefix: Option<String>,
}

impl StaticData {
    /// Build from configuration, reading `values_file` if set.
    ///
    /// Static pages carry both halves, so `serve_static` injects an empty
    /// prefix when none is configured. Returns `None` when nothing is
    /// pre-injected.
    pub fn from_config(config: &StaticDataConfig) -> Result<Option<Self>> {
        let values = match &config.values_file {
            Some(path) => Some(read_values_file(path)?),
            None => None,
        };
        let file_prefix = match &config.file_prefix {
            Some(prefix) => Some(prefix.clone()),
            None if config.serve_static => Some(String::new()),
            None => None,
        };
        if values.is_none() && file_prefix.is_none() {
            return Ok(None);
        }
        Ok(Some(Self {
            values,
            file_prefix,
        }))
    }
}

fn read_values_file(path: &Path) -> Result<Vec<MetricRecord>> {
    let raw = fs::read_to_string(path).map_err(|source| AttractorError::io(path, source))?;
    let records: Vec<MetricRecord> = serde_json::from_str(&raw)?;
    Ok(records)
}

// ──────────────────── loader ────────────────────

/// Loads one dataset type: both requests run concurrently, then join.
pub struct DatasetLoader {
    source: Box<dyn MetricSource>,
    static_data: Option<StaticData>,
}

impl DatasetLoader {
    #[must_use]
    pub fn new(source: Box<dyn MetricSource>, static_data: Option<StaticData>) -> Self {
        Self {
            source,
            static_data,
        }
    }

    /// Fetch values and prefix for `dataset`.
    ///
    /// Either half reporting an error fails the whole load; nothing partial
    /// is returned.
    pub fn load(&self, dataset: &DatasetType) -> std::result::Result<LoadedDataset, LoadError> {
        let (values, file_prefix) = thread::scope(|scope| {
            let values = scope.spawn(|| self.values_for(dataset));
            let file_prefix = scope.spawn(|| self.file_prefix());
            (
                values
                    .join()
                    .unwrap_or_else(|_| Payload::Error("values worker panicked".to_owned())),
                file_prefix
                    .join()
                    .unwrap_or_else(|_| Payload::Error("file prefix worker panicked".to_owned())),
            )
        });

        let values = match values {
            Payload::Data(values) => values,
            Payload::Error(message) => return Err(LoadError::new(LoadSource::Values, message)),
        };
        let file_prefix = match file_prefix {
            Payload::Data(prefix) => prefix,
            Payload::Error(message) => {
                return Err(LoadError::new(LoadSource::FilePrefix, message));
            }
        };
        Ok(LoadedDataset {
            values,
            file_prefix,
        })
    }

    fn values_for(&self, dataset: &DatasetType) -> Payload<Vec<MetricRecord>> {
        match self.static_data.as_ref().and_then(|s| s.values.as_ref()) {
            Some(values) => Payload::Data(values.clone()),
            None => self.source.fetch_values(dataset),
        }
    }

    fn file_prefix(&self) -> Payload<Option<String>> {
        match self.static_data.as_ref().and_then(|s| s.file_prefix.as_ref()) {
            Some(prefix) => Payload::Data(Some(prefix.clone()).filter(|p| !p.is_empty())),
            None => self.source.fetch_file_prefix(),
        }
    }
}
