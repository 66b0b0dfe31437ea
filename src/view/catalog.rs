//! Dataset-type navigation entries.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::config::DatasetsConfig;
use crate::view::model::DatasetType;

/// One navigation entry for a dataset type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub key: DatasetType,
    pub label: String,
    pub active: bool,
    /// Per-type static page; `None` when selection happens in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Known dataset types in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetCatalog {
    types: Vec<(DatasetType, String)>,
    serve_static: bool,
}

impl DatasetCatalog {
    #[must_use]
    pub fn from_config(datasets: &DatasetsConfig, serve_static: bool) -> Self {
        Self {
            types: datasets
                .types
                .iter()
                .map(|(key, label)| (DatasetType::new(key.as_str()), label.clone()))
                .collect(),
            serve_static,
        }
    }

    #[must_use]
    pub fn contains(&self, dataset: &DatasetType) -> bool {
        self.types.iter().any(|(key, _)| key == dataset)
    }

    /// Display label, falling back to the key itself.
    #[must_use]
    pub fn label<'a>(&'a self, dataset: &'a DatasetType) -> &'a str {
        self.types
            .iter()
            .find(|(key, _)| key == dataset)
            .map_or(dataset.as_str(), |(_, label)| label.as_str())
    }

    /// Navigation entries with `active` marking the current type.
    #[must_use]
    pub fn entries(&self, active: &DatasetType) -> Vec<NavEntry> {
        self.types
            .iter()
            .map(|(key, label)| NavEntry {
                key: key.clone(),
                label: label.clone(),
                active: key == active,
                href: self.serve_static.then(|| format!("index.{key}.html")),
            })
            .collect()
    }
}
