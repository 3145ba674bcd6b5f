//! Raw dataset documents
//!
//! The dataset is the untrusted input handed over by the host page: nodes,
//! weighted links and optional category colours. Nothing here is validated
//! beyond parsing; normalization happens in [`crate::graph::GraphModel::build`].

use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors that can occur while loading a dataset or settings document
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The file extension is not one of json, yaml or yml
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON document could not be parsed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The YAML document could not be parsed
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for document loading
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Node identifier; JSON strings and integers are both accepted
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Integer(i64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(text) => NodeId(text),
            Repr::Integer(number) => NodeId(number.to_string()),
        })
    }
}

/// A node as it appears in the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: NodeId,

    /// Display name; falls back to the id when absent
    #[serde(default)]
    pub name: Option<String>,

    /// Sort order used by the spiral and grid layouts
    #[serde(default)]
    pub rank: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A weighted directed link as it appears in the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLink {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default = "default_link_value")]
    pub value: f32,
}

fn default_link_value() -> f32 {
    1.0
}

/// A named category colour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCategory {
    pub name: String,
    pub color: String,
}

/// The complete dataset document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub links: Vec<RawLink>,
    #[serde(default)]
    pub categories: Vec<RawCategory>,
}

impl Dataset {
    /// Load a dataset from a `.json`, `.yaml` or `.yml` file
    pub fn from_path(path: &Path) -> DatasetResult<Self> {
        read_document(path)
    }

    /// Parse a dataset from a JSON string
    pub fn from_json(json: &str) -> DatasetResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Read a JSON or YAML document, picking the parser from the file extension
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> DatasetResult<T> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "json" => {
            let content = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        "yaml" | "yml" => {
            let content = fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&content)?)
        }
        _ => Err(DatasetError::UnsupportedFormat(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_string_and_integer_ids() {
        let dataset = Dataset::from_json(
            r#"{
                "nodes": [{"id": 1, "name": "One", "rank": 1}, {"id": "two", "rank": 2}],
                "links": [{"source": 1, "target": "two", "value": 5}]
            }"#,
        )
        .unwrap();

        assert_eq!(dataset.nodes[0].id, NodeId::from("1"));
        assert_eq!(dataset.nodes[1].id, NodeId::from("two"));
        assert_eq!(dataset.nodes[1].name, None);
        assert_eq!(dataset.links[0].source.as_str(), "1");
        assert_eq!(dataset.links[0].value, 5.0);
        assert!(dataset.categories.is_empty());
    }

    #[test]
    fn link_value_defaults_to_one() {
        let dataset =
            Dataset::from_json(r#"{"links": [{"source": "a", "target": "b"}]}"#).unwrap();
        assert_eq!(dataset.links[0].value, 1.0);
        assert!(dataset.nodes.is_empty());
    }

    #[test]
    fn reads_yaml_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.yaml");
        fs::write(
            &path,
            "nodes:\n  - id: a\n    rank: 1\n    category: ' Tech '\nlinks: []\ncategories:\n  - name: Tech\n    color: '#ff0000'\n",
        )
        .unwrap();

        let dataset = Dataset::from_path(&path).unwrap();
        assert_eq!(dataset.nodes.len(), 1);
        assert_eq!(dataset.nodes[0].category.as_deref(), Some(" Tech "));
        assert_eq!(dataset.categories[0].color, "#ff0000");
    }

    #[test]
    fn rejects_unknown_extension() {
        let result = Dataset::from_path(Path::new("data.csv"));
        assert!(matches!(result, Err(DatasetError::UnsupportedFormat(_))));
    }

    #[test]
    fn reports_malformed_json() {
        let result = Dataset::from_json("{ not json");
        assert!(matches!(result, Err(DatasetError::Json(_))));
    }
}
