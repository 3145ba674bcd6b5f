//! Visualization settings and the category colour map
//!
//! Settings mirror the host's state object: colour keys per status, legend
//! labels, the VR flag and a handful of stage dimensions.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dataset::{DatasetResult, RawCategory, read_document};

/// Category key used for nodes without a recognised category
pub const NO_CATEGORY: &str = "default_no_category";

/// Host-provided settings; every field has a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub link_unselected_color: String,
    pub link_unselected_opacity: f32,
    pub link_inbound_color: String,
    pub link_outbound_color: String,
    pub legend_inbound_label: String,
    pub legend_outbound_label: String,
    pub cursor_inner_color: String,
    pub cursor_outer_color: String,
    pub cursor_active_color: String,
    pub cursor_opacity: f32,
    pub basic_node_color: String,
    pub adjacent_node_color: String,
    pub highlight_node_color: String,
    pub vr_enabled: bool,
    /// Gaze dwell time before a fuse fires
    pub fuse_duration_ms: u64,
    /// Standing eye height of the user
    pub user_height: f32,
    /// Edge length of the square stage the graph is arranged on
    pub stage_size: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            link_unselected_color: "#ffffff".to_string(),
            link_unselected_opacity: 0.01,
            link_inbound_color: "#FDD835".to_string(),
            link_outbound_color: "#F44336".to_string(),
            legend_inbound_label: "Also Searched For".to_string(),
            legend_outbound_label: "Related Searches".to_string(),
            cursor_inner_color: "#ffffff".to_string(),
            cursor_outer_color: "#000000".to_string(),
            cursor_active_color: "#0FA200".to_string(),
            cursor_opacity: 0.5,
            basic_node_color: "#ffffff".to_string(),
            adjacent_node_color: "#ffffff".to_string(),
            highlight_node_color: "#ff7700".to_string(),
            vr_enabled: false,
            fuse_duration_ms: 2000,
            user_height: 1.6,
            stage_size: 10.0,
        }
    }
}

impl Settings {
    /// Load settings from a `.json`, `.yaml` or `.yml` file
    pub fn from_path(path: &Path) -> DatasetResult<Self> {
        read_document(path)
    }

    pub fn fuse_duration(&self) -> Duration {
        Duration::from_millis(self.fuse_duration_ms)
    }

    pub fn stage(&self) -> Stage {
        Stage {
            size: self.stage_size,
            user_height: self.user_height,
        }
    }
}

/// Physical dimensions every layout and focus computation scales against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    pub size: f32,
    pub user_height: f32,
}

impl Default for Stage {
    fn default() -> Self {
        Settings::default().stage()
    }
}

/// Colours for one category, one per node material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryColors {
    pub name: String,
    pub basic: String,
    pub adjacent: String,
    pub highlight: String,
}

/// Ordered category colours; the first entry is always [`NO_CATEGORY`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorMap {
    entries: Vec<CategoryColors>,
}

impl ColorMap {
    /// Build the map from settings and the dataset's categories
    pub fn from_settings(settings: &Settings, categories: &[RawCategory]) -> Self {
        let mut entries = vec![CategoryColors {
            name: NO_CATEGORY.to_string(),
            basic: settings.basic_node_color.clone(),
            adjacent: settings.adjacent_node_color.clone(),
            highlight: settings.highlight_node_color.clone(),
        }];
        for category in categories {
            let name = normalize_category(&category.name);
            if entries.iter().any(|e| e.name == name) {
                continue;
            }
            entries.push(CategoryColors {
                name,
                basic: category.color.clone(),
                adjacent: category.color.clone(),
                highlight: category.color.clone(),
            });
        }
        Self { entries }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&CategoryColors> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[CategoryColors] {
        &self.entries
    }

    /// Map a raw category onto a known key, falling back to [`NO_CATEGORY`]
    pub fn resolve(&self, raw: Option<&str>) -> String {
        raw.map(normalize_category)
            .filter(|name| self.contains(name))
            .unwrap_or_else(|| NO_CATEGORY.to_string())
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), &[])
    }
}

fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}
