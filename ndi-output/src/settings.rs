//! User-facing settings and the property sheet the host renders for them

use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "obs-ndi output (changeme)";

/// Settings applied on the next `start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Name the sender advertises on the network
    #[serde(rename = "ndi_name")]
    pub name: String,
    pub uses_video: bool,
    pub uses_audio: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            uses_video: true,
            uses_audio: true,
        }
    }
}

impl OutputSettings {
    /// Parse the host's settings blob. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        // A struct of strings and bools always serializes
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub key: &'static str,
    pub description: &'static str,
    pub kind: PropertyKind,
}

/// Property sheet shown by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Properties {
    /// Apply edits only once the user confirms the dialog
    pub defer_update: bool,
    pub items: Vec<Property>,
}

impl Properties {
    pub fn output() -> Self {
        Self {
            defer_update: true,
            items: vec![Property {
                key: "ndi_name",
                description: "NDI Name",
                kind: PropertyKind::Text,
            }],
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
