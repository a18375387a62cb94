//! Descriptive metadata for overlay files, keyed by overlay file name.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

const ENHANCED_PREFIX: &str = "enhanced_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayMetadata {
    pub source: Option<String>,
    pub external_link: Option<String>,
    pub recorded_time: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub original: Option<String>,
}

impl OverlayMetadata {
    pub fn source_or_default(&self) -> &str {
        self.source.as_deref().unwrap_or("Unknown")
    }

    pub fn link_or_default(&self) -> &str {
        self.external_link.as_deref().unwrap_or("#")
    }

    pub fn recorded_time_or_default(&self) -> &str {
        self.recorded_time.as_deref().unwrap_or("Unknown")
    }

    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or("N/A")
    }
}

/// Un-enhanced file name for an overlay key: `enhanced_x.geojson` -> `x.geojson`.
pub fn original_file(key: &str) -> String {
    key.replace(ENHANCED_PREFIX, "")
}

/// Metadata entries in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataCatalog {
    entries: Vec<(String, OverlayMetadata)>,
}

impl MetadataCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open overlay metadata: {:?}", path))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse overlay metadata: {:?}", path))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: Map<String, Value> =
            serde_json::from_reader(reader).context("Metadata is not a JSON object")?;
        Self::from_map(raw)
    }

    pub fn from_map(raw: Map<String, Value>) -> Result<Self> {
        let mut entries = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            if !value.is_object() {
                warn!(key = %key, "Skipping non-object metadata entry");
                continue;
            }
            let mut meta: OverlayMetadata = serde_json::from_value(value)
                .with_context(|| format!("Invalid metadata entry: {}", key))?;
            if meta.original.is_none() {
                meta.original = Some(original_file(&key));
            }
            entries.push((key, meta));
        }
        debug!(entries = entries.len(), "Loaded overlay metadata");
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&OverlayMetadata> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, m)| m)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverlayMetadata)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
