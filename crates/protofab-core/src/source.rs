//! Descriptor-set loading.
//!
//! Reads a [`FileDescriptorSet`] from a JSON or YAML document. The format
//! is chosen by file extension.

use std::path::Path;

use crate::error::{DescriptorError, DescriptorResult};
use crate::proto::FileDescriptorSet;

impl FileDescriptorSet {
    /// Parse a descriptor set from a JSON string.
    pub fn from_json_str(content: &str) -> DescriptorResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a descriptor set from a YAML string.
    pub fn from_yaml_str(content: &str) -> DescriptorResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a descriptor set from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::UnsupportedFormat`] for extensions other
    /// than `.json`, `.yaml` and `.yml`, and a path-tagged parse or I/O error
    /// otherwise.
    pub fn load(path: impl AsRef<Path>) -> DescriptorResult<Self> {
        let path = path.as_ref();
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Format::Json,
            Some("yaml" | "yml") => Format::Yaml,
            _ => {
                return Err(DescriptorError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match format {
            Format::Json => {
                serde_json::from_str(&content).map_err(|source| DescriptorError::JsonParse {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Format::Yaml => {
                serde_yaml::from_str(&content).map_err(|source| DescriptorError::YamlParse {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// Concatenate several sets, preserving order.
    pub fn merge(sets: impl IntoIterator<Item = FileDescriptorSet>) -> Self {
        Self {
            file: sets.into_iter().flat_map(|s| s.file).collect(),
        }
    }
}

enum Format {
    Json,
    Yaml,
}
