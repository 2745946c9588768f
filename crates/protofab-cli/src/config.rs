//! # Resolve Manifest
//!
//! A YAML file naming the descriptor sets to load and, optionally, the
//! files whose messages should be reported:
//!
//! ```yaml
//! descriptor_sets:
//!   - schemas/base.yaml
//!   - schemas/ext.json
//! files:
//!   - acme/app.proto
//! ```
//!
//! Relative set paths are taken relative to the manifest's directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveConfig {
    pub descriptor_sets: Vec<PathBuf>,
    pub files: Vec<String>,
}

impl ResolveConfig {
    /// Read a manifest from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: ResolveConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for set in &mut config.descriptor_sets {
            *set = crate::resolve_path(set, base);
        }
        tracing::debug!(
            config = %path.display(),
            sets = config.descriptor_sets.len(),
            files = config.files.len(),
            "loaded resolve manifest"
        );
        Ok(config)
    }

    /// Command-line values first, then the manifest's, without repeats.
    pub fn merged_with(&self, sets: &[PathBuf], files: &[String]) -> ResolveConfig {
        let mut merged = ResolveConfig {
            descriptor_sets: sets.to_vec(),
            files: files.to_vec(),
        };
        for set in &self.descriptor_sets {
            if !merged.descriptor_sets.contains(set) {
                merged.descriptor_sets.push(set.clone());
            }
        }
        for file in &self.files {
            if !merged.files.contains(file) {
                merged.files.push(file.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_sets_resolve_against_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("base.yaml"), "file: []\n").unwrap();
        let manifest = dir.path().join("protofab.yaml");
        std::fs::write(
            &manifest,
            "descriptor_sets: [base.yaml, /abs/other.json]\nfiles: [acme/base.proto]\n",
        )
        .unwrap();

        let config = ResolveConfig::load(&manifest).unwrap();
        assert_eq!(
            config.descriptor_sets,
            [dir.path().join("base.yaml"), PathBuf::from("/abs/other.json")]
        );
        assert_eq!(config.files, ["acme/base.proto"]);
    }

    #[test]
    fn unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("protofab.yaml");
        std::fs::write(&manifest, "descriptor_set: [a.yaml]\n").unwrap();
        let err = ResolveConfig::load(&manifest).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn missing_manifest_reported() {
        let err = ResolveConfig::load(Path::new("/nonexistent/protofab.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn merge_keeps_cli_values_first() {
        let config = ResolveConfig {
            descriptor_sets: vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")],
            files: vec!["x.proto".into()],
        };
        let merged = config.merged_with(&[PathBuf::from("b.yaml")], &["y.proto".into()]);
        assert_eq!(
            merged.descriptor_sets,
            [PathBuf::from("b.yaml"), PathBuf::from("a.yaml")]
        );
        assert_eq!(merged.files, ["y.proto", "x.proto"]);
    }
}
