//! # protofab-cli — Command-Line Interface
//!
//! Provides the `protofab` binary.
//!
//! ## Subcommands
//!
//! - `protofab resolve` — load descriptor sets, resolve every file in
//!   dependency order, and list the resulting message types with their
//!   fields and registered extensions.
//! - `protofab inspect` — print a single message type.
//!
//! ```bash
//! protofab resolve schemas/base.yaml schemas/ext.json --file acme/ext.proto
//! protofab --config protofab.yaml resolve
//! protofab inspect schemas/base.yaml --message acme.Node
//! ```

pub mod config;
pub mod inspect;
pub mod resolve;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use protofab_core::{FileDescriptorSet, Label};
use protofab_factory::MessageType;

/// Resolve a path that may be relative to `base`.
///
/// Absolute paths are returned unchanged.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Load and concatenate the descriptor sets at `paths`.
pub fn load_sets(paths: &[PathBuf]) -> Result<FileDescriptorSet> {
    let mut sets = Vec::with_capacity(paths.len());
    for path in paths {
        let set = FileDescriptorSet::load(path)
            .with_context(|| format!("failed to load descriptor set {}", path.display()))?;
        tracing::info!(path = %path.display(), files = set.file.len(), "loaded descriptor set");
        sets.push(set);
    }
    Ok(FileDescriptorSet::merge(sets))
}

/// Human-readable listing of a message type.
///
/// ```text
/// acme.Node (acme/base.proto)
///   1 label: string
///   2 children: repeated acme.Node
///   [100] acme.ext.payload: acme.ext.Payload
/// ```
pub fn describe(message_type: &MessageType) -> String {
    let descriptor = message_type.descriptor();
    let mut out = format!("{} ({})\n", descriptor.full_name, descriptor.file);
    for field in &descriptor.fields {
        let _ = writeln!(
            out,
            "  {} {}: {}{}",
            field.number,
            field.name,
            label_prefix(field.label),
            field.kind
        );
    }
    for extension in message_type.extensions() {
        let _ = writeln!(
            out,
            "  [{}] {}: {}{}",
            extension.number,
            extension.full_name,
            label_prefix(extension.label),
            extension.kind
        );
    }
    out
}

fn label_prefix(label: Label) -> &'static str {
    match label {
        Label::Optional => "",
        Label::Required => "required ",
        Label::Repeated => "repeated ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protofab_core::{DescriptorProto, FieldDescriptorProto, FieldType, FileDescriptorProto};
    use protofab_factory::get_messages;

    #[test]
    fn describe_lists_fields_and_extensions() {
        let file = FileDescriptorProto::new("acme/base.proto")
            .with_package("acme")
            .with_message(
                DescriptorProto::new("Node")
                    .with_field(FieldDescriptorProto::scalar("label", 1, FieldType::String).required())
                    .with_field(FieldDescriptorProto::message("children", 2, "Node").repeated())
                    .with_extension_range(100, 200)
                    .with_extension(
                        FieldDescriptorProto::scalar("weight", 100, FieldType::Int32)
                            .extending("Node"),
                    ),
            );
        let types = get_messages(vec![file]).unwrap();
        let node = types.values().next().unwrap();
        assert_eq!(
            describe(node),
            "acme.Node (acme/base.proto)\n\
             \x20 1 label: required string\n\
             \x20 2 children: repeated acme.Node\n\
             \x20 [100] acme.Node.weight: int32\n"
        );
    }

    #[test]
    fn relative_paths_join_base() {
        assert_eq!(
            resolve_path(Path::new("a.yaml"), Path::new("/srv")),
            PathBuf::from("/srv/a.yaml")
        );
        assert_eq!(
            resolve_path(Path::new("/etc/a.yaml"), Path::new("/srv")),
            PathBuf::from("/etc/a.yaml")
        );
    }

    #[test]
    fn load_sets_reports_path() {
        let err = load_sets(&[PathBuf::from("/nonexistent/set.yaml")]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/set.yaml"));
    }
}
