//! End-to-end tests for the resolve and inspect subcommands over descriptor
//! sets on disk.

use std::path::{Path, PathBuf};

use protofab_cli::config::ResolveConfig;
use protofab_cli::inspect::{inspect, run_inspect, InspectArgs};
use protofab_cli::resolve::{resolve_sets, run_resolve, ResolveArgs};
use protofab_core::FullName;

const BASE_YAML: &str = r#"
file:
  - name: acme/base.proto
    package: acme
    message_type:
      - name: M
        field:
          - { name: id, number: 1, type: int64 }
        extension_range:
          - { start: 100, end: 200 }
      - name: Node
        field:
          - { name: label, number: 1, type: string }
          - { name: children, number: 2, type_name: Node, label: repeated }
"#;

// The extension file is listed before the file it depends on.
const EXT_JSON: &str = r#"{
  "file": [
    {
      "name": "acme/app.proto",
      "package": "acme.app",
      "dependency": ["acme/ext.proto"],
      "message_type": [
        { "name": "App", "field": [ { "name": "b", "number": 1, "type_name": ".acme.ext.B" } ] }
      ]
    },
    {
      "name": "acme/ext.proto",
      "package": "acme.ext",
      "dependency": ["acme/base.proto"],
      "message_type": [
        { "name": "B", "field": [ { "name": "m", "number": 1, "type_name": ".acme.M" } ] }
      ],
      "extension": [
        { "name": "tag", "number": 100, "type": "string", "extendee": ".acme.M" }
      ]
    }
  ]
}"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn sets(dir: &Path) -> Vec<PathBuf> {
    vec![
        write(dir, "ext.json", EXT_JSON),
        write(dir, "base.yaml", BASE_YAML),
    ]
}

fn name(s: &str) -> FullName {
    FullName::new(s).unwrap()
}

#[test]
fn resolves_all_files_across_sets() {
    let dir = tempfile::tempdir().unwrap();
    let config = ResolveConfig {
        descriptor_sets: sets(dir.path()),
        files: Vec::new(),
    };
    let (factory, types) = resolve_sets(&config).unwrap();
    let keys: Vec<&str> = types.keys().map(FullName::as_str).collect();
    assert_eq!(keys, ["acme.M", "acme.Node", "acme.app.App", "acme.ext.B"]);
    assert_eq!(factory.pool().file_count(), 3);
    assert!(types[&name("acme.M")].find_extension_by_number(100).is_some());
}

#[test]
fn requested_files_narrow_the_listing() {
    let dir = tempfile::tempdir().unwrap();
    let config = ResolveConfig {
        descriptor_sets: sets(dir.path()),
        files: vec!["acme/ext.proto".into()],
    };
    let (_, types) = resolve_sets(&config).unwrap();
    let keys: Vec<&str> = types.keys().map(FullName::as_str).collect();
    assert_eq!(keys, ["acme.ext.B"]);
}

#[test]
fn unknown_requested_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = ResolveConfig {
        descriptor_sets: sets(dir.path()),
        files: vec!["acme/missing.proto".into()],
    };
    let err = resolve_sets(&config).unwrap_err();
    assert!(format!("{err:#}").contains("acme/missing.proto"));
}

#[test]
fn missing_dependency_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let only_ext = write(dir.path(), "ext.json", EXT_JSON);
    let config = ResolveConfig {
        descriptor_sets: vec![only_ext],
        files: Vec::new(),
    };
    let err = resolve_sets(&config).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("failed to resolve descriptor sets"));
    assert!(message.contains("acme/base.proto"));
}

#[test]
fn unsupported_set_format_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = ResolveConfig {
        descriptor_sets: vec![write(dir.path(), "set.txt", "")],
        files: Vec::new(),
    };
    assert!(resolve_sets(&config).is_err());
}

#[test]
fn inspect_prints_fields_and_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let config = ResolveConfig {
        descriptor_sets: sets(dir.path()),
        files: Vec::new(),
    };
    let listing = inspect(&config, "acme.M").unwrap();
    assert_eq!(
        listing,
        "acme.M (acme/base.proto)\n  1 id: int64\n  [100] acme.ext.tag: string\n"
    );

    let node = inspect(&config, ".acme.Node").unwrap();
    assert!(node.contains("2 children: repeated acme.Node"));

    assert!(inspect(&config, "acme.Nope").is_err());
}

#[test]
fn manifest_drives_resolution() {
    let dir = tempfile::tempdir().unwrap();
    sets(dir.path());
    let manifest = write(
        dir.path(),
        "protofab.yaml",
        "descriptor_sets: [base.yaml, ext.json]\nfiles: [acme/app.proto]\n",
    );
    let config = ResolveConfig::load(&manifest).unwrap();
    let (_, types) = resolve_sets(&config).unwrap();
    assert_eq!(types.len(), 1);
    assert!(types.contains_key(&name("acme.app.App")));
}

#[test]
fn exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let config = ResolveConfig::default();

    let no_sets = ResolveArgs {
        sets: Vec::new(),
        files: Vec::new(),
    };
    assert_eq!(run_resolve(&no_sets, &config).unwrap(), 1);

    let ok = ResolveArgs {
        sets: sets(dir.path()),
        files: Vec::new(),
    };
    assert_eq!(run_resolve(&ok, &config).unwrap(), 0);

    let inspect_args = InspectArgs {
        sets: sets(dir.path()),
        message: "acme.ext.B".into(),
    };
    assert_eq!(run_inspect(&inspect_args, &config).unwrap(), 0);
}
