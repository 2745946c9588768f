//! # Raw Schema Descriptors
//!
//! Unresolved schema definitions, shaped after protobuf's
//! `descriptor.proto`. Type references (`type_name`, `extendee`) are kept
//! exactly as written: a leading `.` marks a fully-qualified name, anything
//! else is resolved relative to the declaring scope by the registry.
//!
//! All types are serde-compatible so that descriptor sets can be written by
//! hand in YAML or JSON. Collections default to empty when omitted.
//!
//! ```
//! use protofab_core::{DescriptorProto, FieldDescriptorProto, FieldType, FileDescriptorProto};
//!
//! let file = FileDescriptorProto::new("tree.proto")
//!     .with_package("acme")
//!     .with_message(
//!         DescriptorProto::new("Node")
//!             .with_field(FieldDescriptorProto::scalar("label", 1, FieldType::String))
//!             .with_field(FieldDescriptorProto::message("child", 2, "Node").repeated()),
//!     );
//! assert_eq!(file.message_type.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

/// Scalar and composite value kinds a field may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

/// Field cardinality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    #[default]
    Optional,
    Required,
    Repeated,
}

/// A field or extension definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptorProto {
    pub name: String,
    pub number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    /// Omitted when `type_name` is set; the registry then infers
    /// message or enum from what the name resolves to.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Set only on extensions: the message being extended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extendee: Option<String>,
}

impl FieldDescriptorProto {
    /// A scalar-typed field.
    pub fn scalar(name: impl Into<String>, number: i32, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            number,
            r#type: Some(ty),
            ..Self::default()
        }
    }

    /// A message-typed field referencing `type_name`.
    pub fn message(name: impl Into<String>, number: i32, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number,
            r#type: Some(FieldType::Message),
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// An enum-typed field referencing `type_name`.
    pub fn enumeration(
        name: impl Into<String>,
        number: i32,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            number,
            r#type: Some(FieldType::Enum),
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// Mark the field as repeated.
    pub fn repeated(mut self) -> Self {
        self.label = Some(Label::Repeated);
        self
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.label = Some(Label::Required);
        self
    }

    /// Turn the field into an extension of `extendee`.
    pub fn extending(mut self, extendee: impl Into<String>) -> Self {
        self.extendee = Some(extendee.into());
        self
    }
}

/// Half-open range `[start, end)` of field numbers reserved for extensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRange {
    pub start: i32,
    pub end: i32,
}

/// A message definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorProto {
    pub name: String,
    pub field: Vec<FieldDescriptorProto>,
    pub nested_type: Vec<DescriptorProto>,
    pub enum_type: Vec<EnumDescriptorProto>,
    /// Extensions declared in this message's namespace.
    pub extension: Vec<FieldDescriptorProto>,
    pub extension_range: Vec<ExtensionRange>,
}

impl DescriptorProto {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: FieldDescriptorProto) -> Self {
        self.field.push(field);
        self
    }

    pub fn with_nested(mut self, nested: DescriptorProto) -> Self {
        self.nested_type.push(nested);
        self
    }

    pub fn with_enum(mut self, enum_type: EnumDescriptorProto) -> Self {
        self.enum_type.push(enum_type);
        self
    }

    pub fn with_extension(mut self, extension: FieldDescriptorProto) -> Self {
        self.extension.push(extension);
        self
    }

    /// Reserve `[start, end)` for extensions.
    pub fn with_extension_range(mut self, start: i32, end: i32) -> Self {
        self.extension_range.push(ExtensionRange { start, end });
        self
    }
}

/// A single enum value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueDescriptorProto {
    pub name: String,
    pub number: i32,
}

/// An enum definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumDescriptorProto {
    pub name: String,
    pub value: Vec<EnumValueDescriptorProto>,
}

impl EnumDescriptorProto {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.value.push(EnumValueDescriptorProto {
            name: name.into(),
            number,
        });
        self
    }
}

/// A named schema unit: its dependencies and top-level definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDescriptorProto {
    /// File name, unique within a registry (e.g. `acme/item.proto`).
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Names of files this file imports.
    pub dependency: Vec<String>,
    pub message_type: Vec<DescriptorProto>,
    pub enum_type: Vec<EnumDescriptorProto>,
    /// Extensions declared at file scope.
    pub extension: Vec<FieldDescriptorProto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
}

impl FileDescriptorProto {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependency.push(dependency.into());
        self
    }

    pub fn with_message(mut self, message: DescriptorProto) -> Self {
        self.message_type.push(message);
        self
    }

    pub fn with_enum(mut self, enum_type: EnumDescriptorProto) -> Self {
        self.enum_type.push(enum_type);
        self
    }

    pub fn with_extension(mut self, extension: FieldDescriptorProto) -> Self {
        self.extension.push(extension);
        self
    }

    /// A copy with every omitted field label spelled out as `optional`.
    pub fn normalized(&self) -> Self {
        let mut file = self.clone();
        file.extension.iter_mut().for_each(normalize_field);
        file.message_type.iter_mut().for_each(normalize_message);
        file
    }

    /// Whether two files describe the same schema, up to label spelling.
    pub fn same_schema(&self, other: &FileDescriptorProto) -> bool {
        self.normalized() == other.normalized()
    }
}

fn normalize_field(field: &mut FieldDescriptorProto) {
    field.label = Some(field.label.unwrap_or_default());
}

fn normalize_message(message: &mut DescriptorProto) {
    message.field.iter_mut().for_each(normalize_field);
    message.extension.iter_mut().for_each(normalize_field);
    message.nested_type.iter_mut().for_each(normalize_message);
}

/// A collection of files, the unit descriptor sets are stored in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDescriptorSet {
    pub file: Vec<FileDescriptorProto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_defaults_fill_missing_collections() {
        let yaml = r#"
name: item.proto
package: acme
message_type:
  - name: Item
    field:
      - { name: id, number: 1, type: int64 }
      - { name: tags, number: 2, type: string, label: repeated }
"#;
        let file: FileDescriptorProto = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.package.as_deref(), Some("acme"));
        assert!(file.dependency.is_empty());
        let item = &file.message_type[0];
        assert_eq!(item.field.len(), 2);
        assert_eq!(item.field[0].r#type, Some(FieldType::Int64));
        assert_eq!(item.field[1].label, Some(Label::Repeated));
        assert!(item.extension_range.is_empty());
    }

    #[test]
    fn omitted_label_matches_explicit_optional() {
        let implicit = FileDescriptorProto::new("item.proto").with_message(
            DescriptorProto::new("Item")
                .with_field(FieldDescriptorProto::scalar("id", 1, FieldType::Int64))
                .with_nested(
                    DescriptorProto::new("Inner")
                        .with_field(FieldDescriptorProto::scalar("x", 1, FieldType::Bool)),
                ),
        );
        let mut explicit = implicit.clone();
        explicit.message_type[0].field[0].label = Some(Label::Optional);
        explicit.message_type[0].nested_type[0].field[0].label = Some(Label::Optional);

        assert_ne!(implicit, explicit);
        assert!(implicit.same_schema(&explicit));

        let mut repeated = implicit.clone();
        repeated.message_type[0].field[0].label = Some(Label::Repeated);
        assert!(!implicit.same_schema(&repeated));
    }

    #[test]
    fn json_uses_type_key() {
        let field = FieldDescriptorProto::message("child", 3, ".acme.Node");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["type_name"], ".acme.Node");
        assert!(json.get("extendee").is_none());
    }

    #[test]
    fn builders_compose() {
        let ext = FieldDescriptorProto::scalar("note", 100, FieldType::String).extending("acme.Item");
        assert_eq!(ext.extendee.as_deref(), Some("acme.Item"));

        let msg = DescriptorProto::new("Item")
            .with_extension_range(100, 200)
            .with_enum(EnumDescriptorProto::new("Kind").with_value("KIND_UNSPECIFIED", 0));
        assert_eq!(msg.extension_range[0], ExtensionRange { start: 100, end: 200 });
        assert_eq!(msg.enum_type[0].value.len(), 1);
    }
}
