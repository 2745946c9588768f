//! # Resolved Descriptors
//!
//! The registry's view of a schema after insertion: every type reference
//! has been resolved to a [`FullName`], numbers have been range-checked,
//! and each definition knows the file it came from.
//!
//! Descriptors are immutable and shared through `Arc`. Message-to-message
//! references are held by name rather than by pointer, so self-referential
//! and mutually-recursive schemas never form reference cycles.

use std::ops::Range;
use std::sync::Arc;

use protofab_core::{FileDescriptorProto, FullName, Label};

/// The resolved value kind of a field or extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Bytes,
    Uint32,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
    /// A message value of the named type.
    Message(FullName),
    /// An enum value of the named type.
    Enum(FullName),
}

impl FieldKind {
    /// The referenced message type, if this kind is message-valued.
    pub fn message_type(&self) -> Option<&FullName> {
        match self {
            FieldKind::Message(name) => Some(name),
            _ => None,
        }
    }

    /// The referenced enum type, if this kind is enum-valued.
    pub fn enum_type(&self) -> Option<&FullName> {
        match self {
            FieldKind::Enum(name) => Some(name),
            _ => None,
        }
    }

    /// The protobuf spelling of the kind (`int32`, `message`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Double => "double",
            FieldKind::Float => "float",
            FieldKind::Int64 => "int64",
            FieldKind::Uint64 => "uint64",
            FieldKind::Int32 => "int32",
            FieldKind::Fixed64 => "fixed64",
            FieldKind::Fixed32 => "fixed32",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Uint32 => "uint32",
            FieldKind::Sfixed32 => "sfixed32",
            FieldKind::Sfixed64 => "sfixed64",
            FieldKind::Sint32 => "sint32",
            FieldKind::Sint64 => "sint64",
            FieldKind::Message(_) => "message",
            FieldKind::Enum(_) => "enum",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Message(name) | FieldKind::Enum(name) => write!(f, "{}", name),
            other => f.write_str(other.name()),
        }
    }
}

/// A field of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub full_name: FullName,
    pub number: u32,
    pub label: Label,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }
}

/// An extension: a field declared outside a message and attached to it by
/// number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDescriptor {
    pub name: String,
    pub full_name: FullName,
    pub number: u32,
    pub label: Label,
    pub kind: FieldKind,
    /// The message this extension extends.
    pub containing_type: FullName,
    /// The message whose namespace declares the extension, or `None` for a
    /// file-scope extension.
    pub scope: Option<FullName>,
    /// Name of the declaring file.
    pub file: String,
}

impl ExtensionDescriptor {
    /// The message type of the extension's value, if any.
    pub fn message_type(&self) -> Option<&FullName> {
        self.kind.message_type()
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }
}

/// A single named enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

/// An enum definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: String,
    pub full_name: FullName,
    pub file: String,
    pub values: Vec<EnumValueDescriptor>,
}

impl EnumDescriptor {
    pub fn value_by_name(&self, name: &str) -> Option<&EnumValueDescriptor> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn value_by_number(&self, number: i32) -> Option<&EnumValueDescriptor> {
        self.values.iter().find(|v| v.number == number)
    }
}

/// A resolved message definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    pub name: String,
    pub full_name: FullName,
    /// Name of the declaring file.
    pub file: String,
    /// The enclosing message for nested definitions.
    pub containing_type: Option<FullName>,
    pub fields: Vec<FieldDescriptor>,
    pub nested_types: Vec<Arc<MessageDescriptor>>,
    pub enum_types: Vec<Arc<EnumDescriptor>>,
    /// Extensions declared inside this message's namespace. These may
    /// extend any message, not necessarily this one.
    pub extensions: Vec<Arc<ExtensionDescriptor>>,
    /// Field numbers reserved for extensions of this message.
    pub extension_ranges: Vec<Range<u32>>,
}

impl MessageDescriptor {
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Whether `number` falls inside one of the declared extension ranges.
    pub fn is_extension_number(&self, number: u32) -> bool {
        self.extension_ranges.iter().any(|r| r.contains(&number))
    }

    /// Fields whose value is another message.
    pub fn message_fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &FullName)> {
        self.fields
            .iter()
            .filter_map(|f| f.kind.message_type().map(|t| (f, t)))
    }
}

/// A registered schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub package: Option<FullName>,
    pub dependencies: Vec<String>,
    /// Top-level messages, in declaration order.
    pub message_types: Vec<Arc<MessageDescriptor>>,
    pub enum_types: Vec<Arc<EnumDescriptor>>,
    /// File-scope extensions, in declaration order.
    pub extensions: Vec<Arc<ExtensionDescriptor>>,
    /// The raw descriptor this file was built from.
    pub proto: FileDescriptorProto,
}

impl FileDescriptor {
    /// Look up a top-level message by its short name.
    pub fn message_type_by_name(&self, name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.message_types.iter().find(|m| m.name == name)
    }

    /// Look up a file-scope extension by its short name.
    pub fn extension_by_name(&self, name: &str) -> Option<&Arc<ExtensionDescriptor>> {
        self.extensions.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> FullName {
        FullName::new(s).unwrap()
    }

    #[test]
    fn field_kind_references() {
        let kind = FieldKind::Message(name("acme.Node"));
        assert_eq!(kind.message_type(), Some(&name("acme.Node")));
        assert_eq!(kind.enum_type(), None);
        assert_eq!(kind.name(), "message");
        assert_eq!(kind.to_string(), "acme.Node");
        assert_eq!(FieldKind::Sint64.to_string(), "sint64");
    }

    #[test]
    fn extension_number_ranges_are_half_open() {
        let msg = MessageDescriptor {
            name: "Item".into(),
            full_name: name("acme.Item"),
            file: "item.proto".into(),
            containing_type: None,
            fields: Vec::new(),
            nested_types: Vec::new(),
            enum_types: Vec::new(),
            extensions: Vec::new(),
            extension_ranges: vec![100..200],
        };
        assert!(msg.is_extension_number(100));
        assert!(msg.is_extension_number(199));
        assert!(!msg.is_extension_number(200));
        assert!(!msg.is_extension_number(99));
    }
}
