//! # File Resolution
//!
//! Turns a raw [`FileDescriptorProto`] into resolved descriptors against
//! the current registry contents. Nothing is written to the registry here;
//! the builder returns everything the file would add and the pool commits it
//! only if the whole file checks out.
//!
//! ## Passes
//!
//! 1. **Declare.** Compute the full name of every message, enum, enum
//!    value, and extension in the file and reject collisions, locally and
//!    against the registry. Enum values live in the enum's enclosing scope,
//!    so two enums in one package cannot share a value name. Forward
//!    references within the file resolve after this pass.
//! 2. **Build.** Resolve field and extension type references, bottom-up.
//!    Extension ranges of a message must not overlap, and no regular field
//!    may take a number inside one.
//! 3. **Check extensions.** Extension numbers must sit inside the extendee's
//!    extension ranges and must not collide with an extension already
//!    registered for the same extendee.
//!
//! ## Name Resolution
//!
//! A reference starting with `.` is fully qualified. Any other reference is
//! tried in the declaring scope first, then in each enclosing scope out to
//! the root. Only definitions from this file and from files reachable
//! through its dependency list are visible.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

use protofab_core::{
    DescriptorError, DescriptorProto, EnumDescriptorProto, ExtensionRange, FieldDescriptorProto,
    FieldType, FileDescriptorProto, FullName,
};

use crate::descriptor::{
    EnumDescriptor, EnumValueDescriptor, ExtensionDescriptor, FieldDescriptor, FieldKind,
    FileDescriptor, MessageDescriptor,
};
use crate::error::{PoolError, PoolResult};
use crate::pool::{DescriptorPool, Symbol, SymbolKind};

/// Largest valid field number (2^29 - 1).
pub(crate) const MAX_FIELD_NUMBER: i32 = 536_870_911;

/// Field numbers reserved for the protobuf implementation.
const RESERVED_FIELD_NUMBERS: std::ops::RangeInclusive<i32> = 19_000..=19_999;

/// Everything a single file contributes to the registry.
pub(crate) struct BuiltFile {
    pub(crate) file: Arc<FileDescriptor>,
    pub(crate) symbols: Vec<(FullName, Symbol)>,
    pub(crate) extensions: Vec<Arc<ExtensionDescriptor>>,
}

pub(crate) struct FileBuilder<'a> {
    pool: &'a DescriptorPool,
    proto: &'a FileDescriptorProto,
    package: Option<FullName>,
    visible: HashSet<&'a str>,
    declared: HashMap<FullName, SymbolKind>,
    symbols: Vec<(FullName, Symbol)>,
    extensions: Vec<Arc<ExtensionDescriptor>>,
}

impl<'a> FileBuilder<'a> {
    pub(crate) fn new(pool: &'a DescriptorPool, proto: &'a FileDescriptorProto) -> PoolResult<Self> {
        if proto.name.is_empty() {
            return Err(DescriptorError::InvalidName {
                name: String::new(),
                reason: "file name is empty".to_string(),
            }
            .into());
        }

        let package = match proto.package.as_deref() {
            Some(pkg) if !pkg.is_empty() => Some(FullName::new(pkg)?),
            _ => None,
        };

        Ok(Self {
            pool,
            proto,
            package,
            visible: pool.dependency_closure(&proto.dependency),
            declared: HashMap::new(),
            symbols: Vec::new(),
            extensions: Vec::new(),
        })
    }

    pub(crate) fn build(mut self) -> PoolResult<BuiltFile> {
        let proto = self.proto;
        let package = self.package.clone();

        // Pass 1: declare.
        for message in &proto.message_type {
            self.declare_message(package.as_ref(), message)?;
        }
        for enum_type in &proto.enum_type {
            self.declare_enum(package.as_ref(), enum_type)?;
        }
        for extension in &proto.extension {
            self.declare(
                FullName::join(package.as_ref(), &extension.name)?,
                SymbolKind::Extension,
            )?;
        }

        // Pass 2: build.
        let message_types = proto
            .message_type
            .iter()
            .map(|m| self.build_message(package.as_ref(), m))
            .collect::<PoolResult<Vec<_>>>()?;
        let enum_types = proto
            .enum_type
            .iter()
            .map(|e| self.build_enum(package.as_ref(), e))
            .collect::<PoolResult<Vec<_>>>()?;
        let extensions = proto
            .extension
            .iter()
            .map(|e| self.build_extension(None, e))
            .collect::<PoolResult<Vec<_>>>()?;

        // Pass 3: extension numbers.
        self.check_extensions()?;

        let file = Arc::new(FileDescriptor {
            name: proto.name.clone(),
            package,
            dependencies: proto.dependency.clone(),
            message_types,
            enum_types,
            extensions,
            proto: proto.clone(),
        });

        Ok(BuiltFile {
            file,
            symbols: self.symbols,
            extensions: self.extensions,
        })
    }

    fn declare_message(&mut self, scope: Option<&FullName>, proto: &DescriptorProto) -> PoolResult<()> {
        let full_name = FullName::join(scope, &proto.name)?;
        self.declare(full_name.clone(), SymbolKind::Message)?;
        for nested in &proto.nested_type {
            self.declare_message(Some(&full_name), nested)?;
        }
        for enum_type in &proto.enum_type {
            self.declare_enum(Some(&full_name), enum_type)?;
        }
        for extension in &proto.extension {
            self.declare(
                FullName::join(Some(&full_name), &extension.name)?,
                SymbolKind::Extension,
            )?;
        }
        Ok(())
    }

    /// Enum values are siblings of their enum, not children.
    fn declare_enum(&mut self, scope: Option<&FullName>, proto: &EnumDescriptorProto) -> PoolResult<()> {
        self.declare(FullName::join(scope, &proto.name)?, SymbolKind::Enum)?;
        for value in &proto.value {
            self.declare(FullName::join(scope, &value.name)?, SymbolKind::EnumValue)?;
        }
        Ok(())
    }

    fn declare(&mut self, name: FullName, kind: SymbolKind) -> PoolResult<()> {
        let existing_file = if self.declared.contains_key(&name) {
            Some(self.proto.name.clone())
        } else {
            self.pool.symbol(&name).map(|s| s.file().to_string())
        };
        if let Some(existing_file) = existing_file {
            return Err(PoolError::DuplicateSymbol {
                symbol: name.to_string(),
                file: self.proto.name.clone(),
                existing_file,
            });
        }
        self.declared.insert(name, kind);
        Ok(())
    }

    fn build_message(
        &mut self,
        scope: Option<&FullName>,
        proto: &DescriptorProto,
    ) -> PoolResult<Arc<MessageDescriptor>> {
        let full_name = FullName::join(scope, &proto.name)?;

        let nested_types = proto
            .nested_type
            .iter()
            .map(|n| self.build_message(Some(&full_name), n))
            .collect::<PoolResult<Vec<_>>>()?;
        let enum_types = proto
            .enum_type
            .iter()
            .map(|e| self.build_enum(Some(&full_name), e))
            .collect::<PoolResult<Vec<_>>>()?;

        let mut fields = Vec::with_capacity(proto.field.len());
        let mut numbers = HashSet::new();
        let mut names = HashSet::new();
        for field in &proto.field {
            let field = self.build_field(&full_name, field)?;
            if !numbers.insert(field.number) {
                return Err(PoolError::DuplicateFieldNumber {
                    message: full_name.to_string(),
                    number: field.number,
                });
            }
            if !names.insert(field.name.clone()) {
                return Err(PoolError::DuplicateFieldName {
                    message: full_name.to_string(),
                    name: field.name,
                });
            }
            fields.push(field);
        }

        let extension_ranges = proto
            .extension_range
            .iter()
            .map(|r| self.extension_range(&full_name, r))
            .collect::<PoolResult<Vec<_>>>()?;
        self.check_numbering(&full_name, &fields, &extension_ranges)?;
        let extensions = proto
            .extension
            .iter()
            .map(|e| self.build_extension(Some(&full_name), e))
            .collect::<PoolResult<Vec<_>>>()?;

        let message = Arc::new(MessageDescriptor {
            name: proto.name.clone(),
            full_name: full_name.clone(),
            file: self.proto.name.clone(),
            containing_type: if self.is_message_scope(scope) {
                scope.cloned()
            } else {
                None
            },
            fields,
            nested_types,
            enum_types,
            extensions,
            extension_ranges,
        });
        self.symbols.push((full_name, Symbol::Message(Arc::clone(&message))));
        Ok(message)
    }

    /// A number is either a field or an extension slot, never both.
    fn check_numbering(
        &self,
        message: &FullName,
        fields: &[FieldDescriptor],
        extension_ranges: &[Range<u32>],
    ) -> PoolResult<()> {
        let mut sorted: Vec<&Range<u32>> = extension_ranges.iter().collect();
        sorted.sort_by_key(|r| r.start);
        for pair in sorted.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(PoolError::OverlappingExtensionRanges {
                    message: message.to_string(),
                    file: self.proto.name.clone(),
                    first: pair[0].clone(),
                    second: pair[1].clone(),
                });
            }
        }

        for field in fields {
            if let Some(range) = extension_ranges.iter().find(|r| r.contains(&field.number)) {
                return Err(PoolError::FieldInExtensionRange {
                    message: message.to_string(),
                    field: field.name.clone(),
                    number: field.number,
                    range: range.clone(),
                });
            }
        }
        Ok(())
    }

    fn is_message_scope(&self, scope: Option<&FullName>) -> bool {
        scope.is_some_and(|s| self.declared.get(s) == Some(&SymbolKind::Message))
    }

    fn build_field(&self, message: &FullName, proto: &FieldDescriptorProto) -> PoolResult<FieldDescriptor> {
        let full_name = FullName::join(Some(message), &proto.name)?;
        let number = self.field_number(&full_name, proto.number)?;
        let kind = self.resolve_kind(Some(message), &full_name, proto)?;
        Ok(FieldDescriptor {
            name: proto.name.clone(),
            full_name,
            number,
            label: proto.label.unwrap_or_default(),
            kind,
        })
    }

    fn build_enum(
        &mut self,
        scope: Option<&FullName>,
        proto: &EnumDescriptorProto,
    ) -> PoolResult<Arc<EnumDescriptor>> {
        let full_name = FullName::join(scope, &proto.name)?;
        let enum_type = Arc::new(EnumDescriptor {
            name: proto.name.clone(),
            full_name: full_name.clone(),
            file: self.proto.name.clone(),
            values: proto
                .value
                .iter()
                .map(|v| EnumValueDescriptor {
                    name: v.name.clone(),
                    number: v.number,
                })
                .collect(),
        });
        for value in &proto.value {
            self.symbols.push((
                FullName::join(scope, &value.name)?,
                Symbol::EnumValue(Arc::clone(&enum_type)),
            ));
        }
        self.symbols.push((full_name, Symbol::Enum(Arc::clone(&enum_type))));
        Ok(enum_type)
    }

    /// `scope` is the declaring message, or `None` at file scope.
    fn build_extension(
        &mut self,
        scope: Option<&FullName>,
        proto: &FieldDescriptorProto,
    ) -> PoolResult<Arc<ExtensionDescriptor>> {
        let lookup_scope = scope.or(self.package.as_ref()).cloned();
        let full_name = FullName::join(lookup_scope.as_ref(), &proto.name)?;
        let number = self.field_number(&full_name, proto.number)?;

        let extendee = proto
            .extendee
            .as_deref()
            .ok_or_else(|| PoolError::MissingExtendee {
                extension: full_name.to_string(),
                file: self.proto.name.clone(),
            })?;
        let containing_type = match self.resolve(lookup_scope.as_ref(), extendee) {
            Some((name, SymbolKind::Message)) => name,
            Some((name, _)) => {
                return Err(PoolError::TypeMismatch {
                    symbol: full_name.to_string(),
                    file: self.proto.name.clone(),
                    type_name: name.to_string(),
                    expected: "a message",
                })
            }
            None => {
                return Err(PoolError::UnresolvedType {
                    symbol: full_name.to_string(),
                    file: self.proto.name.clone(),
                    type_name: extendee.to_string(),
                })
            }
        };
        let kind = self.resolve_kind(lookup_scope.as_ref(), &full_name, proto)?;

        let extension = Arc::new(ExtensionDescriptor {
            name: proto.name.clone(),
            full_name: full_name.clone(),
            number,
            label: proto.label.unwrap_or_default(),
            kind,
            containing_type,
            scope: scope.cloned(),
            file: self.proto.name.clone(),
        });
        self.symbols.push((full_name, Symbol::Extension(Arc::clone(&extension))));
        self.extensions.push(Arc::clone(&extension));
        Ok(extension)
    }

    fn check_extensions(&self) -> PoolResult<()> {
        let mut claimed: HashMap<(&FullName, u32), &FullName> = HashMap::new();
        for extension in &self.extensions {
            let containing = self.message(&extension.containing_type).ok_or_else(|| {
                PoolError::UnresolvedType {
                    symbol: extension.full_name.to_string(),
                    file: self.proto.name.clone(),
                    type_name: extension.containing_type.to_string(),
                }
            })?;
            if !containing.is_extension_number(extension.number) {
                return Err(PoolError::ExtensionOutOfRange {
                    extension: extension.full_name.to_string(),
                    containing_type: extension.containing_type.to_string(),
                    number: extension.number,
                });
            }

            let existing = self
                .pool
                .extension_by_number(&extension.containing_type, extension.number)
                .map(|e| &e.full_name)
                .or_else(|| {
                    claimed
                        .get(&(&extension.containing_type, extension.number))
                        .copied()
                });
            if let Some(existing) = existing {
                return Err(PoolError::ExtensionNumberConflict {
                    extension: extension.full_name.to_string(),
                    containing_type: extension.containing_type.to_string(),
                    number: extension.number,
                    existing: existing.to_string(),
                });
            }
            claimed.insert(
                (&extension.containing_type, extension.number),
                &extension.full_name,
            );
        }
        Ok(())
    }

    /// A message built in this file, or a visible registered one.
    fn message(&self, name: &FullName) -> Option<&Arc<MessageDescriptor>> {
        let local = self.symbols.iter().find_map(|(n, s)| match s {
            Symbol::Message(m) if n == name => Some(m),
            _ => None,
        });
        local.or_else(|| {
            self.pool
                .message(name)
                .filter(|m| self.visible.contains(m.file.as_str()))
        })
    }

    fn resolve_kind(
        &self,
        scope: Option<&FullName>,
        symbol: &FullName,
        proto: &FieldDescriptorProto,
    ) -> PoolResult<FieldKind> {
        if let Some(kind) = proto.r#type.and_then(scalar_kind) {
            return Ok(kind);
        }

        let type_name = proto
            .type_name
            .as_deref()
            .ok_or_else(|| PoolError::MissingFieldType {
                symbol: symbol.to_string(),
                file: self.proto.name.clone(),
            })?;
        let (resolved, kind) =
            self.resolve(scope, type_name)
                .ok_or_else(|| PoolError::UnresolvedType {
                    symbol: symbol.to_string(),
                    file: self.proto.name.clone(),
                    type_name: type_name.to_string(),
                })?;

        match (proto.r#type, kind) {
            (Some(FieldType::Message) | None, SymbolKind::Message) => Ok(FieldKind::Message(resolved)),
            (Some(FieldType::Enum) | None, SymbolKind::Enum) => Ok(FieldKind::Enum(resolved)),
            (declared, _) => Err(PoolError::TypeMismatch {
                symbol: symbol.to_string(),
                file: self.proto.name.clone(),
                type_name: resolved.to_string(),
                expected: match declared {
                    Some(FieldType::Enum) => "an enum",
                    Some(_) => "a message",
                    None => "a message or enum",
                },
            }),
        }
    }

    fn resolve(&self, scope: Option<&FullName>, type_name: &str) -> Option<(FullName, SymbolKind)> {
        if let Some(absolute) = type_name.strip_prefix('.') {
            let name = FullName::new(absolute).ok()?;
            return self.lookup(&name).map(|kind| (name, kind));
        }

        let mut scope = scope.cloned();
        loop {
            let candidate = match &scope {
                Some(s) => format!("{s}.{type_name}"),
                None => type_name.to_string(),
            };
            if let Ok(candidate) = FullName::new(&candidate) {
                if let Some(kind) = self.lookup(&candidate) {
                    return Some((candidate, kind));
                }
            }
            match scope {
                Some(s) => scope = s.parent(),
                None => return None,
            }
        }
    }

    fn lookup(&self, name: &FullName) -> Option<SymbolKind> {
        if let Some(kind) = self.declared.get(name) {
            return Some(*kind);
        }
        self.pool
            .symbol(name)
            .filter(|s| self.visible.contains(s.file()))
            .map(Symbol::kind)
    }

    fn field_number(&self, symbol: &FullName, number: i32) -> PoolResult<u32> {
        if number < 1 || number > MAX_FIELD_NUMBER || RESERVED_FIELD_NUMBERS.contains(&number) {
            return Err(PoolError::InvalidFieldNumber {
                symbol: symbol.to_string(),
                file: self.proto.name.clone(),
                number,
            });
        }
        Ok(number.unsigned_abs())
    }

    fn extension_range(&self, message: &FullName, range: &ExtensionRange) -> PoolResult<Range<u32>> {
        if range.start < 1 || range.end <= range.start || range.end > MAX_FIELD_NUMBER + 1 {
            return Err(PoolError::InvalidExtensionRange {
                message: message.to_string(),
                file: self.proto.name.clone(),
                start: range.start,
                end: range.end,
            });
        }
        Ok(range.start.unsigned_abs()..range.end.unsigned_abs())
    }
}

fn scalar_kind(ty: FieldType) -> Option<FieldKind> {
    Some(match ty {
        FieldType::Double => FieldKind::Double,
        FieldType::Float => FieldKind::Float,
        FieldType::Int64 => FieldKind::Int64,
        FieldType::Uint64 => FieldKind::Uint64,
        FieldType::Int32 => FieldKind::Int32,
        FieldType::Fixed64 => FieldKind::Fixed64,
        FieldType::Fixed32 => FieldKind::Fixed32,
        FieldType::Bool => FieldKind::Bool,
        FieldType::String => FieldKind::String,
        FieldType::Bytes => FieldKind::Bytes,
        FieldType::Uint32 => FieldKind::Uint32,
        FieldType::Sfixed32 => FieldKind::Sfixed32,
        FieldType::Sfixed64 => FieldKind::Sfixed64,
        FieldType::Sint32 => FieldKind::Sint32,
        FieldType::Sint64 => FieldKind::Sint64,
        FieldType::Message | FieldType::Enum => return None,
    })
}
