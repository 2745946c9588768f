//! # Descriptor Pool
//!
//! The registry of known schema files. Files are inserted one at a time and
//! only after every file they depend on; an insertion either succeeds as a
//! whole or leaves the pool untouched.
//!
//! ## Identity
//!
//! Every message, enum, and extension is keyed by its [`FullName`], which
//! is unique across the pool. Descriptors are handed out as `Arc`s and never
//! change after insertion.
//!
//! ## Re-insertion
//!
//! Adding a file whose name is already registered is a no-op when it
//! describes the same schema, and a [`PoolError::FileConflict`] otherwise.
//! An omitted field label counts as `optional` in that comparison.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use protofab_core::{FileDescriptorProto, FullName};

use crate::builder::FileBuilder;
use crate::descriptor::{EnumDescriptor, ExtensionDescriptor, FileDescriptor, MessageDescriptor};
use crate::error::{PoolError, PoolResult};

/// A registered definition.
#[derive(Debug, Clone)]
pub(crate) enum Symbol {
    Message(Arc<MessageDescriptor>),
    Enum(Arc<EnumDescriptor>),
    Extension(Arc<ExtensionDescriptor>),
    /// An enum value, declared as a sibling of its enum.
    EnumValue(Arc<EnumDescriptor>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SymbolKind {
    Message,
    Enum,
    Extension,
    EnumValue,
}

impl Symbol {
    pub(crate) fn file(&self) -> &str {
        match self {
            Symbol::Message(m) => &m.file,
            Symbol::Enum(e) | Symbol::EnumValue(e) => &e.file,
            Symbol::Extension(x) => &x.file,
        }
    }

    pub(crate) fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Message(_) => SymbolKind::Message,
            Symbol::Enum(_) => SymbolKind::Enum,
            Symbol::Extension(_) => SymbolKind::Extension,
            Symbol::EnumValue(_) => SymbolKind::EnumValue,
        }
    }
}

/// Registry of schema files and the definitions they declare.
///
/// Cloning a pool is cheap relative to building it: descriptors are shared.
/// Callers that need all-or-nothing insertion of several files stage the
/// batch on a clone and swap it in on success.
#[derive(Debug, Clone, Default)]
pub struct DescriptorPool {
    files: BTreeMap<String, Arc<FileDescriptor>>,
    symbols: HashMap<FullName, Symbol>,
    extensions: BTreeMap<(FullName, u32), Arc<ExtensionDescriptor>>,
}

impl DescriptorPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file.
    ///
    /// # Errors
    ///
    /// - [`PoolError::MissingDependency`] if a listed dependency is not
    ///   registered.
    /// - [`PoolError::FileConflict`] if a different file is registered under
    ///   the same name.
    /// - [`PoolError::DuplicateSymbol`], [`PoolError::UnresolvedType`], and
    ///   the other definition-level errors when the file does not resolve
    ///   cleanly against the registry.
    pub fn add(&mut self, proto: FileDescriptorProto) -> PoolResult<Arc<FileDescriptor>> {
        if let Some(existing) = self.files.get(&proto.name) {
            if existing.proto.same_schema(&proto) {
                tracing::debug!(file = %proto.name, "file already registered");
                return Ok(Arc::clone(existing));
            }
            return Err(PoolError::FileConflict { file: proto.name });
        }

        for dependency in &proto.dependency {
            if !self.files.contains_key(dependency) {
                return Err(PoolError::MissingDependency {
                    file: proto.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        let built = FileBuilder::new(self, &proto)?.build()?;

        for (name, symbol) in built.symbols {
            self.symbols.insert(name, symbol);
        }
        for extension in built.extensions {
            self.extensions.insert(
                (extension.containing_type.clone(), extension.number),
                extension,
            );
        }
        self.files
            .insert(built.file.name.clone(), Arc::clone(&built.file));

        tracing::debug!(
            file = %built.file.name,
            messages = built.file.message_types.len(),
            extensions = built.file.extensions.len(),
            "registered file"
        );
        Ok(built.file)
    }

    /// Whether a file with this name is registered.
    pub fn contains_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Number of registered files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Registered files, ordered by name.
    pub fn files(&self) -> impl Iterator<Item = &Arc<FileDescriptor>> {
        self.files.values()
    }

    pub fn find_file_by_name(&self, name: &str) -> PoolResult<Arc<FileDescriptor>> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("file", name))
    }

    /// The file that declares the message, enum, or extension `symbol`.
    pub fn find_file_containing_symbol(&self, symbol: &str) -> PoolResult<Arc<FileDescriptor>> {
        let file = parse(symbol)
            .and_then(|name| self.symbols.get(&name))
            .map(|s| s.file().to_string())
            .ok_or_else(|| not_found("symbol", symbol))?;
        self.find_file_by_name(&file)
    }

    /// Look up a message by full name (a leading `.` is accepted).
    pub fn find_message_type_by_name(&self, name: &str) -> PoolResult<Arc<MessageDescriptor>> {
        parse(name)
            .and_then(|n| self.message(&n).cloned())
            .ok_or_else(|| not_found("message", name))
    }

    pub fn find_enum_type_by_name(&self, name: &str) -> PoolResult<Arc<EnumDescriptor>> {
        match parse(name).and_then(|n| self.symbols.get(&n)) {
            Some(Symbol::Enum(e)) => Ok(Arc::clone(e)),
            _ => Err(not_found("enum", name)),
        }
    }

    pub fn find_extension_by_name(&self, name: &str) -> PoolResult<Arc<ExtensionDescriptor>> {
        match parse(name).and_then(|n| self.symbols.get(&n)) {
            Some(Symbol::Extension(x)) => Ok(Arc::clone(x)),
            _ => Err(not_found("extension", name)),
        }
    }

    /// The extension of `containing_type` registered at `number`.
    pub fn find_extension_by_number(
        &self,
        containing_type: &str,
        number: u32,
    ) -> PoolResult<Arc<ExtensionDescriptor>> {
        parse(containing_type)
            .and_then(|n| self.extension_by_number(&n, number).cloned())
            .ok_or_else(|| not_found("extension", &format!("{containing_type}({number})")))
    }

    /// Every registered extension of `containing_type`, ordered by number.
    pub fn find_all_extensions(&self, containing_type: &str) -> Vec<Arc<ExtensionDescriptor>> {
        let Some(name) = parse(containing_type) else {
            return Vec::new();
        };
        self.extensions
            .range((name.clone(), 0)..=(name, u32::MAX))
            .map(|(_, x)| Arc::clone(x))
            .collect()
    }

    /// Typed message lookup used by the factory and the builder.
    pub fn message(&self, name: &FullName) -> Option<&Arc<MessageDescriptor>> {
        match self.symbols.get(name) {
            Some(Symbol::Message(m)) => Some(m),
            _ => None,
        }
    }

    pub(crate) fn symbol(&self, name: &FullName) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub(crate) fn extension_by_number(
        &self,
        containing_type: &FullName,
        number: u32,
    ) -> Option<&Arc<ExtensionDescriptor>> {
        self.extensions.get(&(containing_type.clone(), number))
    }

    /// The named files plus everything they transitively depend on.
    pub(crate) fn dependency_closure<'a>(&'a self, roots: &'a [String]) -> HashSet<&'a str> {
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = roots.iter().map(String::as_str).collect();
        while let Some(name) = stack.pop() {
            if !seen.insert(name) {
                continue;
            }
            if let Some(file) = self.files.get(name) {
                stack.extend(file.dependencies.iter().map(String::as_str));
            }
        }
        seen
    }
}

fn parse(name: &str) -> Option<FullName> {
    FullName::new(name).ok()
}

fn not_found(kind: &'static str, name: &str) -> PoolError {
    PoolError::NotFound {
        kind,
        name: name.to_string(),
    }
}
