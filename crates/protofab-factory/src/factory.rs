//! # Message Type Factory
//!
//! Turns descriptors into [`MessageType`]s, caching one type per descriptor
//! for the lifetime of the factory.
//!
//! ## Construction
//!
//! Building a type materializes everything it needs, recursively: the types
//! of message-valued fields, nested message types, and for each extension
//! declared in the message's namespace both the extended type (on which the
//! extension is registered) and a message-typed value.
//!
//! ## Recursive Schemas
//!
//! The factory tracks the descriptors it is currently building. A request
//! for one of them while it is still under construction (a message with a
//! field of its own type, or two messages referring to each other) returns
//! the in-progress handle instead of starting a second build. Types hold no
//! references to their field types, so handing out that handle internally
//! never exposes an unfinished type: the public entry points return only
//! after the outermost build has completed, and `&mut self` rules out any
//! other caller observing the factory mid-build.
//!
//! ## Atomic Batches
//!
//! [`MessageFactory::load_files`] registers a batch on a copy of the
//! registry and swaps it in only once every file has been accepted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use protofab_core::{FileDescriptorProto, FullName};
use protofab_pool::{DescriptorPool, ExtensionDescriptor, MessageDescriptor};

use crate::error::{FactoryError, FactoryResult};
use crate::message_type::{FactoryId, MessageType};
use crate::resolver;

/// Message types keyed by fully-qualified name.
pub type MessageMap = BTreeMap<FullName, MessageType>;

/// Builds and caches message types for the descriptors in its registry.
#[derive(Debug)]
pub struct MessageFactory {
    id: FactoryId,
    pool: DescriptorPool,
    cache: HashMap<FullName, MessageType>,
    building: HashMap<FullName, MessageType>,
}

impl Default for MessageFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageFactory {
    /// A factory over an empty registry.
    pub fn new() -> Self {
        Self::with_pool(DescriptorPool::new())
    }

    /// A factory over an existing registry.
    pub fn with_pool(pool: DescriptorPool) -> Self {
        Self {
            id: FactoryId::next(),
            pool,
            cache: HashMap::new(),
            building: HashMap::new(),
        }
    }

    pub fn id(&self) -> FactoryId {
        self.id
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Number of cached types.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// The cached type for `name`, without building anything.
    pub fn cached(&self, name: &FullName) -> Option<&MessageType> {
        self.cache.get(name)
    }

    /// The type for `descriptor`, built on first request and cached.
    ///
    /// # Errors
    ///
    /// [`FactoryError::Malformed`] if the descriptor is not the one
    /// registered under its name, or references a message the registry does
    /// not hold. Extension conflicts met while building propagate.
    pub fn get_prototype(&mut self, descriptor: &Arc<MessageDescriptor>) -> FactoryResult<MessageType> {
        self.check_registered(descriptor)?;
        if let Some(cached) = self.cache.get(&descriptor.full_name) {
            return Ok(cached.clone());
        }
        if let Some(in_progress) = self.building.get(&descriptor.full_name) {
            tracing::trace!(message = %descriptor.full_name, "forward reference to type under construction");
            return Ok(in_progress.clone());
        }

        let message_type = self.create_prototype(descriptor)?;
        self.cache
            .insert(descriptor.full_name.clone(), message_type.clone());
        Ok(message_type)
    }

    /// Look up `name` in the registry and return its type.
    pub fn get_prototype_by_name(&mut self, name: &str) -> FactoryResult<MessageType> {
        let descriptor = self.pool.find_message_type_by_name(name)?;
        self.get_prototype(&descriptor)
    }

    /// Build a new type for `descriptor`, bypassing the cache.
    ///
    /// Referenced types are still obtained through [`get_prototype`] and
    /// therefore cached. Calling this for a descriptor that already has a
    /// cached type yields a second, distinct type; use [`get_prototype`]
    /// unless that is the intent. Such a second type carries the extensions
    /// of itself declared in its own namespace, but not those registered on
    /// the cached type from elsewhere.
    ///
    /// [`get_prototype`]: MessageFactory::get_prototype
    pub fn create_prototype(
        &mut self,
        descriptor: &Arc<MessageDescriptor>,
    ) -> FactoryResult<MessageType> {
        self.check_registered(descriptor)?;
        let message_type = MessageType::new(Arc::clone(descriptor), self.id);
        let name = descriptor.full_name.clone();

        let outer = self.building.insert(name.clone(), message_type.clone());
        let result = self.populate(descriptor);
        match outer {
            Some(outer) => {
                self.building.insert(name, outer);
            }
            None => {
                self.building.remove(&name);
            }
        }
        result?;

        for extension in &descriptor.extensions {
            if extension.containing_type == descriptor.full_name {
                message_type.register_extension(Arc::clone(extension))?;
            }
        }

        tracing::debug!(message = %descriptor.full_name, factory = %self.id, "created message type");
        Ok(message_type)
    }

    /// Types for every top-level message declared in the named registered
    /// files, with file-scope extensions registered on their hosts.
    ///
    /// # Errors
    ///
    /// [`PoolError::NotFound`](protofab_pool::PoolError::NotFound) for an
    /// unregistered file name, or any construction error.
    pub fn get_messages<S: AsRef<str>>(&mut self, files: &[S]) -> FactoryResult<MessageMap> {
        let mut result = MessageMap::new();
        for file_name in files {
            let file = self.pool.find_file_by_name(file_name.as_ref())?;
            for descriptor in &file.message_types {
                let message_type = self.get_prototype(descriptor)?;
                result.insert(descriptor.full_name.clone(), message_type);
            }
            for extension in &file.extensions {
                self.register(extension)?;
            }
        }
        tracing::info!(
            files = files.len(),
            messages = result.len(),
            cached = self.cache.len(),
            "resolved message types"
        );
        Ok(result)
    }

    /// Register raw files in dependency order, then resolve their messages.
    ///
    /// If any file is rejected the registry is left as it was and no
    /// mapping is returned.
    pub fn load_files(
        &mut self,
        protos: impl IntoIterator<Item = FileDescriptorProto>,
    ) -> FactoryResult<MessageMap> {
        let protos: Vec<FileDescriptorProto> = protos.into_iter().collect();
        let mut names: Vec<String> = Vec::with_capacity(protos.len());
        for proto in &protos {
            if !names.contains(&proto.name) {
                names.push(proto.name.clone());
            }
        }

        let mut staged = self.pool.clone();
        let order = resolver::add_files(&mut staged, protos)?;
        tracing::debug!(?order, "registered batch");
        self.pool = staged;

        self.get_messages(&names)
    }

    fn populate(&mut self, descriptor: &MessageDescriptor) -> FactoryResult<()> {
        for (field, type_name) in descriptor.message_fields() {
            let field_type = self.resolve_message(type_name, &field.full_name)?;
            self.get_prototype(&field_type)?;
        }
        for nested in &descriptor.nested_types {
            self.get_prototype(nested)?;
        }
        for extension in &descriptor.extensions {
            self.register(extension)?;
        }
        Ok(())
    }

    /// Register `extension` on its host type and materialize its value type.
    fn register(&mut self, extension: &Arc<ExtensionDescriptor>) -> FactoryResult<()> {
        let host = self.resolve_message(&extension.containing_type, &extension.full_name)?;
        self.get_prototype(&host)?
            .register_extension(Arc::clone(extension))?;
        if let Some(value_type) = extension.message_type() {
            let value = self.resolve_message(value_type, &extension.full_name)?;
            self.get_prototype(&value)?;
        }
        Ok(())
    }

    fn resolve_message(
        &self,
        name: &FullName,
        referrer: &FullName,
    ) -> FactoryResult<Arc<MessageDescriptor>> {
        self.pool
            .message(name)
            .cloned()
            .ok_or_else(|| FactoryError::Malformed {
                symbol: referrer.to_string(),
                reason: format!("references message {name}, which is not registered"),
            })
    }

    fn check_registered(&self, descriptor: &Arc<MessageDescriptor>) -> FactoryResult<()> {
        match self.pool.message(&descriptor.full_name) {
            Some(registered) if Arc::ptr_eq(registered, descriptor) || **registered == **descriptor => {
                Ok(())
            }
            _ => Err(FactoryError::Malformed {
                symbol: descriptor.full_name.to_string(),
                reason: "descriptor is not registered in this factory's pool".to_string(),
            }),
        }
    }
}

/// Build message types for a batch of raw files with a fresh factory.
///
/// Convenience for one-shot use; keep a [`MessageFactory`] around when
/// types from several batches must share identity.
pub fn get_messages(
    protos: impl IntoIterator<Item = FileDescriptorProto>,
) -> FactoryResult<MessageMap> {
    MessageFactory::new().load_files(protos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protofab_core::{DescriptorProto, FieldDescriptorProto, FieldType};

    fn tree_file() -> FileDescriptorProto {
        FileDescriptorProto::new("tree.proto")
            .with_package("acme")
            .with_message(
                DescriptorProto::new("Node")
                    .with_field(FieldDescriptorProto::scalar("label", 1, FieldType::String))
                    .with_field(FieldDescriptorProto::message("children", 2, "Node").repeated())
                    .with_nested(DescriptorProto::new("Meta")),
            )
    }

    #[test]
    fn get_prototype_is_idempotent() {
        let mut factory = MessageFactory::new();
        factory.load_files(vec![tree_file()]).unwrap();
        let node = factory.pool().find_message_type_by_name("acme.Node").unwrap();

        let a = factory.get_prototype(&node).unwrap();
        let b = factory.get_prototype(&node).unwrap();
        assert!(MessageType::ptr_eq(&a, &b));
        assert_eq!(a.factory_id(), factory.id());
    }

    #[test]
    fn create_prototype_bypasses_cache() {
        let mut factory = MessageFactory::new();
        factory.load_files(vec![tree_file()]).unwrap();
        let node = factory.pool().find_message_type_by_name("acme.Node").unwrap();

        let cached = factory.get_prototype(&node).unwrap();
        let fresh = factory.create_prototype(&node).unwrap();
        assert!(!MessageType::ptr_eq(&cached, &fresh));
        assert!(MessageType::ptr_eq(&cached, &factory.get_prototype(&node).unwrap()));
    }

    #[test]
    fn uncached_type_keeps_its_own_extensions() {
        let file = FileDescriptorProto::new("open.proto").with_message(
            DescriptorProto::new("Open")
                .with_extension_range(50, 60)
                .with_extension(FieldDescriptorProto::scalar("tag", 50, FieldType::String).extending("Open")),
        );
        let mut factory = MessageFactory::new();
        factory.load_files(vec![file]).unwrap();
        let open = factory.pool().find_message_type_by_name("Open").unwrap();

        let cached = factory.get_prototype(&open).unwrap();
        let fresh = factory.create_prototype(&open).unwrap();
        assert!(!MessageType::ptr_eq(&cached, &fresh));
        assert!(cached.find_extension_by_number(50).is_some());
        assert!(fresh.find_extension_by_number(50).is_some());
    }

    #[test]
    fn nested_types_are_materialized() {
        let mut factory = MessageFactory::new();
        factory.load_files(vec![tree_file()]).unwrap();
        let meta = FullName::new("acme.Node.Meta").unwrap();
        assert!(factory.cached(&meta).is_some());
        assert_eq!(factory.cached_len(), 2);
    }

    #[test]
    fn building_set_is_empty_after_build() {
        let mut factory = MessageFactory::new();
        factory.load_files(vec![tree_file()]).unwrap();
        assert!(factory.building.is_empty());
    }

    #[test]
    fn foreign_descriptor_is_malformed() {
        let mut other = DescriptorPool::new();
        other
            .add(
                FileDescriptorProto::new("tree.proto")
                    .with_package("acme")
                    .with_message(DescriptorProto::new("Node")),
            )
            .unwrap();
        let foreign = other.find_message_type_by_name("acme.Node").unwrap();

        let mut factory = MessageFactory::new();
        factory.load_files(vec![tree_file()]).unwrap();
        assert!(matches!(
            factory.get_prototype(&foreign),
            Err(FactoryError::Malformed { .. })
        ));

        let mut empty = MessageFactory::new();
        assert!(matches!(
            empty.get_prototype(&foreign),
            Err(FactoryError::Malformed { .. })
        ));
    }

    #[test]
    fn failed_batch_leaves_registry_unchanged() {
        let mut factory = MessageFactory::new();
        let err = factory
            .load_files(vec![
                tree_file(),
                FileDescriptorProto::new("broken.proto").with_dependency("missing.proto"),
            ])
            .unwrap_err();
        assert!(matches!(err, FactoryError::Pool(_)));
        assert_eq!(factory.pool().file_count(), 0);
        assert_eq!(factory.cached_len(), 0);
    }

    #[test]
    fn get_prototype_by_name_reports_unknown() {
        let mut factory = MessageFactory::new();
        assert!(matches!(
            factory.get_prototype_by_name("acme.Missing"),
            Err(FactoryError::Pool(_))
        ));
    }
}
