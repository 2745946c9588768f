//! # Message Types
//!
//! A [`MessageType`] is the constructible runtime type bound to exactly one
//! [`MessageDescriptor`]. There is no per-message compiled code: every type
//! produces the same generic [`DynamicMessage`] representation, parameterized
//! by its descriptor and by the extensions registered against it.
//!
//! ## Identity
//!
//! `MessageType` is a cheap handle (`Arc` inside). Two handles denote the
//! same type iff [`MessageType::ptr_eq`] holds; the factory guarantees one
//! type per descriptor, so handles obtained for the same descriptor from the
//! same factory always compare equal this way.
//!
//! ## Extension Registration
//!
//! Registration is keyed by field number. Re-registering an identical
//! definition is a no-op; a different definition at an occupied number is a
//! [`FactoryError::ExtensionConflict`].

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use protofab_core::FullName;
use protofab_pool::{ExtensionDescriptor, MessageDescriptor};

use crate::dynamic::DynamicMessage;
use crate::error::{FactoryError, FactoryResult};

/// Identifies the factory that produced a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactoryId(u64);

impl FactoryId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "factory#{}", self.0)
    }
}

/// A runtime message type bound to one descriptor.
#[derive(Clone)]
pub struct MessageType {
    inner: Arc<Inner>,
}

struct Inner {
    descriptor: Arc<MessageDescriptor>,
    factory: FactoryId,
    extensions: RwLock<BTreeMap<u32, Arc<ExtensionDescriptor>>>,
}

impl MessageType {
    pub(crate) fn new(descriptor: Arc<MessageDescriptor>, factory: FactoryId) -> Self {
        Self {
            inner: Arc::new(Inner {
                descriptor,
                factory,
                extensions: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// The descriptor this type is bound to.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.inner.descriptor
    }

    pub fn full_name(&self) -> &FullName {
        &self.inner.descriptor.full_name
    }

    pub fn name(&self) -> &str {
        &self.inner.descriptor.name
    }

    /// The factory that produced this type.
    pub fn factory_id(&self) -> FactoryId {
        self.inner.factory
    }

    /// Whether two handles refer to the same type instance.
    pub fn ptr_eq(a: &MessageType, b: &MessageType) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Construct an empty message of this type.
    pub fn new_message(&self) -> DynamicMessage {
        DynamicMessage::new(self.clone())
    }

    /// Attach an extension to this type.
    ///
    /// # Errors
    ///
    /// - [`FactoryError::Malformed`] if the extension extends a different
    ///   message, or its number is outside this message's extension ranges.
    /// - [`FactoryError::ExtensionConflict`] if a different extension is
    ///   already registered at the same number.
    pub fn register_extension(&self, extension: Arc<ExtensionDescriptor>) -> FactoryResult<()> {
        if extension.containing_type != *self.full_name() {
            return Err(FactoryError::Malformed {
                symbol: extension.full_name.to_string(),
                reason: format!(
                    "extends {}, cannot be registered on {}",
                    extension.containing_type,
                    self.full_name()
                ),
            });
        }
        if !self.inner.descriptor.is_extension_number(extension.number) {
            return Err(FactoryError::Malformed {
                symbol: extension.full_name.to_string(),
                reason: format!(
                    "{} is not an extension number of {}",
                    extension.number,
                    self.full_name()
                ),
            });
        }

        let mut extensions = self.inner.extensions.write();
        match extensions.entry(extension.number) {
            Entry::Occupied(existing) => {
                if **existing.get() == *extension {
                    return Ok(());
                }
                Err(FactoryError::ExtensionConflict {
                    message: self.full_name().to_string(),
                    number: extension.number,
                    existing: existing.get().full_name.to_string(),
                    conflicting: extension.full_name.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                tracing::debug!(
                    message = %self.full_name(),
                    extension = %extension.full_name,
                    number = extension.number,
                    "registered extension"
                );
                slot.insert(extension);
                Ok(())
            }
        }
    }

    pub fn find_extension_by_number(&self, number: u32) -> Option<Arc<ExtensionDescriptor>> {
        self.inner.extensions.read().get(&number).cloned()
    }

    /// Look up a registered extension by full name (a leading `.` is accepted).
    pub fn find_extension_by_name(&self, name: &str) -> Option<Arc<ExtensionDescriptor>> {
        let name = name.strip_prefix('.').unwrap_or(name);
        self.inner
            .extensions
            .read()
            .values()
            .find(|x| x.full_name.as_str() == name)
            .cloned()
    }

    /// Registered extensions, ordered by number.
    pub fn extensions(&self) -> Vec<Arc<ExtensionDescriptor>> {
        self.inner.extensions.read().values().cloned().collect()
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageType")
            .field("full_name", &self.full_name().as_str())
            .field("factory", &self.inner.factory)
            .field("extensions", &self.inner.extensions.read().len())
            .finish()
    }
}
