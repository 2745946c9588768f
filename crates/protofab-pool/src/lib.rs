//! # protofab-pool — Descriptor Registry
//!
//! Stores schema files and resolves names to descriptors. The registry is
//! the trust boundary for schema correctness: a file only enters the pool if
//! its dependencies are registered, every type reference resolves, and none
//! of its definitions collide with existing ones. Downstream crates may
//! therefore assume that any descriptor handed out by the pool is
//! internally consistent.
//!
//! ## Modules
//!
//! - [`descriptor`] — resolved, immutable descriptor types.
//! - [`pool`] — the [`DescriptorPool`] itself.
//! - `builder` — per-file resolution (internal).
//!
//! ## Crate Policy
//!
//! - Depends only on `protofab-core` internally.
//! - No locking: a pool is mutated through `&mut self` only.

mod builder;
pub mod descriptor;
pub mod error;
pub mod pool;

pub use descriptor::{
    EnumDescriptor, EnumValueDescriptor, ExtensionDescriptor, FieldDescriptor, FieldKind,
    FileDescriptor, MessageDescriptor,
};
pub use error::{PoolError, PoolResult};
pub use pool::DescriptorPool;
