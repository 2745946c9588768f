//! # protofab-core — Foundational Schema Types
//!
//! This crate is the leaf of the protofab workspace. It defines the raw,
//! unresolved schema descriptors that callers hand to the registry, the
//! [`FullName`] newtype used to key every resolved definition, and the
//! loaders that read descriptor sets from JSON or YAML documents.
//!
//! ## Key Design Principles
//!
//! 1. **Raw descriptors are plain data.** [`FileDescriptorProto`] and friends
//!    carry names exactly as written (relative or fully qualified). Nothing in
//!    this crate resolves references; that is the registry's job.
//!
//! 2. **`FullName` newtype.** Fully-qualified names are validated once at
//!    construction and stored without a leading dot. No bare strings as
//!    registry keys.
//!
//! 3. **No byte parsing.** Descriptor sets are read from serde documents.
//!    Protobuf binary and `.proto` text inputs are out of scope.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `protofab-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod name;
pub mod proto;
pub mod source;

pub use error::{DescriptorError, DescriptorResult};
pub use name::FullName;
pub use proto::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, ExtensionRange,
    FieldDescriptorProto, FieldType, FileDescriptorProto, FileDescriptorSet, Label,
};
