//! # protofab-factory — Message Type Factory
//!
//! Produces runtime message types from registered schema descriptors and
//! wires extensions to the types they extend.
//!
//! ## Components
//!
//! - [`resolver`] — inserts a batch of raw files into a registry in
//!   dependency order, whatever order they were supplied in.
//! - [`MessageFactory`] — cached, recursion-safe construction of
//!   [`MessageType`]s; one type per descriptor per factory.
//! - [`MessageType::register_extension`] — idempotent, conflict-detecting
//!   extension registration.
//! - [`MessageFactory::load_files`] / [`get_messages`] — the batch entry
//!   points.
//! - [`DynamicMessage`] — the message representation every type produces.
//!
//! ```
//! use protofab_core::{DescriptorProto, FieldDescriptorProto, FieldType, FileDescriptorProto};
//! use protofab_factory::{MessageFactory, Value};
//!
//! let file = FileDescriptorProto::new("tree.proto")
//!     .with_package("acme")
//!     .with_message(
//!         DescriptorProto::new("Node")
//!             .with_field(FieldDescriptorProto::scalar("label", 1, FieldType::String))
//!             .with_field(FieldDescriptorProto::message("children", 2, "Node").repeated()),
//!     );
//!
//! let mut factory = MessageFactory::new();
//! let types = factory.load_files(vec![file])?;
//! let node = types.values().next().expect("one message");
//!
//! let mut root = node.new_message();
//! root.set_field_by_name("label", Value::String("root".into()))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Concurrency
//!
//! A factory is single-threaded: every operation takes `&mut self` and no
//! locks guard the cache or the registry. Built [`MessageType`]s are
//! `Send + Sync` and may be shared freely.

pub mod dynamic;
pub mod error;
pub mod factory;
pub mod message_type;
pub mod resolver;

pub use dynamic::{DynamicMessage, Value};
pub use error::{FactoryError, FactoryResult, MessageError, MessageResult};
pub use factory::{get_messages, MessageFactory, MessageMap};
pub use message_type::{FactoryId, MessageType};
