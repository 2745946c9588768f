//! # Dynamic Messages
//!
//! The single message representation shared by every [`MessageType`]: a map
//! from field number to [`Value`], checked against the bound descriptor on
//! every write. Extension values are stored separately and accepted only for
//! extensions registered on the message's type.
//!
//! Wire encoding is not implemented here.

use std::collections::BTreeMap;

use protofab_pool::{FieldKind, MessageDescriptor};

use crate::error::{MessageError, MessageResult};
use crate::message_type::MessageType;

/// A field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// The numeric value of an enum.
    EnumNumber(i32),
    Message(DynamicMessage),
    /// Values of a repeated field.
    List(Vec<Value>),
}

impl Value {
    fn kind_name(&self) -> String {
        match self {
            Value::Bool(_) => "bool".into(),
            Value::I32(_) => "i32".into(),
            Value::I64(_) => "i64".into(),
            Value::U32(_) => "u32".into(),
            Value::U64(_) => "u64".into(),
            Value::F32(_) => "f32".into(),
            Value::F64(_) => "f64".into(),
            Value::String(_) => "string".into(),
            Value::Bytes(_) => "bytes".into(),
            Value::EnumNumber(_) => "enum".into(),
            Value::Message(m) => m.message_type().full_name().to_string(),
            Value::List(_) => "list".into(),
        }
    }

    fn fits(&self, kind: &FieldKind) -> bool {
        match (kind, self) {
            (FieldKind::Double, Value::F64(_))
            | (FieldKind::Float, Value::F32(_))
            | (FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64, Value::I64(_))
            | (FieldKind::Uint64 | FieldKind::Fixed64, Value::U64(_))
            | (FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32, Value::I32(_))
            | (FieldKind::Uint32 | FieldKind::Fixed32, Value::U32(_))
            | (FieldKind::Bool, Value::Bool(_))
            | (FieldKind::String, Value::String(_))
            | (FieldKind::Bytes, Value::Bytes(_))
            | (FieldKind::Enum(_), Value::EnumNumber(_)) => true,
            (FieldKind::Message(name), Value::Message(m)) => m.message_type().full_name() == name,
            _ => false,
        }
    }
}

fn check(field: &str, kind: &FieldKind, repeated: bool, value: &Value) -> MessageResult<()> {
    let ok = match (repeated, value) {
        (true, Value::List(items)) => items.iter().all(|v| v.fits(kind)),
        (true, _) => false,
        (false, v) => v.fits(kind),
    };
    if ok {
        return Ok(());
    }
    Err(MessageError::TypeMismatch {
        field: field.to_string(),
        expected: if repeated {
            format!("list of {kind}")
        } else {
            kind.to_string()
        },
        actual: value.kind_name(),
    })
}

/// A message instance of some [`MessageType`].
#[derive(Debug, Clone)]
pub struct DynamicMessage {
    message_type: MessageType,
    fields: BTreeMap<u32, Value>,
    extensions: BTreeMap<u32, Value>,
}

impl DynamicMessage {
    pub(crate) fn new(message_type: MessageType) -> Self {
        Self {
            message_type,
            fields: BTreeMap::new(),
            extensions: BTreeMap::new(),
        }
    }

    pub fn message_type(&self) -> &MessageType {
        &self.message_type
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        self.message_type.descriptor()
    }

    /// Set a field by name, checking the value against the field's kind.
    pub fn set_field_by_name(&mut self, name: &str, value: Value) -> MessageResult<()> {
        let field = self
            .descriptor()
            .field_by_name(name)
            .ok_or_else(|| self.unknown_field(name))?;
        check(&field.name, &field.kind, field.is_repeated(), &value)?;
        let number = field.number;
        self.fields.insert(number, value);
        Ok(())
    }

    /// Set a field by number, checking the value against the field's kind.
    pub fn set_field(&mut self, number: u32, value: Value) -> MessageResult<()> {
        let field = self
            .descriptor()
            .field_by_number(number)
            .ok_or_else(|| self.unknown_field(&number.to_string()))?;
        check(&field.name, &field.kind, field.is_repeated(), &value)?;
        self.fields.insert(number, value);
        Ok(())
    }

    pub fn get_field_by_name(&self, name: &str) -> Option<&Value> {
        let number = self.descriptor().field_by_name(name)?.number;
        self.fields.get(&number)
    }

    pub fn get_field(&self, number: u32) -> Option<&Value> {
        self.fields.get(&number)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get_field_by_name(name).is_some()
    }

    /// Remove a field value, returning it if it was set.
    pub fn clear_field(&mut self, name: &str) -> Option<Value> {
        let number = self.descriptor().field_by_name(name)?.number;
        self.fields.remove(&number)
    }

    /// Set fields, ordered by number.
    pub fn fields(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    /// Set an extension value by the extension's full name.
    ///
    /// # Errors
    ///
    /// [`MessageError::UnknownExtension`] unless the extension is registered
    /// on this message's type.
    pub fn set_extension(&mut self, name: &str, value: Value) -> MessageResult<()> {
        let extension = self.message_type.find_extension_by_name(name).ok_or_else(|| {
            MessageError::UnknownExtension {
                message: self.message_type.full_name().to_string(),
                extension: name.to_string(),
            }
        })?;
        check(
            extension.full_name.as_str(),
            &extension.kind,
            extension.is_repeated(),
            &value,
        )?;
        self.extensions.insert(extension.number, value);
        Ok(())
    }

    pub fn get_extension(&self, name: &str) -> Option<&Value> {
        let number = self.message_type.find_extension_by_name(name)?.number;
        self.extensions.get(&number)
    }

    /// An extension value by field number.
    pub fn get_extension_by_number(&self, number: u32) -> Option<&Value> {
        self.extensions.get(&number)
    }

    fn unknown_field(&self, field: &str) -> MessageError {
        MessageError::UnknownField {
            message: self.message_type.full_name().to_string(),
            field: field.to_string(),
        }
    }
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        self.message_type.full_name() == other.message_type.full_name()
            && self.fields == other.fields
            && self.extensions == other.extensions
    }
}
