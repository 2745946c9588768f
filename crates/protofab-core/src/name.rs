//! # Fully-Qualified Names
//!
//! Every message, enum, and extension in a registry is identified by a
//! dotted, fully-qualified name such as `acme.inventory.Item.Tag`. The
//! [`FullName`] newtype validates that shape once and is then used as the
//! registry key and the factory cache key.
//!
//! Names are stored without the leading `.` that raw descriptors use to mark
//! an absolute reference; [`FullName::new`] accepts either form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, DescriptorResult};

/// A validated, fully-qualified protobuf name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullName(String);

impl FullName {
    /// Parse a dotted name, accepting an optional leading `.`.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidName`] if the name is empty, has an
    /// empty segment, or contains a segment that is not an identifier.
    pub fn new(name: impl AsRef<str>) -> DescriptorResult<Self> {
        let raw = name.as_ref();
        let trimmed = raw.strip_prefix('.').unwrap_or(raw);
        if trimmed.is_empty() {
            return Err(invalid(raw, "name is empty"));
        }
        for segment in trimmed.split('.') {
            validate_segment(raw, segment)?;
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Build the name of `name` declared inside `scope`.
    ///
    /// A `None` scope means the root namespace (a file without a package).
    pub fn join(scope: Option<&FullName>, name: &str) -> DescriptorResult<Self> {
        validate_segment(name, name)?;
        Ok(match scope {
            Some(scope) => Self(format!("{}.{}", scope.0, name)),
            None => Self(name.to_string()),
        })
    }

    /// The name as a string, without a leading dot.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last segment of the name.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// The enclosing scope, or `None` for a root-level name.
    pub fn parent(&self) -> Option<FullName> {
        self.0
            .rfind('.')
            .map(|idx| Self(self.0[..idx].to_string()))
    }
}

fn validate_segment(raw: &str, segment: &str) -> DescriptorResult<()> {
    let mut chars = segment.chars();
    match chars.next() {
        None => return Err(invalid(raw, "empty segment")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(invalid(raw, "segment must start with a letter or '_'"));
        }
        Some(_) => {}
    }
    if chars.any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
        return Err(invalid(raw, "segment contains a non-identifier character"));
    }
    Ok(())
}

fn invalid(name: &str, reason: &str) -> DescriptorError {
    DescriptorError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FullName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FullName {
    type Error = DescriptorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FullName> for String {
    fn from(name: FullName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn leading_dot_is_stripped() {
        let name = FullName::new(".acme.Item").unwrap();
        assert_eq!(name.as_str(), "acme.Item");
        assert_eq!(name, FullName::new("acme.Item").unwrap());
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(FullName::new("").is_err());
        assert!(FullName::new(".").is_err());
        assert!(FullName::new("acme..Item").is_err());
        assert!(FullName::new("acme.Item.").is_err());
        assert!(FullName::new("acme.9Item").is_err());
        assert!(FullName::new("acme.It-em").is_err());
    }

    #[test]
    fn join_and_parent() {
        let pkg = FullName::new("acme.inventory").unwrap();
        let item = FullName::join(Some(&pkg), "Item").unwrap();
        assert_eq!(item.as_str(), "acme.inventory.Item");
        assert_eq!(item.short_name(), "Item");
        assert_eq!(item.parent(), Some(pkg));

        let root = FullName::join(None, "Root").unwrap();
        assert_eq!(root.as_str(), "Root");
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn join_rejects_dotted_segment() {
        assert!(FullName::join(None, "a.b").is_err());
    }

    #[test]
    fn serde_round_trip_validates() {
        let name: FullName = serde_json::from_str("\".acme.Item\"").unwrap();
        assert_eq!(name.as_str(), "acme.Item");
        assert!(serde_json::from_str::<FullName>("\"acme..Item\"").is_err());
    }

    proptest! {
        /// Joining a valid segment onto a valid scope yields a name whose
        /// parent is that scope.
        #[test]
        fn join_parent_inverse(
            scope in "[a-z][a-z0-9_]{0,6}(\\.[a-z][a-z0-9_]{0,6}){0,3}",
            leaf in "[A-Z][A-Za-z0-9_]{0,8}",
        ) {
            let scope = FullName::new(&scope).unwrap();
            let joined = FullName::join(Some(&scope), &leaf).unwrap();
            prop_assert_eq!(joined.parent(), Some(scope));
            prop_assert_eq!(joined.short_name(), leaf.as_str());
        }
    }
}
