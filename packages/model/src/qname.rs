//! Qualified names.
//!
//! A [`QName`] is a (namespace URI, local name) pair. The prefix used in the
//! source text is not part of its identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI; empty for names in no namespace.
    pub namespace: String,
    /// Local part.
    pub local: String,
}

impl QName {
    /// Create a qualified name.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Create a name in no namespace.
    #[must_use]
    pub fn local(local: impl Into<String>) -> Self {
        Self::new("", local)
    }

    /// Whether this name has no namespace.
    #[must_use]
    pub fn is_unqualified(&self) -> bool {
        self.namespace.is_empty()
    }

    /// Parse a Clark-notation literal (`{namespace}local`).
    ///
    /// The local part is everything after the closing brace and may be empty.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidQName` when the literal does not start with
    /// `{` or has no closing `}`.
    ///
    /// # Examples
    /// ```
    /// use orkest_model::QName;
    ///
    /// let name = QName::from_clark("{http://x}prop2").unwrap();
    /// assert_eq!(name, QName::new("http://x", "prop2"));
    /// assert_eq!(QName::from_clark("{http://x}").unwrap().local, "");
    /// assert!(QName::from_clark("{unterminated").is_err());
    /// ```
    pub fn from_clark(literal: &str) -> Result<Self, ModelError> {
        let rest = literal
            .strip_prefix('{')
            .ok_or_else(|| ModelError::InvalidQName(format!("'{literal}' does not start with '{{'")))?;
        let close = rest
            .find('}')
            .ok_or_else(|| ModelError::InvalidQName(format!("'{literal}' has no matching '}}'")))?;
        Ok(Self::new(&rest[..close], &rest[close + 1..]))
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

impl FromStr for QName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('{') {
            Self::from_clark(s)
        } else if s.is_empty() {
            Err(ModelError::InvalidQName("empty name".to_string()))
        } else {
            Ok(Self::local(s))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_clark() {
        assert_eq!(QName::new("http://a", "b").to_string(), "{http://a}b");
        assert_eq!(QName::local("b").to_string(), "b");
    }

    #[test]
    fn test_from_clark_empty_namespace() {
        let name = QName::from_clark("{}x").unwrap();
        assert!(name.is_unqualified());
        assert_eq!(name.local, "x");
    }

    #[test]
    fn test_from_clark_empty_local() {
        assert_eq!(
            QName::from_clark("{http://x}").unwrap(),
            QName::new("http://x", "")
        );
        assert!(QName::from_clark("{http://x").is_err());
    }

    #[test]
    fn test_from_str() {
        let name: QName = "{urn:a}b".parse().unwrap();
        assert_eq!(name, QName::new("urn:a", "b"));
        assert!("".parse::<QName>().is_err());
    }
}
