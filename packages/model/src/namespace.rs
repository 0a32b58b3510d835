//! Lexically scoped namespace bindings.
//!
//! Every element gets a [`NamespaceContext`] that is a pure function of the
//! enclosing context and the element's own `xmlns` declarations. Contexts are
//! never mutated once built; an override on a descendant derives a new
//! context that points back at its parent, so siblings never observe each
//! other's declarations.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::qname::QName;

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Immutable prefix to URI bindings for one element.
///
/// The default namespace is bound under the empty prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct NamespaceContext {
    bindings: BTreeMap<String, String>,
    parent: Option<Arc<NamespaceContext>>,
}

impl NamespaceContext {
    /// Context with no bindings at all.
    #[must_use]
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed context for a document: only the reserved `xml` prefix is bound.
    #[must_use]
    pub fn root() -> Arc<Self> {
        let mut bindings = BTreeMap::new();
        bindings.insert("xml".to_string(), XML_NAMESPACE.to_string());
        Arc::new(Self {
            bindings,
            parent: None,
        })
    }

    /// Derive the context of a child element.
    ///
    /// Returns `parent` itself (shared, not copied) when the element declares
    /// nothing.
    ///
    /// # Examples
    /// ```
    /// use orkest_model::NamespaceContext;
    ///
    /// let outer = NamespaceContext::derive(&NamespaceContext::root(), [("p", "urn:outer")]);
    /// let inner = NamespaceContext::derive(&outer, [("p", "urn:inner")]);
    /// assert_eq!(outer.lookup("p"), Some("urn:outer"));
    /// assert_eq!(inner.lookup("p"), Some("urn:inner"));
    /// ```
    #[must_use]
    pub fn derive<I, P, U>(parent: &Arc<Self>, declarations: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        let bindings: BTreeMap<String, String> = declarations
            .into_iter()
            .map(|(prefix, uri)| (prefix.into(), uri.into()))
            .collect();

        if bindings.is_empty() {
            return Arc::clone(parent);
        }

        Arc::new(Self {
            bindings,
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Look up a prefix, innermost binding first.
    #[must_use]
    pub fn lookup(&self, prefix: &str) -> Option<&str> {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Some(uri) = ctx.bindings.get(prefix) {
                return Some(uri.as_str());
            }
            current = ctx.parent.as_deref();
        }
        None
    }

    /// Resolve a prefix to its namespace URI.
    ///
    /// # Errors
    /// Returns `ModelError::UnboundPrefix` if no enclosing scope binds it.
    pub fn resolve(&self, prefix: &str) -> Result<&str, ModelError> {
        self.lookup(prefix)
            .ok_or_else(|| ModelError::UnboundPrefix(prefix.to_string()))
    }

    /// Resolve a `prefix:local` (or unprefixed) name.
    ///
    /// An unprefixed name takes the default namespace if one is bound and no
    /// namespace otherwise.
    ///
    /// # Errors
    /// Returns `ModelError::UnboundPrefix` for an unknown prefix and
    /// `ModelError::InvalidQName` for an empty prefix or local part.
    pub fn deref_qname(&self, name: &str) -> Result<QName, ModelError> {
        match name.split_once(':') {
            Some((prefix, local)) => {
                if prefix.is_empty() || local.is_empty() || local.contains(':') {
                    return Err(ModelError::InvalidQName(format!(
                        "'{name}' is not a valid prefixed name"
                    )));
                }
                let uri = self.resolve(prefix)?;
                Ok(QName::new(uri, local))
            }
            None if name.is_empty() => Err(ModelError::InvalidQName("empty name".to_string())),
            None => Ok(QName::new(self.lookup("").unwrap_or_default(), name)),
        }
    }

    /// All bindings in scope, with inner declarations shadowing outer ones.
    #[must_use]
    pub fn in_scope(&self) -> BTreeMap<String, String> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(ctx) = current {
            chain.push(ctx);
            current = ctx.parent.as_deref();
        }

        let mut flattened = BTreeMap::new();
        for ctx in chain.into_iter().rev() {
            for (prefix, uri) in &ctx.bindings {
                flattened.insert(prefix.clone(), uri.clone());
            }
        }
        flattened
    }
}

impl PartialEq for NamespaceContext {
    fn eq(&self, other: &Self) -> bool {
        self.in_scope() == other.in_scope()
    }
}

impl Eq for NamespaceContext {}

impl From<BTreeMap<String, String>> for NamespaceContext {
    fn from(bindings: BTreeMap<String, String>) -> Self {
        Self {
            bindings,
            parent: None,
        }
    }
}

impl From<NamespaceContext> for BTreeMap<String, String> {
    fn from(ctx: NamespaceContext) -> Self {
        ctx.in_scope()
    }
}
