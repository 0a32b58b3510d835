//! `<correlationSet>` state.

use std::sync::Arc;

use orkest_model::{CorrelationSet, NamespaceContext, QName};

use super::attributes::{malformed, ncname};
use super::{State, StateHeader};
use crate::config::tokenize;
use crate::context::ParseContext;
use crate::error::ParseError;
use crate::event::StartElement;

const PROPERTIES: &str = "properties";

/// Builds a [`CorrelationSet`] from its start tag.
///
/// The node is complete as soon as the start tag has been read; the element
/// has no children.
#[derive(Debug)]
pub struct CorrelationSetState {
    pub(crate) header: StateHeader,
    node: CorrelationSet,
}

impl CorrelationSetState {
    pub(crate) fn construct(
        se: &StartElement,
        header: StateHeader,
        _pc: &ParseContext<'_>,
    ) -> Result<State, ParseError> {
        let name = ncname(se, "name")?;
        let nsc = &header.namespace_context;

        // An absent attribute stays `None`; it is not the same as an empty list.
        let properties = match se.attributes.value_of(PROPERTIES) {
            None => None,
            Some(raw) => Some(
                tokenize(raw)
                    .map(|token| {
                        resolve_property(token, nsc).map_err(|detail| malformed(se, PROPERTIES, detail))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        tracing::debug!(
            name = %name,
            properties = properties.as_ref().map_or(0, Vec::len),
            line = header.line,
            "Declared correlation set"
        );

        let node = CorrelationSet {
            name,
            properties,
            line: header.line,
            namespace_context: Arc::clone(nsc),
        };
        Ok(State::CorrelationSet(Self { header, node }))
    }

    pub(crate) fn finish(self) -> CorrelationSet {
        self.node
    }
}

/// Resolve one `properties` token.
///
/// A token starting with `{` is a Clark-notation literal and never consults
/// the namespace context. Anything else is a prefixed name resolved against
/// `nsc`.
///
/// # Errors
/// Returns a description of the problem: unmatched brace or unbound prefix.
///
/// # Examples
/// ```
/// use orkest_model::{NamespaceContext, QName};
/// use orkest_parser::state::resolve_property;
///
/// let nsc = NamespaceContext::derive(&NamespaceContext::root(), [("ns1", "http://a")]);
/// assert_eq!(resolve_property("ns1:prop1", &nsc).unwrap(), QName::new("http://a", "prop1"));
/// assert_eq!(resolve_property("{http://x}prop2", &nsc).unwrap(), QName::new("http://x", "prop2"));
/// assert!(resolve_property("{unterminated", &nsc).is_err());
/// ```
pub fn resolve_property(token: &str, nsc: &NamespaceContext) -> Result<QName, String> {
    if token.starts_with('{') {
        QName::from_clark(token).map_err(|err| err.to_string())
    } else {
        nsc.deref_qname(token).map_err(|err| err.to_string())
    }
}
