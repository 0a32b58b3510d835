//! Registry mapping qualified element names to state factories.

use std::collections::HashMap;
use std::fmt;

use orkest_model::QName;

use crate::context::ParseContext;
use crate::error::ParseError;
use crate::event::StartElement;
use crate::state::{State, StateHeader, StateKind};

/// Constructor of a state variant.
///
/// Receives the start tag, a header prepared by the dispatcher (element
/// name, line, derived namespace context, factory) and the parse context
/// for ancestor lookups. The new state is not yet on the stack.
pub type StateConstructor =
    fn(&StartElement, StateHeader, &ParseContext<'_>) -> Result<State, ParseError>;

/// Creates states of one kind.
#[derive(Clone, Copy)]
pub struct StateFactory {
    kind: StateKind,
    construct: StateConstructor,
}

impl StateFactory {
    /// Factory with an explicit constructor.
    #[must_use]
    pub fn new(kind: StateKind, construct: StateConstructor) -> Self {
        Self { kind, construct }
    }

    /// Factory using the built-in constructor of `kind`.
    #[must_use]
    pub fn for_kind(kind: StateKind) -> Self {
        Self::new(kind, kind.constructor())
    }

    /// Kind of the states this factory creates.
    #[must_use]
    pub fn kind(&self) -> StateKind {
        self.kind
    }

    /// Create a state.
    ///
    /// # Errors
    /// Propagates the constructor's validation failure.
    pub fn create(
        &self,
        se: &StartElement,
        header: StateHeader,
        pc: &ParseContext<'_>,
    ) -> Result<State, ParseError> {
        (self.construct)(se, header, pc)
    }
}

impl fmt::Debug for StateFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateFactory")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Registry mapping element names to factories.
#[derive(Debug, Default)]
pub struct StateRegistry {
    factories: HashMap<QName, StateFactory>,
}

impl StateRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for an element name, replacing any previous one.
    pub fn register(&mut self, element: QName, factory: StateFactory) {
        self.factories.insert(element, factory);
    }

    /// Factory for an element name.
    #[must_use]
    pub fn lookup(&self, element: &QName) -> Option<&StateFactory> {
        self.factories.get(element)
    }

    /// Check if a factory is registered for an element name.
    #[must_use]
    pub fn has_factory(&self, element: &QName) -> bool {
        self.factories.contains_key(element)
    }

    /// All registered element names, sorted.
    #[must_use]
    pub fn registered_names(&self) -> Vec<&QName> {
        let mut names: Vec<&QName> = self.factories.keys().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_register_and_lookup() {
        let mut registry = StateRegistry::new();
        let name = QName::new("urn:test", "empty");
        registry.register(name.clone(), StateFactory::for_kind(StateKind::Empty));

        assert!(registry.has_factory(&name));
        assert_eq!(
            registry.lookup(&name).map(StateFactory::kind),
            Some(StateKind::Empty)
        );
    }

    #[test]
    fn test_lookup_is_namespace_sensitive() {
        let mut registry = StateRegistry::new();
        registry.register(
            QName::new("urn:a", "empty"),
            StateFactory::for_kind(StateKind::Empty),
        );

        assert!(registry.lookup(&QName::new("urn:b", "empty")).is_none());
        assert!(registry.lookup(&QName::local("empty")).is_none());
    }

    #[test]
    fn test_registered_names_sorted() {
        let mut registry = StateRegistry::new();
        registry.register(QName::local("b"), StateFactory::for_kind(StateKind::Flow));
        registry.register(QName::local("a"), StateFactory::for_kind(StateKind::Empty));

        let names: Vec<_> = registry
            .registered_names()
            .into_iter()
            .map(|n| n.local.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(registry.len(), 2);
    }
}
