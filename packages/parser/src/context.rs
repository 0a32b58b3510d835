//! Parse context: the state stack of one parse.
//!
//! The context consumes start/end events one at a time. A start event is
//! dispatched through the [`StateRegistry`] to a new state, which is pushed;
//! an end event pops the top state, finishes it and attaches the resulting
//! node to the new top (or keeps it as the parse result once the stack is
//! empty).
//!
//! Any failure aborts the parse: the stack is dropped, so no partially
//! built node stays reachable, and every later call returns the same
//! diagnostic.

use std::sync::Arc;

use orkest_model::NamespaceContext;

use crate::error::{ParseError, ParseErrorKind};
use crate::event::{EndElement, StartElement, XmlEvent};
use crate::registry::StateRegistry;
use crate::state::{Node, State, StateHeader, StateKind};

/// Live state of a single parse.
pub struct ParseContext<'r> {
    registry: &'r StateRegistry,
    seed: Arc<NamespaceContext>,
    expected_root: Option<StateKind>,
    stack: Vec<State>,
    result: Option<Node>,
    failure: Option<ParseError>,
    last_line: u32,
}

impl<'r> ParseContext<'r> {
    /// Create a context that dispatches through `registry`.
    #[must_use]
    pub fn new(registry: &'r StateRegistry) -> Self {
        Self {
            registry,
            seed: NamespaceContext::root(),
            expected_root: None,
            stack: Vec::new(),
            result: None,
            failure: None,
            last_line: 1,
        }
    }

    /// Reject any root element that is not of `kind`.
    #[must_use]
    pub fn expect_root(mut self, kind: StateKind) -> Self {
        self.expected_root = Some(kind);
        self
    }

    /// Number of open elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether the root element has been closed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// The innermost open state.
    #[must_use]
    pub fn current(&self) -> Option<&State> {
        self.stack.last()
    }

    /// Open states from the innermost outwards.
    pub fn ancestors(&self) -> impl Iterator<Item = &State> {
        self.stack.iter().rev()
    }

    /// Nearest open state of the given kind.
    #[must_use]
    pub fn find_ancestor(&self, kind: StateKind) -> Option<&State> {
        self.nearest_ancestor(&[kind])
    }

    /// Nearest open state whose kind is any of `kinds`.
    #[must_use]
    pub fn nearest_ancestor(&self, kinds: &[StateKind]) -> Option<&State> {
        self.ancestors().find(|state| kinds.contains(&state.kind()))
    }

    /// Feed one event.
    ///
    /// # Errors
    /// Returns the diagnostic that aborted the parse.
    pub fn handle(&mut self, event: &XmlEvent) -> Result<(), ParseError> {
        match event {
            XmlEvent::Start(se) => self.start_element(se),
            XmlEvent::End(ee) => self.end_element(ee),
        }
    }

    /// Dispatch a start tag.
    ///
    /// # Errors
    /// Fails on an unknown element, an element its parent does not accept,
    /// or a constructor validation failure.
    pub fn start_element(&mut self, se: &StartElement) -> Result<(), ParseError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.last_line = se.line();
        self.try_start(se).map_err(|err| self.abort(err))
    }

    /// Close the current element.
    ///
    /// # Errors
    /// Fails when the tag does not match the open element or the element
    /// does not validate.
    pub fn end_element(&mut self, ee: &EndElement) -> Result<(), ParseError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.last_line = ee.location.line;
        self.try_end(ee).map_err(|err| self.abort(err))
    }

    /// Finish the parse and take the root node.
    ///
    /// # Errors
    /// Fails if the parse was aborted, elements are still open, or no
    /// element was seen at all.
    pub fn finish(mut self) -> Result<Node, ParseError> {
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }
        if let Some(open) = self.stack.last() {
            return Err(open.header().error(ParseErrorKind::Incomplete));
        }
        self.result
            .take()
            .ok_or_else(|| ParseError::document(self.last_line, ParseErrorKind::NoRootElement))
    }

    fn try_start(&mut self, se: &StartElement) -> Result<(), ParseError> {
        let element_error = |kind| ParseError::new(se.name.clone(), se.line(), kind);

        if self.result.is_some() {
            return Err(element_error(ParseErrorKind::MultipleRoots));
        }

        let factory = *self
            .registry
            .lookup(&se.name)
            .ok_or_else(|| element_error(ParseErrorKind::UnknownElement))?;

        let enclosing = match self.stack.last() {
            Some(parent) => {
                if !parent.kind().accepts(factory.kind()) {
                    return Err(element_error(ParseErrorKind::UnexpectedChild {
                        parent: parent.element().clone(),
                    }));
                }
                &parent.header().namespace_context
            }
            None => {
                if self.expected_root.is_some_and(|kind| kind != factory.kind()) {
                    return Err(element_error(ParseErrorKind::NotAProcess));
                }
                &self.seed
            }
        };

        let header = StateHeader {
            element: se.name.clone(),
            line: se.line(),
            namespace_context: NamespaceContext::derive(enclosing, se.declarations.iter().cloned()),
            factory,
        };

        let state = factory.create(se, header, self)?;
        tracing::debug!(
            element = %se.name,
            line = se.line(),
            depth = self.stack.len(),
            "Push state"
        );
        self.stack.push(state);
        Ok(())
    }

    fn try_end(&mut self, ee: &EndElement) -> Result<(), ParseError> {
        let end_error = |kind| ParseError::new(ee.name.clone(), ee.location.line, kind);

        // A failed end aborts the parse, so the popped state is never needed again.
        let top = self
            .stack
            .pop()
            .ok_or_else(|| end_error(ParseErrorKind::UnexpectedEnd))?;

        if top.element() != &ee.name {
            return Err(end_error(ParseErrorKind::StructuralMismatch {
                expected: top.element().clone(),
                found: ee.name.clone(),
            }));
        }

        let header = top.header().clone();
        let node = top.finish()?;

        tracing::debug!(
            element = %header.element,
            line = header.line,
            depth = self.stack.len(),
            "Pop state"
        );

        match self.stack.last_mut() {
            Some(parent) => parent.attach(node, &header),
            None => {
                self.result = Some(node);
                Ok(())
            }
        }
    }

    fn abort(&mut self, error: ParseError) -> ParseError {
        tracing::debug!(error = %error, depth = self.stack.len(), "Aborting parse");
        self.stack.clear();
        self.result = None;
        self.failure = Some(error.clone());
        error
    }
}

/// Run a whole event stream through a fresh context.
///
/// # Errors
/// Returns the first diagnostic.
pub fn parse_document<'e, I>(registry: &StateRegistry, events: I) -> Result<Node, ParseError>
where
    I: IntoIterator<Item = &'e XmlEvent>,
{
    let mut pc = ParseContext::new(registry);
    for event in events {
        pc.handle(event)?;
    }
    pc.finish()
}
