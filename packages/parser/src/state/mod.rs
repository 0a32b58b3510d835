//! Element states.
//!
//! One [`State`] variant exists per recognized element kind. A state is
//! created when its start tag is dispatched, collects finished child nodes
//! while its element is open, and is consumed by [`State::finish`] when the
//! end tag arrives. Only the [`Node`] it produces outlives the element.

mod activity;
mod attributes;
mod correlation_set;
mod declarations;
mod process;

use std::fmt;
use std::sync::Arc;

use orkest_model::{
    Activity, CorrelationSet, NamespaceContext, PartnerLink, Process, QName, Variable,
};

use crate::error::{ParseError, ParseErrorKind};
use crate::registry::{StateConstructor, StateFactory};

pub use activity::{EmptyState, FlowState, SequenceState};
pub use correlation_set::{resolve_property, CorrelationSetState};
pub use declarations::{Declared, ListState, PartnerLinkState, VariableState};
pub use process::{ProcessState, ScopeState};

/// Identity of a state variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Process,
    Scope,
    Sequence,
    Flow,
    Empty,
    PartnerLinks,
    PartnerLink,
    Variables,
    Variable,
    CorrelationSets,
    CorrelationSet,
}

impl StateKind {
    /// Every kind, in registration order.
    pub const ALL: [StateKind; 11] = [
        StateKind::Process,
        StateKind::Scope,
        StateKind::Sequence,
        StateKind::Flow,
        StateKind::Empty,
        StateKind::PartnerLinks,
        StateKind::PartnerLink,
        StateKind::Variables,
        StateKind::Variable,
        StateKind::CorrelationSets,
        StateKind::CorrelationSet,
    ];

    /// Local name of the element this kind handles.
    #[must_use]
    pub fn element_name(self) -> &'static str {
        match self {
            StateKind::Process => "process",
            StateKind::Scope => "scope",
            StateKind::Sequence => "sequence",
            StateKind::Flow => "flow",
            StateKind::Empty => "empty",
            StateKind::PartnerLinks => "partnerLinks",
            StateKind::PartnerLink => "partnerLink",
            StateKind::Variables => "variables",
            StateKind::Variable => "variable",
            StateKind::CorrelationSets => "correlationSets",
            StateKind::CorrelationSet => "correlationSet",
        }
    }

    #[must_use]
    pub fn is_activity(self) -> bool {
        matches!(
            self,
            StateKind::Scope | StateKind::Sequence | StateKind::Flow | StateKind::Empty
        )
    }

    /// Whether an element of kind `child` may appear directly inside this one.
    #[must_use]
    pub fn accepts(self, child: StateKind) -> bool {
        match self {
            StateKind::Process | StateKind::Scope => {
                child.is_activity()
                    || matches!(
                        child,
                        StateKind::PartnerLinks | StateKind::Variables | StateKind::CorrelationSets
                    )
            }
            StateKind::Sequence | StateKind::Flow => child.is_activity(),
            StateKind::PartnerLinks => child == StateKind::PartnerLink,
            StateKind::Variables => child == StateKind::Variable,
            StateKind::CorrelationSets => child == StateKind::CorrelationSet,
            StateKind::Empty
            | StateKind::PartnerLink
            | StateKind::Variable
            | StateKind::CorrelationSet => false,
        }
    }

    /// Constructor for this kind.
    #[must_use]
    pub fn constructor(self) -> StateConstructor {
        match self {
            StateKind::Process => ProcessState::construct,
            StateKind::Scope => ScopeState::construct,
            StateKind::Sequence => SequenceState::construct,
            StateKind::Flow => FlowState::construct,
            StateKind::Empty => EmptyState::construct,
            StateKind::PartnerLinks => ListState::<PartnerLink>::construct,
            StateKind::PartnerLink => PartnerLinkState::construct,
            StateKind::Variables => ListState::<Variable>::construct,
            StateKind::Variable => VariableState::construct,
            StateKind::CorrelationSets => ListState::<CorrelationSet>::construct,
            StateKind::CorrelationSet => CorrelationSetState::construct,
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// Data every state carries regardless of its kind.
#[derive(Debug, Clone)]
pub struct StateHeader {
    /// Element that opened the state.
    pub element: QName,
    /// Line of the start tag.
    pub line: u32,
    /// Namespace context of the element.
    pub namespace_context: Arc<NamespaceContext>,
    /// Factory that created the state.
    pub factory: StateFactory,
}

impl StateHeader {
    #[must_use]
    pub fn kind(&self) -> StateKind {
        self.factory.kind()
    }

    /// Diagnostic attributed to this element.
    #[must_use]
    pub fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.element.clone(), self.line, kind)
    }
}

/// A finished object-model node, ready to attach to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Process(Process),
    Activity(Activity),
    PartnerLinks(Vec<PartnerLink>),
    PartnerLink(PartnerLink),
    Variables(Vec<Variable>),
    Variable(Variable),
    CorrelationSets(Vec<CorrelationSet>),
    CorrelationSet(CorrelationSet),
}

/// The open state of one element.
#[derive(Debug)]
pub enum State {
    Process(ProcessState),
    Scope(ScopeState),
    Sequence(SequenceState),
    Flow(FlowState),
    Empty(EmptyState),
    PartnerLinks(ListState<PartnerLink>),
    PartnerLink(PartnerLinkState),
    Variables(ListState<Variable>),
    Variable(VariableState),
    CorrelationSets(ListState<CorrelationSet>),
    CorrelationSet(CorrelationSetState),
}

impl State {
    #[must_use]
    pub fn header(&self) -> &StateHeader {
        match self {
            State::Process(s) => &s.header,
            State::Scope(s) => &s.header,
            State::Sequence(s) => &s.header,
            State::Flow(s) => &s.header,
            State::Empty(s) => &s.header,
            State::PartnerLinks(s) => &s.header,
            State::PartnerLink(s) => &s.header,
            State::Variables(s) => &s.header,
            State::Variable(s) => &s.header,
            State::CorrelationSets(s) => &s.header,
            State::CorrelationSet(s) => &s.header,
        }
    }

    #[must_use]
    pub fn kind(&self) -> StateKind {
        self.header().kind()
    }

    #[must_use]
    pub fn element(&self) -> &QName {
        &self.header().element
    }

    /// Attach a finished child node.
    ///
    /// # Errors
    /// Fails when the node is not acceptable here, for instance a second
    /// activity or a duplicate declaration name.
    pub fn attach(&mut self, node: Node, child: &StateHeader) -> Result<(), ParseError> {
        match self {
            State::Process(s) => s.body.attach(&s.header, node, child),
            State::Scope(s) => s.body.attach(&s.header, node, child),
            State::Sequence(s) => s.attach(node, child),
            State::Flow(s) => s.attach(node, child),
            State::PartnerLinks(s) => match node {
                Node::PartnerLink(item) => s.push(item, child),
                _ => Err(s.unexpected(child)),
            },
            State::Variables(s) => match node {
                Node::Variable(item) => s.push(item, child),
                _ => Err(s.unexpected(child)),
            },
            State::CorrelationSets(s) => match node {
                Node::CorrelationSet(item) => s.push(item, child),
                _ => Err(s.unexpected(child)),
            },
            State::Empty(_) | State::PartnerLink(_) | State::Variable(_) | State::CorrelationSet(_) => {
                Err(child.error(ParseErrorKind::UnexpectedChild {
                    parent: self.element().clone(),
                }))
            }
        }
    }

    /// Validate and produce the node.
    ///
    /// # Errors
    /// Fails when the element is incomplete, for instance a scope without
    /// its activity.
    pub fn finish(self) -> Result<Node, ParseError> {
        match self {
            State::Process(s) => s.finish().map(Node::Process),
            State::Scope(s) => s.finish().map(Node::Activity),
            State::Sequence(s) => Ok(Node::Activity(s.finish())),
            State::Flow(s) => Ok(Node::Activity(s.finish())),
            State::Empty(s) => Ok(Node::Activity(s.finish())),
            State::PartnerLinks(s) => Ok(Node::PartnerLinks(s.finish())),
            State::PartnerLink(s) => Ok(Node::PartnerLink(s.finish())),
            State::Variables(s) => Ok(Node::Variables(s.finish())),
            State::Variable(s) => Ok(Node::Variable(s.finish())),
            State::CorrelationSets(s) => Ok(Node::CorrelationSets(s.finish())),
            State::CorrelationSet(s) => Ok(Node::CorrelationSet(s.finish())),
        }
    }
}
