//! Structured and basic activity states: `<sequence>`, `<flow>`, `<empty>`.

use orkest_model::{Activity, Empty, Flow, Sequence};

use super::attributes::optional_ncname;
use super::{Node, State, StateHeader};
use crate::context::ParseContext;
use crate::error::{ParseError, ParseErrorKind};
use crate::event::StartElement;

/// Collects child activities in document order.
#[derive(Debug)]
pub struct SequenceState {
    pub(crate) header: StateHeader,
    name: Option<String>,
    activities: Vec<Activity>,
}

impl SequenceState {
    pub(crate) fn construct(
        se: &StartElement,
        header: StateHeader,
        _pc: &ParseContext<'_>,
    ) -> Result<State, ParseError> {
        Ok(State::Sequence(Self {
            name: optional_ncname(se, "name")?,
            header,
            activities: Vec::new(),
        }))
    }

    pub(crate) fn attach(&mut self, node: Node, child: &StateHeader) -> Result<(), ParseError> {
        push_activity(&self.header, &mut self.activities, node, child)
    }

    pub(crate) fn finish(self) -> Activity {
        Activity::Sequence(Sequence {
            name: self.name,
            activities: self.activities,
            line: self.header.line,
        })
    }
}

/// Collects concurrently executed child activities.
#[derive(Debug)]
pub struct FlowState {
    pub(crate) header: StateHeader,
    name: Option<String>,
    activities: Vec<Activity>,
}

impl FlowState {
    pub(crate) fn construct(
        se: &StartElement,
        header: StateHeader,
        _pc: &ParseContext<'_>,
    ) -> Result<State, ParseError> {
        Ok(State::Flow(Self {
            name: optional_ncname(se, "name")?,
            header,
            activities: Vec::new(),
        }))
    }

    pub(crate) fn attach(&mut self, node: Node, child: &StateHeader) -> Result<(), ParseError> {
        push_activity(&self.header, &mut self.activities, node, child)
    }

    pub(crate) fn finish(self) -> Activity {
        Activity::Flow(Flow {
            name: self.name,
            activities: self.activities,
            line: self.header.line,
        })
    }
}

/// The no-op activity; complete at its start tag.
#[derive(Debug)]
pub struct EmptyState {
    pub(crate) header: StateHeader,
    node: Empty,
}

impl EmptyState {
    pub(crate) fn construct(
        se: &StartElement,
        header: StateHeader,
        _pc: &ParseContext<'_>,
    ) -> Result<State, ParseError> {
        let node = Empty {
            name: optional_ncname(se, "name")?,
            line: header.line,
        };
        Ok(State::Empty(Self { header, node }))
    }

    pub(crate) fn finish(self) -> Activity {
        Activity::Empty(self.node)
    }
}

fn push_activity(
    parent: &StateHeader,
    activities: &mut Vec<Activity>,
    node: Node,
    child: &StateHeader,
) -> Result<(), ParseError> {
    match node {
        Node::Activity(activity) => {
            activities.push(activity);
            Ok(())
        }
        _ => Err(child.error(ParseErrorKind::UnexpectedChild {
            parent: parent.element.clone(),
        })),
    }
}
