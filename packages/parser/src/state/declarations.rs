//! Declaration states: partner links, variables and their containers.

use orkest_model::{CorrelationSet, PartnerLink, Variable, VariableType};

use super::attributes::{combination, ncname, optional, optional_qname, qname, yes_no};
use super::{State, StateHeader};
use crate::context::ParseContext;
use crate::error::{ParseError, ParseErrorKind};
use crate::event::StartElement;

/// A named declaration that lives in a container element.
pub trait Declared: Sized {
    /// Human-readable kind, used in diagnostics.
    const WHAT: &'static str;

    fn declared_name(&self) -> &str;

    /// Wrap a container of this declaration into its state variant.
    fn wrap(list: ListState<Self>) -> State;
}

impl Declared for PartnerLink {
    const WHAT: &'static str = "partner link";

    fn declared_name(&self) -> &str {
        &self.name
    }

    fn wrap(list: ListState<Self>) -> State {
        State::PartnerLinks(list)
    }
}

impl Declared for Variable {
    const WHAT: &'static str = "variable";

    fn declared_name(&self) -> &str {
        &self.name
    }

    fn wrap(list: ListState<Self>) -> State {
        State::Variables(list)
    }
}

impl Declared for CorrelationSet {
    const WHAT: &'static str = "correlation set";

    fn declared_name(&self) -> &str {
        &self.name
    }

    fn wrap(list: ListState<Self>) -> State {
        State::CorrelationSets(list)
    }
}

/// Container element (`<partnerLinks>`, `<variables>`, `<correlationSets>`).
///
/// Keeps declarations in document order and rejects duplicate names.
#[derive(Debug)]
pub struct ListState<T> {
    pub(crate) header: StateHeader,
    items: Vec<T>,
}

impl<T: Declared> ListState<T> {
    pub(crate) fn construct(
        _se: &StartElement,
        header: StateHeader,
        _pc: &ParseContext<'_>,
    ) -> Result<State, ParseError> {
        Ok(T::wrap(Self {
            header,
            items: Vec::new(),
        }))
    }

    pub(crate) fn push(&mut self, item: T, child: &StateHeader) -> Result<(), ParseError> {
        if self
            .items
            .iter()
            .any(|existing| existing.declared_name() == item.declared_name())
        {
            return Err(child.error(ParseErrorKind::DuplicateName {
                what: T::WHAT,
                name: item.declared_name().to_string(),
            }));
        }
        self.items.push(item);
        Ok(())
    }

    pub(crate) fn unexpected(&self, child: &StateHeader) -> ParseError {
        child.error(ParseErrorKind::UnexpectedChild {
            parent: self.header.element.clone(),
        })
    }

    pub(crate) fn finish(self) -> Vec<T> {
        self.items
    }
}

/// `<partnerLink>`.
#[derive(Debug)]
pub struct PartnerLinkState {
    pub(crate) header: StateHeader,
    node: PartnerLink,
}

impl PartnerLinkState {
    pub(crate) fn construct(
        se: &StartElement,
        header: StateHeader,
        _pc: &ParseContext<'_>,
    ) -> Result<State, ParseError> {
        let name = ncname(se, "name")?;
        let partner_link_type = qname(se, &header.namespace_context, "partnerLinkType")?;
        let my_role = optional(se, "myRole");
        let partner_role = optional(se, "partnerRole");
        let initialize_partner_role = yes_no(se, "initializePartnerRole")?;

        if my_role.is_none() && partner_role.is_none() {
            return Err(combination(
                se,
                "at least one of 'myRole' or 'partnerRole' is required",
            ));
        }
        if initialize_partner_role.is_some() && partner_role.is_none() {
            return Err(combination(
                se,
                "'initializePartnerRole' requires 'partnerRole'",
            ));
        }

        let node = PartnerLink {
            name,
            partner_link_type,
            my_role,
            partner_role,
            initialize_partner_role,
            line: header.line,
        };
        Ok(State::PartnerLink(Self { header, node }))
    }

    pub(crate) fn finish(self) -> PartnerLink {
        self.node
    }
}

/// `<variable>`.
#[derive(Debug)]
pub struct VariableState {
    pub(crate) header: StateHeader,
    node: Variable,
}

impl VariableState {
    pub(crate) fn construct(
        se: &StartElement,
        header: StateHeader,
        _pc: &ParseContext<'_>,
    ) -> Result<State, ParseError> {
        let name = ncname(se, "name")?;
        let nsc = &header.namespace_context;

        let candidates = [
            optional_qname(se, nsc, "messageType")?.map(VariableType::MessageType),
            optional_qname(se, nsc, "type")?.map(VariableType::Type),
            optional_qname(se, nsc, "element")?.map(VariableType::Element),
        ];
        let mut given = candidates.into_iter().flatten();
        let variable_type = match (given.next(), given.next()) {
            (Some(variable_type), None) => variable_type,
            _ => {
                return Err(combination(
                    se,
                    "exactly one of 'messageType', 'type' or 'element' is required",
                ))
            }
        };

        let node = Variable {
            name,
            variable_type,
            line: header.line,
        };
        Ok(State::Variable(Self { header, node }))
    }

    pub(crate) fn finish(self) -> Variable {
        self.node
    }
}
