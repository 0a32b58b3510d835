//! `<process>` and `<scope>` states.
//!
//! Both elements hold the same body: optional declaration containers
//! followed by exactly one activity.

use orkest_model::{Activity, Declarations, Process, Scope};

use super::attributes::{ncname, optional, optional_ncname, required, yes_no};
use super::{Node, State, StateHeader, StateKind};
use crate::context::ParseContext;
use crate::error::{ParseError, ParseErrorKind};
use crate::event::StartElement;

/// Declarations and activity collected for a process or scope.
#[derive(Debug, Default)]
pub(crate) struct ScopeBody {
    declarations: Declarations,
    seen: Vec<StateKind>,
    activity: Option<Activity>,
}

impl ScopeBody {
    pub(crate) fn attach(
        &mut self,
        owner: &StateHeader,
        node: Node,
        child: &StateHeader,
    ) -> Result<(), ParseError> {
        match node {
            Node::Activity(activity) => {
                if self.activity.is_some() {
                    return Err(child.error(ParseErrorKind::MultipleActivities));
                }
                self.activity = Some(activity);
            }
            Node::PartnerLinks(items) => {
                self.check_declaration(owner, child)?;
                self.declarations.partner_links = items;
            }
            Node::Variables(items) => {
                self.check_declaration(owner, child)?;
                self.declarations.variables = items;
            }
            Node::CorrelationSets(items) => {
                self.check_declaration(owner, child)?;
                self.declarations.correlation_sets = items;
            }
            _ => return Err(unexpected(owner, child)),
        }
        Ok(())
    }

    /// Containers appear at most once each and before the activity.
    fn check_declaration(&mut self, owner: &StateHeader, child: &StateHeader) -> Result<(), ParseError> {
        let kind = child.kind();
        if self.activity.is_some() || self.seen.contains(&kind) {
            return Err(unexpected(owner, child));
        }
        self.seen.push(kind);
        Ok(())
    }

    fn finish(self, owner: &StateHeader) -> Result<(Declarations, Activity), ParseError> {
        let activity = self
            .activity
            .ok_or_else(|| owner.error(ParseErrorKind::MissingActivity))?;
        Ok((self.declarations, activity))
    }
}

fn unexpected(owner: &StateHeader, child: &StateHeader) -> ParseError {
    child.error(ParseErrorKind::UnexpectedChild {
        parent: owner.element.clone(),
    })
}

/// The root `<process>` element.
#[derive(Debug)]
pub struct ProcessState {
    pub(crate) header: StateHeader,
    pub(crate) body: ScopeBody,
    name: String,
    target_namespace: String,
    query_language: Option<String>,
    expression_language: Option<String>,
    suppress_join_failure: bool,
    exit_on_standard_fault: bool,
}

impl ProcessState {
    pub(crate) fn construct(
        se: &StartElement,
        header: StateHeader,
        _pc: &ParseContext<'_>,
    ) -> Result<State, ParseError> {
        let name = ncname(se, "name")?;
        let target_namespace = required(se, "targetNamespace")?.to_string();

        tracing::debug!(name = %name, target_namespace = %target_namespace, "Parsing process");

        Ok(State::Process(Self {
            name,
            target_namespace,
            query_language: optional(se, "queryLanguage"),
            expression_language: optional(se, "expressionLanguage"),
            suppress_join_failure: yes_no(se, "suppressJoinFailure")?.unwrap_or(false),
            exit_on_standard_fault: yes_no(se, "exitOnStandardFault")?.unwrap_or(false),
            header,
            body: ScopeBody::default(),
        }))
    }

    /// Effective `exitOnStandardFault` for nested scopes.
    #[must_use]
    pub fn exit_on_standard_fault(&self) -> bool {
        self.exit_on_standard_fault
    }

    pub(crate) fn finish(self) -> Result<Process, ParseError> {
        let (declarations, activity) = self.body.finish(&self.header)?;
        Ok(Process {
            name: self.name,
            target_namespace: self.target_namespace,
            query_language: self.query_language,
            expression_language: self.expression_language,
            suppress_join_failure: self.suppress_join_failure,
            exit_on_standard_fault: self.exit_on_standard_fault,
            declarations,
            activity,
            line: self.header.line,
            namespace_context: self.header.namespace_context,
        })
    }
}

/// A nested `<scope>`.
#[derive(Debug)]
pub struct ScopeState {
    pub(crate) header: StateHeader,
    pub(crate) body: ScopeBody,
    name: Option<String>,
    isolated: bool,
    exit_on_standard_fault: bool,
}

impl ScopeState {
    pub(crate) fn construct(
        se: &StartElement,
        header: StateHeader,
        pc: &ParseContext<'_>,
    ) -> Result<State, ParseError> {
        let name = optional_ncname(se, "name")?;
        let isolated = yes_no(se, "isolated")?.unwrap_or(false);

        if isolated
            && pc
                .ancestors()
                .any(|state| matches!(state, State::Scope(scope) if scope.isolated))
        {
            return Err(header.error(ParseErrorKind::InvalidNesting {
                detail: "an isolated scope must not be nested in another isolated scope"
                    .to_string(),
            }));
        }

        // Inherited from the closest enclosing scope or process when absent.
        let exit_on_standard_fault = match yes_no(se, "exitOnStandardFault")? {
            Some(value) => value,
            None => match pc.nearest_ancestor(&[StateKind::Scope, StateKind::Process]) {
                Some(State::Scope(scope)) => scope.exit_on_standard_fault,
                Some(State::Process(process)) => process.exit_on_standard_fault(),
                _ => false,
            },
        };

        Ok(State::Scope(Self {
            header,
            body: ScopeBody::default(),
            name,
            isolated,
            exit_on_standard_fault,
        }))
    }

    pub(crate) fn finish(self) -> Result<Activity, ParseError> {
        let (declarations, activity) = self.body.finish(&self.header)?;
        Ok(Activity::Scope(Scope {
            name: self.name,
            isolated: self.isolated,
            exit_on_standard_fault: self.exit_on_standard_fault,
            declarations,
            activity: Box::new(activity),
            line: self.header.line,
        }))
    }
}
