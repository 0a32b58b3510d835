//! Object-model node types.
//!
//! These are the immutable artifacts produced by the parser. A node is
//! owned exclusively by its parent once attached; nothing here is shared
//! between siblings except namespace contexts, which are immutable.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::namespace::NamespaceContext;
use crate::qname::QName;

/// A compiled process definition; the root of the object model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub name: String,
    pub target_namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression_language: Option<String>,
    pub suppress_join_failure: bool,
    pub exit_on_standard_fault: bool,
    #[serde(flatten)]
    pub declarations: Declarations,
    pub activity: Activity,
    pub line: u32,
    pub namespace_context: Arc<NamespaceContext>,
}

impl Process {
    /// The process type name: `{targetNamespace}name`.
    #[must_use]
    pub fn qname(&self) -> QName {
        QName::new(&self.target_namespace, &self.name)
    }

    /// Iterate over every activity in the process, depth first.
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        let mut stack = vec![&self.activity];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children().iter().rev());
            Some(next)
        })
    }
}

/// Declarations shared by `process` and `scope`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declarations {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partner_links: Vec<PartnerLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correlation_sets: Vec<CorrelationSet>,
}

impl Declarations {
    /// Find a correlation set by name.
    #[must_use]
    pub fn correlation_set(&self, name: &str) -> Option<&CorrelationSet> {
        self.correlation_sets.iter().find(|cs| cs.name == name)
    }

    /// Find a partner link by name.
    #[must_use]
    pub fn partner_link(&self, name: &str) -> Option<&PartnerLink> {
        self.partner_links.iter().find(|pl| pl.name == name)
    }

    /// Find a variable by name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// An activity node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "activity", rename_all = "lowercase")]
pub enum Activity {
    Sequence(Sequence),
    Flow(Flow),
    Scope(Scope),
    Empty(Empty),
}

impl Activity {
    /// Element name of the activity.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Activity::Sequence(_) => "sequence",
            Activity::Flow(_) => "flow",
            Activity::Scope(_) => "scope",
            Activity::Empty(_) => "empty",
        }
    }

    /// The optional `name` attribute.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Activity::Sequence(a) => a.name.as_deref(),
            Activity::Flow(a) => a.name.as_deref(),
            Activity::Scope(a) => a.name.as_deref(),
            Activity::Empty(a) => a.name.as_deref(),
        }
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        match self {
            Activity::Sequence(a) => a.line,
            Activity::Flow(a) => a.line,
            Activity::Scope(a) => a.line,
            Activity::Empty(a) => a.line,
        }
    }

    /// Directly nested activities.
    #[must_use]
    pub fn children(&self) -> &[Activity] {
        match self {
            Activity::Sequence(a) => &a.activities,
            Activity::Flow(a) => &a.activities,
            Activity::Scope(a) => std::slice::from_ref(a.activity.as_ref()),
            Activity::Empty(_) => &[],
        }
    }
}

/// Activities executed in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub activities: Vec<Activity>,
    pub line: u32,
}

/// Activities executed concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub activities: Vec<Activity>,
    pub line: u32,
}

/// A nested declaration scope around a single activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub isolated: bool,
    pub exit_on_standard_fault: bool,
    #[serde(flatten)]
    pub declarations: Declarations,
    pub activity: Box<Activity>,
    pub line: u32,
}

/// The no-op activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub line: u32,
}

/// A partner link declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerLink {
    pub name: String,
    pub partner_link_type: QName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialize_partner_role: Option<bool>,
    pub line: u32,
}

/// The type reference of a variable; exactly one form is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableType {
    MessageType(QName),
    Type(QName),
    Element(QName),
}

/// A variable declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub variable_type: VariableType,
    pub line: u32,
}

/// A correlation set declaration.
///
/// `properties` is `None` when the source omitted the `properties`
/// attribute, which is distinct from an attribute listing no tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationSet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<QName>>,
    pub line: u32,
    pub namespace_context: Arc<NamespaceContext>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(name: &str, line: u32) -> Activity {
        Activity::Empty(Empty {
            name: Some(name.to_string()),
            line,
        })
    }

    fn process(activity: Activity) -> Process {
        Process {
            name: "p".to_string(),
            target_namespace: "urn:t".to_string(),
            query_language: None,
            expression_language: None,
            suppress_join_failure: false,
            exit_on_standard_fault: false,
            declarations: Declarations::default(),
            activity,
            line: 1,
            namespace_context: NamespaceContext::root(),
        }
    }

    #[test]
    fn test_process_qname() {
        let p = process(empty("e", 2));
        assert_eq!(p.qname(), QName::new("urn:t", "p"));
    }

    #[test]
    fn test_activities_depth_first() {
        let p = process(Activity::Sequence(Sequence {
            name: Some("main".to_string()),
            activities: vec![
                Activity::Flow(Flow {
                    name: Some("f".to_string()),
                    activities: vec![empty("a", 4), empty("b", 5)],
                    line: 3,
                }),
                empty("c", 7),
            ],
            line: 2,
        }));

        let names: Vec<_> = p.activities().filter_map(Activity::name).collect();
        assert_eq!(names, vec!["main", "f", "a", "b", "c"]);
    }

    #[test]
    fn test_correlation_set_absent_properties_not_serialized() {
        let cs = CorrelationSet {
            name: "cs".to_string(),
            properties: None,
            line: 3,
            namespace_context: NamespaceContext::empty(),
        };
        let json = serde_json::to_value(&cs).unwrap();
        assert!(json.get("properties").is_none());

        let back: CorrelationSet = serde_json::from_value(json).unwrap();
        assert_eq!(back.properties, None);
    }

    #[test]
    fn test_declarations_lookup() {
        let decls = Declarations {
            correlation_sets: vec![CorrelationSet {
                name: "order".to_string(),
                properties: Some(vec![]),
                line: 1,
                namespace_context: NamespaceContext::empty(),
            }],
            ..Declarations::default()
        };
        assert!(decls.correlation_set("order").is_some());
        assert!(decls.correlation_set("missing").is_none());
        assert!(decls.partner_link("order").is_none());
    }
}
