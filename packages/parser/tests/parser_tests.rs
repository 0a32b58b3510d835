//! End-to-end parser tests.
//!
//! Feeds whole process documents (fixtures and inline sources) through the
//! event source and the state machine, and checks the resulting object
//! model or the single diagnostic a failed parse produces.

use std::fs;
use std::path::Path;

use orkest_model::{Activity, QName, Scope, VariableType};
use orkest_parser::config::BPEL_NAMESPACE;
use orkest_parser::{
    parse_events, parse_process, CompileError, EndElement, ParseError, ParseErrorKind,
    StartElement, XmlEvent,
};
use pretty_assertions::assert_eq;

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

/// Parse a source that must fail and return its diagnostic.
fn parse_err(xml: &str) -> ParseError {
    match parse_process(xml) {
        Err(CompileError::Parse(err)) => err,
        Err(other) => panic!("expected a parse diagnostic, got {other}"),
        Ok(process) => panic!("expected a failure, parsed {}", process.qname()),
    }
}

/// Wrap a body in a process element with the usual declarations.
fn process_with(body: &str) -> String {
    format!(
        r#"<process name="p" targetNamespace="urn:t"
         xmlns="{BPEL_NAMESPACE}"
         xmlns:ns1="urn:outer"
         xmlns:lns="urn:links">
{body}
</process>"#
    )
}

fn bpel(local: &str) -> QName {
    QName::new(BPEL_NAMESPACE, local)
}

fn as_scope(activity: &Activity) -> &Scope {
    match activity {
        Activity::Scope(scope) => scope,
        other => panic!("expected a scope, got {}", other.kind()),
    }
}

#[test]
fn test_order_fixture() {
    let process = parse_process(&load_fixture("order.bpel")).unwrap();

    assert_eq!(process.qname(), QName::new("urn:example:shop", "orderProcess"));
    assert!(process.exit_on_standard_fault);
    assert!(!process.suppress_join_failure);
    assert_eq!(process.line, 2);

    let links = &process.declarations.partner_links;
    assert_eq!(links.len(), 2);
    assert_eq!(
        links[0].partner_link_type,
        QName::new("http://example.com/links", "orderLT")
    );
    assert_eq!(links[0].my_role.as_deref(), Some("shop"));
    assert_eq!(links[1].initialize_partner_role, Some(true));

    let total = process.declarations.variable("total").unwrap();
    assert_eq!(
        total.variable_type,
        VariableType::Type(QName::new("http://www.w3.org/2001/XMLSchema", "decimal"))
    );

    let sets = &process.declarations.correlation_sets;
    let names: Vec<_> = sets.iter().map(|cs| cs.name.as_str()).collect();
    assert_eq!(names, vec!["orderCorrelation", "untyped"]);
    assert_eq!(
        sets[0].properties,
        Some(vec![
            QName::new("http://example.com/props", "orderId"),
            QName::new("http://x", "customerId"),
        ])
    );
    assert_eq!(sets[0].line, 19);
    assert_eq!(sets[1].properties, None);

    let activities: Vec<_> = process.activities().filter_map(Activity::name).collect();
    assert_eq!(
        activities,
        vec!["main", "receive", "fanOut", "ship", "invoice", "settle", "settleNow"]
    );

    let settle = process
        .activities()
        .find(|a| a.name() == Some("settle"))
        .map(as_scope)
        .unwrap();
    assert!(settle.isolated);
    assert!(settle.exit_on_standard_fault);
    assert_eq!(
        settle.declarations.correlation_set("settlement").unwrap().properties,
        Some(vec![QName::new("http://example.com/props", "settlementId")])
    );
}

#[test]
fn test_unknown_element_fixture() {
    let err = parse_err(&load_fixture("unknown_element.bpel"));
    assert_eq!(err.kind, ParseErrorKind::UnknownElement);
    assert_eq!(err.element_name(), "foo");
    assert_eq!(err.line, 4);
}

#[test]
fn test_missing_name_fixture() {
    let err = parse_err(&load_fixture("missing_name.bpel"));
    assert_eq!(err.element, Some(bpel("correlationSet")));
    assert_eq!(err.line, 5);
    assert_eq!(
        err.kind,
        ParseErrorKind::MissingAttribute {
            attribute: "name".to_string()
        }
    );
}

#[test]
fn test_prefix_rebinding_is_lexical() {
    let xml = process_with(
        r#"<sequence>
  <scope xmlns:ns1="urn:inner">
    <correlationSets>
      <correlationSet name="inner" properties="ns1:p"/>
    </correlationSets>
    <empty/>
  </scope>
  <scope>
    <correlationSets>
      <correlationSet name="sibling" properties="ns1:p"/>
    </correlationSets>
    <empty/>
  </scope>
</sequence>"#,
    );
    let process = parse_process(&xml).unwrap();

    let scopes: Vec<&Scope> = process.activity.children().iter().map(as_scope).collect();
    assert_eq!(
        scopes[0].declarations.correlation_sets[0].properties,
        Some(vec![QName::new("urn:inner", "p")])
    );
    assert_eq!(
        scopes[1].declarations.correlation_sets[0].properties,
        Some(vec![QName::new("urn:outer", "p")])
    );
}

#[test]
fn test_element_own_declaration_applies_to_its_attributes() {
    let xml = process_with(
        r#"<correlationSets>
  <correlationSet xmlns:q="urn:q" name="own" properties="q:p unprefixed"/>
</correlationSets>
<empty/>"#,
    );
    let process = parse_process(&xml).unwrap();
    assert_eq!(
        process.declarations.correlation_sets[0].properties,
        Some(vec![QName::new("urn:q", "p"), bpel("unprefixed")])
    );
}

#[test]
fn test_structural_mismatch_from_events() {
    let events = vec![
        XmlEvent::Start(
            StartElement::new(bpel("process"), 1)
                .with_attribute("name", "p")
                .with_attribute("targetNamespace", "urn:t"),
        ),
        XmlEvent::Start(StartElement::new(bpel("sequence"), 2)),
        XmlEvent::End(EndElement::new(bpel("flow"), 3)),
    ];
    let err = parse_events(&events).unwrap_err();
    assert_eq!(
        err.kind,
        ParseErrorKind::StructuralMismatch {
            expected: bpel("sequence"),
            found: bpel("flow"),
        }
    );
    assert_eq!(err.line, 3);
}

#[test]
fn test_truncated_stream_is_incomplete() {
    let events = vec![XmlEvent::Start(
        StartElement::new(bpel("process"), 1)
            .with_attribute("name", "p")
            .with_attribute("targetNamespace", "urn:t"),
    )];
    assert_eq!(parse_events(&events).unwrap_err().kind, ParseErrorKind::Incomplete);
}

#[test]
fn test_root_must_be_process() {
    let xml = format!(r#"<sequence xmlns="{BPEL_NAMESPACE}"><empty/></sequence>"#);
    assert_eq!(parse_err(&xml).kind, ParseErrorKind::NotAProcess);
}

#[test]
fn test_foreign_namespace_root_is_unknown() {
    let err = parse_err(r#"<process xmlns="urn:other" name="p" targetNamespace="urn:t"/>"#);
    assert_eq!(err.kind, ParseErrorKind::UnknownElement);
    assert_eq!(err.element, Some(QName::new("urn:other", "process")));
}

#[test]
fn test_malformed_xml() {
    assert!(matches!(
        parse_process("<process><empty></process>"),
        Err(CompileError::XmlParse(_))
    ));
}

#[test]
fn test_process_requires_target_namespace() {
    let xml = format!(r#"<process xmlns="{BPEL_NAMESPACE}" name="p"><empty/></process>"#);
    assert_eq!(
        parse_err(&xml).kind,
        ParseErrorKind::MissingAttribute {
            attribute: "targetNamespace".to_string()
        }
    );
}

#[test]
fn test_missing_activity() {
    let err = parse_err(&process_with("<variables/>"));
    assert_eq!(err.kind, ParseErrorKind::MissingActivity);
    assert_eq!(err.element_name(), "process");
}

#[test]
fn test_multiple_activities() {
    let err = parse_err(&process_with("<empty/>\n<empty name=\"second\"/>"));
    assert_eq!(err.kind, ParseErrorKind::MultipleActivities);
    assert_eq!(err.line, 6);
}

#[test]
fn test_declarations_after_activity() {
    let err = parse_err(&process_with("<empty/>\n<variables/>"));
    assert_eq!(
        err.kind,
        ParseErrorKind::UnexpectedChild {
            parent: bpel("process")
        }
    );
}

#[test]
fn test_repeated_container() {
    let err = parse_err(&process_with("<variables/>\n<variables/>\n<empty/>"));
    assert!(matches!(err.kind, ParseErrorKind::UnexpectedChild { .. }));
    assert_eq!(err.line, 6);
}

#[test]
fn test_correlation_set_outside_container() {
    let err = parse_err(&process_with(r#"<correlationSet name="cs"/><empty/>"#));
    assert_eq!(
        err.kind,
        ParseErrorKind::UnexpectedChild {
            parent: bpel("process")
        }
    );
    assert_eq!(err.element_name(), "correlationSet");
}

#[test]
fn test_duplicate_correlation_set() {
    let err = parse_err(&process_with(
        r#"<correlationSets>
  <correlationSet name="cs"/>
  <correlationSet name="cs" properties="ns1:a"/>
</correlationSets>
<empty/>"#,
    ));
    assert_eq!(
        err.kind,
        ParseErrorKind::DuplicateName {
            what: "correlation set",
            name: "cs".to_string()
        }
    );
    assert_eq!(err.line, 7);
}

#[test]
fn test_isolated_scope_nesting() {
    let err = parse_err(&process_with(
        r#"<scope isolated="yes">
  <sequence>
    <scope isolated="yes"><empty/></scope>
  </sequence>
</scope>"#,
    ));
    assert!(matches!(err.kind, ParseErrorKind::InvalidNesting { .. }));
    assert_eq!(err.line, 7);

    // Non-isolated scopes nest freely inside an isolated one.
    assert!(parse_process(&process_with(
        r#"<scope isolated="yes"><scope><empty/></scope></scope>"#
    ))
    .is_ok());
}

#[test]
fn test_exit_on_standard_fault_inheritance() {
    let xml = format!(
        r#"<process name="p" targetNamespace="urn:t" exitOnStandardFault="yes"
         xmlns="{BPEL_NAMESPACE}">
  <scope name="outer">
    <scope name="override" exitOnStandardFault="no">
      <scope name="inner"><empty/></scope>
    </scope>
  </scope>
</process>"#
    );
    let process = parse_process(&xml).unwrap();
    let flags: Vec<_> = process
        .activities()
        .filter_map(|a| match a {
            Activity::Scope(scope) => Some((scope.name.as_deref(), scope.exit_on_standard_fault)),
            _ => None,
        })
        .collect();
    assert_eq!(
        flags,
        vec![
            (Some("outer"), true),
            (Some("override"), false),
            (Some("inner"), false),
        ]
    );
}

#[test]
fn test_variable_type_combinations() {
    let both = parse_err(&process_with(
        r#"<variables><variable name="v" type="ns1:t" element="ns1:e"/></variables><empty/>"#,
    ));
    assert!(matches!(
        both.kind,
        ParseErrorKind::InvalidAttributeCombination { .. }
    ));

    let none = parse_err(&process_with(
        r#"<variables><variable name="v"/></variables><empty/>"#,
    ));
    assert!(matches!(
        none.kind,
        ParseErrorKind::InvalidAttributeCombination { .. }
    ));

    let process = parse_process(&process_with(
        r#"<variables><variable name="v" element="ns1:e"/></variables><empty/>"#,
    ))
    .unwrap();
    assert_eq!(
        process.declarations.variables[0].variable_type,
        VariableType::Element(QName::new("urn:outer", "e"))
    );
}

#[test]
fn test_partner_link_roles() {
    let no_role = parse_err(&process_with(
        r#"<partnerLinks><partnerLink name="pl" partnerLinkType="lns:lt"/></partnerLinks><empty/>"#,
    ));
    assert!(matches!(
        no_role.kind,
        ParseErrorKind::InvalidAttributeCombination { .. }
    ));

    let init_without_partner = parse_err(&process_with(
        r#"<partnerLinks>
  <partnerLink name="pl" partnerLinkType="lns:lt" myRole="me" initializePartnerRole="no"/>
</partnerLinks>
<empty/>"#,
    ));
    assert!(matches!(
        init_without_partner.kind,
        ParseErrorKind::InvalidAttributeCombination { .. }
    ));

    let unbound = parse_err(&process_with(
        r#"<partnerLinks><partnerLink name="pl" partnerLinkType="zz:lt" myRole="me"/></partnerLinks><empty/>"#,
    ));
    assert!(matches!(
        unbound.kind,
        ParseErrorKind::MalformedAttributeValue { ref attribute, ref detail }
            if attribute == "partnerLinkType" && detail.contains("'zz'")
    ));
}

#[test]
fn test_invalid_yes_no() {
    let err = parse_err(&process_with(r#"<scope isolated="true"><empty/></scope>"#));
    assert!(matches!(
        err.kind,
        ParseErrorKind::MalformedAttributeValue { ref attribute, .. } if attribute == "isolated"
    ));
}

#[test]
fn test_diagnostic_display() {
    let err = parse_err(&load_fixture("unknown_element.bpel"));
    assert_eq!(
        err.to_string(),
        format!("line 4: <{{{BPEL_NAMESPACE}}}foo>: no handler for element")
    );
}

#[test]
fn test_independent_parses_on_separate_threads() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let xml = format!(
                    r#"<process name="p{i}" targetNamespace="urn:t{i}"
         xmlns="{BPEL_NAMESPACE}" xmlns:ns1="urn:props{i}">
  <correlationSets>
    <correlationSet name="cs{i}" properties="ns1:key {{urn:fixed}}k{i}"/>
  </correlationSets>
  <sequence name="main{i}"><empty/></sequence>
</process>"#
                );
                parse_process(&xml)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let process = handle.join().unwrap().unwrap();
        assert_eq!(process.qname(), QName::new(format!("urn:t{i}"), format!("p{i}")));
        let cs = &process.declarations.correlation_sets[0];
        assert_eq!(cs.name, format!("cs{i}"));
        assert_eq!(
            cs.properties,
            Some(vec![
                QName::new(format!("urn:props{i}"), "key"),
                QName::new("urn:fixed", format!("k{i}")),
            ])
        );
        assert_eq!(process.activity.name(), Some(format!("main{i}").as_str()));
    }

    // A failing parse on one thread does not disturb the others.
    let bad = std::thread::spawn(|| parse_process(&process_with("<foo/>")));
    let good = std::thread::spawn(|| parse_process(&process_with("<empty/>")));
    assert!(bad.join().unwrap().is_err());
    assert!(good.join().unwrap().is_ok());
}
