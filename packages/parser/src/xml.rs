//! XML event source.
//!
//! Walks a `roxmltree` document and flattens it into the start/end event
//! stream the state machine consumes. Text and comments are dropped; the
//! process language carries no meaning in mixed content at this level.

use orkest_model::{QName, XML_NAMESPACE};
use roxmltree::{Document, Node};

use crate::event::{Attributes, EndElement, SourceLocation, StartElement, XmlEvent};

/// Tokenize an XML document into parse events.
///
/// # Errors
/// Returns the tokenizer error if the input is not well-formed.
///
/// # Examples
/// ```
/// use orkest_parser::xml::events_from_str;
///
/// let events = events_from_str(r#"<a xmlns="urn:x"><b/></a>"#).unwrap();
/// assert_eq!(events.len(), 4);
/// ```
pub fn events_from_str(xml: &str) -> Result<Vec<XmlEvent>, roxmltree::Error> {
    let doc = Document::parse(xml)?;
    let mut events = Vec::new();
    push_element(&doc, doc.root_element(), &mut events);
    Ok(events)
}

fn push_element(doc: &Document<'_>, node: Node<'_, '_>, events: &mut Vec<XmlEvent>) {
    let name = element_name(node);
    let range = node.range();

    let mut attributes = Attributes::new();
    for attr in node.attributes() {
        attributes.push(
            QName::new(attr.namespace().unwrap_or_default(), attr.name()),
            attr.value(),
        );
    }

    events.push(XmlEvent::Start(StartElement {
        name: name.clone(),
        attributes,
        declarations: local_declarations(node),
        location: location(doc, range.start),
    }));

    for child in node.children().filter(Node::is_element) {
        push_element(doc, child, events);
    }

    events.push(XmlEvent::End(EndElement {
        name,
        location: location(doc, range.end),
    }));
}

/// Resolved name of an element.
pub fn element_name(node: Node<'_, '_>) -> QName {
    let tag = node.tag_name();
    QName::new(tag.namespace().unwrap_or_default(), tag.name())
}

/// Namespace declarations made on this element itself.
///
/// `roxmltree` only exposes the in-scope set, so a binding counts as local
/// when the parent element does not have the same prefix bound to the same
/// URI.
pub fn local_declarations(node: Node<'_, '_>) -> Vec<(String, String)> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    let mut declarations: Vec<(String, String)> = node
        .namespaces()
        .filter(|ns| !(ns.name() == Some("xml") && ns.uri() == XML_NAMESPACE))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| (ns.name().unwrap_or_default().to_string(), ns.uri().to_string()))
        .collect();

    // xmlns="" drops the default namespace from the in-scope set
    let inherits_default = inherited.iter().any(|(prefix, _)| prefix.is_none());
    if inherits_default && !node.namespaces().any(|ns| ns.name().is_none()) {
        declarations.push((String::new(), String::new()));
    }

    declarations
}

fn location(doc: &Document<'_>, pos: usize) -> SourceLocation {
    let text_pos = doc.text_pos_at(pos);
    SourceLocation::new(text_pos.row, text_pos.col)
}
