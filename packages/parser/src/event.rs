//! Parse events delivered by the XML tokenizer.

use orkest_model::QName;

/// Position in the source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// One attribute of a start tag. Namespace declarations are not attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// Attributes of a start tag, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    pub fn push(&mut self, name: QName, value: impl Into<String>) {
        self.items.push(Attribute {
            name,
            value: value.into(),
        });
    }

    /// Whether an unqualified attribute with this local name is present.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.value_of(name).is_some()
    }

    /// Value of the unqualified attribute with this local name.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|a| a.name.is_unqualified() && a.name.local == name)
            .map(|a| a.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.push(QName::local(name), value);
        }
        attributes
    }
}

/// A start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    /// Resolved element name.
    pub name: QName,
    pub attributes: Attributes,
    /// `xmlns` declarations made on this element, as (prefix, uri) pairs.
    /// The default namespace uses the empty prefix.
    pub declarations: Vec<(String, String)>,
    pub location: SourceLocation,
}

impl StartElement {
    /// Create a start tag with no attributes or declarations.
    #[must_use]
    pub fn new(name: QName, line: u32) -> Self {
        Self {
            name,
            attributes: Attributes::new(),
            declarations: Vec::new(),
            location: SourceLocation::new(line, 1),
        }
    }

    /// Add an unqualified attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.push(QName::local(name), value);
        self
    }

    /// Add a namespace declaration.
    #[must_use]
    pub fn with_declaration(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.declarations.push((prefix.into(), uri.into()));
        self
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.location.line
    }
}

/// An end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement {
    pub name: QName,
    pub location: SourceLocation,
}

impl EndElement {
    #[must_use]
    pub fn new(name: QName, line: u32) -> Self {
        Self {
            name,
            location: SourceLocation::new(line, 1),
        }
    }
}

/// A single parse event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    Start(StartElement),
    End(EndElement),
}

impl XmlEvent {
    /// Element name carried by the event.
    #[must_use]
    pub fn name(&self) -> &QName {
        match self {
            XmlEvent::Start(se) => &se.name,
            XmlEvent::End(ee) => &ee.name,
        }
    }
}
