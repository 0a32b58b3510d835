//! Attribute readers shared by the state constructors.

use orkest_model::{NamespaceContext, QName};

use crate::config::is_ncname;
use crate::error::{ParseError, ParseErrorKind};
use crate::event::StartElement;

pub(crate) fn missing(se: &StartElement, attribute: &str) -> ParseError {
    ParseError::new(
        se.name.clone(),
        se.line(),
        ParseErrorKind::MissingAttribute {
            attribute: attribute.to_string(),
        },
    )
}

pub(crate) fn malformed(se: &StartElement, attribute: &str, detail: impl Into<String>) -> ParseError {
    ParseError::new(
        se.name.clone(),
        se.line(),
        ParseErrorKind::MalformedAttributeValue {
            attribute: attribute.to_string(),
            detail: detail.into(),
        },
    )
}

pub(crate) fn combination(se: &StartElement, detail: impl Into<String>) -> ParseError {
    ParseError::new(
        se.name.clone(),
        se.line(),
        ParseErrorKind::InvalidAttributeCombination {
            detail: detail.into(),
        },
    )
}

pub(crate) fn required<'a>(se: &'a StartElement, attribute: &str) -> Result<&'a str, ParseError> {
    se.attributes
        .value_of(attribute)
        .ok_or_else(|| missing(se, attribute))
}

pub(crate) fn optional(se: &StartElement, attribute: &str) -> Option<String> {
    se.attributes.value_of(attribute).map(str::to_string)
}

/// A mandatory NCName attribute.
pub(crate) fn ncname(se: &StartElement, attribute: &str) -> Result<String, ParseError> {
    let value = required(se, attribute)?;
    check_ncname(se, attribute, value)
}

/// An optional NCName attribute.
pub(crate) fn optional_ncname(se: &StartElement, attribute: &str) -> Result<Option<String>, ParseError> {
    se.attributes
        .value_of(attribute)
        .map(|value| check_ncname(se, attribute, value))
        .transpose()
}

fn check_ncname(se: &StartElement, attribute: &str, value: &str) -> Result<String, ParseError> {
    if is_ncname(value) {
        Ok(value.to_string())
    } else {
        Err(malformed(se, attribute, format!("'{value}' is not an NCName")))
    }
}

/// A `yes`/`no` attribute.
pub(crate) fn yes_no(se: &StartElement, attribute: &str) -> Result<Option<bool>, ParseError> {
    match se.attributes.value_of(attribute) {
        None => Ok(None),
        Some("yes") => Ok(Some(true)),
        Some("no") => Ok(Some(false)),
        Some(other) => Err(malformed(
            se,
            attribute,
            format!("expected 'yes' or 'no', found '{other}'"),
        )),
    }
}

/// A QName-valued attribute resolved against the element's context.
pub(crate) fn optional_qname(
    se: &StartElement,
    nsc: &NamespaceContext,
    attribute: &str,
) -> Result<Option<QName>, ParseError> {
    se.attributes
        .value_of(attribute)
        .map(|value| {
            nsc.deref_qname(value.trim())
                .map_err(|err| malformed(se, attribute, err.to_string()))
        })
        .transpose()
}

pub(crate) fn qname(
    se: &StartElement,
    nsc: &NamespaceContext,
    attribute: &str,
) -> Result<QName, ParseError> {
    optional_qname(se, nsc, attribute)?.ok_or_else(|| missing(se, attribute))
}
