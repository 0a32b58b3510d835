//! Orkest Parser - Compile WS-BPEL process definitions.
//!
//! An element-driven state machine turns the start/end event stream of a
//! process document into the typed object model of [`orkest_model`]. Each
//! recognized element is dispatched through a [`registry::StateRegistry`]
//! to a [`state::State`], which validates its attributes, collects its
//! children and yields a finished node when the element closes.
//!
//! # Example
//!
//! ```
//! use orkest_parser::parse_process;
//!
//! let process = parse_process(r#"
//!     <process name="order" targetNamespace="urn:shop"
//!              xmlns="http://docs.oasis-open.org/wsbpel/2.0/process/executable">
//!       <empty/>
//!     </process>"#).unwrap();
//! assert_eq!(process.qname().to_string(), "{urn:shop}order");
//! ```
//!
//! # Architecture
//!
//! - [`event`]: Parse events (start/end element, attributes, locations)
//! - [`xml`]: Event source backed by `roxmltree`
//! - [`context`]: The parse context and its state stack
//! - [`registry`]: Element name to state factory dispatch
//! - [`state`]: One state per recognized element
//! - [`compile`]: Parse and wrap into a persisted envelope
//! - [`config`]: Constants and lexical validation
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod compile;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod registry;
pub mod state;
pub mod xml;

use orkest_model::Process;

pub use compile::{compile_file, compile_str, parse_header};
pub use context::{parse_document, ParseContext};
pub use error::{CompileError, ParseError, ParseErrorKind, Result};
pub use event::{EndElement, StartElement, XmlEvent};
pub use registry::{bpel_registry, StateFactory, StateRegistry};
pub use state::{Node, State, StateKind};

/// Parse an event stream whose root must be a `<process>`.
///
/// # Errors
/// Returns the first diagnostic of the parse.
pub fn parse_events<'e, I>(events: I) -> std::result::Result<Process, ParseError>
where
    I: IntoIterator<Item = &'e XmlEvent>,
{
    let mut pc = ParseContext::new(bpel_registry()).expect_root(StateKind::Process);
    for event in events {
        pc.handle(event)?;
    }
    match pc.finish()? {
        Node::Process(process) => Ok(process),
        // expect_root rules this out; report it rather than trust it
        _ => Err(ParseError::document(1, ParseErrorKind::NotAProcess)),
    }
}

/// Tokenize and parse a process document.
///
/// # Errors
/// Fails on malformed XML or an invalid process definition.
pub fn parse_process(xml: &str) -> Result<Process> {
    let events = xml::events_from_str(xml)?;
    Ok(parse_events(&events)?)
}
