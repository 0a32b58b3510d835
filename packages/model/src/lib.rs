//! Orkest object model.
//!
//! Typed, immutable representation of a compiled process definition, the
//! namespace machinery it depends on, and the envelope used to persist it.
//!
//! # Architecture
//!
//! - [`qname`]: Qualified names and Clark notation
//! - [`namespace`]: Lexically scoped, immutable namespace contexts
//! - [`process`]: Object-model node types (process, activities, declarations)
//! - [`envelope`]: Header plus body persistence format
//! - [`error`]: Error types and Result alias

pub mod envelope;
pub mod error;
pub mod namespace;
pub mod process;
pub mod qname;

pub use envelope::{HeaderValue, ProcessEnvelope, SerializationFormat, CURRENT_MAGIC_NUMBER};
pub use error::{ModelError, Result};
pub use namespace::{NamespaceContext, XML_NAMESPACE};
pub use process::{
    Activity, CorrelationSet, Declarations, Empty, Flow, PartnerLink, Process, Scope, Sequence,
    Variable, VariableType,
};
pub use qname::QName;
