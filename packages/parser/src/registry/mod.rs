//! State registry for dispatching elements to their constructors.
//!
//! The registry maps a qualified element name to a [`StateFactory`]. It is
//! built once from a static table and only read afterwards, so any number
//! of parses may share it without locking.

mod config;
mod core;

pub use config::{bpel_registry, create_bpel_registry};
pub use core::{StateConstructor, StateFactory, StateRegistry};
