//! Registry configuration for WS-BPEL 2.0 executable processes.

use std::sync::LazyLock;

use orkest_model::QName;

use super::core::{StateFactory, StateRegistry};
use crate::config::BPEL_NAMESPACE;
use crate::state::StateKind;

static BPEL_REGISTRY: LazyLock<StateRegistry> = LazyLock::new(create_bpel_registry);

/// Create a registry with a factory for every element kind, in the
/// executable process namespace.
#[must_use]
pub fn create_bpel_registry() -> StateRegistry {
    let mut registry = StateRegistry::new();
    for kind in StateKind::ALL {
        registry.register(
            QName::new(BPEL_NAMESPACE, kind.element_name()),
            StateFactory::for_kind(kind),
        );
    }
    registry
}

/// The shared, immutable WS-BPEL registry.
#[must_use]
pub fn bpel_registry() -> &'static StateRegistry {
    &BPEL_REGISTRY
}
