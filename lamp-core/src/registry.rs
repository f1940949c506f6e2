//! Identifier Registry - platform identifiers to output lines.
//!
//! Built once from configuration and never mutated. Each binding carries its
//! identifier and handle together, so there is no positional coupling between
//! separate identifier and pin lists.

use lamp_types::{ActuatorHandle, ExternalId};
use std::collections::HashMap;
use thiserror::Error;

/// Registry construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same identifier was configured twice.
    #[error("duplicate external id {0}")]
    DuplicateId(ExternalId),

    /// Two identifiers were bound to the same output line.
    #[error("{handle} bound to both {first} and {second}")]
    DuplicateHandle {
        /// The shared handle.
        handle: ActuatorHandle,
        /// Identifier that claimed the handle first.
        first: ExternalId,
        /// Identifier that tried to claim it again.
        second: ExternalId,
    },
}

/// One (identifier, handle) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Platform identifier.
    pub external_id: ExternalId,
    /// Local output line.
    pub handle: ActuatorHandle,
}

/// Static map from identifiers to handles, one handle per identifier.
///
/// Iteration follows configuration order.
#[derive(Debug, Clone, Default)]
pub struct IdentifierRegistry {
    bindings: Vec<Binding>,
    by_id: HashMap<ExternalId, usize>,
    by_handle: HashMap<ActuatorHandle, usize>,
}

impl IdentifierRegistry {
    /// Build a registry from (identifier, handle) pairs.
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate identifier or duplicate handle.
    pub fn new<I>(pairs: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (ExternalId, ActuatorHandle)>,
    {
        let mut registry = Self::default();

        for (external_id, handle) in pairs {
            if registry.by_id.contains_key(&external_id) {
                return Err(RegistryError::DuplicateId(external_id));
            }
            if let Some(&idx) = registry.by_handle.get(&handle) {
                return Err(RegistryError::DuplicateHandle {
                    handle,
                    first: registry.bindings[idx].external_id.clone(),
                    second: external_id,
                });
            }

            let idx = registry.bindings.len();
            registry.by_id.insert(external_id.clone(), idx);
            registry.by_handle.insert(handle, idx);
            registry.bindings.push(Binding {
                external_id,
                handle,
            });
        }

        Ok(registry)
    }

    /// Resolve an identifier to its handle. `None` means not found.
    pub fn resolve(&self, external_id: &ExternalId) -> Option<ActuatorHandle> {
        self.by_id
            .get(external_id)
            .map(|&idx| self.bindings[idx].handle)
    }

    /// Iterate bindings in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Iterate identifiers in configuration order.
    pub fn ids(&self) -> impl Iterator<Item = &ExternalId> {
        self.bindings.iter().map(|b| &b.external_id)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ExternalId {
        ExternalId::new(s).unwrap()
    }

    fn sample() -> IdentifierRegistry {
        IdentifierRegistry::new([
            (id("L026"), ActuatorHandle::new(13)),
            (id("L001"), ActuatorHandle::new(14)),
            (id("L002"), ActuatorHandle::new(27)),
        ])
        .unwrap()
    }

    #[test]
    fn resolves_known_ids() {
        let registry = sample();
        assert_eq!(registry.resolve(&id("L026")), Some(ActuatorHandle::new(13)));
        assert_eq!(registry.resolve(&id("L002")), Some(ActuatorHandle::new(27)));
    }

    #[test]
    fn unknown_id_is_none() {
        let registry = sample();
        assert_eq!(registry.resolve(&id("L999")), None);
        assert_eq!(registry.resolve(&id("l026")), None);
    }

    #[test]
    fn iteration_follows_configuration_order() {
        let registry = sample();
        let ids: Vec<&str> = registry.ids().map(ExternalId::as_str).collect();
        assert_eq!(ids, vec!["L026", "L001", "L002"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_id_rejected() {
        let err = IdentifierRegistry::new([
            (id("L026"), ActuatorHandle::new(13)),
            (id("L026"), ActuatorHandle::new(14)),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId(id("L026")));
    }

    #[test]
    fn duplicate_handle_rejected() {
        let err = IdentifierRegistry::new([
            (id("L026"), ActuatorHandle::new(13)),
            (id("L001"), ActuatorHandle::new(13)),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateHandle {
                handle: ActuatorHandle::new(13),
                first: id("L026"),
                second: id("L001"),
            }
        );
    }

    #[test]
    fn empty_registry() {
        let registry = IdentifierRegistry::new(Vec::new()).unwrap();
        assert!(registry.is_empty());
    }
}
