// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered registry of constructed sources.
//!
//! Sources are registered through a `SourceRegistryBuilder` in configuration
//! order. `build()` consumes the builder, so a finished `SourceRegistry` can
//! never gain or lose entries.

use std::collections::HashMap;
use std::sync::Arc;

use fwdd_core::{FwddError, Identity, Source};

/// One registered source with the identity it was registered under.
#[derive(Clone)]
pub struct SourceEntry {
    identity: Identity,
    source: Arc<dyn Source>,
}

impl SourceEntry {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn source(&self) -> &Arc<dyn Source> {
        &self.source
    }
}

impl std::fmt::Debug for SourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEntry")
            .field("identity", &self.identity)
            .field("plugin_type", &self.source.plugin_type())
            .finish()
    }
}

/// Collects sources before the registry is finalized.
#[derive(Default)]
pub struct SourceRegistryBuilder {
    entries: Vec<SourceEntry>,
    index: HashMap<Identity, usize>,
}

impl SourceRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `identity`.
    ///
    /// Fails with `DuplicateIdentity` if the identity is already taken. The
    /// source must report the same identity it is registered under.
    pub fn register(
        &mut self,
        identity: Identity,
        source: Arc<dyn Source>,
    ) -> Result<(), FwddError> {
        if self.index.contains_key(&identity) {
            return Err(FwddError::DuplicateIdentity { identity });
        }
        if source.identity() != &identity {
            return Err(FwddError::Internal(format!(
                "source reports identity `{}` but was registered as `{identity}`",
                source.identity()
            )));
        }
        self.index.insert(identity.clone(), self.entries.len());
        self.entries.push(SourceEntry { identity, source });
        Ok(())
    }

    /// Whether `identity` has already been registered.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.index.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finalize into an immutable registry.
    pub fn build(self) -> SourceRegistry {
        SourceRegistry {
            entries: self.entries,
            index: self.index,
        }
    }
}

/// Immutable, ordered set of `(Identity, Source)` pairs.
///
/// Iteration order is registration order; the input manager starts sources in
/// this order and stops them in reverse.
#[derive(Default)]
pub struct SourceRegistry {
    entries: Vec<SourceEntry>,
    index: HashMap<Identity, usize>,
}

impl SourceRegistry {
    pub fn builder() -> SourceRegistryBuilder {
        SourceRegistryBuilder::new()
    }

    /// A registry with no sources.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a source by identity.
    pub fn get(&self, identity: &Identity) -> Option<&Arc<dyn Source>> {
        self.index.get(identity).map(|&i| &self.entries[i].source)
    }

    /// Entries in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, SourceEntry> {
        self.entries.iter()
    }

    /// Entries as a slice, in registration order.
    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    /// Identities in registration order.
    pub fn identities(&self) -> Vec<&Identity> {
        self.entries.iter().map(|e| &e.identity).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a SourceRegistry {
    type Item = &'a SourceEntry;
    type IntoIter = std::slice::Iter<'a, SourceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}
