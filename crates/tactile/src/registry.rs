// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name-indexed driver catalogs.
//!
//! One registry per driver kind (layer, input, output). The intended
//! lifecycle is load-then-freeze: callers register drivers during startup
//! and stop mutating before pipelines begin operating. The internal lock
//! keeps lookups safe regardless.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::chain::LayerDriver;
use crate::error::{Error, Result};
use crate::input::InputDriver;
use crate::output::OutputDriver;

/// Catalog mapping driver names to immutable driver descriptors.
pub struct Registry<D: ?Sized> {
    kind: &'static str,
    drivers: RwLock<HashMap<String, Arc<D>>>,
}

pub type LayerRegistry = Registry<dyn LayerDriver>;
pub type InputRegistry = Registry<dyn InputDriver>;
pub type OutputRegistry = Registry<dyn OutputDriver>;

impl<D: ?Sized> Registry<D> {
    /// Create an empty catalog. `kind` is a label for log context
    /// (e.g. "layer", "input", "output").
    pub fn new(kind: &'static str) -> Self {
        Self { kind, drivers: RwLock::new(HashMap::new()) }
    }

    /// Register a driver under a non-empty, unused name.
    pub fn register(&self, name: &str, driver: Arc<D>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::EmptyDriverName);
        }
        let mut drivers = self.drivers.write();
        if drivers.contains_key(name) {
            return Err(Error::DuplicateDriver(name.to_owned()));
        }
        debug!(kind = self.kind, driver = name, "registering driver");
        drivers.insert(name.to_owned(), driver);
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> Result<()> {
        debug!(kind = self.kind, driver = name, "unregistering driver");
        match self.drivers.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(Error::UnknownDriver(name.to_owned())),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<D>> {
        self.drivers.read().get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.drivers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.drivers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<D: ?Sized> std::fmt::Debug for Registry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
