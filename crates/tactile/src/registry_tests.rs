// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::error::Error;
use crate::test_support::Identity;

use super::*;

#[test]
fn register_then_get_returns_same_driver() -> anyhow::Result<()> {
    let registry = LayerRegistry::new("layer");
    let driver: Arc<dyn LayerDriver> = Arc::new(Identity);

    registry.register("identity", Arc::clone(&driver))?;

    let found = registry.get("identity").ok_or_else(|| anyhow::anyhow!("driver missing"))?;
    assert!(Arc::ptr_eq(&found, &driver));
    Ok(())
}

#[test]
fn get_unknown_is_absent() {
    let registry = LayerRegistry::new("layer");
    assert!(registry.get("nope").is_none());
}

#[test]
fn duplicate_name_rejected() -> anyhow::Result<()> {
    let registry = LayerRegistry::new("layer");
    registry.register("identity", Arc::new(Identity))?;

    let err = registry.register("identity", Arc::new(Identity));
    assert!(matches!(err, Err(Error::DuplicateDriver(ref name)) if name == "identity"));
    assert_eq!(registry.len(), 1);
    Ok(())
}

#[test]
fn empty_name_rejected() {
    let registry = LayerRegistry::new("layer");
    let err = registry.register("", Arc::new(Identity));
    assert!(matches!(err, Err(Error::EmptyDriverName)));
    assert!(registry.is_empty());
}

#[test]
fn unregister_removes_driver() -> anyhow::Result<()> {
    let registry = LayerRegistry::new("layer");
    registry.register("identity", Arc::new(Identity))?;

    registry.unregister("identity")?;
    assert!(registry.get("identity").is_none());

    let err = registry.unregister("identity");
    assert!(matches!(err, Err(Error::UnknownDriver(ref name)) if name == "identity"));
    Ok(())
}

#[test]
fn names_are_sorted() -> anyhow::Result<()> {
    let registry = LayerRegistry::new("layer");
    registry.register("zeta", Arc::new(Identity))?;
    registry.register("alpha", Arc::new(Identity))?;

    assert_eq!(registry.names(), ["alpha", "zeta"]);
    Ok(())
}
