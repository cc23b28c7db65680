//! Purpose: Push-SDK capability consumed by the tracking flow.
//! Exports: `PushSdk`.
//! Role: Injected interface standing in for the vendor's page-level SDK.
//! Invariants: The flow depends on this trait only, never a global handle.

use crate::core::error::Error;
use serde_json::Value;

pub trait PushSdk {
    /// Bootstraps the SDK with a vendor-shaped configuration object.
    fn initialize(&self, config: &Value) -> Result<(), Error>;

    /// Returns the current player identifier, or `None` when the SDK has
    /// not assigned one yet. Absence is not an error.
    fn resolve_identifier(&self) -> Result<Option<String>, Error>;
}

impl<S: PushSdk + ?Sized> PushSdk for &S {
    fn initialize(&self, config: &Value) -> Result<(), Error> {
        (**self).initialize(config)
    }

    fn resolve_identifier(&self) -> Result<Option<String>, Error> {
        (**self).resolve_identifier()
    }
}
