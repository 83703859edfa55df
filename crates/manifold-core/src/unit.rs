use crate::assemble::AssemblyError;
use crate::load::LoadError;
use crate::resolve::{DependencyError, DependencySet};
use manifold_schema::{File, InstallConfigError, UnitId};
use manifold_store::{Storage, StoreError};
use std::any::Any;
use thiserror::Error;

/// Failure inside a single unit's `generate` or `load`.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error("install config: {0}")]
    InstallConfig(#[from] InstallConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to serialize document: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("{0}")]
    Invalid(String),
}

/// A named generation step.
///
/// The dependency list is fixed for a unit type: it must not depend on
/// runtime state, because the resolver reads it once to build the graph.
pub trait Unit: Any + Send + Sync {
    /// Human friendly name, used in logs.
    fn name(&self) -> &str;

    fn dependencies(&self) -> Vec<UnitId>;

    /// Produce this unit's content. `parents` holds exactly the declared
    /// dependencies, already resolved.
    fn generate(&mut self, parents: &DependencySet) -> Result<(), UnitError>;

    /// Files this unit persists.
    fn files(&self) -> Vec<File> {
        Vec::new()
    }

    /// Reconstruct this unit from storage without generating it.
    ///
    /// Returns `Ok(false)` when storage holds nothing for this unit; that is
    /// the normal first-run case, not an error.
    fn load(&mut self, _storage: &dyn Storage) -> Result<bool, UnitError> {
        Ok(false)
    }

    fn as_any(&self) -> &dyn Any;
}

/// A unit type with a static identity, so it can be registered and looked up by type.
pub trait NamedUnit: Unit + Default {
    const ID: &'static str;

    fn unit_id() -> UnitId {
        UnitId::new(Self::ID)
    }
}
