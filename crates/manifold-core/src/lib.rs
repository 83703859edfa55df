//! Core orchestration engine for Manifold asset generation.
//!
//! This crate ties the schema and storage layers together: units declare a
//! fixed list of dependencies which form an explicit `DependencyGraph`; the
//! `Resolver` fetches each unit exactly once per pass (loading it from storage
//! when a previous run already produced it); the template renderer evaluates
//! bootstrap templates against a `TemplateContext` with an explicit
//! `FunctionTable`; and the `Manifests` unit assembles everything into one
//! sorted `FileSet` that `load` can later reconstruct from storage.

pub mod assemble;
pub mod context;
pub mod graph;
pub mod load;
pub mod registry;
pub mod render;
pub mod resolve;
pub mod unit;
pub mod units;

#[cfg(test)]
pub(crate) mod test_units;

pub use assemble::{assemble, Assembly, AssemblyError, Manifests, CLUSTER_CONFIG_PATH, MANIFEST_DIR};
pub use context::{etcd_endpoint_hostnames, TemplateContext};
pub use graph::{DependencyGraph, GraphError};
pub use load::{load, LoadError};
pub use registry::UnitRegistry;
pub use render::{render, FunctionTable, TemplateError};
pub use resolve::{DependencyError, DependencySet, Resolver};
pub use unit::{NamedUnit, Unit, UnitError};

use manifold_schema::{FileSetError, UnitId};
use manifold_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("dependency graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("failed to resolve unit '{unit}': {source}")]
    Resolution {
        unit: UnitId,
        #[source]
        source: UnitError,
    },
    #[error("unit '{0}' is already resolved in this pass")]
    AlreadyResolved(UnitId),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error("invalid file set: {0}")]
    FileSet(#[from] FileSetError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
