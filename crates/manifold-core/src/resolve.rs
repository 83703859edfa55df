use crate::graph::{DependencyGraph, GraphError};
use crate::registry::UnitRegistry;
use crate::unit::{NamedUnit, Unit};
use crate::CoreError;
use manifold_schema::{FileSet, UnitId};
use manifold_store::Storage;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DependencyError {
    #[error("unit '{0}' has not been resolved")]
    NotResolved(UnitId),
    #[error("unit '{unit}' is not a {expected}")]
    TypeMismatch { unit: UnitId, expected: &'static str },
    #[error("unit '{0}' was resolved without content")]
    Incomplete(UnitId),
    #[error("unit '{unit}' holds PEM data that is not valid UTF-8: {source}")]
    InvalidPem {
        unit: UnitId,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// Resolved unit instances of one pass, keyed by identity.
///
/// Instances are shared behind `Arc`, so every consumer of a unit observes the
/// very same instance.
#[derive(Clone, Default)]
pub struct DependencySet {
    units: BTreeMap<UnitId, Arc<dyn Unit>>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: NamedUnit>(&self) -> Result<&T, DependencyError> {
        self.get_as::<T>(T::ID)
    }

    /// Typed lookup for unit types registered under several ids.
    pub fn get_as<T: Unit>(&self, id: &str) -> Result<&T, DependencyError> {
        self.get_dyn(id)?
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| DependencyError::TypeMismatch {
                unit: UnitId::new(id),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn get_dyn(&self, id: &str) -> Result<&dyn Unit, DependencyError> {
        self.units
            .get(id)
            .map(|unit| &**unit)
            .ok_or_else(|| DependencyError::NotResolved(UnitId::new(id)))
    }

    pub fn get_arc(&self, id: &str) -> Option<Arc<dyn Unit>> {
        self.units.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &UnitId> {
        self.units.keys()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub(crate) fn insert(&mut self, id: UnitId, unit: Arc<dyn Unit>) {
        self.units.insert(id, unit);
    }

    /// The instances named by `ids`, sharing the same `Arc`s.
    pub fn subset(&self, ids: &[UnitId]) -> Result<Self, DependencyError> {
        let mut units = BTreeMap::new();
        for id in ids {
            let unit = self
                .get_arc(id)
                .ok_or_else(|| DependencyError::NotResolved(id.clone()))?;
            units.insert(id.clone(), unit);
        }
        Ok(Self { units })
    }

    /// Persist the files of the given units, in canonical order.
    pub fn write_files(&self, storage: &dyn Storage, ids: &[UnitId]) -> Result<usize, CoreError> {
        let mut files = Vec::new();
        for id in ids {
            files.extend(self.get_dyn(id)?.files());
        }
        let files = FileSet::from_files(files)?;
        storage.write_all(&files)?;
        Ok(files.len())
    }
}

impl std::fmt::Debug for DependencySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.units.keys()).finish()
    }
}

/// Fetches units through the dependency graph, generating each at most once.
///
/// The whole graph is validated when the resolver is built, so a cycle or a
/// dangling dependency fails before any unit is generated.
pub struct Resolver<'a> {
    registry: &'a UnitRegistry,
    graph: DependencyGraph,
    storage: Option<&'a dyn Storage>,
    resolved: DependencySet,
    generated: Vec<UnitId>,
    loaded: Vec<UnitId>,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a UnitRegistry) -> Result<Self, CoreError> {
        let graph = registry.graph();
        graph.validate()?;
        Ok(Self {
            registry,
            graph,
            storage: None,
            resolved: DependencySet::new(),
            generated: Vec::new(),
            loaded: Vec::new(),
        })
    }

    /// Try `Unit::load` against `storage` before generating anything.
    #[must_use]
    pub fn with_storage(mut self, storage: &'a dyn Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Seed an instance supplied by the caller; it counts as resolved.
    ///
    /// A unit already resolved in this pass cannot be replaced.
    pub fn provide<T: NamedUnit>(&mut self, unit: T) -> Result<(), CoreError> {
        if !self.graph.contains(T::ID) {
            return Err(GraphError::UnknownUnit(T::unit_id()).into());
        }
        if self.resolved.contains(T::ID) {
            return Err(CoreError::AlreadyResolved(T::unit_id()));
        }
        debug!("using provided {}", unit.name());
        self.resolved.insert(T::unit_id(), Arc::new(unit));
        Ok(())
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Units generated in this pass, in generation order.
    pub fn generated(&self) -> &[UnitId] {
        &self.generated
    }

    /// Units reconstructed from storage in this pass.
    pub fn loaded(&self) -> &[UnitId] {
        &self.loaded
    }

    /// Resolve `targets` and everything they need. Returns every instance
    /// resolved so far in this pass.
    pub fn resolve(&mut self, targets: &[UnitId]) -> Result<DependencySet, CoreError> {
        for target in targets {
            self.fetch(target)?;
        }
        Ok(self.resolved.clone())
    }

    /// Memoized fetch of a single unit.
    pub fn fetch(&mut self, id: &str) -> Result<Arc<dyn Unit>, CoreError> {
        if let Some(unit) = self.resolved.get_arc(id) {
            return Ok(unit);
        }

        let unit_id = UnitId::new(id);
        let mut unit = self.registry.create(id)?;

        if let Some(storage) = self.storage {
            let found = unit.load(storage).map_err(|source| CoreError::Resolution {
                unit: unit_id.clone(),
                source,
            })?;
            if found {
                info!("loaded {} from storage", unit.name());
                return Ok(self.commit(unit_id, unit, false));
            }
        }

        let deps = self.graph.dependencies_of(id).to_vec();
        for dep in &deps {
            self.fetch(dep)?;
        }
        let parents = self.resolved.subset(&deps)?;

        debug!("generating {}", unit.name());
        unit.generate(&parents)
            .map_err(|source| CoreError::Resolution {
                unit: unit_id.clone(),
                source,
            })?;
        Ok(self.commit(unit_id, unit, true))
    }

    fn commit(&mut self, id: UnitId, unit: Box<dyn Unit>, generated: bool) -> Arc<dyn Unit> {
        let unit: Arc<dyn Unit> = Arc::from(unit);
        if generated {
            self.generated.push(id.clone());
        } else {
            self.loaded.push(id.clone());
        }
        self.resolved.insert(id, Arc::clone(&unit));
        unit
    }
}
