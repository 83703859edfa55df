use crate::graph::{DependencyGraph, GraphError};
use crate::unit::{NamedUnit, Unit};
use manifold_schema::UnitId;
use std::collections::BTreeMap;

type Factory = Box<dyn Fn() -> Box<dyn Unit> + Send + Sync>;

/// Catalogue of every unit the resolver may instantiate, keyed by identity.
#[derive(Default)]
pub struct UnitRegistry {
    factories: BTreeMap<UnitId, Factory>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in unit.
    pub fn builtin() -> Result<Self, GraphError> {
        let mut registry = Self::new();
        crate::units::register_builtin(&mut registry)?;
        Ok(registry)
    }

    pub fn register<T: NamedUnit>(&mut self) -> Result<(), GraphError> {
        self.register_with(T::ID, || Box::new(T::default()))
    }

    /// Register a unit under an explicit id, for unit types shared by several ids.
    pub fn register_with<F>(&mut self, id: impl Into<UnitId>, factory: F) -> Result<(), GraphError>
    where
        F: Fn() -> Box<dyn Unit> + Send + Sync + 'static,
    {
        let id = id.into();
        if self.factories.contains_key(id.as_str()) {
            return Err(GraphError::DuplicateUnit(id));
        }
        self.factories.insert(id, Box::new(factory));
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &UnitId> {
        self.factories.keys()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Fresh, ungenerated instance of `id`.
    pub fn create(&self, id: &str) -> Result<Box<dyn Unit>, GraphError> {
        self.factories
            .get(id)
            .map(|factory| factory())
            .ok_or_else(|| GraphError::UnknownUnit(UnitId::new(id)))
    }

    /// Build the dependency graph from each unit's declared dependencies.
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::from_edges(
            self.factories
                .iter()
                .map(|(id, factory)| (id.clone(), factory().dependencies())),
        )
    }
}

impl std::fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}
