use manifold_schema::UnitId;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("unit '{0}' is registered more than once")]
    DuplicateUnit(UnitId),
    #[error("unknown unit '{0}'")]
    UnknownUnit(UnitId),
    #[error("unit '{required_by}' depends on unknown unit '{unit}'")]
    UnknownDependency { unit: UnitId, required_by: UnitId },
    #[error("cyclic dependency: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<UnitId> },
}

fn format_cycle(cycle: &[UnitId]) -> String {
    cycle
        .iter()
        .map(UnitId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Explicit dependency graph: unit id -> declared dependencies, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<UnitId, Vec<UnitId>>,
}

impl DependencyGraph {
    pub fn from_edges(edges: impl IntoIterator<Item = (UnitId, Vec<UnitId>)>) -> Self {
        Self {
            edges: edges.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// All units, in id order.
    pub fn units(&self) -> impl Iterator<Item = &UnitId> {
        self.edges.keys()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Declared dependencies of `id`; empty for unknown ids.
    pub fn dependencies_of(&self, id: &str) -> &[UnitId] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Units that declare a dependency on `id`.
    pub fn dependents_of(&self, id: &str) -> Vec<&UnitId> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.iter().any(|d| d == id))
            .map(|(unit, _)| unit)
            .collect()
    }

    /// Reject dangling edges and cycles.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (unit, deps) in &self.edges {
            if let Some(missing) = deps.iter().find(|d| !self.edges.contains_key(d.as_str())) {
                return Err(GraphError::UnknownDependency {
                    unit: missing.clone(),
                    required_by: unit.clone(),
                });
            }
        }
        let roots: Vec<UnitId> = self.edges.keys().cloned().collect();
        self.resolution_order(&roots).map(|_| ())
    }

    /// Dependency-first order covering `targets` and everything they need.
    /// Each unit appears once; ties follow declaration order, so the result
    /// is deterministic.
    pub fn resolution_order(&self, targets: &[UnitId]) -> Result<Vec<UnitId>, GraphError> {
        let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
        let mut path: Vec<&UnitId> = Vec::new();
        let mut order = Vec::new();
        for target in targets {
            if !self.edges.contains_key(target.as_str()) {
                return Err(GraphError::UnknownUnit(target.clone()));
            }
            self.visit(target, &mut marks, &mut path, &mut order)?;
        }
        Ok(order)
    }

    fn visit<'g>(
        &'g self,
        id: &'g UnitId,
        marks: &mut BTreeMap<&'g str, Mark>,
        path: &mut Vec<&'g UnitId>,
        order: &mut Vec<UnitId>,
    ) -> Result<(), GraphError> {
        match marks.get(id.as_str()) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|p| *p == id).unwrap_or(0);
                let mut cycle: Vec<UnitId> = path[start..].iter().map(|p| (*p).clone()).collect();
                cycle.push(id.clone());
                return Err(GraphError::CyclicDependency { cycle });
            }
            None => {}
        }

        let Some(deps) = self.edges.get(id.as_str()) else {
            let required_by = path.last().map_or_else(|| id.clone(), |p| (*p).clone());
            return Err(GraphError::UnknownDependency {
                unit: id.clone(),
                required_by,
            });
        };

        marks.insert(id.as_str(), Mark::Visiting);
        path.push(id);
        for dep in deps {
            self.visit(dep, marks, path, order)?;
        }
        path.pop();
        marks.insert(id.as_str(), Mark::Done);
        order.push(id.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> UnitId {
        UnitId::new(s)
    }

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        DependencyGraph::from_edges(
            edges
                .iter()
                .map(|(unit, deps)| (id(unit), deps.iter().map(|d| id(d)).collect())),
        )
    }

    #[test]
    fn order_is_dependency_first_and_unique() {
        let g = graph(&[
            ("manifests", &["etcd-client", "etcd-ca", "install-config"]),
            ("etcd-client", &["etcd-ca"]),
            ("etcd-ca", &["root-ca"]),
            ("root-ca", &[]),
            ("install-config", &[]),
        ]);
        let order = g.resolution_order(&[id("manifests")]).unwrap();
        assert_eq!(
            order,
            vec!["root-ca", "etcd-ca", "etcd-client", "install-config", "manifests"]
        );
    }

    #[test]
    fn order_only_covers_requested_subgraph() {
        let g = graph(&[("a", &["b"]), ("b", &[]), ("c", &[])]);
        assert_eq!(g.resolution_order(&[id("a")]).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn detects_cycle_and_names_it() {
        let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"]), ("d", &[])]);
        let err = g.validate().unwrap_err();
        assert_eq!(
            err,
            GraphError::CyclicDependency {
                cycle: vec![id("a"), id("b"), id("c"), id("a")]
            }
        );
        assert_eq!(err.to_string(), "cyclic dependency: a -> b -> c -> a");
    }

    #[test]
    fn detects_self_loop() {
        let g = graph(&[("a", &["a"])]);
        assert_eq!(
            g.validate().unwrap_err(),
            GraphError::CyclicDependency {
                cycle: vec![id("a"), id("a")]
            }
        );
    }

    #[test]
    fn cycle_reported_from_inner_node() {
        let g = graph(&[("top", &["x"]), ("x", &["y"]), ("y", &["x"])]);
        let err = g.resolution_order(&[id("top")]).unwrap_err();
        assert_eq!(
            err,
            GraphError::CyclicDependency {
                cycle: vec![id("x"), id("y"), id("x")]
            }
        );
    }

    #[test]
    fn rejects_unknown_dependency() {
        let g = graph(&[("a", &["ghost"])]);
        assert_eq!(
            g.validate().unwrap_err(),
            GraphError::UnknownDependency {
                unit: id("ghost"),
                required_by: id("a")
            }
        );
    }

    #[test]
    fn rejects_unknown_target() {
        let g = graph(&[("a", &[])]);
        assert_eq!(
            g.resolution_order(&[id("nope")]).unwrap_err(),
            GraphError::UnknownUnit(id("nope"))
        );
    }

    #[test]
    fn diamond_resolves_shared_dependency_once() {
        let g = graph(&[
            ("top", &["left", "right"]),
            ("left", &["shared"]),
            ("right", &["shared"]),
            ("shared", &[]),
        ]);
        let order = g.resolution_order(&[id("top")]).unwrap();
        assert_eq!(order, vec!["shared", "left", "right", "top"]);
        assert_eq!(g.dependents_of("shared"), vec!["left", "right"]);
    }
}
