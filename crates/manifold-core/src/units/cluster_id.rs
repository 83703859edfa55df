use crate::resolve::{DependencyError, DependencySet};
use crate::unit::{NamedUnit, Unit, UnitError};
use manifold_schema::{ClusterId, UnitId};
use std::any::Any;
use tracing::debug;
use uuid::Uuid;

/// Random identity of the cluster, handed to the version operator.
#[derive(Debug, Clone, Default)]
pub struct ClusterIdUnit {
    id: Option<ClusterId>,
}

impl ClusterIdUnit {
    /// Fixed identity, for callers that already have one.
    pub fn with_id(id: impl Into<ClusterId>) -> Self {
        Self {
            id: Some(id.into()),
        }
    }

    pub fn cluster_id(&self) -> Result<&ClusterId, DependencyError> {
        self.id
            .as_ref()
            .ok_or_else(|| DependencyError::Incomplete(Self::unit_id()))
    }
}

impl Unit for ClusterIdUnit {
    fn name(&self) -> &str {
        "Cluster ID"
    }

    fn dependencies(&self) -> Vec<UnitId> {
        Vec::new()
    }

    fn generate(&mut self, _parents: &DependencySet) -> Result<(), UnitError> {
        let id = ClusterId::new(Uuid::new_v4().to_string());
        debug!("generated cluster id {id}");
        self.id = Some(id);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NamedUnit for ClusterIdUnit {
    const ID: &'static str = "cluster-id";
}
