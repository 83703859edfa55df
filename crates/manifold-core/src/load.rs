use crate::assemble::{Assembly, CLUSTER_CONFIG_PATH, MANIFEST_DIR};
use manifold_schema::{ConfigurationObject, FileSet, FileSetError, ObjectError};
use manifold_store::{Storage, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to parse {path}: {source}")]
    AnchorParse {
        path: String,
        #[source]
        source: ObjectError,
    },
    #[error("invalid stored manifest set: {0}")]
    FileSet(#[from] FileSetError),
}

/// Reconstruct a previous assembly from storage.
///
/// `Ok(None)` means there is nothing complete to reuse: either no manifests
/// at all, or manifests without the cluster config anchor. Callers then
/// regenerate.
pub fn load(storage: &dyn Storage) -> Result<Option<Assembly>, LoadError> {
    let files = storage.fetch_by_pattern(&format!("{MANIFEST_DIR}/*"))?;
    if files.is_empty() {
        debug!("no stored manifests");
        return Ok(None);
    }

    let Some(anchor) = files.iter().find(|f| f.path == CLUSTER_CONFIG_PATH) else {
        warn!(
            "found {} stored manifests but no {CLUSTER_CONFIG_PATH}; ignoring them",
            files.len()
        );
        return Ok(None);
    };
    let cluster_config =
        ConfigurationObject::from_yaml(&anchor.data).map_err(|source| LoadError::AnchorParse {
            path: CLUSTER_CONFIG_PATH.to_owned(),
            source,
        })?;

    let files = FileSet::from_files(files)?;
    info!("loaded {} manifests from storage", files.len());
    Ok(Some(Assembly {
        cluster_config,
        files,
    }))
}
