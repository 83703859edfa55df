use crate::context::TemplateContext;
use crate::render::{render, FunctionTable, TemplateError};
use crate::resolve::{DependencyError, DependencySet};
use crate::unit::{NamedUnit, Unit, UnitError};
use crate::units::{
    bootkube_ids, BootkubeTemplate, ClusterIdUnit, DnsConfig, EtcdCa, EtcdClientCertKey,
    InfrastructureConfig, IngressCertKey, IngressConfig, InstallConfigUnit, KubeCa,
    KubeletCertKey, McsCertKey, NetworkConfig, RootCa, ServiceServingCa, TemplateMode, BOOTKUBE,
};
use manifold_schema::{
    config_map, ConfigurationObject, File, FileSet, FileSetError, ObjectError, UnitId,
};
use manifold_store::Storage;
use std::any::Any;
use thiserror::Error;
use tracing::{debug, info};

/// Directory every assembled manifest is written under.
pub const MANIFEST_DIR: &str = "manifests";

/// Location of the cluster config map; its presence marks a completed assembly.
pub const CLUSTER_CONFIG_PATH: &str = "manifests/cluster-config.yaml";

const CLUSTER_CONFIG_NAMESPACE: &str = "kube-system";
const CLUSTER_CONFIG_NAME: &str = "cluster-config-v1";
const INSTALL_CONFIG_KEY: &str = "install-config";

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error("failed to create kube-system/cluster-config-v1 configmap: {0}")]
    Serialization(#[source] ObjectError),
    #[error("failed to render '{unit}': {source}")]
    Render {
        unit: UnitId,
        #[source]
        source: TemplateError,
    },
    #[error("invalid manifest set: {0}")]
    FileSet(#[from] FileSetError),
}

/// The cluster config map plus every manifest file, sorted by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub cluster_config: ConfigurationObject,
    pub files: FileSet,
}

/// Build the full manifest set from resolved dependencies.
///
/// Nothing is returned unless every file was produced.
pub fn assemble(
    parents: &DependencySet,
    functions: &FunctionTable,
) -> Result<Assembly, AssemblyError> {
    let install = parents.get::<InstallConfigUnit>()?;
    let cluster_config = config_map(
        CLUSTER_CONFIG_NAMESPACE,
        CLUSTER_CONFIG_NAME,
        [(INSTALL_CONFIG_KEY.to_owned(), install.yaml()?.to_owned())],
    );
    let anchor = cluster_config
        .to_yaml()
        .map_err(AssemblyError::Serialization)?;

    let mut files = vec![File::new(CLUSTER_CONFIG_PATH, anchor)];

    let context = TemplateContext::from_dependencies(parents)?;
    for spec in BOOTKUBE {
        let template = parents.get_as::<BootkubeTemplate>(spec.id)?.template()?;
        let data = match spec.mode {
            TemplateMode::Rendered => render(spec.output, template, &context, functions)
                .map_err(|source| AssemblyError::Render {
                    unit: UnitId::new(spec.id),
                    source,
                })?,
            TemplateMode::Verbatim => template.to_vec(),
        };
        debug!("assembled {}", spec.output);
        files.push(File::new(format!("{MANIFEST_DIR}/{}", spec.output), data));
    }

    files.push(parents.get::<IngressConfig>()?.file()?.clone());
    files.push(parents.get::<DnsConfig>()?.file()?.clone());
    files.push(parents.get::<NetworkConfig>()?.file()?.clone());
    files.push(parents.get::<InfrastructureConfig>()?.file()?.clone());

    let files = FileSet::from_files(files)?;
    info!("assembled {} manifests", files.len());
    Ok(Assembly {
        cluster_config,
        files,
    })
}

/// Every manifest to be installed for the cluster.
#[derive(Debug, Clone, Default)]
pub struct Manifests {
    cluster_config: Option<ConfigurationObject>,
    files: FileSet,
}

impl Manifests {
    pub fn cluster_config(&self) -> Option<&ConfigurationObject> {
        self.cluster_config.as_ref()
    }

    pub fn file_set(&self) -> &FileSet {
        &self.files
    }

    fn set(&mut self, assembly: Assembly) {
        self.cluster_config = Some(assembly.cluster_config);
        self.files = assembly.files;
    }
}

impl Unit for Manifests {
    fn name(&self) -> &str {
        "Common Manifests"
    }

    fn dependencies(&self) -> Vec<UnitId> {
        let mut deps = vec![
            ClusterIdUnit::unit_id(),
            InstallConfigUnit::unit_id(),
            IngressConfig::unit_id(),
            DnsConfig::unit_id(),
            InfrastructureConfig::unit_id(),
            NetworkConfig::unit_id(),
            RootCa::unit_id(),
            EtcdCa::unit_id(),
            IngressCertKey::unit_id(),
            KubeCa::unit_id(),
            ServiceServingCa::unit_id(),
            EtcdClientCertKey::unit_id(),
            McsCertKey::unit_id(),
            KubeletCertKey::unit_id(),
        ];
        deps.extend(bootkube_ids());
        deps
    }

    fn generate(&mut self, parents: &DependencySet) -> Result<(), UnitError> {
        let assembly = assemble(parents, &FunctionTable::standard())?;
        self.set(assembly);
        Ok(())
    }

    fn files(&self) -> Vec<File> {
        self.files.as_slice().to_vec()
    }

    fn load(&mut self, storage: &dyn Storage) -> Result<bool, UnitError> {
        match crate::load::load(storage)? {
            Some(assembly) => {
                self.set(assembly);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NamedUnit for Manifests {
    const ID: &'static str = "manifests";
}
