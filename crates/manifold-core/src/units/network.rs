//! Cluster-scoped `config.openshift.io/v1` documents derived from the install config.

use super::installconfig::InstallConfigUnit;
use crate::assemble::MANIFEST_DIR;
use crate::graph::GraphError;
use crate::registry::UnitRegistry;
use crate::resolve::{DependencyError, DependencySet};
use crate::unit::{NamedUnit, Unit, UnitError};
use manifold_schema::{File, InstallConfig, UnitId};
use manifold_store::Storage;
use serde::Serialize;
use std::any::Any;

const API_VERSION: &str = "config.openshift.io/v1";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigDocument<S: Serialize> {
    api_version: &'static str,
    kind: &'static str,
    metadata: Metadata,
    spec: S,
}

#[derive(Serialize)]
struct Metadata {
    name: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngressSpec {
    domain: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DnsSpec {
    base_domain: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InfrastructureSpec {
    platform: &'static str,
    api_server_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NetworkSpec {
    cluster_network: Vec<ClusterNetworkEntry>,
    service_network: Vec<String>,
    network_type: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClusterNetworkEntry {
    cidr: String,
    host_prefix: u8,
}

fn cluster_domain(config: &InstallConfig) -> String {
    format!("{}.{}", config.cluster_name(), config.base_domain)
}

fn ingress_spec(config: &InstallConfig) -> IngressSpec {
    IngressSpec {
        domain: format!("apps.{}", cluster_domain(config)),
    }
}

fn dns_spec(config: &InstallConfig) -> DnsSpec {
    DnsSpec {
        base_domain: cluster_domain(config),
    }
}

fn infrastructure_spec(config: &InstallConfig) -> InfrastructureSpec {
    InfrastructureSpec {
        platform: config.platform.as_str(),
        api_server_url: format!("https://api.{}:6443", cluster_domain(config)),
    }
}

fn network_spec(config: &InstallConfig) -> NetworkSpec {
    let net = &config.networking;
    NetworkSpec {
        cluster_network: vec![ClusterNetworkEntry {
            cidr: net.cluster_network_cidr.clone(),
            host_prefix: net.host_prefix,
        }],
        service_network: vec![net.service_network.clone()],
        network_type: net.network_type.clone(),
    }
}

macro_rules! config_unit {
    (
        $(#[$meta:meta])*
        $ty:ident, id = $id:literal, name = $name:literal, kind = $kind:literal,
        file = $file:literal, spec = $spec:path
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $ty {
            file: Option<File>,
        }

        impl $ty {
            /// Output path of the document.
            pub fn path() -> String {
                format!("{MANIFEST_DIR}/{}", $file)
            }

            pub fn file(&self) -> Result<&File, DependencyError> {
                self.file
                    .as_ref()
                    .ok_or_else(|| DependencyError::Incomplete(Self::unit_id()))
            }
        }

        impl Unit for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn dependencies(&self) -> Vec<UnitId> {
                vec![InstallConfigUnit::unit_id()]
            }

            fn generate(&mut self, parents: &DependencySet) -> Result<(), UnitError> {
                let config = parents.get::<InstallConfigUnit>()?.config()?;
                let document = ConfigDocument {
                    api_version: API_VERSION,
                    kind: $kind,
                    metadata: Metadata { name: "cluster" },
                    spec: $spec(config),
                };
                let yaml = serde_yaml_ng::to_string(&document)?;
                self.file = Some(File::new(Self::path(), yaml));
                Ok(())
            }

            fn files(&self) -> Vec<File> {
                self.file.iter().cloned().collect()
            }

            fn load(&mut self, storage: &dyn Storage) -> Result<bool, UnitError> {
                let path = Self::path();
                let Some(data) = storage.read(&path)? else {
                    return Ok(false);
                };
                self.file = Some(File::new(path, data));
                Ok(true)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl NamedUnit for $ty {
            const ID: &'static str = $id;
        }
    };
}

config_unit!(
    /// Default ingress domain for application routes.
    IngressConfig, id = "ingress", name = "Ingress Config", kind = "Ingress",
    file = "cluster-ingress-02-config.yml", spec = ingress_spec
);
config_unit!(
    DnsConfig, id = "dns", name = "DNS Config", kind = "DNS",
    file = "cluster-dns-02-config.yml", spec = dns_spec
);
config_unit!(
    InfrastructureConfig, id = "infrastructure", name = "Infrastructure Config",
    kind = "Infrastructure", file = "cluster-infrastructure-02-config.yml",
    spec = infrastructure_spec
);
config_unit!(
    /// Pod and service network layout.
    NetworkConfig, id = "networking", name = "Network Config", kind = "Network",
    file = "cluster-network-02-config.yml", spec = network_spec
);

pub(crate) fn register(registry: &mut UnitRegistry) -> Result<(), GraphError> {
    registry.register::<IngressConfig>()?;
    registry.register::<DnsConfig>()?;
    registry.register::<InfrastructureConfig>()?;
    registry.register::<NetworkConfig>()?;
    Ok(())
}
