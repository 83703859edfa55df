//! Built-in units of the asset graph.

pub mod bootkube;
pub mod cluster_id;
pub mod installconfig;
pub mod network;
pub mod tls;

pub use bootkube::{bootkube_ids, BootkubeSpec, BootkubeTemplate, TemplateMode, BOOTKUBE};
pub use cluster_id::ClusterIdUnit;
pub use installconfig::InstallConfigUnit;
pub use network::{DnsConfig, InfrastructureConfig, IngressConfig, NetworkConfig};
pub use tls::{
    CertKey, EtcdCa, EtcdClientCertKey, IngressCertKey, KubeCa, KubeletCertKey, McsCertKey,
    RootCa, ServiceServingCa,
};

use crate::assemble::Manifests;
use crate::graph::GraphError;
use crate::registry::UnitRegistry;

pub(crate) fn register_builtin(registry: &mut UnitRegistry) -> Result<(), GraphError> {
    registry.register::<InstallConfigUnit>()?;
    registry.register::<ClusterIdUnit>()?;
    tls::register(registry)?;
    network::register(registry)?;
    bootkube::register(registry)?;
    registry.register::<Manifests>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::unit::NamedUnit;
    use crate::{Manifests, UnitRegistry};

    #[test]
    fn builtin_graph_is_valid() {
        let registry = UnitRegistry::builtin().unwrap();
        let graph = registry.graph();
        graph.validate().unwrap();
        assert_eq!(registry.len(), 2 + 8 + 4 + 13 + 1);
    }

    #[test]
    fn manifests_depend_on_every_other_unit() {
        let registry = UnitRegistry::builtin().unwrap();
        let graph = registry.graph();
        let order = graph.resolution_order(&[Manifests::unit_id()]).unwrap();
        assert_eq!(order.len(), registry.len());
        assert_eq!(order.last().unwrap(), Manifests::ID);
    }

    #[test]
    fn tls_chain_hangs_off_root_ca() {
        let graph = UnitRegistry::builtin().unwrap().graph();
        assert_eq!(graph.dependencies_of("root-ca"), ["cluster-id"]);
        assert_eq!(graph.dependencies_of("etcd-client-cert-key"), ["etcd-ca"]);
        let mut direct = graph.dependents_of("root-ca");
        direct.sort();
        assert_eq!(
            direct,
            vec!["etcd-ca", "kube-ca", "manifests", "mcs-cert-key", "service-serving-ca"]
        );
    }
}
