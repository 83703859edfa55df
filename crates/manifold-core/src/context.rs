use crate::resolve::{DependencyError, DependencySet};
use crate::unit::NamedUnit;
use crate::units::{
    CertKey, ClusterIdUnit, EtcdCa, EtcdClientCertKey, InstallConfigUnit, KubeCa, McsCertKey,
    RootCa, ServiceServingCa,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

/// Values the bootstrap templates are rendered against.
///
/// Certificates that land in config maps are kept as PEM text; everything
/// destined for a secret's `data` is standard base64.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateContext {
    /// Empty unless a cloud provider config is supplied.
    pub base64_encode_cloud_provider_config: String,
    pub etcd_ca_cert: String,
    pub etcd_client_cert: String,
    pub etcd_client_key: String,
    pub kube_ca_cert: String,
    pub kube_ca_key: String,
    pub mcs_tls_cert: String,
    pub mcs_tls_key: String,
    pub pull_secret_base64: String,
    pub root_ca_cert: String,
    pub service_serving_ca_cert: String,
    pub service_serving_ca_key: String,
    pub cvo_cluster_id: String,
    pub etcd_endpoint_hostnames: Vec<String>,
    pub etcd_endpoint_dns_suffix: String,
}

/// `<cluster>-etcd-<i>` for each of `count` control-plane members.
pub fn etcd_endpoint_hostnames(cluster_name: &str, count: u32) -> Vec<String> {
    (0..count)
        .map(|i| format!("{cluster_name}-etcd-{i}"))
        .collect()
}

fn pem_text<T: NamedUnit + CertKey>(unit: &T) -> Result<String, DependencyError> {
    std::str::from_utf8(unit.cert()?)
        .map(str::to_owned)
        .map_err(|source| DependencyError::InvalidPem {
            unit: T::unit_id(),
            source,
        })
}

impl TemplateContext {
    pub fn from_dependencies(parents: &DependencySet) -> Result<Self, DependencyError> {
        let config = parents.get::<InstallConfigUnit>()?.config()?;
        let cluster_id = parents.get::<ClusterIdUnit>()?.cluster_id()?;
        let etcd_ca = parents.get::<EtcdCa>()?;
        let etcd_client = parents.get::<EtcdClientCertKey>()?;
        let kube_ca = parents.get::<KubeCa>()?;
        let mcs = parents.get::<McsCertKey>()?;
        let root_ca = parents.get::<RootCa>()?;
        let service_serving_ca = parents.get::<ServiceServingCa>()?;

        Ok(Self {
            base64_encode_cloud_provider_config: String::new(),
            etcd_ca_cert: pem_text(etcd_ca)?,
            etcd_client_cert: STANDARD.encode(etcd_client.cert()?),
            etcd_client_key: STANDARD.encode(etcd_client.key()?),
            kube_ca_cert: STANDARD.encode(kube_ca.cert()?),
            kube_ca_key: STANDARD.encode(kube_ca.key()?),
            mcs_tls_cert: STANDARD.encode(mcs.cert()?),
            mcs_tls_key: STANDARD.encode(mcs.key()?),
            pull_secret_base64: STANDARD.encode(config.pull_secret.as_bytes()),
            root_ca_cert: pem_text(root_ca)?,
            service_serving_ca_cert: STANDARD.encode(service_serving_ca.cert()?),
            service_serving_ca_key: STANDARD.encode(service_serving_ca.key()?),
            cvo_cluster_id: cluster_id.to_string(),
            etcd_endpoint_hostnames: etcd_endpoint_hostnames(
                config.cluster_name(),
                config.master_count(),
            ),
            etcd_endpoint_dns_suffix: config.base_domain.clone(),
        })
    }

    /// Attach a cloud provider config; it is base64 encoded here.
    #[must_use]
    pub fn with_cloud_provider_config(mut self, config: &[u8]) -> Self {
        self.base64_encode_cloud_provider_config = STANDARD.encode(config);
        self
    }
}
