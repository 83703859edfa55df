//! Bootstrap manifest templates embedded in the binary.

use crate::graph::GraphError;
use crate::registry::UnitRegistry;
use crate::resolve::{DependencyError, DependencySet};
use crate::unit::{Unit, UnitError};
use manifold_schema::UnitId;
use std::any::Any;

/// Whether a template is evaluated against the shared context or copied as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMode {
    Rendered,
    Verbatim,
}

#[derive(Debug)]
pub struct BootkubeSpec {
    pub id: &'static str,
    pub name: &'static str,
    /// File name under the manifest directory.
    pub output: &'static str,
    pub mode: TemplateMode,
    pub source: &'static str,
}

macro_rules! bootkube {
    ($id:literal, $name:literal, $file:literal, $mode:ident) => {
        BootkubeSpec {
            id: $id,
            name: $name,
            output: $file,
            mode: TemplateMode::$mode,
            source: include_str!(concat!("../../templates/bootkube/", $file)),
        }
    };
}

/// Every bootstrap template, in assembly order.
pub static BOOTKUBE: &[BootkubeSpec] = &[
    bootkube!("kube-cloud-config", "KubeCloudConfig", "kube-cloud-config.yaml", Rendered),
    bootkube!(
        "machine-config-server-tls-secret",
        "MachineConfigServerTLSSecret",
        "machine-config-server-tls-secret.yaml",
        Rendered
    ),
    bootkube!(
        "openshift-service-signer-secret",
        "OpenshiftServiceCertSignerSecret",
        "openshift-service-signer-secret.yaml",
        Rendered
    ),
    bootkube!("pull", "Pull", "pull.json", Rendered),
    bootkube!("cvo-overrides", "CVOOverrides", "cvo-overrides.yaml", Rendered),
    bootkube!(
        "host-etcd-service-endpoints",
        "HostEtcdServiceEndpointsKubeSystem",
        "host-etcd-service-endpoints.yaml",
        Rendered
    ),
    bootkube!(
        "kube-system-configmap-etcd-serving-ca",
        "KubeSystemConfigmapEtcdServingCA",
        "kube-system-configmap-etcd-serving-ca.yaml",
        Rendered
    ),
    bootkube!(
        "kube-system-configmap-root-ca",
        "KubeSystemConfigmapRootCA",
        "kube-system-configmap-root-ca.yaml",
        Rendered
    ),
    bootkube!(
        "kube-system-secret-etcd-client",
        "KubeSystemSecretEtcdClient",
        "kube-system-secret-etcd-client.yaml",
        Rendered
    ),
    bootkube!(
        "openshift-machine-config-operator",
        "OpenshiftMachineConfigOperator",
        "04-openshift-machine-config-operator.yaml",
        Verbatim
    ),
    bootkube!(
        "openshift-service-signer-namespace",
        "OpenshiftServiceCertSignerNamespace",
        "09-openshift-service-signer-namespace.yaml",
        Verbatim
    ),
    bootkube!("etcd-service", "EtcdServiceKubeSystem", "etcd-service.yaml", Verbatim),
    bootkube!(
        "host-etcd-service",
        "HostEtcdServiceKubeSystem",
        "host-etcd-service.yaml",
        Verbatim
    ),
];

/// Ids of every bootstrap template unit.
pub fn bootkube_ids() -> impl Iterator<Item = UnitId> {
    BOOTKUBE.iter().map(|spec| UnitId::new(spec.id))
}

/// One bootstrap template. Its content is the raw, unrendered source.
#[derive(Debug)]
pub struct BootkubeTemplate {
    spec: &'static BootkubeSpec,
    data: Option<Vec<u8>>,
}

impl BootkubeTemplate {
    pub fn new(spec: &'static BootkubeSpec) -> Self {
        Self { spec, data: None }
    }

    pub fn spec(&self) -> &'static BootkubeSpec {
        self.spec
    }

    pub fn template(&self) -> Result<&[u8], DependencyError> {
        self.data
            .as_deref()
            .ok_or_else(|| DependencyError::Incomplete(UnitId::new(self.spec.id)))
    }
}

impl Unit for BootkubeTemplate {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn dependencies(&self) -> Vec<UnitId> {
        Vec::new()
    }

    fn generate(&mut self, _parents: &DependencySet) -> Result<(), UnitError> {
        self.data = Some(self.spec.source.as_bytes().to_vec());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn register(registry: &mut UnitRegistry) -> Result<(), GraphError> {
    for spec in BOOTKUBE {
        registry.register_with(spec.id, move || Box::new(BootkubeTemplate::new(spec)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn nine_rendered_four_verbatim() {
        let rendered = BOOTKUBE
            .iter()
            .filter(|s| s.mode == TemplateMode::Rendered)
            .count();
        assert_eq!(rendered, 9);
        assert_eq!(BOOTKUBE.len() - rendered, 4);
    }

    #[test]
    fn ids_and_outputs_are_unique() {
        let ids: BTreeSet<_> = BOOTKUBE.iter().map(|s| s.id).collect();
        let outputs: BTreeSet<_> = BOOTKUBE.iter().map(|s| s.output).collect();
        assert_eq!(ids.len(), BOOTKUBE.len());
        assert_eq!(outputs.len(), BOOTKUBE.len());
    }

    #[test]
    fn verbatim_sources_carry_no_template_syntax() {
        for spec in BOOTKUBE.iter().filter(|s| s.mode == TemplateMode::Verbatim) {
            assert!(!spec.source.contains("{{"), "{} looks templated", spec.id);
        }
    }

    #[test]
    fn template_is_available_after_generate() {
        let mut unit = BootkubeTemplate::new(&BOOTKUBE[3]);
        assert!(unit.template().is_err());
        unit.generate(&DependencySet::new()).unwrap();
        assert_eq!(unit.spec().output, "pull.json");
        assert!(std::str::from_utf8(unit.template().unwrap())
            .unwrap()
            .contains("{{ pull_secret_base64 }}"));
    }

    #[test]
    fn registers_every_template() {
        let mut registry = UnitRegistry::new();
        register(&mut registry).unwrap();
        assert_eq!(registry.len(), BOOTKUBE.len());
        assert!(registry.contains("host-etcd-service-endpoints"));
        assert!(matches!(
            register(&mut registry),
            Err(GraphError::DuplicateUnit(_))
        ));
    }
}
