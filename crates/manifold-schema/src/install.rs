use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Conventional file name of the install configuration inside an asset directory.
pub const INSTALL_CONFIG_FILE: &str = "install-config.yaml";

#[derive(Debug, Error)]
pub enum InstallConfigError {
    #[error("failed to read install config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse install config: {0}")]
    ParseYaml(#[source] serde_yaml_ng::Error),
    #[error("failed to serialize install config: {0}")]
    SerializeYaml(#[source] serde_yaml_ng::Error),
    #[error("metadata.name must not be empty")]
    EmptyClusterName,
    #[error("baseDomain must not be empty")]
    EmptyBaseDomain,
    #[error("pullSecret must not be empty")]
    EmptyPullSecret,
    #[error("pullSecret is not a JSON document: {0}")]
    InvalidPullSecret(#[source] serde_json::Error),
    #[error("controlPlane.replicas must be at least 1")]
    NoControlPlaneReplicas,
}

/// Install-time configuration supplied by the operator of the installer.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct InstallConfig {
    pub metadata: ObjectMeta,
    pub base_domain: String,
    pub pull_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,
    #[serde(default)]
    pub control_plane: MachinePool,
    #[serde(default)]
    pub networking: Networking,
    #[serde(default)]
    pub platform: Platform,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ObjectMeta {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MachinePool {
    #[serde(default)]
    pub replicas: Option<u32>,
}

impl Default for MachinePool {
    fn default() -> Self {
        Self { replicas: Some(1) }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Networking {
    #[serde(default = "default_network_type")]
    pub network_type: String,
    #[serde(default = "default_cluster_network_cidr")]
    pub cluster_network_cidr: String,
    #[serde(default = "default_host_prefix")]
    pub host_prefix: u8,
    #[serde(default = "default_service_network")]
    pub service_network: String,
}

impl Default for Networking {
    fn default() -> Self {
        Self {
            network_type: default_network_type(),
            cluster_network_cidr: default_cluster_network_cidr(),
            host_prefix: default_host_prefix(),
            service_network: default_service_network(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    None,
    Libvirt,
    Aws,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::None => "none",
            Platform::Libvirt => "libvirt",
            Platform::Aws => "aws",
        }
    }
}

fn default_network_type() -> String {
    "OpenShiftSDN".to_owned()
}

fn default_cluster_network_cidr() -> String {
    "10.128.0.0/14".to_owned()
}

fn default_host_prefix() -> u8 {
    23
}

fn default_service_network() -> String {
    "172.30.0.0/16".to_owned()
}

impl InstallConfig {
    #[inline]
    pub fn cluster_name(&self) -> &str {
        &self.metadata.name
    }

    /// Number of control-plane machines. An unset replica count means one.
    pub fn master_count(&self) -> u32 {
        self.control_plane.replicas.unwrap_or(1)
    }

    pub fn validate(&self) -> Result<(), InstallConfigError> {
        if self.metadata.name.trim().is_empty() {
            return Err(InstallConfigError::EmptyClusterName);
        }
        if self.base_domain.trim().is_empty() {
            return Err(InstallConfigError::EmptyBaseDomain);
        }
        if self.pull_secret.trim().is_empty() {
            return Err(InstallConfigError::EmptyPullSecret);
        }
        serde_json::from_str::<serde_json::Value>(&self.pull_secret)
            .map_err(InstallConfigError::InvalidPullSecret)?;
        if self.master_count() == 0 {
            return Err(InstallConfigError::NoControlPlaneReplicas);
        }
        Ok(())
    }

    /// Canonical YAML form; this is the text embedded in the cluster config map.
    pub fn to_yaml(&self) -> Result<String, InstallConfigError> {
        serde_yaml_ng::to_string(self).map_err(InstallConfigError::SerializeYaml)
    }
}

/// Parse and validate an install configuration.
pub fn parse_install_config_str(input: &str) -> Result<InstallConfig, InstallConfigError> {
    let config: InstallConfig =
        serde_yaml_ng::from_str(input).map_err(InstallConfigError::ParseYaml)?;
    config.validate()?;
    Ok(config)
}

pub fn parse_install_config_file(
    path: impl AsRef<Path>,
) -> Result<InstallConfig, InstallConfigError> {
    let content = fs::read_to_string(path)?;
    parse_install_config_str(&content)
}
