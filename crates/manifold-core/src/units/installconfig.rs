use crate::resolve::{DependencyError, DependencySet};
use crate::unit::{NamedUnit, Unit, UnitError};
use manifold_schema::{
    parse_install_config_str, File, InstallConfig, InstallConfigError, UnitId, INSTALL_CONFIG_FILE,
};
use manifold_store::Storage;
use std::any::Any;
use tracing::debug;

/// The operator-supplied install configuration.
///
/// It is never generated: the caller provides it to the resolver, or a
/// previous run left `install-config.yaml` in storage.
#[derive(Debug, Clone, Default)]
pub struct InstallConfigUnit {
    config: Option<InstallConfig>,
    yaml: String,
}

impl InstallConfigUnit {
    /// Validate `config` and capture its canonical YAML form.
    pub fn from_config(config: InstallConfig) -> Result<Self, InstallConfigError> {
        config.validate()?;
        let yaml = config.to_yaml()?;
        Ok(Self {
            config: Some(config),
            yaml,
        })
    }

    pub fn config(&self) -> Result<&InstallConfig, DependencyError> {
        self.config
            .as_ref()
            .ok_or_else(|| DependencyError::Incomplete(Self::unit_id()))
    }

    /// Serialized configuration, exactly as persisted.
    pub fn yaml(&self) -> Result<&str, DependencyError> {
        self.config()?;
        Ok(&self.yaml)
    }
}

impl Unit for InstallConfigUnit {
    fn name(&self) -> &str {
        "Install Config"
    }

    fn dependencies(&self) -> Vec<UnitId> {
        Vec::new()
    }

    fn generate(&mut self, _parents: &DependencySet) -> Result<(), UnitError> {
        Err(UnitError::Invalid(
            "no install config was provided and none was found in storage".to_owned(),
        ))
    }

    fn files(&self) -> Vec<File> {
        if self.config.is_none() {
            return Vec::new();
        }
        vec![File::new(INSTALL_CONFIG_FILE, self.yaml.as_bytes())]
    }

    fn load(&mut self, storage: &dyn Storage) -> Result<bool, UnitError> {
        let Some(data) = storage.read(INSTALL_CONFIG_FILE)? else {
            return Ok(false);
        };
        let text = String::from_utf8(data).map_err(|e| {
            UnitError::Invalid(format!("{INSTALL_CONFIG_FILE} is not valid UTF-8: {e}"))
        })?;
        let config = parse_install_config_str(&text)?;
        debug!("loaded install config for cluster {}", config.cluster_name());
        *self = Self::from_config(config)?;
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NamedUnit for InstallConfigUnit {
    const ID: &'static str = "install-config";
}
