//! Install configuration, configuration objects, and output file sets for Manifold.
//!
//! This crate defines the schema layer: YAML install configuration parsing and
//! validation (`InstallConfig`), the cluster config map used as the generation
//! anchor (`ConfigurationObject`), and the sorted, unique-by-path output
//! collection (`FileSet`) shared by assembly, storage, and reload.

pub mod file;
pub mod install;
pub mod object;
pub mod types;

pub use file::{validate_relative_path, File, FileSet, FileSetError};
pub use install::{
    parse_install_config_file, parse_install_config_str, InstallConfig, InstallConfigError,
    MachinePool, Networking, ObjectMeta, Platform, INSTALL_CONFIG_FILE,
};
pub use object::{config_map, ConfigurationObject, ObjectError, ObjectMetadata};
pub use types::{ClusterId, UnitId};
