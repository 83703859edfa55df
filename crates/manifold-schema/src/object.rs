use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("failed to serialize {namespace}/{name}: {source}")]
    Serialize {
        namespace: String,
        name: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
    #[error("failed to parse configuration object: {0}")]
    Parse(#[source] serde_yaml_ng::Error),
}

/// A cluster config map: namespaced, named, with string-valued data.
///
/// It is written as an output manifest and, on reload, serves as the anchor
/// that proves a previous generation completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationObject {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMetadata,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub name: String,
    pub namespace: String,
}

/// Build a `v1/ConfigMap` object.
pub fn config_map(
    namespace: &str,
    name: &str,
    data: impl IntoIterator<Item = (String, String)>,
) -> ConfigurationObject {
    ConfigurationObject {
        api_version: "v1".to_owned(),
        kind: "ConfigMap".to_owned(),
        metadata: ObjectMetadata {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
        },
        data: data.into_iter().collect(),
    }
}

impl ConfigurationObject {
    pub fn to_yaml(&self) -> Result<String, ObjectError> {
        serde_yaml_ng::to_string(self).map_err(|source| ObjectError::Serialize {
            namespace: self.metadata.namespace.clone(),
            name: self.metadata.name.clone(),
            source,
        })
    }

    pub fn from_yaml(input: &[u8]) -> Result<Self, ObjectError> {
        serde_yaml_ng::from_slice(input).map_err(ObjectError::Parse)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}
