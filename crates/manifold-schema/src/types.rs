//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Identity of a generation unit. At most one instance per id exists in a resolution pass.
    UnitId
);

string_newtype!(
    /// Cluster identifier handed to the cluster version operator.
    ClusterId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn unit_id_display_and_as_ref() {
        let id = UnitId::new("root-ca");
        assert_eq!(id.to_string(), "root-ca");
        assert_eq!(id.as_str(), "root-ca");
        assert_eq!(AsRef::<str>::as_ref(&id), "root-ca");
    }

    #[test]
    fn cluster_id_serde_roundtrip() {
        let id = ClusterId::new("0d7e6f1c");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0d7e6f1c\"");
        let back: ClusterId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn unit_id_compares_with_str() {
        let id = UnitId::from("manifests");
        assert_eq!(id, "manifests");
        assert_eq!(id, String::from("manifests"));
        assert_ne!(id, "dns");
    }

    #[test]
    fn unit_id_borrows_as_str_for_map_lookup() {
        let mut map = BTreeMap::new();
        map.insert(UnitId::new("etcd-ca"), 1);
        assert_eq!(map.get("etcd-ca"), Some(&1));
    }

    #[test]
    fn unit_ids_order_lexicographically() {
        let mut ids = vec![UnitId::new("kube-ca"), UnitId::new("dns"), UnitId::new("etcd-ca")];
        ids.sort();
        assert_eq!(ids, vec!["dns", "etcd-ca", "kube-ca"]);
    }
}
