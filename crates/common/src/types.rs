use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub instance_id: Uuid,
}

impl ServiceInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instance_id: Uuid::new_v4(),
        }
    }
}

/// Reference to a catalog entity, written as `kind:namespace/name`.
///
/// The namespace segment may be omitted, in which case it defaults to
/// `default`. Kind and namespace are case-insensitive and normalized to
/// lowercase on parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl EntityRef {
    pub const DEFAULT_NAMESPACE: &'static str = "default";
}

impl FromStr for EntityRef {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = value
            .split_once(':')
            .ok_or_else(|| format!("invalid entity reference: {value}"))?;
        let (namespace, name) = match rest.split_once('/') {
            Some((namespace, name)) => (namespace, name),
            None => (Self::DEFAULT_NAMESPACE, rest),
        };
        if kind.is_empty() || namespace.is_empty() || name.is_empty() {
            return Err(format!("invalid entity reference: {value}"));
        }
        Ok(Self {
            kind: kind.to_lowercase(),
            namespace: namespace.to_lowercase(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.kind, self.namespace, self.name)
    }
}
