//! Versioned, user-facing policy resource.

use serde::Deserialize;
use serde::Serialize;

use super::Rule;

pub const API_VERSION: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMetadata {
    pub kind: String,
    pub api_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tier: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f32>,
    #[serde(rename = "ingress", default, skip_serializing_if = "Vec::is_empty")]
    pub ingress_rules: Vec<Rule>,
    #[serde(rename = "egress", default, skip_serializing_if = "Vec::is_empty")]
    pub egress_rules: Vec<Rule>,
    #[serde(default)]
    pub selector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(flatten)]
    pub type_metadata: TypeMetadata,
    #[serde(default)]
    pub metadata: PolicyMetadata,
    #[serde(default)]
    pub spec: PolicySpec,
}

impl Default for Policy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy {
    pub fn new() -> Self {
        Self {
            type_metadata: TypeMetadata {
                kind: "policy".to_string(),
                api_version: API_VERSION.to_string(),
            },
            metadata: PolicyMetadata::default(),
            spec: PolicySpec::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyList {
    #[serde(flatten)]
    pub type_metadata: TypeMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Policy>,
}

impl Default for PolicyList {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyList {
    pub fn new() -> Self {
        Self {
            type_metadata: TypeMetadata {
                kind: "policyList".to_string(),
                api_version: API_VERSION.to_string(),
            },
            items: Vec::new(),
        }
    }
}
