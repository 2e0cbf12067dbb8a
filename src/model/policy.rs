use serde::Deserialize;
use serde::Serialize;

use super::Rule;
use crate::keys::PolicyKey;
use crate::keys::StoreKey;
use crate::keys::TierMetadataKey;
use crate::store::KvStore;
use crate::store::SetOptions;
use crate::store::StoreResponse;
use crate::Result;
use crate::SyncError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TierMetadata {
    #[serde(skip)]
    pub key: TierMetadataKey,
    #[serde(default)]
    pub order: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Policy {
    #[serde(skip)]
    pub key: PolicyKey,
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub order: f64,
    #[serde(rename = "inbound_rules", default)]
    pub inbound: Vec<Rule>,
    #[serde(rename = "outbound_rules", default)]
    pub outbound: Vec<Rule>,
}

pub fn parse_tier_metadata(
    key: TierMetadataKey,
    raw: &str,
) -> std::result::Result<TierMetadata, serde_json::Error> {
    let mut tier: TierMetadata = serde_json::from_str(raw)?;
    tier.key = key;
    Ok(tier)
}

pub fn parse_policy(
    key: PolicyKey,
    raw: &str,
) -> std::result::Result<Policy, serde_json::Error> {
    let mut policy: Policy = serde_json::from_str(raw)?;
    policy.key = key;
    Ok(policy)
}

impl TierMetadata {
    pub async fn write(
        &self,
        store: &dyn KvStore,
    ) -> Result<StoreResponse> {
        self.key.validate()?;
        let value = serde_json::to_string(self).map_err(SyncError::from)?;
        Ok(store.set(&self.key.format_path(), value, SetOptions::default()).await?)
    }
}

impl Policy {
    pub async fn write(
        &self,
        store: &dyn KvStore,
    ) -> Result<StoreResponse> {
        self.key.validate()?;
        let value = serde_json::to_string(self).map_err(SyncError::from)?;
        Ok(store.set(&self.key.format_path(), value, SetOptions::default()).await?)
    }
}
