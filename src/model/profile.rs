use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::Labels;
use crate::keys::ProfileKey;
use crate::keys::StoreKey;
use crate::store::GetOptions;
use crate::store::KvStore;
use crate::store::SetOptions;
use crate::Result;
use crate::SyncError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rule {
    pub action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub src_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rules {
    #[serde(rename = "inbound_rules", default)]
    pub inbound: Vec<Rule>,
    #[serde(rename = "outbound_rules", default)]
    pub outbound: Vec<Rule>,
}

/// Profile split across its `tags`, `rules` and `labels` keys
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    pub key: ProfileKey,
    pub tags: Vec<String>,
    pub rules: Rules,
    pub labels: Labels,
}

impl Profile {
    /// Writes tags and rules, plus labels when there are any
    pub async fn write(
        &self,
        store: &dyn KvStore,
    ) -> Result<()> {
        self.key.rules().validate()?;
        let tags = serde_json::to_string(&self.tags).map_err(SyncError::from)?;
        let rules = serde_json::to_string(&self.rules).map_err(SyncError::from)?;

        debug!(profile_id = %self.key.profile_id, "writing profile");
        store.set(&self.key.tags().format_path(), tags, SetOptions::default()).await?;
        store.set(&self.key.rules().format_path(), rules, SetOptions::default()).await?;

        if !self.labels.is_empty() {
            let labels = serde_json::to_string(&self.labels).map_err(SyncError::from)?;
            store.set(&self.key.labels().format_path(), labels, SetOptions::default()).await?;
        }
        Ok(())
    }
}

pub fn parse_rules(raw: &str) -> std::result::Result<Rules, serde_json::Error> {
    serde_json::from_str(raw)
}

pub fn parse_tags(raw: &str) -> std::result::Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Whether anything is stored under the profile's directory
pub async fn profile_exists(
    store: &dyn KvStore,
    profile_id: &str,
) -> Result<bool> {
    let key = ProfileKey {
        profile_id: profile_id.to_string(),
    };
    match store.get(&key.dir(), GetOptions::default()).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}
