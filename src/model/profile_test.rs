use super::*;
use crate::keys::ProfileKey;
use crate::store::GetOptions;
use crate::store::KvStore;
use crate::store::MemKvStore;
use crate::store::MockKvStore;
use crate::StoreError;

fn profile() -> Profile {
    Profile {
        key: ProfileKey {
            profile_id: "web".to_string(),
        },
        tags: vec!["web".to_string()],
        rules: Rules {
            inbound: vec![Rule {
                action: "allow".to_string(),
                src_tag: "lb".to_string(),
            }],
            outbound: vec![Rule {
                action: "allow".to_string(),
                src_tag: String::new(),
            }],
        },
        labels: Labels::new(),
    }
}

#[test]
fn test_rules_wire_format() {
    let json = serde_json::to_string(&profile().rules).unwrap();
    assert_eq!(
        json,
        r#"{"inbound_rules":[{"action":"allow","src_tag":"lb"}],"outbound_rules":[{"action":"allow"}]}"#
    );
    assert_eq!(parse_rules(&json).unwrap(), profile().rules);
}

#[tokio::test]
async fn test_write_then_exists() {
    let store = MemKvStore::default();
    assert!(!profile_exists(&store, "web").await.unwrap());

    profile().write(&store).await.unwrap();
    assert!(profile_exists(&store, "web").await.unwrap());

    let tags = store
        .get("/calico/v1/policy/profile/web/tags", GetOptions::default())
        .await
        .unwrap();
    assert_eq!(parse_tags(tags.node.value_str()).unwrap(), vec!["web".to_string()]);
    assert!(store
        .get("/calico/v1/policy/profile/web/labels", GetOptions::default())
        .await
        .is_err());
}

#[tokio::test]
async fn test_write_includes_labels_when_present() {
    let store = MemKvStore::default();
    let mut profile = profile();
    profile.labels.insert("team".to_string(), "edge".to_string());
    profile.write(&store).await.unwrap();

    let labels = store
        .get("/calico/v1/policy/profile/web/labels", GetOptions::default())
        .await
        .unwrap();
    assert_eq!(labels.node.value_str(), r#"{"team":"edge"}"#);
}

#[tokio::test]
async fn test_profile_exists_propagates_transport_errors() {
    let mut store = MockKvStore::new();
    store
        .expect_get()
        .returning(|_, _| Err(StoreError::Transport("connection refused".to_string())));

    assert!(profile_exists(&store, "web").await.is_err());
}

#[tokio::test]
async fn test_write_rejects_profile_id_with_separator() {
    let store = MemKvStore::default();
    let mut profile = profile();
    profile.key = ProfileKey {
        profile_id: "team/web".to_string(),
    };

    assert!(matches!(
        profile.write(&store).await,
        Err(crate::Error::Sync(crate::SyncError::InvalidKey(_)))
    ));
    assert!(!profile_exists(&store, "team").await.unwrap());
}
