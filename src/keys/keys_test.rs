use super::*;

fn endpoint_key() -> EndpointKey {
    EndpointKey {
        hostname: "node-1".to_string(),
        orchestrator_id: "k8s".to_string(),
        workload_id: "default.frontend-5d8f".to_string(),
        endpoint_id: "eth0".to_string(),
    }
}

fn all_keys() -> Vec<ResourceKey> {
    vec![
        endpoint_key().into(),
        HostEndpointKey {
            hostname: "node-1".to_string(),
            endpoint_id: "bond0".to_string(),
        }
        .into(),
        PolicyKey {
            tier_id: "default".to_string(),
            policy_id: "allow-dns".to_string(),
        }
        .into(),
        ProfileRulesKey {
            profile_id: "prof-a".to_string(),
        }
        .into(),
        ProfileTagsKey {
            profile_id: "prof-a".to_string(),
        }
        .into(),
        ProfileLabelsKey {
            profile_id: "prof-a".to_string(),
        }
        .into(),
        TierMetadataKey {
            tier_id: "security".to_string(),
        }
        .into(),
        HostIpKey {
            hostname: "node-1".to_string(),
        }
        .into(),
    ]
}

#[test]
fn test_round_trip_for_every_variant() {
    for key in all_keys() {
        let path = key.format_path();
        assert_eq!(parse_path(&path), Some(key.clone()), "round trip failed for {path}");
    }
}

#[test]
fn test_round_trip_covers_every_kind() {
    let kinds: Vec<ResourceKind> = all_keys().iter().map(ResourceKey::kind).collect();
    for kind in match_order() {
        assert!(kinds.contains(&kind), "{kind:?} missing from round trip fixture");
    }
}

#[test]
fn test_leading_separator_is_optional() {
    for key in all_keys() {
        let path = key.format_path();
        let stripped = path.trim_start_matches('/');
        assert_eq!(parse_path(stripped), parse_path(&path));
        assert_eq!(parse_path(stripped), Some(key));
    }
}

#[test]
fn test_format_paths() {
    assert_eq!(
        endpoint_key().format_path(),
        "/calico/v1/host/node-1/workload/k8s/default.frontend-5d8f/endpoint/eth0"
    );
    assert_eq!(
        PolicyKey {
            tier_id: "t".to_string(),
            policy_id: "p".to_string()
        }
        .format_path(),
        "/calico/v1/policy/tier/t/policy/p"
    );
    assert_eq!(
        TierMetadataKey {
            tier_id: "t".to_string()
        }
        .format_path(),
        "/calico/v1/policy/tier/t/metadata"
    );
    assert_eq!(
        HostIpKey {
            hostname: "h".to_string()
        }
        .format_path(),
        "/calico/v1/host/h/bird_ip"
    );
    assert_eq!(
        ResourceKey::from(HostIpKey {
            hostname: "h".to_string()
        })
        .to_string(),
        "/calico/v1/host/h/bird_ip"
    );
}

#[test]
fn test_unknown_path_is_no_match() {
    assert_eq!(parse_path("/calico/v1/unknown/thing"), None);
    assert_eq!(parse_path(""), None);
    assert_eq!(parse_path("/calico/v1/host/node-1"), None);
    assert_eq!(parse_path("/calico/v1/host/node-1/workload/k8s/wl/endpoint"), None);
    assert_eq!(parse_path("/calico/v2/host/node-1/bird_ip"), None);
    assert_eq!(parse_path("/other/calico/v1/host/node-1/bird_ip"), None);
}

#[test]
fn test_empty_segments_do_not_match() {
    assert_eq!(parse_path("/calico/v1/host//workload/k8s/wl/endpoint/e"), None);
    assert_eq!(parse_path("/calico/v1/policy/profile//rules"), None);
}

#[test]
fn test_match_order_is_most_specific_first() {
    let order = match_order();
    let pos = |kind: ResourceKind| order.iter().position(|k| *k == kind).unwrap();

    assert_eq!(order.len(), 8);
    assert_eq!(order[0], ResourceKind::Endpoint);
    assert!(pos(ResourceKind::Endpoint) < pos(ResourceKind::HostEndpoint));
    assert!(pos(ResourceKind::Endpoint) < pos(ResourceKind::HostIp));
    assert!(pos(ResourceKind::Policy) < pos(ResourceKind::TierMetadata));
}

#[test]
fn test_workload_endpoint_resolves_to_endpoint_not_host_key() {
    let path = endpoint_key().format_path();
    let key = parse_path(&path).unwrap();
    assert_eq!(key.kind(), ResourceKind::Endpoint);
    assert_eq!(matching_kinds(&path).first(), Some(&ResourceKind::Endpoint));
}

#[test]
fn test_first_match_wins_for_nested_paths() {
    // A key nested below an endpoint record still resolves to the endpoint.
    let path = format!("{}/extra", endpoint_key().format_path());
    assert_eq!(parse_path(&path), Some(endpoint_key().into()));

    let policy = "/calico/v1/policy/tier/default/policy/p1/metadata";
    assert_eq!(parse_path(policy).map(|k| k.kind()), Some(ResourceKind::Policy));
}

#[test]
fn test_parse_endpoint_path() {
    let key = endpoint_key();
    assert_eq!(parse_endpoint_path(&key.format_path()), Some(key));
    assert_eq!(parse_endpoint_path("/calico/v1/host/node-1/bird_ip"), None);
}

#[test]
fn test_profile_key_helpers() {
    let profile = ProfileKey {
        profile_id: "web".to_string(),
    };
    assert_eq!(profile.rules().format_path(), "/calico/v1/policy/profile/web/rules");
    assert_eq!(profile.tags().format_path(), "/calico/v1/policy/profile/web/tags");
    assert_eq!(profile.labels().format_path(), "/calico/v1/policy/profile/web/labels");
    assert_eq!(profile.dir(), "/calico/v1/policy/profile/web");
}

#[test]
fn test_workload_dir() {
    let workload = endpoint_key().workload();
    assert_eq!(
        workload.endpoint_dir(),
        "/calico/v1/host/node-1/workload/k8s/default.frontend-5d8f/endpoint"
    );
    assert_eq!(workload.endpoint_key("eth0"), endpoint_key());
}

#[test]
fn test_parse_workload_dir() {
    let workload = endpoint_key().workload();
    assert_eq!(
        parse_workload_dir("/calico/v1/host/node-1/workload/k8s/default.frontend-5d8f"),
        Some(workload.clone())
    );
    assert_eq!(parse_workload_dir(&workload.endpoint_dir()), Some(workload.clone()));
    assert_eq!(
        parse_workload_dir("calico/v1/host/node-1/workload/k8s/default.frontend-5d8f/"),
        Some(workload)
    );

    for path in [
        "/calico/v1/host/node-1",
        "/calico/v1/host/node-1/workload/k8s",
        "/calico/v1/host/node-1/workload/k8s/default.frontend-5d8f/endpoint/eth0",
        "/calico/v1/host/node-1/workload/k8s/default.frontend-5d8f/other",
    ] {
        assert_eq!(parse_workload_dir(path), None, "{path}");
    }
}

#[test]
fn test_validate_accepts_well_formed_keys() {
    for key in all_keys() {
        assert!(key.validate().is_ok(), "{key}");
    }
    assert!(endpoint_key().workload().validate().is_ok());
}

#[test]
fn test_validate_rejects_segments_that_break_the_round_trip() {
    let empty_host = EndpointKey {
        hostname: String::new(),
        ..endpoint_key()
    };
    let nested_id = EndpointKey {
        endpoint_id: "eth0/1".to_string(),
        ..endpoint_key()
    };
    for key in [empty_host, nested_id] {
        // The rendered path parses back to something else
        assert_ne!(parse_endpoint_path(&key.format_path()), Some(key.clone()));
        assert!(matches!(
            key.validate(),
            Err(crate::Error::Sync(crate::SyncError::InvalidKey(_)))
        ));
    }

    let profile = ProfileRulesKey {
        profile_id: "a/b".to_string(),
    };
    assert!(profile.validate().is_err());
    assert!(Workload::default().validate().is_err());
}
