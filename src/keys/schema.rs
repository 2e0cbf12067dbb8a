//! Path → key parsing.
//!
//! Matchers are evaluated in a fixed, most-specific-first order and the first
//! hit wins. Workload endpoint paths are tried before host-level paths, and
//! policy paths before tier metadata, so a looser pattern can never downgrade
//! a more specific identifier.

use lazy_static::lazy_static;
use regex::Captures;
use regex::Regex;
use tracing::trace;

use super::EndpointKey;
use super::HostEndpointKey;
use super::HostIpKey;
use super::PolicyKey;
use super::ProfileLabelsKey;
use super::ProfileRulesKey;
use super::ProfileTagsKey;
use super::ResourceKey;
use super::TierMetadataKey;
use super::Workload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Endpoint,
    HostEndpoint,
    Policy,
    ProfileRules,
    ProfileTags,
    ProfileLabels,
    TierMetadata,
    HostIp,
}

struct KeyMatcher {
    kind: ResourceKind,
    pattern: Regex,
    build: fn(&Captures<'_>) -> ResourceKey,
}

fn matcher(
    kind: ResourceKind,
    pattern: &str,
    build: fn(&Captures<'_>) -> ResourceKey,
) -> KeyMatcher {
    KeyMatcher {
        kind,
        pattern: Regex::new(pattern).expect("key schema pattern must compile"),
        build,
    }
}

fn segment(
    caps: &Captures<'_>,
    i: usize,
) -> String {
    caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default()
}

lazy_static! {
    // Patterns anchor at the start (with an optional leading separator) and
    // match by prefix: trailing segments below a recognised key are ignored.
    static ref MATCHERS: Vec<KeyMatcher> = vec![
        matcher(
            ResourceKind::Endpoint,
            r"^/?calico/v1/host/([^/]+)/workload/([^/]+)/([^/]+)/endpoint/([^/]+)",
            |c| {
                ResourceKey::Endpoint(EndpointKey {
                    hostname: segment(c, 1),
                    orchestrator_id: segment(c, 2),
                    workload_id: segment(c, 3),
                    endpoint_id: segment(c, 4),
                })
            },
        ),
        matcher(
            ResourceKind::HostEndpoint,
            r"^/?calico/v1/host/([^/]+)/endpoint/([^/]+)",
            |c| {
                ResourceKey::HostEndpoint(HostEndpointKey {
                    hostname: segment(c, 1),
                    endpoint_id: segment(c, 2),
                })
            },
        ),
        matcher(
            ResourceKind::Policy,
            r"^/?calico/v1/policy/tier/([^/]+)/policy/([^/]+)",
            |c| {
                ResourceKey::Policy(PolicyKey {
                    tier_id: segment(c, 1),
                    policy_id: segment(c, 2),
                })
            },
        ),
        matcher(
            ResourceKind::ProfileRules,
            r"^/?calico/v1/policy/profile/([^/]+)/rules",
            |c| ResourceKey::ProfileRules(ProfileRulesKey { profile_id: segment(c, 1) }),
        ),
        matcher(
            ResourceKind::ProfileTags,
            r"^/?calico/v1/policy/profile/([^/]+)/tags",
            |c| ResourceKey::ProfileTags(ProfileTagsKey { profile_id: segment(c, 1) }),
        ),
        matcher(
            ResourceKind::ProfileLabels,
            r"^/?calico/v1/policy/profile/([^/]+)/labels",
            |c| ResourceKey::ProfileLabels(ProfileLabelsKey { profile_id: segment(c, 1) }),
        ),
        matcher(
            ResourceKind::TierMetadata,
            r"^/?calico/v1/policy/tier/([^/]+)/metadata",
            |c| ResourceKey::TierMetadata(TierMetadataKey { tier_id: segment(c, 1) }),
        ),
        matcher(
            ResourceKind::HostIp,
            r"^/?calico/v1/host/([^/]+)/bird_ip",
            |c| ResourceKey::HostIp(HostIpKey { hostname: segment(c, 1) }),
        ),
    ];

    // A workload directory or its endpoint directory, and nothing below
    static ref WORKLOAD_DIR: Regex =
        Regex::new(r"^/?calico/v1/host/([^/]+)/workload/([^/]+)/([^/]+)(?:/endpoint)?/?$")
            .expect("workload dir pattern must compile");
}

/// Parses a store path into one of the typed keys.
///
/// Returns `None` if the path doesn't match any known resource; that is a
/// normal outcome, not an error.
pub fn parse_path(path: &str) -> Option<ResourceKey> {
    let key = MATCHERS
        .iter()
        .find_map(|m| m.pattern.captures(path).map(|caps| (m.build)(&caps)));
    trace!(path, matched = ?key.as_ref().map(ResourceKey::kind), "parse_path");
    key
}

/// Shortcut for callers that only care about workload endpoints
pub fn parse_endpoint_path(path: &str) -> Option<EndpointKey> {
    parse_path(path).and_then(ResourceKey::into_endpoint)
}

/// Parses the directory of a single workload, with or without its trailing
/// `endpoint` segment. Deleting such a directory removes every endpoint of the
/// workload at once.
pub fn parse_workload_dir(path: &str) -> Option<Workload> {
    WORKLOAD_DIR.captures(path).map(|c| Workload {
        hostname: segment(&c, 1),
        orchestrator_id: segment(&c, 2),
        workload_id: segment(&c, 3),
    })
}

/// The order in which [`parse_path`] tries each resource kind
pub fn match_order() -> Vec<ResourceKind> {
    MATCHERS.iter().map(|m| m.kind).collect()
}

/// Kinds whose pattern matches `path`, in evaluation order.
///
/// Useful to diagnose overlapping patterns; [`parse_path`] only keeps the first.
pub fn matching_kinds(path: &str) -> Vec<ResourceKind> {
    MATCHERS
        .iter()
        .filter(|m| m.pattern.is_match(path))
        .map(|m| m.kind)
        .collect()
}
