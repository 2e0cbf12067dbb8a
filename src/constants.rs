// -
// Store namespaces

/// Root of every key this crate reads or writes
pub const ROOT_PREFIX: &str = "/calico/v1";

/// Subtree holding host, workload and endpoint records
pub const HOSTS_PREFIX: &str = "/calico/v1/host";

/// Subtree holding tiers, policies and profiles
pub const POLICY_PREFIX: &str = "/calico/v1/policy";

pub const PROFILE_PREFIX: &str = "/calico/v1/policy/profile";

/// Path separator of the hierarchical namespace
pub const SEPARATOR: char = '/';

// -
// Endpoint document fields

/// Field overwritten by the label merge writer
pub(crate) const LABELS_FIELD: &str = "labels";

// -
// Watch

pub(crate) const DEFAULT_UPDATE_CHANNEL_CAPACITY: usize = 1024;
pub(crate) const DEFAULT_EVENT_HISTORY_CAPACITY: usize = 1000;
