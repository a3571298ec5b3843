//! Record & ownership model shared by all providers
//!
//! All operations here are pure data transformations and never fail.

pub mod dnsset;
pub mod name;
pub mod record;
pub mod routing;

pub use dnsset::{
    DnsSet, DnsSets, Ownership, ATTR_KIND, ATTR_LOCKID, ATTR_OWNER, ATTR_PREFIX, ATTR_TIMESTAMP,
};
pub use name::{align_hostname, match_domain, normalize_domain_name, normalize_hostname, DnsSetName};
pub use record::{Record, RecordSet, RecordSetDiff, RecordType, DEFAULT_META_TTL};
pub use routing::{RoutingPolicy, RoutingPolicyType};
