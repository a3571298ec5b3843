//! DNS names and host-name helpers
//!
//! Names are kept in logical form internally: lower-case and without the
//! trailing dot. Providers usually expect the aligned wire form with a
//! trailing dot, see [`align_hostname`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strip the trailing dot and unescape an escaped wildcard label
pub fn normalize_hostname(host: &str) -> String {
    let host = match host.strip_prefix("\\052.") {
        Some(rest) => format!("*.{}", rest),
        None => host.to_string(),
    };
    match host.strip_suffix('.') {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// Append a trailing dot unless already present
pub fn align_hostname(host: &str) -> String {
    if host.ends_with('.') {
        host.to_string()
    } else {
        format!("{}.", host)
    }
}

/// Normalized host name in lower case
pub fn normalize_domain_name(domain: &str) -> String {
    normalize_hostname(domain).to_lowercase()
}

/// Whether `domain` equals `zone` or is a sub-domain of it
pub fn match_domain(domain: &str, zone: &str) -> bool {
    if domain == zone {
        return true;
    }
    domain.len() > zone.len()
        && domain.ends_with(zone)
        && domain.as_bytes()[domain.len() - zone.len() - 1] == b'.'
}

/// Key of a [`DnsSet`](super::DnsSet): a DNS name plus an optional routing
/// set identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DnsSetName {
    pub dns_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,
}

impl DnsSetName {
    pub fn new(dns_name: impl Into<String>) -> Self {
        Self {
            dns_name: dns_name.into(),
            set_identifier: String::new(),
        }
    }

    pub fn with_set_identifier(dns_name: impl Into<String>, set_identifier: impl Into<String>) -> Self {
        Self {
            dns_name: dns_name.into(),
            set_identifier: set_identifier.into(),
        }
    }

    /// Logical form: lower-case without trailing dot
    pub fn normalize(&self) -> Self {
        Self {
            dns_name: normalize_domain_name(&self.dns_name),
            set_identifier: self.set_identifier.clone(),
        }
    }

    /// Wire form: trailing dot appended
    pub fn align(&self) -> Self {
        Self {
            dns_name: align_hostname(&self.dns_name),
            set_identifier: self.set_identifier.clone(),
        }
    }

    /// Same set identifier under a different DNS name
    pub fn with_dns_name(&self, dns_name: impl Into<String>) -> Self {
        Self {
            dns_name: dns_name.into(),
            set_identifier: self.set_identifier.clone(),
        }
    }

    pub fn has_set_identifier(&self) -> bool {
        !self.set_identifier.is_empty()
    }
}

impl fmt::Display for DnsSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.set_identifier.is_empty() {
            f.write_str(&self.dns_name)
        } else {
            write!(f, "{}#{}", self.dns_name, self.set_identifier)
        }
    }
}

impl From<&str> for DnsSetName {
    fn from(name: &str) -> Self {
        DnsSetName::new(name)
    }
}

impl From<String> for DnsSetName {
    fn from(name: String) -> Self {
        DnsSetName::new(name)
    }
}
