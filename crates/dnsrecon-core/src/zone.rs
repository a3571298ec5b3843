//! Hosted zones and zone state

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::DnsSets;

/// Provider-scoped zone id tagged with the provider type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId {
    pub provider_type: String,
    pub id: String,
}

impl ZoneId {
    pub fn new(provider_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider_type, self.id)
    }
}

/// A zone hosted by a provider account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    pub id: ZoneId,
    /// Provider-internal key, if different from the id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    /// Base domain of the zone
    pub domain: String,
    /// Sub-domains delegated to other zones
    #[serde(default)]
    pub forwarded_domains: Vec<String>,
    #[serde(default)]
    pub is_private: bool,
}

impl HostedZone {
    pub fn new(
        provider_type: impl Into<String>,
        id: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            id: ZoneId::new(provider_type, id),
            key: String::new(),
            domain: domain.into(),
            forwarded_domains: Vec::new(),
            is_private: false,
        }
    }

    pub fn with_forwarded_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forwarded_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }

    /// Provider key, falling back to the plain id
    pub fn key(&self) -> &str {
        if self.key.is_empty() {
            &self.id.id
        } else {
            &self.key
        }
    }
}

impl fmt::Display for HostedZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.domain)
    }
}

/// Current DNS sets of a zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneState {
    pub dns_sets: DnsSets,
}

impl ZoneState {
    pub fn new(dns_sets: DnsSets) -> Self {
        Self { dns_sets }
    }
}
