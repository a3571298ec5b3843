//! Routing policies attached to record sets or DNS sets

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Routing policy type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingPolicyType {
    Weighted,
    Latency,
    Geolocation,
    IpBased,
    Failover,
}

impl RoutingPolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingPolicyType::Weighted => "weighted",
            RoutingPolicyType::Latency => "latency",
            RoutingPolicyType::Geolocation => "geolocation",
            RoutingPolicyType::IpBased => "ip-based",
            RoutingPolicyType::Failover => "failover",
        }
    }
}

impl fmt::Display for RoutingPolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routing policy with its type-specific parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    #[serde(rename = "type")]
    pub policy_type: RoutingPolicyType,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl RoutingPolicy {
    pub fn new<I, K, V>(policy_type: RoutingPolicyType, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            policy_type,
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Check that all `keys` are present and nothing outside `keys` and
    /// `optional_keys` is set
    pub fn check_parameter_keys(&self, keys: &[&str], optional_keys: &[&str]) -> Result<()> {
        for key in keys {
            if !self.parameters.contains_key(*key) {
                return Err(Error::routing_policy(format!(
                    "missing parameter key {} for routing policy {}",
                    key, self.policy_type
                )));
            }
        }
        for key in self.parameters.keys() {
            if !keys.contains(&key.as_str()) && !optional_keys.contains(&key.as_str()) {
                return Err(Error::routing_policy(format!(
                    "unsupported parameter key {} for routing policy {}",
                    key, self.policy_type
                )));
            }
        }
        Ok(())
    }
}
