//! Routing policy admission
//!
//! Requests whose DNS set carries a routing policy the provider cannot
//! express are rejected before anything is built.

use crate::error::{Error, Result};
use crate::model::{DnsSet, RecordType, RoutingPolicyType};

/// Decides whether a provider can express the routing of a DNS set
pub trait RoutingPolicyChecker: Send + Sync {
    fn check(&self, set: &DnsSet, rtype: RecordType) -> Result<()>;
}

/// Rejects every set identifier and routing policy
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRoutingPolicies;

impl RoutingPolicyChecker for NoRoutingPolicies {
    fn check(&self, set: &DnsSet, rtype: RecordType) -> Result<()> {
        let policy_on_set = set
            .record_set(rtype)
            .is_some_and(|rs| rs.routing_policy.is_some());
        if set.name.has_set_identifier() || set.routing_policy.is_some() || policy_on_set {
            return Err(Error::routing_policy("routing policy not supported"));
        }
        Ok(())
    }
}

/// A routing policy type and the parameter keys it needs
#[derive(Debug, Clone)]
pub struct PolicySupport {
    pub policy_type: RoutingPolicyType,
    pub keys: Vec<&'static str>,
    pub optional_keys: Vec<&'static str>,
}

/// Accepts the listed policy types with exactly their parameter keys
#[derive(Debug, Clone, Default)]
pub struct SupportedRoutingPolicies {
    policies: Vec<PolicySupport>,
}

impl SupportedRoutingPolicies {
    pub fn new(policies: Vec<PolicySupport>) -> Self {
        Self { policies }
    }
}

impl RoutingPolicyChecker for SupportedRoutingPolicies {
    fn check(&self, set: &DnsSet, rtype: RecordType) -> Result<()> {
        let policy = set
            .record_set(rtype)
            .and_then(|rs| rs.routing_policy.as_ref())
            .or(set.routing_policy.as_ref());

        let Some(policy) = policy else {
            if set.name.has_set_identifier() {
                return Err(Error::routing_policy(format!(
                    "missing routing policy for set identifier {}",
                    set.name.set_identifier
                )));
            }
            return Ok(());
        };
        if !set.name.has_set_identifier() {
            return Err(Error::routing_policy(format!(
                "routing policy {} requires a set identifier",
                policy.policy_type
            )));
        }

        let support = self
            .policies
            .iter()
            .find(|p| p.policy_type == policy.policy_type)
            .ok_or_else(|| {
                Error::routing_policy(format!(
                    "routing policy type {} not supported",
                    policy.policy_type
                ))
            })?;
        policy.check_parameter_keys(&support.keys, &support.optional_keys)
    }
}
