//! Provider record-set builders
//!
//! A builder converts a logical record set (after meta-record mapping) into
//! the shape a provider stores, or classifies why it cannot.

use crate::error::Error;
use crate::model::{align_hostname, DnsSetName, RecordSet, RecordType};
use crate::traits::ProviderRecord;
use crate::zone::HostedZone;

/// A record set in provider shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRecordSet {
    /// Full DNS name as stored by the provider
    pub name: String,
    pub rtype: RecordType,
    pub ttl: i64,
    pub values: Vec<String>,
}

impl ProviderRecordSet {
    /// One provider record per value, without ids
    pub fn records(&self) -> Vec<ProviderRecord> {
        self.values
            .iter()
            .map(|v| ProviderRecord::new(self.name.clone(), self.rtype, v.clone(), self.ttl))
            .collect()
    }

    pub fn as_record_set(&self) -> RecordSet {
        RecordSet::from_values(self.rtype, self.ttl, self.values.iter().cloned())
    }
}

/// Classification of a build attempt
#[derive(Debug)]
pub enum BuildOutcome {
    /// Ready to apply
    Ok(ProviderRecordSet),
    /// Nothing left to do
    Empty,
    /// Would be applied, but mutations are disabled
    DryRun,
    /// The provider cannot store this record type
    InvalidType(Error),
    /// The name does not belong to the zone
    InvalidName(Error),
}

/// Converts logical record sets into provider record sets
pub trait RecordSetBuilder: Send + Sync {
    /// # Parameters
    ///
    /// - `zone`: the zone the change is executed in
    /// - `name`: provider-side name returned by the meta-record mapping
    /// - `rs`: provider-side record set returned by the meta-record mapping
    fn build(&self, zone: &HostedZone, name: &DnsSetName, rs: &RecordSet) -> BuildOutcome;
}

/// Part of `dns_name` in front of the zone domain
///
/// Returns `Some("")` for the zone apex and `None` if the name is outside
/// the zone.
pub fn drop_zone_name<'a>(dns_name: &'a str, zone: &str) -> Option<&'a str> {
    if dns_name == zone {
        return Some("");
    }
    let prefix = dns_name.strip_suffix(zone)?;
    match prefix.strip_suffix('.') {
        Some(relative) if !relative.is_empty() => Some(relative),
        _ => None,
    }
}

pub(crate) fn invalid_type(rtype: RecordType) -> BuildOutcome {
    BuildOutcome::InvalidType(Error::invalid_request(format!("Unexpected record type: {}", rtype)))
}

pub(crate) fn invalid_name(name: &str) -> BuildOutcome {
    BuildOutcome::InvalidName(Error::invalid_request(format!("Unexpected dns name: {}", name)))
}

/// Builder for providers storing plain A, AAAA, CNAME and TXT records
#[derive(Debug, Clone)]
pub struct DefaultRecordSetBuilder {
    supported: Vec<RecordType>,
}

impl DefaultRecordSetBuilder {
    pub fn new() -> Self {
        Self {
            supported: vec![RecordType::A, RecordType::Aaaa, RecordType::Cname, RecordType::Txt],
        }
    }

    /// Restrict or extend the supported record types
    pub fn with_supported_types(supported: Vec<RecordType>) -> Self {
        Self { supported }
    }

    pub fn supports(&self, rtype: RecordType) -> bool {
        self.supported.contains(&rtype)
    }
}

impl Default for DefaultRecordSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSetBuilder for DefaultRecordSetBuilder {
    fn build(&self, zone: &HostedZone, name: &DnsSetName, rs: &RecordSet) -> BuildOutcome {
        if drop_zone_name(&name.dns_name, &zone.domain).is_none() {
            return invalid_name(&name.dns_name);
        }
        if rs.is_empty() {
            return BuildOutcome::Empty;
        }
        if !self.supports(rs.rtype) {
            return invalid_type(rs.rtype);
        }

        let mut values: Vec<String> = Vec::with_capacity(rs.len());
        for v in rs.values() {
            let value = match rs.rtype {
                RecordType::Cname => align_hostname(v),
                _ => v.to_string(),
            };
            if !values.contains(&value) {
                values.push(value);
            }
        }
        BuildOutcome::Ok(ProviderRecordSet {
            name: name.dns_name.clone(),
            rtype: rs.rtype,
            ttl: rs.ttl,
            values,
        })
    }
}
