//! DNS sets and ownership
//!
//! A [`DnsSet`] bundles all record sets of one DNS name (and routing set
//! identifier). Ownership and bookkeeping attributes are encoded into the
//! values of its `META` record set, so they survive every provider that can
//! store TXT records.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::{BTreeSet, HashSet};

use super::name::{normalize_hostname, DnsSetName};
use super::record::{new_attr_record_set, Record, RecordSet, RecordType};
use super::routing::RoutingPolicy;
use crate::mapping::map_from_provider;

/// Attribute holding the owner id
pub const ATTR_OWNER: &str = "owner";
/// Attribute holding the comment-record prefix
pub const ATTR_PREFIX: &str = "prefix";
/// Attribute holding the kind of the originating object
pub const ATTR_KIND: &str = "kind";
/// Attribute holding the last update timestamp in Unix seconds
pub const ATTR_TIMESTAMP: &str = "ts";
/// Attribute holding a lock id
pub const ATTR_LOCKID: &str = "lockid";

/// Decides which owner ids the caller is responsible for
pub trait Ownership {
    fn is_responsible_for(&self, id: &str) -> bool;
}

impl Ownership for BTreeSet<String> {
    fn is_responsible_for(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl Ownership for HashSet<String> {
    fn is_responsible_for(&self, id: &str) -> bool {
        self.contains(id)
    }
}

/// All record sets of one DNS name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsSet {
    pub name: DnsSetName,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub update_group: String,
    #[serde(default)]
    pub sets: BTreeMap<RecordType, RecordSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_policy: Option<RoutingPolicy>,
}

impl DnsSet {
    /// Create an empty set under the normalized name
    pub fn new(name: impl Into<DnsSetName>) -> Self {
        Self {
            name: name.into().normalize(),
            kind: String::new(),
            update_group: String::new(),
            sets: BTreeMap::new(),
            routing_policy: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_routing_policy(mut self, policy: Option<RoutingPolicy>) -> Self {
        self.routing_policy = policy;
        self
    }

    /// Store a record set, replacing one of the same type
    pub fn set_record_set(&mut self, rs: RecordSet) {
        self.sets.insert(rs.rtype, rs);
    }

    /// Store a record set built from plain values
    pub fn set_records<I, S>(&mut self, rtype: RecordType, ttl: i64, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_record_set(RecordSet::from_values(rtype, ttl, values));
    }

    pub fn record_set(&self, rtype: RecordType) -> Option<&RecordSet> {
        self.sets.get(&rtype)
    }

    pub fn delete_record_set(&mut self, rtype: RecordType) -> Option<RecordSet> {
        self.sets.remove(&rtype)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Read an attribute from the `META` record set
    pub fn get_attr(&self, name: &str) -> String {
        self.sets
            .get(&RecordType::Meta)
            .map(|meta| meta.get_attr(name))
            .unwrap_or_default()
    }

    /// Write an attribute, creating the `META` record set if needed
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.sets.get_mut(&RecordType::Meta) {
            Some(meta) => meta.set_attr(name, value),
            None => {
                self.sets
                    .insert(RecordType::Meta, new_attr_record_set(RecordType::Meta, name, value));
            }
        }
    }

    pub fn delete_attr(&mut self, name: &str) {
        if let Some(meta) = self.sets.get_mut(&RecordType::Meta) {
            meta.delete_attr(name);
        }
    }

    pub fn owner(&self) -> String {
        self.get_attr(ATTR_OWNER)
    }

    pub fn set_owner(&mut self, owner: &str) {
        self.set_attr(ATTR_OWNER, owner);
    }

    pub fn kind_attr(&self) -> String {
        self.get_attr(ATTR_KIND)
    }

    pub fn set_kind_attr(&mut self, kind: &str) {
        self.set_attr(ATTR_KIND, kind);
    }

    pub fn lock_id(&self) -> String {
        self.get_attr(ATTR_LOCKID)
    }

    pub fn set_lock_id(&mut self, lock_id: &str) {
        self.set_attr(ATTR_LOCKID, lock_id);
    }

    /// Last update timestamp, `None` if absent or unparsable
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = self.get_attr(ATTR_TIMESTAMP).parse::<i64>().ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    pub fn set_timestamp(&mut self, ts: DateTime<Utc>) {
        self.set_attr(ATTR_TIMESTAMP, &ts.timestamp().to_string());
    }

    /// Owner attribute is set and the caller is responsible for it
    pub fn is_owned_by(&self, ownership: &dyn Ownership) -> bool {
        let owner = self.owner();
        !owner.is_empty() && ownership.is_responsible_for(&owner)
    }

    /// Owner attribute is set and belongs to somebody else
    pub fn is_foreign(&self, ownership: &dyn Ownership) -> bool {
        let owner = self.owner();
        !owner.is_empty() && !ownership.is_responsible_for(&owner)
    }

    /// Names, routing policies and all record sets match
    pub fn matches(&self, other: &DnsSet) -> bool {
        self.match_sets(other, None)
    }

    /// Names and routing policies match and the record sets of `rtype` are
    /// either both absent or match
    pub fn matches_record_type_subset(&self, other: &DnsSet, rtype: RecordType) -> bool {
        self.match_sets(other, Some(rtype))
    }

    fn match_sets(&self, other: &DnsSet, restrict: Option<RecordType>) -> bool {
        if self.name != other.name || self.routing_policy != other.routing_policy {
            return false;
        }
        match restrict {
            Some(rtype) => match (self.sets.get(&rtype), other.sets.get(&rtype)) {
                (None, None) => true,
                (Some(a), Some(b)) => a.matches(b),
                _ => false,
            },
            None => {
                self.sets.len() == other.sets.len()
                    && self.sets.iter().all(|(rtype, rs)| {
                        other.sets.get(rtype).is_some_and(|o| rs.matches(o))
                    })
            }
        }
    }
}

/// DNS sets of a zone keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<DnsSet>", into = "Vec<DnsSet>")]
pub struct DnsSets {
    sets: BTreeMap<DnsSetName, DnsSet>,
}

impl DnsSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, name: &DnsSetName) -> Option<&DnsSet> {
        self.sets.get(name)
    }

    pub fn get_mut(&mut self, name: &DnsSetName) -> Option<&mut DnsSet> {
        self.sets.get_mut(name)
    }

    pub fn contains(&self, name: &DnsSetName) -> bool {
        self.sets.contains_key(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, DnsSetName, DnsSet> {
        self.sets.iter()
    }

    pub fn values(&self) -> btree_map::Values<'_, DnsSetName, DnsSet> {
        self.sets.values()
    }

    /// Insert or replace a whole DNS set under its own name
    pub fn insert(&mut self, set: DnsSet) -> Option<DnsSet> {
        self.sets.insert(set.name.clone(), set)
    }

    pub fn remove(&mut self, name: &DnsSetName) -> Option<DnsSet> {
        self.sets.remove(name)
    }

    /// Merge a record set under the normalized name
    ///
    /// Values missing in an existing set of the same type are appended, CNAME
    /// targets are stored without trailing dot.
    pub fn add_record_set(&mut self, name: impl Into<DnsSetName>, mut rs: RecordSet) {
        let name = name.into().normalize();
        if rs.rtype == RecordType::Cname {
            for record in &mut rs.records {
                record.value = normalize_hostname(&record.value);
            }
        }
        let set = self
            .sets
            .entry(name.clone())
            .or_insert_with(|| DnsSet::new(name));
        match set.sets.get_mut(&rs.rtype) {
            Some(existing) => {
                let missing: Vec<Record> = rs
                    .records
                    .into_iter()
                    .filter(|r| !existing.records.contains(r))
                    .collect();
                existing.add(missing);
            }
            None => set.set_record_set(rs),
        }
    }

    /// Ingest a record set as stored by a provider
    ///
    /// Comment records are decoded back into `META` sets under their logical
    /// name before merging.
    pub fn add_record_set_from_provider(&mut self, name: impl Into<DnsSetName>, rs: RecordSet) {
        let name = name.into().normalize();
        let (name, rs) = map_from_provider(name, rs);
        self.add_record_set(name, rs);
    }

    /// Remove a record set, dropping the DNS set once it is empty
    pub fn remove_record_set(&mut self, name: &DnsSetName, rtype: RecordType) -> Option<RecordSet> {
        let set = self.sets.get_mut(name)?;
        let removed = set.delete_record_set(rtype);
        if set.is_empty() {
            self.sets.remove(name);
        }
        removed
    }
}

impl From<Vec<DnsSet>> for DnsSets {
    fn from(sets: Vec<DnsSet>) -> Self {
        let mut result = DnsSets::new();
        for set in sets {
            result.insert(set);
        }
        result
    }
}

impl From<DnsSets> for Vec<DnsSet> {
    fn from(sets: DnsSets) -> Self {
        sets.sets.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a DnsSets {
    type Item = (&'a DnsSetName, &'a DnsSet);
    type IntoIter = btree_map::Iter<'a, DnsSetName, DnsSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.iter()
    }
}
