//! Record types, records and record sets
//!
//! A [`RecordSet`] holds all values of one type for one DNS name. Its values
//! are compared as a set: order is irrelevant and duplicates collapse.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::routing::RoutingPolicy;
use crate::error::Error;

/// TTL used for freshly created `META` record sets
pub const DEFAULT_META_TTL: i64 = 600;

/// DNS record set type
///
/// `Meta` and the alias types are virtual: they never reach a provider
/// unchanged. `Meta` carries ownership attributes and is mapped to `TXT`,
/// the alias types are provider-specific CNAME replacements without a
/// meaningful TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
    #[serde(rename = "CNAME")]
    Cname,
    #[serde(rename = "TXT")]
    Txt,
    #[serde(rename = "NS")]
    Ns,
    #[serde(rename = "META")]
    Meta,
    #[serde(rename = "ALIAS")]
    AliasA,
    #[serde(rename = "ALIAS_AAAA")]
    AliasAaaa,
}

impl RecordType {
    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Ns => "NS",
            RecordType::Meta => "META",
            RecordType::AliasA => "ALIAS",
            RecordType::AliasAaaa => "ALIAS_AAAA",
        }
    }

    /// Alias types have no meaningful TTL
    pub fn is_alias(&self) -> bool {
        matches!(self, RecordType::AliasA | RecordType::AliasAaaa)
    }

    /// Whether values of this type may carry encoded `"key=value"` attributes
    pub fn carries_attributes(&self) -> bool {
        matches!(self, RecordType::Txt | RecordType::Meta)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "TXT" => Ok(RecordType::Txt),
            "NS" => Ok(RecordType::Ns),
            "META" => Ok(RecordType::Meta),
            "ALIAS" => Ok(RecordType::AliasA),
            "ALIAS_AAAA" => Ok(RecordType::AliasAaaa),
            other => Err(Error::invalid_input(format!("unknown record type: {}", other))),
        }
    }
}

/// A single record value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub value: String,
}

impl Record {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Result of [`RecordSet::diff_to`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSetDiff {
    /// Values only present on the receiving side
    pub new: Vec<Record>,
    /// Values on both sides while the TTLs differ
    pub update: Vec<Record>,
    /// Values only present on the other side
    pub delete: Vec<Record>,
}

impl RecordSetDiff {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// All values of one type for a DNS name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(rename = "type")]
    pub rtype: RecordType,
    pub ttl: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore_ttl: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_policy: Option<RoutingPolicy>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl RecordSet {
    /// Create a record set from records
    pub fn new(rtype: RecordType, ttl: i64, records: Vec<Record>) -> Self {
        Self {
            rtype,
            ttl,
            ignore_ttl: false,
            routing_policy: None,
            records,
        }
    }

    /// Create a record set from plain values
    pub fn from_values<I, S>(rtype: RecordType, ttl: i64, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(rtype, ttl, values.into_iter().map(Record::new).collect())
    }

    pub fn with_ignore_ttl(mut self, ignore_ttl: bool) -> Self {
        self.ignore_ttl = ignore_ttl;
        self
    }

    pub fn with_routing_policy(mut self, policy: Option<RoutingPolicy>) -> Self {
        self.routing_policy = policy;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append records
    pub fn add(&mut self, records: impl IntoIterator<Item = Record>) -> &mut Self {
        self.records.extend(records);
        self
    }

    /// Iterate over the record values
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.value.as_str())
    }

    fn contains_value(&self, value: &str) -> bool {
        self.records.iter().any(|r| r.value == value)
    }

    /// Human readable value list, `[a, b]` or `no records`
    pub fn record_string(&self) -> String {
        if self.records.is_empty() {
            return "no records".to_string();
        }
        let values: Vec<&str> = self.values().collect();
        format!("[{}]", values.join(", "))
    }

    /// Set-based equality of two record sets
    ///
    /// The type is not compared, so a `META` set equals its `TXT` wire form.
    /// TTLs are ignored when either side sets `ignore_ttl` or the set is an
    /// alias set. Multiplicity is not compared beyond the record count.
    pub fn matches(&self, other: &RecordSet) -> bool {
        if self.records.len() != other.records.len() {
            return false;
        }
        if !self.rtype.is_alias()
            && !self.ignore_ttl
            && !other.ignore_ttl
            && self.ttl != other.ttl
        {
            return false;
        }
        self.records.iter().all(|r| other.contains_value(&r.value))
    }

    /// Partition the values of both sets into new, updated and deleted ones
    pub fn diff_to(&self, other: &RecordSet) -> RecordSetDiff {
        let mut diff = RecordSetDiff::default();
        for r in &self.records {
            if other.contains_value(&r.value) {
                if self.ttl != other.ttl {
                    diff.update.push(r.clone());
                }
            } else {
                diff.new.push(r.clone());
            }
        }
        for d in &other.records {
            if !self.contains_value(&d.value) {
                diff.delete.push(d.clone());
            }
        }
        diff
    }

    /// Read an encoded attribute, empty if absent or malformed
    pub fn get_attr(&self, name: &str) -> String {
        if !self.rtype.carries_attributes() {
            return String::new();
        }
        let prefix = attr_key_prefix(name);
        self.records
            .iter()
            .find_map(|r| decode_attr(&r.value, &prefix))
            .unwrap_or_default()
    }

    /// Add or replace an encoded attribute
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let prefix = attr_key_prefix(name);
        let encoded = attr_value(name, value);
        match self.records.iter_mut().find(|r| r.value.starts_with(&prefix)) {
            Some(record) => record.value = encoded,
            None => self.records.push(Record::new(encoded)),
        }
    }

    /// Remove an encoded attribute
    pub fn delete_attr(&mut self, name: &str) {
        let prefix = attr_key_prefix(name);
        if let Some(pos) = self.records.iter().position(|r| r.value.starts_with(&prefix)) {
            self.records.remove(pos);
        }
    }
}

impl fmt::Display for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<&str> = self.values().collect();
        f.write_str(&values.join(","))
    }
}

fn attr_key_prefix(name: &str) -> String {
    format!("\"{}=", name)
}

fn attr_value(name: &str, value: &str) -> String {
    format!("{}{}\"", attr_key_prefix(name), value)
}

fn decode_attr(value: &str, prefix: &str) -> Option<String> {
    let rest = value.strip_prefix(prefix)?;
    rest.strip_suffix('"').map(str::to_string)
}

/// A record set holding a single encoded attribute
pub(crate) fn new_attr_record_set(rtype: RecordType, name: &str, value: &str) -> RecordSet {
    RecordSet::new(rtype, DEFAULT_META_TTL, vec![Record::new(attr_value(name, value))])
}
