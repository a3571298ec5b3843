//! Zone-transfer ingestion
//!
//! Raw nameserver bindings read a zone through a zone transfer. The resource
//! records arrive ordered by owner name, and consecutive records of the same
//! owner name and type form one record set.

use hickory_proto::rr::{RData, Record as ResourceRecord};

use crate::model::{normalize_hostname, DnsSets, Record, RecordSet, RecordType};

/// Quote a TXT value unless it already is a valid quoted string
pub fn ensure_quoted_text(value: &str) -> String {
    if is_quoted(value) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => quoted.push_str(&format!("\\x{:02x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn is_quoted(value: &str) -> bool {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return false;
    };
    let mut escaped = false;
    for c in inner.chars() {
        match (escaped, c) {
            (true, _) => escaped = false,
            (false, '\\') => escaped = true,
            (false, '"') => return false,
            (false, c) if c.is_control() => return false,
            _ => {}
        }
    }
    !escaped
}

/// Convert the resource records of a zone transfer into DNS sets
///
/// Only `A`, `AAAA`, `CNAME` and `TXT` records are taken over. Every segment
/// of a TXT record becomes a separate quoted value. Comment records are
/// decoded into `META` sets like any provider-side state.
pub fn dns_sets_from_zone_transfer<'a>(
    records: impl IntoIterator<Item = &'a ResourceRecord>,
) -> DnsSets {
    let mut sets = DnsSets::new();
    let mut current: Option<(String, RecordSet)> = None;

    for rr in records {
        let name = normalize_hostname(&rr.name().to_string());
        let ttl = i64::from(rr.ttl());
        let (rtype, values) = match rr.data() {
            Some(RData::A(a)) => (RecordType::A, vec![a.0.to_string()]),
            Some(RData::AAAA(aaaa)) => (RecordType::Aaaa, vec![aaaa.0.to_string()]),
            Some(RData::CNAME(cname)) => (RecordType::Cname, vec![cname.0.to_string()]),
            Some(RData::TXT(txt)) => (
                RecordType::Txt,
                txt.txt_data()
                    .iter()
                    .map(|segment| ensure_quoted_text(&String::from_utf8_lossy(segment)))
                    .collect(),
            ),
            _ => continue,
        };

        match &mut current {
            Some((last_name, rs)) if *last_name == name && rs.rtype == rtype => {
                rs.add(values.into_iter().map(Record::new));
            }
            _ => {
                if let Some((last_name, rs)) = current.take() {
                    sets.add_record_set_from_provider(last_name, rs);
                }
                current = Some((name, RecordSet::from_values(rtype, ttl, values)));
            }
        }
    }

    if let Some((last_name, rs)) = current {
        sets.add_record_set_from_provider(last_name, rs);
    }
    sets
}
