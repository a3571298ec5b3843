// # Meta-Record Mapping
//
// Providers cannot store the virtual `META` record type. Its attributes are
// kept in a TXT record set at a derived "comment" name instead:
//
// | logical name  | provider name           |
// |---------------|-------------------------|
// | `a.zone`      | `comment-a.zone`        |
// | `*.a.zone`    | `*.comment-a.zone`      |
// | `*.zone`      | `*.comment-.zone`       |
//
// The comment record also carries its own `prefix` attribute, so a custom
// prefix chosen by an earlier writer is honored on both directions.

use crate::model::{DnsSet, DnsSetName, RecordSet, RecordType, ATTR_PREFIX};

/// Default prefix of comment records
pub const TXT_PREFIX: &str = "comment-";

/// Legacy separator of wildcard comment records at the zone base
const LEGACY_BASE_SEPARATOR: &str = "-base.";

/// Encode the record set of `rtype` into the name and set a provider stores
///
/// Non-`META` types map to themselves. For `META` a missing prefix
/// attribute is written into `dnsset` itself, so decoding the result yields
/// the set as it is after this call.
/// Returns `None` as record set if the DNS set has no set of that type.
pub fn map_to_provider(
    rtype: RecordType,
    dnsset: &mut DnsSet,
    base: &str,
) -> (DnsSetName, Option<RecordSet>) {
    if rtype != RecordType::Meta {
        let rs = dnsset.record_set(rtype).cloned();
        return (dnsset.name.clone(), rs);
    }
    if dnsset.record_set(RecordType::Meta).is_none() {
        return (dnsset.name.clone(), None);
    }

    let mut prefix = dnsset.get_attr(ATTR_PREFIX);
    if prefix.is_empty() {
        prefix = TXT_PREFIX.to_string();
        dnsset.set_attr(ATTR_PREFIX, &prefix);
    }
    let Some(mut meta) = dnsset.record_set(RecordType::Meta).cloned() else {
        return (dnsset.name.clone(), None);
    };
    meta.rtype = RecordType::Txt;

    let name = comment_record_name(&dnsset.name.dns_name, &prefix, base);
    (dnsset.name.with_dns_name(name), Some(meta))
}

/// Decode a record set read from a provider
///
/// TXT sets carrying a `prefix` attribute under a matching comment name are
/// turned back into `META` sets under their logical name. Everything else
/// passes unchanged.
pub fn map_from_provider(name: DnsSetName, mut rs: RecordSet) -> (DnsSetName, RecordSet) {
    if rs.rtype != RecordType::Txt {
        return (name, rs);
    }
    let prefix = rs.get_attr(ATTR_PREFIX);
    if prefix.is_empty() {
        return (name, rs);
    }

    let (wildcard, dns_name) = match name.dns_name.strip_prefix("*.") {
        Some(rest) => ("*.", rest),
        None => ("", name.dns_name.as_str()),
    };
    let Some(rest) = dns_name.strip_prefix(prefix.as_str()) else {
        return (name, rs);
    };
    let rest = rest
        .strip_prefix(LEGACY_BASE_SEPARATOR)
        .or_else(|| rest.strip_prefix('.'))
        .unwrap_or(rest);

    rs.rtype = RecordType::Meta;
    let logical = name.with_dns_name(format!("{}{}", wildcard, rest));
    (logical, rs)
}

fn comment_record_name(dns_name: &str, prefix: &str, base: &str) -> String {
    match dns_name.strip_prefix("*.") {
        Some(rest) if rest == base => format!("*.{}.{}", prefix, rest),
        Some(rest) => format!("*.{}{}", prefix, rest),
        None => format!("{}{}", prefix, dns_name),
    }
}
