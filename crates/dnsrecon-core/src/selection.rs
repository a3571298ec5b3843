//! Zone & domain selection
//!
//! Computes which hosted zones and which domains a provider account is
//! authoritative for, given the administrator's include/exclude filters and
//! the sub-domains a zone forwards to other zones.
//!
//! The computation is pure. Failures are reported through
//! [`SelectionResult::error`] so the partial result and the warnings stay
//! inspectable.

use std::collections::BTreeSet;

use crate::config::{ProviderSpec, SelectionFilter};
use crate::model::{match_domain, normalize_domain_name};
use crate::zone::{HostedZone, ZoneId};

/// The parts of a hosted zone the selection needs
pub trait LightHostedZone {
    fn zone_id(&self) -> &ZoneId;
    fn domain(&self) -> &str;
    fn forwarded_domains(&self) -> &[String];
}

impl LightHostedZone for HostedZone {
    fn zone_id(&self) -> &ZoneId {
        &self.id
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    fn forwarded_domains(&self) -> &[String] {
        &self.forwarded_domains
    }
}

/// Included and excluded zone ids or domains
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubSelection {
    pub include: BTreeSet<String>,
    pub exclude: BTreeSet<String>,
}

impl SubSelection {
    fn from_filter(filter: Option<&SelectionFilter>) -> Self {
        match filter {
            Some(filter) => Self {
                include: filter.include.iter().cloned().collect(),
                exclude: filter.exclude.iter().cloned().collect(),
            },
            None => Self::default(),
        }
    }
}

/// Outcome of [`calc_zone_and_domain_selection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult<Z> {
    /// Selected zones in catalogue order
    pub zones: Vec<Z>,
    pub spec_zone_sel: SubSelection,
    pub spec_domain_sel: SubSelection,
    /// Effective zone ids
    pub zone_sel: SubSelection,
    /// Effective domains
    pub domain_sel: SubSelection,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

impl<Z> SelectionResult<Z> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Calculate the effective zones and domains for a provider
///
/// # Parameters
///
/// - `spec`: provider type plus zone and domain filters
/// - `all_zones`: the unfiltered zone catalogue of the account
pub fn calc_zone_and_domain_selection<Z>(spec: &ProviderSpec, all_zones: &[Z]) -> SelectionResult<Z>
where
    Z: LightHostedZone + Clone,
{
    let mut result = SelectionResult {
        zones: Vec::new(),
        spec_zone_sel: SubSelection::from_filter(spec.zones.as_ref()),
        spec_domain_sel: SubSelection::from_filter(spec.domains.as_ref()),
        zone_sel: SubSelection::default(),
        domain_sel: SubSelection::default(),
        error: None,
        warnings: Vec::new(),
    };

    let invalid = reject_wildcards(&result.spec_domain_sel.include, "domains include")
        .or_else(|| reject_wildcards(&result.spec_domain_sel.exclude, "domains exclude"));
    if let Some(msg) = invalid {
        result.error = Some(msg);
        return result;
    }

    let zones: Vec<&Z> = all_zones
        .iter()
        .filter(|z| z.zone_id().provider_type == spec.provider_type)
        .collect();

    for z in &zones {
        let id = &z.zone_id().id;
        if result.spec_zone_sel.include.is_empty() || result.spec_zone_sel.include.contains(id) {
            result.zone_sel.include.insert(id.clone());
        } else {
            result.zone_sel.exclude.insert(id.clone());
        }
    }
    let excluded: Vec<String> = result
        .zone_sel
        .include
        .intersection(&result.spec_zone_sel.exclude)
        .cloned()
        .collect();
    for id in excluded {
        result.zone_sel.include.remove(&id);
        result.zone_sel.exclude.insert(id);
    }

    let selected: Vec<&Z> = zones
        .iter()
        .copied()
        .filter(|z| result.zone_sel.include.contains(&z.zone_id().id))
        .collect();
    if !zones.is_empty() && selected.is_empty() {
        result.error = Some("no zone available in account matches zone filter".to_string());
        return result;
    }

    let include = normalize_domains(&result.spec_domain_sel.include);
    let exclude = normalize_domains(&result.spec_domain_sel.exclude);
    result.domain_sel.include = filter_by_zones(&include, &selected, &mut result.warnings);
    result.domain_sel.exclude = filter_by_zones(&exclude, &selected, &mut result.warnings);

    if result.spec_domain_sel.include.is_empty() {
        if selected.is_empty() {
            result.error = Some("no hosted zones found".to_string());
            return result;
        }
        for z in &selected {
            result.domain_sel.include.insert(z.domain().to_string());
        }
    } else if result.domain_sel.include.is_empty() {
        let included = std::mem::take(&mut result.zone_sel.include);
        result.zone_sel.exclude.extend(included);
        let domains: Vec<&str> = selected.iter().map(|z| z.domain()).collect();
        result.error = Some(format!(
            "no domain matching hosting zones. Need to be a (sub)domain of [{}]",
            domains.join(", ")
        ));
        return result;
    }

    let (sub_include, sub_exclude) = collect_forwarded_subdomains(
        &result.domain_sel.include,
        &result.domain_sel.exclude,
        &selected,
    );
    result.domain_sel.include.extend(sub_include);
    result.domain_sel.exclude.extend(sub_exclude);

    for z in &selected {
        let served = result
            .domain_sel
            .include
            .iter()
            .any(|d| match_domain(d, z.domain()) && !is_forwarded(d, *z));
        if !served {
            let id = &z.zone_id().id;
            result.zone_sel.include.remove(id);
            result.zone_sel.exclude.insert(id.clone());
        }
    }

    for z in all_zones {
        if result.zone_sel.include.contains(&z.zone_id().id)
            || result.domain_sel.include.contains(z.domain())
        {
            continue;
        }
        result.domain_sel.exclude.insert(z.domain().to_string());
    }

    result.zones = zones
        .into_iter()
        .filter(|z| result.zone_sel.include.contains(&z.zone_id().id))
        .cloned()
        .collect();
    result
}

fn reject_wildcards(domains: &BTreeSet<String>, what: &str) -> Option<String> {
    domains.iter().find(|d| d.starts_with("*.")).map(|d| {
        format!(
            "wildcards are not allowed in {} '{}' (hint: remove the wildcard)",
            what, d
        )
    })
}

fn normalize_domains(domains: &BTreeSet<String>) -> BTreeSet<String> {
    domains.iter().map(|d| normalize_domain_name(d)).collect()
}

fn is_forwarded<Z: LightHostedZone>(domain: &str, zone: &Z) -> bool {
    zone.forwarded_domains()
        .iter()
        .any(|fd| match_domain(domain, fd))
}

/// Keep the domains served by at least one zone, warn about the others
fn filter_by_zones<Z: LightHostedZone>(
    domains: &BTreeSet<String>,
    zones: &[&Z],
    warnings: &mut Vec<String>,
) -> BTreeSet<String> {
    let mut accepted = BTreeSet::new();
    for d in domains {
        let served = zones
            .iter()
            .any(|z| match_domain(d, z.domain()) && !is_forwarded(d, *z));
        if served {
            accepted.insert(d.clone());
        } else {
            warnings.push(format!("domain {:?} not in hosted domains", d));
        }
    }
    accepted
}

/// Exclude forwarded sub-domains of fully claimed zones, but keep sub-domains
/// hosted by another selected zone
fn collect_forwarded_subdomains<Z: LightHostedZone>(
    included: &BTreeSet<String>,
    excluded: &BTreeSet<String>,
    zones: &[&Z],
) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut include = BTreeSet::new();
    let mut exclude = BTreeSet::new();

    for d in included {
        for z in zones.iter().filter(|z| z.domain() == d.as_str()) {
            for sub in z.forwarded_domains() {
                if !included.contains(sub) {
                    exclude.insert(sub.clone());
                }
            }
        }
    }
    for z in zones {
        if !excluded.contains(z.domain()) && exclude.remove(z.domain()) {
            include.insert(z.domain().to_string());
        }
    }
    (include, exclude)
}
