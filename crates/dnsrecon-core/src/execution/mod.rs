//! Change execution
//!
//! Turns a batch of logical change requests for one zone into provider calls:
//!
//! 1. pick the relevant DNS set of the request
//! 2. reject routing policies the provider cannot express
//! 3. map through the meta-record mapping and build the provider record set
//! 4. apply create, update or delete, looking up provider ids where needed
//! 5. report each request through its `DoneHandler` and aggregate failures
//!
//! A failing request never aborts the batch.

pub mod builder;
pub mod metered;
pub mod routing;

pub use builder::{
    drop_zone_name, BuildOutcome, DefaultRecordSetBuilder, ProviderRecordSet, RecordSetBuilder,
};
pub use metered::MeteredAccess;
pub use routing::{NoRoutingPolicies, PolicySupport, RoutingPolicyChecker, SupportedRoutingPolicies};

use tracing::{debug, info, warn};

use crate::change::{ChangeAction, ChangeRequest};
use crate::error::{Error, Result};
use crate::mapping::map_to_provider;
use crate::model::RecordSet;
use crate::traits::{ProviderAccess, ProviderRecord, RecordFilter};
use crate::zone::HostedZone;

/// Execution of one change batch against one zone
pub struct Execution<'a> {
    access: &'a dyn ProviderAccess,
    builder: &'a dyn RecordSetBuilder,
    checker: &'a dyn RoutingPolicyChecker,
    zone: &'a HostedZone,
    dry_run: bool,
}

impl<'a> Execution<'a> {
    pub fn new(
        access: &'a dyn ProviderAccess,
        builder: &'a dyn RecordSetBuilder,
        checker: &'a dyn RoutingPolicyChecker,
        zone: &'a HostedZone,
    ) -> Self {
        Self {
            access,
            builder,
            checker,
            zone,
            dry_run: false,
        }
    }

    /// Classify requests without issuing mutating calls
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Map and build the provider record set of a request
    pub fn build_record_set(&self, req: &ChangeRequest) -> BuildOutcome {
        let Some(set) = req.dns_set() else {
            return BuildOutcome::Empty;
        };
        let mut set = set.clone();
        let (name, rs) = map_to_provider(req.rtype, &mut set, &self.zone.domain);
        let Some(rs) = rs else {
            return BuildOutcome::Empty;
        };

        match self.builder.build(self.zone, &name, &rs) {
            BuildOutcome::Ok(prs) if self.dry_run => {
                info!(
                    "Dry-run {}: {} record set {}[{}] with TTL {}: {}",
                    req.action,
                    prs.rtype,
                    prs.name,
                    self.zone.domain,
                    prs.ttl,
                    prs.as_record_set().record_string()
                );
                BuildOutcome::DryRun
            }
            outcome => outcome,
        }
    }

    /// Execute all requests of the batch
    ///
    /// # Returns
    ///
    /// - `Ok(())`: no request failed (always in dry-run mode)
    /// - `Err(Error::ChangesFailed(n))`: `n` requests failed
    pub async fn execute(&self, reqs: &[ChangeRequest]) -> Result<()> {
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for req in reqs {
            let Some(set) = req.dns_set() else {
                continue;
            };
            if let Err(err) = self.checker.check(set, req.rtype) {
                warn!("Rejecting {} of {} {}: {}", req.action, req.rtype, set.name, err);
                req.report_invalid(&err);
                continue;
            }

            let prs = match self.build_record_set(req) {
                BuildOutcome::Ok(prs) => prs,
                BuildOutcome::Empty | BuildOutcome::DryRun => continue,
                BuildOutcome::InvalidType(err) | BuildOutcome::InvalidName(err) => {
                    warn!("Rejecting {} of {} {}: {}", req.action, req.rtype, set.name, err);
                    req.report_invalid(&err);
                    continue;
                }
            };

            info!(
                "Desired {}: {} record set {}[{}] with TTL {}: {}",
                req.action,
                prs.rtype,
                prs.name,
                self.zone.domain,
                prs.ttl,
                prs.as_record_set().record_string()
            );
            match self.apply(req.action, &prs).await {
                Ok(()) => {
                    succeeded += 1;
                    req.report_succeeded();
                }
                Err(err) => {
                    failed += 1;
                    warn!("Apply failed for {} {}: {}", prs.rtype, prs.name, err);
                    req.report_failed(&err);
                }
            }
        }

        if self.dry_run {
            info!("No changes applied to zone {} in dry-run mode", self.zone.id);
        }
        if succeeded > 0 {
            info!("Succeeded updates for records in zone {}: {}", self.zone.id, succeeded);
        }
        if failed > 0 {
            info!("Failed updates for records in zone {}: {}", self.zone.id, failed);
            return Err(Error::ChangesFailed(failed));
        }
        Ok(())
    }

    async fn apply(&self, action: ChangeAction, prs: &ProviderRecordSet) -> Result<()> {
        match action {
            ChangeAction::Create => {
                let mut errors = Vec::new();
                for record in prs.records() {
                    if let Err(err) = self.access.create_record(self.zone, &record).await {
                        errors.push(err);
                    }
                }
                combine_errors(errors)
            }
            ChangeAction::Update => self.update(prs).await,
            ChangeAction::Delete => self.delete(prs).await,
        }
    }

    async fn lookup(&self, prs: &ProviderRecordSet) -> Result<Vec<ProviderRecord>> {
        let filter = RecordFilter::by_type_and_name(prs.rtype, prs.name.clone());
        self.access.list_records(self.zone, &filter).await
    }

    async fn update(&self, prs: &ProviderRecordSet) -> Result<()> {
        let existing = self.lookup(prs).await?;
        let current_ttl = existing.first().map_or(prs.ttl, |r| r.ttl);
        let current = RecordSet::from_values(prs.rtype, current_ttl, existing.iter().map(|r| r.value.clone()));
        let diff = prs.as_record_set().diff_to(&current);
        debug!(
            "Update of {} {}: {} new, {} updated, {} deleted",
            prs.rtype,
            prs.name,
            diff.new.len(),
            diff.update.len(),
            diff.delete.len()
        );

        let mut errors = Vec::new();
        for record in &diff.new {
            let new = ProviderRecord::new(prs.name.clone(), prs.rtype, record.value.clone(), prs.ttl);
            if let Err(err) = self.access.create_record(self.zone, &new).await {
                errors.push(err);
            }
        }
        for record in &diff.update {
            for old in existing.iter().filter(|r| r.value == record.value) {
                let updated = ProviderRecord {
                    ttl: prs.ttl,
                    ..old.clone()
                };
                if let Err(err) = self.access.update_record(self.zone, &updated).await {
                    errors.push(err);
                }
            }
        }
        for record in &diff.delete {
            for old in existing.iter().filter(|r| r.value == record.value) {
                if let Err(err) = self.access.delete_record(self.zone, old).await {
                    errors.push(err);
                }
            }
        }
        combine_errors(errors)
    }

    async fn delete(&self, prs: &ProviderRecordSet) -> Result<()> {
        let existing = self.lookup(prs).await?;
        if existing.is_empty() {
            debug!("Nothing to delete for {} {}", prs.rtype, prs.name);
        }
        let mut errors = Vec::new();
        for old in &existing {
            if let Err(err) = self.access.delete_record(self.zone, old).await {
                errors.push(err);
            }
        }
        combine_errors(errors)
    }
}

fn combine_errors(mut errors: Vec<Error>) -> Result<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(Error::Multiple(errors)),
    }
}
