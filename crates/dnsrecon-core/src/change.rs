//! Change requests exchanged with the surrounding controller

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::model::{DnsSet, RecordType};
use crate::traits::DoneHandler;

/// What a change request does with its record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One desired change of one record type of a DNS set
#[derive(Clone)]
pub struct ChangeRequest {
    pub action: ChangeAction,
    pub rtype: RecordType,
    /// Desired state, used by create and update
    pub addition: Option<DnsSet>,
    /// Previous state, used by delete
    pub deletion: Option<DnsSet>,
    pub done: Option<Arc<dyn DoneHandler>>,
}

impl ChangeRequest {
    pub fn create(rtype: RecordType, addition: DnsSet) -> Self {
        Self {
            action: ChangeAction::Create,
            rtype,
            addition: Some(addition),
            deletion: None,
            done: None,
        }
    }

    pub fn update(rtype: RecordType, deletion: Option<DnsSet>, addition: DnsSet) -> Self {
        Self {
            action: ChangeAction::Update,
            rtype,
            addition: Some(addition),
            deletion,
            done: None,
        }
    }

    pub fn delete(rtype: RecordType, deletion: DnsSet) -> Self {
        Self {
            action: ChangeAction::Delete,
            rtype,
            addition: None,
            deletion: Some(deletion),
            done: None,
        }
    }

    pub fn with_done(mut self, done: Arc<dyn DoneHandler>) -> Self {
        self.done = Some(done);
        self
    }

    /// The DNS set the action applies to
    pub fn dns_set(&self) -> Option<&DnsSet> {
        match self.action {
            ChangeAction::Create | ChangeAction::Update => self.addition.as_ref(),
            ChangeAction::Delete => self.deletion.as_ref(),
        }
    }

    pub(crate) fn report_invalid(&self, err: &Error) {
        if let Some(done) = &self.done {
            done.set_invalid(err);
        }
    }

    pub(crate) fn report_failed(&self, err: &Error) {
        if let Some(done) = &self.done {
            done.failed(err);
        }
    }

    pub(crate) fn report_succeeded(&self) {
        if let Some(done) = &self.done {
            done.succeeded();
        }
    }
}

impl fmt::Debug for ChangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeRequest")
            .field("action", &self.action)
            .field("rtype", &self.rtype)
            .field("addition", &self.addition)
            .field("deletion", &self.deletion)
            .field("done", &self.done.is_some())
            .finish()
    }
}
