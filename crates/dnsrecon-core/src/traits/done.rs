// # Completion callbacks
//
// Every change request may carry a `DoneHandler`. The execution reports
// exactly one outcome per processed request through it.

use crate::error::Error;

/// Receives the outcome of a single change request
///
/// Implementations are called from the task executing the batch and must not
/// block.
pub trait DoneHandler: Send + Sync {
    /// The request can never be applied by this provider
    ///
    /// The caller should not resubmit the request unchanged.
    fn set_invalid(&self, err: &Error);

    /// The provider rejected the request or could not be reached
    fn failed(&self, err: &Error);

    /// All provider calls of the request succeeded
    fn succeeded(&self);
}
