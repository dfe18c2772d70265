use thiserror::Error;

/// Stored invoice state the lifecycle cannot act on.
///
/// Workflow-guard refusals and Authority failures are not errors; they are
/// reported through [`ActionOutcome`](super::ActionOutcome).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LifecycleError {
    /// An accepted invoice carries no Authority long ID.
    #[error("invoice {invoice} is Valid but has no ETA long ID")]
    MissingLongId { invoice: String },
}
