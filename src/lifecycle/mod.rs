//! Invoice lifecycle state machine.
//!
//! ```text
//! Draft -> Validated -> Submitting -> Submitted -> Valid | Invalid -> Cancelled
//!                                  \-> Rejected (attempts exhausted)
//! ```
//!
//! Guard refusals, Authority failures and validation failures are all
//! reported as an [`ActionOutcome`] with `success == false`; only malformed
//! stored state surfaces as a [`LifecycleError`].

mod action;
mod error;
mod machine;

pub use action::{Action, ActionOutcome, UnknownAction};
pub use error::LifecycleError;
pub use machine::{DEFAULT_MAX_SUBMISSION_ATTEMPTS, InvoiceLifecycle};
