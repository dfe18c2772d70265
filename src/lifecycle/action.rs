use std::fmt;
use std::str::FromStr;

use crate::core::{Invoice, InvoiceStatus};

/// A caller-issued lifecycle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Validate,
    Submit,
    Resubmit,
    CheckStatus,
    Cancel,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Validate,
        Action::Submit,
        Action::Resubmit,
        Action::CheckStatus,
        Action::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Submit => "submit",
            Self::Resubmit => "resubmit",
            Self::CheckStatus => "check_status",
            Self::Cancel => "cancel",
        }
    }

    /// Statuses from which this action may run.
    pub fn allowed_from(&self) -> &'static [InvoiceStatus] {
        use InvoiceStatus::*;
        match self {
            Self::Validate => &[Draft, Invalid],
            Self::Submit => &[Validated, Invalid],
            Self::Resubmit => &[Invalid],
            Self::CheckStatus => &[Submitted],
            Self::Cancel => &[Draft, Validated, Invalid, Valid],
        }
    }

    pub fn is_allowed_from(&self, status: InvoiceStatus) -> bool {
        self.allowed_from().contains(&status)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The action name was not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action '{}'", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Result of applying an action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub success: bool,
    /// Human-readable description of what happened.
    pub message: String,
    /// The invoice after the action; untouched when `mutated` is false.
    pub invoice: Invoice,
    /// False exactly when a guard refused the action.
    pub mutated: bool,
}

impl ActionOutcome {
    pub(crate) fn succeeded(invoice: Invoice, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            invoice,
            mutated: true,
        }
    }

    pub(crate) fn failed(invoice: Invoice, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            invoice,
            mutated: true,
        }
    }

    pub(crate) fn refused(invoice: Invoice, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            invoice,
            mutated: false,
        }
    }
}
