//! Closed vocabulary of denial and error codes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Machine-readable code carried in [`crate::ErrorDetail::code`].
///
/// Callers branch on these strings, so the serialised spellings are part of
/// the stable protocol contract. The dispatch engine only ever emits
/// [`ErrorCode::InvalidRequest`] and [`ErrorCode::ErrSubagentFailure`]; the
/// remaining codes are produced by handlers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The envelope failed structural validation.
    InvalidRequest,
    /// The caller's role may not perform the requested action.
    DenyRoleNotAllowed,
    /// Delegation would exceed the permitted nesting depth.
    DenyDepthLimit,
    /// The run has exhausted its budget.
    DenyBudgetExceeded,
    /// The request asked for tools the caller may not use.
    DenyToolsNotAllowed,
    /// Policy requires a human to take this decision.
    DenyPolicyRequiresHuman,
    /// A sub-agent did not finish in time.
    ErrSubagentTimeout,
    /// A sub-agent or handler failed.
    ErrSubagentFailure,
}

impl ErrorCode {
    /// Every code in the vocabulary.
    pub const ALL: [Self; 8] = [
        Self::InvalidRequest,
        Self::DenyRoleNotAllowed,
        Self::DenyDepthLimit,
        Self::DenyBudgetExceeded,
        Self::DenyToolsNotAllowed,
        Self::DenyPolicyRequiresHuman,
        Self::ErrSubagentTimeout,
        Self::ErrSubagentFailure,
    ];

    /// Returns the wire spelling of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Returns `true` for the `DENY_*` policy codes.
    #[must_use]
    pub const fn is_denial(self) -> bool {
        matches!(
            self,
            Self::DenyRoleNotAllowed
                | Self::DenyDepthLimit
                | Self::DenyBudgetExceeded
                | Self::DenyToolsNotAllowed
                | Self::DenyPolicyRequiresHuman
        )
    }
}
