//! Response envelope and its constructors.
//!
//! A response carries `result` only when its status is `OK` and `error` only
//! when it is `DENIED` or `ERROR`. The constructors on [`DenDenResponse`] are
//! the supported way to build one; they stamp [`PROTOCOL_VERSION`] and keep
//! the two optional fields consistent with the status.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::PROTOCOL_VERSION;
use crate::codes::ErrorCode;
use crate::request::{PayloadKind, ReturnFormat};
use crate::wire::WireError;

/// Outcome category of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    /// The handler completed the request.
    Ok,
    /// A handler refused the request on policy grounds.
    Denied,
    /// The request was malformed or its handler failed.
    Error,
}

/// Answer to an `ask_user` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AskUserResult {
    /// The operator's answer.
    pub text: String,
}

impl AskUserResult {
    /// Builds an answer.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Outcome of a `delegate` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateResult {
    /// Summary reported by the sub-agent.
    pub summary: String,
    /// Format the summary is written in.
    pub output_format: ReturnFormat,
}

impl DelegateResult {
    /// Builds a delegation outcome.
    #[must_use]
    pub fn new(summary: impl Into<String>, output_format: ReturnFormat) -> Self {
        Self {
            summary: summary.into(),
            output_format,
        }
    }
}

/// Result variant of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseResult {
    /// Result of an `ask_user` request.
    AskUser(AskUserResult),
    /// Result of a `delegate` request.
    Delegate(DelegateResult),
}

impl ResponseResult {
    /// Returns the payload kind this result answers.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::AskUser(_) => PayloadKind::AskUser,
            Self::Delegate(_) => PayloadKind::Delegate,
        }
    }
}

impl From<AskUserResult> for ResponseResult {
    fn from(result: AskUserResult) -> Self {
        Self::AskUser(result)
    }
}

impl From<DelegateResult> for ResponseResult {
    fn from(result: DelegateResult) -> Self {
        Self::Delegate(result)
    }
}

/// Structured failure carried by `DENIED` and `ERROR` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code callers branch on.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Whether resubmitting the same request may succeed.
    #[serde(default)]
    pub retryable: bool,
}

/// Orchestrator correlation data passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseMeta {
    /// Identifier of the orchestrator action that produced the response.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub orchestrator_action_id: String,
}

impl ResponseMeta {
    /// Builds metadata referencing an orchestrator action.
    #[must_use]
    pub fn new(orchestrator_action_id: impl Into<String>) -> Self {
        Self {
            orchestrator_action_id: orchestrator_action_id.into(),
        }
    }
}

/// Response envelope returned for every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ResponseFrame", into = "ResponseFrame")]
pub struct DenDenResponse {
    /// Server protocol version.
    pub protocol_version: String,
    /// Identifier copied from the originating request.
    pub request_id: String,
    /// Outcome category.
    pub status: ResponseStatus,
    /// Result payload, present only for `OK`.
    pub result: Option<ResponseResult>,
    /// Failure detail, present only for `DENIED` and `ERROR`.
    pub error: Option<ErrorDetail>,
    /// Optional orchestrator correlation data.
    pub meta: Option<ResponseMeta>,
}

impl DenDenResponse {
    /// Builds an `OK` response carrying `result`.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, result: impl Into<ResponseResult>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            request_id: request_id.into(),
            status: ResponseStatus::Ok,
            result: Some(result.into()),
            error: None,
            meta: None,
        }
    }

    /// Builds a `DENIED` response. Denials are never retryable.
    #[must_use]
    pub fn denied(
        request_id: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self::failure(request_id, ResponseStatus::Denied, code, message, false)
    }

    /// Builds a non-retryable `ERROR` response.
    #[must_use]
    pub fn error(request_id: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::failure(request_id, ResponseStatus::Error, code, message, false)
    }

    /// Builds an `ERROR` response signalling that resubmission may succeed.
    #[must_use]
    pub fn retryable_error(
        request_id: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self::failure(request_id, ResponseStatus::Error, code, message, true)
    }

    fn failure(
        request_id: impl Into<String>,
        status: ResponseStatus,
        code: ErrorCode,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            request_id: request_id.into(),
            status,
            result: None,
            error: Some(ErrorDetail {
                code,
                message: message.into(),
                retryable,
            }),
            meta: None,
        }
    }

    /// Attaches orchestrator metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Returns `true` when the status is `OK`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    /// Checks that `result` is set only for `OK` and `error` only otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InconsistentResponse`] naming the first field
    /// that disagrees with the status.
    pub fn check_consistency(&self) -> Result<(), WireError> {
        let problem = match (self.status, &self.result, &self.error) {
            (ResponseStatus::Ok, None, _) => "lacks a result",
            (ResponseStatus::Ok, Some(_), Some(_)) => "carries an error",
            (ResponseStatus::Denied | ResponseStatus::Error, Some(_), _) => "carries a result",
            (ResponseStatus::Denied | ResponseStatus::Error, None, None) => "lacks an error",
            _ => return Ok(()),
        };
        Err(WireError::InconsistentResponse {
            status: self.status,
            problem,
        })
    }

    /// Returns the error code of a `DENIED` or `ERROR` response.
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|detail| detail.code)
    }
}

#[derive(Serialize, Deserialize)]
struct ResponseFrame {
    #[serde(default, alias = "denden_version")]
    protocol_version: String,
    #[serde(default)]
    request_id: String,
    status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ask_user_result: Option<AskUserResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delegate_result: Option<DelegateResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<ResponseMeta>,
}

impl TryFrom<ResponseFrame> for DenDenResponse {
    type Error = WireError;

    fn try_from(frame: ResponseFrame) -> Result<Self, Self::Error> {
        let result = match (frame.ask_user_result, frame.delegate_result) {
            (Some(_), Some(_)) => {
                return Err(WireError::ConflictingVariants {
                    field: "result",
                    first: "ask_user_result",
                    second: "delegate_result",
                });
            }
            (Some(ask_user), None) => Some(ResponseResult::AskUser(ask_user)),
            (None, Some(delegate)) => Some(ResponseResult::Delegate(delegate)),
            (None, None) => None,
        };
        let response = Self {
            protocol_version: frame.protocol_version,
            request_id: frame.request_id,
            status: frame.status,
            result,
            error: frame.error,
            meta: frame.meta,
        };
        response.check_consistency()?;
        Ok(response)
    }
}

impl From<DenDenResponse> for ResponseFrame {
    fn from(response: DenDenResponse) -> Self {
        let (ask_user_result, delegate_result) = match response.result {
            Some(ResponseResult::AskUser(result)) => (Some(result), None),
            Some(ResponseResult::Delegate(result)) => (None, Some(result)),
            None => (None, None),
        };
        Self {
            protocol_version: response.protocol_version,
            request_id: response.request_id,
            status: response.status,
            ask_user_result,
            delegate_result,
            error: response.error,
            meta: response.meta,
        }
    }
}
