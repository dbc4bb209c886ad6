//! Request envelope and payload variants.
//!
//! On the wire the payload variant is a top-level key of the request object
//! (`"ask_user"` or `"delegate"`). Decoding goes through a flat frame so that
//! a request naming both keys is rejected instead of silently keeping one.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::PROTOCOL_VERSION;
use crate::wire::WireError;

/// Identifies which payload variant a request carries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayloadKind {
    /// Ask a human operator a question.
    AskUser,
    /// Delegate work to a sub-agent.
    Delegate,
}

impl PayloadKind {
    /// Every payload kind in declaration order.
    pub const ALL: [Self; 2] = [Self::AskUser, Self::Delegate];

    /// Returns the wire identifier of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Question routed to a human operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AskUserPayload {
    /// Question text shown to the operator.
    pub question: String,
    /// Optional fixed answers the operator may pick from.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl AskUserPayload {
    /// Builds a free-form question.
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            choices: Vec::new(),
        }
    }

    /// Restricts the answer to the supplied choices.
    #[must_use]
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
}

/// Format a delegated task should report its result in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnFormat {
    /// Plain text summary.
    #[default]
    Text,
    /// Structured JSON document.
    Json,
}

/// Unit of work handed to a sub-agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    /// Instructions for the sub-agent.
    pub text: String,
    /// Requested result format.
    pub return_format: ReturnFormat,
}

impl Task {
    /// Builds a task with the default text return format.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            return_format: ReturnFormat::default(),
        }
    }
}

/// Request to delegate a task to another agent role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegatePayload {
    /// Role the work is delegated to, for example `implementer` or `reviewer`.
    pub delegate_to: String,
    /// The delegated task.
    pub task: Task,
}

impl DelegatePayload {
    /// Builds a delegation to `role`.
    #[must_use]
    pub fn new(delegate_to: impl Into<String>, task: Task) -> Self {
        Self {
            delegate_to: delegate_to.into(),
            task,
        }
    }
}

/// The single payload variant carried by a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Question for a human operator.
    AskUser(AskUserPayload),
    /// Delegation to a sub-agent.
    Delegate(DelegatePayload),
}

impl Payload {
    /// Returns the kind used to select a handler.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::AskUser(_) => PayloadKind::AskUser,
            Self::Delegate(_) => PayloadKind::Delegate,
        }
    }
}

impl From<AskUserPayload> for Payload {
    fn from(payload: AskUserPayload) -> Self {
        Self::AskUser(payload)
    }
}

impl From<DelegatePayload> for Payload {
    fn from(payload: DelegatePayload) -> Self {
        Self::Delegate(payload)
    }
}

/// Correlation metadata attached by the calling agent.
///
/// Every field is informational and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trace {
    /// Orchestrator run identifier.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub run_id: String,
    /// Identifier of the calling agent instance.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub agent_instance_id: String,
    /// Identifier of the agent that spawned the caller.
    #[serde(skip_serializing_if = "String::is_empty", alias = "parent_agent_id")]
    pub parent_agent_instance_id: String,
    /// Identifier of the worktree the caller operates in.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub worktree_id: String,
    /// RFC 3339 timestamp of when the caller built the request.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created_at: String,
}

impl Trace {
    /// Returns `true` when the trace identifies either the agent or its worktree.
    #[must_use]
    pub fn locates_agent(&self) -> bool {
        !self.worktree_id.is_empty() || !self.agent_instance_id.is_empty()
    }
}

/// Request envelope submitted by orchestration callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RequestFrame", into = "RequestFrame")]
pub struct DenDenRequest {
    /// Caller's protocol version; informational only.
    pub protocol_version: String,
    /// Caller-chosen identifier echoed on the response.
    pub request_id: String,
    /// The payload variant, if any was supplied.
    pub payload: Option<Payload>,
    /// Optional correlation metadata.
    pub trace: Option<Trace>,
}

impl DenDenRequest {
    /// Builds a request stamped with [`PROTOCOL_VERSION`].
    #[must_use]
    pub fn new(request_id: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            request_id: request_id.into(),
            payload: Some(payload.into()),
            trace: None,
        }
    }

    /// Attaches correlation metadata.
    #[must_use]
    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Returns the kind of the carried payload.
    #[must_use]
    pub fn payload_kind(&self) -> Option<PayloadKind> {
        self.payload.as_ref().map(Payload::kind)
    }

    /// Returns the `ask_user` payload when present.
    #[must_use]
    pub fn ask_user(&self) -> Option<&AskUserPayload> {
        match &self.payload {
            Some(Payload::AskUser(payload)) => Some(payload),
            _ => None,
        }
    }

    /// Returns the `delegate` payload when present.
    #[must_use]
    pub fn delegate(&self) -> Option<&DelegatePayload> {
        match &self.payload {
            Some(Payload::Delegate(payload)) => Some(payload),
            _ => None,
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct RequestFrame {
    #[serde(alias = "denden_version", skip_serializing_if = "String::is_empty")]
    protocol_version: String,
    request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ask_user: Option<AskUserPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delegate: Option<DelegatePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<Trace>,
}

impl TryFrom<RequestFrame> for DenDenRequest {
    type Error = WireError;

    fn try_from(frame: RequestFrame) -> Result<Self, Self::Error> {
        let payload = match (frame.ask_user, frame.delegate) {
            (Some(_), Some(_)) => {
                return Err(WireError::ConflictingVariants {
                    field: "payload",
                    first: PayloadKind::AskUser.as_str(),
                    second: PayloadKind::Delegate.as_str(),
                });
            }
            (Some(ask_user), None) => Some(Payload::AskUser(ask_user)),
            (None, Some(delegate)) => Some(Payload::Delegate(delegate)),
            (None, None) => None,
        };
        Ok(Self {
            protocol_version: frame.protocol_version,
            request_id: frame.request_id,
            payload,
            trace: frame.trace,
        })
    }
}

impl From<DenDenRequest> for RequestFrame {
    fn from(request: DenDenRequest) -> Self {
        let (ask_user, delegate) = match request.payload {
            Some(Payload::AskUser(payload)) => (Some(payload), None),
            Some(Payload::Delegate(payload)) => (None, Some(payload)),
            None => (None, None),
        };
        Self {
            protocol_version: request.protocol_version,
            request_id: request.request_id,
            ask_user,
            delegate,
            trace: request.trace,
        }
    }
}
