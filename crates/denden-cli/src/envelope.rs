//! Request preparation: caller JSON plus envelope defaults.
//!
//! Callers may omit the protocol version, the request identifier and any
//! trace field. Blank values are filled from [`EnvelopeDefaults`]; values the
//! caller supplied are never replaced.

use denden_types::{DenDenRequest, PROTOCOL_VERSION};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::AppError;

/// Trace fields and the environment variables that supply them.
const TRACE_VARIABLES: [(&str, &str); 4] = [
    ("agent_instance_id", "DENDEN_AGENT_ID"),
    ("parent_agent_instance_id", "DENDEN_PARENT_AGENT_ID"),
    ("worktree_id", "DENDEN_WORKTREE_ID"),
    ("run_id", "DENDEN_RUN_ID"),
];

/// Values stamped onto a request where the caller left them blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EnvelopeDefaults {
    pub(crate) request_id: String,
    pub(crate) created_at: String,
    pub(crate) trace: Vec<(&'static str, String)>,
}

impl EnvelopeDefaults {
    /// Captures defaults from the process environment and the current time.
    pub(crate) fn from_environment() -> Result<Self, AppError> {
        Self::capture(
            |name| std::env::var(name).ok(),
            OffsetDateTime::now_utc(),
        )
    }

    pub(crate) fn capture<F>(lookup: F, now: OffsetDateTime) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let created_at = now.format(&Rfc3339).map_err(AppError::Timestamp)?;
        let trace = TRACE_VARIABLES
            .iter()
            .filter_map(|(field, variable)| {
                lookup(variable)
                    .filter(|value| !value.is_empty())
                    .map(|value| (*field, value))
            })
            .collect();
        Ok(Self {
            request_id: format!("req_{}", Uuid::new_v4()),
            created_at,
            trace,
        })
    }
}

/// Parses `input` and fills blank envelope fields from `defaults`.
///
/// Requests without a payload are rejected here so the server is not
/// contacted for a call it would refuse.
pub(crate) fn prepare_request(
    input: &str,
    defaults: &EnvelopeDefaults,
) -> Result<DenDenRequest, AppError> {
    let mut value: Value = serde_json::from_str(input).map_err(AppError::InvalidJson)?;
    let Value::Object(envelope) = &mut value else {
        return Err(AppError::NotAnObject);
    };
    if !has_payload(envelope) {
        return Err(AppError::MissingPayload);
    }

    normalise_alias(envelope, "denden_version", "protocol_version");
    fill_blank(envelope, "protocol_version", PROTOCOL_VERSION);
    fill_blank(envelope, "request_id", &defaults.request_id);

    let trace = envelope
        .entry("trace")
        .or_insert_with(|| Value::Object(Map::new()));
    if trace.is_null() {
        *trace = Value::Object(Map::new());
    }
    if let Value::Object(trace) = trace {
        normalise_alias(trace, "parent_agent_id", "parent_agent_instance_id");
        fill_blank(trace, "created_at", &defaults.created_at);
        for (field, value) in &defaults.trace {
            fill_blank(trace, field, value);
        }
    }

    serde_json::from_value(value).map_err(AppError::InvalidRequest)
}

fn has_payload(envelope: &Map<String, Value>) -> bool {
    ["ask_user", "delegate"]
        .iter()
        .any(|key| envelope.get(*key).is_some_and(|value| !value.is_null()))
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Moves a value stored under `alias` to `canonical` unless the canonical
/// key already holds one, so the decoder never sees both spellings.
fn normalise_alias(map: &mut Map<String, Value>, alias: &str, canonical: &str) {
    let Some(value) = map.remove(alias) else {
        return;
    };
    if is_blank(map.get(canonical)) && !is_blank(Some(&value)) {
        map.insert(canonical.to_owned(), value);
    }
}

fn fill_blank(map: &mut Map<String, Value>, key: &str, value: &str) {
    if is_blank(map.get(key)) {
        map.insert(key.to_owned(), Value::String(value.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use denden_types::PayloadKind;
    use rstest::{fixture, rstest};
    use time::macros::datetime;

    #[fixture]
    fn defaults() -> EnvelopeDefaults {
        EnvelopeDefaults {
            request_id: "req_fixed".to_owned(),
            created_at: "2026-01-02T03:04:05Z".to_owned(),
            trace: vec![
                ("agent_instance_id", "agent-7".to_owned()),
                ("worktree_id", "wt-1".to_owned()),
            ],
        }
    }

    #[rstest]
    fn fills_missing_fields(defaults: EnvelopeDefaults) {
        let request = prepare_request(r#"{"ask_user":{"question":"ready?"}}"#, &defaults)
            .expect("request should prepare");

        assert_eq!(request.protocol_version, PROTOCOL_VERSION);
        assert_eq!(request.request_id, "req_fixed");
        assert_eq!(request.payload_kind(), Some(PayloadKind::AskUser));
        let trace = request.trace.expect("trace filled");
        assert_eq!(trace.created_at, "2026-01-02T03:04:05Z");
        assert_eq!(trace.agent_instance_id, "agent-7");
        assert_eq!(trace.worktree_id, "wt-1");
        assert!(trace.run_id.is_empty());
    }

    #[rstest]
    fn keeps_caller_supplied_values(defaults: EnvelopeDefaults) {
        let input = r#"{
            "request_id": "mine",
            "protocol_version": "0.9",
            "delegate": {"delegate_to": "reviewer", "task": {"text": "look"}},
            "trace": {"worktree_id": "wt-caller", "created_at": "earlier"}
        }"#;
        let request = prepare_request(input, &defaults).expect("request should prepare");

        assert_eq!(request.request_id, "mine");
        assert_eq!(request.protocol_version, "0.9");
        let trace = request.trace.expect("trace kept");
        assert_eq!(trace.worktree_id, "wt-caller");
        assert_eq!(trace.created_at, "earlier");
        assert_eq!(trace.agent_instance_id, "agent-7");
    }

    #[rstest]
    fn blank_request_id_is_replaced(defaults: EnvelopeDefaults) {
        let request = prepare_request(
            r#"{"request_id":"","ask_user":{"question":"q"}}"#,
            &defaults,
        )
        .expect("request should prepare");
        assert_eq!(request.request_id, "req_fixed");
    }

    #[rstest]
    fn caller_parent_alias_wins_over_environment() {
        let defaults = EnvelopeDefaults {
            request_id: "req_fixed".to_owned(),
            created_at: "2026-01-02T03:04:05Z".to_owned(),
            trace: vec![("parent_agent_instance_id", "env-parent".to_owned())],
        };
        let input = r#"{"ask_user":{"question":"q"},"trace":{"parent_agent_id":"caller-parent"}}"#;

        let request = prepare_request(input, &defaults).expect("request should prepare");

        let trace = request.trace.expect("trace kept");
        assert_eq!(trace.parent_agent_instance_id, "caller-parent");
    }

    #[rstest]
    #[case(r#"{"ask_user":{"question":"q"},"trace":{"parent_agent_id":""}}"#)]
    #[case(r#"{"ask_user":{"question":"q"}}"#)]
    fn blank_parent_alias_takes_environment_value(#[case] input: &str) {
        let defaults = EnvelopeDefaults {
            request_id: "req_fixed".to_owned(),
            created_at: "2026-01-02T03:04:05Z".to_owned(),
            trace: vec![("parent_agent_instance_id", "env-parent".to_owned())],
        };

        let request = prepare_request(input, &defaults).expect("request should prepare");

        let trace = request.trace.expect("trace filled");
        assert_eq!(trace.parent_agent_instance_id, "env-parent");
    }

    #[rstest]
    #[case(r#"{"protocol_version":"","denden_version":"0.8","ask_user":{"question":"q"}}"#, "0.8")]
    #[case(r#"{"protocol_version":"0.9","denden_version":"0.8","ask_user":{"question":"q"}}"#, "0.9")]
    #[case(r#"{"denden_version":"","ask_user":{"question":"q"}}"#, PROTOCOL_VERSION)]
    fn version_alias_resolves_to_one_field(
        defaults: EnvelopeDefaults,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        let request = prepare_request(input, &defaults).expect("request should prepare");
        assert_eq!(request.protocol_version, expected);
    }

    #[rstest]
    #[case("{not json")]
    #[case("")]
    fn malformed_json_is_reported(defaults: EnvelopeDefaults, #[case] input: &str) {
        let error = prepare_request(input, &defaults).expect_err("should fail");
        assert!(error.to_string().starts_with("invalid JSON: "));
    }

    #[rstest]
    #[case(r#"{"request_id":"r"}"#)]
    #[case(r#"{"ask_user":null}"#)]
    fn missing_payload_is_rejected_locally(defaults: EnvelopeDefaults, #[case] input: &str) {
        let error = prepare_request(input, &defaults).expect_err("should fail");
        assert!(matches!(error, AppError::MissingPayload));
    }

    #[rstest]
    fn both_payloads_are_rejected(defaults: EnvelopeDefaults) {
        let input = r#"{"ask_user":{"question":"q"},"delegate":{"delegate_to":"x","task":{"text":"t"}}}"#;
        let error = prepare_request(input, &defaults).expect_err("should fail");
        assert!(matches!(error, AppError::InvalidRequest(_)));
    }

    #[rstest]
    fn non_object_input_is_rejected(defaults: EnvelopeDefaults) {
        let error = prepare_request("[1, 2]", &defaults).expect_err("should fail");
        assert!(matches!(error, AppError::NotAnObject));
    }

    #[rstest]
    fn capture_reads_trace_variables() {
        let lookup = |name: &str| match name {
            "DENDEN_RUN_ID" => Some("run-9".to_owned()),
            "DENDEN_PARENT_AGENT_ID" => Some(String::new()),
            _ => None,
        };
        let defaults = EnvelopeDefaults::capture(lookup, datetime!(2026-03-04 05:06:07 UTC))
            .expect("defaults should capture");

        assert_eq!(defaults.created_at, "2026-03-04T05:06:07Z");
        assert_eq!(defaults.trace, vec![("run_id", "run-9".to_owned())]);
        assert!(defaults.request_id.starts_with("req_"));
        assert_eq!(defaults.request_id.len(), "req_".len() + 36);
    }
}
