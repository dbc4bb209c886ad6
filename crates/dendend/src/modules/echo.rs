//! Module that answers every payload with its own input.

use std::sync::Arc;

use denden_types::{AskUserResult, DelegateResult, DenDenRequest, DenDenResponse, PayloadKind};

use super::{MethodTable, Module};
use crate::dispatch::{HandlerError, RequestHandler};

/// Echoes `ask_user.question` as the answer and `delegate.task.text` as the
/// summary. Useful for smoke tests and client development.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoModule;

impl EchoModule {
    /// Catalog name of the module.
    pub const NAME: &'static str = "echo";
}

impl Module for EchoModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn methods(&self) -> MethodTable {
        let ask_user: Arc<dyn RequestHandler> = Arc::new(echo_ask_user);
        let delegate: Arc<dyn RequestHandler> = Arc::new(echo_delegate);
        vec![
            (PayloadKind::AskUser, ask_user),
            (PayloadKind::Delegate, delegate),
        ]
    }
}

fn echo_ask_user(request: &DenDenRequest) -> Result<DenDenResponse, HandlerError> {
    let question = request
        .ask_user()
        .map(|payload| payload.question.clone())
        .unwrap_or_default();
    Ok(DenDenResponse::ok(
        request.request_id.clone(),
        AskUserResult::new(question),
    ))
}

fn echo_delegate(request: &DenDenRequest) -> Result<DenDenResponse, HandlerError> {
    let result = request.delegate().map_or_else(DelegateResult::default, |payload| {
        DelegateResult::new(payload.task.text.clone(), payload.task.return_format)
    });
    Ok(DenDenResponse::ok(request.request_id.clone(), result))
}

#[cfg(test)]
mod tests {
    use denden_types::{AskUserPayload, DelegatePayload, ReturnFormat, Task};

    use super::*;

    #[test]
    fn echoes_question_as_answer() {
        let request = DenDenRequest::new("r1", AskUserPayload::new("what color?"));
        let response = echo_ask_user(&request).expect("echo");
        assert_eq!(response.request_id, "r1");
        assert_eq!(response.result, Some(AskUserResult::new("what color?").into()));
    }

    #[test]
    fn echoes_task_text_as_summary() {
        let mut task = Task::new("summarise the diff");
        task.return_format = ReturnFormat::Json;
        let request = DenDenRequest::new("r2", DelegatePayload::new("reviewer", task));

        let response = echo_delegate(&request).expect("echo");

        assert_eq!(
            response.result,
            Some(DelegateResult::new("summarise the diff", ReturnFormat::Json).into())
        );
    }

    #[test]
    fn registers_both_payload_kinds() {
        let kinds: Vec<_> = EchoModule.methods().into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, PayloadKind::ALL.to_vec());
    }
}
