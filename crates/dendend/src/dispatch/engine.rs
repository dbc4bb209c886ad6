//! Envelope validation, handler selection and failure normalisation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use denden_types::{DenDenRequest, DenDenResponse, ErrorCode, PayloadKind, StatusResponse};
use tracing::{debug, error, warn};

use super::DISPATCH_TARGET;
use super::registry::{HandlerError, HandlerRegistry, RequestHandler};
use super::status::StatusReporter;
use crate::telemetry::panic_text;

/// The dispatch engine together with the uptime reporter.
///
/// `send` never panics and never returns an error: every outcome, including
/// a failing or panicking handler, is folded into a [`DenDenResponse`].
#[derive(Debug, Default)]
pub struct DenDenService {
    registry: HandlerRegistry,
    status: StatusReporter,
}

impl DenDenService {
    /// Creates a service with an empty registry and a fresh uptime clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry consulted by [`Self::send`].
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Registers `handler` for `kind`, replacing any earlier handler.
    pub fn register(&self, kind: PayloadKind, handler: Arc<dyn RequestHandler>) {
        self.registry.register(kind, handler);
    }

    /// Validates `request` and routes it to the handler for its payload kind.
    pub fn send(&self, request: &DenDenRequest) -> DenDenResponse {
        let request_id = request.request_id.as_str();
        if request_id.is_empty() {
            warn!(target: DISPATCH_TARGET, "rejected request without request_id");
            return DenDenResponse::error("", ErrorCode::InvalidRequest, "request_id is required");
        }
        warn_on_unlocated_trace(request);

        let Some(kind) = request.payload_kind() else {
            warn!(target: DISPATCH_TARGET, request_id, "rejected request without payload");
            return DenDenResponse::error(
                request_id,
                ErrorCode::InvalidRequest,
                "payload is required",
            );
        };

        let Some(handler) = self.registry.lookup(kind) else {
            warn!(
                target: DISPATCH_TARGET,
                request_id,
                payload_kind = %kind,
                "no handler registered"
            );
            return DenDenResponse::error(
                request_id,
                ErrorCode::InvalidRequest,
                format!("no handler registered for payload kind '{kind}'"),
            );
        };

        debug!(
            target: DISPATCH_TARGET,
            request_id,
            payload_kind = %kind,
            "dispatching request"
        );

        match invoke(handler.as_ref(), request) {
            Ok(response) => match response.check_consistency() {
                Ok(()) => response,
                Err(problem) => {
                    error!(
                        target: DISPATCH_TARGET,
                        request_id,
                        payload_kind = %kind,
                        %problem,
                        "handler returned an inconsistent response"
                    );
                    DenDenResponse::error(
                        request_id,
                        ErrorCode::ErrSubagentFailure,
                        format!("handler returned an invalid response: {problem}"),
                    )
                }
            },
            Err(fault) => {
                error!(
                    target: DISPATCH_TARGET,
                    request_id,
                    payload_kind = %kind,
                    error = ?fault,
                    "handler failed"
                );
                DenDenResponse::error(request_id, ErrorCode::ErrSubagentFailure, fault.to_string())
            }
        }
    }

    /// Uptime since the service was constructed.
    #[must_use]
    pub fn status(&self) -> StatusResponse {
        self.status.status()
    }
}

fn invoke(
    handler: &dyn RequestHandler,
    request: &DenDenRequest,
) -> Result<DenDenResponse, HandlerError> {
    panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request))).unwrap_or_else(|payload| {
        Err(match panic_text(payload.as_ref()) {
            Some(message) => anyhow::anyhow!("handler panicked: {message}"),
            None => anyhow::anyhow!("handler panicked"),
        })
    })
}

fn warn_on_unlocated_trace(request: &DenDenRequest) {
    if let Some(trace) = &request.trace
        && !trace.locates_agent()
    {
        warn!(
            target: DISPATCH_TARGET,
            request_id = %request.request_id,
            run_id = %trace.run_id,
            "trace carries neither worktree_id nor agent_instance_id"
        );
    }
}
