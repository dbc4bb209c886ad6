//! Handler registry keyed by payload kind.
//!
//! Handlers are registered during startup and read concurrently while the
//! server is serving. Registration for a kind that already has a handler
//! replaces it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use denden_types::{DenDenRequest, DenDenResponse, PayloadKind};
use tracing::debug;

use super::DISPATCH_TARGET;

/// Failure raised by a handler.
///
/// The dispatch engine reports the error's `Display` text to the caller and
/// keeps the full chain for server-side logs.
pub type HandlerError = anyhow::Error;

/// Business logic serving one payload kind.
///
/// Handlers may block or perform I/O. Returning an error, or panicking, is
/// converted by the engine into an `ERR_SUBAGENT_FAILURE` response; returning
/// `Ok` hands the response back to the caller unchanged.
#[cfg_attr(test, mockall::automock)]
pub trait RequestHandler: Send + Sync {
    /// Produces the response for `request`.
    fn handle(&self, request: &DenDenRequest) -> Result<DenDenResponse, HandlerError>;
}

impl<F> RequestHandler for F
where
    F: Fn(&DenDenRequest) -> Result<DenDenResponse, HandlerError> + Send + Sync,
{
    fn handle(&self, request: &DenDenRequest) -> Result<DenDenResponse, HandlerError> {
        self(request)
    }
}

/// Thread-safe mapping from payload kind to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<PayloadKind, Arc<dyn RequestHandler>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `handler` with `kind`, replacing any previous handler.
    pub fn register(&self, kind: PayloadKind, handler: Arc<dyn RequestHandler>) {
        let previous = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, handler);
        if previous.is_some() {
            debug!(
                target: DISPATCH_TARGET,
                payload_kind = %kind,
                "replaced registered handler"
            );
        } else {
            debug!(
                target: DISPATCH_TARGET,
                payload_kind = %kind,
                "registered handler"
            );
        }
    }

    /// Returns the handler for `kind`, if one is registered.
    ///
    /// The handler is cloned out so the lock is not held while it runs.
    #[must_use]
    pub fn lookup(&self, kind: PayloadKind) -> Option<Arc<dyn RequestHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }

    /// Kinds that currently have a handler, in declaration order.
    #[must_use]
    pub fn registered_kinds(&self) -> Vec<PayloadKind> {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        PayloadKind::ALL
            .into_iter()
            .filter(|kind| handlers.contains_key(kind))
            .collect()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HandlerRegistry")
            .field("kinds", &self.registered_kinds())
            .finish()
    }
}
