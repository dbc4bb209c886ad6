//! Test suites for the DenDen server.

mod dispatch_behaviour;
pub(crate) mod support;
