//! Test harness utilities shared by the server suites.

mod config_loader;
mod logs;
mod reporter;
mod signal;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use logs::capture_logs;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use signal::ChannelShutdownSignal;
