//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use denden_config::{Config, SocketEndpoint};
use ortho_config::{OrthoConfig, OrthoError};

use crate::bootstrap::ConfigLoader;

/// Loader that binds an ephemeral loopback port and loads the given modules.
pub struct TestConfigLoader {
    modules: Vec<String>,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_modules(modules: &[&str]) -> Self {
        Self {
            modules: modules.iter().map(|name| (*name).to_owned()).collect(),
        }
    }

    pub fn config(&self) -> Config {
        Config {
            daemon_socket: SocketEndpoint::tcp("127.0.0.1", 0),
            max_workers: 2,
            shutdown_grace_ms: 1_000,
            modules: self.modules.clone(),
            ..Config::default()
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config())
    }
}

/// Loader that fails on an unsupported socket scheme.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("dendend"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}
