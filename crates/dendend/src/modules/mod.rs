//! Pluggable handler bundles attached to a server at startup.
//!
//! A [`Module`] contributes handlers for one or more payload kinds. Modules
//! named in configuration are resolved through the [`ModuleCatalog`], which
//! maps names to constructors compiled into the binary.

mod echo;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use denden_types::PayloadKind;
use thiserror::Error;

use crate::dispatch::RequestHandler;
use crate::server::DenDenServer;

pub use self::echo::EchoModule;

/// Handlers a module contributes, keyed by payload kind.
pub type MethodTable = Vec<(PayloadKind, Arc<dyn RequestHandler>)>;

/// A named bundle of request handlers.
pub trait Module: Send + Sync {
    /// Unique module name.
    fn name(&self) -> &str;

    /// Handlers registered when the module is loaded.
    fn methods(&self) -> MethodTable;

    /// Called once after the module's handlers are registered.
    ///
    /// Modules may register further handlers or perform setup against the
    /// running server here.
    fn on_load(&self, server: &DenDenServer) {
        let _ = server;
    }
}

type ModuleFactory = fn() -> Box<dyn Module>;

/// Raised when configuration names a module the catalog does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown module '{name}' (available: {available})")]
pub struct UnknownModuleError {
    /// Name requested by configuration.
    pub name: String,
    /// Comma-separated catalog names.
    pub available: String,
}

/// Name-to-constructor map of modules available to the server.
pub struct ModuleCatalog {
    factories: BTreeMap<&'static str, ModuleFactory>,
}

impl ModuleCatalog {
    /// Catalog with no modules.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Catalog of the modules shipped with the server.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.insert(EchoModule::NAME, echo_module);
        catalog
    }

    /// Adds or replaces a constructor under `name`.
    pub fn insert(&mut self, name: &'static str, factory: ModuleFactory) {
        self.factories.insert(name, factory);
    }

    /// Names known to the catalog, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Instantiates the module called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownModuleError`] when no constructor is registered.
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn Module>, UnknownModuleError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| UnknownModuleError {
                name: name.to_owned(),
                available: self.names().join(", "),
            })
    }

    /// Instantiates every named module, failing on the first unknown name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownModuleError`] for the first name without a constructor.
    pub fn resolve<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<Box<dyn Module>>, UnknownModuleError> {
        names
            .iter()
            .map(|name| self.instantiate(name.as_ref()))
            .collect()
    }
}

fn echo_module() -> Box<dyn Module> {
    Box::new(EchoModule)
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ModuleCatalog")
            .field("modules", &self.names())
            .finish()
    }
}
