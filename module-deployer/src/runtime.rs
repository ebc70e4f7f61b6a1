//! Interface of the host module runtime.

use std::fmt;

use crate::error::RuntimeError;

/// Runtime identity of an installed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u64);

impl ModuleId {
    /// The runtime's own module.
    pub const SYSTEM: ModuleId = ModuleId(0);
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle primitives of the runtime artifacts are deployed into.
///
/// Implementations must be callable from several threads at once.
pub trait ModuleRuntime: Send + Sync {
    /// Install the artifact at `location`.
    ///
    /// Installing a location that is already installed returns the
    /// existing module.
    fn install(&self, location: &str) -> Result<ModuleId, RuntimeError>;

    /// Reload a module from its location, in place.
    fn update(&self, module: ModuleId) -> Result<(), RuntimeError>;

    /// Start a module. Starting an active module does nothing.
    fn start(&self, module: ModuleId) -> Result<(), RuntimeError>;

    /// Remove a module from the runtime.
    fn uninstall(&self, module: ModuleId) -> Result<(), RuntimeError>;

    /// Whether the module only attaches to a host and is never started.
    fn is_fragment(&self, module: ModuleId) -> bool;

    /// Whether the module is started.
    fn is_active(&self, module: ModuleId) -> bool;

    /// Human-readable module name, for logs.
    fn symbolic_name(&self, _module: ModuleId) -> Option<String> {
        None
    }

    /// Whether `module` is the runtime's own module.
    fn is_system_module(&self, module: ModuleId) -> bool {
        module == ModuleId::SYSTEM
    }
}
