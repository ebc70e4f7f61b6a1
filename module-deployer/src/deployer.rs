//! Deployer installing module archives into a [`ModuleRuntime`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotdeploy_monitor::{DeployError, Deployer};
use parking_lot::Mutex;
use path_absolutize::Absolutize;
use tracing::{debug, error, info};
use url::Url;

use crate::archive::is_module_archive;
use crate::error::RuntimeError;
use crate::runtime::{ModuleId, ModuleRuntime};

/// Extension handled when none is configured.
pub const DEFAULT_EXTENSION: &str = "jar";

/// Prefix asking the runtime to load the artifact in place.
const REFERENCE_SCHEME: &str = "reference:";

/// Installs, updates and uninstalls modules as their archives come and go.
///
/// Every recognized archive maps to exactly one installed module. Modules
/// that cannot start yet are retried each time another module is installed
/// or updated.
pub struct ModuleDeployer {
    name: String,
    extensions: Vec<String>,
    runtime: Arc<dyn ModuleRuntime>,
    modules: Mutex<HashMap<PathBuf, ModuleId>>,
}

impl ModuleDeployer {
    pub fn new(runtime: Arc<dyn ModuleRuntime>) -> Self {
        Self {
            name: "module-deployer".to_string(),
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            runtime,
            modules: Mutex::new(HashMap::new()),
        }
    }

    /// Handle these extensions instead of the default one.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Module installed from the artifact at `path`, if any.
    pub fn module_for(&self, path: &Path) -> Option<ModuleId> {
        self.modules.lock().get(&artifact_key(path)).copied()
    }

    /// Tracked artifacts and their modules, sorted by path.
    pub fn tracked_artifacts(&self) -> Vec<(PathBuf, ModuleId)> {
        let mut artifacts: Vec<_> = self
            .modules
            .lock()
            .iter()
            .map(|(path, module)| (path.clone(), *module))
            .collect();
        artifacts.sort();
        artifacts
    }

    fn describe(&self, module: ModuleId) -> String {
        match self.runtime.symbolic_name(module) {
            Some(name) => format!("{name} ({module})"),
            None => module.to_string(),
        }
    }

    /// Install `path`, reusing the module already recorded for it.
    ///
    /// Returns `None` when the runtime hands back its own system module.
    fn install(
        &self,
        modules: &mut HashMap<PathBuf, ModuleId>,
        path: &Path,
    ) -> Result<Option<ModuleId>, RuntimeError> {
        if let Some(module) = modules.get(path) {
            return Ok(Some(*module));
        }

        let location = location_for(path)?;
        let module = self.runtime.install(&location)?;
        if self.runtime.is_system_module(module) {
            debug!("Skipping system module installed from {}", path.display());
            return Ok(None);
        }
        modules.insert(path.to_path_buf(), module);
        Ok(Some(module))
    }

    /// Try to start every tracked module but `trigger` that is neither
    /// active nor a fragment.
    fn try_to_start_inactive(&self, modules: &HashMap<PathBuf, ModuleId>, trigger: ModuleId) {
        for module in modules.values().copied() {
            if module == trigger
                || self.runtime.is_active(module)
                || self.runtime.is_fragment(module)
            {
                continue;
            }
            debug!(
                "Trying to start module {} after having installed module {}",
                self.describe(module),
                self.describe(trigger)
            );
            if let Err(e) = self.runtime.start(module) {
                debug!(
                    "Failed to start module {} after having installed module {}: {e}",
                    self.describe(module),
                    self.describe(trigger)
                );
            }
        }
    }
}

impl Deployer for ModuleDeployer {
    fn name(&self) -> &str {
        &self.name
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Install every archive of the batch, then start the installed modules.
    fn open(&self, files: &[PathBuf]) -> Result<(), DeployError> {
        let mut modules = self.modules.lock();
        let mut to_start = Vec::new();

        for file in files {
            let path = artifact_key(file);
            if !is_module_archive(&path) {
                debug!("File {} is not a module", path.display());
                continue;
            }
            match self.install(&mut modules, &path) {
                Ok(Some(module)) => {
                    if !self.runtime.is_fragment(module) {
                        to_start.push(module);
                    }
                }
                Ok(None) => {}
                Err(e) => error!("Error during module installation of {}: {e}", path.display()),
            }
        }

        for module in to_start {
            if let Err(e) = self.runtime.start(module) {
                error!("Error during the starting of {}: {e}", self.describe(module));
            }
        }
        Ok(())
    }

    fn on_file_create(&self, file: &Path) -> Result<(), DeployError> {
        let path = artifact_key(file);
        debug!("File creation event received for {}", path.display());
        if !is_module_archive(&path) {
            debug!("File {} is not a module", path.display());
            return Ok(());
        }

        let mut modules = self.modules.lock();
        if let Some(module) = modules.get(&path).copied() {
            debug!("Updating module {} - {}", self.describe(module), path.display());
            match self.runtime.update(module) {
                Ok(()) => self.try_to_start_inactive(&modules, module),
                Err(e) => error!(
                    "Error during module update {} from {}: {e}",
                    self.describe(module),
                    path.display()
                ),
            }
            return Ok(());
        }

        debug!("Installing module from {}", path.display());
        match self.install(&mut modules, &path) {
            Ok(Some(module)) => {
                if !self.runtime.is_fragment(module) {
                    debug!("Starting module {} - {}", self.describe(module), path.display());
                    if let Err(e) = self.runtime.start(module) {
                        error!("Error during the starting of {}: {e}", self.describe(module));
                    }
                }
                self.try_to_start_inactive(&modules, module);
            }
            Ok(None) => {}
            Err(e) => error!("Error during module installation of {}: {e}", path.display()),
        }
        Ok(())
    }

    fn on_file_delete(&self, file: &Path) -> Result<(), DeployError> {
        let path = artifact_key(file);
        let removed = self.modules.lock().remove(&path);

        if let Some(module) = removed {
            info!("Uninstalling module {}", self.describe(module));
            if let Err(e) = self.runtime.uninstall(module) {
                error!("Error during the un-installation of {}: {e}", self.describe(module));
            }
        }
        Ok(())
    }
}

fn artifact_key(path: &Path) -> PathBuf {
    path.absolutize()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Runtime location of the artifact at the absolute `path`.
fn location_for(path: &Path) -> Result<String, RuntimeError> {
    let url = Url::from_file_path(path).map_err(|()| RuntimeError::Install {
        location: path.display().to_string(),
        reason: "not expressible as a file URL".to_string(),
    })?;
    Ok(format!("{REFERENCE_SCHEME}{url}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_location_is_reference_url() {
        let path = std::env::temp_dir().join("modules").join("a b.jar");
        let location = location_for(&path).unwrap();

        assert!(location.starts_with("reference:file://"));
        assert!(location.ends_with("/modules/a%20b.jar"));
    }

    #[test]
    fn test_relative_paths_are_absolutized() {
        let key = artifact_key(Path::new("deploy/a.jar"));

        assert!(key.is_absolute());
        assert_eq!(key, std::env::current_dir().unwrap().join("deploy/a.jar"));
    }
}
