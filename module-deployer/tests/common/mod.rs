//! In-memory module runtime for deployer tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use hotdeploy_module_deployer::{Manifest, ModuleId, ModuleRuntime, RuntimeError};
use parking_lot::Mutex;
use url::Url;

/// Header listing the modules a module needs before it can start.
pub const REQUIRE_BUNDLE: &str = "Require-Bundle";

#[derive(Debug, Clone)]
struct Installed {
    location: String,
    name: String,
    requires: Vec<String>,
    fragment: bool,
    active: bool,
    start_attempts: usize,
    activations: usize,
    updates: usize,
}

#[derive(Default)]
struct State {
    next_id: u64,
    modules: BTreeMap<ModuleId, Installed>,
    uninstalled: Vec<ModuleId>,
}

/// Runtime primitive that can be made to fail for a module name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Install,
    Update,
    Start,
    Uninstall,
}

/// Runtime resolving `Require-Bundle` against installed modules.
#[derive(Default)]
pub struct FakeRuntime {
    system_name: Option<String>,
    state: Mutex<State>,
    failures: Mutex<HashSet<(Primitive, String)>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archives named `name` resolve to the runtime's own module.
    pub fn with_system_module(name: &str) -> Self {
        Self {
            system_name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Make `primitive` fail for the module named `name`.
    pub fn fail(&self, primitive: Primitive, name: &str) {
        self.failures.lock().insert((primitive, name.to_string()));
    }

    fn fails(&self, primitive: Primitive, name: &str) -> bool {
        self.failures.lock().contains(&(primitive, name.to_string()))
    }

    pub fn installed_count(&self) -> usize {
        self.state.lock().modules.len()
    }

    pub fn id_of(&self, name: &str) -> Option<ModuleId> {
        self.state
            .lock()
            .modules
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(id, _)| *id)
    }

    pub fn start_attempts(&self, module: ModuleId) -> usize {
        self.with_module(module, |m| m.start_attempts)
    }

    pub fn activations(&self, module: ModuleId) -> usize {
        self.with_module(module, |m| m.activations)
    }

    pub fn updates(&self, module: ModuleId) -> usize {
        self.with_module(module, |m| m.updates)
    }

    pub fn uninstalled(&self) -> Vec<ModuleId> {
        self.state.lock().uninstalled.clone()
    }

    fn with_module(&self, module: ModuleId, f: impl FnOnce(&Installed) -> usize) -> usize {
        self.state.lock().modules.get(&module).map(f).unwrap_or(0)
    }
}

fn read_manifest(location: &str) -> Result<Manifest, String> {
    let url = location
        .strip_prefix("reference:")
        .ok_or_else(|| "not a reference location".to_string())?;
    let path = Url::parse(url)
        .map_err(|e| e.to_string())?
        .to_file_path()
        .map_err(|()| "not a file URL".to_string())?;
    Manifest::read_from(&path)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "no manifest".to_string())
}

fn describe(manifest: &Manifest) -> Result<(String, Vec<String>, bool), String> {
    let name = manifest
        .symbolic_name()
        .ok_or_else(|| "no symbolic name".to_string())?
        .to_string();
    let requires = manifest
        .get(REQUIRE_BUNDLE)
        .map(|value| {
            value
                .split(',')
                .map(|r| r.split(';').next().unwrap_or(r).trim().to_string())
                .filter(|r| !r.is_empty())
                .collect()
        })
        .unwrap_or_default();
    Ok((name, requires, manifest.is_fragment()))
}

impl ModuleRuntime for FakeRuntime {
    fn install(&self, location: &str) -> Result<ModuleId, RuntimeError> {
        let failure = |reason: String| RuntimeError::Install {
            location: location.to_string(),
            reason,
        };
        let (name, requires, fragment) =
            describe(&read_manifest(location).map_err(failure)?).map_err(failure)?;

        if self.fails(Primitive::Install, &name) {
            return Err(failure(format!("{name} refused to install")));
        }
        if self.system_name.as_deref() == Some(name.as_str()) {
            return Ok(ModuleId::SYSTEM);
        }

        let mut state = self.state.lock();
        if let Some((id, _)) = state.modules.iter().find(|(_, m)| m.location == location) {
            return Ok(*id);
        }
        state.next_id += 1;
        let id = ModuleId(state.next_id);
        state.modules.insert(
            id,
            Installed {
                location: location.to_string(),
                name,
                requires,
                fragment,
                active: false,
                start_attempts: 0,
                activations: 0,
                updates: 0,
            },
        );
        Ok(id)
    }

    fn update(&self, module: ModuleId) -> Result<(), RuntimeError> {
        let (location, current_name) = {
            let state = self.state.lock();
            let installed = state
                .modules
                .get(&module)
                .ok_or(RuntimeError::UnknownModule(module))?;
            (installed.location.clone(), installed.name.clone())
        };
        let failure = |reason: String| RuntimeError::Update { module, reason };
        if self.fails(Primitive::Update, &current_name) {
            return Err(failure(format!("{current_name} refused to update")));
        }
        let (name, requires, fragment) =
            describe(&read_manifest(&location).map_err(failure)?).map_err(failure)?;

        let mut state = self.state.lock();
        let installed = state
            .modules
            .get_mut(&module)
            .ok_or(RuntimeError::UnknownModule(module))?;
        installed.name = name;
        installed.requires = requires;
        installed.fragment = fragment;
        installed.updates += 1;
        Ok(())
    }

    fn start(&self, module: ModuleId) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        let missing: Vec<String> = {
            let installed = state
                .modules
                .get(&module)
                .ok_or(RuntimeError::UnknownModule(module))?;
            installed
                .requires
                .iter()
                .filter(|r| !state.modules.values().any(|m| &m.name == *r))
                .cloned()
                .collect()
        };

        let installed = state
            .modules
            .get_mut(&module)
            .ok_or(RuntimeError::UnknownModule(module))?;
        installed.start_attempts += 1;
        if installed.fragment {
            return Err(RuntimeError::Start {
                module,
                reason: "fragments cannot be started".to_string(),
            });
        }
        if installed.active {
            return Ok(());
        }
        if self.fails(Primitive::Start, &installed.name) {
            return Err(RuntimeError::Start {
                module,
                reason: format!("{} refused to start", installed.name),
            });
        }
        if !missing.is_empty() {
            return Err(RuntimeError::Start {
                module,
                reason: format!("missing {}", missing.join(", ")),
            });
        }
        installed.active = true;
        installed.activations += 1;
        Ok(())
    }

    fn uninstall(&self, module: ModuleId) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        let name = state
            .modules
            .get(&module)
            .map(|m| m.name.clone())
            .ok_or(RuntimeError::UnknownModule(module))?;
        if self.fails(Primitive::Uninstall, &name) {
            return Err(RuntimeError::Uninstall {
                module,
                reason: format!("{name} refused to uninstall"),
            });
        }
        state
            .modules
            .remove(&module)
            .ok_or(RuntimeError::UnknownModule(module))?;
        state.uninstalled.push(module);
        Ok(())
    }

    fn is_fragment(&self, module: ModuleId) -> bool {
        self.state
            .lock()
            .modules
            .get(&module)
            .is_some_and(|m| m.fragment)
    }

    fn is_active(&self, module: ModuleId) -> bool {
        self.state
            .lock()
            .modules
            .get(&module)
            .is_some_and(|m| m.active)
    }

    fn symbolic_name(&self, module: ModuleId) -> Option<String> {
        self.state
            .lock()
            .modules
            .get(&module)
            .map(|m| m.name.clone())
    }
}

/// Write a module archive named `file` into `dir`.
pub fn write_module(
    dir: &Path,
    file: &str,
    name: &str,
    requires: &[&str],
    fragment_host: Option<&str>,
) -> PathBuf {
    let mut manifest = format!("Manifest-Version: 1.0\nBundle-SymbolicName: {name}\n");
    if !requires.is_empty() {
        manifest.push_str(&format!("{REQUIRE_BUNDLE}: {}\n", requires.join(",")));
    }
    if let Some(host) = fragment_host {
        manifest.push_str(&format!("Fragment-Host: {host}\n"));
    }

    let path = dir.join(file);
    let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
    let options = zip::write::FileOptions::default();
    zip.start_file("META-INF/MANIFEST.MF", options).unwrap();
    zip.write_all(manifest.as_bytes()).unwrap();
    zip.start_file(format!("{}/Activator.class", name.replace('.', "/")), options)
        .unwrap();
    zip.write_all(b"\xca\xfe\xba\xbe").unwrap();
    zip.finish().unwrap();
    path
}
