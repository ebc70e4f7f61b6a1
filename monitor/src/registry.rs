//! Extension to deployer index.

use std::collections::HashMap;

use tracing::debug;

use crate::deployer::{DeployerRef, same_deployer};

/// Maps each file extension to the deployers handling it, in the order
/// they registered.
///
/// The registry itself is not synchronized; the
/// [`DirectoryMonitor`](crate::DirectoryMonitor) guards it.
#[derive(Default)]
pub struct DeployerRegistry {
    /// Deployers by extension, in arrival order.
    by_extension: HashMap<String, Vec<DeployerRef>>,

    /// Extensions in the order they first appeared.
    extensions: Vec<String>,
}

impl DeployerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `deployer` for `extension`.
    ///
    /// Returns `false` if it was already registered for that extension.
    pub fn add(&mut self, extension: &str, deployer: DeployerRef) -> bool {
        let entries = self.by_extension.entry(extension.to_string()).or_default();
        if entries.iter().any(|d| same_deployer(d, &deployer)) {
            return false;
        }
        if entries.is_empty() && !self.extensions.iter().any(|e| e == extension) {
            self.extensions.push(extension.to_string());
        }
        debug!("Registered deployer {} for .{extension}", deployer.name());
        entries.push(deployer);
        true
    }

    /// Remove every registration of `deployer`.
    ///
    /// Returns the number of removed entries.
    pub fn remove(&mut self, deployer: &DeployerRef) -> usize {
        let mut removed = 0;
        for entries in self.by_extension.values_mut() {
            let before = entries.len();
            entries.retain(|d| !same_deployer(d, deployer));
            removed += before - entries.len();
        }

        self.by_extension.retain(|_, entries| !entries.is_empty());
        let by_extension = &self.by_extension;
        self.extensions.retain(|e| by_extension.contains_key(e));

        if removed > 0 {
            debug!("Unregistered deployer {} ({removed} entries)", deployer.name());
        }
        removed
    }

    /// Point-in-time copy of the deployers for `extension`.
    pub fn deployers_for(&self, extension: &str) -> Vec<DeployerRef> {
        self.by_extension.get(extension).cloned().unwrap_or_default()
    }

    /// Registered extensions, each listed once.
    pub fn extensions(&self) -> Vec<String> {
        self.extensions.clone()
    }

    /// Every registered deployer once, in first-registration order.
    pub fn distinct_deployers(&self) -> Vec<DeployerRef> {
        let mut distinct: Vec<DeployerRef> = Vec::new();
        for extension in &self.extensions {
            for deployer in self.by_extension.get(extension).into_iter().flatten() {
                if !distinct.iter().any(|d| same_deployer(d, deployer)) {
                    distinct.push(deployer.clone());
                }
            }
        }
        distinct
    }

    /// Whether no deployer is registered.
    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployer::Deployer;
    use crate::error::DeployError;
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    struct Named {
        name: String,
        extensions: Vec<String>,
    }

    impl Deployer for Named {
        fn name(&self) -> &str {
            &self.name
        }
        fn extensions(&self) -> &[String] {
            &self.extensions
        }
        fn open(&self, _files: &[PathBuf]) -> Result<(), DeployError> {
            Ok(())
        }
        fn on_file_create(&self, _file: &Path) -> Result<(), DeployError> {
            Ok(())
        }
        fn on_file_delete(&self, _file: &Path) -> Result<(), DeployError> {
            Ok(())
        }
    }

    fn deployer(name: &str, extensions: &[&str]) -> DeployerRef {
        Arc::new(Named {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        })
    }

    fn names(deployers: &[DeployerRef]) -> Vec<&str> {
        deployers.iter().map(|d| d.name()).collect()
    }

    #[test]
    fn test_dispatch_order_is_registration_order() {
        let mut registry = DeployerRegistry::new();
        let first = deployer("first", &["jar"]);
        let second = deployer("second", &["jar"]);

        assert!(registry.add("jar", first.clone()));
        assert!(registry.add("jar", second));
        assert!(!registry.add("jar", first));

        assert_eq!(names(&registry.deployers_for("jar")), vec!["first", "second"]);
        assert!(registry.deployers_for("cfg").is_empty());
    }

    #[test]
    fn test_reregistration_moves_to_the_back() {
        let mut registry = DeployerRegistry::new();
        let first = deployer("first", &["jar"]);
        let second = deployer("second", &["jar"]);
        registry.add("jar", first.clone());
        registry.add("jar", second);

        assert_eq!(registry.remove(&first), 1);
        registry.add("jar", first);

        assert_eq!(names(&registry.deployers_for("jar")), vec!["second", "first"]);
    }

    #[test]
    fn test_remove_drops_every_extension() {
        let mut registry = DeployerRegistry::new();
        let multi = deployer("multi", &["jar", "war"]);
        registry.add("jar", multi.clone());
        registry.add("war", multi.clone());

        assert_eq!(registry.extensions(), vec!["jar", "war"]);
        assert_eq!(registry.remove(&multi), 2);
        assert!(registry.is_empty());
        assert!(registry.extensions().is_empty());
    }

    #[test]
    fn test_distinct_deployers() {
        let mut registry = DeployerRegistry::new();
        let multi = deployer("multi", &["jar", "war"]);
        let single = deployer("single", &["war"]);
        registry.add("jar", multi.clone());
        registry.add("war", multi);
        registry.add("war", single);

        assert_eq!(names(&registry.distinct_deployers()), vec!["multi", "single"]);
    }

    #[test]
    fn test_snapshot_is_not_torn_by_later_mutation() {
        let mut registry = DeployerRegistry::new();
        let first = deployer("first", &["jar"]);
        registry.add("jar", first.clone());

        let snapshot = registry.deployers_for("jar");
        registry.remove(&first);

        assert_eq!(names(&snapshot), vec!["first"]);
        assert!(registry.deployers_for("jar").is_empty());
    }
}
