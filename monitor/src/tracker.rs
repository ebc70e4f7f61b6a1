//! Discovery of deployer providers.
//!
//! The host runtime announces deployers as they appear and disappear. A
//! monitor subscribes through [`DeployerSource`] and receives the
//! announcements on whatever thread the source uses.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::deployer::{DeployerRef, same_deployer};

/// Identifies a subscription to a [`DeployerSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receives deployer arrivals and departures.
pub trait DeployerListener: Send + Sync {
    fn deployer_added(&self, deployer: DeployerRef);
    fn deployer_removed(&self, deployer: &DeployerRef);
}

/// Something that announces deployers, typically the host runtime's
/// capability registry.
pub trait DeployerSource: Send + Sync {
    /// Start delivering announcements to `listener`.
    ///
    /// Deployers already available are replayed synchronously, on the
    /// calling thread, before this returns.
    fn subscribe(&self, listener: Arc<dyn DeployerListener>) -> SubscriptionId;

    /// Stop delivering announcements. No removal callbacks are sent.
    fn unsubscribe(&self, id: SubscriptionId);
}

#[derive(Default)]
struct CatalogState {
    next_id: u64,
    deployers: Vec<DeployerRef>,
    listeners: Vec<(SubscriptionId, Arc<dyn DeployerListener>)>,
}

/// In-process [`DeployerSource`].
///
/// Listeners are always called outside the catalog's own lock, so a
/// listener may register or unregister deployers from its callback.
#[derive(Default)]
pub struct DeployerCatalog {
    state: Mutex<CatalogState>,
}

impl DeployerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `deployer` available and announce it to every subscriber.
    ///
    /// Registering the same deployer twice is a no-op.
    pub fn register(&self, deployer: DeployerRef) {
        let listeners = {
            let mut state = self.state.lock();
            if state.deployers.iter().any(|d| same_deployer(d, &deployer)) {
                return;
            }
            state.deployers.push(deployer.clone());
            snapshot_listeners(&state)
        };

        info!(
            "Deployer {} available for {:?}",
            deployer.name(),
            deployer.extensions()
        );
        for listener in listeners {
            listener.deployer_added(deployer.clone());
        }
    }

    /// Withdraw `deployer` and announce its departure.
    pub fn unregister(&self, deployer: &DeployerRef) {
        let listeners = {
            let mut state = self.state.lock();
            let before = state.deployers.len();
            state.deployers.retain(|d| !same_deployer(d, deployer));
            if state.deployers.len() == before {
                return;
            }
            snapshot_listeners(&state)
        };

        info!("Deployer {} withdrawn", deployer.name());
        for listener in listeners {
            listener.deployer_removed(deployer);
        }
    }

    /// Currently available deployers.
    pub fn deployers(&self) -> Vec<DeployerRef> {
        self.state.lock().deployers.clone()
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().listeners.len()
    }
}

impl DeployerSource for DeployerCatalog {
    fn subscribe(&self, listener: Arc<dyn DeployerListener>) -> SubscriptionId {
        let (id, available) = {
            let mut state = self.state.lock();
            let id = SubscriptionId(state.next_id);
            state.next_id += 1;
            state.listeners.push((id, listener.clone()));
            (id, state.deployers.clone())
        };

        debug!("Subscription {id:?} replaying {} deployers", available.len());
        for deployer in available {
            listener.deployer_added(deployer);
        }
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state.lock().listeners.retain(|(sid, _)| *sid != id);
    }
}

fn snapshot_listeners(state: &CatalogState) -> Vec<Arc<dyn DeployerListener>> {
    state.listeners.iter().map(|(_, l)| l.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployer::Deployer;
    use crate::error::DeployError;
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    struct Noop(Vec<String>);

    impl Deployer for Noop {
        fn name(&self) -> &str {
            "noop"
        }
        fn extensions(&self) -> &[String] {
            &self.0
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

    #[derive(Default)]
    struct Journal(Mutex<Vec<String>>);

    impl DeployerListener for Journal {
        fn deployer_added(&self, deployer: DeployerRef) {
            self.0.lock().push(format!("+{}", deployer.name()));
        }
        fn deployer_removed(&self, deployer: &DeployerRef) {
            self.0.lock().push(format!("-{}", deployer.name()));
        }
    }

    #[test]
    fn test_subscribe_replays_available_deployers() {
        let catalog = DeployerCatalog::new();
        let deployer: DeployerRef = Arc::new(Noop(vec!["jar".to_string()]));
        catalog.register(deployer.clone());
        catalog.register(deployer.clone());

        let journal = Arc::new(Journal::default());
        let id = catalog.subscribe(journal.clone());
        assert_eq!(*journal.0.lock(), vec!["+noop"]);

        catalog.unregister(&deployer);
        assert_eq!(*journal.0.lock(), vec!["+noop", "-noop"]);

        catalog.unsubscribe(id);
        assert_eq!(catalog.subscriber_count(), 0);
        catalog.register(deployer);
        assert_eq!(journal.0.lock().len(), 2);
        assert_eq!(catalog.deployers().len(), 1);
    }
}
