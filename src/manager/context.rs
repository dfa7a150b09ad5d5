use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{Result, VfsError};
use crate::messages::MessageCatalog;
use crate::provider::{FileRef, FileReplicator};

use super::ManagerInner;

/// Handle given to components for calling back into their manager
///
/// Holds a weak reference, so components never keep the manager alive.
/// Once the manager is dropped every call fails with `ManagerClosed`.
#[derive(Clone)]
pub struct ProviderContext {
    manager: Weak<ManagerInner>,
}

impl ProviderContext {
    pub(crate) fn new(manager: Weak<ManagerInner>) -> Self {
        Self { manager }
    }

    /// A context not attached to any manager
    pub fn detached() -> Self {
        Self {
            manager: Weak::new(),
        }
    }

    fn manager(&self) -> Result<Arc<ManagerInner>> {
        self.manager.upgrade().ok_or(VfsError::ManagerClosed)
    }

    /// Whether the owning manager is still alive
    pub fn is_attached(&self) -> bool {
        self.manager.strong_count() > 0
    }

    /// Resolve a name through the manager
    pub fn resolve_file(&self, base: Option<&FileRef>, name: &str) -> Result<FileRef> {
        self.manager()?.resolve(base, name)
    }

    /// The manager's replicator
    pub fn replicator(&self) -> Result<Arc<dyn FileReplicator>> {
        self.manager()?.replicator()
    }

    /// The manager's message catalog
    pub fn messages(&self) -> Result<Arc<MessageCatalog>> {
        Ok(self.manager()?.messages.clone())
    }

    /// Schemes currently registered with the manager, sorted
    pub fn schemes(&self) -> Result<Vec<String>> {
        Ok(self.manager()?.registry.read().schemes())
    }

    /// Whether a provider is registered for `scheme`
    pub fn has_provider(&self, scheme: &str) -> Result<bool> {
        Ok(self.manager()?.registry.read().contains(scheme))
    }
}

impl fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContext")
            .field("attached", &self.is_attached())
            .finish()
    }
}
