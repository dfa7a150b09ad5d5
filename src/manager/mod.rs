//! File system manager
//!
//! The manager owns the provider registry and every collaborator registered
//! with it. Typical use:
//!
//! - create a manager (optionally with a logger span or message catalog)
//! - add providers with `add_provider` / `add_local_provider`
//! - optionally set a default provider, a replicator and a base file
//! - resolve names with `resolve_file`
//! - `close()` (or drop) when done
//!
//! Registration and shutdown are serialised by one mutex. Resolution takes a
//! short read lock to snapshot the providers it needs and then runs the
//! providers with no lock held, so providers may call back into the manager
//! through their [`ProviderContext`].

mod context;
pub(crate) mod resolve;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, Span};

use crate::component::{ComponentSet, VfsComponent};
use crate::error::{Result, VfsError};
use crate::handler::SchemeHandlerFactory;
use crate::messages::MessageCatalog;
use crate::provider::registry::ProviderRegistry;
use crate::provider::{FileProvider, FileRef, FileReplicator, LocalFileProvider};

pub use context::ProviderContext;

use self::resolve::Route;

/// Shared manager state, referenced weakly by provider contexts
pub(crate) struct ManagerInner {
    /// Scheme bindings, local provider and default provider
    registry: RwLock<ProviderRegistry>,
    /// Owned components; the lock also serialises registration and shutdown
    components: Mutex<ComponentSet>,
    replicator: RwLock<Option<Arc<dyn FileReplicator>>>,
    base_file: RwLock<Option<FileRef>>,
    logger: Span,
    messages: Arc<MessageCatalog>,
    context: ProviderContext,
}

impl ManagerInner {
    fn new(logger: Span, messages: Arc<MessageCatalog>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            registry: RwLock::new(ProviderRegistry::new()),
            components: Mutex::new(ComponentSet::new()),
            replicator: RwLock::new(None),
            base_file: RwLock::new(None),
            logger,
            messages,
            context: ProviderContext::new(weak.clone()),
        })
    }

    /// Take ownership of a component (init at most once per instance)
    fn own(&self, components: &mut ComponentSet, component: Arc<dyn VfsComponent>) -> Result<()> {
        components.setup(component, &self.logger, &self.context)?;
        Ok(())
    }

    pub(crate) fn resolve(&self, base: Option<&FileRef>, name: &str) -> Result<FileRef> {
        let route = Route::for_name(&self.registry.read(), name);
        resolve::resolve_file(&route, base, name)
    }

    pub(crate) fn replicator(&self) -> Result<Arc<dyn FileReplicator>> {
        self.replicator.read().clone().ok_or(VfsError::NoReplicator)
    }

    fn local_provider(&self) -> Result<Arc<dyn LocalFileProvider>> {
        self.registry
            .read()
            .local_provider()
            .ok_or(VfsError::NoLocalProvider)
    }

    fn close(&self) {
        let _span = self.logger.enter();
        let mut components = self.components.lock();

        let last = self.replicator.read().clone().map(|replicator| {
            let component: Arc<dyn VfsComponent> = replicator;
            component
        });
        let closed = components.close_all(last.as_ref());

        self.registry.write().clear();
        *self.replicator.write() = None;
        *self.base_file.write() = None;

        if closed > 0 {
            info!("File system manager closed ({} components)", closed);
        }
    }
}

/// Collect and dedupe a scheme list, keeping the given order
fn collect_schemes<I, S>(schemes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut collected: Vec<String> = Vec::new();
    for scheme in schemes {
        let scheme = scheme.into();
        if !collected.contains(&scheme) {
            collected.push(scheme);
        }
    }
    collected
}

/// Virtual file system manager
///
/// Resolves URI-shaped names through the providers registered for their
/// schemes. Dropping the manager closes it.
pub struct FileSystemManager {
    inner: Arc<ManagerInner>,
}

impl FileSystemManager {
    /// Create a manager with the built-in message catalog
    pub fn new() -> Self {
        Self::with_parts(
            tracing::info_span!("vfs_manager"),
            Arc::new(MessageCatalog::new()),
        )
    }

    /// Create a manager that hands `logger` to its components
    pub fn with_logger(logger: Span) -> Self {
        Self::with_parts(logger, Arc::new(MessageCatalog::new()))
    }

    /// Create a manager with an explicit logger and message catalog
    pub fn with_parts(logger: Span, messages: Arc<MessageCatalog>) -> Self {
        Self {
            inner: ManagerInner::new(logger, messages),
        }
    }

    /// Register a provider for a set of schemes
    ///
    /// Fails with `DuplicateScheme` (and changes nothing) if any scheme is
    /// already registered. The provider is initialised before its schemes
    /// are bound, so a failed init leaves nothing reachable.
    pub fn add_provider<I, S>(&self, schemes: I, provider: Arc<dyn FileProvider>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schemes = collect_schemes(schemes);
        let mut components = self.inner.components.lock();

        self.inner.registry.read().check_schemes(&schemes)?;
        self.inner.own(&mut components, provider.clone())?;
        self.inner.registry.write().register(&schemes, provider)?;

        info!("Registered provider for schemes {:?}", schemes);
        Ok(())
    }

    /// Register a provider that also handles local file names
    ///
    /// Behaves like `add_provider` and additionally makes this provider the
    /// local provider, replacing any earlier one.
    pub fn add_local_provider<I, S>(
        &self,
        schemes: I,
        provider: Arc<dyn LocalFileProvider>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schemes = collect_schemes(schemes);
        let mut components = self.inner.components.lock();

        self.inner.registry.read().check_schemes(&schemes)?;
        self.inner.own(&mut components, provider.clone())?;
        self.inner.registry.write().register_local(&schemes, provider)?;

        info!("Registered local provider for schemes {:?}", schemes);
        Ok(())
    }

    /// Set the provider that handles names with unregistered schemes
    pub fn set_default_provider(&self, provider: Arc<dyn FileProvider>) -> Result<()> {
        let mut components = self.inner.components.lock();
        self.inner.own(&mut components, provider.clone())?;
        self.inner.registry.write().set_default_provider(provider);
        debug!("Default provider set");
        Ok(())
    }

    /// Set the file replicator. It is closed after every other component.
    pub fn set_replicator(&self, replicator: Arc<dyn FileReplicator>) -> Result<()> {
        let mut components = self.inner.components.lock();
        self.inner.own(&mut components, replicator.clone())?;
        *self.inner.replicator.write() = Some(replicator);
        debug!("Replicator set");
        Ok(())
    }

    /// The file replicator
    pub fn replicator(&self) -> Result<Arc<dyn FileReplicator>> {
        self.inner.replicator()
    }

    /// The local file provider
    pub fn local_provider(&self) -> Result<Arc<dyn LocalFileProvider>> {
        self.inner.local_provider()
    }

    /// Set the base file used for relative names
    pub fn set_base_file(&self, base: FileRef) {
        debug!("Base file set to {}", base.uri());
        *self.inner.base_file.write() = Some(base);
    }

    /// Set the base file from a native path, through the local provider
    pub fn set_base_path(&self, path: &Path) -> Result<()> {
        let base = self.inner.local_provider()?.find_local_path(path)?;
        self.set_base_file(base);
        Ok(())
    }

    /// The base file used for relative names
    pub fn base_file(&self) -> Option<FileRef> {
        self.inner.base_file.read().clone()
    }

    /// Resolve a name relative to the configured base file
    pub fn resolve_file(&self, name: &str) -> Result<FileRef> {
        let base = self.base_file();
        self.inner.resolve(base.as_ref(), name)
    }

    /// Resolve a name relative to an explicit base file
    pub fn resolve_file_from(&self, base: Option<&FileRef>, name: &str) -> Result<FileRef> {
        self.inner.resolve(base, name)
    }

    /// Resolve a name relative to a native path
    pub fn resolve_file_from_path(&self, base: &Path, name: &str) -> Result<FileRef> {
        let base = self.inner.local_provider()?.find_local_path(base)?;
        self.inner.resolve(Some(&base), name)
    }

    /// Convert a native path to a file object
    pub fn to_file_object(&self, path: &Path) -> Result<FileRef> {
        self.inner.local_provider()?.find_local_path(path)
    }

    /// Create a layered file system on top of `file` using the provider for `scheme`
    pub fn create_file_system(&self, scheme: &str, file: FileRef) -> Result<FileRef> {
        let provider = self
            .inner
            .registry
            .read()
            .lookup(scheme)
            .ok_or_else(|| VfsError::UnknownProvider {
                scheme: scheme.to_string(),
            })?;
        provider.create_file_system(scheme, file)
    }

    /// Registered schemes, sorted
    pub fn schemes(&self) -> Vec<String> {
        self.inner.registry.read().schemes()
    }

    /// Whether a provider is registered for `scheme`
    pub fn has_provider(&self, scheme: &str) -> bool {
        self.inner.registry.read().contains(scheme)
    }

    /// Number of distinct components currently owned
    pub fn component_count(&self) -> usize {
        self.inner.components.lock().len()
    }

    /// The message catalog used to render errors
    pub fn messages(&self) -> Arc<MessageCatalog> {
        self.inner.messages.clone()
    }

    /// The context handed to this manager's components
    pub fn context(&self) -> ProviderContext {
        self.inner.context.clone()
    }

    /// A scheme handler factory over a snapshot of the registered schemes
    pub fn handler_factory(&self) -> SchemeHandlerFactory {
        SchemeHandlerFactory::new(self.schemes(), self.context())
    }

    /// Close every component (the replicator last) and forget all registrations
    ///
    /// Close failures are logged, never returned. Calling this again is a
    /// no-op. Resolutions still in flight keep the providers they already
    /// hold alive, so callers should finish resolving before closing.
    pub fn close(&self) {
        self.inner.close();
    }
}

impl fmt::Debug for FileSystemManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystemManager")
            .field("schemes", &self.schemes())
            .field("components", &self.component_count())
            .field("replicator", &self.inner.replicator.read().is_some())
            .finish()
    }
}

impl Default for FileSystemManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FileSystemManager {
    fn drop(&mut self) {
        self.inner.close();
    }
}
