//! Common test utilities and fixtures
//!
//! Recording mocks for providers, local providers, file objects and
//! replicators. Every mock writes lifecycle and lookup events into a shared
//! [`Journal`] so tests can assert on ordering across collaborators.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Span;

use vfs_manager::{
    ComponentBase, FileObject, FileProvider, FileRef, FileReplicator, LocalFileProvider,
    ProviderContext, Result, VfsComponent, VfsError,
};

pub use vfs_manager::logging::init_test_logging;

// ============================================================================
// Event journal
// ============================================================================

/// Ordered log of events shared by every mock in a test
#[derive(Clone, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Events starting with `prefix`, in order
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

// ============================================================================
// File objects
// ============================================================================

/// In-memory file object identified only by its URI
#[derive(Debug)]
pub struct MemFile {
    uri: String,
}

impl MemFile {
    pub fn new(uri: impl Into<String>) -> FileRef {
        Arc::new(Self { uri: uri.into() })
    }
}

impl FileObject for MemFile {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn resolve_file(&self, path: &str) -> Result<FileRef> {
        Ok(MemFile::new(format!(
            "{}/{}",
            self.uri.trim_end_matches('/'),
            path
        )))
    }
}

// ============================================================================
// Lifecycle bookkeeping shared by the mocks
// ============================================================================

/// Init/close counters plus failure switches
#[derive(Default)]
pub struct Lifecycle {
    base: ComponentBase,
    inits: AtomicUsize,
    closes: AtomicUsize,
    fail_init: bool,
    fail_close: bool,
}

impl Lifecycle {
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn context(&self) -> Option<ProviderContext> {
        self.base.context()
    }

    fn init(&self, name: &str, journal: &Journal) -> Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        journal.record(format!("init:{}", name));
        if self.fail_init {
            return Err(VfsError::Backend(format!("{} refused to start", name)));
        }
        Ok(())
    }

    fn close(&self, name: &str, journal: &Journal) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        journal.record(format!("close:{}", name));
        if self.fail_close {
            return Err(VfsError::Backend(format!("{} refused to stop", name)));
        }
        Ok(())
    }
}

macro_rules! impl_component {
    ($ty:ty) => {
        impl VfsComponent for $ty {
            fn set_logger(&self, logger: Span) {
                self.lifecycle.base.set_logger(logger);
            }

            fn set_context(&self, context: ProviderContext) {
                self.lifecycle.base.set_context(context);
            }

            fn init(&self) -> Result<()> {
                self.lifecycle.init(&self.name, &self.journal)
            }

            fn close(&self) -> Result<()> {
                self.lifecycle.close(&self.name, &self.journal)
            }
        }
    };
}

// ============================================================================
// Providers
// ============================================================================

/// Provider answering every lookup with `<name>|<uri>`
pub struct MockProvider {
    pub name: String,
    pub journal: Journal,
    pub lifecycle: Lifecycle,
}

impl MockProvider {
    pub fn new(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal: journal.clone(),
            lifecycle: Lifecycle::default(),
        })
    }

    pub fn failing_init(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal: journal.clone(),
            lifecycle: Lifecycle {
                fail_init: true,
                ..Lifecycle::default()
            },
        })
    }

    pub fn failing_close(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal: journal.clone(),
            lifecycle: Lifecycle {
                fail_close: true,
                ..Lifecycle::default()
            },
        })
    }
}

impl_component!(MockProvider);

impl FileProvider for MockProvider {
    fn find_file(&self, base: Option<&FileRef>, uri: &str) -> Result<FileRef> {
        let base = base.map(|b| b.uri().to_string()).unwrap_or_default();
        self.journal
            .record(format!("find:{}:{}:{}", self.name, base, uri));
        Ok(MemFile::new(format!("{}|{}", self.name, uri)))
    }

    fn create_file_system(&self, scheme: &str, file: FileRef) -> Result<FileRef> {
        self.journal
            .record(format!("layer:{}:{}", self.name, scheme));
        Ok(MemFile::new(format!("{}:{}!/", scheme, file.uri())))
    }
}

/// Whether `name` looks like `C:\dir` or `C:/dir`
pub fn is_drive_path(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/')
}

/// Local provider treating `/...` and drive-letter names as absolute
pub struct MockLocalProvider {
    pub name: String,
    pub journal: Journal,
    pub lifecycle: Lifecycle,
}

impl MockLocalProvider {
    pub fn new(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal: journal.clone(),
            lifecycle: Lifecycle::default(),
        })
    }
}

impl_component!(MockLocalProvider);

impl FileProvider for MockLocalProvider {
    fn find_file(&self, base: Option<&FileRef>, uri: &str) -> Result<FileRef> {
        let base = base.map(|b| b.uri().to_string()).unwrap_or_default();
        self.journal
            .record(format!("find:{}:{}:{}", self.name, base, uri));
        Ok(MemFile::new(format!("{}|{}", self.name, uri)))
    }

    fn create_file_system(&self, _scheme: &str, _file: FileRef) -> Result<FileRef> {
        Err(VfsError::Backend("local files do not layer".to_string()))
    }
}

impl LocalFileProvider for MockLocalProvider {
    fn is_absolute_local_name(&self, name: &str) -> bool {
        name.starts_with('/') || is_drive_path(name)
    }

    fn find_local_file(&self, name: &str) -> Result<FileRef> {
        self.journal.record(format!("local:{}:{}", self.name, name));
        Ok(MemFile::new(format!("file://{}", name)))
    }
}

/// Provider that resolves `<scheme>:<rest>` by asking the manager for `<rest>`
///
/// Exercises calls back into the manager from inside a provider.
pub struct ForwardingProvider {
    pub name: String,
    pub journal: Journal,
    pub lifecycle: Lifecycle,
}

impl ForwardingProvider {
    pub fn new(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal: journal.clone(),
            lifecycle: Lifecycle::default(),
        })
    }
}

impl_component!(ForwardingProvider);

impl FileProvider for ForwardingProvider {
    fn find_file(&self, base: Option<&FileRef>, uri: &str) -> Result<FileRef> {
        let context = self
            .lifecycle
            .context()
            .ok_or_else(|| VfsError::Backend("no context".to_string()))?;
        let rest = uri.split_once(':').map(|(_, rest)| rest).unwrap_or(uri);
        self.journal.record(format!("forward:{}:{}", self.name, rest));
        context.resolve_file(base, rest)
    }

    fn create_file_system(&self, _scheme: &str, file: FileRef) -> Result<FileRef> {
        Ok(file)
    }
}

// ============================================================================
// Replicator
// ============================================================================

/// Replicator handing out paths under a fixed fake root
pub struct MockReplicator {
    pub name: String,
    pub journal: Journal,
    pub lifecycle: Lifecycle,
    next: AtomicUsize,
}

impl MockReplicator {
    pub fn new(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal: journal.clone(),
            lifecycle: Lifecycle::default(),
            next: AtomicUsize::new(0),
        })
    }
}

impl_component!(MockReplicator);

impl FileReplicator for MockReplicator {
    fn allocate_file(&self, base_name: &str) -> Result<PathBuf> {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(PathBuf::from(format!("/replica/{}_{}", id, base_name)))
    }
}
