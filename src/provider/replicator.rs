//! Temporary-directory file replicator
//!
//! Hands out unique paths inside a private temporary directory. The
//! directory is created on `init()` and removed, with everything replicated
//! into it, on `close()`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::component::{ComponentBase, VfsComponent};
use crate::error::{Result, VfsError};
use crate::manager::ProviderContext;
use crate::provider::FileReplicator;

/// Default prefix for the replicator's temporary directory
pub const DEFAULT_PREFIX: &str = "vfs_cache";

/// Temp-file replicator configuration
#[derive(Debug, Clone)]
pub struct TempFileReplicatorConfig {
    /// Parent directory for the temporary directory (system temp dir if None)
    pub temp_dir: Option<PathBuf>,
    /// Name prefix of the temporary directory
    pub prefix: String,
}

impl Default for TempFileReplicatorConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Replicator that allocates files in a private temporary directory
pub struct TempFileReplicator {
    base: ComponentBase,
    config: TempFileReplicatorConfig,
    dir: Mutex<Option<TempDir>>,
    next_id: AtomicU64,
}

impl TempFileReplicator {
    pub fn new(config: TempFileReplicatorConfig) -> Self {
        Self {
            base: ComponentBase::new(),
            config,
            dir: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// The temporary directory, while the replicator is open
    pub fn temp_dir(&self) -> Option<PathBuf> {
        self.dir.lock().as_ref().map(|d| d.path().to_path_buf())
    }

    /// Reduce a name to a single safe file-name component
    fn file_name(base_name: &str) -> &str {
        let name = base_name
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default();
        match name {
            "" | "." | ".." => "file",
            name => name,
        }
    }
}

impl Default for TempFileReplicator {
    fn default() -> Self {
        Self::new(TempFileReplicatorConfig::default())
    }
}

impl VfsComponent for TempFileReplicator {
    fn set_logger(&self, logger: tracing::Span) {
        self.base.set_logger(logger);
    }

    fn set_context(&self, context: ProviderContext) {
        self.base.set_context(context);
    }

    fn init(&self) -> Result<()> {
        let _span = self.base.logger().entered();

        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.config.prefix);
        let dir = match &self.config.temp_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        info!("Replicator using temporary directory {:?}", dir.path());
        *self.dir.lock() = Some(dir);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let _span = self.base.logger().entered();

        if let Some(dir) = self.dir.lock().take() {
            let path = dir.path().to_path_buf();
            dir.close()?;
            debug!("Removed replicator directory {:?}", path);
        }
        Ok(())
    }
}

impl FileReplicator for TempFileReplicator {
    fn allocate_file(&self, base_name: &str) -> Result<PathBuf> {
        let guard = self.dir.lock();
        let dir = guard
            .as_ref()
            .ok_or_else(|| VfsError::Backend("replicator is not open".to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let path = dir
            .path()
            .join(format!("{}_{}", id, Self::file_name(base_name)));
        debug!("Allocated replica {:?}", path);
        Ok(path)
    }
}

impl std::fmt::Debug for TempFileReplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempFileReplicator")
            .field("config", &self.config)
            .field("temp_dir", &self.temp_dir().as_deref().map(Path::display))
            .finish()
    }
}
