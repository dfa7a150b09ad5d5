pub mod registry;
pub mod replicator;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::component::VfsComponent;
use crate::error::Result;

/// A file located by a provider
///
/// The manager never looks inside a file object; it only asks it to
/// resolve names relative to itself.
pub trait FileObject: Send + Sync + fmt::Debug {
    /// The absolute URI of this file
    fn uri(&self) -> &str;

    /// Resolve `path` relative to this file
    fn resolve_file(&self, path: &str) -> Result<FileRef>;
}

/// Shared handle to a file object
pub type FileRef = Arc<dyn FileObject>;

/// Provider for one or more URI schemes
///
/// Providers are registered with the manager under a set of schemes and are
/// lifecycle-managed by it.
pub trait FileProvider: VfsComponent {
    /// Locate a file by URI
    ///
    /// # Arguments
    /// * `base` - Base file for relative parts of the URI, if any
    /// * `uri` - The URI as given by the caller (not percent-decoded)
    fn find_file(&self, base: Option<&FileRef>, uri: &str) -> Result<FileRef>;

    /// Create a layered file system on top of `file` (e.g. the contents of an archive)
    fn create_file_system(&self, scheme: &str, file: FileRef) -> Result<FileRef>;
}

/// A provider that also understands native local file names
pub trait LocalFileProvider: FileProvider {
    /// Whether `name` is an absolute local file name (e.g. `/tmp/a` or `C:\a`)
    fn is_absolute_local_name(&self, name: &str) -> bool;

    /// Locate a local file from an absolute local name
    fn find_local_file(&self, name: &str) -> Result<FileRef>;

    /// Locate a local file from a native path
    ///
    /// Default implementation converts the path to a name and calls
    /// `find_local_file`.
    fn find_local_path(&self, path: &Path) -> Result<FileRef> {
        self.find_local_file(&path.to_string_lossy())
    }
}

/// Supplies local storage for providers that need to materialise remote content
pub trait FileReplicator: VfsComponent {
    /// Allocate a fresh local path to replicate a file named `base_name` into
    ///
    /// The path does not exist yet; the caller writes to it. Everything
    /// allocated is cleaned up when the replicator is closed.
    fn allocate_file(&self, base_name: &str) -> Result<PathBuf>;
}
