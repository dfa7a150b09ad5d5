use std::io;
use thiserror::Error;

use crate::messages::MessageCatalog;

/// Main error type for vfs-manager operations
#[derive(Error, Debug)]
pub enum VfsError {
    #[error("Multiple providers registered for URL scheme \"{scheme}\"")]
    DuplicateScheme { scheme: String },

    #[error("Unknown scheme \"{scheme}\" in URI \"{name}\"")]
    UnknownScheme { scheme: String, name: String },

    #[error("No file system provider is registered for URI scheme \"{scheme}\"")]
    UnknownProvider { scheme: String },

    #[error("Could not find file with URI \"{name}\" because it is a relative path, and no base URI was provided")]
    MissingBase { name: String },

    #[error("No file replicator configured")]
    NoReplicator,

    #[error("Could not find a file provider that can handle local files")]
    NoLocalProvider,

    #[error("Invalid URI escape sequence in \"{name}\"")]
    InvalidEscape { name: String },

    #[error("File system manager has been dropped")]
    ManagerClosed,

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VfsError {
    /// Message catalog code for this error
    pub fn code(&self) -> &'static str {
        match self {
            VfsError::DuplicateScheme { .. } => "vfs.impl/multiple-providers-for-scheme.error",
            VfsError::UnknownScheme { .. } => "vfs.impl/unknown-scheme.error",
            VfsError::UnknownProvider { .. } => "vfs.impl/unknown-provider.error",
            VfsError::MissingBase { .. } => "vfs.impl/find-rel-file.error",
            VfsError::NoReplicator => "vfs.impl/no-replicator.error",
            VfsError::NoLocalProvider => "vfs.impl/no-local-file-provider.error",
            VfsError::InvalidEscape { .. } => "vfs.provider/invalid-escape-sequence.error",
            VfsError::ManagerClosed => "vfs.impl/manager-closed.error",
            VfsError::NotFound(_) => "vfs.provider/file-not-found.error",
            VfsError::Backend(_) => "vfs.provider/backend.error",
            VfsError::Io(_) => "vfs.provider/io.error",
            VfsError::Config(_) => "vfs.impl/config.error",
        }
    }

    /// Positional message parameters, in the order the catalog template expects
    pub fn params(&self) -> Vec<String> {
        match self {
            VfsError::DuplicateScheme { scheme } | VfsError::UnknownProvider { scheme } => {
                vec![scheme.clone()]
            }
            VfsError::UnknownScheme { scheme, name } => vec![scheme.clone(), name.clone()],
            VfsError::MissingBase { name } | VfsError::InvalidEscape { name } => {
                vec![name.clone()]
            }
            VfsError::NoReplicator | VfsError::NoLocalProvider | VfsError::ManagerClosed => {
                Vec::new()
            }
            VfsError::NotFound(detail) | VfsError::Backend(detail) | VfsError::Config(detail) => {
                vec![detail.clone()]
            }
            VfsError::Io(e) => vec![e.to_string()],
        }
    }

    /// Render this error through a message catalog
    pub fn message(&self, catalog: &MessageCatalog) -> String {
        let params = self.params();
        let params: Vec<&dyn std::fmt::Display> =
            params.iter().map(|p| p as &dyn std::fmt::Display).collect();
        catalog.format(self.code(), &params)
    }
}

/// Result type alias for vfs-manager operations
pub type Result<T> = std::result::Result<T, VfsError>;
