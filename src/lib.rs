//! vfs-manager: a virtual file system manager with pluggable providers
//!
//! The manager maps URI schemes to file providers and resolves names such
//! as `zip:/data/archive.zip!/entry.txt`, `/home/user/notes.txt` or
//! `relative/name` to file objects by asking the right provider.
//!
//! # Architecture
//!
//! - **Providers**: Implement [`FileProvider`] (or [`LocalFileProvider`] for
//!   the local file system) and are registered for one or more schemes.
//! - **Components**: Every collaborator is a [`VfsComponent`]; the manager
//!   injects a logger span and a [`ProviderContext`], initialises each
//!   instance once and closes it once on shutdown.
//! - **Replicator**: A [`FileReplicator`] hands out local scratch files;
//!   [`TempFileReplicator`] is the stock implementation.
//! - **Messages**: Errors carry a message code rendered through a
//!   [`MessageCatalog`] with positional `{N}` parameters.
//! - **Builder**: [`ManagerBuilder`] assembles a manager from a YAML
//!   [`Config`](config::Config) and provider factories.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vfs_manager::config::Config;
//! use vfs_manager::{FileProvider, FileSystemManager, ManagerBuilder};
//!
//! # fn zip_provider() -> Arc<dyn FileProvider> { unimplemented!() }
//! # fn example() -> vfs_manager::Result<()> {
//! // Wire providers by hand
//! let manager = FileSystemManager::new();
//! manager.add_provider(["zip", "jar"], zip_provider())?;
//! let entry = manager.resolve_file("zip:/data/archive.zip!/entry.txt")?;
//!
//! // Or from configuration
//! let config = Config::from_file("vfs.yaml".as_ref())?;
//! vfs_manager::logging::init(&config.logging);
//! let manager = ManagerBuilder::new()
//!     .provider_factory("zip", |_options| Ok(zip_provider()))
//!     .build(&config)?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod component;
pub mod config;
pub mod env;
pub mod error;
pub mod handler;
pub mod logging;
pub mod manager;
pub mod messages;
pub mod provider;
pub mod uri;

pub use builder::ManagerBuilder;
pub use component::{ComponentBase, VfsComponent};
pub use error::{Result, VfsError};
pub use handler::{SchemeHandler, SchemeHandlerFactory};
pub use manager::{FileSystemManager, ProviderContext};
pub use messages::MessageCatalog;
pub use provider::replicator::TempFileReplicator;
pub use provider::{FileObject, FileProvider, FileRef, FileReplicator, LocalFileProvider};
