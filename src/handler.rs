//! Scheme handlers for a host's own URL dispatch
//!
//! A host that dispatches URLs by scheme asks the factory for a handler.
//! Schemes registered with the manager get a handler that resolves through
//! the manager; any other scheme gets a delegating handler telling the host
//! to use its own mechanism.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::manager::ProviderContext;
use crate::provider::FileRef;

/// Creates scheme handlers from a snapshot of the manager's schemes
///
/// The snapshot is taken when the factory is created; call `refresh` to
/// pick up later registrations.
#[derive(Debug, Clone)]
pub struct SchemeHandlerFactory {
    schemes: BTreeSet<String>,
    context: ProviderContext,
}

impl SchemeHandlerFactory {
    pub(crate) fn new(schemes: Vec<String>, context: ProviderContext) -> Self {
        Self {
            schemes: schemes.into_iter().collect(),
            context,
        }
    }

    /// Get a handler for `scheme`
    pub fn create_handler(&self, scheme: &str) -> SchemeHandler {
        if self.schemes.contains(scheme) {
            SchemeHandler::Vfs(VfsUrlHandler {
                scheme: scheme.to_string(),
                context: self.context.clone(),
            })
        } else {
            SchemeHandler::Delegate {
                scheme: scheme.to_string(),
            }
        }
    }

    /// Re-read the registered schemes from the manager
    pub fn refresh(&mut self) -> Result<()> {
        self.schemes = self.context.schemes()?.into_iter().collect();
        debug!("Handler factory refreshed ({} schemes)", self.schemes.len());
        Ok(())
    }

    /// Schemes handled by the manager, sorted
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(String::as_str)
    }
}

/// Handler returned by [`SchemeHandlerFactory::create_handler`]
#[derive(Debug, Clone)]
pub enum SchemeHandler {
    /// Resolves URLs through the manager
    Vfs(VfsUrlHandler),
    /// Not ours; the host should fall back to its default handler
    Delegate { scheme: String },
}

impl SchemeHandler {
    pub fn scheme(&self) -> &str {
        match self {
            SchemeHandler::Vfs(handler) => handler.scheme(),
            SchemeHandler::Delegate { scheme } => scheme,
        }
    }

    pub fn is_vfs(&self) -> bool {
        matches!(self, SchemeHandler::Vfs(_))
    }
}

/// Handler bound to a manager's provider context
#[derive(Debug, Clone)]
pub struct VfsUrlHandler {
    scheme: String,
    context: ProviderContext,
}

impl VfsUrlHandler {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Open a URL as a file object
    pub fn open(&self, url: &str) -> Result<FileRef> {
        self.context.resolve_file(None, url)
    }
}
