//! Configuration-driven manager assembly
//!
//! The builder maps provider kinds named in the configuration to factory
//! closures supplied by the application, then registers everything with a
//! new manager in a fixed order: replicator, providers, default provider,
//! base directory. Message overrides are read first but applied last, so a
//! failed build leaves a caller-supplied catalog untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, Span};

use crate::config::{Config, ProviderOptions, ReplicatorConfig};
use crate::error::{Result, VfsError};
use crate::manager::FileSystemManager;
use crate::messages::MessageCatalog;
use crate::provider::replicator::{TempFileReplicator, TempFileReplicatorConfig, DEFAULT_PREFIX};
use crate::provider::{FileProvider, FileReplicator, LocalFileProvider};

/// Creates a provider from its configured options
pub type ProviderFactory =
    Box<dyn Fn(&ProviderOptions) -> Result<Arc<dyn FileProvider>> + Send + Sync>;

/// Creates a local provider from its configured options
pub type LocalProviderFactory =
    Box<dyn Fn(&ProviderOptions) -> Result<Arc<dyn LocalFileProvider>> + Send + Sync>;

enum Factory {
    Standard(ProviderFactory),
    Local(LocalProviderFactory),
}

impl From<&ReplicatorConfig> for TempFileReplicatorConfig {
    fn from(config: &ReplicatorConfig) -> Self {
        Self {
            temp_dir: config.temp_dir.clone(),
            prefix: config
                .prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
        }
    }
}

/// Builds a [`FileSystemManager`] from a [`Config`]
#[derive(Default)]
pub struct ManagerBuilder {
    factories: HashMap<String, Factory>,
    logger: Option<Span>,
    messages: Option<Arc<MessageCatalog>>,
    replicator: Option<Arc<dyn FileReplicator>>,
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for provider entries of `kind`
    pub fn provider_factory<F>(mut self, kind: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ProviderOptions) -> Result<Arc<dyn FileProvider>> + Send + Sync + 'static,
    {
        self.factories
            .insert(kind.into(), Factory::Standard(Box::new(factory)));
        self
    }

    /// Register a factory for local provider entries of `kind`
    pub fn local_provider_factory<F>(mut self, kind: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ProviderOptions) -> Result<Arc<dyn LocalFileProvider>> + Send + Sync + 'static,
    {
        self.factories
            .insert(kind.into(), Factory::Local(Box::new(factory)));
        self
    }

    /// Logger span handed to the manager's components
    pub fn logger(mut self, logger: Span) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Message catalog to use instead of a fresh built-in one
    pub fn messages(mut self, messages: Arc<MessageCatalog>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Replicator to use instead of the configured one
    pub fn replicator(mut self, replicator: Arc<dyn FileReplicator>) -> Self {
        self.replicator = Some(replicator);
        self
    }

    /// Provider kinds with a registered factory, sorted
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.factories.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    fn factory(&self, kind: &str) -> Result<&Factory> {
        self.factories
            .get(kind)
            .ok_or_else(|| VfsError::Config(format!("Unknown provider kind {:?}", kind)))
    }

    /// Validate `config` and build a manager from it
    ///
    /// On error the partially built manager is dropped, which closes every
    /// component initialised so far.
    pub fn build(&self, config: &Config) -> Result<FileSystemManager> {
        config.validate()?;

        // Parsed up front, applied only once the build has succeeded
        let overrides = config
            .messages
            .as_deref()
            .map(MessageCatalog::read_overrides)
            .transpose()?;

        let messages = self
            .messages
            .clone()
            .unwrap_or_else(|| Arc::new(MessageCatalog::new()));

        let logger = self
            .logger
            .clone()
            .unwrap_or_else(|| tracing::info_span!("vfs_manager"));
        let manager = FileSystemManager::with_parts(logger, messages.clone());

        match (&self.replicator, &config.replicator) {
            (Some(replicator), _) => manager.set_replicator(replicator.clone())?,
            (None, Some(replicator_config)) => manager.set_replicator(Arc::new(
                TempFileReplicator::new(replicator_config.into()),
            ))?,
            (None, None) => {}
        }

        for provider in &config.providers {
            let schemes = provider.schemes.iter().cloned();
            match self.factory(&provider.kind)? {
                Factory::Standard(factory) => {
                    manager.add_provider(schemes, factory(&provider.options)?)?
                }
                Factory::Local(factory) => {
                    manager.add_local_provider(schemes, factory(&provider.options)?)?
                }
            }
        }

        if let Some(default_provider) = &config.default_provider {
            let provider: Arc<dyn FileProvider> = match self.factory(&default_provider.kind)? {
                Factory::Standard(factory) => factory(&default_provider.options)?,
                Factory::Local(factory) => factory(&default_provider.options)?,
            };
            manager.set_default_provider(provider)?;
        }

        if let Some(base_dir) = &config.base_dir {
            manager.set_base_path(base_dir)?;
        }

        if let Some(overrides) = overrides {
            debug!("Applying {} message overrides", overrides.len());
            messages.extend(overrides);
        }

        info!(
            "File system manager ready with schemes {:?}",
            manager.schemes()
        );
        Ok(manager)
    }
}

impl fmt::Debug for ManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerBuilder")
            .field("kinds", &self.kinds())
            .field("replicator", &self.replicator.is_some())
            .finish()
    }
}
