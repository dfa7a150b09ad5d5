//! Scheme -> provider registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, VfsError};
use crate::provider::{FileProvider, LocalFileProvider};

/// Maps URI schemes to providers
///
/// Also tracks the distinguished local provider and the default provider
/// used for unknown schemes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn FileProvider>>,
    local: Option<Arc<dyn LocalFileProvider>>,
    default_provider: Option<Arc<dyn FileProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if any scheme in `schemes` is already bound
    pub fn check_schemes(&self, schemes: &[String]) -> Result<()> {
        match schemes.iter().find(|s| self.providers.contains_key(s.as_str())) {
            Some(scheme) => Err(VfsError::DuplicateScheme {
                scheme: scheme.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Bind every scheme in `schemes` to `provider`
    ///
    /// Either all schemes are bound or, if any is already taken, none are.
    pub fn register(&mut self, schemes: &[String], provider: Arc<dyn FileProvider>) -> Result<()> {
        self.check_schemes(schemes)?;
        for scheme in schemes {
            self.providers.insert(scheme.clone(), provider.clone());
        }
        Ok(())
    }

    /// Bind schemes to a local provider and make it the local provider
    ///
    /// The most recently registered local provider wins.
    pub fn register_local(
        &mut self,
        schemes: &[String],
        provider: Arc<dyn LocalFileProvider>,
    ) -> Result<()> {
        let as_provider: Arc<dyn FileProvider> = provider.clone();
        self.register(schemes, as_provider)?;
        self.local = Some(provider);
        Ok(())
    }

    /// Replace the default provider
    pub fn set_default_provider(&mut self, provider: Arc<dyn FileProvider>) {
        self.default_provider = Some(provider);
    }

    pub fn lookup(&self, scheme: &str) -> Option<Arc<dyn FileProvider>> {
        self.providers.get(scheme).cloned()
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.providers.contains_key(scheme)
    }

    pub fn local_provider(&self) -> Option<Arc<dyn LocalFileProvider>> {
        self.local.clone()
    }

    pub fn default_provider(&self) -> Option<Arc<dyn FileProvider>> {
        self.default_provider.clone()
    }

    /// Registered schemes, sorted
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.providers.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Drop every binding, the local provider and the default provider
    pub fn clear(&mut self) {
        self.providers.clear();
        self.local = None;
        self.default_provider = None;
    }
}
