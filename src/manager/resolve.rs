//! Name resolution
//!
//! Turns a name plus an optional base file into a file, by scheme dispatch
//! with fallbacks. Works on a [`Route`] snapshot taken from the registry so
//! no lock is held while providers run.

use std::sync::Arc;

use tracing::trace;

use crate::error::{Result, VfsError};
use crate::provider::registry::ProviderRegistry;
use crate::provider::{FileProvider, FileRef, LocalFileProvider};
use crate::uri;

/// The providers that may take part in resolving one name
pub(crate) struct Route<'a> {
    /// Scheme extracted from the name, if any
    pub scheme: Option<&'a str>,
    /// Provider registered for `scheme`
    pub scheme_provider: Option<Arc<dyn FileProvider>>,
    pub local: Option<Arc<dyn LocalFileProvider>>,
    pub default_provider: Option<Arc<dyn FileProvider>>,
}

impl<'a> Route<'a> {
    /// Snapshot the providers relevant to `name`
    pub fn for_name(registry: &ProviderRegistry, name: &'a str) -> Self {
        let scheme = uri::extract_scheme(name);
        Self {
            scheme,
            scheme_provider: scheme.and_then(|s| registry.lookup(s)),
            local: registry.local_provider(),
            default_provider: registry.default_provider(),
        }
    }
}

/// Resolve `name` against `route`
///
/// In order, the first applicable step wins:
/// 1. a registered scheme hands the original name to its provider
/// 2. the name is percent-decoded
/// 3. an absolute local name goes to the local provider (decoded)
/// 4. an unregistered scheme goes to the default provider (original name)
/// 5. an unregistered scheme with no default provider is an error
/// 6. a scheme-less name is resolved against `base` (decoded)
pub(crate) fn resolve_file(route: &Route<'_>, base: Option<&FileRef>, name: &str) -> Result<FileRef> {
    if let Some(provider) = &route.scheme_provider {
        trace!("Resolving {} with scheme provider", name);
        return provider.find_file(base, name);
    }

    let decoded = uri::decode(name)?;

    if let Some(local) = &route.local {
        if local.is_absolute_local_name(&decoded) {
            trace!("Resolving {} as a local file", decoded);
            return local.find_local_file(&decoded);
        }
    }

    if let Some(scheme) = route.scheme {
        return match &route.default_provider {
            Some(provider) => {
                trace!("Resolving {} with default provider", name);
                provider.find_file(base, name)
            }
            None => Err(VfsError::UnknownScheme {
                scheme: scheme.to_string(),
                name: name.to_string(),
            }),
        };
    }

    match base {
        Some(base) => {
            trace!("Resolving {} relative to {}", decoded, base.uri());
            base.resolve_file(&decoded)
        }
        None => Err(VfsError::MissingBase {
            name: name.to_string(),
        }),
    }
}
