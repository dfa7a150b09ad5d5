//! Message catalog for human-readable error text
//!
//! Messages are looked up by code and formatted with positional parameters
//! (`{0}`, `{1}`, ...). Compiled templates are cached per catalog instance,
//! so a catalog can be shared between threads and swapped out in tests.

use std::collections::HashMap;
use std::fmt::{self, Display, Write as _};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{Result, VfsError};

/// Built-in message texts, keyed by code
const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    (
        "vfs.impl/multiple-providers-for-scheme.error",
        "Multiple providers registered for URL scheme \"{0}\".",
    ),
    ("vfs.impl/no-replicator.error", "No file replicator configured."),
    (
        "vfs.impl/unknown-scheme.error",
        "Unknown scheme \"{0}\" in URI \"{1}\".",
    ),
    (
        "vfs.impl/find-rel-file.error",
        "Could not find file with URI \"{0}\" because it is a relative path, and no base URI was provided.",
    ),
    (
        "vfs.impl/unknown-provider.error",
        "No file system provider is registered for URI scheme \"{0}\".",
    ),
    (
        "vfs.impl/no-local-file-provider.error",
        "Could not find a file provider that can handle local files.",
    ),
    (
        "vfs.impl/manager-closed.error",
        "The file system manager has been dropped.",
    ),
    ("vfs.impl/config.error", "Invalid configuration: {0}"),
    (
        "vfs.provider/invalid-escape-sequence.error",
        "Invalid URI escape sequence in \"{0}\".",
    ),
    ("vfs.provider/file-not-found.error", "Could not find file \"{0}\"."),
    ("vfs.provider/backend.error", "{0}"),
    ("vfs.provider/io.error", "I/O error: {0}"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Arg(usize),
}

/// A compiled message template
///
/// Placeholders are `{N}` where N is a parameter index; anything after a
/// comma inside the braces is ignored. Text between single quotes is
/// literal and `''` produces one quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    segments: Vec<Segment>,
}

impl MessageTemplate {
    /// Compile template text
    pub fn compile(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut quoted = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        literal.push('\'');
                    } else {
                        quoted = !quoted;
                    }
                }
                '{' if !quoted => {
                    let mut spec = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        spec.push(n);
                    }

                    let index = spec
                        .split(',')
                        .next()
                        .and_then(|s| s.trim().parse::<usize>().ok());

                    match (closed, index) {
                        (true, Some(index)) => {
                            if !literal.is_empty() {
                                segments.push(Segment::Text(std::mem::take(&mut literal)));
                            }
                            segments.push(Segment::Arg(index));
                        }
                        _ => {
                            // Not a placeholder, keep the text as written
                            literal.push('{');
                            literal.push_str(&spec);
                            if closed {
                                literal.push('}');
                            }
                        }
                    }
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Text(literal));
        }

        Self { segments }
    }

    /// Substitute parameters in order. Missing parameters keep their placeholder.
    pub fn format(&self, params: &[&dyn Display]) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Arg(index) => match params.get(*index) {
                    Some(param) => {
                        let _ = write!(out, "{}", param);
                    }
                    None => {
                        let _ = write!(out, "{{{}}}", index);
                    }
                },
            }
        }
        out
    }
}

/// Message catalog mapping codes to templates
pub struct MessageCatalog {
    /// Raw template text by code
    bundle: RwLock<HashMap<String, String>>,
    /// Compiled templates, populated on first lookup
    templates: DashMap<String, Arc<MessageTemplate>>,
    /// Number of templates compiled so far
    compiled: AtomicUsize,
}

impl MessageCatalog {
    /// Create a catalog holding the built-in messages
    pub fn new() -> Self {
        Self::from_messages(
            DEFAULT_MESSAGES
                .iter()
                .map(|(code, text)| (code.to_string(), text.to_string())),
        )
    }

    /// Create a catalog with no messages at all
    pub fn empty() -> Self {
        Self::from_messages(std::iter::empty())
    }

    /// Create a catalog from explicit code/text pairs
    pub fn from_messages<I>(messages: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            bundle: RwLock::new(messages.into_iter().collect()),
            templates: DashMap::new(),
            compiled: AtomicUsize::new(0),
        }
    }

    /// Add or replace the text for a code
    pub fn insert(&self, code: impl Into<String>, text: impl Into<String>) {
        let code = code.into();
        let mut bundle = self.bundle.write();
        bundle.insert(code.clone(), text.into());
        // Evict under the write lock so a concurrent lookup cannot re-cache the old text
        self.templates.remove(&code);
    }

    /// Load a YAML map of code -> template text, overriding existing entries
    ///
    /// Returns the number of messages loaded.
    pub fn load_overrides(&self, path: &Path) -> Result<usize> {
        let overrides = Self::read_overrides(path)?;
        let count = overrides.len();
        self.extend(overrides);
        debug!("Loaded {} message overrides from {:?}", count, path);
        Ok(count)
    }

    /// Read a YAML map of code -> template text without applying it
    pub fn read_overrides(path: &Path) -> Result<HashMap<String, String>> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| VfsError::Config(format!("Failed to parse messages {:?}: {}", path, e)))
    }

    /// Add or replace several messages
    pub fn extend<I>(&self, messages: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (code, text) in messages {
            self.insert(code, text);
        }
    }

    /// Format the message for `code` with no parameters
    pub fn get(&self, code: &str) -> String {
        self.format(code, &[])
    }

    /// Format the message for `code` with positional parameters
    ///
    /// Unknown codes produce a fallback text naming the code.
    pub fn format(&self, code: &str, params: &[&dyn Display]) -> String {
        match self.find(code) {
            Some(template) => template.format(params),
            None => format!("Unknown message with code \"{}\".", code),
        }
    }

    /// Whether the catalog has text for `code`
    pub fn contains(&self, code: &str) -> bool {
        self.bundle.read().contains_key(code)
    }

    /// Number of templates compiled since the catalog was created
    pub fn compiled_count(&self) -> usize {
        self.compiled.load(Ordering::SeqCst)
    }

    fn find(&self, code: &str) -> Option<Arc<MessageTemplate>> {
        if let Some(template) = self.templates.get(code) {
            trace!("Message cache hit for {}", code);
            return Some(template.value().clone());
        }

        // Hold the read lock until the template is cached; `insert` evicts under the write lock
        let bundle = self.bundle.read();
        let text = bundle.get(code)?;
        let template = self
            .templates
            .entry(code.to_string())
            .or_insert_with(|| {
                self.compiled.fetch_add(1, Ordering::SeqCst);
                Arc::new(MessageTemplate::compile(text))
            })
            .value()
            .clone();
        Some(template)
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageCatalog")
            .field("messages", &self.bundle.read().len())
            .field("compiled", &self.compiled_count())
            .finish()
    }
}
