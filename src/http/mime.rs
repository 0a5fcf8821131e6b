//! MIME type detection based on file extensions.
//!
//! [`MimeRegistry`] maps an extension (without the leading dot) to a
//! content type. Registration is last-write-wins and matching is exact
//! unless the registry was built case-insensitive.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde::Deserialize;

use crate::http::atom::Atom;
use crate::http::mime_table;

/// Content types registered by [`MimeRegistration::Minimal`].
pub const MINIMAL: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("txt", "text/plain"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
];

/// How much of the built-in table a new registry starts with.
///
/// Configured as a number: `0` registers nothing, `1` the minimal web set,
/// anything larger the full table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u64")]
pub enum MimeRegistration {
    None,
    Minimal,
    Full,
}

impl MimeRegistration {
    pub fn from_level(level: u64) -> Self {
        match level {
            0 => MimeRegistration::None,
            1 => MimeRegistration::Minimal,
            _ => MimeRegistration::Full,
        }
    }
}

impl From<u64> for MimeRegistration {
    fn from(level: u64) -> Self {
        Self::from_level(level)
    }
}

impl Default for MimeRegistration {
    fn default() -> Self {
        MimeRegistration::Full
    }
}

/// Snapshot returned by [`MimeRegistry::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeStats {
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct MimeRegistry {
    entries: RwLock<HashMap<String, Atom>>,
    case_insensitive: bool,
}

impl MimeRegistry {
    /// An empty, case-sensitive registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry that folds ASCII case on register and lookup.
    pub fn case_insensitive() -> Self {
        Self {
            entries: RwLock::default(),
            case_insensitive: true,
        }
    }

    /// A case-sensitive registry pre-loaded according to `mode`.
    pub fn with_registration(mode: MimeRegistration) -> Self {
        let registry = Self::new();
        registry.register_builtin(mode);
        registry
    }

    /// Loads the built-in tables selected by `mode`.
    pub fn register_builtin(&self, mode: MimeRegistration) {
        if mode == MimeRegistration::None {
            return;
        }

        tracing::debug!("Registering core mime-types");
        for (ext, content_type) in MINIMAL {
            self.register(ext, *content_type);
        }

        if mode == MimeRegistration::Full {
            tracing::debug!("Registering all known mime-types");
            for (ext, content_type) in mime_table::EXTENDED {
                self.register(ext, *content_type);
            }
        }

        self.stats();
    }

    /// Maps `extension` to `content_type`, returning the replaced value.
    pub fn register(&self, extension: &str, content_type: impl Into<Atom>) -> Option<Atom> {
        let key = self.key(extension);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, content_type.into())
    }

    /// Removes every mapping.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// The content type registered for `extension`.
    ///
    /// `None` means callers should fall back to `application/octet-stream`.
    pub fn lookup(&self, extension: &str) -> Option<Atom> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        if self.case_insensitive {
            entries.get(&extension.to_ascii_lowercase()).cloned()
        } else {
            entries.get(extension).cloned()
        }
    }

    /// The content type for the extension of `path`, if any.
    pub fn lookup_path(&self, path: &Path) -> Option<Atom> {
        let extension = path.extension()?.to_str()?;
        self.lookup(extension)
    }

    pub fn stats(&self) -> MimeStats {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        tracing::debug!(entries, "MIME registry stats");
        MimeStats { entries }
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    fn key(&self, extension: &str) -> String {
        if self.case_insensitive {
            extension.to_ascii_lowercase()
        } else {
            extension.to_string()
        }
    }
}
