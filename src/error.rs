//! Fatal error types with fix suggestions
//!
//! These abort an operation outright (bad manifest, unreadable config, a
//! stand-in store that refuses to persist). Problems *inside* a pass are never
//! raised this way; they are collected as [`crate::report::PassError`].
//!
//! Error code ranges:
//! - SW-001-009: Manifest errors
//! - SW-010-019: Configuration errors
//! - SW-020-029: Host / store errors
//! - SW-030-039: Pass setup errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WireError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum WireError {
    // ═══════════════════════════════════════════
    // MANIFEST ERRORS (001-009)
    // ═══════════════════════════════════════════
    #[error("[SW-001] Failed to read manifest '{path}': {source}")]
    ManifestRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[SW-002] Failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_yaml::Error),

    #[error("[SW-003] Manifest references unknown {kind} '{name}'")]
    UnknownReference { kind: &'static str, name: String },

    #[error("[SW-004] Duplicate {kind} name '{name}' in manifest")]
    DuplicateName { kind: &'static str, name: String },

    #[error("[SW-005] Invalid name pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("[SW-006] Invalid manifest entry at {location}: {reason}")]
    InvalidManifest { location: String, reason: String },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[SW-010] Configuration error: {reason}")]
    Config { reason: String },

    // ═══════════════════════════════════════════
    // HOST / STORE ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[SW-020] Stand-in store failed for '{type_name}': {reason}")]
    StandInStore { type_name: String, reason: String },

    // ═══════════════════════════════════════════
    // PASS SETUP ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[SW-030] Pass root not found: {root}")]
    UnknownPassRoot { root: String },

    #[error("[SW-031] Template pass root '{root}' is not a template instance or asset root")]
    NotATemplateRoot { root: String },
}

impl FixSuggestion for WireError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            WireError::ManifestRead { .. } => Some("Check the manifest path and permissions"),
            WireError::ManifestParse(_) => Some("Check YAML syntax: indentation and quoting"),
            WireError::UnknownReference { .. } => {
                Some("Declare the referenced node, type, asset or container before using it")
            }
            WireError::DuplicateName { .. } => Some("Use unique names within one manifest"),
            WireError::InvalidPattern { .. } => Some("Use a valid regular expression for name_matches"),
            WireError::InvalidManifest { .. } => {
                Some("Each binding needs `bind` or `as`; each instance needs `unit` or `asset`")
            }
            WireError::Config { .. } => Some("Check scopewire.toml syntax and SCOPEWIRE_* variables"),
            WireError::StandInStore { .. } => {
                Some("Verify the stand-in store is writable and the implementation was built")
            }
            WireError::UnknownPassRoot { .. } => {
                Some("Pass the name of an existing container or template root node")
            }
            WireError::NotATemplateRoot { .. } => {
                Some("Template passes must start at a template instance or template asset root")
            }
        }
    }
}
