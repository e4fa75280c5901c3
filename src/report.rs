//! Pass diagnostics and results
//!
//! Structured, per-pass outcomes. Nothing in here aborts a pass; fatal
//! conditions live in [`crate::error::WireError`].
//!
//! ## Codes
//!
//! | Code | Kind |
//! |------|------|
//! | SW-100 | invalid binding |
//! | SW-110 | no binding matched a site |
//! | SW-111 | binding matched but located nothing |
//! | SW-120 | global binding located nothing |
//! | SW-121 | duplicate global binding |
//! | SW-150 | unused binding (warning) |

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::model::{ObjectRef, TypeName, UnitId};

/// Pass phase that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Validation = 1,
    Globals = 2,
    Injection = 3,
    Reporting = 4,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Validation => write!(f, "Validation"),
            Phase::Globals => write!(f, "Globals"),
            Phase::Injection => write!(f, "Injection"),
            Phase::Reporting => write!(f, "Reporting"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Binding as it appears in diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingRef {
    /// Declaring scope
    pub scope: UnitId,
    /// Declaration index within the scope
    pub index: usize,
    pub description: String,
}

impl fmt::Display for BindingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (scope {}, #{})", self.description, self.scope, self.index)
    }
}

/// Injection site as it appears in diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteRef {
    pub unit: UnitId,
    /// `Declaring.member`
    pub label: String,
}

impl fmt::Display for SiteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.label, self.unit)
    }
}

/// Why validation rejected a binding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("unknown type '{0}'")]
    UnknownType(TypeName),

    #[error("'{concrete}' does not implement '{interface}'")]
    NotAssignable {
        concrete: TypeName,
        interface: TypeName,
    },

    #[error("'{0}' is not an interface")]
    NotAnInterface(TypeName),

    #[error("component binding of non-component type '{0}'")]
    NotAComponent(TypeName),

    #[error("asset binding of component type '{0}'")]
    ComponentAsAsset(TypeName),

    #[error("proxy binding must be a component binding")]
    ProxyNotComponent,

    #[error("proxy binding needs both an interface and a concrete type")]
    ProxyIncompleteTypes,

    #[error("proxy binding cannot be a collection")]
    ProxyCollection,

    #[error("proxy binding cannot be global")]
    ProxyGlobal,

    #[error("global binding cannot be a collection")]
    GlobalCollection,

    #[error("global binding cannot carry id qualifiers")]
    GlobalWithId,

    #[error("global binding needs a concrete type")]
    GlobalWithoutConcrete,

    #[error("global binding declared inside a template")]
    GlobalInTemplate,

    #[error("expected exactly one locator, found {0}")]
    LocatorCount(usize),
}

/// A per-pass error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    #[error("[SW-100] Invalid binding {binding}: {reason}")]
    InvalidBinding {
        binding: BindingRef,
        reason: InvalidReason,
    },

    #[error("[SW-110] No binding for {site} (requests '{requested}')")]
    MissingBinding {
        site: SiteRef,
        requested: TypeName,
        id: Option<Arc<str>>,
    },

    #[error("[SW-111] Binding {binding} located nothing for {site}")]
    MissingDependency {
        site: SiteRef,
        binding: BindingRef,
        /// Types of candidates dropped by isolation
        rejected_types: Vec<TypeName>,
        /// The requesting unit failed the binding's target filters
        target_rejected: bool,
    },

    #[error("[SW-120] Global binding {binding} located nothing")]
    MissingGlobalDependency {
        binding: BindingRef,
        rejected_types: Vec<TypeName>,
    },

    #[error("[SW-121] Duplicate global binding {binding} for '{concrete}' (first: {first})")]
    DuplicateGlobalBinding {
        binding: BindingRef,
        first: BindingRef,
        concrete: TypeName,
    },
}

impl PassError {
    pub fn code(&self) -> &'static str {
        match self {
            PassError::InvalidBinding { .. } => "SW-100",
            PassError::MissingBinding { .. } => "SW-110",
            PassError::MissingDependency { .. } => "SW-111",
            PassError::MissingGlobalDependency { .. } => "SW-120",
            PassError::DuplicateGlobalBinding { .. } => "SW-121",
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            PassError::InvalidBinding { .. } | PassError::DuplicateGlobalBinding { .. } => {
                Phase::Validation
            }
            PassError::MissingGlobalDependency { .. } => Phase::Globals,
            PassError::MissingBinding { .. } | PassError::MissingDependency { .. } => {
                Phase::Injection
            }
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }

    /// Get suggestion for fixing this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            PassError::InvalidBinding { reason, .. } => match reason {
                InvalidReason::UnknownType(ty) => Some(format!("Declare type '{ty}' in the host")),
                InvalidReason::LocatorCount(0) => {
                    Some("Add a locator (from_self, from_descendants, from_instance, ...)".to_string())
                }
                InvalidReason::LocatorCount(_) => Some("Keep a single locator".to_string()),
                InvalidReason::GlobalInTemplate => {
                    Some("Move the global binding to a scope in a live container".to_string())
                }
                _ => None,
            },
            PassError::MissingBinding { requested, id, .. } => Some(match id {
                Some(id) => format!("Declare a binding for '{requested}' with id '{id}' in an enclosing scope"),
                None => format!("Declare a binding for '{requested}' in an enclosing scope"),
            }),
            PassError::MissingDependency {
                rejected_types,
                target_rejected,
                ..
            } => {
                if *target_rejected {
                    Some("The requesting unit does not satisfy the binding's target filters".to_string())
                } else if !rejected_types.is_empty() {
                    let names: Vec<&str> = rejected_types.iter().map(TypeName::as_str).collect();
                    Some(format!(
                        "Candidates of {} live in another partition; bind them through a proxy",
                        names.join(", ")
                    ))
                } else {
                    Some("Check the binding's locator and filters".to_string())
                }
            }
            PassError::MissingGlobalDependency { .. } => {
                Some("Make sure the located object exists before the pass".to_string())
            }
            PassError::DuplicateGlobalBinding { .. } => {
                Some("Keep one global binding per concrete type".to_string())
            }
        }
    }

    /// Flat, serializable view
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            code: self.code(),
            severity: self.severity(),
            phase: self.phase(),
            message: self.to_string(),
            suggestion: self.suggestion(),
        }
    }
}

impl Serialize for PassError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.diagnostic().serialize(serializer)
    }
}

/// Valid binding that no site or global consumed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[SW-150] Binding {binding} was never used")]
pub struct UnusedBinding {
    pub binding: BindingRef,
}

impl UnusedBinding {
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            code: "SW-150",
            severity: Severity::Warning,
            phase: Phase::Reporting,
            message: self.to_string(),
            suggestion: Some("Remove the binding or add a site requesting it".to_string()),
        }
    }
}

impl Serialize for UnusedBinding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.diagnostic().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub phase: Phase,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Pass counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub scopes: usize,
    pub bindings: usize,
    pub invalid_bindings: usize,
    pub sites: usize,
    pub injected: usize,
    /// Missing results swallowed by `suppress_on_missing`
    pub suppressed: usize,
    pub globals: usize,
    pub stand_ins: usize,
}

/// Published global resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalEntry {
    pub concrete: TypeName,
    pub object: ObjectRef,
    pub binding: BindingRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassResult {
    pub errors: Vec<PassError>,
    pub warnings: Vec<UnusedBinding>,
    pub stats: PassStats,
    pub globals: Vec<GlobalEntry>,
}

impl PassResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Published global object for a concrete type
    pub fn global(&self, concrete: &TypeName) -> Option<ObjectRef> {
        self.globals
            .iter()
            .find(|g| &g.concrete == concrete)
            .map(|g| g.object)
    }

    /// Errors carrying a given code
    pub fn errors_with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a PassError> + 'a {
        self.errors.iter().filter(move |e| e.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PassOutcome {
    Completed(PassResult),
    /// Stand-in implementations were requested; run another pass once they exist
    GenerationPending { types: Vec<TypeName> },
}

impl PassOutcome {
    pub fn completed(self) -> Option<PassResult> {
        match self {
            PassOutcome::Completed(result) => Some(result),
            PassOutcome::GenerationPending { .. } => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PassOutcome::GenerationPending { .. })
    }
}
