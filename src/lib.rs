//! Scopewire - scope-hierarchy binding resolver and injector
//!
//! Resolves bindings declared by scopes into object references for the
//! injection sites of a partitioned structural tree, then writes them back.
//!
//! ## Module Architecture (DDD-Inspired)
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  model/     Handles, TypeName, InjectionSite, Injected       │
//! │  ast/       YAML manifest → scene description                │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  runtime/   Pass state machine (run_pass)                    │
//! │  scope/     Effective parents (ScopeTree)                    │
//! │  binding/   Binding, BindingRegistry, validation             │
//! │  locate/    Locator engine, filters, isolation               │
//! │  partition/ Partition classifier                             │
//! │  proxy/     Stand-ins for cross-partition references         │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  host/      Host traits + MemoryHost                         │
//! │  util/      Type-name interner                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`model`] | Opaque handles and site descriptors |
//! | [`ast`] | Manifest parsing → `MemoryHost` |
//! | [`runtime`] | BuildingTree → Validating → ResolvingGlobals → WalkingTree → Reporting |
//! | [`scope`] | Partition-root skip-over, scope chains |
//! | [`binding`] | Fluent builder, qualifier matching, registry (FxHashMap) |
//! | [`locate`] | Structural and asset searches, predicate filters |
//! | [`partition`] | Instance-identity partitions, context compatibility |
//! | [`proxy`] | Two-phase stand-in generation |
//! | [`host`] | Collaborator seams consumed by a pass |
//! | [`report`] | Pass diagnostics, stats, outcome |
//! | [`error`] | Fatal errors with fix suggestions |
//! | [`config`] | `scopewire.toml` + environment overrides |
//!
//! ## Example
//!
//! ```rust,ignore
//! use scopewire::{run_pass, Binding, InjectionSite, MemoryHost, PassConfig, PassTarget};
//!
//! let mut host = MemoryHost::new();
//! host.declare_interface("IWeapon");
//! host.declare_component("Rifle", &["IWeapon"]);
//! let main = host.add_container("Main");
//! let level = host.add_root(main, "Level");
//! host.add_scope(level, "Scope", vec![Binding::bind("IWeapon", "Rifle").from_descendants().build()]);
//! let soldier = host.add_child(level, "Soldier");
//! let unit = host.add_unit(soldier, "Soldier");
//! host.add_unit(soldier, "Rifle");
//! host.add_site(InjectionSite::new(unit, "Soldier", "weapon", "IWeapon").by_interface());
//!
//! let outcome = run_pass(&mut host, PassTarget::Container(main), &PassConfig::default())?;
//! ```

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - handles, manifests
// ═══════════════════════════════════════════════════════════════
pub mod ast;
pub mod model;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - resolution logic
// ═══════════════════════════════════════════════════════════════
pub mod binding;
pub mod locate;
pub mod partition;
pub mod proxy;
pub mod runtime;
pub mod scope;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - host seams, utilities
// ═══════════════════════════════════════════════════════════════
pub mod host;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - errors, diagnostics, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;
pub mod report;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{FixSuggestion, WireError};

// Config types
pub use config::PassConfig;

// Domain model
pub use ast::Manifest;
pub use model::{AssetId, Cardinality, ContainerId, Injected, InjectionSite, NodeId, ObjectRef, TypeKind, TypeName, UnitId};

// Application layer
pub use binding::{Binding, BindingBuilder, BindingKind, BindingRegistry};
pub use locate::{CandidateFilter, ChildPick, Direction, Factory, Locator, Origin};
pub use partition::{classify, context_compatible, Partition};
pub use runtime::{run_pass, validate_bindings, PassState, PassTarget};
pub use scope::ScopeTree;

// Infrastructure
pub use host::{AssetStore, Host, MemoryHost, NodeHome, SiteSource, StandInStore, StructureTree, TypeCatalog};

// Diagnostics
pub use report::{PassError, PassOutcome, PassResult, PassStats, UnusedBinding};
