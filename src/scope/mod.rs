//! Scope Tree Resolver
//!
//! Computes the effective parent of every scope collected by a pass. Each
//! scope's node is walked upwards; ancestor scopes sitting on partition roots
//! are skipped over, so a template instance never acts as a parent, while the
//! scopes inside it still reach past it to the live context around it.
//!
//! ```text
//! Level (scope)                 ◄── effective parent of Gun
//!   └─ Enemy (scope, instance root)   skipped; resolves None itself
//!        └─ Arm
//!             └─ Gun (scope)
//! ```

mod tree;

pub use tree::{ScopeChain, ScopeTree};
