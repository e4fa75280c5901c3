//! Binding Module - declared resolution rules and their registry
//!
//! - `entry`: immutable [`Binding`] values and the fluent [`BindingBuilder`]
//! - `qualifier`: pure binding-vs-site matching
//! - `registry`: pass-scoped storage, lookup along a scope chain, usage flags
//! - `validate`: structural rules and duplicate-global detection
//!
//! Lookup flow:
//! ```text
//! site ──► scope chain (nearest first)
//!             │
//!     per scope: valid, non-global, qualifier::matches
//!             │
//!     most specific wins, then declaration order
//!             ▼
//!        Some(BindingId) | None ⇒ MissingBinding
//! ```

mod entry;
pub mod qualifier;
mod registry;
mod validate;

pub use entry::{Binding, BindingBuilder, BindingKind, Qualifiers, Specificity};
pub use qualifier::Mismatch;
pub use registry::{BindingId, BindingRegistry};
pub use validate::{check_binding, validate};
