//! Utilities Module - shared infrastructure
//!
//! - `interner`: type-name interning (Arc<str> deduplication)

mod interner;

pub use interner::{intern, Interner};
