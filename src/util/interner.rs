//! Type-name interning
//!
//! Every distinct type name (`IFoo`, `Foo`, ...) is stored once and shared
//! as an `Arc<str>`. Bindings, sites and catalog entries repeat the same few
//! names many times per pass, so cloning stays O(1).

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Process-wide interner used by [`crate::model::TypeName`]
static INTERNER: Lazy<Interner> = Lazy::new(Interner::new);

/// Thread-safe string interner backed by DashMap
pub struct Interner {
    strings: DashMap<Arc<str>, ()>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            strings: DashMap::new(),
        }
    }

    /// Intern a string, returning the shared `Arc<str>` for its content
    pub fn intern(&self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(s) {
            return Arc::clone(existing.key());
        }

        match self.strings.entry(Arc::from(s)) {
            Entry::Occupied(e) => Arc::clone(e.key()),
            Entry::Vacant(v) => {
                let key = Arc::clone(v.key());
                v.insert(());
                key
            }
        }
    }

    /// Number of interned strings
    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

/// Intern a type name using the global interner
#[inline]
pub fn intern(s: &str) -> Arc<str> {
    INTERNER.intern(s)
}
