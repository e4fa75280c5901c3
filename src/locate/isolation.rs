//! Context Isolation Filter
//!
//! Drops candidates whose partition is not context-compatible with the object
//! requesting them. Runs after locating and predicate filtering.

use crate::host::{StructureTree, TypeCatalog};
use crate::model::{ObjectRef, TypeName};
use crate::partition::{classify, compatible};

/// Candidates split by the isolation check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filtered {
    pub kept: Vec<ObjectRef>,
    /// Types of rejected candidates, first-seen order, no repeats
    pub rejected_types: Vec<TypeName>,
}

/// Keep candidates compatible with `owner`; pass everything when disabled
pub fn filter<H>(host: &H, candidates: Vec<ObjectRef>, owner: ObjectRef, enabled: bool) -> Filtered
where
    H: StructureTree + TypeCatalog,
{
    if !enabled {
        return Filtered {
            kept: candidates,
            rejected_types: Vec::new(),
        };
    }

    let owner_partition = classify(host, owner);
    let mut filtered = Filtered::default();

    for candidate in candidates {
        if compatible(owner_partition, classify(host, candidate)) {
            filtered.kept.push(candidate);
            continue;
        }
        if let Some(ty) = host.type_of(candidate) {
            if !filtered.rejected_types.contains(&ty) {
                filtered.rejected_types.push(ty);
            }
        }
    }

    filtered
}
