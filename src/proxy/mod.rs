//! Indirection Resolver - persisted stand-ins for cross-partition references
//!
//! Two phases:
//! 1. Some proxied concrete type has no generated implementation yet: ask the
//!    store to generate each missing one and report [`StandInStatus::GenerationPending`].
//!    Nothing is created; the caller aborts its pass.
//! 2. Every implementation exists: find or create one stand-in asset per
//!    concrete type and report [`StandInStatus::Ready`].

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::error::Result;
use crate::host::StandInStore;
use crate::model::{AssetId, TypeName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandInStatus {
    Ready(FxHashMap<TypeName, AssetId>),
    /// Types whose implementation generation was requested
    GenerationPending(Vec<TypeName>),
}

/// Make sure every concrete type in `types` has a usable stand-in
///
/// Repeated types are handled once.
pub fn ensure_stand_ins<S>(store: &mut S, types: &[TypeName]) -> Result<StandInStatus>
where
    S: StandInStore + ?Sized,
{
    let mut unique: Vec<&TypeName> = Vec::with_capacity(types.len());
    for ty in types {
        if !unique.contains(&ty) {
            unique.push(ty);
        }
    }

    let missing: Vec<TypeName> = unique
        .iter()
        .filter(|ty| !store.has_implementation(ty))
        .map(|ty| (*ty).clone())
        .collect();

    if !missing.is_empty() {
        for ty in &missing {
            info!(type_name = %ty, "requesting stand-in generation");
            store.request_generation(ty);
        }
        return Ok(StandInStatus::GenerationPending(missing));
    }

    let mut ready = FxHashMap::default();
    for ty in unique {
        let asset = match store.find_stand_in(ty) {
            Some(existing) => existing,
            None => {
                let created = store.create_stand_in(ty)?;
                debug!(type_name = %ty, asset = %created, "created stand-in");
                created
            }
        };
        ready.insert(ty.clone(), asset);
    }
    Ok(StandInStatus::Ready(ready))
}
