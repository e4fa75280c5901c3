//! Binding Registry - pass-scoped storage of every declared binding
//!
//! Bindings are kept in registration order. Validity and usage flags live
//! here, never on the [`Binding`] value itself.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{qualifier, Binding, Specificity};
use crate::model::{InjectionSite, UnitId};
use crate::report::{BindingRef, UnusedBinding};

/// Index of a registered binding (registration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub(crate) u32);

impl BindingId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Entry {
    binding: Binding,
    scope: UnitId,
    /// Declaration index within the scope
    position: usize,
    valid: bool,
    used: bool,
}

#[derive(Debug, Default)]
pub struct BindingRegistry {
    entries: Vec<Entry>,
    by_scope: FxHashMap<UnitId, SmallVec<[BindingId; 4]>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scope: UnitId, binding: Binding) -> BindingId {
        let id = BindingId(self.entries.len() as u32);
        let declared = self.by_scope.entry(scope).or_default();
        let position = declared.len();
        declared.push(id);
        self.entries.push(Entry {
            binding,
            scope,
            position,
            valid: true,
            used: false,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = BindingId> + '_ {
        (0..self.entries.len() as u32).map(BindingId)
    }

    pub fn get(&self, id: BindingId) -> &Binding {
        &self.entries[id.index()].binding
    }

    pub fn scope_of(&self, id: BindingId) -> UnitId {
        self.entries[id.index()].scope
    }

    /// Bindings declared by one scope, in declaration order
    pub fn in_scope(&self, scope: UnitId) -> &[BindingId] {
        self.by_scope.get(&scope).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    pub fn is_valid(&self, id: BindingId) -> bool {
        self.entries[id.index()].valid
    }

    pub(crate) fn invalidate(&mut self, id: BindingId) {
        self.entries[id.index()].valid = false;
    }

    pub fn binding_ref(&self, id: BindingId) -> BindingRef {
        let entry = &self.entries[id.index()];
        BindingRef {
            scope: entry.scope,
            index: entry.position,
            description: entry.binding.to_string(),
        }
    }

    /// Best binding for a site along a scope chain (nearest scope first)
    ///
    /// Within one scope an id-qualified match beats every wildcard-id match;
    /// next the most target/member qualifiers wins, then declaration order.
    pub fn find_binding(&self, site: &InjectionSite, chain: &[UnitId]) -> Option<BindingId> {
        chain.iter().find_map(|scope| self.find_in_scope(site, *scope))
    }

    fn find_in_scope(&self, site: &InjectionSite, scope: UnitId) -> Option<BindingId> {
        let mut best: Option<(BindingId, Specificity)> = None;
        for id in self.in_scope(scope) {
            let entry = &self.entries[id.index()];
            if !entry.valid || entry.binding.is_global() || !qualifier::matches(&entry.binding, site) {
                continue;
            }
            let specificity = entry.binding.qualifiers().specificity();
            if best.map_or(true, |(_, s)| specificity > s) {
                best = Some((*id, specificity));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Idempotent
    pub fn mark_used(&mut self, id: BindingId) {
        self.entries[id.index()].used = true;
    }

    pub fn is_used(&self, id: BindingId) -> bool {
        self.entries[id.index()].used
    }

    /// Valid bindings nobody consumed, in registration order
    pub fn unused(&self) -> Vec<UnusedBinding> {
        self.ids()
            .filter(|id| {
                let entry = &self.entries[id.index()];
                entry.valid && !entry.used
            })
            .map(|id| UnusedBinding {
                binding: self.binding_ref(id),
            })
            .collect()
    }

    pub fn valid_globals(&self) -> Vec<BindingId> {
        self.ids()
            .filter(|id| self.is_valid(*id) && self.get(*id).is_global())
            .collect()
    }

    pub fn valid_proxies(&self) -> Vec<BindingId> {
        self.ids()
            .filter(|id| self.is_valid(*id) && self.get(*id).is_proxy())
            .collect()
    }

    pub fn invalid_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.valid).count()
    }
}
