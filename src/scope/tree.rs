use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::trace;

use crate::host::StructureTree;
use crate::model::UnitId;

/// A scope followed by its effective ancestors, nearest first
pub type ScopeChain = SmallVec<[UnitId; 8]>;

/// Effective-parent links for the scopes of one pass
///
/// Built once per pass and never mutated afterwards.
#[derive(Debug, Default)]
pub struct ScopeTree {
    parents: FxHashMap<UnitId, Option<UnitId>>,
    /// Collection order
    order: Vec<UnitId>,
}

impl ScopeTree {
    /// Link every collected scope to its effective parent
    ///
    /// Ancestor scopes outside `scopes` are not part of the tree and are
    /// walked past.
    pub fn build<T>(tree: &T, scopes: &[UnitId]) -> Self
    where
        T: StructureTree + ?Sized,
    {
        let members: FxHashSet<UnitId> = scopes.iter().copied().collect();
        let mut parents = FxHashMap::default();
        let mut order = Vec::with_capacity(scopes.len());

        for scope in scopes {
            if parents.contains_key(scope) {
                continue;
            }
            let parent = resolve_parent(tree, *scope, &members);
            trace!(scope = %scope, parent = ?parent, "effective parent");
            parents.insert(*scope, parent);
            order.push(*scope);
        }

        Self { parents, order }
    }

    /// `None` for partition-root scopes, tree roots, and unknown scopes
    pub fn effective_parent(&self, scope: UnitId) -> Option<UnitId> {
        self.parents.get(&scope).copied().flatten()
    }

    pub fn contains(&self, scope: UnitId) -> bool {
        self.parents.contains_key(&scope)
    }

    pub fn chain(&self, scope: UnitId) -> ScopeChain {
        let mut chain = ScopeChain::new();
        if !self.contains(scope) {
            return chain;
        }
        let mut current = Some(scope);
        while let Some(s) = current {
            chain.push(s);
            current = self.effective_parent(s);
        }
        chain
    }

    /// Scopes in collection order
    pub fn scopes(&self) -> &[UnitId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn resolve_parent<T>(tree: &T, scope: UnitId, members: &FxHashSet<UnitId>) -> Option<UnitId>
where
    T: StructureTree + ?Sized,
{
    let node = tree.node_of(scope);
    if tree.is_partition_root(node) {
        return None;
    }

    let mut current = tree.parent(node);
    while let Some(ancestor) = current {
        if let Some(candidate) = tree.scope_of(ancestor) {
            if members.contains(&candidate) && !tree.is_partition_root(ancestor) {
                return Some(candidate);
            }
        }
        current = tree.parent(ancestor);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::model::NodeId;
    use pretty_assertions::assert_eq;

    struct Nested {
        host: MemoryHost,
        level: UnitId,
        enemy: UnitId,
        gun: UnitId,
        enemy_node: NodeId,
    }

    /// Level(scope) ── Enemy(scope, instance root) ── Arm ── Gun(scope)
    fn nested() -> Nested {
        let mut host = MemoryHost::new();
        let scene = host.add_container("Main");
        let level_node = host.add_root(scene, "Level");
        let enemy_node = host.add_child(level_node, "Enemy");
        host.mark_instance_root(enemy_node);
        let arm = host.add_child(enemy_node, "Arm");
        let gun_node = host.add_child(arm, "Gun");

        let level = host.add_scope(level_node, "LevelScope", Vec::new());
        let enemy = host.add_scope(enemy_node, "EnemyScope", Vec::new());
        let gun = host.add_scope(gun_node, "GunScope", Vec::new());
        Nested {
            host,
            level,
            enemy,
            gun,
            enemy_node,
        }
    }

    #[test]
    fn partition_root_scopes_have_no_parent() {
        let n = nested();
        let tree = ScopeTree::build(&n.host, &[n.level, n.enemy, n.gun]);
        assert_eq!(tree.effective_parent(n.enemy), None);
        assert_eq!(tree.effective_parent(n.level), None);
    }

    #[test]
    fn partition_root_ancestors_are_skipped() {
        let n = nested();
        let tree = ScopeTree::build(&n.host, &[n.level, n.enemy, n.gun]);
        assert_eq!(tree.effective_parent(n.gun), Some(n.level));
        assert_eq!(
            tree.chain(n.gun).to_vec(),
            vec![n.gun, n.level]
        );
    }

    #[test]
    fn every_partition_root_on_the_way_is_skipped() {
        let mut n = nested();
        let turret = n.host.add_child(n.enemy_node, "Turret");
        n.host.mark_instance_root(turret);
        let turret_scope = n.host.add_scope(turret, "TurretScope", Vec::new());
        let barrel = n.host.add_child(turret, "Barrel");
        let barrel_scope = n.host.add_scope(barrel, "BarrelScope", Vec::new());

        let tree = ScopeTree::build(&n.host, &[n.level, n.enemy, turret_scope, barrel_scope]);
        assert_eq!(tree.effective_parent(turret_scope), None);
        assert_eq!(tree.effective_parent(barrel_scope), Some(n.level));
    }

    #[test]
    fn scopes_outside_the_pass_are_walked_past() {
        let n = nested();
        let tree = ScopeTree::build(&n.host, &[n.enemy, n.gun]);
        assert_eq!(tree.effective_parent(n.gun), None);
        assert!(!tree.contains(n.level));
        assert!(tree.chain(n.level).is_empty());
    }

    #[test]
    fn collection_order_is_kept() {
        let n = nested();
        let tree = ScopeTree::build(&n.host, &[n.gun, n.level, n.gun]);
        assert_eq!(tree.scopes(), &[n.gun, n.level]);
        assert_eq!(tree.len(), 2);
    }
}
