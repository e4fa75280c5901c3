//! Property tests over randomly shaped live trees

use proptest::prelude::*;
use proptest::sample::Index;
use scopewire::{context_compatible, MemoryHost, NodeId, ObjectRef, ScopeTree, StructureTree, UnitId};

/// Per node: parent pick, instance root flag, has a scope
type Shape = Vec<(Index, bool, bool)>;

struct Built {
    host: MemoryHost,
    nodes: Vec<NodeId>,
    scopes: Vec<UnitId>,
    units: Vec<UnitId>,
}

fn build(shape: &Shape) -> Built {
    let mut host = MemoryHost::new();
    let main = host.add_container("Main");
    let mut nodes = Vec::new();
    let mut scopes = Vec::new();
    let mut units = Vec::new();

    for (i, (parent, instance, scoped)) in shape.iter().enumerate() {
        let name = format!("N{i}");
        let node = if i == 0 {
            host.add_root(main, &name)
        } else {
            host.add_child(nodes[parent.index(i)], &name)
        };
        if *instance {
            host.mark_instance_root(node);
        }
        if *scoped {
            scopes.push(host.add_scope(node, "Scope", Vec::new()));
        }
        units.push(host.add_unit(node, "Thing"));
        nodes.push(node);
    }

    Built {
        host,
        nodes,
        scopes,
        units,
    }
}

/// Straightforward ancestor walk
fn naive_parent(host: &MemoryHost, scope: UnitId) -> Option<UnitId> {
    let node = host.node_of(scope);
    if host.is_partition_root(node) {
        return None;
    }
    let mut current = host.parent(node);
    while let Some(ancestor) = current {
        if !host.is_partition_root(ancestor) {
            if let Some(found) = host.scope_of(ancestor) {
                return Some(found);
            }
        }
        current = host.parent(ancestor);
    }
    None
}

fn shapes() -> impl Strategy<Value = Shape> {
    prop::collection::vec((any::<Index>(), any::<bool>(), any::<bool>()), 1..24)
}

proptest! {
    #[test]
    fn context_compatibility_is_symmetric(shape in shapes()) {
        let built = build(&shape);
        for a in &built.units {
            for b in &built.units {
                prop_assert_eq!(
                    context_compatible(&built.host, ObjectRef::Unit(*a), ObjectRef::Unit(*b)),
                    context_compatible(&built.host, ObjectRef::Unit(*b), ObjectRef::Unit(*a))
                );
            }
        }
    }

    #[test]
    fn units_share_partition_with_their_node(shape in shapes()) {
        let built = build(&shape);
        for (node, unit) in built.nodes.iter().zip(&built.units) {
            prop_assert!(context_compatible(&built.host, ObjectRef::Node(*node), ObjectRef::Unit(*unit)));
        }
    }

    #[test]
    fn effective_parent_matches_ancestor_walk(shape in shapes()) {
        let built = build(&shape);
        let tree = ScopeTree::build(&built.host, &built.scopes);
        for scope in &built.scopes {
            prop_assert_eq!(tree.effective_parent(*scope), naive_parent(&built.host, *scope));
        }
    }

    #[test]
    fn effective_parent_never_sits_on_partition_root(shape in shapes()) {
        let built = build(&shape);
        let tree = ScopeTree::build(&built.host, &built.scopes);
        for scope in &built.scopes {
            if let Some(parent) = tree.effective_parent(*scope) {
                prop_assert!(!built.host.is_partition_root(built.host.node_of(parent)));
            }
        }
    }

    #[test]
    fn scope_chain_is_finite_and_starts_at_scope(shape in shapes()) {
        let built = build(&shape);
        let tree = ScopeTree::build(&built.host, &built.scopes);
        for scope in &built.scopes {
            let chain = tree.chain(*scope);
            prop_assert_eq!(chain.first().copied(), Some(*scope));
            prop_assert!(chain.len() <= built.scopes.len());
        }
    }
}
