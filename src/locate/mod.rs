//! Locator Engine - turns a binding's search strategy into raw candidates
//!
//! Pipeline for one lookup:
//! ```text
//! target filters (requesting unit) ── fail ──► suppressed
//!        │
//!   locator strategy ──► raw candidates
//!        │
//!   type narrowing (concrete, else interface)
//!        │
//!   candidate filters (AND)
//!        ▼
//!   Located { candidates }
//! ```
//! Isolation filtering is separate (see [`isolation`]) and runs afterwards.

mod filter;
pub mod isolation;

pub use filter::{accepts_all, CandidateFilter, ObjectInfo, Predicate};

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::binding::Binding;
use crate::host::{AssetStore, StructureTree, TypeCatalog};
use crate::model::{InjectionSite, NodeId, ObjectRef, UnitId};

/// Where a structural search starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The declaring scope's own node
    ScopeNode,
    /// Topmost ancestor of the scope's node
    ScopeRoot,
    /// Node owning the requesting site (requires a site)
    SiteNode,
    /// A child of the scope's node
    ScopeChild(ChildPick),
    /// Externally supplied node
    External(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPick {
    First,
    Last,
    Index(usize),
}

/// Which nodes a search visits, relative to its origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Itself,
    Parent,
    Ancestors { include_self: bool },
    Descendants { include_self: bool },
    Child(ChildPick),
    Siblings,
    /// Every node of every live container plus the origin's own tree
    Anywhere,
}

/// Asset-store search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetQuery {
    Path(String),
    /// Recursive folder scan
    Folder(String),
    All,
}

/// What a factory sees when invoked
#[derive(Debug, Clone, Copy)]
pub struct FactoryContext<'a> {
    pub scope: UnitId,
    pub site: Option<&'a InjectionSite>,
}

pub type FactoryFn = Arc<dyn Fn(&FactoryContext<'_>) -> Vec<ObjectRef> + Send + Sync>;

#[derive(Clone)]
pub struct Factory {
    pub(crate) func: FactoryFn,
    pub(crate) requires_site: bool,
}

impl Factory {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&FactoryContext<'_>) -> Vec<ObjectRef> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            requires_site: false,
        }
    }

    /// Factory that only runs for a concrete requesting site
    pub fn per_site<F>(func: F) -> Self
    where
        F: Fn(&FactoryContext<'_>) -> Vec<ObjectRef> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            requires_site: true,
        }
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("requires_site", &self.requires_site)
            .finish_non_exhaustive()
    }
}

/// A binding's search strategy
#[derive(Debug, Clone)]
pub enum Locator {
    Instances(Vec<ObjectRef>),
    Factory(Factory),
    Search { origin: Origin, direction: Direction },
    Assets(AssetQuery),
}

impl Locator {
    pub fn requires_site(&self) -> bool {
        match self {
            Locator::Factory(factory) => factory.requires_site,
            Locator::Search { origin, .. } => *origin == Origin::SiteNode,
            Locator::Instances(_) | Locator::Assets(_) => false,
        }
    }
}

/// One lookup request
#[derive(Debug, Clone, Copy)]
pub struct LocateRequest<'a> {
    pub binding: &'a Binding,
    /// Scope that declared the binding
    pub scope: UnitId,
    /// `None` for global resolution
    pub site: Option<&'a InjectionSite>,
}

/// Locator output before isolation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Located {
    pub candidates: Vec<ObjectRef>,
    /// The requesting unit failed the binding's target filters
    pub target_rejected: bool,
}

/// Run a binding's locator and filters
pub fn locate<H>(host: &H, request: &LocateRequest<'_>) -> Located
where
    H: StructureTree + TypeCatalog + AssetStore,
{
    let binding = request.binding;

    if let Some(site) = request.site {
        if !target_accepts(host, binding, site) {
            trace!(site = %site.label(), "target filters rejected requesting unit");
            return Located {
                candidates: Vec::new(),
                target_rejected: true,
            };
        }
    }

    let Some(locator) = binding.locator() else {
        return Located::default();
    };
    if locator.requires_site() && request.site.is_none() {
        return Located::default();
    }

    let raw = raw_candidates(host, locator, request);
    let wanted = binding.concrete().or(binding.interface_type());

    let candidates = raw
        .into_iter()
        .filter(|obj| match (wanted, host.type_of(*obj)) {
            (Some(target), Some(ty)) => host.is_assignable(&ty, target),
            (Some(_), None) => false,
            (None, _) => true,
        })
        .filter(|obj| accepts_all(binding.filters(), &ObjectInfo::of(host, *obj)))
        .collect();

    Located {
        candidates,
        target_rejected: false,
    }
}

/// Whether the site's owning unit passes the binding's target filters
pub fn target_accepts<H>(host: &H, binding: &Binding, site: &InjectionSite) -> bool
where
    H: StructureTree + TypeCatalog + AssetStore,
{
    binding.target_filters().is_empty()
        || accepts_all(binding.target_filters(), &ObjectInfo::of(host, ObjectRef::Unit(site.unit)))
}

fn raw_candidates<H>(host: &H, locator: &Locator, request: &LocateRequest<'_>) -> Vec<ObjectRef>
where
    H: StructureTree + TypeCatalog + AssetStore,
{
    match locator {
        Locator::Instances(objects) => objects.clone(),
        Locator::Factory(factory) => (factory.func)(&FactoryContext {
            scope: request.scope,
            site: request.site,
        }),
        Locator::Search { origin, direction } => {
            let Some(start) = resolve_origin(host, *origin, request) else {
                return Vec::new();
            };
            search_nodes(host, start, *direction)
                .into_iter()
                .flat_map(|node| host.units(node).iter().copied().map(ObjectRef::Unit))
                .collect()
        }
        Locator::Assets(query) => {
            let assets = match query {
                AssetQuery::Path(path) => host.asset_at(path).into_iter().collect(),
                AssetQuery::Folder(folder) => host.assets_under(folder),
                AssetQuery::All => host.all_assets(),
            };
            assets.into_iter().map(ObjectRef::Asset).collect()
        }
    }
}

fn resolve_origin<H: StructureTree>(host: &H, origin: Origin, request: &LocateRequest<'_>) -> Option<NodeId> {
    let scope_node = host.node_of(request.scope);
    match origin {
        Origin::ScopeNode => Some(scope_node),
        Origin::ScopeRoot => Some(host.root_of(scope_node)),
        Origin::SiteNode => request.site.map(|site| host.node_of(site.unit)),
        Origin::ScopeChild(pick) => pick_child(host.children(scope_node), pick),
        Origin::External(node) => Some(node),
    }
}

fn pick_child(children: &[NodeId], pick: ChildPick) -> Option<NodeId> {
    match pick {
        ChildPick::First => children.first().copied(),
        ChildPick::Last => children.last().copied(),
        ChildPick::Index(i) => children.get(i).copied(),
    }
}

/// Nodes visited by a direction, in visiting order
pub fn search_nodes<H: StructureTree>(host: &H, origin: NodeId, direction: Direction) -> Vec<NodeId> {
    match direction {
        Direction::Itself => vec![origin],
        Direction::Parent => host.parent(origin).into_iter().collect(),
        Direction::Ancestors { include_self } => {
            let mut nodes = Vec::new();
            if include_self {
                nodes.push(origin);
            }
            let mut current = host.parent(origin);
            while let Some(node) = current {
                nodes.push(node);
                current = host.parent(node);
            }
            nodes
        }
        Direction::Descendants { include_self } => {
            let mut nodes = Vec::new();
            if include_self {
                nodes.push(origin);
            }
            for child in host.children(origin) {
                preorder(host, *child, &mut nodes);
            }
            nodes
        }
        Direction::Child(pick) => pick_child(host.children(origin), pick).into_iter().collect(),
        Direction::Siblings => {
            let siblings: &[NodeId] = match host.parent(origin) {
                Some(parent) => host.children(parent),
                None => match host.home(origin) {
                    crate::host::NodeHome::Container(c) => host.container_roots(c),
                    _ => &[],
                },
            };
            siblings.iter().copied().filter(|n| *n != origin).collect()
        }
        Direction::Anywhere => {
            let mut nodes = Vec::new();
            let mut seen_roots: FxHashSet<NodeId> = FxHashSet::default();
            for container in host.containers() {
                for root in host.container_roots(container) {
                    if seen_roots.insert(*root) {
                        preorder(host, *root, &mut nodes);
                    }
                }
            }
            let own_root = host.root_of(origin);
            if seen_roots.insert(own_root) {
                preorder(host, own_root, &mut nodes);
            }
            nodes
        }
    }
}

fn preorder<H: StructureTree>(host: &H, node: NodeId, out: &mut Vec<NodeId>) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        out.push(current);
        stack.extend(host.children(current).iter().rev().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::Binding;

    struct Fixture {
        host: MemoryHost,
        scope: UnitId,
        root: NodeId,
        left: NodeId,
        right: NodeId,
        leaf: NodeId,
    }

    /// Root(scope) ─┬─ Left ── Leaf
    ///              └─ Right
    fn fixture() -> Fixture {
        let mut host = MemoryHost::new();
        host.declare_interface("ILight");
        host.declare_component("Lamp", &["ILight"]);
        host.declare_component("Fan", &[]);
        let scene = host.add_container("Main");
        let root = host.add_root(scene, "Root");
        let left = host.add_child(root, "Left");
        let right = host.add_child(root, "Right");
        let leaf = host.add_child(left, "Leaf");
        let scope = host.add_scope(root, "Scope", Vec::new());
        Fixture {
            host,
            scope,
            root,
            left,
            right,
            leaf,
        }
    }

    fn run(host: &MemoryHost, binding: &Binding, scope: UnitId, site: Option<&InjectionSite>) -> Located {
        locate(
            host,
            &LocateRequest {
                binding,
                scope,
                site,
            },
        )
    }

    #[test]
    fn descendants_visit_in_preorder() {
        let f = fixture();
        assert_eq!(
            search_nodes(&f.host, f.root, Direction::Descendants { include_self: false }),
            vec![f.left, f.leaf, f.right]
        );
        assert_eq!(
            search_nodes(&f.host, f.root, Direction::Descendants { include_self: true })[0],
            f.root
        );
    }

    #[test]
    fn ancestors_siblings_and_children() {
        let f = fixture();
        assert_eq!(
            search_nodes(&f.host, f.leaf, Direction::Ancestors { include_self: false }),
            vec![f.left, f.root]
        );
        assert_eq!(search_nodes(&f.host, f.left, Direction::Siblings), vec![f.right]);
        assert_eq!(
            search_nodes(&f.host, f.root, Direction::Child(ChildPick::Last)),
            vec![f.right]
        );
        assert!(search_nodes(&f.host, f.root, Direction::Child(ChildPick::Index(5))).is_empty());
        assert!(search_nodes(&f.host, f.root, Direction::Parent).is_empty());
    }

    #[test]
    fn search_narrows_by_type() {
        let mut f = fixture();
        let lamp = f.host.add_unit(f.leaf, "Lamp");
        f.host.add_unit(f.right, "Fan");
        let lamp2 = f.host.add_unit(f.right, "Lamp");

        let binding = Binding::bind("ILight", "Lamp")
            .from_descendants()
            .build();
        let located = run(&f.host, &binding, f.scope, None);
        assert_eq!(located.candidates, vec![ObjectRef::Unit(lamp), ObjectRef::Unit(lamp2)]);
    }

    #[test]
    fn interface_only_binding_matches_implementors() {
        let mut f = fixture();
        let lamp = f.host.add_unit(f.left, "Lamp");
        f.host.add_unit(f.left, "Fan");

        let binding = Binding::interface("ILight").from_descendants().build();
        let located = run(&f.host, &binding, f.scope, None);
        assert_eq!(located.candidates, vec![ObjectRef::Unit(lamp)]);
    }

    #[test]
    fn site_origin_requires_site() {
        let mut f = fixture();
        let owner = f.host.add_unit(f.leaf, "Fan");
        let lamp = f.host.add_unit(f.left, "Lamp");
        let binding = Binding::component("Lamp")
            .locate(Origin::SiteNode, Direction::Parent)
            .build();

        assert!(run(&f.host, &binding, f.scope, None).candidates.is_empty());

        let site = InjectionSite::new(owner, "Fan", "lamp", "Lamp");
        assert_eq!(
            run(&f.host, &binding, f.scope, Some(&site)).candidates,
            vec![ObjectRef::Unit(lamp)]
        );
    }

    #[test]
    fn candidate_filters_apply_after_type() {
        let mut f = fixture();
        f.host.add_unit(f.left, "Lamp");
        let wanted = f.host.add_unit(f.right, "Lamp");
        f.host.set_tag(f.right, "Main");

        let binding = Binding::component("Lamp")
            .from_descendants()
            .where_tag("Main")
            .build();
        assert_eq!(
            run(&f.host, &binding, f.scope, None).candidates,
            vec![ObjectRef::Unit(wanted)]
        );
    }

    #[test]
    fn target_filters_suppress_lookup() {
        let mut f = fixture();
        f.host.add_unit(f.left, "Lamp");
        let owner = f.host.add_unit(f.right, "Fan");
        let binding = Binding::component("Lamp")
            .from_descendants()
            .when_target(CandidateFilter::Tag("Lit".into()))
            .build();
        let site = InjectionSite::new(owner, "Fan", "lamp", "Lamp");

        let located = run(&f.host, &binding, f.scope, Some(&site));
        assert!(located.target_rejected);
        assert!(located.candidates.is_empty());

        f.host.set_tag(f.right, "Lit");
        let located = run(&f.host, &binding, f.scope, Some(&site));
        assert!(!located.target_rejected);
        assert_eq!(located.candidates.len(), 1);
    }

    #[test]
    fn factories_and_instances() {
        let mut f = fixture();
        let lamp = f.host.add_unit(f.left, "Lamp");

        let fixed = Binding::component("Lamp").from_instance(lamp.into()).build();
        assert_eq!(run(&f.host, &fixed, f.scope, None).candidates, vec![ObjectRef::Unit(lamp)]);

        let made = Binding::component("Lamp")
            .from_factory(Factory::new(move |_| vec![ObjectRef::Unit(lamp)]))
            .build();
        assert_eq!(run(&f.host, &made, f.scope, None).candidates.len(), 1);

        let per_site = Binding::component("Lamp")
            .from_factory(Factory::per_site(move |_| vec![ObjectRef::Unit(lamp)]))
            .build();
        assert!(run(&f.host, &per_site, f.scope, None).candidates.is_empty());
    }

    #[test]
    fn asset_queries() {
        let mut f = fixture();
        f.host.declare_asset_type("Palette", &[]);
        let warm = f.host.add_asset("Art/Palettes/warm.asset", "Palette");
        let cold = f.host.add_asset("Art/Palettes/Extra/cold.asset", "Palette");
        f.host.add_asset("Art/Other/noise.asset", "Palette");

        let by_path = Binding::asset("Palette").from_asset_path("Art/Palettes/warm.asset").build();
        assert_eq!(run(&f.host, &by_path, f.scope, None).candidates, vec![ObjectRef::Asset(warm)]);

        let by_folder = Binding::asset("Palette").from_asset_folder("Art/Palettes").build();
        assert_eq!(
            run(&f.host, &by_folder, f.scope, None).candidates,
            vec![ObjectRef::Asset(warm), ObjectRef::Asset(cold)]
        );

        let all = Binding::asset("Palette").from_all_assets().build();
        assert_eq!(run(&f.host, &all, f.scope, None).candidates.len(), 3);
    }

    #[test]
    fn anywhere_scans_every_container() {
        let mut f = fixture();
        let other = f.host.add_container("Other");
        let far = f.host.add_root(other, "Far");
        let far_lamp = f.host.add_unit(far, "Lamp");
        let near_lamp = f.host.add_unit(f.leaf, "Lamp");

        let binding = Binding::component("Lamp").anywhere().collection().build();
        let located = run(&f.host, &binding, f.scope, None);
        assert_eq!(located.candidates, vec![ObjectRef::Unit(near_lamp), ObjectRef::Unit(far_lamp)]);
    }
}
