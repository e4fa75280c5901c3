//! Host Module - collaborator seams consumed by the resolver
//!
//! The resolver never owns the structural tree. Everything it needs comes
//! through these narrow traits:
//! - [`StructureTree`]: topology, partition roots, node metadata
//! - [`TypeCatalog`]: type shapes and assignability
//! - [`SiteSource`]: site enumeration, binding declaration, write-back
//! - [`AssetStore`]: non-structural asset lookup
//! - [`StandInStore`]: persisted proxy stand-ins and their generation hook
//!
//! [`MemoryHost`] implements all of them in memory (tests, CLI manifests).

mod memory;

pub use memory::{Assignment, MemoryHost, STAND_IN_FOLDER};

use crate::binding::Binding;
use crate::error::Result;
use crate::model::{
    AssetId, ContainerId, Injected, InjectionSite, NodeId, ObjectRef, TypeKind, TypeName, UnitId,
};

/// Where a node lives, as far as partitioning is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeHome {
    /// Inside an open live container
    Container(ContainerId),
    /// Part of an uninstantiated template asset whose structural root is `root`
    Asset { root: NodeId },
    /// Inside an open template-editing session
    Session {
        content_root: NodeId,
        /// Root of the template asset being edited, when resolvable
        asset_root: Option<NodeId>,
    },
}

/// Structural tree accessors
pub trait StructureTree {
    /// Whether `node` is a node of this host
    fn contains_node(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Ordered children
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Behavior units attached to a node, in attachment order
    fn units(&self, node: NodeId) -> &[UnitId];

    fn node_of(&self, unit: UnitId) -> NodeId;

    /// Whether a unit is a Scope (owns bindings)
    fn is_scope(&self, unit: UnitId) -> bool;

    fn node_name(&self, node: NodeId) -> &str;

    fn node_tag(&self, node: NodeId) -> Option<&str>;

    fn is_active(&self, node: NodeId) -> bool;

    /// All open live containers
    fn containers(&self) -> Vec<ContainerId>;

    /// Top-level nodes of a live container, in order
    fn container_roots(&self, container: ContainerId) -> &[NodeId];

    fn home(&self, node: NodeId) -> NodeHome;

    /// Whether `node` is the root of a template instance
    fn is_instance_root(&self, node: NodeId) -> bool;

    /// The Scope attached to a node, if any (at most one per node)
    fn scope_of(&self, node: NodeId) -> Option<UnitId> {
        self.units(node).iter().copied().find(|u| self.is_scope(*u))
    }

    /// Root of a template instance, template asset, or editing session
    fn is_partition_root(&self, node: NodeId) -> bool {
        if self.is_instance_root(node) {
            return true;
        }
        match self.home(node) {
            NodeHome::Asset { root } => root == node,
            NodeHome::Session { content_root, .. } => content_root == node,
            NodeHome::Container(_) => false,
        }
    }

    /// Outermost template-instance root enclosing `node` (self included)
    fn outermost_instance_root(&self, node: NodeId) -> Option<NodeId> {
        let mut found = None;
        let mut current = Some(node);
        while let Some(n) = current {
            if self.is_instance_root(n) {
                found = Some(n);
            }
            current = self.parent(n);
        }
        found
    }

    /// Topmost ancestor of a node (self if it has no parent)
    fn root_of(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }
}

/// Type shapes and assignability
pub trait TypeCatalog {
    /// `None` for types the host does not know
    fn type_kind(&self, ty: &TypeName) -> Option<TypeKind>;

    /// Whether a value of `ty` can be used where `target` is expected
    fn is_assignable(&self, ty: &TypeName, target: &TypeName) -> bool;

    fn type_of(&self, object: ObjectRef) -> Option<TypeName>;
}

/// Injection-site enumeration and write-back
pub trait SiteSource {
    /// Sites declared by a behavior unit
    fn sites(&self, unit: UnitId) -> Vec<InjectionSite>;

    /// Bindings a Scope declares at pass start
    fn declare_bindings(&self, scope: UnitId) -> Vec<Binding>;

    fn assign(&mut self, site: &InjectionSite, value: Injected);
}

/// Non-structural asset lookup
pub trait AssetStore {
    fn asset_at(&self, path: &str) -> Option<AssetId>;

    /// Every asset below `folder`, recursively
    fn assets_under(&self, folder: &str) -> Vec<AssetId>;

    fn all_assets(&self) -> Vec<AssetId>;

    fn asset_name(&self, asset: AssetId) -> &str;
}

/// Persisted indirection stand-ins
pub trait StandInStore {
    /// Whether a stand-in implementation has been generated and built for `ty`
    fn has_implementation(&self, ty: &TypeName) -> bool;

    /// Ask for the implementation of `ty` to be generated (observed next pass)
    fn request_generation(&mut self, ty: &TypeName);

    fn find_stand_in(&self, ty: &TypeName) -> Option<AssetId>;

    fn create_stand_in(&mut self, ty: &TypeName) -> Result<AssetId>;
}

/// Everything a pass needs from its host
pub trait Host: StructureTree + TypeCatalog + SiteSource + AssetStore + StandInStore {}

impl<T> Host for T where T: StructureTree + TypeCatalog + SiteSource + AssetStore + StandInStore {}
