//! Partition Classifier
//!
//! Every object belongs to an isolation partition. Two objects may reference
//! each other only when their partitions are context-compatible:
//! either side is [`Partition::Unrestricted`], or both classify equal.
//!
//! Template instances are keyed by their *own* outermost instance root, so two
//! instances of the same template are different partitions.

use serde::Serialize;

use crate::host::{NodeHome, StructureTree};
use crate::model::{ContainerId, NodeId, ObjectRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "partition", content = "root", rename_all = "snake_case")]
pub enum Partition {
    /// Non-structural object, compatible with everything
    Unrestricted,
    LiveContainer(ContainerId),
    /// Keyed by the outermost instance root node
    TemplateInstance(NodeId),
    /// Keyed by the template asset's structural root (or session content root)
    TemplateAsset(NodeId),
}

impl Partition {
    /// Template instance or template asset
    pub fn is_template(&self) -> bool {
        matches!(self, Partition::TemplateInstance(_) | Partition::TemplateAsset(_))
    }
}

/// Classify any object
pub fn classify<T: StructureTree + ?Sized>(tree: &T, object: ObjectRef) -> Partition {
    match object {
        ObjectRef::Asset(_) => Partition::Unrestricted,
        ObjectRef::Unit(unit) => classify_node(tree, tree.node_of(unit)),
        ObjectRef::Node(node) => classify_node(tree, node),
    }
}

/// Classify a structural node
pub fn classify_node<T: StructureTree + ?Sized>(tree: &T, node: NodeId) -> Partition {
    match tree.home(node) {
        NodeHome::Container(container) => match tree.outermost_instance_root(node) {
            Some(root) => Partition::TemplateInstance(root),
            None => Partition::LiveContainer(container),
        },
        NodeHome::Asset { root } => Partition::TemplateAsset(root),
        NodeHome::Session {
            content_root,
            asset_root,
        } => Partition::TemplateAsset(asset_root.unwrap_or(content_root)),
    }
}

/// Whether two partitions may reference each other (symmetric)
#[inline]
pub fn compatible(a: Partition, b: Partition) -> bool {
    a == Partition::Unrestricted || b == Partition::Unrestricted || a == b
}

/// Whether two objects may reference each other
pub fn context_compatible<T: StructureTree + ?Sized>(tree: &T, a: ObjectRef, b: ObjectRef) -> bool {
    compatible(classify(tree, a), classify(tree, b))
}
