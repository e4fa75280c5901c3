//! Domain Model - handles and descriptors shared by every layer
//!
//! The host owns the actual objects; the resolver only ever sees opaque,
//! copyable handles:
//! - `NodeId`: a structural node
//! - `UnitId`: a behavior unit attached to a node (scopes are units too)
//! - `AssetId`: a non-structural asset (stand-ins are assets)
//! - `ContainerId`: a live container (one open structural tree)

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::util::intern;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// Structural node handle
    NodeId,
    "node"
);
handle!(
    /// Behavior unit handle
    UnitId,
    "unit"
);
handle!(
    /// Non-structural asset handle
    AssetId,
    "asset"
);
handle!(
    /// Live container handle
    ContainerId,
    "container"
);

/// Any object the resolver can hand out or inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ObjectRef {
    Node(NodeId),
    Unit(UnitId),
    Asset(AssetId),
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Node(n) => n.fmt(f),
            ObjectRef::Unit(u) => u.fmt(f),
            ObjectRef::Asset(a) => a.fmt(f),
        }
    }
}

impl From<UnitId> for ObjectRef {
    fn from(unit: UnitId) -> Self {
        ObjectRef::Unit(unit)
    }
}

impl From<AssetId> for ObjectRef {
    fn from(asset: AssetId) -> Self {
        ObjectRef::Asset(asset)
    }
}

impl From<NodeId> for ObjectRef {
    fn from(node: NodeId) -> Self {
        ObjectRef::Node(node)
    }
}

/// Interned type name
///
/// Equality is by content; interning only makes clones and hashing cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(name: &str) -> Self {
        Self(intern(name))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Serialize for TypeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Shape of a type as far as binding validation cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Pure contract, never instantiated directly
    Interface,
    /// Attachable to a node as a behavior unit
    Component,
    /// Non-structural data asset
    Asset,
    /// Anything else (plain values)
    Plain,
}

/// Single value or collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    Single,
    Collection,
}

/// One field/property/parameter needing resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionSite {
    /// The behavior unit that owns the member
    pub unit: UnitId,
    /// Type declaring the member (matched against target qualifiers)
    pub declaring_type: TypeName,
    pub member: Arc<str>,
    /// Requested type (interface or concrete, see `by_interface`)
    pub requested: TypeName,
    pub by_interface: bool,
    pub cardinality: Cardinality,
    pub id: Option<Arc<str>>,
    pub suppress_on_missing: bool,
}

impl InjectionSite {
    /// Site requesting a single value of `requested`
    pub fn new(unit: UnitId, declaring_type: &str, member: &str, requested: &str) -> Self {
        Self {
            unit,
            declaring_type: TypeName::new(declaring_type),
            member: Arc::from(member),
            requested: TypeName::new(requested),
            by_interface: false,
            cardinality: Cardinality::Single,
            id: None,
            suppress_on_missing: false,
        }
    }

    pub fn by_interface(mut self) -> Self {
        self.by_interface = true;
        self
    }

    pub fn collection(mut self) -> Self {
        self.cardinality = Cardinality::Collection;
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(Arc::from(id));
        self
    }

    pub fn suppress_on_missing(mut self) -> Self {
        self.suppress_on_missing = true;
        self
    }

    /// `Declaring.member` label used in diagnostics
    pub fn label(&self) -> String {
        format!("{}.{}", self.declaring_type, self.member)
    }
}

/// Resolved value written back into a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Injected {
    Single(ObjectRef),
    Collection(Vec<ObjectRef>),
}

impl Injected {
    /// All objects in the value, in order
    pub fn objects(&self) -> &[ObjectRef] {
        match self {
            Injected::Single(obj) => std::slice::from_ref(obj),
            Injected::Collection(objs) => objs,
        }
    }
}
