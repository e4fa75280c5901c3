//! In-memory host
//!
//! Arena-backed implementation of every host trait. Built programmatically in
//! tests or from a YAML manifest by the CLI (see [`crate::ast`]).

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::{AssetStore, NodeHome, SiteSource, StandInStore, StructureTree, TypeCatalog};
use crate::binding::Binding;
use crate::error::{Result, WireError};
use crate::model::{
    AssetId, ContainerId, Injected, InjectionSite, NodeId, ObjectRef, TypeKind, TypeName, UnitId,
};

/// Folder new stand-in assets are created in
pub const STAND_IN_FOLDER: &str = "StandIns";

#[derive(Debug)]
struct TypeEntry {
    kind: TypeKind,
    supertypes: SmallVec<[TypeName; 2]>,
}

#[derive(Debug)]
struct NodeEntry {
    name: String,
    tag: Option<String>,
    active: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    units: Vec<UnitId>,
    home: NodeHome,
    instance_root: bool,
}

#[derive(Debug)]
struct UnitEntry {
    node: NodeId,
    type_name: TypeName,
    scope: bool,
    bindings: Vec<Binding>,
    sites: Vec<InjectionSite>,
}

#[derive(Debug)]
struct ContainerEntry {
    name: String,
    roots: Vec<NodeId>,
}

#[derive(Debug)]
struct AssetEntry {
    path: String,
    name: String,
    type_name: TypeName,
}

/// One value written back by a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub site: InjectionSite,
    pub value: Injected,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    types: FxHashMap<TypeName, TypeEntry>,
    nodes: Vec<NodeEntry>,
    units: Vec<UnitEntry>,
    containers: Vec<ContainerEntry>,
    assets: Vec<AssetEntry>,
    assignments: Vec<Assignment>,
    implementations: FxHashSet<TypeName>,
    generation_requests: Vec<TypeName>,
    stand_ins: FxHashMap<TypeName, AssetId>,
    store_read_only: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════
    // TYPES
    // ═══════════════════════════════════════════

    pub fn declare_type(&mut self, name: &str, kind: TypeKind, supertypes: &[&str]) -> TypeName {
        let ty = TypeName::new(name);
        self.types.insert(
            ty.clone(),
            TypeEntry {
                kind,
                supertypes: supertypes.iter().map(|s| TypeName::new(s)).collect(),
            },
        );
        ty
    }

    pub fn declare_interface(&mut self, name: &str) -> TypeName {
        self.declare_type(name, TypeKind::Interface, &[])
    }

    pub fn declare_component(&mut self, name: &str, supertypes: &[&str]) -> TypeName {
        self.declare_type(name, TypeKind::Component, supertypes)
    }

    pub fn declare_asset_type(&mut self, name: &str, supertypes: &[&str]) -> TypeName {
        self.declare_type(name, TypeKind::Asset, supertypes)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.types.contains_key(&TypeName::new(name))
    }

    // ═══════════════════════════════════════════
    // STRUCTURE
    // ═══════════════════════════════════════════

    pub fn add_container(&mut self, name: &str) -> ContainerId {
        let id = ContainerId(self.containers.len() as u32);
        self.containers.push(ContainerEntry {
            name: name.to_string(),
            roots: Vec::new(),
        });
        id
    }

    pub fn add_root(&mut self, container: ContainerId, name: &str) -> NodeId {
        let node = self.push_node(name, None, NodeHome::Container(container));
        self.containers[container.index()].roots.push(node);
        node
    }

    /// Child inherits its parent's home
    pub fn add_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let home = self.nodes[parent.index()].home;
        let node = self.push_node(name, Some(parent), home);
        self.nodes[parent.index()].children.push(node);
        node
    }

    /// Uninstantiated template asset; returns its structural root
    pub fn add_template_asset(&mut self, name: &str) -> NodeId {
        let root = NodeId(self.nodes.len() as u32);
        self.push_node(name, None, NodeHome::Asset { root })
    }

    /// Open editing session; returns its content root
    pub fn open_session(&mut self, name: &str, asset_root: Option<NodeId>) -> NodeId {
        let content_root = NodeId(self.nodes.len() as u32);
        self.push_node(
            name,
            None,
            NodeHome::Session {
                content_root,
                asset_root,
            },
        )
    }

    fn push_node(&mut self, name: &str, parent: Option<NodeId>, home: NodeHome) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeEntry {
            name: name.to_string(),
            tag: None,
            active: true,
            parent,
            children: Vec::new(),
            units: Vec::new(),
            home,
            instance_root: false,
        });
        id
    }

    pub fn mark_instance_root(&mut self, node: NodeId) {
        self.nodes[node.index()].instance_root = true;
    }

    pub fn set_tag(&mut self, node: NodeId, tag: &str) {
        self.nodes[node.index()].tag = Some(tag.to_string());
    }

    pub fn set_active(&mut self, node: NodeId, active: bool) {
        self.nodes[node.index()].active = active;
    }

    pub fn container_named(&self, name: &str) -> Option<ContainerId> {
        self.containers
            .iter()
            .position(|c| c.name == name)
            .map(|i| ContainerId(i as u32))
    }

    pub fn container_name(&self, container: ContainerId) -> &str {
        &self.containers[container.index()].name
    }

    /// First node carrying `name`, in creation order
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| NodeId(i as u32))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ═══════════════════════════════════════════
    // UNITS, SCOPES, SITES
    // ═══════════════════════════════════════════

    /// Attach a behavior unit; unknown types are declared as components
    pub fn add_unit(&mut self, node: NodeId, type_name: &str) -> UnitId {
        self.push_unit(node, type_name, false, Vec::new())
    }

    /// Attach a scope declaring `bindings`
    pub fn add_scope(&mut self, node: NodeId, type_name: &str, bindings: Vec<Binding>) -> UnitId {
        self.push_unit(node, type_name, true, bindings)
    }

    fn push_unit(&mut self, node: NodeId, type_name: &str, scope: bool, bindings: Vec<Binding>) -> UnitId {
        if !self.is_declared(type_name) {
            self.declare_component(type_name, &[]);
        }
        let id = UnitId(self.units.len() as u32);
        self.units.push(UnitEntry {
            node,
            type_name: TypeName::new(type_name),
            scope,
            bindings,
            sites: Vec::new(),
        });
        self.nodes[node.index()].units.push(id);
        id
    }

    pub fn add_binding(&mut self, scope: UnitId, binding: Binding) {
        self.units[scope.index()].bindings.push(binding);
    }

    /// Register a site on the unit it names
    pub fn add_site(&mut self, site: InjectionSite) {
        self.units[site.unit.index()].sites.push(site);
    }

    pub fn unit_type(&self, unit: UnitId) -> &TypeName {
        &self.units[unit.index()].type_name
    }

    /// Value last written to `unit.member`
    pub fn assigned(&self, unit: UnitId, member: &str) -> Option<&Injected> {
        self.assignments
            .iter()
            .rev()
            .find(|a| a.site.unit == unit && &*a.site.member == member)
            .map(|a| &a.value)
    }

    /// Every write, in pass order
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn clear_assignments(&mut self) {
        self.assignments.clear();
    }

    /// Human-readable label for any object
    pub fn describe(&self, object: ObjectRef) -> String {
        match object {
            ObjectRef::Node(node) => self.nodes[node.index()].name.clone(),
            ObjectRef::Unit(unit) => {
                let entry = &self.units[unit.index()];
                format!("{}@{}", entry.type_name, self.nodes[entry.node.index()].name)
            }
            ObjectRef::Asset(asset) => self.assets[asset.index()].path.clone(),
        }
    }

    // ═══════════════════════════════════════════
    // ASSETS + STAND-INS
    // ═══════════════════════════════════════════

    /// Add an asset; its name is the file stem of `path`
    pub fn add_asset(&mut self, path: &str, type_name: &str) -> AssetId {
        let id = AssetId(self.assets.len() as u32);
        let file = path.rsplit('/').next().unwrap_or(path);
        let name = file.split_once('.').map_or(file, |(stem, _)| stem);
        self.assets.push(AssetEntry {
            path: path.to_string(),
            name: name.to_string(),
            type_name: TypeName::new(type_name),
        });
        id
    }

    /// Mark the stand-in implementation for `type_name` as built
    pub fn provide_implementation(&mut self, type_name: &str) {
        self.implementations.insert(TypeName::new(type_name));
    }

    /// Build every requested implementation (the external rebuild step)
    pub fn complete_generation(&mut self) {
        for ty in self.generation_requests.drain(..) {
            self.implementations.insert(ty);
        }
    }

    pub fn generation_requests(&self) -> &[TypeName] {
        &self.generation_requests
    }

    pub fn stand_in_count(&self) -> usize {
        self.stand_ins.len()
    }

    /// Refuse stand-in creation
    pub fn set_store_read_only(&mut self, read_only: bool) {
        self.store_read_only = read_only;
    }

    fn supertypes_closure(&self, ty: &TypeName) -> Vec<TypeName> {
        let mut seen: Vec<TypeName> = Vec::new();
        let mut stack = vec![ty.clone()];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.types.get(&current) {
                for sup in &entry.supertypes {
                    if !seen.contains(sup) {
                        seen.push(sup.clone());
                        stack.push(sup.clone());
                    }
                }
            }
        }
        seen
    }
}

impl StructureTree for MemoryHost {
    fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.index()].children
    }

    fn units(&self, node: NodeId) -> &[UnitId] {
        &self.nodes[node.index()].units
    }

    fn node_of(&self, unit: UnitId) -> NodeId {
        self.units[unit.index()].node
    }

    fn is_scope(&self, unit: UnitId) -> bool {
        self.units[unit.index()].scope
    }

    fn node_name(&self, node: NodeId) -> &str {
        &self.nodes[node.index()].name
    }

    fn node_tag(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.index()].tag.as_deref()
    }

    fn is_active(&self, node: NodeId) -> bool {
        self.nodes[node.index()].active
    }

    fn containers(&self) -> Vec<ContainerId> {
        (0..self.containers.len() as u32).map(ContainerId).collect()
    }

    fn container_roots(&self, container: ContainerId) -> &[NodeId] {
        &self.containers[container.index()].roots
    }

    fn home(&self, node: NodeId) -> NodeHome {
        self.nodes[node.index()].home
    }

    fn is_instance_root(&self, node: NodeId) -> bool {
        self.nodes[node.index()].instance_root
    }
}

impl TypeCatalog for MemoryHost {
    fn type_kind(&self, ty: &TypeName) -> Option<TypeKind> {
        self.types.get(ty).map(|t| t.kind)
    }

    fn is_assignable(&self, ty: &TypeName, target: &TypeName) -> bool {
        ty == target || self.supertypes_closure(ty).contains(target)
    }

    fn type_of(&self, object: ObjectRef) -> Option<TypeName> {
        match object {
            ObjectRef::Node(_) => None,
            ObjectRef::Unit(unit) => Some(self.units[unit.index()].type_name.clone()),
            ObjectRef::Asset(asset) => Some(self.assets[asset.index()].type_name.clone()),
        }
    }
}

impl SiteSource for MemoryHost {
    fn sites(&self, unit: UnitId) -> Vec<InjectionSite> {
        self.units[unit.index()].sites.clone()
    }

    fn declare_bindings(&self, scope: UnitId) -> Vec<Binding> {
        self.units[scope.index()].bindings.clone()
    }

    fn assign(&mut self, site: &InjectionSite, value: Injected) {
        self.assignments.push(Assignment {
            site: site.clone(),
            value,
        });
    }
}

impl AssetStore for MemoryHost {
    fn asset_at(&self, path: &str) -> Option<AssetId> {
        self.assets
            .iter()
            .position(|a| a.path == path)
            .map(|i| AssetId(i as u32))
    }

    fn assets_under(&self, folder: &str) -> Vec<AssetId> {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        self.assets
            .iter()
            .enumerate()
            .filter(|(_, a)| a.path.starts_with(&prefix))
            .map(|(i, _)| AssetId(i as u32))
            .collect()
    }

    fn all_assets(&self) -> Vec<AssetId> {
        (0..self.assets.len() as u32).map(AssetId).collect()
    }

    fn asset_name(&self, asset: AssetId) -> &str {
        &self.assets[asset.index()].name
    }
}

impl StandInStore for MemoryHost {
    fn has_implementation(&self, ty: &TypeName) -> bool {
        self.implementations.contains(ty)
    }

    fn request_generation(&mut self, ty: &TypeName) {
        if !self.generation_requests.contains(ty) {
            self.generation_requests.push(ty.clone());
        }
    }

    fn find_stand_in(&self, ty: &TypeName) -> Option<AssetId> {
        self.stand_ins.get(ty).copied()
    }

    /// Stand-in type `{T}StandIn` shares `T`'s supertypes
    fn create_stand_in(&mut self, ty: &TypeName) -> Result<AssetId> {
        if self.store_read_only {
            return Err(WireError::StandInStore {
                type_name: ty.to_string(),
                reason: "store is read-only".to_string(),
            });
        }
        if self.type_kind(ty).is_none() {
            return Err(WireError::StandInStore {
                type_name: ty.to_string(),
                reason: "type is not declared".to_string(),
            });
        }

        let stand_in_type = format!("{ty}StandIn");
        let supertypes = self.supertypes_closure(ty);
        let supers: Vec<&str> = supertypes.iter().map(TypeName::as_str).collect();
        self.declare_asset_type(&stand_in_type, &supers);

        let asset = self.add_asset(
            &format!("{STAND_IN_FOLDER}/{stand_in_type}.asset"),
            &stand_in_type,
        );
        self.stand_ins.insert(ty.clone(), asset);
        Ok(asset)
    }
}
