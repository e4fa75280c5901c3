//! Manifest loader - builds a [`MemoryHost`] from a [`Manifest`]
//!
//! Nodes, units and sites come first; bindings are built afterwards so
//! instance and search references may point at nodes declared later.

use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::manifest::{
    BindingSpec, DirectionSpec, FilterSpec, InstanceSpec, KindSpec, LocateSpec, Manifest, NodeSpec, OriginSpec,
    SearchSpec, SiteSpec,
};
use crate::binding::{Binding, BindingBuilder};
use crate::error::{Result, WireError};
use crate::host::{AssetStore, MemoryHost, StructureTree};
use crate::locate::{CandidateFilter, ChildPick, Direction, Origin};
use crate::model::{InjectionSite, NodeId, ObjectRef, UnitId};

impl MemoryHost {
    pub fn from_manifest(manifest: &Manifest) -> Result<Self> {
        Loader::default().load(manifest)
    }
}

struct PendingBindings<'m> {
    scope: UnitId,
    node: &'m str,
    specs: &'m [BindingSpec],
}

#[derive(Default)]
struct Loader<'m> {
    host: MemoryHost,
    nodes: FxHashMap<&'m str, NodeId>,
    pending: Vec<PendingBindings<'m>>,
}

impl<'m> Loader<'m> {
    fn load(mut self, manifest: &'m Manifest) -> Result<MemoryHost> {
        let types = &manifest.types;
        for name in &types.interfaces {
            self.host.declare_interface(name);
        }
        for (name, supers) in &types.components {
            let supers: Vec<&str> = supers.iter().map(String::as_str).collect();
            self.host.declare_component(name, &supers);
        }
        for (name, supers) in &types.assets {
            let supers: Vec<&str> = supers.iter().map(String::as_str).collect();
            self.host.declare_asset_type(name, &supers);
        }
        for name in &manifest.implementations {
            self.host.provide_implementation(name);
        }
        for asset in &manifest.assets {
            if self.host.asset_at(&asset.path).is_some() {
                return Err(WireError::DuplicateName {
                    kind: "asset",
                    name: asset.path.clone(),
                });
            }
            self.host.add_asset(&asset.path, &asset.type_name);
        }

        for container in &manifest.containers {
            if self.host.container_named(&container.name).is_some() {
                return Err(WireError::DuplicateName {
                    kind: "container",
                    name: container.name.clone(),
                });
            }
            let id = self.host.add_container(&container.name);
            for spec in &container.nodes {
                let node = self.host.add_root(id, &spec.name);
                self.populate(node, spec)?;
            }
        }
        for template in &manifest.templates {
            let node = self.host.add_template_asset(&template.root.name);
            self.populate(node, &template.root)?;
        }
        for session in &manifest.sessions {
            let asset_root = match &session.asset {
                Some(name) => Some(self.node(name)?),
                None => None,
            };
            let node = self.host.open_session(&session.root.name, asset_root);
            self.populate(node, &session.root)?;
        }

        for pending in std::mem::take(&mut self.pending) {
            for (index, spec) in pending.specs.iter().enumerate() {
                let location = format!("{}/bindings[{}]", pending.node, index);
                let binding = self.binding(spec, &location)?;
                self.host.add_binding(pending.scope, binding);
            }
        }

        debug!(nodes = self.host.node_count(), "manifest loaded");
        Ok(self.host)
    }

    fn populate(&mut self, node: NodeId, spec: &'m NodeSpec) -> Result<()> {
        if self.nodes.insert(&spec.name, node).is_some() {
            return Err(WireError::DuplicateName {
                kind: "node",
                name: spec.name.clone(),
            });
        }
        if let Some(tag) = &spec.tag {
            self.host.set_tag(node, tag);
        }
        self.host.set_active(node, spec.active);
        if spec.instance {
            self.host.mark_instance_root(node);
        }

        if let Some(scope_spec) = &spec.scope {
            let scope = self.host.add_scope(node, &scope_spec.type_name, Vec::new());
            self.add_sites(scope, &scope_spec.type_name, &scope_spec.sites);
            self.pending.push(PendingBindings {
                scope,
                node: &spec.name,
                specs: &scope_spec.bindings,
            });
        }
        for unit_spec in &spec.units {
            let unit = self.host.add_unit(node, &unit_spec.type_name);
            self.add_sites(unit, &unit_spec.type_name, &unit_spec.sites);
        }
        for child_spec in &spec.children {
            let child = self.host.add_child(node, &child_spec.name);
            self.populate(child, child_spec)?;
        }
        Ok(())
    }

    fn add_sites(&mut self, unit: UnitId, unit_type: &str, specs: &[SiteSpec]) {
        for spec in specs {
            let declaring = spec.declaring.as_deref().unwrap_or(unit_type);
            let mut site = InjectionSite::new(unit, declaring, &spec.member, &spec.requests);
            if spec.by_interface {
                site = site.by_interface();
            }
            if spec.collection {
                site = site.collection();
            }
            if let Some(id) = &spec.id {
                site = site.with_id(id);
            }
            if spec.suppress {
                site = site.suppress_on_missing();
            }
            self.host.add_site(site);
        }
    }

    fn node(&self, name: &str) -> Result<NodeId> {
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| WireError::UnknownReference {
                kind: "node",
                name: name.to_string(),
            })
    }

    // ═══════════════════════════════════════════
    // BINDINGS
    // ═══════════════════════════════════════════

    fn binding(&self, spec: &BindingSpec, location: &str) -> Result<Binding> {
        let concrete = spec.bind.as_deref();
        let interface = spec.interface.as_deref();
        let mut builder = match (spec.kind, concrete, interface) {
            (KindSpec::Component, Some(c), Some(i)) => Binding::bind(i, c),
            (KindSpec::Component, Some(c), None) => Binding::component(c),
            (KindSpec::Component, None, Some(i)) => Binding::interface(i),
            (KindSpec::Asset, Some(c), Some(i)) => Binding::asset_bind(i, c),
            (KindSpec::Asset, Some(c), None) => Binding::asset(c),
            (KindSpec::Asset, None, Some(i)) => Binding::asset_interface(i),
            (_, None, None) => {
                return Err(WireError::InvalidManifest {
                    location: location.to_string(),
                    reason: "binding declares neither `bind` nor `as`".to_string(),
                })
            }
        };

        if spec.collection {
            builder = builder.collection();
        }
        if spec.global {
            builder = builder.global();
        }
        if spec.proxy {
            builder = builder.proxy();
        }
        for id in &spec.ids {
            builder = builder.with_id(id);
        }
        for target in &spec.targets {
            builder = builder.to_target(target);
        }
        for member in &spec.members {
            builder = builder.to_member(member);
        }
        for filter in filters(&spec.filters)? {
            builder = builder.where_filter(filter);
        }
        for filter in filters(&spec.when_target)? {
            builder = builder.when_target(filter);
        }

        Ok(self.locators(builder, &spec.locate, location)?.build())
    }

    fn locators(&self, mut builder: BindingBuilder, spec: &LocateSpec, location: &str) -> Result<BindingBuilder> {
        if let Some(search) = &spec.search {
            let (origin, direction) = self.search(search, location)?;
            builder = builder.locate(origin, direction);
        }
        if let Some(instances) = &spec.instances {
            let objects = instances
                .iter()
                .map(|instance| self.instance(instance, location))
                .collect::<Result<Vec<_>>>()?;
            builder = builder.from_instances(objects);
        }
        if let Some(path) = &spec.asset_path {
            builder = builder.from_asset_path(path);
        }
        if let Some(folder) = &spec.asset_folder {
            builder = builder.from_asset_folder(folder);
        }
        if spec.all_assets {
            builder = builder.from_all_assets();
        }
        Ok(builder)
    }

    fn search(&self, spec: &SearchSpec, location: &str) -> Result<(Origin, Direction)> {
        let origin = match spec.from {
            OriginSpec::Scope => Origin::ScopeNode,
            OriginSpec::ScopeRoot => Origin::ScopeRoot,
            OriginSpec::Site => Origin::SiteNode,
            OriginSpec::FirstChild => Origin::ScopeChild(ChildPick::First),
            OriginSpec::LastChild => Origin::ScopeChild(ChildPick::Last),
            OriginSpec::Child => Origin::ScopeChild(ChildPick::Index(required(spec.from_index, "from_index", location)?)),
            OriginSpec::Node => {
                let name = spec.from_node.as_deref().ok_or_else(|| missing("from_node", location))?;
                Origin::External(self.node(name)?)
            }
        };
        let direction = match spec.direction {
            DirectionSpec::Itself => Direction::Itself,
            DirectionSpec::Parent => Direction::Parent,
            DirectionSpec::Ancestors => Direction::Ancestors {
                include_self: spec.include_self.unwrap_or(false),
            },
            DirectionSpec::Descendants => Direction::Descendants {
                include_self: spec.include_self.unwrap_or(true),
            },
            DirectionSpec::FirstChild => Direction::Child(ChildPick::First),
            DirectionSpec::LastChild => Direction::Child(ChildPick::Last),
            DirectionSpec::Child => Direction::Child(ChildPick::Index(required(spec.index, "index", location)?)),
            DirectionSpec::Siblings => Direction::Siblings,
            DirectionSpec::Anywhere => Direction::Anywhere,
        };
        Ok((origin, direction))
    }

    fn instance(&self, spec: &InstanceSpec, location: &str) -> Result<ObjectRef> {
        if let Some(path) = &spec.asset {
            return self
                .host
                .asset_at(path)
                .map(ObjectRef::Asset)
                .ok_or_else(|| WireError::UnknownReference {
                    kind: "asset",
                    name: path.clone(),
                });
        }
        let (Some(node_name), Some(unit_type)) = (&spec.node, &spec.unit) else {
            return Err(WireError::InvalidManifest {
                location: location.to_string(),
                reason: "instance needs `asset`, or both `node` and `unit`".to_string(),
            });
        };
        let node = self.node(node_name)?;
        self.host
            .units(node)
            .iter()
            .copied()
            .find(|unit| self.host.unit_type(*unit).as_str() == unit_type)
            .map(ObjectRef::Unit)
            .ok_or_else(|| WireError::UnknownReference {
                kind: "unit",
                name: format!("{node_name}/{unit_type}"),
            })
    }
}

fn missing(field: &str, location: &str) -> WireError {
    WireError::InvalidManifest {
        location: location.to_string(),
        reason: format!("search needs `{field}`"),
    }
}

fn required(value: Option<usize>, field: &str, location: &str) -> Result<usize> {
    value.ok_or_else(|| missing(field, location))
}

fn filters(spec: &FilterSpec) -> Result<Vec<CandidateFilter>> {
    let mut filters = Vec::new();
    if let Some(name) = &spec.name {
        filters.push(CandidateFilter::Name(name.clone()));
    }
    if let Some(pattern) = &spec.name_matches {
        let re = Regex::new(pattern).map_err(|e| WireError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        filters.push(CandidateFilter::NameMatches(re));
    }
    if let Some(tag) = &spec.tag {
        filters.push(CandidateFilter::Tag(tag.clone()));
    }
    if let Some(active) = spec.active {
        filters.push(CandidateFilter::Active(active));
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{SiteSource, TypeCatalog};
    use crate::model::{Cardinality, TypeKind, TypeName};

    const SCENE: &str = r#"
schema: scopewire/manifest@0.1
types:
  interfaces: [IWeapon]
  components:
    Rifle: [IWeapon]
  assets:
    Settings: []
assets:
  - { path: Data/settings.asset, type: Settings }
containers:
  - name: Main
    nodes:
      - name: Level
        scope:
          bindings:
            - bind: Rifle
              as: IWeapon
              locate:
                instances: [{ node: Armory, unit: Rifle }]
            - kind: asset
              bind: Settings
              global: true
              locate: { asset_path: Data/settings.asset }
        children:
          - name: Armory
            tag: Storage
            units: [{ type: Rifle }]
          - name: Soldier
            instance: true
            units:
              - type: Soldier
                sites:
                  - { member: weapon, requests: IWeapon, by_interface: true, id: primary }
                  - { member: spares, requests: IWeapon, by_interface: true, collection: true, suppress: true }
"#;

    #[test]
    fn builds_structure_and_types() {
        let host = MemoryHost::from_manifest(&Manifest::from_yaml(SCENE).unwrap()).unwrap();
        let level = host.find_node("Level").unwrap();
        let soldier = host.find_node("Soldier").unwrap();
        assert_eq!(host.children(level).len(), 2);
        assert!(host.is_instance_root(soldier));
        assert_eq!(host.node_tag(host.find_node("Armory").unwrap()), Some("Storage"));
        assert_eq!(host.type_kind(&TypeName::new("Soldier")), Some(TypeKind::Component));
        assert!(host.is_assignable(&TypeName::new("Rifle"), &TypeName::new("IWeapon")));
    }

    #[test]
    fn builds_sites_and_bindings() {
        let host = MemoryHost::from_manifest(&Manifest::from_yaml(SCENE).unwrap()).unwrap();
        let soldier = host.find_node("Soldier").unwrap();
        let unit = host.units(soldier)[0];
        let sites = host.sites(unit);
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].declaring_type.as_str(), "Soldier");
        assert_eq!(sites[0].id.as_deref(), Some("primary"));
        assert_eq!(sites[1].cardinality, Cardinality::Collection);
        assert!(sites[1].suppress_on_missing);

        let scope = host.scope_of(host.find_node("Level").unwrap()).unwrap();
        let bindings = host.declare_bindings(scope);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].locator_count(), 1);
        assert!(bindings[1].is_global());
    }

    #[test]
    fn unknown_node_reference_fails() {
        let yaml = SCENE.replace("node: Armory", "node: Nowhere");
        let err = MemoryHost::from_manifest(&Manifest::from_yaml(&yaml).unwrap()).unwrap_err();
        assert!(err.to_string().contains("[SW-003]"));
        assert!(err.to_string().contains("Nowhere"));
    }

    #[test]
    fn duplicate_node_names_fail() {
        let yaml = SCENE.replace("name: Armory", "name: Soldier");
        let err = MemoryHost::from_manifest(&Manifest::from_yaml(&yaml).unwrap()).unwrap_err();
        assert!(err.to_string().contains("[SW-004]"));
    }

    #[test]
    fn invalid_pattern_fails() {
        let yaml = SCENE.replace("locate: { asset_path: Data/settings.asset }", "where: { name_matches: \"[\" }\n              locate: { all_assets: true }");
        let err = MemoryHost::from_manifest(&Manifest::from_yaml(&yaml).unwrap()).unwrap_err();
        assert!(err.to_string().contains("[SW-005]"));
    }
}
