//! Manifest Types - YAML description of a host scene
//!
//! ```yaml
//! schema: scopewire/manifest@0.1
//! types:
//!   interfaces: [IWeapon]
//!   components:
//!     Rifle: [IWeapon]
//! containers:
//!   - name: Main
//!     nodes:
//!       - name: Level
//!         scope:
//!           bindings:
//!             - bind: Rifle
//!               as: IWeapon
//!               locate:
//!                 search: { direction: descendants }
//!         children:
//!           - name: Soldier
//!             units:
//!               - type: Soldier
//!                 sites:
//!                   - { member: weapon, requests: IWeapon, by_interface: true }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, WireError};

/// Expected schema version for manifests
pub const SCHEMA_V01: &str = "scopewire/manifest@0.1";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub schema: String,
    #[serde(default)]
    pub types: TypesSpec,
    /// Concrete types whose stand-in implementation already exists
    #[serde(default)]
    pub implementations: Vec<String>,
    #[serde(default)]
    pub assets: Vec<AssetSpec>,
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
    #[serde(default)]
    pub templates: Vec<TemplateSpec>,
    #[serde(default)]
    pub sessions: Vec<SessionSpec>,
}

impl Manifest {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(content)?;
        if manifest.schema != SCHEMA_V01 {
            return Err(WireError::InvalidManifest {
                location: "schema".to_string(),
                reason: format!("expected '{}', found '{}'", SCHEMA_V01, manifest.schema),
            });
        }
        Ok(manifest)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| WireError::ManifestRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }
}

/// Type declarations; map values list supertypes
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypesSpec {
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub components: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub assets: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetSpec {
    pub path: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerSpec {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

/// Uninstantiated template asset
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSpec {
    pub root: NodeSpec,
}

/// Open template-editing session
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSpec {
    /// Root node name of the template being edited
    #[serde(default)]
    pub asset: Option<String>,
    pub root: NodeSpec,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    /// Unique across the manifest
    pub name: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Root of a template instance
    #[serde(default)]
    pub instance: bool,
    #[serde(default)]
    pub scope: Option<ScopeSpec>,
    #[serde(default)]
    pub units: Vec<UnitSpec>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

fn default_scope_type() -> String {
    "Scope".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeSpec {
    #[serde(rename = "type", default = "default_scope_type")]
    pub type_name: String,
    #[serde(default)]
    pub bindings: Vec<BindingSpec>,
    /// Sites declared by the scope unit itself
    #[serde(default)]
    pub sites: Vec<SiteSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitSpec {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub sites: Vec<SiteSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSpec {
    pub member: String,
    pub requests: String,
    /// Declaring type, defaults to the unit's type
    #[serde(default)]
    pub declaring: Option<String>,
    #[serde(default)]
    pub by_interface: bool,
    #[serde(default)]
    pub collection: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub suppress: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindSpec {
    #[default]
    Component,
    Asset,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingSpec {
    #[serde(default)]
    pub kind: KindSpec,
    /// Concrete type
    #[serde(default)]
    pub bind: Option<String>,
    /// Interface type
    #[serde(rename = "as", default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub collection: bool,
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub proxy: bool,
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub locate: LocateSpec,
    #[serde(rename = "where", default)]
    pub filters: FilterSpec,
    #[serde(default)]
    pub when_target: FilterSpec,
}

/// Every present field configures one locator
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocateSpec {
    #[serde(default)]
    pub search: Option<SearchSpec>,
    #[serde(default)]
    pub instances: Option<Vec<InstanceSpec>>,
    #[serde(default)]
    pub asset_path: Option<String>,
    #[serde(default)]
    pub asset_folder: Option<String>,
    #[serde(default)]
    pub all_assets: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginSpec {
    #[default]
    Scope,
    ScopeRoot,
    Site,
    FirstChild,
    LastChild,
    /// Scope child at `from_index`
    Child,
    /// Node named by `from_node`
    Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionSpec {
    #[serde(rename = "self")]
    Itself,
    Parent,
    Ancestors,
    Descendants,
    FirstChild,
    LastChild,
    /// Child at `index`
    Child,
    Siblings,
    Anywhere,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchSpec {
    #[serde(default)]
    pub from: OriginSpec,
    #[serde(default)]
    pub from_index: Option<usize>,
    #[serde(default)]
    pub from_node: Option<String>,
    pub direction: DirectionSpec,
    #[serde(default)]
    pub index: Option<usize>,
    /// Ancestors default to exclusive, descendants to inclusive
    #[serde(default)]
    pub include_self: Option<bool>,
}

/// Fixed instance: a unit of a node (by type) or an asset (by path)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceSpec {
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_matches: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_manifest() {
        let manifest = Manifest::from_yaml("schema: scopewire/manifest@0.1\n").unwrap();
        assert!(manifest.containers.is_empty());
        assert!(manifest.types.interfaces.is_empty());
    }

    #[test]
    fn rejects_wrong_schema() {
        let err = Manifest::from_yaml("schema: other@1\n").unwrap_err();
        assert!(err.to_string().contains("[SW-006]"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = Manifest::from_yaml("schema: scopewire/manifest@0.1\nbogus: 1\n").unwrap_err();
        assert!(err.to_string().contains("[SW-002]"));
    }

    #[test]
    fn parses_binding_fields() {
        let yaml = r#"
schema: scopewire/manifest@0.1
containers:
  - name: Main
    nodes:
      - name: Level
        scope:
          bindings:
            - bind: Rifle
              as: IWeapon
              ids: [primary]
              where: { tag: Armory }
              locate:
                search: { from: scope_root, direction: descendants, include_self: false }
"#;
        let manifest = Manifest::from_yaml(yaml).unwrap();
        let scope = manifest.containers[0].nodes[0].scope.as_ref().unwrap();
        assert_eq!(scope.type_name, "Scope");
        let binding = &scope.bindings[0];
        assert_eq!(binding.interface.as_deref(), Some("IWeapon"));
        assert_eq!(binding.filters.tag.as_deref(), Some("Armory"));
        let search = binding.locate.search.as_ref().unwrap();
        assert_eq!(search.from, OriginSpec::ScopeRoot);
        assert_eq!(search.direction, DirectionSpec::Descendants);
        assert_eq!(search.include_self, Some(false));
        assert!(manifest.containers[0].nodes[0].active);
    }
}
