//! AST Module - YAML manifests describing a host scene
//!
//! Contains parsed Rust types for manifests and the loader that turns them
//! into a [`crate::host::MemoryHost`]:
//! - `manifest`: Manifest, NodeSpec, BindingSpec, LocateSpec, SiteSpec
//! - `loader`: `MemoryHost::from_manifest`
//!
//! These types represent the "what" - static scene structure parsed from YAML.
//! For pass execution, see the `runtime` module.

mod loader;
mod manifest;

pub use manifest::{
    AssetSpec, BindingSpec, ContainerSpec, DirectionSpec, FilterSpec, InstanceSpec, KindSpec, LocateSpec, Manifest,
    NodeSpec, OriginSpec, ScopeSpec, SearchSpec, SessionSpec, SiteSpec, TemplateSpec, TypesSpec, UnitSpec, SCHEMA_V01,
};
