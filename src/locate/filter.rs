//! Candidate predicate filters
//!
//! A binding may carry any number of filters; a candidate survives only if
//! every filter accepts it (logical AND). The same filter type is reused for
//! *target* filters, which are evaluated against the requesting unit instead.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::host::{AssetStore, StructureTree, TypeCatalog};
use crate::model::{ObjectRef, TypeName};

/// Snapshot of the metadata filters can inspect
#[derive(Debug, Clone)]
pub struct ObjectInfo<'a> {
    pub object: ObjectRef,
    pub name: &'a str,
    pub tag: Option<&'a str>,
    pub active: bool,
    pub type_name: Option<TypeName>,
}

impl<'a> ObjectInfo<'a> {
    /// Gather metadata for an object from the host
    ///
    /// Units report their node's name, tag and active state.
    pub fn of<H>(host: &'a H, object: ObjectRef) -> Self
    where
        H: StructureTree + TypeCatalog + AssetStore,
    {
        let type_name = host.type_of(object);
        match object {
            ObjectRef::Node(node) => Self {
                object,
                name: host.node_name(node),
                tag: host.node_tag(node),
                active: host.is_active(node),
                type_name,
            },
            ObjectRef::Unit(unit) => {
                let node = host.node_of(unit);
                Self {
                    object,
                    name: host.node_name(node),
                    tag: host.node_tag(node),
                    active: host.is_active(node),
                    type_name,
                }
            }
            ObjectRef::Asset(asset) => Self {
                object,
                name: host.asset_name(asset),
                tag: None,
                active: true,
                type_name,
            },
        }
    }
}

pub type Predicate = Arc<dyn Fn(&ObjectInfo<'_>) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum CandidateFilter {
    /// Exact name match
    Name(String),
    NameMatches(Regex),
    Tag(String),
    /// Active state must equal the flag
    Active(bool),
    Custom(Predicate),
}

impl CandidateFilter {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&ObjectInfo<'_>) -> bool + Send + Sync + 'static,
    {
        CandidateFilter::Custom(Arc::new(predicate))
    }

    pub fn accepts(&self, info: &ObjectInfo<'_>) -> bool {
        match self {
            CandidateFilter::Name(name) => info.name == name,
            CandidateFilter::NameMatches(re) => re.is_match(info.name),
            CandidateFilter::Tag(tag) => info.tag == Some(tag.as_str()),
            CandidateFilter::Active(active) => info.active == *active,
            CandidateFilter::Custom(predicate) => predicate(info),
        }
    }
}

impl fmt::Debug for CandidateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateFilter::Name(name) => f.debug_tuple("Name").field(name).finish(),
            CandidateFilter::NameMatches(re) => f.debug_tuple("NameMatches").field(&re.as_str()).finish(),
            CandidateFilter::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            CandidateFilter::Active(active) => f.debug_tuple("Active").field(active).finish(),
            CandidateFilter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Whether every filter accepts the object
pub fn accepts_all(filters: &[CandidateFilter], info: &ObjectInfo<'_>) -> bool {
    filters.iter().all(|f| f.accepts(info))
}
