//! Binding values and their fluent builder
//!
//! ```rust,ignore
//! let binding = Binding::bind("IWeapon", "Rifle")
//!     .from_descendants()
//!     .with_id("primary")
//!     .to_target("Soldier")
//!     .build();
//! ```
//!
//! A built [`Binding`] is immutable. Per-pass state (usage, validity) lives in
//! the [`super::BindingRegistry`] entry that owns it.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use smallvec::SmallVec;

use crate::locate::{AssetQuery, CandidateFilter, ChildPick, Direction, Factory, Locator, ObjectInfo, Origin};
use crate::model::{Cardinality, NodeId, ObjectRef, TypeName};

/// Whether a binding hands out behavior units or assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingKind {
    #[default]
    Component,
    Asset,
}

/// Id / target-type / member-name qualifiers (empty set = wildcard)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifiers {
    pub ids: SmallVec<[Arc<str>; 2]>,
    pub targets: SmallVec<[TypeName; 2]>,
    pub members: SmallVec<[Arc<str>; 2]>,
}

/// Precedence of a binding within its scope, compared lexicographically
///
/// An id qualifier outranks any number of other qualifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    pub by_id: bool,
    /// Non-wildcard target and member sets
    pub others: u8,
}

impl Qualifiers {
    pub fn specificity(&self) -> Specificity {
        Specificity {
            by_id: !self.ids.is_empty(),
            others: u8::from(!self.targets.is_empty()) + u8::from(!self.members.is_empty()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    concrete: Option<TypeName>,
    interface: Option<TypeName>,
    kind: BindingKind,
    cardinality: Cardinality,
    locators: SmallVec<[Locator; 1]>,
    qualifiers: Qualifiers,
    filters: Vec<CandidateFilter>,
    target_filters: Vec<CandidateFilter>,
    global: bool,
    proxy: bool,
}

impl Binding {
    /// Component binding by concrete type
    pub fn component(concrete: &str) -> BindingBuilder {
        BindingBuilder::new(BindingKind::Component, Some(concrete), None)
    }

    /// Component binding of `concrete`, requested through `interface`
    pub fn bind(interface: &str, concrete: &str) -> BindingBuilder {
        BindingBuilder::new(BindingKind::Component, Some(concrete), Some(interface))
    }

    /// Component binding by interface only (any implementor)
    pub fn interface(interface: &str) -> BindingBuilder {
        BindingBuilder::new(BindingKind::Component, None, Some(interface))
    }

    pub fn asset(concrete: &str) -> BindingBuilder {
        BindingBuilder::new(BindingKind::Asset, Some(concrete), None)
    }

    pub fn asset_bind(interface: &str, concrete: &str) -> BindingBuilder {
        BindingBuilder::new(BindingKind::Asset, Some(concrete), Some(interface))
    }

    pub fn asset_interface(interface: &str) -> BindingBuilder {
        BindingBuilder::new(BindingKind::Asset, None, Some(interface))
    }

    pub fn concrete(&self) -> Option<&TypeName> {
        self.concrete.as_ref()
    }

    pub fn interface_type(&self) -> Option<&TypeName> {
        self.interface.as_ref()
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_collection(&self) -> bool {
        self.cardinality == Cardinality::Collection
    }

    /// The configured locator, when exactly one is configured
    pub fn locator(&self) -> Option<&Locator> {
        match self.locators.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn locator_count(&self) -> usize {
        self.locators.len()
    }

    pub fn qualifiers(&self) -> &Qualifiers {
        &self.qualifiers
    }

    pub fn filters(&self) -> &[CandidateFilter] {
        &self.filters
    }

    pub fn target_filters(&self) -> &[CandidateFilter] {
        &self.target_filters
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn is_proxy(&self) -> bool {
        self.proxy
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            BindingKind::Component => "Bind",
            BindingKind::Asset => "BindAsset",
        };
        match (&self.interface, &self.concrete) {
            (Some(i), Some(c)) => write!(f, "{verb}<{i}, {c}>")?,
            (Some(i), None) => write!(f, "{verb}<{i}>")?,
            (None, Some(c)) => write!(f, "{verb}<{c}>")?,
            (None, None) => write!(f, "{verb}<?>")?,
        }
        if self.is_collection() {
            f.write_str("[]")?;
        }
        if !self.qualifiers.ids.is_empty() {
            write!(f, " id={}", self.qualifiers.ids.join("|"))?;
        }
        if !self.qualifiers.targets.is_empty() {
            let targets: Vec<&str> = self.qualifiers.targets.iter().map(TypeName::as_str).collect();
            write!(f, " target={}", targets.join("|"))?;
        }
        if !self.qualifiers.members.is_empty() {
            write!(f, " member={}", self.qualifiers.members.join("|"))?;
        }
        if self.global {
            f.write_str(" global")?;
        }
        if self.proxy {
            f.write_str(" proxy")?;
        }
        Ok(())
    }
}

/// Fluent builder producing an immutable [`Binding`]
#[derive(Debug, Clone)]
#[must_use]
pub struct BindingBuilder {
    binding: Binding,
}

impl BindingBuilder {
    fn new(kind: BindingKind, concrete: Option<&str>, interface: Option<&str>) -> Self {
        Self {
            binding: Binding {
                concrete: concrete.map(TypeName::new),
                interface: interface.map(TypeName::new),
                kind,
                cardinality: Cardinality::Single,
                locators: SmallVec::new(),
                qualifiers: Qualifiers::default(),
                filters: Vec::new(),
                target_filters: Vec::new(),
                global: false,
                proxy: false,
            },
        }
    }

    pub fn build(self) -> Binding {
        self.binding
    }

    pub fn collection(mut self) -> Self {
        self.binding.cardinality = Cardinality::Collection;
        self
    }

    pub fn global(mut self) -> Self {
        self.binding.global = true;
        self
    }

    pub fn proxy(mut self) -> Self {
        self.binding.proxy = true;
        self
    }

    // ─────────────────────────────────────────────────────────────
    // Locators (exactly one must be configured)
    // ─────────────────────────────────────────────────────────────

    pub fn with_locator(mut self, locator: Locator) -> Self {
        self.binding.locators.push(locator);
        self
    }

    pub fn locate(self, origin: Origin, direction: Direction) -> Self {
        self.with_locator(Locator::Search { origin, direction })
    }

    pub fn from_self(self) -> Self {
        self.locate(Origin::ScopeNode, Direction::Itself)
    }

    pub fn from_parent(self) -> Self {
        self.locate(Origin::ScopeNode, Direction::Parent)
    }

    pub fn from_ancestors(self) -> Self {
        self.locate(Origin::ScopeNode, Direction::Ancestors { include_self: false })
    }

    /// Scope node and everything below it
    pub fn from_descendants(self) -> Self {
        self.locate(Origin::ScopeNode, Direction::Descendants { include_self: true })
    }

    pub fn from_root_descendants(self) -> Self {
        self.locate(Origin::ScopeRoot, Direction::Descendants { include_self: true })
    }

    pub fn from_siblings(self) -> Self {
        self.locate(Origin::ScopeNode, Direction::Siblings)
    }

    pub fn from_scope_child(self, pick: ChildPick) -> Self {
        self.locate(Origin::ScopeChild(pick), Direction::Itself)
    }

    /// The requesting site's own node
    pub fn from_site_node(self) -> Self {
        self.locate(Origin::SiteNode, Direction::Itself)
    }

    pub fn from_node(self, node: NodeId, direction: Direction) -> Self {
        self.locate(Origin::External(node), direction)
    }

    pub fn anywhere(self) -> Self {
        self.locate(Origin::ScopeNode, Direction::Anywhere)
    }

    pub fn from_instance(self, object: ObjectRef) -> Self {
        self.with_locator(Locator::Instances(vec![object]))
    }

    pub fn from_instances(self, objects: Vec<ObjectRef>) -> Self {
        self.with_locator(Locator::Instances(objects))
    }

    pub fn from_factory(self, factory: Factory) -> Self {
        self.with_locator(Locator::Factory(factory))
    }

    pub fn from_asset_path(self, path: &str) -> Self {
        self.with_locator(Locator::Assets(AssetQuery::Path(path.to_string())))
    }

    pub fn from_asset_folder(self, folder: &str) -> Self {
        self.with_locator(Locator::Assets(AssetQuery::Folder(folder.to_string())))
    }

    pub fn from_all_assets(self) -> Self {
        self.with_locator(Locator::Assets(AssetQuery::All))
    }

    // ─────────────────────────────────────────────────────────────
    // Qualifiers
    // ─────────────────────────────────────────────────────────────

    pub fn with_id(mut self, id: &str) -> Self {
        self.binding.qualifiers.ids.push(Arc::from(id));
        self
    }

    /// Only sites declared on `declaring_type`
    pub fn to_target(mut self, declaring_type: &str) -> Self {
        self.binding.qualifiers.targets.push(TypeName::new(declaring_type));
        self
    }

    pub fn to_member(mut self, member: &str) -> Self {
        self.binding.qualifiers.members.push(Arc::from(member));
        self
    }

    // ─────────────────────────────────────────────────────────────
    // Candidate + target filters
    // ─────────────────────────────────────────────────────────────

    pub fn where_filter(mut self, filter: CandidateFilter) -> Self {
        self.binding.filters.push(filter);
        self
    }

    pub fn where_name(self, name: &str) -> Self {
        self.where_filter(CandidateFilter::Name(name.to_string()))
    }

    pub fn where_name_matches(self, pattern: Regex) -> Self {
        self.where_filter(CandidateFilter::NameMatches(pattern))
    }

    pub fn where_tag(self, tag: &str) -> Self {
        self.where_filter(CandidateFilter::Tag(tag.to_string()))
    }

    pub fn where_active(self, active: bool) -> Self {
        self.where_filter(CandidateFilter::Active(active))
    }

    pub fn where_custom<F>(self, predicate: F) -> Self
    where
        F: Fn(&ObjectInfo<'_>) -> bool + Send + Sync + 'static,
    {
        self.where_filter(CandidateFilter::custom(predicate))
    }

    /// Requesting unit must satisfy `filter` or the lookup is suppressed
    pub fn when_target(mut self, filter: CandidateFilter) -> Self {
        self.binding.target_filters.push(filter);
        self
    }
}
