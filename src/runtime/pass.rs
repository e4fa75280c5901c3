//! Injection pass - one synchronous resolution run over one root
//!
//! ```text
//! BuildingTree ─► Validating ─► ResolvingGlobals ─► WalkingTree ─► Reporting ─► Done
//!                                      │
//!                                      └─► Aborted (stand-in generation pending)
//! ```
//!
//! All pass state (scope tree, registry, usage flags) is owned by [`Pass`] and
//! dropped when it finishes.
//!
//! A template pass over an instance placed in a live container also collects
//! the live scopes enclosing the instance, so scopes inside it chain past the
//! instance boundary. Enclosing bindings take part in matching (isolation and
//! proxies decide what resolves) but are reported by the container's own pass. Site writes happen one site at a time, only after
//! that site fully resolved.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, instrument, trace};

use crate::binding::{validate, BindingId, BindingRegistry};
use crate::config::PassConfig;
use crate::error::{Result, WireError};
use crate::host::Host;
use crate::locate::{isolation, locate, target_accepts, LocateRequest};
use crate::model::{AssetId, Cardinality, ContainerId, Injected, InjectionSite, NodeId, ObjectRef, TypeName, UnitId};
use crate::proxy::{ensure_stand_ins, StandInStatus};
use crate::report::{GlobalEntry, PassError, PassOutcome, PassResult, SiteRef};
use crate::scope::{ScopeChain, ScopeTree};

/// What a pass runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    /// Whole live container; template-instance subtrees are pruned
    Container(ContainerId),
    /// One template instance, template asset or editing session subtree
    Template(NodeId),
}

impl PassTarget {
    pub fn is_template(&self) -> bool {
        matches!(self, PassTarget::Template(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    BuildingTree,
    Validating,
    ResolvingGlobals,
    WalkingTree,
    Reporting,
    Done,
    Aborted,
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PassState::BuildingTree => "building_tree",
            PassState::Validating => "validating",
            PassState::ResolvingGlobals => "resolving_globals",
            PassState::WalkingTree => "walking_tree",
            PassState::Reporting => "reporting",
            PassState::Done => "done",
            PassState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// A unit reached by the walk, with the scope active at its node
#[derive(Debug, Clone, Copy)]
struct Visit {
    unit: UnitId,
    scope: Option<UnitId>,
}

/// Run one injection pass
#[instrument(skip_all, fields(target = ?target))]
pub fn run_pass<H: Host>(host: &mut H, target: PassTarget, config: &PassConfig) -> Result<PassOutcome> {
    let mut pass = Pass::new(host, target, config)?;
    pass.build_tree();
    pass.validate();
    if let Some(types) = pass.resolve_globals()? {
        return Ok(PassOutcome::GenerationPending { types });
    }
    pass.walk_tree();
    Ok(PassOutcome::Completed(pass.report()))
}

/// Build the scope tree and validate bindings, without resolving anything
pub fn validate_bindings<H: Host>(host: &mut H, target: PassTarget) -> Result<Vec<PassError>> {
    let config = PassConfig::default();
    let mut pass = Pass::new(host, target, &config)?;
    pass.build_tree();
    pass.validate();
    Ok(pass.result.errors)
}

pub struct Pass<'a, H: Host> {
    host: &'a mut H,
    target: PassTarget,
    config: &'a PassConfig,
    state: PassState,
    tree: ScopeTree,
    /// Scopes above a template root, collected for chaining only
    enclosing: FxHashSet<UnitId>,
    registry: BindingRegistry,
    visits: Vec<Visit>,
    stand_ins: FxHashMap<TypeName, AssetId>,
    result: PassResult,
}

impl<'a, H: Host> Pass<'a, H> {
    pub fn new(host: &'a mut H, target: PassTarget, config: &'a PassConfig) -> Result<Self> {
        match target {
            PassTarget::Container(container) => {
                if !host.containers().contains(&container) {
                    return Err(WireError::UnknownPassRoot {
                        root: container.to_string(),
                    });
                }
            }
            PassTarget::Template(node) => {
                if !host.contains_node(node) {
                    return Err(WireError::UnknownPassRoot { root: node.to_string() });
                }
                if !host.is_partition_root(node) {
                    return Err(WireError::NotATemplateRoot {
                        root: host.node_name(node).to_string(),
                    });
                }
            }
        }

        Ok(Self {
            host,
            target,
            config,
            state: PassState::BuildingTree,
            tree: ScopeTree::default(),
            enclosing: FxHashSet::default(),
            registry: BindingRegistry::new(),
            visits: Vec::new(),
            stand_ins: FxHashMap::default(),
            result: PassResult::default(),
        })
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    fn enter(&mut self, next: PassState) {
        debug!(from = %self.state, to = %next, "pass state");
        self.state = next;
    }

    // ═══════════════════════════════════════════
    // BUILDING TREE
    // ═══════════════════════════════════════════

    pub fn build_tree(&mut self) {
        let roots: Vec<NodeId> = match self.target {
            PassTarget::Container(container) => self.host.container_roots(container).to_vec(),
            PassTarget::Template(node) => vec![node],
        };

        let mut scopes = Vec::new();
        let mut stack: Vec<(NodeId, Option<UnitId>)> = roots.into_iter().rev().map(|n| (n, None)).collect();
        while let Some((node, inherited)) = stack.pop() {
            if self.prunes(node) {
                trace!(node = %node, "pruned template instance");
                continue;
            }
            let own = self.host.scope_of(node);
            if let Some(scope) = own {
                scopes.push(scope);
            }
            let active = own.or(inherited);
            self.visits.extend(
                self.host
                    .units(node)
                    .iter()
                    .map(|unit| Visit { unit: *unit, scope: active }),
            );
            stack.extend(self.host.children(node).iter().rev().map(|child| (*child, active)));
        }

        if let PassTarget::Template(root) = self.target {
            let enclosing = self.enclosing_scopes(root);
            self.enclosing = enclosing.iter().copied().collect();
            scopes = enclosing.into_iter().chain(scopes).collect();
        }

        self.tree = ScopeTree::build(&*self.host, &scopes);
        for scope in self.tree.scopes().to_vec() {
            for binding in self.host.declare_bindings(scope) {
                self.registry.register(scope, binding);
            }
        }
        debug!(
            scopes = self.tree.len(),
            bindings = self.registry.len(),
            units = self.visits.len(),
            "scope tree built"
        );
    }

    /// Scopes on non-partition-root ancestors of `root`, outermost first
    fn enclosing_scopes(&self, root: NodeId) -> Vec<UnitId> {
        let mut found = Vec::new();
        let mut current = self.host.parent(root);
        while let Some(node) = current {
            if !self.host.is_partition_root(node) {
                if let Some(scope) = self.host.scope_of(node) {
                    found.push(scope);
                }
            }
            current = self.host.parent(node);
        }
        found.reverse();
        found
    }

    fn is_enclosing(&self, scope: UnitId) -> bool {
        self.enclosing.contains(&scope)
    }

    fn prunes(&self, node: NodeId) -> bool {
        matches!(self.target, PassTarget::Container(_)) && self.host.is_instance_root(node)
    }

    // ═══════════════════════════════════════════
    // VALIDATING
    // ═══════════════════════════════════════════

    pub fn validate(&mut self) {
        self.enter(PassState::Validating);
        let errors = validate(&mut self.registry, &*self.host);
        let own: Vec<PassError> = errors
            .into_iter()
            .filter(|error| match error {
                PassError::InvalidBinding { binding, .. } | PassError::DuplicateGlobalBinding { binding, .. } => {
                    !self.is_enclosing(binding.scope)
                }
                _ => true,
            })
            .collect();
        self.result.errors.extend(own);
    }

    // ═══════════════════════════════════════════
    // RESOLVING GLOBALS
    // ═══════════════════════════════════════════

    /// Returns the pending types when stand-in generation aborts the pass
    pub fn resolve_globals(&mut self) -> Result<Option<Vec<TypeName>>> {
        self.enter(PassState::ResolvingGlobals);

        let proxied: Vec<TypeName> = self
            .registry
            .valid_proxies()
            .into_iter()
            .filter_map(|id| self.registry.get(id).concrete().cloned())
            .collect();
        match ensure_stand_ins(&mut *self.host, &proxied)? {
            StandInStatus::GenerationPending(types) => {
                self.enter(PassState::Aborted);
                info!(types = types.len(), "stand-in generation pending, pass aborted");
                return Ok(Some(types));
            }
            StandInStatus::Ready(stand_ins) => {
                self.result.stats.stand_ins = stand_ins.len();
                self.stand_ins = stand_ins;
            }
        }

        if self.target.is_template() {
            return Ok(None);
        }
        for id in self.registry.valid_globals() {
            self.resolve_global(id);
        }
        Ok(None)
    }

    fn resolve_global(&mut self, id: BindingId) {
        let binding = self.registry.get(id);
        let scope = self.registry.scope_of(id);
        let located = locate(
            &*self.host,
            &LocateRequest {
                binding,
                scope,
                site: None,
            },
        );
        let filtered = isolation::filter(
            &*self.host,
            located.candidates,
            ObjectRef::Unit(scope),
            self.config.isolation,
        );

        let concrete = binding.concrete().cloned();
        match (filtered.kept.first(), concrete) {
            (Some(object), Some(concrete)) => {
                debug!(binding = %binding, object = %object, "global resolved");
                self.result.globals.push(GlobalEntry {
                    concrete,
                    object: *object,
                    binding: self.registry.binding_ref(id),
                });
                self.result.stats.globals += 1;
                self.registry.mark_used(id);
            }
            _ => {
                self.result.errors.push(PassError::MissingGlobalDependency {
                    binding: self.registry.binding_ref(id),
                    rejected_types: filtered.rejected_types,
                });
            }
        }
    }

    // ═══════════════════════════════════════════
    // WALKING TREE
    // ═══════════════════════════════════════════

    pub fn walk_tree(&mut self) {
        self.enter(PassState::WalkingTree);
        let visits = std::mem::take(&mut self.visits);

        for visit in visits {
            let chain = visit
                .scope
                .map(|scope| self.tree.chain(scope))
                .unwrap_or_default();
            for site in self.host.sites(visit.unit) {
                self.result.stats.sites += 1;
                match self.resolve_site(&site, &chain) {
                    Ok((id, value)) => {
                        trace!(site = %site.label(), value = ?value, "assigning");
                        self.host.assign(&site, value);
                        self.registry.mark_used(id);
                        self.result.stats.injected += 1;
                    }
                    Err(error) if site.suppress_on_missing => {
                        trace!(site = %site.label(), %error, "suppressed");
                        self.result.stats.suppressed += 1;
                    }
                    Err(error) => {
                        debug!(site = %site.label(), %error, "site unresolved");
                        self.result.errors.push(error);
                    }
                }
            }
        }
    }

    fn resolve_site(
        &self,
        site: &InjectionSite,
        chain: &ScopeChain,
    ) -> std::result::Result<(BindingId, Injected), PassError> {
        let site_ref = || SiteRef {
            unit: site.unit,
            label: site.label(),
        };

        let Some(id) = self.registry.find_binding(site, chain) else {
            return Err(PassError::MissingBinding {
                site: site_ref(),
                requested: site.requested.clone(),
                id: site.id.clone(),
            });
        };
        let binding = self.registry.get(id);

        if !target_accepts(&*self.host, binding, site) {
            return Err(PassError::MissingDependency {
                site: site_ref(),
                binding: self.registry.binding_ref(id),
                rejected_types: Vec::new(),
                target_rejected: true,
            });
        }

        let candidates = if binding.is_proxy() {
            binding
                .concrete()
                .and_then(|concrete| self.stand_ins.get(concrete))
                .map(|asset| vec![ObjectRef::Asset(*asset)])
                .unwrap_or_default()
        } else {
            locate(
                &*self.host,
                &LocateRequest {
                    binding,
                    scope: self.registry.scope_of(id),
                    site: Some(site),
                },
            )
            .candidates
        };

        let filtered = isolation::filter(
            &*self.host,
            candidates,
            ObjectRef::Unit(site.unit),
            self.config.isolation,
        );
        let value = match site.cardinality {
            Cardinality::Collection if !filtered.kept.is_empty() => Some(Injected::Collection(filtered.kept)),
            Cardinality::Collection => None,
            Cardinality::Single => filtered.kept.first().copied().map(Injected::Single),
        };

        value.map(|value| (id, value)).ok_or_else(|| PassError::MissingDependency {
            site: site_ref(),
            binding: self.registry.binding_ref(id),
            rejected_types: filtered.rejected_types,
            target_rejected: false,
        })
    }

    // ═══════════════════════════════════════════
    // REPORTING
    // ═══════════════════════════════════════════

    pub fn report(mut self) -> PassResult {
        self.enter(PassState::Reporting);
        if self.config.report_unused {
            let unused = self.registry.unused();
            self.result.warnings = unused
                .into_iter()
                .filter(|warning| !self.is_enclosing(warning.binding.scope))
                .collect();
        }

        let stats = &mut self.result.stats;
        stats.scopes = self.tree.len();
        stats.bindings = self.registry.len();
        stats.invalid_bindings = self.registry.invalid_count();

        if self.config.log_stats {
            info!(
                scopes = stats.scopes,
                bindings = stats.bindings,
                invalid = stats.invalid_bindings,
                sites = stats.sites,
                injected = stats.injected,
                suppressed = stats.suppressed,
                globals = stats.globals,
                errors = self.result.errors.len(),
                warnings = self.result.warnings.len(),
                "pass complete"
            );
        }
        self.enter(PassState::Done);
        self.result
    }
}
