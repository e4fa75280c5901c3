//! Binding validation
//!
//! Every rule runs independently and every failure is collected. A binding
//! that fails any rule is invalidated for the rest of the pass. Duplicate
//! globals are checked last, among the bindings that survived.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{Binding, BindingId, BindingKind, BindingRegistry};
use crate::host::{StructureTree, TypeCatalog};
use crate::model::{TypeKind, TypeName, UnitId};
use crate::partition::classify;
use crate::report::{InvalidReason, PassError};

/// Validate every registered binding, invalidating the failures
pub fn validate<H>(registry: &mut BindingRegistry, host: &H) -> Vec<PassError>
where
    H: StructureTree + TypeCatalog,
{
    let mut errors = Vec::new();
    let ids: Vec<BindingId> = registry.ids().collect();

    for id in &ids {
        let reasons = check_binding(host, registry.get(*id), registry.scope_of(*id));
        if reasons.is_empty() {
            continue;
        }
        debug!(binding = %registry.get(*id), count = reasons.len(), "binding invalid");
        let binding = registry.binding_ref(*id);
        errors.extend(reasons.into_iter().map(|reason| PassError::InvalidBinding {
            binding: binding.clone(),
            reason,
        }));
        registry.invalidate(*id);
    }

    let mut first_global: FxHashMap<TypeName, BindingId> = FxHashMap::default();
    for id in ids {
        if !registry.is_valid(id) || !registry.get(id).is_global() {
            continue;
        }
        let Some(concrete) = registry.get(id).concrete().cloned() else {
            continue;
        };
        match first_global.get(&concrete) {
            Some(first) => {
                errors.push(PassError::DuplicateGlobalBinding {
                    binding: registry.binding_ref(id),
                    first: registry.binding_ref(*first),
                    concrete,
                });
                registry.invalidate(id);
            }
            None => {
                first_global.insert(concrete, id);
            }
        }
    }

    errors
}

/// Structural rules for one binding
pub fn check_binding<H>(host: &H, binding: &Binding, scope: UnitId) -> Vec<InvalidReason>
where
    H: StructureTree + TypeCatalog,
{
    let mut reasons = Vec::new();

    let concrete = binding.concrete().filter(|ty| known(host, ty, &mut reasons));
    let interface = binding.interface_type().filter(|ty| known(host, ty, &mut reasons));

    if let (Some(concrete), Some(interface)) = (concrete, interface) {
        if !host.is_assignable(concrete, interface) {
            reasons.push(InvalidReason::NotAssignable {
                concrete: concrete.clone(),
                interface: interface.clone(),
            });
        }
    }

    if let Some(interface) = interface {
        if host.type_kind(interface) != Some(TypeKind::Interface) {
            reasons.push(InvalidReason::NotAnInterface(interface.clone()));
        }
    }

    if let Some(concrete) = concrete {
        let is_component = host.type_kind(concrete) == Some(TypeKind::Component);
        match binding.kind() {
            BindingKind::Component if !is_component => {
                reasons.push(InvalidReason::NotAComponent(concrete.clone()));
            }
            BindingKind::Asset if is_component => {
                reasons.push(InvalidReason::ComponentAsAsset(concrete.clone()));
            }
            _ => {}
        }
    }

    if binding.is_proxy() {
        if binding.kind() != BindingKind::Component {
            reasons.push(InvalidReason::ProxyNotComponent);
        }
        if binding.concrete().is_none() || binding.interface_type().is_none() {
            reasons.push(InvalidReason::ProxyIncompleteTypes);
        }
        if binding.is_collection() {
            reasons.push(InvalidReason::ProxyCollection);
        }
        if binding.is_global() {
            reasons.push(InvalidReason::ProxyGlobal);
        }
    }

    if binding.is_global() {
        if binding.is_collection() {
            reasons.push(InvalidReason::GlobalCollection);
        }
        if !binding.qualifiers().ids.is_empty() {
            reasons.push(InvalidReason::GlobalWithId);
        }
        if binding.concrete().is_none() {
            reasons.push(InvalidReason::GlobalWithoutConcrete);
        }
        if classify(host, scope.into()).is_template() {
            reasons.push(InvalidReason::GlobalInTemplate);
        }
    }

    if binding.locator_count() != 1 {
        reasons.push(InvalidReason::LocatorCount(binding.locator_count()));
    }

    reasons
}

fn known<H: TypeCatalog>(host: &H, ty: &TypeName, reasons: &mut Vec<InvalidReason>) -> bool {
    if host.type_kind(ty).is_some() {
        return true;
    }
    reasons.push(InvalidReason::UnknownType(ty.clone()));
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use pretty_assertions::assert_eq;

    fn host() -> (MemoryHost, UnitId, UnitId) {
        let mut host = MemoryHost::new();
        host.declare_interface("IFoo");
        host.declare_component("Foo", &["IFoo"]);
        host.declare_component("Other", &[]);
        host.declare_asset_type("Settings", &[]);
        let scene = host.add_container("Main");
        let root = host.add_root(scene, "Root");
        let live = host.add_scope(root, "Scope", Vec::new());
        let enemy = host.add_root(scene, "Enemy");
        host.mark_instance_root(enemy);
        let templated = host.add_scope(enemy, "Scope", Vec::new());
        (host, live, templated)
    }

    #[test]
    fn well_formed_bindings_pass() {
        let (host, live, _) = host();
        for binding in [
            Binding::bind("IFoo", "Foo").from_self().build(),
            Binding::interface("IFoo").from_descendants().collection().build(),
            Binding::asset("Settings").from_all_assets().global().build(),
            Binding::bind("IFoo", "Foo").from_self().proxy().build(),
        ] {
            assert_eq!(check_binding(&host, &binding, live), Vec::new(), "{binding}");
        }
    }

    #[test]
    fn type_rules_collect_independently() {
        let (host, live, _) = host();
        let binding = Binding::bind("Foo", "Other").build();
        assert_eq!(
            check_binding(&host, &binding, live),
            vec![
                InvalidReason::NotAssignable {
                    concrete: TypeName::new("Other"),
                    interface: TypeName::new("Foo"),
                },
                InvalidReason::NotAnInterface(TypeName::new("Foo")),
                InvalidReason::LocatorCount(0),
            ]
        );
    }

    #[test]
    fn kind_mismatches() {
        let (host, live, _) = host();
        let settings_as_component = Binding::component("Settings").from_self().build();
        assert_eq!(
            check_binding(&host, &settings_as_component, live),
            vec![InvalidReason::NotAComponent(TypeName::new("Settings"))]
        );
        let component_as_asset = Binding::asset("Foo").from_all_assets().build();
        assert_eq!(
            check_binding(&host, &component_as_asset, live),
            vec![InvalidReason::ComponentAsAsset(TypeName::new("Foo"))]
        );
    }

    #[test]
    fn interface_only_bindings_skip_kind_rule() {
        let (host, live, _) = host();
        for binding in [
            Binding::interface("IFoo").from_descendants().build(),
            Binding::asset_interface("IFoo").from_all_assets().build(),
        ] {
            assert_eq!(check_binding(&host, &binding, live), Vec::new(), "{binding}");
        }
    }

    #[test]
    fn unknown_types_are_reported() {
        let (host, live, _) = host();
        let binding = Binding::component("Ghost").from_self().build();
        assert_eq!(
            check_binding(&host, &binding, live),
            vec![InvalidReason::UnknownType(TypeName::new("Ghost"))]
        );
    }

    #[test]
    fn proxy_and_global_constraints() {
        let (host, live, templated) = host();
        let proxy = Binding::component("Foo").collection().global().proxy().from_self().build();
        let reasons = check_binding(&host, &proxy, live);
        assert!(reasons.contains(&InvalidReason::ProxyIncompleteTypes));
        assert!(reasons.contains(&InvalidReason::ProxyCollection));
        assert!(reasons.contains(&InvalidReason::ProxyGlobal));
        assert!(reasons.contains(&InvalidReason::GlobalCollection));

        let global = Binding::component("Foo").with_id("a").global().from_self().build();
        assert_eq!(
            check_binding(&host, &global, templated),
            vec![InvalidReason::GlobalWithId, InvalidReason::GlobalInTemplate]
        );
    }

    #[test]
    fn duplicate_globals_first_wins() {
        let (host, live, _) = host();
        let mut registry = BindingRegistry::new();
        let first = registry.register(live, Binding::component("Foo").global().from_self().build());
        let second = registry.register(live, Binding::component("Foo").global().from_parent().build());
        let broken = registry.register(live, Binding::component("Foo").global().build());

        let errors = validate(&mut registry, &host);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code(), "SW-100");
        assert!(matches!(
            &errors[1],
            PassError::DuplicateGlobalBinding { binding, first: f, .. }
                if binding.index == 1 && f.index == 0
        ));
        assert!(registry.is_valid(first));
        assert!(!registry.is_valid(second));
        assert!(!registry.is_valid(broken));
        assert_eq!(registry.valid_globals(), vec![first]);
    }
}
