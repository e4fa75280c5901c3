//! Qualifier Matcher
//!
//! Pure predicates over one binding and one site descriptor. Checks run in a
//! fixed order; the first failing one is reported.

use super::Binding;
use crate::model::InjectionSite;

/// First check a binding failed against a site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    Cardinality,
    Type,
    Target,
    Member,
    Id,
}

pub fn check(binding: &Binding, site: &InjectionSite) -> Result<(), Mismatch> {
    if binding.cardinality() != site.cardinality {
        return Err(Mismatch::Cardinality);
    }

    let declared = if site.by_interface {
        binding.interface_type()
    } else {
        binding.concrete()
    };
    if declared != Some(&site.requested) {
        return Err(Mismatch::Type);
    }

    let qualifiers = binding.qualifiers();
    if !qualifiers.targets.is_empty() && !qualifiers.targets.contains(&site.declaring_type) {
        return Err(Mismatch::Target);
    }
    if !qualifiers.members.is_empty() && !qualifiers.members.contains(&site.member) {
        return Err(Mismatch::Member);
    }
    if !qualifiers.ids.is_empty() {
        match &site.id {
            Some(id) if qualifiers.ids.contains(id) => {}
            _ => return Err(Mismatch::Id),
        }
    }
    Ok(())
}

#[inline]
pub fn matches(binding: &Binding, site: &InjectionSite) -> bool {
    check(binding, site).is_ok()
}
