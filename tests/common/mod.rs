//! Shared fixtures for integration tests

#![allow(dead_code)]

use scopewire::{
    run_pass, ContainerId, MemoryHost, PassConfig, PassOutcome, PassResult, PassTarget, TypeName,
};

/// Host with the usual test types and one live container
pub struct Scene {
    pub host: MemoryHost,
    pub main: ContainerId,
}

/// `IFoo` ← `Foo`, plus the site owners `Bar` and `Baz`
pub fn scene() -> Scene {
    let mut host = MemoryHost::new();
    host.declare_interface("IFoo");
    host.declare_component("Foo", &["IFoo"]);
    host.declare_component("Bar", &[]);
    host.declare_component("Baz", &[]);
    let main = host.add_container("Main");
    Scene { host, main }
}

pub fn run(host: &mut MemoryHost, target: PassTarget) -> PassOutcome {
    run_with(host, target, &PassConfig::default())
}

pub fn run_with(host: &mut MemoryHost, target: PassTarget, config: &PassConfig) -> PassOutcome {
    run_pass(host, target, config).expect("pass should start")
}

/// Run a pass that must complete
pub fn completed(host: &mut MemoryHost, target: PassTarget) -> PassResult {
    match run(host, target) {
        PassOutcome::Completed(result) => result,
        PassOutcome::GenerationPending { types } => panic!("unexpected generation pending: {types:?}"),
    }
}

pub fn codes(result: &PassResult) -> Vec<&'static str> {
    result.errors.iter().map(|e| e.code()).collect()
}

pub fn ty(name: &str) -> TypeName {
    TypeName::new(name)
}
