//! Runtime Module - pass orchestration
//!
//! Contains the injection orchestrator:
//! - `pass`: pass state machine, tree walk, global and site resolution
//!
//! This module represents the "how" - one resolution run over a host.
//! For the declared rules, see the `binding` module.

mod pass;

pub use pass::{run_pass, validate_bindings, Pass, PassState, PassTarget};
