//! Per-contact activity execution: extract the configured arguments from
//! the journey payload, resolve bindings, personalize the message and hand
//! the result to the push client.

pub mod execute;

pub use execute::{execute, resolve_activity, ExecuteResponse, ResolvedActivity};
