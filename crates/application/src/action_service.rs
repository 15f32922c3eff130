//! Quota-gated roast and deploy actions.

mod ports;
mod service;


pub use ports::{ActionGenerator, ActionKind, ActionRequest, SubjectResolver};
pub use service::{ActionOutcome, ActionService};
