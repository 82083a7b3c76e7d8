//! Service layer
//!
//! Dispatch logic on top of the repositories:
//! - Service templates (FDL files rendered into API definitions)
//! - Service resolution (reuse or lazily create)
//! - The job dispatcher and its state machine

mod dispatcher;
#[cfg(test)]
pub(crate) mod fakes;
mod resolver;
pub mod template;

pub use dispatcher::{DispatchOutcome, JobDispatcher, wait_for_output};
pub use resolver::ServiceResolver;
