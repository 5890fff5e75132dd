//! Request handlers, one module per resource.

pub mod artifacts;
pub mod batches;
pub mod challenge;
pub mod submissions;
