// HTTP middleware
pub mod canonical_host;

pub use canonical_host::*;
