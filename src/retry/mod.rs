//! Retry module
//! - policy.rs: stage-tagged retries with capped exponential backoff

pub mod policy;

pub use policy::*;
