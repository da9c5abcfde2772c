//! Capability traits implemented by model backends.

mod chat;

pub use chat::ChatCapability;
