//! Error Handling Module
//!
//! This module provides the single error type used across the crate:
//! - Core error type (`LlmError`) and its coarse `ErrorCategory`
//! - The exchange stage a failure belongs to (`ExchangeStage`)
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use toolrelay::error::{LlmError, ErrorCategory};
//!
//! let error = LlmError::api_error(404, "Not found");
//! assert_eq!(error.category(), ErrorCategory::Client);
//! assert!(!error.is_retryable());
//! ```

mod conversions;
pub mod types;

pub use types::*;
