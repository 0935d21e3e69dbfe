//! LLM collaborator: structured-output completions with token accounting.
//!
//! The pipeline talks to a `CompletionClient`; the default implementation is
//! an HTTP gateway speaking the Anthropic messages API. Structured-output
//! parse failures are retried here, inside the collaborator, so callers see
//! either a parsed JSON value or a final error.

pub mod client;
pub mod pricing;
pub mod types;

pub use client::{CompletionClient, GatewayClient, GatewayConfig, LlmError};
pub use pricing::{calculate_cost, price_for_model};
pub use types::{ChatMessage, Completion, Role, TokenUsage};
