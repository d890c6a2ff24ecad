//! Switchyard - rate-aware multi-provider router for hosted LLM APIs
//!
//! Callers hand the [`router::Router`] a provider-agnostic
//! [`generation::GenerationRequest`]. The router picks a provider round-robin,
//! skips providers over their per-minute budget, and fails over until one
//! succeeds or every enabled provider has been tried once.

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod providers;
pub mod registry;
pub mod router;
pub mod telemetry;
