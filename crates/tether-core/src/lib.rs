//! Conversation orchestration for Tether.
//!
//! The [`Orchestrator`] drives one exchange at a time: it submits the
//! conversation to a model backend, dispatches any requested tools through a
//! shared [`tether_mcp::ToolRegistry`], folds the results back in and repeats
//! until the model answers in plain text.

mod orchestrator;

pub use orchestrator::{AgentEvent, DEFAULT_MAX_TURNS, Orchestrator};
