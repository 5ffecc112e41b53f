//! Core logic of the conversation turn engine: the agent loop, tool-call
//! accumulation, tool dispatch, and instructions assembly.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod accumulator;
mod agent;
pub mod conversation;
mod error;
mod event;
pub mod instructions;
mod model_client;
pub mod tool;

pub use accumulator::{
    AccumulatedResponse, Accumulator, Folded, PendingToolCall, ToolCall,
};
pub use agent::{Agent, AgentBuilder, TurnStage};
pub use error::Error;
pub use event::AgentEvent;
