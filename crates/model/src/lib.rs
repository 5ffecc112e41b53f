//! An abstraction layer for streaming model endpoints.
//!
//! This crate establishes the protocol the turn engine speaks with a model
//! provider: a request carrying the whole transcript, the instructions and
//! the tool schema, and a response that is pulled record by record while
//! the provider decodes its wire format.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to. Reassembling the
//! records into text and tool calls is the job of the consumer.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
