//! An out-of-the-box coding assistant that assembles the built-in tools,
//! memory-backed instructions and the Responses API provider.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring agent functionality into your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod session;
pub mod tools;

pub use session::{Session, SessionBuilder};

/// Re-exports of [`omo_core`] crate.
pub mod core {
    pub use omo_core::*;
}
