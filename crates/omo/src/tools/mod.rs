//! A set of built-in tools for working on a code base.

mod bash;
mod edit;
mod read;
mod write;

pub use bash::{BashTool, BashToolParameters};
pub use edit::{EditTool, EditToolParameters};
pub use read::{ReadTool, ReadToolParameters};
pub use write::{WriteTool, WriteToolParameters};
