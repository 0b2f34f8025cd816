//! Interactive shell front end for tidesh
//!
//! The REPL is a consumer of the completion engine, not part of it:
//!
//! - `engine`  : `ReplEngine`, the interactive loop and line editor
//! - `helper`  : rustyline glue turning engine candidates into editor
//!   suggestions
//!
//! Commands are executed through the host shell; the `complete` builtin is
//! intercepted and applied to the engine's registry directly.

mod engine;
mod helper;

pub use engine::ReplEngine;
pub use helper::ReplHelper;
