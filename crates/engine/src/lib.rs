//! Engine crate – headless chained-calculator logic.
//!
//! Holds the expression-entry state machine, its display formatting and
//! key map, plus the session command registry used by every front-end. It
//! does not depend on any UI toolkit, so the same engine backs the CLI
//! harness and any graphical wrapper.

pub mod calculator;
pub mod commands;
pub mod context;
pub mod format;
pub mod keymap;
pub mod scenario;
pub mod types;

// Re-exports for convenience
pub use calculator::ExpressionEngine;
pub use commands::CommandRegistry;
pub use context::Session;
pub use keymap::{Action, KeyMap};
pub use types::{
    CommandResult, EngineOptions, EngineState, ErrorCode, ErrorInfo, Operator, PendingOperator,
    Status,
};
