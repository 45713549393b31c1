//! Agent layer - LLM-backed chat and formula assistance for the
//! spreadsheet taskpane.
//!
//! This crate holds the only decision logic in the system:
//! - **Response composition** (`composer`) - scan the user's raw message
//!   against an ordered keyword rule table and emit canned Office.js
//!   operation descriptors
//! - **Chat orchestration** (`service`) - one LLM call for the
//!   conversational reply, composed independently with the rule scan
//! - **Formula flows** (`formulas`) - generate / explain / optimize /
//!   diagnose, each a single prompt plus a line-prefix parser
//!
//! # Key Types
//!
//! - `ChatClient` - pluggable provider seam (see `llm` module)
//! - `AgentService` - chat entry point, never errors past the boundary
//! - `FormulaFlows` - the four single-shot formula operations
//!
//! # Safety Principle
//!
//! The LLM is strictly a text producer. Executable snippets are selected
//! deterministically from fixed templates keyed off the user's own
//! message; model output never becomes code.

pub mod composer;
pub mod formulas;
pub mod llm;
pub mod service;

pub use composer::compose;
pub use formulas::FormulaFlows;
pub use llm::{ChatClient, ChatMessage, CompletionOptions, Role};
pub use service::AgentService;
