//! Conversation state and the per-turn pipeline.
//!
//! `SessionContext` is the single mutable record behind multi-turn
//! continuation; `ContextResolver` reconciles a turn against it;
//! `DialogueCore` serializes turns and owns the whole pipeline.

pub mod engine;
pub mod handlers;
pub mod resolver;
pub mod session;

pub use engine::DialogueCore;
pub use resolver::ContextResolver;
pub use session::{PendingConfirmation, SessionContext, UserMemory};
