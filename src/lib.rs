//! Dialogue core for a Chinese voice assistant.
//!
//! Turns free-form text into an (intent, entities) pair, resolves it against
//! the running session (multi-turn continuation, user memory, topic streaks),
//! dispatches to a handler, and persists an optionally-encrypted turn history.
//!
//! The sole entry point is [`dialogue::DialogueCore::process`]; speech
//! capture, TTS and the network/OS operations behind
//! [`actions::ActionCapability`] live outside this crate.

pub mod actions;
pub mod config;
pub mod dialogue;
pub mod history;
pub mod nlu;
pub mod security;

// Re-export commonly used types
pub use actions::{ActionCapability, ActionError, OfflineActions};
pub use config::CoreConfig;
pub use dialogue::{DialogueCore, SessionContext};
pub use history::{DialogueRecord, HistoryStore};
pub use nlu::{Entity, EntityType, Intent};
pub use security::{AesGcmSecurity, PermissionLevel, SecurityCapability};
