use std::path::PathBuf;

/// Tunable constants for the dialogue core.
///
/// The similarity threshold and the favorite-topic promotion window were
/// chosen empirically; they are surfaced here instead of being buried in the
/// classifier and memory code.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// SQLite file holding the dialogue history
    pub history_path: PathBuf,
    /// Maximum rows retained in the history (FIFO eviction)
    pub max_history_rows: usize,
    /// Store user input / entities / responses encrypted
    pub encrypt_history: bool,
    /// Minimum cosine score for the similarity fallback to accept an intent
    pub similarity_threshold: f32,
    /// Occurrences within the recent-query window that promote a favorite topic
    pub favorite_topic_threshold: usize,
    /// Capacity of the recent-query FIFO
    pub recent_query_window: usize,
    /// Queue a yes/no confirmation before sensitive actions
    pub confirm_sensitive_ops: bool,
    /// City used when neither the turn nor the session supplies one
    pub default_city: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("data/dialogue_history.db"),
            max_history_rows: 10,
            encrypt_history: true,
            similarity_threshold: 0.15,
            favorite_topic_threshold: 2,
            recent_query_window: 5,
            confirm_sensitive_ops: true,
            default_city: "北京".to_string(),
        }
    }
}

impl CoreConfig {
    /// Config for tests and throwaway sessions: in-memory-friendly defaults,
    /// no encryption.
    pub fn ephemeral() -> Self {
        Self {
            encrypt_history: false,
            ..Self::default()
        }
    }
}
