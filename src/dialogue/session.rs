//! Per-session mutable state: last turn, topic streaks, user memory and the
//! pending-confirmation queue.
//!
//! One record per running core. Created once at session start, mutated
//! exactly once per turn (after the handler produced its response), never
//! destroyed mid-process.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::nlu::{Entity, EntityType, Intent};

/// Long-lived user preferences accumulated across turns.
#[derive(Debug, Clone)]
pub struct UserMemory {
    pub preferred_city: Option<String>,
    pub preferred_language: String,
    /// Intents promoted after repeated recent occurrence
    pub favorite_topics: Vec<Intent>,
    /// Bounded FIFO of recently resolved intents
    pub recent_queries: VecDeque<Intent>,
    /// First-seen-wins
    pub user_name: Option<String>,
}

impl Default for UserMemory {
    fn default() -> Self {
        Self {
            preferred_city: None,
            preferred_language: "zh-CN".to_string(),
            favorite_topics: Vec::new(),
            recent_queries: VecDeque::new(),
            user_name: None,
        }
    }
}

/// A sensitive action waiting for an explicit yes/no.
#[derive(Debug, Clone)]
pub struct PendingConfirmation {
    pub intent: Intent,
    pub app_name: String,
    pub prompt: String,
}

/// The live session record.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub last_intent: Option<Intent>,
    pub last_entities: Vec<Entity>,
    pub last_response: Option<String>,
    pub conversation_topic: Option<Intent>,
    /// Consecutive turns on the current topic
    pub topic_turns: u32,
    pub conversation_turns: u64,
    pub memory: UserMemory,
    pub pending_confirmations: VecDeque<PendingConfirmation>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            last_intent: None,
            last_entities: Vec::new(),
            last_response: None,
            conversation_topic: None,
            topic_turns: 0,
            conversation_turns: 0,
            memory: UserMemory::default(),
            pending_confirmations: VecDeque::new(),
        }
    }

    /// The single post-dispatch update step. Runs unconditionally, once per
    /// turn.
    pub fn update_after_turn(
        &mut self,
        intent: Intent,
        entities: &[Entity],
        response: &str,
        config: &CoreConfig,
    ) {
        self.conversation_turns += 1;
        self.update_memory(intent, entities, config);
        self.update_topic(intent);
        self.last_intent = Some(intent);
        self.last_entities = entities.to_vec();
        self.last_response = Some(response.to_string());
    }

    fn update_memory(&mut self, intent: Intent, entities: &[Entity], config: &CoreConfig) {
        if intent == Intent::Weather {
            if let Some(city) = first_entity(entities, EntityType::City) {
                self.memory.preferred_city = Some(city.to_string());
            }
        }

        if intent != Intent::Unknown {
            self.memory.recent_queries.push_back(intent);
            while self.memory.recent_queries.len() > config.recent_query_window {
                self.memory.recent_queries.pop_front();
            }

            let occurrences = self
                .memory
                .recent_queries
                .iter()
                .filter(|i| **i == intent)
                .count();
            if occurrences >= config.favorite_topic_threshold
                && !self.memory.favorite_topics.contains(&intent)
            {
                self.memory.favorite_topics.push(intent);
            }
        }

        for entity in entities {
            match entity.entity_type {
                EntityType::Person if self.memory.user_name.is_none() => {
                    self.memory.user_name = Some(entity.value.clone());
                }
                EntityType::Language => {
                    self.memory.preferred_language = entity.value.clone();
                }
                _ => {}
            }
        }
    }

    /// Same topic -> streak grows; new topic -> streak restarts; unknown ->
    /// streak and topic both freeze.
    fn update_topic(&mut self, intent: Intent) {
        if intent == Intent::Unknown {
            return;
        }
        if self.conversation_topic == Some(intent) {
            self.topic_turns += 1;
        } else {
            self.conversation_topic = Some(intent);
            self.topic_turns = 1;
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// First entity of the given type, in extraction order.
pub fn first_entity(entities: &[Entity], entity_type: EntityType) -> Option<&str> {
    entities
        .iter()
        .find(|e| e.entity_type == entity_type)
        .map(|e| e.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(ctx: &mut SessionContext, intent: Intent, entities: &[Entity]) {
        ctx.update_after_turn(intent, entities, "ok", &CoreConfig::default());
    }

    #[test]
    fn test_topic_streak_grows_and_resets() {
        let mut ctx = SessionContext::new();
        turn(&mut ctx, Intent::Weather, &[]);
        assert_eq!(ctx.topic_turns, 1);
        turn(&mut ctx, Intent::Weather, &[]);
        assert_eq!(ctx.topic_turns, 2);
        turn(&mut ctx, Intent::Joke, &[]);
        assert_eq!(ctx.conversation_topic, Some(Intent::Joke));
        assert_eq!(ctx.topic_turns, 1);
    }

    #[test]
    fn test_unknown_freezes_topic_streak() {
        let mut ctx = SessionContext::new();
        turn(&mut ctx, Intent::Weather, &[]);
        turn(&mut ctx, Intent::Unknown, &[]);
        assert_eq!(ctx.conversation_topic, Some(Intent::Weather));
        assert_eq!(ctx.topic_turns, 1);
        // The streak resumes on the next on-topic turn
        turn(&mut ctx, Intent::Weather, &[]);
        assert_eq!(ctx.topic_turns, 2);
    }

    #[test]
    fn test_recent_queries_bounded_fifo() {
        let mut ctx = SessionContext::new();
        for intent in [
            Intent::Weather,
            Intent::Time,
            Intent::Date,
            Intent::Joke,
            Intent::News,
            Intent::Music,
        ] {
            turn(&mut ctx, intent, &[]);
        }
        assert_eq!(ctx.memory.recent_queries.len(), 5);
        // Oldest (Weather) evicted
        assert!(!ctx.memory.recent_queries.contains(&Intent::Weather));
        assert_eq!(ctx.memory.recent_queries.front(), Some(&Intent::Time));
    }

    #[test]
    fn test_unknown_not_recorded_in_recent_queries() {
        let mut ctx = SessionContext::new();
        turn(&mut ctx, Intent::Unknown, &[]);
        assert!(ctx.memory.recent_queries.is_empty());
    }

    #[test]
    fn test_favorite_topic_promoted_once() {
        let mut ctx = SessionContext::new();
        turn(&mut ctx, Intent::Weather, &[]);
        assert!(ctx.memory.favorite_topics.is_empty());
        turn(&mut ctx, Intent::Weather, &[]);
        assert_eq!(ctx.memory.favorite_topics, vec![Intent::Weather]);
        turn(&mut ctx, Intent::Weather, &[]);
        assert_eq!(ctx.memory.favorite_topics, vec![Intent::Weather]);
    }

    #[test]
    fn test_preferred_city_follows_weather_turns() {
        let mut ctx = SessionContext::new();
        turn(
            &mut ctx,
            Intent::Weather,
            &[Entity::new(EntityType::City, "上海")],
        );
        assert_eq!(ctx.memory.preferred_city.as_deref(), Some("上海"));
        // City entities outside weather turns do not update the preference
        turn(
            &mut ctx,
            Intent::SearchMap,
            &[Entity::new(EntityType::City, "广州")],
        );
        assert_eq!(ctx.memory.preferred_city.as_deref(), Some("上海"));
    }

    #[test]
    fn test_user_name_first_seen_wins() {
        let mut ctx = SessionContext::new();
        turn(
            &mut ctx,
            Intent::Music,
            &[Entity::new(EntityType::Person, "周杰伦")],
        );
        turn(
            &mut ctx,
            Intent::Music,
            &[Entity::new(EntityType::Person, "林俊杰")],
        );
        assert_eq!(ctx.memory.user_name.as_deref(), Some("周杰伦"));
    }
}
