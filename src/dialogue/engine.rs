//! The serialized turn pipeline.
//!
//! `DialogueCore` owns every stage and the session record; `process` is the
//! sole entry point and runs under one mutex, so turns never overlap and the
//! session has a single writer. Persistence is best-effort: a failing store
//! never fails the turn.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::actions::ActionCapability;
use crate::config::CoreConfig;
use crate::dialogue::handlers::{HandlerDeps, IntentDispatcher};
use crate::dialogue::resolver::ContextResolver;
use crate::dialogue::session::{PendingConfirmation, SessionContext};
use crate::history::{DialogueRecord, HistoryStore};
use crate::nlu::{normalize, EntityExtractor, Intent, IntentClassifier};
use crate::security::SecurityCapability;

/// Words that accept a pending confirmation.
const AFFIRMATIONS: [&str; 7] = ["好", "是", "确定", "确认", "可以", "嗯", "执行"];

/// Words that decline one. Checked before affirmations so "不好" declines.
const NEGATIONS: [&str; 4] = ["不", "别", "取消", "算了"];

pub struct DialogueCore {
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    resolver: ContextResolver,
    dispatcher: IntentDispatcher,
    session: Mutex<SessionContext>,
    history: Mutex<HistoryStore>,
    actions: Box<dyn ActionCapability>,
    security: Arc<dyn SecurityCapability>,
    config: CoreConfig,
}

impl DialogueCore {
    /// Build a core persisting to `config.history_path`.
    pub fn new(
        config: CoreConfig,
        actions: Box<dyn ActionCapability>,
        security: Arc<dyn SecurityCapability>,
    ) -> Result<Self> {
        let cipher = config.encrypt_history.then(|| security.clone());
        let history = HistoryStore::open(&config.history_path, config.max_history_rows, cipher)?;
        Ok(Self::with_store(config, actions, security, history))
    }

    /// Build a core around an already-open store (tests use in-memory ones).
    pub fn with_store(
        config: CoreConfig,
        actions: Box<dyn ActionCapability>,
        security: Arc<dyn SecurityCapability>,
        history: HistoryStore,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(config.similarity_threshold),
            extractor: EntityExtractor::new(),
            resolver: ContextResolver::new(),
            dispatcher: IntentDispatcher::new(),
            session: Mutex::new(SessionContext::new()),
            history: Mutex::new(history),
            actions,
            security,
            config,
        }
    }

    /// Process one turn of user text and return the response.
    ///
    /// classify -> extract -> resolve -> dispatch -> memory update ->
    /// persist, serialized end to end.
    pub fn process(&self, raw: &str) -> Result<String> {
        let mut session = self.session.lock();
        let text = normalize(raw);

        if let Some(pending) = session.pending_confirmations.pop_front() {
            if let Some(response) = self.settle_confirmation(&pending, &text) {
                session.update_after_turn(pending.intent, &[], &response, &self.config);
                self.persist(raw, pending.intent, &[], &response);
                return Ok(response);
            }
            // Anything else drops the question and processes normally
        }

        let classified = self.classifier.classify(&text);
        let entities = self.extractor.extract(&text);
        let (resolved, entities) = self
            .resolver
            .resolve(&text, classified, entities, &*session);
        let intent = resolved.unwrap_or(Intent::Unknown);

        debug!(
            session = %session.session_id,
            turn = session.conversation_turns + 1,
            %intent,
            entity_count = entities.len(),
            "resolved turn"
        );

        let deps = HandlerDeps {
            actions: self.actions.as_ref(),
            security: self.security.as_ref(),
            config: &self.config,
        };
        let response = self
            .dispatcher
            .dispatch(intent, &text, &entities, &mut *session, &deps);

        session.update_after_turn(intent, &entities, &response, &self.config);
        self.persist(raw, intent, &entities, &response);

        Ok(response)
    }

    /// Execute or cancel a queued sensitive action. `None` when the input is
    /// neither a yes nor a no.
    fn settle_confirmation(
        &self,
        pending: &PendingConfirmation,
        text: &str,
    ) -> Option<String> {
        if NEGATIONS.iter().any(|w| text.contains(w)) {
            return Some("好的，已取消该操作。".to_string());
        }
        if AFFIRMATIONS.iter().any(|w| text.contains(w)) {
            let response = match self.actions.open_application(&pending.app_name) {
                Ok(result) => result,
                Err(err) => {
                    warn!(app = %pending.app_name, error = %err, "confirmed action failed");
                    format!("抱歉，打开应用程序时出错: {err}")
                }
            };
            return Some(response);
        }
        None
    }

    fn persist(&self, raw: &str, intent: Intent, entities: &[crate::nlu::Entity], response: &str) {
        if let Err(err) = self.history.lock().append(raw, intent, entities, response) {
            warn!(error = %err, "failed to persist dialogue turn");
        }
    }

    /// A copy of the live session record, for the CLI and tests.
    pub fn session_snapshot(&self) -> SessionContext {
        self.session.lock().clone()
    }

    /// Most recent turns from the store, oldest first.
    pub fn recent_history(&self, limit: usize) -> Result<Vec<DialogueRecord>> {
        self.history.lock().recent(limit)
    }

    pub fn clear_history(&self) -> Result<()> {
        self.history.lock().clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::OfflineActions;
    use crate::security::{AesGcmSecurity, PermissionLevel};

    fn core() -> DialogueCore {
        let config = CoreConfig::ephemeral();
        let security: Arc<dyn SecurityCapability> =
            Arc::new(AesGcmSecurity::new("测试口令", PermissionLevel::User));
        let history = HistoryStore::open_in_memory(config.max_history_rows, None).unwrap();
        DialogueCore::with_store(config, Box::new(OfflineActions::new()), security, history)
    }

    #[test]
    fn test_turn_updates_session_and_history() {
        let core = core();
        let response = core.process("讲个笑话").unwrap();
        assert!(!response.is_empty());

        let session = core.session_snapshot();
        assert_eq!(session.last_intent, Some(Intent::Joke));
        assert_eq!(session.conversation_turns, 1);

        let records = core.recent_history(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].intent, "joke");
        assert_eq!(records[0].user_input, "讲个笑话");
    }

    #[test]
    fn test_unclassifiable_turn_resolves_to_unknown() {
        let core = core();
        core.process("呜啦啦").unwrap();
        let session = core.session_snapshot();
        assert_eq!(session.last_intent, Some(Intent::Unknown));
    }

    #[test]
    fn test_confirmation_yes_executes_action() {
        let core = core();
        let question = core.process("打开cmd").unwrap();
        assert!(question.contains("确定要打开"));

        let response = core.process("确定").unwrap();
        assert!(response.contains("cmd"));
        assert!(core.session_snapshot().pending_confirmations.is_empty());
    }

    #[test]
    fn test_confirmation_no_cancels_action() {
        let core = core();
        core.process("打开cmd").unwrap();
        let response = core.process("不要").unwrap();
        assert!(response.contains("取消"));
        assert!(core.session_snapshot().pending_confirmations.is_empty());
    }

    #[test]
    fn test_unrelated_turn_drops_confirmation() {
        let core = core();
        core.process("打开cmd").unwrap();
        let response = core.process("讲个笑话").unwrap();
        assert!(crate::dialogue::handlers::JOKES.contains(&response.as_str()));
        assert!(core.session_snapshot().pending_confirmations.is_empty());
    }
}
