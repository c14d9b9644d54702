//! End-to-end turns through the dialogue core: multi-turn continuation,
//! memory promotion, retention and encrypted persistence.

use std::sync::Arc;

use lingxi::dialogue::handlers::JOKES;
use lingxi::{
    AesGcmSecurity, CoreConfig, DialogueCore, EntityType, HistoryStore, Intent, OfflineActions,
    PermissionLevel, SecurityCapability,
};

fn build_core(config: CoreConfig) -> DialogueCore {
    let security: Arc<dyn SecurityCapability> =
        Arc::new(AesGcmSecurity::new("集成测试口令", PermissionLevel::User));
    let cipher: Option<Arc<dyn SecurityCapability>> = if config.encrypt_history {
        Some(security.clone())
    } else {
        None
    };
    let history = HistoryStore::open_in_memory(config.max_history_rows, cipher).unwrap();
    DialogueCore::with_store(config, Box::new(OfflineActions::new()), security, history)
}

#[test]
fn weather_follow_up_keeps_city_from_previous_turn() {
    let core = build_core(CoreConfig::ephemeral());

    let first = core.process("北京天气怎么样").unwrap();
    assert!(first.contains("北京"));
    let session = core.session_snapshot();
    assert_eq!(session.last_intent, Some(Intent::Weather));

    let second = core.process("明天呢").unwrap();
    assert!(second.contains("北京"));
    assert!(second.contains("明天"));

    let session = core.session_snapshot();
    assert_eq!(session.last_intent, Some(Intent::Weather));
    assert!(session
        .last_entities
        .iter()
        .any(|e| e.entity_type == EntityType::City && e.value == "北京"));
}

#[test]
fn repeated_weather_turns_promote_a_favorite_topic() {
    let core = build_core(CoreConfig::ephemeral());

    for text in ["北京天气怎么样", "上海天气怎么样", "广州天气怎么样"] {
        core.process(text).unwrap();
    }

    let session = core.session_snapshot();
    assert_eq!(session.memory.favorite_topics, vec![Intent::Weather]);
    assert_eq!(session.conversation_topic, Some(Intent::Weather));
    assert_eq!(session.topic_turns, 3);
    // The last weather city sticks as the preferred one
    assert_eq!(session.memory.preferred_city.as_deref(), Some("广州"));
}

#[test]
fn joke_turn_resets_the_topic_streak() {
    let core = build_core(CoreConfig::ephemeral());

    core.process("北京天气怎么样").unwrap();
    let response = core.process("讲个笑话").unwrap();

    assert!(JOKES.contains(&response.as_str()));
    let session = core.session_snapshot();
    assert_eq!(session.last_intent, Some(Intent::Joke));
    assert_eq!(session.conversation_topic, Some(Intent::Joke));
    assert_eq!(session.topic_turns, 1);
    assert_eq!(session.conversation_turns, 2);
}

#[test]
fn history_retains_only_the_newest_turns() {
    let mut config = CoreConfig::ephemeral();
    config.max_history_rows = 3;
    let core = build_core(config);

    let turns = [
        "讲个笑话",
        "现在几点了",
        "今天几号",
        "北京天气怎么样",
        "你是谁",
    ];
    for text in turns {
        core.process(text).unwrap();
    }

    let records = core.recent_history(10).unwrap();
    assert_eq!(records.len(), 3);
    let inputs: Vec<_> = records.iter().map(|r| r.user_input.as_str()).collect();
    assert_eq!(inputs, vec!["今天几号", "北京天气怎么样", "你是谁"]);
}

#[test]
fn encrypted_history_reads_back_in_clear() {
    let core = build_core(CoreConfig::default());

    core.process("讲个笑话").unwrap();

    let records = core.recent_history(10).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].is_encrypted);
    assert_eq!(records[0].user_input, "讲个笑话");
    assert_eq!(records[0].intent, "joke");
    assert!(JOKES.contains(&records[0].response.as_str()));
}

#[test]
fn unintelligible_turn_gets_an_apology_and_is_persisted() {
    let core = build_core(CoreConfig::ephemeral());

    let response = core.process("呜啦啦").unwrap();
    assert!(!response.is_empty());

    let session = core.session_snapshot();
    assert_eq!(session.last_intent, Some(Intent::Unknown));
    // Unknown turns do not count as queries
    assert!(session.memory.recent_queries.is_empty());

    let records = core.recent_history(10).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].intent, "unknown");
}

#[test]
fn exit_turn_answers_with_a_farewell() {
    let core = build_core(CoreConfig::ephemeral());
    let response = core.process("退出").unwrap();
    assert_eq!(response, "感谢使用，再见！");
    assert_eq!(core.session_snapshot().last_intent, Some(Intent::Exit));
}

#[test]
fn sensitive_app_requires_confirmation_before_running() {
    let core = build_core(CoreConfig::ephemeral());

    let question = core.process("打开powershell").unwrap();
    assert!(question.contains("确定要打开"));

    let response = core.process("确定").unwrap();
    assert!(response.contains("powershell"));
    assert!(core.session_snapshot().pending_confirmations.is_empty());

    // Both turns were persisted
    assert_eq!(core.recent_history(10).unwrap().len(), 2);
}
