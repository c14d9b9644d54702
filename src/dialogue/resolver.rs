//! Contextual intent inference and entity backfill.
//!
//! Runs after classification, against the live session record. An absent
//! classification gets three chances before falling to `Unknown`: keyword
//! continuation of the previous intent, adoption of the running topic, and
//! the question-particle heuristic. Weather, time/date and search turns
//! additionally backfill missing entities from memory or the previous turn.

use crate::dialogue::session::{first_entity, SessionContext};
use crate::nlu::{Entity, EntityType, Intent};

/// Words that mark a bare follow-up question (明天呢 / 为什么).
const QUESTION_WORDS: [&str; 7] = ["呢", "怎么", "为什么", "哪里", "什么", "如何", "多少"];

/// Time references that keep a bare follow-up inside the weather topic.
const TIME_KEYWORDS: [&str; 17] = [
    "今天", "明天", "后天", "大后天", "周一", "周二", "周三", "周四", "周五", "周六", "周日",
    "早上", "下午", "晚上", "上午", "夜间", "凌晨",
];

/// Follow-up vocabulary for time/date continuation.
const TIME_DATE_KEYWORDS: [&str; 10] = [
    "几点", "时间", "日期", "几号", "今天", "明天", "现在", "几时", "何时", "星期几",
];

/// "Tell me more" vocabulary for search continuation.
const SEARCH_MORE_KEYWORDS: [&str; 6] = ["更多", "详细", "信息", "资料", "了解", "然后呢"];

/// Per-intent vocabulary that signals the conversation is still on that
/// intent's subject.
const CONTEXTUAL_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::Weather,
        &[
            "温度", "天气", "下雨", "晴天", "多云", "预报", "风力", "湿度", "气候",
            "天气怎么样", "冷", "热",
        ],
    ),
    (
        Intent::Time,
        &["几点", "时间", "现在", "几时", "何时", "几点了"],
    ),
    (
        Intent::Date,
        &["日期", "几号", "今天", "明天", "后天", "星期几", "几号了"],
    ),
    (
        Intent::SearchInternet,
        &["搜索", "查找", "查询", "了解", "更多", "详细", "信息", "资料"],
    ),
    (
        Intent::Calculator,
        &["计算", "加", "减", "乘", "除", "等于", "结果", "多少"],
    ),
    (Intent::Joke, &["笑话", "搞笑", "幽默", "哈哈", "开心"]),
    (
        Intent::Music,
        &["音乐", "歌曲", "播放", "听歌", "唱歌", "旋律"],
    ),
    (Intent::OpenApplication, &["打开", "启动", "运行", "开启"]),
    (Intent::OpenFolder, &["打开", "查看", "浏览", "文件夹"]),
];

fn keywords_for(intent: Intent) -> Option<&'static [&'static str]> {
    CONTEXTUAL_KEYWORDS
        .iter()
        .find(|(i, _)| *i == intent)
        .map(|(_, kws)| *kws)
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

pub struct ContextResolver;

impl ContextResolver {
    pub fn new() -> Self {
        Self
    }

    /// Reconcile a turn against the session. Returns the (possibly inferred)
    /// intent and the (possibly augmented) entities; `None` means even
    /// context could not help and the engine finalizes to `Unknown`.
    pub fn resolve(
        &self,
        input: &str,
        classified: Option<Intent>,
        mut entities: Vec<Entity>,
        ctx: &SessionContext,
    ) -> (Option<Intent>, Vec<Entity>) {
        // Unknown from upstream is treated the same as absent
        let mut intent = classified.filter(|i| *i != Intent::Unknown);

        if intent.is_none() {
            if let Some(last) = ctx.last_intent.filter(|i| *i != Intent::Unknown) {
                // 1. Continuation via the previous intent's vocabulary
                if let Some(kws) = keywords_for(last) {
                    if contains_any(input, kws) {
                        intent = Some(last);
                    }
                }
                // 2. Adoption of the running topic
                if intent.is_none() {
                    if let Some(topic) = ctx.conversation_topic {
                        if let Some(kws) = keywords_for(topic) {
                            if contains_any(input, kws) {
                                intent = Some(topic);
                            }
                        }
                    }
                }
                // 3. A bare question continues the previous intent
                if intent.is_none() && contains_any(input, &QUESTION_WORDS) {
                    intent = Some(last);
                }
            }
        }

        self.backfill_weather(input, &mut intent, &mut entities, ctx);
        self.continue_time_date(input, &mut intent, ctx);
        self.continue_search(input, &mut intent, &mut entities, ctx);

        (intent, entities)
    }

    /// Weather turns without a city get one from memory, then from the
    /// previous weather turn. A bare time follow-up ("明天呢") forces the
    /// weather intent outright.
    fn backfill_weather(
        &self,
        input: &str,
        intent: &mut Option<Intent>,
        entities: &mut Vec<Entity>,
        ctx: &SessionContext,
    ) {
        let weather_turn = *intent == Some(Intent::Weather)
            || (intent.is_none() && ctx.last_intent == Some(Intent::Weather));
        if !weather_turn {
            return;
        }

        if first_entity(entities, EntityType::City).is_none() {
            if let Some(city) = &ctx.memory.preferred_city {
                entities.push(Entity::new(EntityType::City, city.clone()));
            } else if ctx.last_intent == Some(Intent::Weather) {
                if let Some(city) = first_entity(&ctx.last_entities, EntityType::City) {
                    entities.push(Entity::new(EntityType::City, city.to_string()));
                }
            }
        }

        if intent.is_none() && (contains_any(input, &TIME_KEYWORDS) || input.contains('呢')) {
            *intent = Some(Intent::Weather);
        }
    }

    fn continue_time_date(&self, input: &str, intent: &mut Option<Intent>, ctx: &SessionContext) {
        let prior_time_date = matches!(ctx.last_intent, Some(Intent::Time) | Some(Intent::Date));
        if intent.is_none()
            && prior_time_date
            && (contains_any(input, &TIME_DATE_KEYWORDS) || input.contains('呢'))
        {
            *intent = ctx.last_intent;
        }
    }

    /// A "tell me more" follow-up stays on search, reusing the previous
    /// query when the current turn has none.
    fn continue_search(
        &self,
        input: &str,
        intent: &mut Option<Intent>,
        entities: &mut Vec<Entity>,
        ctx: &SessionContext,
    ) {
        if intent.is_some() || ctx.last_intent != Some(Intent::SearchInternet) {
            return;
        }
        if contains_any(input, &SEARCH_MORE_KEYWORDS) || input.contains('呢') {
            *intent = Some(Intent::SearchInternet);
            if first_entity(entities, EntityType::Query).is_none() {
                if let Some(query) = first_entity(&ctx.last_entities, EntityType::Query) {
                    entities.push(Entity::new(EntityType::Query, query.to_string()));
                }
            }
        }
    }
}

impl Default for ContextResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;

    fn ctx_after(intent: Intent, entities: &[Entity]) -> SessionContext {
        let mut ctx = SessionContext::new();
        ctx.update_after_turn(intent, entities, "ok", &CoreConfig::default());
        ctx
    }

    #[test]
    fn test_weather_follow_up_keeps_intent_and_city() {
        let ctx = ctx_after(Intent::Weather, &[Entity::new(EntityType::City, "北京")]);
        let (intent, entities) = ContextResolver::new().resolve("明天呢", None, vec![], &ctx);
        assert_eq!(intent, Some(Intent::Weather));
        assert_eq!(first_entity(&entities, EntityType::City), Some("北京"));
    }

    #[test]
    fn test_preferred_city_outranks_last_turn() {
        let mut ctx = ctx_after(Intent::Weather, &[Entity::new(EntityType::City, "北京")]);
        ctx.memory.preferred_city = Some("上海".to_string());
        let (_, entities) = ContextResolver::new().resolve(
            "今天热不热",
            Some(Intent::Weather),
            vec![],
            &ctx,
        );
        assert_eq!(first_entity(&entities, EntityType::City), Some("上海"));
    }

    #[test]
    fn test_explicit_city_not_overridden() {
        let ctx = ctx_after(Intent::Weather, &[Entity::new(EntityType::City, "北京")]);
        let provided = vec![Entity::new(EntityType::City, "广州")];
        let (_, entities) =
            ContextResolver::new().resolve("广州呢", Some(Intent::Weather), provided, &ctx);
        let cities: Vec<_> = entities
            .iter()
            .filter(|e| e.entity_type == EntityType::City)
            .collect();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].value, "广州");
    }

    #[test]
    fn test_keyword_continuation_of_previous_intent() {
        let ctx = ctx_after(Intent::Weather, &[]);
        let (intent, _) = ContextResolver::new().resolve("湿度大不大", None, vec![], &ctx);
        assert_eq!(intent, Some(Intent::Weather));
    }

    #[test]
    fn test_question_particle_continues_previous_intent() {
        let ctx = ctx_after(Intent::Joke, &[]);
        let (intent, _) = ContextResolver::new().resolve("为什么呀", None, vec![], &ctx);
        assert_eq!(intent, Some(Intent::Joke));
    }

    #[test]
    fn test_time_continuation() {
        let ctx = ctx_after(Intent::Time, &[]);
        let (intent, _) = ContextResolver::new().resolve("那明天呢", None, vec![], &ctx);
        assert_eq!(intent, Some(Intent::Time));
    }

    #[test]
    fn test_search_continuation_reuses_query() {
        let ctx = ctx_after(
            Intent::SearchInternet,
            &[Entity::new(EntityType::Query, "人工智能")],
        );
        let (intent, entities) =
            ContextResolver::new().resolve("再详细一点", None, vec![], &ctx);
        assert_eq!(intent, Some(Intent::SearchInternet));
        assert_eq!(first_entity(&entities, EntityType::Query), Some("人工智能"));
    }

    #[test]
    fn test_no_context_stays_absent() {
        let ctx = SessionContext::new();
        let (intent, _) = ContextResolver::new().resolve("呜啦啦", None, vec![], &ctx);
        assert_eq!(intent, None);
    }

    #[test]
    fn test_classified_intent_passes_through() {
        let ctx = ctx_after(Intent::Weather, &[]);
        let (intent, _) =
            ContextResolver::new().resolve("讲个笑话", Some(Intent::Joke), vec![], &ctx);
        assert_eq!(intent, Some(Intent::Joke));
    }
}
