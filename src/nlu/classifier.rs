//! Three-tier intent classification.
//!
//! Tier 1 handles "open X" commands before anything else - the verb is
//! structurally ambiguous with half the rule table, so it must win
//! deterministically. Tier 2 is the ordered rule table. Tier 3 is the
//! TF-IDF similarity fallback, accepted only above a configured score.
//!
//! Returns `None` ("absent") rather than `Unknown` when nothing matched:
//! the context resolver gets a chance to infer an intent from the session
//! before the turn is finalized as unknown.

use regex::{Regex, RegexBuilder};

use super::entity::APP_NAME_PATTERNS;
use super::intent::Intent;
use super::rules::RuleTable;
use super::similarity::SimilarityModel;

/// Trailing filler particles stripped from captured targets.
const FILLER_PARTICLES: &str = "吧呗啊哦了呢";

/// Folder words that steer an "open X" target to `OpenFolder`.
const FOLDER_KEYWORDS: [&str; 8] = [
    "文件夹", "目录", "桌面", "文档", "下载", "图片", "音乐", "视频",
];

/// Longest target (in chars) still treated as an application name.
const MAX_APP_TARGET_CHARS: usize = 20;

pub struct IntentClassifier {
    open_verbs: Vec<Regex>,
    app_probes: Vec<Regex>,
    rules: RuleTable,
    fallback: SimilarityModel,
    threshold: f32,
}

impl IntentClassifier {
    pub fn new(threshold: f32) -> Self {
        Self::with_rules(RuleTable::standard(), threshold)
    }

    /// Build against a custom rule table (tests craft reordered tables).
    pub fn with_rules(rules: RuleTable, threshold: f32) -> Self {
        let open_verbs = [r"打开\s*(.+)", r"启动\s*(.+)", r"运行\s*(.+)", r"开启\s*(.+)"]
            .iter()
            .map(|s| Regex::new(s).expect("open-verb patterns are fixed"))
            .collect();

        let app_probes = APP_NAME_PATTERNS
            .iter()
            .filter_map(|s| RegexBuilder::new(s).case_insensitive(true).build().ok())
            .collect();

        let fallback = SimilarityModel::fit(rules.exemplars());

        Self {
            open_verbs,
            app_probes,
            rules,
            fallback,
            threshold,
        }
    }

    /// Classify normalized text. At most one intent; `None` means absent.
    pub fn classify(&self, text: &str) -> Option<Intent> {
        if let Some(intent) = self.classify_open_target(text) {
            return Some(intent);
        }

        if let Some(intent) = self.rules.first_match(text) {
            return Some(intent);
        }

        match self.fallback.best_match(text) {
            Some((intent, score)) if score > self.threshold => Some(intent),
            _ => None,
        }
    }

    /// Tier 1: "open/start/launch + target".
    fn classify_open_target(&self, text: &str) -> Option<Intent> {
        for verb in &self.open_verbs {
            let caps = match verb.captures(text) {
                Some(caps) => caps,
                None => continue,
            };
            let target = caps
                .get(1)
                .map(|m| m.as_str())
                .unwrap_or("")
                .trim_end_matches(|c| FILLER_PARTICLES.contains(c))
                .trim();

            if self.app_probes.iter().any(|p| p.is_match(target)) {
                return Some(Intent::OpenApplication);
            }
            if FOLDER_KEYWORDS.iter().any(|kw| target.contains(kw)) {
                return Some(Intent::OpenFolder);
            }
            // An unrecognized but plausible target still reads as an app
            if !target.is_empty() && target.chars().count() <= MAX_APP_TARGET_CHARS {
                return Some(Intent::OpenApplication);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlu::normalize::normalize;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new(0.15)
    }

    #[test]
    fn test_open_known_app() {
        assert_eq!(
            classifier().classify("打开微信"),
            Some(Intent::OpenApplication)
        );
        assert_eq!(
            classifier().classify(&normalize("启动VSCode吧")),
            Some(Intent::OpenApplication)
        );
    }

    #[test]
    fn test_open_folder_target() {
        assert_eq!(
            classifier().classify("打开下载文件夹"),
            Some(Intent::OpenFolder)
        );
    }

    #[test]
    fn test_action_verb_tier_beats_rule_table() {
        // 天气 would match the weather rules, but the open-verb tier runs first
        assert_eq!(
            classifier().classify("打开天气预报软件"),
            Some(Intent::OpenApplication)
        );
    }

    #[test]
    fn test_overlong_open_target_falls_through() {
        let text = format!("打开{}", "很".repeat(30));
        // Target too long for an app name; the rule table still sees 打开
        assert_eq!(
            classifier().classify(&text),
            Some(Intent::OpenApplication)
        );
    }

    #[test]
    fn test_rule_table_order_wins() {
        assert_eq!(classifier().classify("播放新闻视频"), Some(Intent::News));
    }

    #[test]
    fn test_plain_rule_matches() {
        assert_eq!(classifier().classify("讲个笑话"), Some(Intent::Joke));
        assert_eq!(
            classifier().classify("北京天气怎么样"),
            Some(Intent::Weather)
        );
        assert_eq!(classifier().classify("现在几点了"), Some(Intent::Time));
    }

    #[test]
    fn test_similarity_fallback() {
        assert_eq!(
            classifier().classify("外面在下着雨吗"),
            Some(Intent::Weather)
        );
    }

    #[test]
    fn test_absent_when_nothing_matches() {
        assert_eq!(classifier().classify("呜啦啦"), None);
        assert_eq!(classifier().classify(""), None);
    }

    #[test]
    fn test_at_most_one_intent() {
        // Inputs overlapping several categories still yield exactly one label
        for text in ["打开音乐", "听周杰伦的歌", "明天上海天气如何"] {
            assert!(classifier().classify(text).is_some());
        }
    }
}
