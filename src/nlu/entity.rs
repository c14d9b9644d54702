//! Typed entity extraction over a pattern table.
//!
//! The table is data: per entity type an ordered list of patterns, compiled
//! once at construction. A pattern that fails to compile is skipped (and
//! counted, so tests can assert the shipped table is clean) rather than
//! aborting extraction. A dedicated second pass pulls clock-time expressions
//! out as `TimePoint` entities on top of the generic table.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Closed set of recognized entity categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    City,
    TimeWord,
    TimePoint,
    Number,
    Duration,
    AppName,
    FilePath,
    Language,
    Person,
    Song,
    Query,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::City => "city",
            Self::TimeWord => "time_word",
            Self::TimePoint => "time_point",
            Self::Number => "number",
            Self::Duration => "duration",
            Self::AppName => "app_name",
            Self::FilePath => "file_path",
            Self::Language => "language",
            Self::Person => "person",
            Self::Song => "song",
            Self::Query => "query",
        }
    }
}

/// One recognized span: `(type, text)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub value: String,
}

impl Entity {
    pub fn new(entity_type: EntityType, value: impl Into<String>) -> Self {
        Self {
            entity_type,
            value: value.into(),
        }
    }
}

/// Recognized application names. Shared with the classifier's action-verb
/// tier, which needs to decide whether an "open X" target is an app.
pub(crate) const APP_NAME_PATTERNS: &[&str] = &[
    // System tools
    "记事本",
    "计算器",
    "画图",
    "写字板",
    "任务管理器",
    "控制面板",
    "资源管理器",
    "截图工具",
    "命令提示符",
    "cmd",
    "powershell",
    "终端",
    "设置",
    // Browsers
    "浏览器",
    "Chrome",
    "谷歌浏览器",
    "Edge",
    "微软浏览器",
    "Firefox",
    "火狐浏览器",
    "Safari",
    "Opera",
    // Office
    "Word",
    "Excel",
    "PowerPoint",
    "PPT",
    "Outlook",
    "OneNote",
    "WPS",
    "Access",
    // Developer tools
    "VSCode",
    "Visual Studio Code",
    "Visual Studio",
    "PyCharm",
    "IDEA",
    "IntelliJ",
    "Sublime",
    r"Notepad\+\+",
    "Git",
    "GitHub Desktop",
    "Postman",
    // Messaging
    "微信",
    "QQ",
    "钉钉",
    "飞书",
    "企业微信",
    "腾讯会议",
    "Zoom",
    "Teams",
    "Skype",
    "Discord",
    "Telegram",
    // Music
    "酷狗",
    "酷狗音乐",
    "网易云音乐",
    "QQ音乐",
    "酷我音乐",
    "Spotify",
    "Apple Music",
    // Video
    "B站",
    "哔哩哔哩",
    "腾讯视频",
    "爱奇艺",
    "优酷",
    "芒果TV",
    "抖音",
    "快手",
    "西瓜视频",
    "YouTube",
    // Shopping
    "淘宝",
    "京东",
    "拼多多",
    "支付宝",
    "美团",
    "饿了么",
    "天猫",
    "唯品会",
    "苏宁易购",
    // Maps
    "高德地图",
    "百度地图",
    "腾讯地图",
    "Google地图",
    // Social media
    "微博",
    "小红书",
    "知乎",
    "豆瓣",
    "贴吧",
    // Game launchers
    "Steam",
    "Epic",
    "WeGame",
    "Origin",
    "Uplay",
    // Misc
    "滴滴出行",
    "相机",
    "相册",
    "日历",
    "闹钟",
    "蓝牙",
    "WiFi",
    "备忘录",
    "便签",
];

/// The generic entity table, in emission order.
fn entity_table() -> Vec<(EntityType, Vec<&'static str>)> {
    vec![
        (
            EntityType::City,
            vec![
                // Municipalities
                "北京", "上海", "天津", "重庆", // Provincial capitals
                "广州", "深圳", "杭州", "成都", "西安", "武汉", "南京", "郑州", "长沙", "沈阳",
                "济南", "南宁", "福州", "长春", "哈尔滨", "合肥", "南昌", "昆明", "贵阳", "太原",
                "石家庄", "兰州", "乌鲁木齐", "呼和浩特", "西宁", "银川", "拉萨", "海口",
                // Major cities
                "苏州", "青岛", "大连", "宁波", "厦门", "三亚", "东莞", "佛山", "无锡", "温州",
                "珠海", "中山", "惠州", "烟台", "常州", "徐州", "潍坊", "绍兴", "嘉兴", "泉州",
                "漳州", "南通", "扬州", "镇江", "盐城", "连云港", "淮安", "泰州", "桂林", "柳州",
                "北海", "梧州", "玉林", "贵港", "百色", // SARs and Taiwan
                "香港", "澳门", "台北", "高雄", "台中",
            ],
        ),
        (
            EntityType::TimeWord,
            vec![
                "今天", "明天", "后天", "大后天", "昨天", "前天", "上周", "下周", "本周", "这周",
                "本月", "下月", "上个月", "今年", "明年", "去年", "早上", "上午", "中午", "下午",
                "晚上", "凌晨", "傍晚", "深夜", "半夜", "周一", "周二", "周三", "周四", "周五",
                "周六", "周日", "星期一", "星期二", "星期三", "星期四", "星期五", "星期六",
                "星期日",
            ],
        ),
        (EntityType::Number, vec![r"\d+\.?\d*"]),
        (
            EntityType::Duration,
            vec![
                r"\d+秒",
                r"\d+分钟",
                r"\d+小时",
                r"\d+天",
                r"\d+周",
                r"\d+个月",
                r"\d+年",
                "半小时",
                "一刻钟",
            ],
        ),
        (EntityType::AppName, APP_NAME_PATTERNS.to_vec()),
        (
            EntityType::FilePath,
            vec![
                r"[a-zA-Z]:\\[\w\.\s\-\\]+",
                "桌面",
                "文档",
                "下载",
                "图片",
                "音乐",
                "视频",
                "我的文档",
                "我的桌面",
                "我的下载",
            ],
        ),
        (
            EntityType::Language,
            vec![
                "英语",
                "日语",
                "韩语",
                "法语",
                "德语",
                "俄语",
                "西班牙语",
                "葡萄牙语",
                "意大利语",
                "阿拉伯语",
                "中文",
                "英文",
                "日文",
                "韩文",
            ],
        ),
        (
            EntityType::Person,
            vec![
                "周杰伦",
                "林俊杰",
                "陈奕迅",
                "邓紫棋",
                "薛之谦",
                "李荣浩",
                "毛不易",
                "华晨宇",
                "张学友",
                "刘德华",
            ],
        ),
        (
            EntityType::Song,
            vec![
                "稻香",
                "晴天",
                "七里香",
                "青花瓷",
                "告白气球",
                "夜曲",
                "简单爱",
                "双截棍",
                "东风破",
                "菊花台",
            ],
        ),
        (
            EntityType::Query,
            // Capture group 1 is the emitted value
            vec![r"(?:搜索|查一下|搜一下|帮我查)\s*(.+)"],
        ),
    ]
}

/// Pattern-table-driven entity extractor.
pub struct EntityExtractor {
    patterns: Vec<(EntityType, Regex)>,
    time_patterns: Vec<Regex>,
    skipped: usize,
}

impl EntityExtractor {
    pub fn new() -> Self {
        let mut patterns = Vec::new();
        let mut skipped = 0;

        for (entity_type, sources) in entity_table() {
            for source in sources {
                // App names match regardless of ASCII case
                let compiled = RegexBuilder::new(source)
                    .case_insensitive(entity_type == EntityType::AppName)
                    .build();
                match compiled {
                    Ok(re) => patterns.push((entity_type, re)),
                    Err(err) => {
                        warn!(pattern = source, error = %err, "skipping entity pattern");
                        skipped += 1;
                    }
                }
            }
        }

        let time_patterns = [
            r"(\d{1,2})[点时](\d{1,2})?分?",
            r"(\d{1,2}):(\d{2})",
            r"(早上|上午|中午|下午|晚上|凌晨)(\d{1,2})[点时]",
        ]
        .iter()
        .filter_map(|source| match Regex::new(source) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(pattern = source, error = %err, "skipping time pattern");
                skipped += 1;
                None
            }
        })
        .collect();

        Self {
            patterns,
            time_patterns,
            skipped,
        }
    }

    /// Patterns dropped at compile time. Zero for the shipped table.
    pub fn skipped_patterns(&self) -> usize {
        self.skipped
    }

    /// Scan normalized text and return deduplicated entities in insertion
    /// order. Pure and deterministic; never fails.
    pub fn extract(&self, text: &str) -> Vec<Entity> {
        let mut entities: Vec<Entity> = Vec::new();

        for (entity_type, regex) in &self.patterns {
            if regex.captures_len() > 1 {
                for caps in regex.captures_iter(text) {
                    if let Some(m) = caps.get(1) {
                        push_unique(&mut entities, *entity_type, m.as_str().trim());
                    }
                }
            } else {
                for m in regex.find_iter(text) {
                    push_unique(&mut entities, *entity_type, m.as_str().trim());
                }
            }
        }

        for regex in &self.time_patterns {
            for caps in regex.captures_iter(text) {
                let joined: String = caps
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str())
                    .collect();
                push_unique(&mut entities, EntityType::TimePoint, joined.trim());
            }
        }

        entities
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn push_unique(entities: &mut Vec<Entity>, entity_type: EntityType, value: &str) {
    if value.is_empty() {
        return;
    }
    let candidate = Entity::new(entity_type, value);
    if !entities.contains(&candidate) {
        entities.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(entities: &[Entity], ty: EntityType, value: &str) -> bool {
        entities.contains(&Entity::new(ty, value))
    }

    #[test]
    fn test_shipped_table_compiles_clean() {
        assert_eq!(EntityExtractor::new().skipped_patterns(), 0);
    }

    #[test]
    fn test_city_and_time_word() {
        let entities = EntityExtractor::new().extract("明天北京天气怎么样");
        assert!(has(&entities, EntityType::City, "北京"));
        assert!(has(&entities, EntityType::TimeWord, "明天"));
    }

    #[test]
    fn test_app_name_case_insensitive() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("打开vscode");
        assert!(has(&entities, EntityType::AppName, "vscode"));
    }

    #[test]
    fn test_clock_time_pass() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("明天8点30分叫我");
        assert!(has(&entities, EntityType::TimePoint, "830"));

        let entities = extractor.extract("下午3点开会");
        assert!(has(&entities, EntityType::TimePoint, "下午3"));

        let entities = extractor.extract("15:45的火车");
        assert!(has(&entities, EntityType::TimePoint, "1545"));
    }

    #[test]
    fn test_query_capture() {
        let entities = EntityExtractor::new().extract("搜索人工智能的历史");
        assert!(has(&entities, EntityType::Query, "人工智能的历史"));
    }

    #[test]
    fn test_dedup_by_type_and_value() {
        let entities = EntityExtractor::new().extract("北京,北京");
        let cities: Vec<_> = entities
            .iter()
            .filter(|e| e.entity_type == EntityType::City)
            .collect();
        assert_eq!(cities.len(), 1);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = EntityExtractor::new();
        let text = "明天下午3点在上海听周杰伦的晴天";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }
}
