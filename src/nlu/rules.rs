//! The ordered intent rule table.
//!
//! Kept as data rather than inlined conditionals so ordering and additions
//! are testable in isolation. Iteration order is the contract: several
//! intents share vocabulary and only declaration order disambiguates them,
//! so the first intent whose first matching pattern hits wins.

use regex::Regex;
use tracing::warn;

use super::intent::Intent;

/// A compiled rule pattern. Sources that fail to compile as regex degrade to
/// literal substring matching instead of being dropped.
pub struct RulePattern {
    source: String,
    matcher: Matcher,
}

enum Matcher {
    Regex(Regex),
    Literal(String),
}

impl RulePattern {
    pub fn compile(source: &str) -> Self {
        let matcher = match Regex::new(source) {
            Ok(re) => Matcher::Regex(re),
            Err(err) => {
                warn!(pattern = source, error = %err, "rule pattern fell back to literal match");
                Matcher::Literal(source.to_string())
            }
        };
        Self {
            source: source.to_string(),
            matcher,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(re) => re.is_match(text),
            Matcher::Literal(lit) => text.contains(lit.as_str()),
        }
    }

    /// The original pattern text, used as a similarity exemplar.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_literal_fallback(&self) -> bool {
        matches!(self.matcher, Matcher::Literal(_))
    }
}

/// Insertion-ordered mapping from intent to its patterns.
pub struct RuleTable {
    rules: Vec<(Intent, Vec<RulePattern>)>,
}

impl RuleTable {
    /// The shipped table. Order matters; see module docs.
    pub fn standard() -> Self {
        Self::from_pairs(STANDARD_RULES)
    }

    /// Build a table from raw pairs. Public so tests can craft reordered
    /// tables and assert that order changes the outcome.
    pub fn from_pairs(pairs: &[(Intent, &[&str])]) -> Self {
        let rules = pairs
            .iter()
            .map(|(intent, sources)| {
                let patterns = sources.iter().map(|s| RulePattern::compile(s)).collect();
                (*intent, patterns)
            })
            .collect();
        Self { rules }
    }

    /// First intent whose first matching pattern hits, in table order.
    pub fn first_match(&self, text: &str) -> Option<Intent> {
        for (intent, patterns) in &self.rules {
            if patterns.iter().any(|p| p.is_match(text)) {
                return Some(*intent);
            }
        }
        None
    }

    /// All (intent, pattern-source) pairs, for fitting the similarity model.
    pub fn exemplars(&self) -> impl Iterator<Item = (Intent, &str)> {
        self.rules
            .iter()
            .flat_map(|(intent, patterns)| patterns.iter().map(move |p| (*intent, p.source())))
    }

    /// Number of patterns that degraded to literal matching.
    pub fn literal_fallbacks(&self) -> usize {
        self.rules
            .iter()
            .flat_map(|(_, patterns)| patterns.iter())
            .filter(|p| p.is_literal_fallback())
            .count()
    }
}

/// The standard rule set, highest priority first.
pub const STANDARD_RULES: &[(Intent, &[&str])] = &[
    // Explicit action commands
    (
        Intent::OpenApplication,
        &[
            r"打开\s*.+",
            r"启动\s*.+",
            r"运行\s*.+软件",
            r"开启\s*.+",
            "帮我打开",
            "请打开",
            "能打开",
        ],
    ),
    (
        Intent::OpenFolder,
        &[
            "打开.*文件夹",
            "打开桌面",
            "打开文档",
            "打开下载",
            "打开图片",
            "打开音乐",
            "打开视频",
            "查看.*目录",
        ],
    ),
    // Concrete lookups
    (
        Intent::Weather,
        &[
            "天气", "气温", "温度", "下雨", "下雪", "晴天", "阴天", "多云", "雾霾", "空气质量",
            "紫外线", "穿什么", "带伞",
        ],
    ),
    (
        Intent::Time,
        &[
            "几点了", "几点钟", "现在时间", "现在几点", "报时", "什么时候", "多长时间",
        ],
    ),
    (
        Intent::Date,
        &[
            "几号", "星期几", "什么日期", "今天日期", "农历", "阳历", "节日", "放假",
        ],
    ),
    (
        Intent::Alarm,
        &[
            "闹钟",
            "提醒我",
            "定时",
            "倒计时",
            "计时器",
            ".*点.*叫我",
            ".*分钟后.*提醒",
        ],
    ),
    (
        Intent::Calculator,
        &[
            "计算",
            "算一下",
            r"\d+\s*[+\-*/×÷]\s*\d+",
            "等于多少",
            "多少钱",
            "汇率",
            "换算",
            "平方",
            "开方",
            "百分之",
        ],
    ),
    (
        Intent::Translation,
        &[
            "翻译", "怎么说", "什么意思", "英语", "日语", "韩语", "法语", "德语", "俄语",
            "西班牙语",
        ],
    ),
    // Information feeds
    (Intent::News, &["新闻", "资讯", "时事", "头条", "热点", "热搜"]),
    (Intent::Stock, &["股票", "股价", "大盘", "涨跌", "基金", "理财"]),
    (Intent::Sports, &["比分", "比赛", "球赛", "足球", "篮球", "赛程"]),
    (Intent::Movie, &["电影", "影片", "上映", "票房", "评分"]),
    (
        Intent::Music,
        &[
            "播放.*歌",
            "听.*歌",
            "放首歌",
            "来首歌",
            "播放音乐",
            "唱.*歌",
            "来一首",
        ],
    ),
    (Intent::Video, &["播放.*视频", "看.*视频", "放.*视频"]),
    // Search and navigation
    (
        Intent::SearchInternet,
        &[
            "搜索", "搜一下", "查一下", "百度", "谷歌", "帮我查", "了解一下", "是什么",
        ],
    ),
    (
        Intent::SearchMap,
        &[
            "地图", "导航", "怎么走", "在哪里", "路线", "距离", "多远", "附近", "周边",
        ],
    ),
    // System control
    (
        Intent::Volume,
        &[
            "音量",
            "声音",
            "大声",
            "小声",
            "静音",
            "调高音量",
            "调低音量",
            "开声音",
            "关声音",
        ],
    ),
    (Intent::Brightness, &["亮度", "屏幕亮", "调亮", "调暗"]),
    (Intent::Wifi, &["wifi", "无线网", "网络连接", "断网"]),
    (Intent::Bluetooth, &["蓝牙", "连接设备", "配对"]),
    (Intent::Screenshot, &["截图", "截屏", "屏幕截图"]),
    (
        Intent::SystemInfo,
        &[
            "系统信息", "电脑信息", "内存", "cpu", "硬盘", "电量", "存储空间",
        ],
    ),
    // File operations
    (
        Intent::ListFiles,
        &["列出文件", "文件列表", "显示文件", "有什么文件"],
    ),
    (Intent::CreateFile, &["创建文件", "新建文件", "写入文件"]),
    (Intent::DeleteFile, &["删除文件", "移除文件"]),
    // Small talk
    (
        Intent::Joke,
        &["笑话", "讲个笑话", "说个笑话", "逗我笑", "开心一下"],
    ),
    (Intent::Story, &["讲故事", "说故事", "听故事"]),
    (Intent::Riddle, &["猜谜", "谜语", "脑筋急转弯"]),
    (Intent::Poetry, &["诗", "古诗", "诗词", "念首诗"]),
    (
        Intent::Greeting,
        &[
            "你好", "您好", "嗨", "哈喽", "早上好", "晚上好", "下午好", "早安", "晚安", "中午好",
        ],
    ),
    (Intent::Farewell, &["再见", "拜拜", "回见", "下次见", "晚安"]),
    (Intent::Thanks, &["谢谢", "感谢", "多谢", "辛苦了"]),
    (Intent::Praise, &["厉害", "真棒", "不错", "很好", "太强了"]),
    (
        Intent::Name,
        &["你叫什么", "你是谁", "你的名字", "介绍.*自己"],
    ),
    (Intent::Age, &["你多大", "你几岁", "你的年龄"]),
    (
        Intent::Ability,
        &["你能做什么", "你会什么", "有什么功能", "帮助"],
    ),
    (Intent::Mood, &["你开心吗", "你心情", "你怎么样"]),
    (
        Intent::Creator,
        &["谁创造", "谁开发", "谁做的", "作者是谁"],
    ),
    // Home and lifestyle
    (
        Intent::SmartHome,
        &[
            "开灯",
            "关灯",
            "空调",
            "电视",
            "窗帘",
            "扫地机器人",
            "智能家居",
        ],
    ),
    (Intent::DressAdvice, &["穿什么", "怎么穿", "穿衣建议"]),
    (
        Intent::Food,
        &["吃什么", "美食", "餐厅", "外卖", "菜谱", "做法"],
    ),
    (Intent::Health, &["健康", "养生", "运动", "减肥", "睡眠"]),
    (Intent::Horoscope, &["星座", "运势", "今日运势"]),
    // Session end
    (Intent::Exit, &["退出", "关闭助手", "结束对话", "停止"]),
];
