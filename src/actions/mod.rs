//! External action collaborators.
//!
//! The core never performs network or OS work itself; handlers call through
//! [`ActionCapability`] and only ever see response text or a descriptive
//! error string. The offline implementation backs the CLI and tests with
//! canned data.

/// Failure of an external action. Always carries operator-readable text;
/// the core never inspects structured payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The collaborator is not reachable or not configured
    Unavailable(String),
    /// The collaborator ran but could not satisfy the request
    Failed(String),
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "服务不可用: {msg}"),
            Self::Failed(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ActionError {}

pub type ActionResult = Result<String, ActionError>;

/// Everything a handler may ask the outside world to do.
pub trait ActionCapability: Send + Sync {
    fn get_weather(&self, city: &str, time_hint: Option<&str>) -> ActionResult;
    fn get_news(&self) -> ActionResult;
    fn play_music(&self, name: &str) -> ActionResult;
    fn open_application(&self, app_name: &str) -> ActionResult;
    fn open_folder(&self, path: &str) -> ActionResult;
    fn list_files(&self, directory: &str) -> ActionResult;
    fn search_internet(&self, query: &str) -> ActionResult;
    fn search_map(&self, location: &str) -> ActionResult;
}

/// Canned collaborator used by the CLI and tests. No network, no OS calls;
/// responses echo their arguments so conversations still read naturally.
pub struct OfflineActions;

impl OfflineActions {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OfflineActions {
    fn default() -> Self {
        Self::new()
    }
}

const WEATHER_CONDITIONS: [&str; 4] = ["晴", "多云", "阴", "小雨"];

const HEADLINES: [&str; 3] = [
    "科技要闻：国产大模型开放平台用户数突破新高",
    "民生关注：多地启动新一轮消费补贴",
    "体育快讯：中超联赛周末迎来焦点对决",
];

impl ActionCapability for OfflineActions {
    fn get_weather(&self, city: &str, time_hint: Option<&str>) -> ActionResult {
        let condition = WEATHER_CONDITIONS[fastrand::usize(..WEATHER_CONDITIONS.len())];
        let low = fastrand::i32(15..22);
        let high = low + fastrand::i32(3..8);
        let day = time_hint.unwrap_or("今天");
        Ok(format!("{city}{day}{condition}，气温{low}到{high}度"))
    }

    fn get_news(&self) -> ActionResult {
        let mut lines = vec!["为您播报最新资讯:".to_string()];
        for (i, headline) in HEADLINES.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, headline));
        }
        Ok(lines.join("\n"))
    }

    fn play_music(&self, name: &str) -> ActionResult {
        Ok(format!("正在为您播放《{name}》"))
    }

    fn open_application(&self, app_name: &str) -> ActionResult {
        Ok(format!("已为您打开{app_name}"))
    }

    fn open_folder(&self, path: &str) -> ActionResult {
        Ok(format!("已为您打开{path}文件夹"))
    }

    fn list_files(&self, directory: &str) -> ActionResult {
        Ok(format!("{directory}目录下暂无可展示的文件"))
    }

    fn search_internet(&self, query: &str) -> ActionResult {
        Ok(format!("为您找到关于\"{query}\"的相关信息"))
    }

    fn search_map(&self, location: &str) -> ActionResult {
        Ok(format!("已在地图上为您定位{location}"))
    }
}
