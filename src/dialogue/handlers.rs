//! Intent dispatch and the handler bodies.
//!
//! Dispatch is a total `match` over [`Intent`] - a missing arm is a compile
//! error, not a runtime default. Handlers never panic and never let an error
//! escape: collaborator failures become localized apology strings at this
//! boundary, and the turn continues normally.

use anyhow::Result;
use chrono::{Datelike, Local, Timelike};
use regex::Regex;
use tracing::warn;

use crate::actions::ActionCapability;
use crate::config::CoreConfig;
use crate::dialogue::session::{first_entity, PendingConfirmation, SessionContext};
use crate::nlu::{Entity, EntityType, Intent};
use crate::security::SecurityCapability;

/// Canned replies for turns nothing could interpret.
pub const DEFAULT_RESPONSES: [&str; 3] = [
    "抱歉，我不太理解您的意思。",
    "能请您再说一遍吗？",
    "我还在学习中，这个问题有点难倒我了。",
];

/// The fixed joke set.
pub const JOKES: [&str; 3] = [
    "为什么程序员总是分不清万圣节和圣诞节？因为 Oct 31 == Dec 25！",
    "有一天，代码对程序员说：我有个 bug。程序员说：别担心，我来修复你。代码说：不，我是想说，我有个 bug，我很喜欢它。",
    "为什么计算机喜欢冬天？因为它们有 Windows！",
];

/// Apps that require a confirmation before launching.
const SENSITIVE_APPS: [&str; 7] = [
    "cmd", "命令提示符", "powershell", "终端", "bash", "注册表", "regedit",
];

/// Directly recognizable app names for the last-resort scan.
const COMMON_APPS: [&str; 33] = [
    "微信", "qq", "浏览器", "chrome", "edge", "firefox", "word", "excel", "powerpoint",
    "记事本", "计算器", "画图", "酷狗音乐", "酷狗", "网易云音乐", "qq音乐", "哔哩哔哩", "b站",
    "抖音", "微博", "淘宝", "京东", "支付宝", "钉钉", "飞书", "企业微信", "腾讯会议", "zoom",
    "vscode", "pycharm", "控制面板", "任务管理器", "设置",
];

/// Folder aliases, checked in order; the first hit wins.
const FOLDER_ALIASES: [(&str, &str); 15] = [
    ("我的文档", "文档"),
    ("我的桌面", "桌面"),
    ("我的下载", "下载"),
    ("我的图片", "图片"),
    ("我的音乐", "音乐"),
    ("我的视频", "视频"),
    ("文档文件夹", "文档"),
    ("下载文件夹", "下载"),
    ("图片文件夹", "图片"),
    ("桌面", "桌面"),
    ("文档", "文档"),
    ("下载", "下载"),
    ("图片", "图片"),
    ("音乐", "音乐"),
    ("视频", "视频"),
];

const FOLDER_WORDS: [&str; 8] = [
    "文件夹", "目录", "桌面", "文档", "下载", "图片", "音乐", "视频",
];

const FILLER_PARTICLES: &str = "吧呗啊哦了呢";

const GENERIC_MUSIC_WORDS: [&str; 4] = ["音乐", "歌", "歌曲", "什么"];

/// External collaborators a handler may call.
pub struct HandlerDeps<'a> {
    pub actions: &'a dyn ActionCapability,
    pub security: &'a dyn SecurityCapability,
    pub config: &'a CoreConfig,
}

/// Compiled handler-side extraction patterns plus the dispatch entry point.
pub struct IntentDispatcher {
    music_patterns: Vec<Regex>,
    music_strip: Regex,
    folder_patterns: Vec<Regex>,
    open_patterns: Vec<Regex>,
    search_query: Regex,
    math_run: Regex,
}

impl IntentDispatcher {
    pub fn new() -> Self {
        let compile = |sources: &[&str]| -> Vec<Regex> {
            sources
                .iter()
                .map(|s| Regex::new(s).expect("handler patterns are fixed"))
                .collect()
        };

        Self {
            music_patterns: compile(&[
                r"播放\s*(.+?)(?:的歌|的音乐)?(?:吧|呗|啊)?$",
                r"听\s*(.+?)(?:的歌|的音乐)?(?:吧|呗|啊)?$",
                r"放\s*(.+?)(?:的歌|的音乐)?(?:吧|呗|啊)?$",
                r"来首\s*(.+?)(?:的歌|的音乐)?(?:吧|呗|啊)?$",
                r"我想听\s*(.+?)(?:的歌|的音乐)?(?:吧|呗|啊)?$",
                r"想听\s*(.+?)(?:的歌|的音乐)?$",
                r"播放的音乐是\s*(.+)$",
                r"想播放的音乐是\s*(.+)$",
            ]),
            music_strip: Regex::new(r"^(?:播放|我想听|想听|听|放|来首)\s*")
                .expect("handler patterns are fixed"),
            folder_patterns: compile(&[
                r"打开\s*(.+?)(?:文件夹)?(?:吧|呗|啊)?$",
                r"查看\s*(.+?)(?:文件夹)?(?:吧|呗|啊)?$",
                r"浏览\s*(.+?)(?:文件夹)?(?:吧|呗|啊)?$",
            ]),
            open_patterns: compile(&[
                r"打开\s*(.+?)(?:吧|呗|啊|哦|了)?$",
                r"启动\s*(.+?)(?:吧|呗|啊|哦|了)?$",
                r"运行\s*(.+?)(?:吧|呗|啊|哦|了)?$",
                r"开启\s*(.+?)(?:吧|呗|啊|哦|了)?$",
            ]),
            search_query: Regex::new(r"搜索(.+)").expect("handler patterns are fixed"),
            math_run: Regex::new(r"[\d+\-*/().\s]+").expect("handler patterns are fixed"),
        }
    }

    /// Route a resolved turn to its handler. Never fails, never panics.
    pub fn dispatch(
        &self,
        intent: Intent,
        input: &str,
        entities: &[Entity],
        session: &mut SessionContext,
        deps: &HandlerDeps,
    ) -> String {
        match self.route(intent, input, entities, session, deps) {
            Ok(response) => response,
            Err(err) => {
                warn!(intent = %intent, error = %err, "handler failed");
                "抱歉，处理您的请求时出了点问题，请稍后再试。".to_string()
            }
        }
    }

    fn route(
        &self,
        intent: Intent,
        input: &str,
        entities: &[Entity],
        session: &mut SessionContext,
        deps: &HandlerDeps,
    ) -> Result<String> {
        match intent {
            Intent::OpenApplication => self.handle_open_application(input, entities, session, deps),
            Intent::OpenFolder => self.handle_open_folder(input, entities, deps),
            Intent::Weather => self.handle_weather(entities, session, deps),
            Intent::Time => Ok(handle_time()),
            Intent::Date => Ok(handle_date()),
            Intent::Calculator => Ok(self.handle_calculator(input)),
            Intent::Translation => Ok("抱歉，翻译功能正在开发中".to_string()),
            Intent::News => self.handle_news(deps),
            Intent::Music => self.handle_music(input, entities, session, deps),
            Intent::SearchInternet => self.handle_search_internet(input, entities, deps),
            Intent::SearchMap => self.handle_search_map(entities, deps),
            Intent::ListFiles => self.handle_list_files(entities, deps),
            Intent::Joke => Ok(JOKES[fastrand::usize(..JOKES.len())].to_string()),
            Intent::Greeting => Ok(handle_greeting()),
            Intent::Farewell => Ok("再见，期待下次与您交流！".to_string()),
            Intent::Thanks => Ok("不客气，这是我应该做的。".to_string()),
            Intent::Praise => Ok("谢谢夸奖，我会继续努力的！".to_string()),
            Intent::Name => Ok("我是您的语音助手，很高兴为您服务！".to_string()),
            Intent::Age => Ok("我是一个程序，没有年龄，不过每天都在学习新东西。".to_string()),
            Intent::Ability => Ok(
                "我可以查天气、报时间和日期、做计算、讲笑话、播放音乐、打开应用和文件夹，还能帮您搜索信息。"
                    .to_string(),
            ),
            Intent::Mood => Ok("我状态很好，随时可以为您服务！".to_string()),
            Intent::Creator => Ok("我是开发者们精心打造的语音助手。".to_string()),
            Intent::Exit => Ok("感谢使用，再见！".to_string()),
            Intent::Unknown => Ok(default_response()),
            // Recognized but not yet backed by a handler implementation
            Intent::Alarm
            | Intent::Stock
            | Intent::Sports
            | Intent::Movie
            | Intent::Video
            | Intent::Volume
            | Intent::Brightness
            | Intent::Wifi
            | Intent::Bluetooth
            | Intent::Screenshot
            | Intent::SystemInfo
            | Intent::CreateFile
            | Intent::DeleteFile
            | Intent::Story
            | Intent::Riddle
            | Intent::Poetry
            | Intent::SmartHome
            | Intent::DressAdvice
            | Intent::Food
            | Intent::Health
            | Intent::Horoscope => {
                Ok("这个功能我还在学习中，暂时帮不上忙。".to_string())
            }
        }
    }

    fn handle_weather(
        &self,
        entities: &[Entity],
        session: &SessionContext,
        deps: &HandlerDeps,
    ) -> Result<String> {
        let city = first_entity(entities, EntityType::City)
            .map(str::to_string)
            .or_else(|| session.memory.preferred_city.clone())
            .or_else(|| {
                if session.last_intent == Some(Intent::Weather) {
                    first_entity(&session.last_entities, EntityType::City).map(str::to_string)
                } else {
                    None
                }
            })
            .unwrap_or_else(|| deps.config.default_city.clone());

        let time_hint = first_entity(entities, EntityType::TimeWord);

        match deps.actions.get_weather(&city, time_hint) {
            Ok(report) => Ok(report),
            Err(err) => {
                warn!(%city, error = %err, "weather lookup failed");
                Ok(format!("抱歉，获取{city}的天气信息失败，请稍后重试"))
            }
        }
    }

    fn handle_news(&self, deps: &HandlerDeps) -> Result<String> {
        match deps.actions.get_news() {
            Ok(news) => Ok(news),
            Err(err) => {
                warn!(error = %err, "news lookup failed");
                Ok("抱歉，获取新闻信息失败，请稍后重试".to_string())
            }
        }
    }

    fn handle_calculator(&self, input: &str) -> String {
        let normalized = normalize_math(input);
        let expression = self
            .math_run
            .find_iter(&normalized)
            .map(|m| m.as_str().trim())
            .find(|s| s.chars().any(|c| c.is_ascii_digit()));

        let Some(expression) = expression else {
            return "抱歉，我没有找到需要计算的数学表达式".to_string();
        };

        match eval_expression(expression) {
            Ok(value) => format!("计算结果是: {}", format_number(value)),
            Err(CalcError::DivisionByZero) => "抱歉，除数不能为零".to_string(),
            Err(CalcError::Malformed) => "抱歉，计算失败，请检查您的输入".to_string(),
        }
    }

    fn handle_music(
        &self,
        input: &str,
        entities: &[Entity],
        session: &SessionContext,
        deps: &HandlerDeps,
    ) -> Result<String> {
        let mut name = first_entity(entities, EntityType::Song).map(str::to_string);

        if name.is_none() {
            for pattern in &self.music_patterns {
                if let Some(caps) = pattern.captures(input) {
                    let candidate = caps
                        .get(1)
                        .map(|m| m.as_str())
                        .unwrap_or("")
                        .trim_end_matches(|c| FILLER_PARTICLES.contains(c))
                        .trim();
                    if !candidate.is_empty() && !GENERIC_MUSIC_WORDS.contains(&candidate) {
                        name = Some(candidate.to_string());
                        break;
                    }
                }
            }
        }

        // A bare follow-up inside a music conversation is itself the title
        if name.is_none() && session.last_intent == Some(Intent::Music) {
            let stripped = self.music_strip.replace(input, "");
            let candidate = stripped
                .trim_end_matches(|c| FILLER_PARTICLES.contains(c))
                .trim();
            if !candidate.is_empty() && !GENERIC_MUSIC_WORDS.contains(&candidate) {
                name = Some(candidate.to_string());
            }
        }

        let Some(name) = name else {
            return Ok("请告诉我您想要播放的音乐名称，例如：播放周杰伦的歌、听稻香".to_string());
        };

        match deps.actions.play_music(&name) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(song = %name, error = %err, "music playback failed");
                Ok(format!("抱歉，播放音乐时出错: {err}"))
            }
        }
    }

    fn handle_open_folder(
        &self,
        input: &str,
        entities: &[Entity],
        deps: &HandlerDeps,
    ) -> Result<String> {
        let mut folder = first_entity(entities, EntityType::FilePath).map(str::to_string);

        if folder.is_none() {
            folder = FOLDER_ALIASES
                .iter()
                .find(|(alias, _)| input.contains(alias))
                .map(|(_, canonical)| canonical.to_string());
        }

        if folder.is_none() {
            for pattern in &self.folder_patterns {
                if let Some(caps) = pattern.captures(input) {
                    let candidate = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim();
                    if FOLDER_WORDS.iter().any(|kw| candidate.contains(kw)) {
                        folder = Some(candidate.to_string());
                        break;
                    }
                }
            }
        }

        let Some(folder) = folder else {
            return Ok("请告诉我您想要打开的文件夹，例如：打开桌面、打开文档文件夹".to_string());
        };

        match deps.actions.open_folder(&folder) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(%folder, error = %err, "open folder failed");
                Ok(format!("抱歉，打开文件夹时出错: {err}"))
            }
        }
    }

    fn handle_open_application(
        &self,
        input: &str,
        entities: &[Entity],
        session: &mut SessionContext,
        deps: &HandlerDeps,
    ) -> Result<String> {
        let mut app = first_entity(entities, EntityType::AppName).map(str::to_string);

        if app.is_none() {
            for pattern in &self.open_patterns {
                if let Some(caps) = pattern.captures(input) {
                    let candidate = caps
                        .get(1)
                        .map(|m| m.as_str())
                        .unwrap_or("")
                        .trim_end_matches(|c| FILLER_PARTICLES.contains(c))
                        .trim();
                    if !candidate.is_empty() {
                        app = Some(candidate.to_string());
                        break;
                    }
                }
            }
        }

        if app.is_none() {
            app = COMMON_APPS
                .iter()
                .find(|known| input.contains(*known))
                .map(|known| known.to_string());
        }

        let Some(app) = app else {
            return Ok("请告诉我您想要打开的应用程序名称，例如：打开微信、打开记事本".to_string());
        };

        if !deps.security.has_permission("open_application") {
            return Ok("抱歉，当前权限不足，无法打开应用程序。".to_string());
        }

        let is_sensitive = SENSITIVE_APPS.iter().any(|s| app.to_lowercase() == *s);
        if deps.config.confirm_sensitive_ops && is_sensitive {
            let prompt = format!("确定要打开 {app} 吗？这是一个具有系统访问权限的应用程序。");
            session.pending_confirmations.push_back(PendingConfirmation {
                intent: Intent::OpenApplication,
                app_name: app.clone(),
                prompt: prompt.clone(),
            });
            return Ok(prompt);
        }

        match deps.actions.open_application(&app) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(%app, error = %err, "open application failed");
                Ok(format!("抱歉，打开应用程序时出错: {err}"))
            }
        }
    }

    fn handle_search_internet(
        &self,
        input: &str,
        entities: &[Entity],
        deps: &HandlerDeps,
    ) -> Result<String> {
        let query = first_entity(entities, EntityType::Query)
            .map(str::to_string)
            .or_else(|| {
                self.search_query
                    .captures(input)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().trim().to_string())
            });

        let Some(query) = query else {
            return Ok("请告诉我您想要搜索的内容".to_string());
        };

        match deps.actions.search_internet(&query) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(%query, error = %err, "internet search failed");
                Ok(format!("抱歉，互联网搜索时出错: {err}"))
            }
        }
    }

    fn handle_search_map(&self, entities: &[Entity], deps: &HandlerDeps) -> Result<String> {
        let Some(location) = first_entity(entities, EntityType::City) else {
            return Ok("请告诉我您想要搜索的位置".to_string());
        };

        match deps.actions.search_map(location) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(%location, error = %err, "map search failed");
                Ok(format!("抱歉，地图搜索时出错: {err}"))
            }
        }
    }

    fn handle_list_files(&self, entities: &[Entity], deps: &HandlerDeps) -> Result<String> {
        let Some(directory) = first_entity(entities, EntityType::FilePath) else {
            return Ok("请告诉我您想要查看的目录路径".to_string());
        };

        if !deps.security.has_permission("list_files") {
            return Ok("抱歉，当前权限不足，无法查看目录内容。".to_string());
        }

        match deps.actions.list_files(directory) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(%directory, error = %err, "list files failed");
                Ok(format!("抱歉，列出文件时出错: {err}"))
            }
        }
    }
}

impl Default for IntentDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_response() -> String {
    DEFAULT_RESPONSES[fastrand::usize(..DEFAULT_RESPONSES.len())].to_string()
}

fn handle_greeting() -> String {
    let hour = Local::now().hour();
    let pool: &[&str] = if hour < 12 {
        &["早上好！有什么可以帮助你的吗？", "早安！很高兴为您服务。"]
    } else if hour < 18 {
        &["下午好！有什么可以帮助你的吗？", "午安！很高兴为您服务。"]
    } else {
        &["晚上好！有什么可以帮助你的吗？", "晚安！很高兴为您服务。"]
    };
    pool[fastrand::usize(..pool.len())].to_string()
}

fn handle_time() -> String {
    format!("现在的时间是 {}", Local::now().format("%H:%M:%S"))
}

fn handle_date() -> String {
    let now = Local::now();
    let weekdays = [
        "星期一", "星期二", "星期三", "星期四", "星期五", "星期六", "星期日",
    ];
    let weekday = weekdays[now.weekday().num_days_from_monday() as usize];
    format!("今天是 {}，{}", now.format("%Y年%m月%d日"), weekday)
}

/// Map Chinese numerals and operator words to their ASCII forms.
fn normalize_math(input: &str) -> String {
    let mut text = input.to_string();
    for (cn, ascii) in [
        ("零", "0"),
        ("一", "1"),
        ("二", "2"),
        ("三", "3"),
        ("四", "4"),
        ("五", "5"),
        ("六", "6"),
        ("七", "7"),
        ("八", "8"),
        ("九", "9"),
        ("十", "10"),
        ("加", "+"),
        ("减", "-"),
        ("乘以", "*"),
        ("乘", "*"),
        ("除以", "/"),
        ("除", "/"),
        ("×", "*"),
        ("÷", "/"),
    ] {
        text = text.replace(cn, ascii);
    }
    text
}

#[derive(Debug, PartialEq, Eq)]
enum CalcError {
    DivisionByZero,
    Malformed,
}

/// Evaluate a `+ - * /` expression with parentheses and unary minus.
fn eval_expression(expr: &str) -> Result<f64, CalcError> {
    let tokens: Vec<char> = expr.chars().filter(|c| !c.is_whitespace()).collect();
    let mut parser = ExprParser { tokens, pos: 0 };
    let value = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return Err(CalcError::Malformed);
    }
    Ok(value)
}

struct ExprParser {
    tokens: Vec<char>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<char> {
        self.tokens.get(self.pos).copied()
    }

    fn expression(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                '+' => {
                    self.pos += 1;
                    value += self.term()?;
                }
                '-' => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                '*' => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                '/' => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.pos += 1;
                let value = self.expression()?;
                if self.peek() != Some(')') {
                    return Err(CalcError::Malformed);
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            _ => Err(CalcError::Malformed),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.tokens[start..self.pos].iter().collect();
        literal.parse::<f64>().map_err(|_| CalcError::Malformed)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
