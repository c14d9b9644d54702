//! The closed intent set.
//!
//! Variant declaration order mirrors the rule table's priority order; the
//! classifier walks the table in that order and the first match wins, so the
//! order here is part of the contract, not cosmetic.

/// One user request category per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    // Explicit action commands, tried before everything else
    OpenApplication,
    OpenFolder,
    // Concrete lookups
    Weather,
    Time,
    Date,
    Alarm,
    Calculator,
    Translation,
    // Information feeds
    News,
    Stock,
    Sports,
    Movie,
    Music,
    Video,
    // Search and navigation
    SearchInternet,
    SearchMap,
    // System control
    Volume,
    Brightness,
    Wifi,
    Bluetooth,
    Screenshot,
    SystemInfo,
    // File operations
    ListFiles,
    CreateFile,
    DeleteFile,
    // Small talk
    Joke,
    Story,
    Riddle,
    Poetry,
    Greeting,
    Farewell,
    Thanks,
    Praise,
    Name,
    Age,
    Ability,
    Mood,
    Creator,
    // Home and lifestyle
    SmartHome,
    DressAdvice,
    Food,
    Health,
    Horoscope,
    // Session end
    Exit,
    /// Terminal classification when nothing matched and context could not help
    Unknown,
}

impl Intent {
    /// Stable label used in the history store and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenApplication => "open_application",
            Self::OpenFolder => "open_folder",
            Self::Weather => "weather",
            Self::Time => "time",
            Self::Date => "date",
            Self::Alarm => "alarm",
            Self::Calculator => "calculator",
            Self::Translation => "translation",
            Self::News => "news",
            Self::Stock => "stock",
            Self::Sports => "sports",
            Self::Movie => "movie",
            Self::Music => "music",
            Self::Video => "video",
            Self::SearchInternet => "search_internet",
            Self::SearchMap => "search_map",
            Self::Volume => "volume",
            Self::Brightness => "brightness",
            Self::Wifi => "wifi",
            Self::Bluetooth => "bluetooth",
            Self::Screenshot => "screenshot",
            Self::SystemInfo => "system_info",
            Self::ListFiles => "list_files",
            Self::CreateFile => "create_file",
            Self::DeleteFile => "delete_file",
            Self::Joke => "joke",
            Self::Story => "story",
            Self::Riddle => "riddle",
            Self::Poetry => "poetry",
            Self::Greeting => "greeting",
            Self::Farewell => "farewell",
            Self::Thanks => "thanks",
            Self::Praise => "praise",
            Self::Name => "name",
            Self::Age => "age",
            Self::Ability => "ability",
            Self::Mood => "mood",
            Self::Creator => "creator",
            Self::SmartHome => "smart_home",
            Self::DressAdvice => "dress_advice",
            Self::Food => "food",
            Self::Health => "health",
            Self::Horoscope => "horoscope",
            Self::Exit => "exit",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a stored label back into an intent.
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.as_str() == s)
    }

    /// Every variant, in declaration (priority) order.
    pub const ALL: [Intent; 45] = [
        Self::OpenApplication,
        Self::OpenFolder,
        Self::Weather,
        Self::Time,
        Self::Date,
        Self::Alarm,
        Self::Calculator,
        Self::Translation,
        Self::News,
        Self::Stock,
        Self::Sports,
        Self::Movie,
        Self::Music,
        Self::Video,
        Self::SearchInternet,
        Self::SearchMap,
        Self::Volume,
        Self::Brightness,
        Self::Wifi,
        Self::Bluetooth,
        Self::Screenshot,
        Self::SystemInfo,
        Self::ListFiles,
        Self::CreateFile,
        Self::DeleteFile,
        Self::Joke,
        Self::Story,
        Self::Riddle,
        Self::Poetry,
        Self::Greeting,
        Self::Farewell,
        Self::Thanks,
        Self::Praise,
        Self::Name,
        Self::Age,
        Self::Ability,
        Self::Mood,
        Self::Creator,
        Self::SmartHome,
        Self::DressAdvice,
        Self::Food,
        Self::Health,
        Self::Horoscope,
        Self::Exit,
        Self::Unknown,
    ];
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
