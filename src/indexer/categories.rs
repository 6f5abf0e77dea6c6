//! Unified (Torznab) category taxonomy
//!
//! Standard Torznab categories follow the Newznab numbering scheme.
//! Main categories are in thousands (1000, 2000, etc.) and subcategories
//! add tens (2010, 2020, etc.). The table is closed: adapters may only map
//! site categories onto ids defined here.

/// A Torznab category definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorznabCategory {
    pub id: i32,
    pub name: &'static str,
    pub parent_id: Option<i32>,
}

impl TorznabCategory {
    pub const fn new(id: i32, name: &'static str, parent_id: Option<i32>) -> Self {
        Self {
            id,
            name,
            parent_id,
        }
    }

    /// Check if this is a top-level category
    pub fn is_parent(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Standard Torznab categories (based on Newznab spec)
pub static TORZNAB_CATEGORIES: &[TorznabCategory] = &[
    // Console (1000)
    TorznabCategory::new(1000, "Console", None),
    TorznabCategory::new(1010, "Console/NDS", Some(1000)),
    TorznabCategory::new(1020, "Console/PSP", Some(1000)),
    TorznabCategory::new(1030, "Console/Wii", Some(1000)),
    TorznabCategory::new(1040, "Console/Xbox", Some(1000)),
    TorznabCategory::new(1050, "Console/Xbox 360", Some(1000)),
    TorznabCategory::new(1060, "Console/WiiWare", Some(1000)),
    TorznabCategory::new(1070, "Console/Xbox 360 DLC", Some(1000)),
    TorznabCategory::new(1080, "Console/PS3", Some(1000)),
    TorznabCategory::new(1090, "Console/Other", Some(1000)),
    TorznabCategory::new(1110, "Console/3DS", Some(1000)),
    TorznabCategory::new(1120, "Console/PS Vita", Some(1000)),
    TorznabCategory::new(1130, "Console/WiiU", Some(1000)),
    TorznabCategory::new(1140, "Console/Xbox One", Some(1000)),
    TorznabCategory::new(1150, "Console/PS4", Some(1000)),
    TorznabCategory::new(1180, "Console/Switch", Some(1000)),
    // Movies (2000)
    TorznabCategory::new(2000, "Movies", None),
    TorznabCategory::new(2010, "Movies/Foreign", Some(2000)),
    TorznabCategory::new(2020, "Movies/Other", Some(2000)),
    TorznabCategory::new(2030, "Movies/SD", Some(2000)),
    TorznabCategory::new(2040, "Movies/HD", Some(2000)),
    TorznabCategory::new(2045, "Movies/UHD", Some(2000)),
    TorznabCategory::new(2050, "Movies/BluRay", Some(2000)),
    TorznabCategory::new(2060, "Movies/3D", Some(2000)),
    TorznabCategory::new(2070, "Movies/DVD", Some(2000)),
    TorznabCategory::new(2080, "Movies/WEB-DL", Some(2000)),
    // Audio (3000)
    TorznabCategory::new(3000, "Audio", None),
    TorznabCategory::new(3010, "Audio/MP3", Some(3000)),
    TorznabCategory::new(3020, "Audio/Video", Some(3000)),
    TorznabCategory::new(3030, "Audio/Audiobook", Some(3000)),
    TorznabCategory::new(3040, "Audio/Lossless", Some(3000)),
    TorznabCategory::new(3050, "Audio/Other", Some(3000)),
    TorznabCategory::new(3060, "Audio/Foreign", Some(3000)),
    // PC (4000)
    TorznabCategory::new(4000, "PC", None),
    TorznabCategory::new(4010, "PC/0day", Some(4000)),
    TorznabCategory::new(4020, "PC/ISO", Some(4000)),
    TorznabCategory::new(4030, "PC/Mac", Some(4000)),
    TorznabCategory::new(4040, "PC/Mobile-Other", Some(4000)),
    TorznabCategory::new(4050, "PC/Games", Some(4000)),
    TorznabCategory::new(4060, "PC/Mobile-iOS", Some(4000)),
    TorznabCategory::new(4070, "PC/Mobile-Android", Some(4000)),
    // TV (5000)
    TorznabCategory::new(5000, "TV", None),
    TorznabCategory::new(5010, "TV/WEB-DL", Some(5000)),
    TorznabCategory::new(5020, "TV/Foreign", Some(5000)),
    TorznabCategory::new(5030, "TV/SD", Some(5000)),
    TorznabCategory::new(5040, "TV/HD", Some(5000)),
    TorznabCategory::new(5045, "TV/UHD", Some(5000)),
    TorznabCategory::new(5050, "TV/Other", Some(5000)),
    TorznabCategory::new(5060, "TV/Sport", Some(5000)),
    TorznabCategory::new(5070, "TV/Anime", Some(5000)),
    TorznabCategory::new(5080, "TV/Documentary", Some(5000)),
    // XXX (6000)
    TorznabCategory::new(6000, "XXX", None),
    TorznabCategory::new(6010, "XXX/DVD", Some(6000)),
    TorznabCategory::new(6020, "XXX/WMV", Some(6000)),
    TorznabCategory::new(6030, "XXX/XviD", Some(6000)),
    TorznabCategory::new(6040, "XXX/x264", Some(6000)),
    TorznabCategory::new(6050, "XXX/Pack", Some(6000)),
    TorznabCategory::new(6060, "XXX/ImageSet", Some(6000)),
    TorznabCategory::new(6070, "XXX/Other", Some(6000)),
    TorznabCategory::new(6080, "XXX/SD", Some(6000)),
    TorznabCategory::new(6090, "XXX/WEB-DL", Some(6000)),
    // Books (7000)
    TorznabCategory::new(7000, "Books", None),
    TorznabCategory::new(7010, "Books/Mags", Some(7000)),
    TorznabCategory::new(7020, "Books/EBook", Some(7000)),
    TorznabCategory::new(7030, "Books/Comics", Some(7000)),
    TorznabCategory::new(7040, "Books/Technical", Some(7000)),
    TorznabCategory::new(7050, "Books/Other", Some(7000)),
    TorznabCategory::new(7060, "Books/Foreign", Some(7000)),
    // Other (8000)
    TorznabCategory::new(8000, "Other", None),
    TorznabCategory::new(8010, "Other/Misc", Some(8000)),
    TorznabCategory::new(8020, "Other/Hashed", Some(8000)),
];

/// Named ids for the categories adapters reference most
pub mod cats {
    pub const CONSOLE: i32 = 1000;
    pub const MOVIES: i32 = 2000;
    pub const AUDIO: i32 = 3000;
    pub const PC: i32 = 4000;
    pub const TV: i32 = 5000;
    pub const XXX: i32 = 6000;
    pub const BOOKS: i32 = 7000;
    pub const OTHER: i32 = 8000;

    pub const CONSOLE_NDS: i32 = 1010;
    pub const CONSOLE_PSP: i32 = 1020;
    pub const CONSOLE_WII: i32 = 1030;
    pub const CONSOLE_XBOX: i32 = 1040;
    pub const CONSOLE_XBOX360: i32 = 1050;
    pub const CONSOLE_PS3: i32 = 1080;
    pub const CONSOLE_OTHER: i32 = 1090;
    pub const CONSOLE_3DS: i32 = 1110;
    pub const CONSOLE_PSVITA: i32 = 1120;
    pub const CONSOLE_WIIU: i32 = 1130;
    pub const CONSOLE_XBOX_ONE: i32 = 1140;
    pub const CONSOLE_PS4: i32 = 1150;
    pub const CONSOLE_SWITCH: i32 = 1180;

    pub const MOVIES_FOREIGN: i32 = 2010;
    pub const MOVIES_OTHER: i32 = 2020;
    pub const MOVIES_SD: i32 = 2030;
    pub const MOVIES_HD: i32 = 2040;
    pub const MOVIES_UHD: i32 = 2045;
    pub const MOVIES_BLURAY: i32 = 2050;
    pub const MOVIES_3D: i32 = 2060;
    pub const MOVIES_DVD: i32 = 2070;
    pub const MOVIES_WEBDL: i32 = 2080;

    pub const AUDIO_MP3: i32 = 3010;
    pub const AUDIO_VIDEO: i32 = 3020;
    pub const AUDIO_AUDIOBOOK: i32 = 3030;
    pub const AUDIO_LOSSLESS: i32 = 3040;
    pub const AUDIO_OTHER: i32 = 3050;
    pub const AUDIO_FOREIGN: i32 = 3060;

    pub const PC_0DAY: i32 = 4010;
    pub const PC_ISO: i32 = 4020;
    pub const PC_MAC: i32 = 4030;
    pub const PC_MOBILE_OTHER: i32 = 4040;
    pub const PC_GAMES: i32 = 4050;
    pub const PC_MOBILE_IOS: i32 = 4060;
    pub const PC_MOBILE_ANDROID: i32 = 4070;

    pub const TV_WEBDL: i32 = 5010;
    pub const TV_FOREIGN: i32 = 5020;
    pub const TV_SD: i32 = 5030;
    pub const TV_HD: i32 = 5040;
    pub const TV_UHD: i32 = 5045;
    pub const TV_OTHER: i32 = 5050;
    pub const TV_SPORT: i32 = 5060;
    pub const TV_ANIME: i32 = 5070;
    pub const TV_DOCUMENTARY: i32 = 5080;

    pub const XXX_DVD: i32 = 6010;
    pub const XXX_X264: i32 = 6040;
    pub const XXX_PACK: i32 = 6050;
    pub const XXX_IMAGESET: i32 = 6060;
    pub const XXX_OTHER: i32 = 6070;

    pub const BOOKS_MAGS: i32 = 7010;
    pub const BOOKS_EBOOK: i32 = 7020;
    pub const BOOKS_COMICS: i32 = 7030;
    pub const BOOKS_TECHNICAL: i32 = 7040;
    pub const BOOKS_OTHER: i32 = 7050;
    pub const BOOKS_FOREIGN: i32 = 7060;

    pub const OTHER_MISC: i32 = 8010;
    pub const OTHER_HASHED: i32 = 8020;
}

/// Names that trackers and definition authors commonly use for a
/// taxonomy entry but that differ from the canonical name.
static CATEGORY_ALIASES: &[(&str, i32)] = &[
    ("movies/4k", cats::MOVIES_UHD),
    ("movies/webdl", cats::MOVIES_WEBDL),
    ("tv/4k", cats::TV_UHD),
    ("tv/webdl", cats::TV_WEBDL),
    ("tv/documentaries", cats::TV_DOCUMENTARY),
    ("sports", cats::TV_SPORT),
    ("anime", cats::TV_ANIME),
    ("music", cats::AUDIO),
    ("audio/flac", cats::AUDIO_LOSSLESS),
    ("audiobook", cats::AUDIO_AUDIOBOOK),
    ("audiobooks", cats::AUDIO_AUDIOBOOK),
    ("ebooks", cats::BOOKS_EBOOK),
    ("comics", cats::BOOKS_COMICS),
    ("magazines", cats::BOOKS_MAGS),
    ("apps", cats::PC),
    ("applications", cats::PC),
    ("games", cats::CONSOLE),
];

/// Get a category by ID
pub fn get_category(id: i32) -> Option<&'static TorznabCategory> {
    TORZNAB_CATEGORIES.iter().find(|c| c.id == id)
}

/// Whether `id` is part of the taxonomy
pub fn is_known(id: i32) -> bool {
    get_category(id).is_some()
}

/// Get all subcategories for a parent category
pub fn get_subcategories(parent_id: i32) -> Vec<&'static TorznabCategory> {
    TORZNAB_CATEGORIES
        .iter()
        .filter(|c| c.parent_id == Some(parent_id))
        .collect()
}

/// Get the parent category for a given category
pub fn get_parent_category(id: i32) -> Option<&'static TorznabCategory> {
    let cat = get_category(id)?;
    cat.parent_id.and_then(get_category)
}

/// Look a category up by its name (`"Movies/HD"`), case-insensitively.
///
/// A purely numeric name is treated as an id.
pub fn find_by_name(name: &str) -> Option<&'static TorznabCategory> {
    let name = name.trim();
    if let Ok(id) = name.parse::<i32>() {
        return get_category(id);
    }

    let lowered = name.to_lowercase();
    TORZNAB_CATEGORIES
        .iter()
        .find(|c| c.name.to_lowercase() == lowered)
        .or_else(|| {
            CATEGORY_ALIASES
                .iter()
                .find(|(alias, _)| *alias == lowered)
                .and_then(|(_, id)| get_category(*id))
        })
}

/// Expand categories to include all subcategories, keeping the order in
/// which ids were requested.
///
/// E.g., [2000] -> [2000, 2010, 2020, 2030, 2040, 2045, 2050, 2060, 2070, 2080]
pub fn expand_categories(categories: &[i32]) -> Vec<i32> {
    let mut expanded: Vec<i32> = Vec::with_capacity(categories.len());

    for &cat in categories {
        if !expanded.contains(&cat) {
            expanded.push(cat);
        }

        for sub in TORZNAB_CATEGORIES.iter().filter(|c| c.parent_id == Some(cat)) {
            if !expanded.contains(&sub.id) {
                expanded.push(sub.id);
            }
        }
    }

    expanded
}
