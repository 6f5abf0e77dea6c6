//! IPTorrents indexer implementation
//!
//! IPTorrents is a private torrent tracker. Its category table is declared
//! inline as data and frozen into the indexer's category map at
//! construction.
//!
//! # Configuration
//!
//! Optional settings:
//! - `freeleech`: Only search for freeleech torrents
//! - `sort`: Sort order (time, size, seeders, name)

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::indexer::categories::cats;
use crate::indexer::mapping::{CategoryError, CategoryMapBuilder};
use crate::indexer::normalize::normalize_release;
use crate::indexer::{
    Indexer, IndexerType, MovieSearchParam, ReleaseInfo, SearchRequest, SiteClient,
    TorznabCapabilities, TorznabQuery, TrackerType, TvSearchParam,
};

const DEFAULT_SITE_LINK: &str = "https://iptorrents.com/";

/// Minimum seed time the site enforces (14 days)
const MINIMUM_SEED_TIME: i64 = 1_209_600;

/// Tracker category -> Torznab category table
static CATEGORY_TABLE: &[(&str, i32, &str)] = &[
    // Movies
    ("72", cats::MOVIES, "Movies"),
    ("87", cats::MOVIES_3D, "Movie/3D"),
    ("77", cats::MOVIES_SD, "Movie/480p"),
    ("101", cats::MOVIES_UHD, "Movie/4K"),
    ("89", cats::MOVIES_BLURAY, "Movie/BD-R"),
    ("90", cats::MOVIES_HD, "Movie/BD-Rip"),
    ("96", cats::MOVIES_SD, "Movie/Cam"),
    ("6", cats::MOVIES_DVD, "Movie/DVD-R"),
    ("48", cats::MOVIES_HD, "Movie/HD/Bluray"),
    ("54", cats::MOVIES, "Movie/Kids"),
    ("62", cats::MOVIES_SD, "Movie/MP4"),
    ("38", cats::MOVIES_FOREIGN, "Movie/Non-English"),
    ("68", cats::MOVIES, "Movie/Packs"),
    ("20", cats::MOVIES_WEBDL, "Movie/Web-DL"),
    ("100", cats::MOVIES_HD, "Movie/x265"),
    ("7", cats::MOVIES_SD, "Movie/Xvid"),
    // TV
    ("73", cats::TV, "TV"),
    ("26", cats::TV_DOCUMENTARY, "TV/Documentaries"),
    ("55", cats::TV_SPORT, "Sports"),
    ("78", cats::TV_SD, "TV/480p"),
    ("23", cats::TV_HD, "TV/BD"),
    ("24", cats::TV_SD, "TV/DVD-R"),
    ("25", cats::TV_SD, "TV/DVD-Rip"),
    ("66", cats::TV_SD, "TV/Mobile"),
    ("82", cats::TV_FOREIGN, "TV/Non-English"),
    ("65", cats::TV, "TV/Packs"),
    ("83", cats::TV_FOREIGN, "TV/Packs/Non-English"),
    ("79", cats::TV_SD, "TV/SD/x264"),
    ("22", cats::TV_WEBDL, "TV/Web-DL"),
    ("5", cats::TV_HD, "TV/x264"),
    ("99", cats::TV_HD, "TV/x265"),
    ("4", cats::TV_SD, "TV/Xvid"),
    // Games
    ("74", cats::CONSOLE, "Games"),
    ("2", cats::CONSOLE_OTHER, "Games/Mixed"),
    ("47", cats::CONSOLE_OTHER, "Games/Nintendo"),
    ("43", cats::PC_GAMES, "Games/PC-ISO"),
    ("45", cats::PC_GAMES, "Games/PC-Rip"),
    ("71", cats::CONSOLE_PS4, "Games/Playstation"),
    ("50", cats::CONSOLE_WII, "Games/Wii"),
    ("44", cats::CONSOLE_XBOX, "Games/Xbox"),
    // Music
    ("75", cats::AUDIO, "Music"),
    ("3", cats::AUDIO_MP3, "Music/Audio"),
    ("80", cats::AUDIO_LOSSLESS, "Music/Flac"),
    ("93", cats::AUDIO, "Music/Packs"),
    ("37", cats::AUDIO_VIDEO, "Music/Video"),
    ("21", cats::AUDIO_OTHER, "Podcast"),
    // Other
    ("76", cats::OTHER, "Miscellaneous"),
    ("60", cats::TV_ANIME, "Anime"),
    ("1", cats::PC_0DAY, "Appz"),
    ("86", cats::PC_0DAY, "Appz/Non-English"),
    ("64", cats::AUDIO_AUDIOBOOK, "AudioBook"),
    ("35", cats::BOOKS, "Books"),
    ("102", cats::BOOKS, "Books/Non-English"),
    ("94", cats::BOOKS_COMICS, "Comics"),
    ("95", cats::BOOKS_OTHER, "Educational"),
    ("98", cats::OTHER, "Fonts"),
    ("69", cats::PC_MAC, "Mac"),
    ("92", cats::BOOKS_MAGS, "Magazines / Newspapers"),
    ("58", cats::PC_MOBILE_OTHER, "Mobile"),
    ("36", cats::OTHER, "Pics/Wallpapers"),
    // XXX
    ("88", cats::XXX, "XXX"),
    ("85", cats::XXX_OTHER, "XXX/Magazines"),
    ("8", cats::XXX, "XXX/Movie"),
    ("81", cats::XXX, "XXX/Movie/0Day"),
    ("91", cats::XXX_PACK, "XXX/Packs"),
    ("84", cats::XXX_IMAGESET, "XXX/Pics/Wallpapers"),
];

/// IPTorrents indexer
pub struct IPTorrentsIndexer {
    id: String,
    name: String,
    site_link: String,
    settings: HashMap<String, String>,
    capabilities: TorznabCapabilities,
    client: Arc<dyn SiteClient>,
}

impl IPTorrentsIndexer {
    /// Create a new IPTorrents indexer instance
    pub fn new(
        site_url: Option<String>,
        settings: HashMap<String, String>,
        client: Arc<dyn SiteClient>,
    ) -> Result<Self, CategoryError> {
        let mut site_link = site_url.unwrap_or_else(|| DEFAULT_SITE_LINK.to_string());
        if !site_link.ends_with('/') {
            site_link.push('/');
        }

        Ok(Self {
            id: "iptorrents".to_string(),
            name: "IPTorrents".to_string(),
            site_link,
            settings,
            capabilities: Self::build_capabilities()?,
            client,
        })
    }

    /// Build the capabilities for IPTorrents
    fn build_capabilities() -> Result<TorznabCapabilities, CategoryError> {
        let mut builder = CategoryMapBuilder::new();
        for &(token, torznab_cat, desc) in CATEGORY_TABLE {
            builder.add_mapping(token, torznab_cat, Some(desc))?;
        }

        Ok(TorznabCapabilities {
            tv_search_params: vec![
                TvSearchParam::Q,
                TvSearchParam::Season,
                TvSearchParam::Ep,
                TvSearchParam::ImdbId,
                TvSearchParam::Genre,
            ],
            movie_search_params: vec![
                MovieSearchParam::Q,
                MovieSearchParam::ImdbId,
                MovieSearchParam::Genre,
            ],
            ..TorznabCapabilities::new(builder.build())
        })
    }

    fn setting_enabled(&self, key: &str) -> bool {
        self.settings
            .get(key)
            .map(|s| s == "true")
            .unwrap_or(false)
    }

    /// Build the search URL
    fn build_search_url(&self, query: &TorznabQuery) -> (String, Vec<String>) {
        let mut url = format!("{}t?", self.site_link);

        let tracker_cats = self.capabilities.map_torznab_to_tracker(&query.categories);
        for cat in &tracker_cats {
            url.push_str(&format!("{}=&", cat));
        }

        if self.setting_enabled("freeleech") {
            url.push_str("free=on&");
        }

        let mut search_parts = Vec::new();

        if let Some(ref imdb_id) = query.imdb_id {
            search_parts.push(format!("+({})", imdb_id));
            url.push_str("qf=all&"); // IMDB ids only appear in descriptions
        } else if let Some(ref genre) = query.genre {
            search_parts.push(format!("+({})", genre));
        }

        if let Some(ref term) = query.search_term {
            if !term.trim().is_empty() {
                let mut search_term = term.trim().to_string();

                // Season packs have no episode number to match on
                if query.season.is_some() && query.episode.is_none() {
                    search_term.push('*');
                }

                search_parts.push(format!("+({})", search_term));
            }
        }

        if let Some(ep_str) = query.get_episode_string() {
            search_parts.push(format!("+({})", ep_str));
        }

        if !search_parts.is_empty() {
            url.push_str(&format!(
                "q={}&",
                urlencoding::encode(&search_parts.join(" "))
            ));
        }

        let sort = self
            .settings
            .get("sort")
            .map(|s| s.as_str())
            .unwrap_or("time");
        url.push_str(&format!("o={}&", sort));

        if let (Some(limit), Some(offset)) = (query.limit, query.offset) {
            if limit > 0 && offset > 0 {
                let page = offset / limit + 1;
                url.push_str(&format!("p={}", page));
            }
        }

        (url.trim_end_matches('&').to_string(), tracker_cats)
    }

    /// Build the site request for a query
    pub fn build_search_request(&self, query: &TorznabQuery) -> SearchRequest {
        let (url, category_tokens) = self.build_search_url(query);
        SearchRequest {
            indexer_id: self.id.clone(),
            url,
            keywords: query.keywords(),
            category_tokens,
            referer: Some(format!("{}t", self.site_link)),
        }
    }

    /// Whether every term word appears in the title
    fn title_matches(query: &TorznabQuery, title: &str) -> bool {
        if query.imdb_id.is_some() || query.genre.is_some() {
            return true;
        }
        let Some(ref term) = query.search_term else {
            return true;
        };
        let title_lower = title.to_lowercase();
        term.to_lowercase()
            .split_whitespace()
            .all(|word| title_lower.contains(word))
    }
}

#[async_trait]
impl Indexer for IPTorrentsIndexer {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "IPTorrents is a Private site. Always a step ahead."
    }

    fn indexer_type(&self) -> IndexerType {
        IndexerType::Native
    }

    fn site_link(&self) -> &str {
        &self.site_link
    }

    fn tracker_type(&self) -> TrackerType {
        TrackerType::Private
    }

    fn language(&self) -> &str {
        "en-US"
    }

    fn capabilities(&self) -> &TorznabCapabilities {
        &self.capabilities
    }

    async fn search(&self, query: &TorznabQuery) -> Result<Vec<ReleaseInfo>> {
        let request = self.build_search_request(query);
        tracing::debug!(indexer_id = %self.id, url = %request.url, "Searching");

        let rows = self.client.fetch(&request).await?;

        let releases = rows
            .iter()
            .filter_map(|row| normalize_release(row, &self.site_link, &self.capabilities))
            .filter(|release| Self::title_matches(query, &release.title))
            .map(|release| ReleaseInfo {
                minimum_ratio: Some(1.0),
                minimum_seed_time: Some(MINIMUM_SEED_TIME),
                ..release
            })
            .collect();

        Ok(releases)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::indexer::{RawCategory, RawRelease};

    struct FixedRows(Vec<RawRelease>);

    #[async_trait]
    impl SiteClient for FixedRows {
        async fn fetch(&self, _request: &SearchRequest) -> Result<Vec<RawRelease>> {
            Ok(self.0.clone())
        }
    }

    fn indexer(settings: &[(&str, &str)], rows: Vec<RawRelease>) -> IPTorrentsIndexer {
        let settings = settings
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IPTorrentsIndexer::new(None, settings, Arc::new(FixedRows(rows))).unwrap()
    }

    #[test]
    fn test_category_mappings() {
        let indexer = indexer(&[], vec![]);
        let caps = indexer.capabilities();

        assert_eq!(caps.category_mappings().len(), CATEGORY_TABLE.len());
        assert_eq!(caps.map_tracker_to_torznab("72"), vec![cats::MOVIES]);
        assert_eq!(caps.map_tracker_desc_to_torznab("TV/x265"), vec![cats::TV_HD]);
    }

    #[test]
    fn test_search_url_tv_hd() {
        let indexer = indexer(&[], vec![]);
        let query = TorznabQuery::tv_search("Severance")
            .with_season_episode(2, Some("03"))
            .with_categories(vec![cats::TV_HD]);

        let (url, tokens) = indexer.build_search_url(&query);
        assert_eq!(tokens, vec!["23", "5", "99"]);
        assert_eq!(
            url,
            "https://iptorrents.com/t?23=&5=&99=&q=%2B%28Severance%29%20%2B%28S02E03%29&o=time"
        );
    }

    #[test]
    fn test_search_url_without_categories_lists_every_category() {
        let indexer = indexer(&[("freeleech", "true"), ("sort", "seeders")], vec![]);
        let (url, tokens) = indexer.build_search_url(&TorznabQuery::default());

        assert_eq!(tokens.len(), CATEGORY_TABLE.len());
        assert!(url.starts_with("https://iptorrents.com/t?72=&87=&"));
        assert!(url.ends_with("free=on&o=seeders"));
    }

    #[test]
    fn test_search_url_unmapped_subcategory_uses_parent() {
        let indexer = indexer(&[], vec![]);
        let query = TorznabQuery::search("x").with_categories(vec![cats::MOVIES_OTHER]);

        let (url, tokens) = indexer.build_search_url(&query);
        assert_eq!(tokens, vec!["72", "54", "68"]);
        assert!(url.starts_with("https://iptorrents.com/t?72=&54=&68=&q="));
    }

    #[test]
    fn test_search_url_pagination() {
        let indexer = indexer(&[], vec![]);
        let mut query = TorznabQuery::search("x").with_categories(vec![cats::AUDIO_LOSSLESS]);
        query.limit = Some(50);
        query.offset = Some(100);

        let (url, _) = indexer.build_search_url(&query);
        assert_eq!(url, "https://iptorrents.com/t?80=&q=%2B%28x%29&o=time&p=3");
    }

    #[tokio::test]
    async fn test_search_normalizes_and_filters_rows() {
        let rows = vec![
            RawRelease {
                title: "Severance S02E03 1080p WEB".to_string(),
                details: Some("/t/100".to_string()),
                category: Some(RawCategory::Token("5".to_string())),
                size: Some("2.1 GB".to_string()),
                seeders: Some("40".to_string()),
                leechers: Some("2".to_string()),
                ..Default::default()
            },
            RawRelease {
                title: "Unrelated Show S01E01".to_string(),
                category: Some(RawCategory::Token("5".to_string())),
                ..Default::default()
            },
        ];
        let indexer = indexer(&[], rows);

        let releases = indexer
            .search(&TorznabQuery::tv_search("severance"))
            .await
            .unwrap();

        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].guid, "https://iptorrents.com/t/100");
        assert_eq!(releases[0].categories, vec![cats::TV_HD]);
        assert_eq!(releases[0].peers, Some(42));
        assert_eq!(releases[0].minimum_seed_time, Some(MINIMUM_SEED_TIME));
    }
}
