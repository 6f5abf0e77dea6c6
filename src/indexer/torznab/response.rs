//! Torznab XML response generation
//!
//! Generates RSS 2.0 XML with Torznab extensions.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use thiserror::Error;

use crate::indexer::categories::TORZNAB_CATEGORIES;
use crate::indexer::{MovieSearchParam, ReleaseInfo, TorznabCapabilities, TvSearchParam};

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Render the `t=caps` document for an indexer.
///
/// Only the Torznab categories the indexer maps are listed, subcategories
/// nested under their parent in taxonomy order.
pub fn capabilities_xml(title: &str, caps: &TorznabCapabilities) -> String {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write_decl(&mut writer);

    // <caps>
    writer
        .write_event(Event::Start(BytesStart::new("caps")))
        .ok();

    // <server title="..."/>
    let mut server = BytesStart::new("server");
    server.push_attribute(("title", title));
    writer.write_event(Event::Empty(server)).ok();

    // <limits default="..." max="..."/>
    if caps.limits_default.is_some() || caps.limits_max.is_some() {
        let mut limits = BytesStart::new("limits");
        if let Some(def) = caps.limits_default {
            limits.push_attribute(("default", def.to_string().as_str()));
        }
        if let Some(max) = caps.limits_max {
            limits.push_attribute(("max", max.to_string().as_str()));
        }
        writer.write_event(Event::Empty(limits)).ok();
    }

    // <searching>
    writer
        .write_event(Event::Start(BytesStart::new("searching")))
        .ok();
    write_search_element(&mut writer, "search", caps.search_available, "q");
    write_search_element(
        &mut writer,
        "tv-search",
        caps.tv_search_available(),
        &build_tv_params(caps),
    );
    write_search_element(
        &mut writer,
        "movie-search",
        caps.movie_search_available(),
        &build_movie_params(caps),
    );
    write_search_element(&mut writer, "music-search", caps.music_search_available, "q");
    write_search_element(&mut writer, "book-search", caps.book_search_available, "q");
    writer
        .write_event(Event::End(BytesEnd::new("searching")))
        .ok();

    // <categories>
    writer
        .write_event(Event::Start(BytesStart::new("categories")))
        .ok();
    write_categories(&mut writer, caps);
    writer
        .write_event(Event::End(BytesEnd::new("categories")))
        .ok();

    writer.write_event(Event::End(BytesEnd::new("caps"))).ok();

    into_string(writer)
}

/// Render search results as a Torznab RSS feed
pub fn search_results_xml(
    title: &str,
    description: &str,
    link: &str,
    releases: &[ReleaseInfo],
) -> String {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write_decl(&mut writer);

    // <rss version="2.0" xmlns:atom="..." xmlns:torznab="...">
    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", "http://www.w3.org/2005/Atom"));
    rss.push_attribute(("xmlns:torznab", "http://torznab.com/schemas/2015/feed"));
    writer.write_event(Event::Start(rss)).ok();

    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .ok();
    write_text_element(&mut writer, "title", title);
    write_text_element(&mut writer, "description", description);
    write_text_element(&mut writer, "link", link);
    write_text_element(&mut writer, "language", "en-us");

    for release in releases {
        write_release_item(&mut writer, release);
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .ok();
    writer.write_event(Event::End(BytesEnd::new("rss"))).ok();

    into_string(writer)
}

/// Torznab error response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("torznab error {code}: {description}")]
pub struct TorznabError {
    code: i32,
    description: String,
}

impl TorznabError {
    pub fn new(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::new(100, msg)
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::new(201, msg)
    }

    pub fn function_not_available(msg: &str) -> Self {
        Self::new(203, msg)
    }

    pub fn indexer_error(msg: &str) -> Self {
        Self::new(900, msg)
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn to_xml(&self) -> String {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        write_decl(&mut writer);

        let mut error = BytesStart::new("error");
        error.push_attribute(("code", self.code.to_string().as_str()));
        error.push_attribute(("description", self.description.as_str()));
        writer.write_event(Event::Empty(error)).ok();

        into_string(writer)
    }
}

// Helper functions for XML generation

fn write_decl(writer: &mut XmlWriter) {
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .ok();
}

fn into_string(writer: XmlWriter) -> String {
    String::from_utf8(writer.into_inner().into_inner()).unwrap_or_default()
}

fn write_categories(writer: &mut XmlWriter, caps: &TorznabCapabilities) {
    let mapped = caps.categories.unified_ids();

    for parent in TORZNAB_CATEGORIES.iter().filter(|c| c.is_parent()) {
        let subcats: Vec<_> = TORZNAB_CATEGORIES
            .iter()
            .filter(|c| c.parent_id == Some(parent.id) && mapped.contains(&c.id))
            .collect();

        if !mapped.contains(&parent.id) && subcats.is_empty() {
            continue;
        }

        let mut elem = BytesStart::new("category");
        elem.push_attribute(("id", parent.id.to_string().as_str()));
        elem.push_attribute(("name", parent.name));

        if subcats.is_empty() {
            writer.write_event(Event::Empty(elem)).ok();
            continue;
        }

        writer.write_event(Event::Start(elem)).ok();
        for sub in subcats {
            let mut subcat = BytesStart::new("subcat");
            subcat.push_attribute(("id", sub.id.to_string().as_str()));
            subcat.push_attribute(("name", sub.name));
            writer.write_event(Event::Empty(subcat)).ok();
        }
        writer
            .write_event(Event::End(BytesEnd::new("category")))
            .ok();
    }
}

fn write_text_element(writer: &mut XmlWriter, name: &str, text: &str) {
    writer.write_event(Event::Start(BytesStart::new(name))).ok();
    writer.write_event(Event::Text(BytesText::new(text))).ok();
    writer.write_event(Event::End(BytesEnd::new(name))).ok();
}

fn write_search_element(writer: &mut XmlWriter, name: &str, available: bool, params: &str) {
    let mut elem = BytesStart::new(name);
    elem.push_attribute(("available", if available { "yes" } else { "no" }));
    elem.push_attribute(("supportedParams", params));
    writer.write_event(Event::Empty(elem)).ok();
}

fn write_torznab_attr(writer: &mut XmlWriter, name: &str, value: &str) {
    let mut attr = BytesStart::new("torznab:attr");
    attr.push_attribute(("name", name));
    attr.push_attribute(("value", value));
    writer.write_event(Event::Empty(attr)).ok();
}

fn write_release_item(writer: &mut XmlWriter, release: &ReleaseInfo) {
    writer
        .write_event(Event::Start(BytesStart::new("item")))
        .ok();

    write_text_element(writer, "title", &release.title);
    write_text_element(writer, "guid", &release.guid);

    if let Some(ref details) = release.details {
        write_text_element(writer, "comments", details);
    }

    write_text_element(writer, "pubDate", &format_rfc2822(&release.publish_date));

    if let Some(size) = release.size {
        write_text_element(writer, "size", &size.to_string());
    }

    if let Some(ref desc) = release.description {
        write_text_element(writer, "description", desc);
    }

    // Link (download URL or magnet)
    let link = release
        .link
        .as_ref()
        .or(release.magnet_uri.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("");
    write_text_element(writer, "link", link);

    for cat in &release.categories {
        write_text_element(writer, "category", &cat.to_string());
    }

    if !link.is_empty() {
        let mut enclosure = BytesStart::new("enclosure");
        enclosure.push_attribute(("url", link));
        if let Some(size) = release.size {
            enclosure.push_attribute(("length", size.to_string().as_str()));
        }
        enclosure.push_attribute(("type", "application/x-bittorrent"));
        writer.write_event(Event::Empty(enclosure)).ok();
    }

    // Torznab attributes
    for cat in &release.categories {
        write_torznab_attr(writer, "category", &cat.to_string());
    }

    if let Some(seeders) = release.seeders {
        write_torznab_attr(writer, "seeders", &seeders.to_string());
    }

    if let Some(peers) = release.peers {
        write_torznab_attr(writer, "peers", &peers.to_string());
    }

    if let Some(size) = release.size {
        write_torznab_attr(writer, "size", &size.to_string());
    }

    if let Some(grabs) = release.grabs {
        write_torznab_attr(writer, "grabs", &grabs.to_string());
    }

    if let Some(ref magnet) = release.magnet_uri {
        write_torznab_attr(writer, "magneturl", magnet);
    }

    write_torznab_attr(
        writer,
        "downloadvolumefactor",
        &release.download_volume_factor.to_string(),
    );
    write_torznab_attr(
        writer,
        "uploadvolumefactor",
        &release.upload_volume_factor.to_string(),
    );

    if let Some(ratio) = release.minimum_ratio {
        write_torznab_attr(writer, "minimumratio", &ratio.to_string());
    }

    if let Some(seed_time) = release.minimum_seed_time {
        write_torznab_attr(writer, "minimumseedtime", &seed_time.to_string());
    }

    writer.write_event(Event::End(BytesEnd::new("item"))).ok();
}

fn build_tv_params(caps: &TorznabCapabilities) -> String {
    let mut params = vec!["q"];
    params.extend(
        caps.tv_search_params
            .iter()
            .filter(|p| **p != TvSearchParam::Q)
            .map(TvSearchParam::as_str),
    );
    params.join(",")
}

fn build_movie_params(caps: &TorznabCapabilities) -> String {
    let mut params = vec!["q"];
    params.extend(
        caps.movie_search_params
            .iter()
            .filter(|p| **p != MovieSearchParam::Q)
            .map(MovieSearchParam::as_str),
    );
    params.join(",")
}

fn format_rfc2822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::indexer::categories::cats;
    use crate::indexer::mapping::CategoryMapBuilder;

    fn caps() -> TorznabCapabilities {
        let mut builder = CategoryMapBuilder::new();
        builder.add_mapping("1", cats::MOVIES_HD, Some("HD")).unwrap();
        builder.add_mapping("2", cats::MOVIES_SD, Some("SD")).unwrap();
        builder.add_mapping("3", cats::AUDIO, Some("Music")).unwrap();
        TorznabCapabilities {
            tv_search_params: vec![TvSearchParam::Q, TvSearchParam::Season, TvSearchParam::Ep],
            ..TorznabCapabilities::new(builder.build())
        }
    }

    #[test]
    fn test_capabilities_xml_groups_mapped_categories() {
        let xml = capabilities_xml("Test", &caps());

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<server title="Test"/>"#));
        assert!(xml.contains(r#"<tv-search available="yes" supportedParams="q,season,ep"/>"#));
        assert!(xml.contains(r#"<movie-search available="no" supportedParams="q"/>"#));
        assert!(xml.contains(concat!(
            r#"<category id="2000" name="Movies">"#,
            r#"<subcat id="2030" name="Movies/SD"/>"#,
            r#"<subcat id="2040" name="Movies/HD"/>"#,
            r#"</category>"#
        )));
        assert!(xml.contains(r#"<category id="3000" name="Audio"/>"#));
        assert!(!xml.contains(r#"id="5000""#));
    }

    #[test]
    fn test_search_results_xml() {
        let mut release = ReleaseInfo::new(
            "Dune & Friends".to_string(),
            "https://site.tld/t/1".to_string(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        );
        release.link = Some("https://site.tld/dl/1".to_string());
        release.categories = vec![cats::MOVIES_HD];
        release.size = Some(1024);
        release.seeders = Some(5);
        release.download_volume_factor = 0.0;

        let xml = search_results_xml("Site", "A site", "https://site.tld/", &[release]);

        assert!(xml.contains("<title>Dune &amp; Friends</title>"));
        assert!(xml.contains("<pubDate>Wed, 01 May 2024 12:00:00 +0000</pubDate>"));
        assert!(xml.contains(
            r#"<enclosure url="https://site.tld/dl/1" length="1024" type="application/x-bittorrent"/>"#
        ));
        assert!(xml.contains(r#"<torznab:attr name="category" value="2040"/>"#));
        assert!(xml.contains(r#"<torznab:attr name="downloadvolumefactor" value="0"/>"#));
        assert!(xml.contains(r#"<torznab:attr name="uploadvolumefactor" value="1"/>"#));
    }

    #[test]
    fn test_error_xml() {
        let error = TorznabError::function_not_available("tvsearch is not supported");
        assert_eq!(error.code(), 203);
        assert_eq!(
            error.to_xml(),
            r#"<?xml version="1.0" encoding="UTF-8"?><error code="203" description="tvsearch is not supported"/>"#
        );
    }
}
