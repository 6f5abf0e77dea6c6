use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use anyhow::Result;
use assert_matches::assert_matches;
use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use indexarr::indexer::categories::{self, cats};
use indexarr::indexer::definitions::{
    DefinitionError, DefinitionIndexer, IndexerRegistry, bundled_definitions,
    load_definitions_dir,
};
use indexarr::indexer::{
    Indexer, IndexerType, RawCategory, RawRelease, SearchRequest, SiteClient, TorznabQuery,
};

/// Records requests and answers every one with the same rows
#[derive(Default)]
struct RecordingClient {
    requests: Mutex<Vec<SearchRequest>>,
    rows: Vec<RawRelease>,
}

#[async_trait]
impl SiteClient for RecordingClient {
    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<RawRelease>> {
        self.requests.lock().push(request.clone());
        Ok(self.rows.clone())
    }
}

const CUSTOM: &str = r#"
id: custom
name: Custom Tracker
links:
  - https://custom.example/
caps:
  categorymappings:
    - {id: "10", cat: "2040", desc: "HD"}
    - {id: "11", cat: tv/hd, desc: "Shows"}
search:
  path: search
"#;

#[test]
fn bundled_definitions_build() {
    let registry = IndexerRegistry::bundled().unwrap();

    for definition in bundled_definitions().unwrap() {
        let caps = definition.build_capabilities().unwrap();
        assert!(!caps.categories.is_empty());
        assert!(registry.definition(&definition.id).is_some());
    }
}

#[test]
fn composite_tokens_resolve_both_ways() {
    let registry = IndexerRegistry::bundled().unwrap();
    let zonaq = registry
        .create("zonaq", Arc::new(RecordingClient::default()), HashMap::new())
        .unwrap();
    let caps = zonaq.capabilities();

    assert_eq!(
        caps.categories.resolve_request_categories(&[cats::TV]),
        vec!["cat[]=2"]
    );
    assert_eq!(
        caps.map_torznab_to_tracker(&[cats::TV]),
        vec![
            "cat[]=2",
            "cat[]=2&tags=720p",
            "cat[]=2&tags=1080p",
            "cat[]=2&tags=4K",
            "cat[]=6",
            "cat[]=4",
            "cat[]=3",
        ]
    );
    assert_eq!(
        caps.map_tracker_to_torznab("cat[]=1&tags=1080p"),
        vec![cats::MOVIES_HD]
    );
    assert_eq!(
        caps.map_tracker_desc_to_torznab("Películas 1080p"),
        vec![cats::MOVIES_HD]
    );
    assert!(caps.map_tracker_desc_to_torznab("películas 1080p").is_empty());
}

#[tokio::test]
async fn definition_search_builds_request_and_normalizes_rows() {
    let client = Arc::new(RecordingClient {
        rows: vec![
            RawRelease {
                title: "Dune Part Two 2024 1080p x264".to_string(),
                details: Some("details.php?id=5".to_string()),
                download: Some("download.php/5/dune.torrent".to_string()),
                category: Some(RawCategory::Token("cat[]=19&tags=x264".to_string())),
                size: Some("12.3 GB".to_string()),
                published: Some("3 hours ago".to_string()),
                seeders: Some("17".to_string()),
                leechers: Some("1".to_string()),
                ..Default::default()
            },
            RawRelease {
                title: "Some.App.v2".to_string(),
                category: Some(RawCategory::Label("0Day".to_string())),
                ..Default::default()
            },
        ],
        ..Default::default()
    });

    let registry = IndexerRegistry::bundled().unwrap();
    let pretome = registry
        .create("pretome", client.clone(), HashMap::new())
        .unwrap();
    assert_eq!(pretome.indexer_type(), IndexerType::Definition);

    let query = TorznabQuery::movie_search("dune").with_categories(vec![cats::MOVIES_HD]);
    let releases = pretome.search(&query).await.unwrap();

    let requests = client.requests.lock().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url,
        "https://pretome.info/browse.php?sort=4&st=1&tf=all&type=desc&cat[]=19&tags=x264&search=dune"
    );
    assert_eq!(requests[0].category_tokens, vec!["cat[]=19&tags=x264"]);

    assert_eq!(releases.len(), 2);
    assert_eq!(releases[0].guid, "https://pretome.info/details.php?id=5");
    assert_eq!(releases[0].categories, vec![cats::MOVIES_HD]);
    assert_eq!(releases[0].seeders, Some(17));
    assert_eq!(releases[0].minimum_ratio, Some(1.0));
    assert_eq!(releases[0].minimum_seed_time, Some(259_200));
    assert_eq!(releases[1].categories, vec![cats::PC_0DAY, cats::PC]);
}

#[test]
fn subcategory_request_falls_back_to_parent_token() {
    let registry = IndexerRegistry::bundled().unwrap();
    let client = Arc::new(RecordingClient::default());
    let zonaq = DefinitionIndexer::new(
        registry.definition("zonaq").cloned().unwrap(),
        client,
    )
    .unwrap();

    let query = TorznabQuery::search("x").with_categories(vec![cats::MOVIES_SD]);
    assert!(zonaq.can_handle_query(&query));

    let request = zonaq.build_search_request(&query);
    assert_eq!(request.category_tokens, vec!["cat[]=1"]);
    assert_eq!(
        request.url,
        "https://www.zonaq.pw/torrents/buscar.php?orden=fecha&cat[]=1&q=x"
    );
}

#[test]
fn filtered_requests_always_carry_a_category_filter() {
    let registry = IndexerRegistry::bundled().unwrap();

    for info in registry.available() {
        let indexer = registry
            .create(&info.id, Arc::new(RecordingClient::default()), HashMap::new())
            .unwrap();
        let caps = indexer.capabilities();

        for category in categories::TORZNAB_CATEGORIES {
            let query = TorznabQuery::search("x").with_categories(vec![category.id]);
            if indexer.can_handle_query(&query) {
                assert!(
                    !caps.map_torznab_to_tracker(&query.categories).is_empty(),
                    "{} accepts {} but sends no category",
                    info.id,
                    category.name
                );
            }
        }
    }
}

#[test]
fn category_param_definitions_encode_tokens() {
    let registry = IndexerRegistry::bundled().unwrap();
    let definition = registry.definition("scenetime").cloned().unwrap();
    let scenetime = DefinitionIndexer::new(
        definition,
        Arc::new(RecordingClient::default()),
    )
    .unwrap();

    let query = TorznabQuery::tv_search("x").with_categories(vec![cats::TV_HD]);
    assert_eq!(
        scenetime.build_search_request(&query).url,
        "https://www.scenetime.com/browse.php?incldead=0&cat=2&search=x"
    );
}

#[test]
fn user_definitions_are_loaded_and_bad_files_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("custom.yml"), CUSTOM).unwrap();
    fs::write(dir.path().join("broken.yml"), "id: [unclosed").unwrap();
    fs::write(
        dir.path().join("badcat.yaml"),
        CUSTOM.replace("custom", "badcat").replace("tv/hd", "TV/Betamax"),
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "not a definition").unwrap();

    let definitions = load_definitions_dir(dir.path()).unwrap();
    let ids: Vec<_> = definitions.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["custom"]);

    let caps = definitions[0].build_capabilities().unwrap();
    assert_eq!(caps.map_tracker_to_torznab("10"), vec![cats::MOVIES_HD]);
    assert_eq!(caps.map_tracker_to_torznab("11"), vec![cats::TV_HD]);
}

#[test]
fn user_definitions_override_bundled_ones() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("zonaq.yml"),
        CUSTOM.replace("id: custom", "id: zonaq"),
    )
    .unwrap();
    fs::write(
        dir.path().join("iptorrents.yml"),
        CUSTOM.replace("id: custom", "id: iptorrents"),
    )
    .unwrap();

    let registry = IndexerRegistry::load(Some(dir.path())).unwrap();

    assert_eq!(
        registry.definition("zonaq").map(|d| d.name.as_str()),
        Some("Custom Tracker")
    );
    assert!(registry.definition("iptorrents").is_none());
    assert_eq!(
        registry.info("iptorrents").map(|i| i.indexer_type),
        Some(IndexerType::Native)
    );
}

#[test]
fn missing_definitions_dir_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    assert_matches!(load_definitions_dir(&missing), Err(DefinitionError::Io { .. }));
}

#[test]
fn unknown_indexer_type_is_an_error() {
    let registry = IndexerRegistry::bundled().unwrap();
    let result = registry.create(
        "nonexistent",
        Arc::new(RecordingClient::default()),
        HashMap::new(),
    );
    assert!(result.is_err());
}
