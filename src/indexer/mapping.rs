//! Tracker category mapping engine
//!
//! Every indexer translates between the unified Torznab taxonomy and its
//! site's own category identifiers ("tokens"). Tokens are opaque strings:
//! a plain id like `"72"`, or a compound query fragment like
//! `"cat[]=19&tags=720p"`. The relation is many-to-many in both directions.
//!
//! Mappings are collected in a [`CategoryMapBuilder`] while the indexer is
//! constructed, then frozen into a [`CategoryMap`]. The frozen map has no
//! mutating API and is shared behind an `Arc`, so any number of searches can
//! resolve categories concurrently without locking.
//!
//! # Example
//!
//! ```
//! use indexarr::indexer::categories::cats;
//! use indexarr::indexer::mapping::{CategoryMapBuilder, CategoryRef};
//!
//! let mut builder = CategoryMapBuilder::new();
//! builder.add_mapping("7", cats::TV_SD, Some("TV/SD")).unwrap();
//! builder.add_mapping("7", cats::TV_HD, None).unwrap();
//! builder.add_mapping("8", cats::TV, Some("TV")).unwrap();
//! let map = builder.build();
//!
//! assert_eq!(map.resolve_request_categories(&[cats::TV_SD]), vec!["7"]);
//! assert_eq!(map.resolve_request_categories(&[]), vec!["7", "8"]);
//! assert_eq!(
//!     map.resolve_result_categories(CategoryRef::Token("7")),
//!     vec![cats::TV_SD, cats::TV_HD]
//! );
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::categories::{self, cats};

/// A mapping from tracker-specific category to Torznab standard category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMapping {
    /// The tracker's category token
    pub tracker_id: String,
    /// The Torznab standard category ID
    pub torznab_cat: i32,
    /// Text the tracker shows for this category, if it reports text instead of ids
    pub description: Option<String>,
}

impl CategoryMapping {
    pub fn new(tracker_id: impl Into<String>, torznab_cat: i32, desc: impl Into<String>) -> Self {
        Self {
            tracker_id: tracker_id.into(),
            torznab_cat,
            description: Some(desc.into()),
        }
    }

    pub fn without_description(tracker_id: impl Into<String>, torznab_cat: i32) -> Self {
        Self {
            tracker_id: tracker_id.into(),
            torznab_cat,
            description: None,
        }
    }
}

/// Errors raised while building a category map.
///
/// These only occur at indexer construction time and always indicate a
/// mistake in a mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    #[error(
        "category mapping for tracker category '{tracker_id}' references unknown Torznab category {torznab_cat}"
    )]
    UnknownCategory { tracker_id: String, torznab_cat: i32 },

    #[error("unknown Torznab category name '{0}'")]
    UnknownCategoryName(String),
}

/// A category value reported by a tracker for a single result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryRef<'a> {
    /// The tracker's category token, e.g. the `72` in `?72`
    Token(&'a str),
    /// Human readable category text, matched verbatim
    Label(&'a str),
}

/// Mutable mapping table, used while an indexer is being constructed
#[derive(Debug, Default)]
pub struct CategoryMapBuilder {
    entries: Vec<CategoryMapping>,
    tokens: Vec<String>,
    token_positions: HashMap<String, usize>,
    forward: HashMap<i32, Vec<usize>>,
    by_token: HashMap<String, Vec<i32>>,
    by_label: HashMap<String, Vec<i32>>,
}

impl CategoryMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one `token -> torznab_cat` association.
    ///
    /// Adding a pair that already exists is a no-op (apart from registering
    /// a label the earlier call did not have). Fails if `torznab_cat` is not
    /// part of the taxonomy.
    pub fn add_mapping(
        &mut self,
        token: impl Into<String>,
        torznab_cat: i32,
        label: Option<&str>,
    ) -> Result<(), CategoryError> {
        let token = token.into();

        if !categories::is_known(torznab_cat) {
            return Err(CategoryError::UnknownCategory {
                tracker_id: token,
                torznab_cat,
            });
        }

        if let Some(label) = label {
            push_distinct(self.by_label.entry(label.to_string()).or_default(), torznab_cat);
        }

        let position = match self.token_positions.get(&token) {
            Some(&position) => position,
            None => {
                let position = self.tokens.len();
                self.tokens.push(token.clone());
                self.token_positions.insert(token.clone(), position);
                position
            }
        };

        let ids = self.by_token.entry(token.clone()).or_default();
        if ids.contains(&torznab_cat) {
            if let Some(label) = label {
                if let Some(entry) = self
                    .entries
                    .iter_mut()
                    .find(|e| e.tracker_id == token && e.torznab_cat == torznab_cat)
                {
                    entry.description.get_or_insert_with(|| label.to_string());
                }
            }
            return Ok(());
        }
        ids.push(torznab_cat);

        push_distinct(self.forward.entry(torznab_cat).or_default(), position);

        self.entries.push(CategoryMapping {
            tracker_id: token,
            torznab_cat,
            description: label.map(str::to_string),
        });

        Ok(())
    }

    /// Map one Torznab category onto several tracker tokens, in order
    pub fn add_multi_mapping<I, T>(&mut self, torznab_cat: i32, tokens: I) -> Result<(), CategoryError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for token in tokens {
            self.add_mapping(token, torznab_cat, None)?;
        }
        Ok(())
    }

    /// Add every entry of a declarative table, stopping at the first bad one
    pub fn add_entries(&mut self, entries: &[CategoryMapping]) -> Result<(), CategoryError> {
        for entry in entries {
            self.add_mapping(
                entry.tracker_id.as_str(),
                entry.torznab_cat,
                entry.description.as_deref(),
            )?;
        }
        Ok(())
    }

    /// Freeze the table
    pub fn build(self) -> CategoryMap {
        tracing::debug!(
            tokens = self.tokens.len(),
            mappings = self.entries.len(),
            labels = self.by_label.len(),
            "Built category map"
        );

        CategoryMap {
            inner: Arc::new(CategoryMapInner {
                entries: self.entries.into_boxed_slice(),
                tokens: self.tokens.into_boxed_slice(),
                forward: self
                    .forward
                    .into_iter()
                    .map(|(id, positions)| (id, positions.into_boxed_slice()))
                    .collect(),
                by_token: freeze_index(self.by_token),
                by_label: freeze_index(self.by_label),
            }),
        }
    }
}

#[derive(Debug, Default)]
struct CategoryMapInner {
    entries: Box<[CategoryMapping]>,
    tokens: Box<[String]>,
    forward: HashMap<i32, Box<[usize]>>,
    by_token: HashMap<String, Box<[i32]>>,
    by_label: HashMap<String, Box<[i32]>>,
}

/// Immutable, shareable category map of one indexer
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    inner: Arc<CategoryMapInner>,
}

impl CategoryMap {
    /// Build a frozen map straight from a declarative table
    pub fn from_entries(entries: &[CategoryMapping]) -> Result<Self, CategoryError> {
        let mut builder = CategoryMapBuilder::new();
        builder.add_entries(entries)?;
        Ok(builder.build())
    }

    /// Tracker tokens to submit for the requested Torznab categories.
    ///
    /// An empty request means "no filter" and yields every known token.
    /// Requested ids without a mapping are skipped. Tokens come out once
    /// each, in the order the requested ids first reach them.
    pub fn resolve_request_categories(&self, requested: &[i32]) -> Vec<String> {
        if requested.is_empty() {
            return self.inner.tokens.to_vec();
        }
        self.collect_tokens(requested)
    }

    /// Like [`resolve_request_categories`](Self::resolve_request_categories),
    /// but a parent category also selects the tokens of its subcategories,
    /// and a subcategory nothing maps falls back to its parent's tokens.
    ///
    /// Every id for which [`supports`](Self::supports) is true contributes
    /// at least one token, so a non-empty request never turns into an
    /// unfiltered one.
    pub fn resolve_request_categories_expanded(&self, requested: &[i32]) -> Vec<String> {
        if requested.is_empty() {
            return self.inner.tokens.to_vec();
        }

        let mut ids = Vec::with_capacity(requested.len());
        for &id in requested {
            let group = categories::expand_categories(&[id]);
            if group.iter().any(|cat| self.inner.forward.contains_key(cat)) {
                for cat in group {
                    push_distinct(&mut ids, cat);
                }
            } else if let Some(parent) = categories::get_parent_category(id) {
                push_distinct(&mut ids, parent.id);
            }
        }

        self.collect_tokens(&ids)
    }

    fn collect_tokens(&self, ids: &[i32]) -> Vec<String> {
        let mut seen = vec![false; self.inner.tokens.len()];
        let mut tokens = Vec::new();

        for id in ids {
            let Some(positions) = self.inner.forward.get(id) else {
                continue;
            };
            for &position in positions.iter() {
                if !seen[position] {
                    seen[position] = true;
                    tokens.push(self.inner.tokens[position].clone());
                }
            }
        }

        tokens
    }

    /// Torznab categories for a tracker-reported category.
    ///
    /// Unknown tokens and labels yield an empty list.
    pub fn resolve_result_categories(&self, category: CategoryRef<'_>) -> Vec<i32> {
        let index = match category {
            CategoryRef::Token(_) => &self.inner.by_token,
            CategoryRef::Label(_) => &self.inner.by_label,
        };
        let key = match category {
            CategoryRef::Token(key) | CategoryRef::Label(key) => key,
        };

        index.get(key).map(|ids| ids.to_vec()).unwrap_or_default()
    }

    /// Same as [`resolve_result_categories`](Self::resolve_result_categories),
    /// falling back to `Other` for anything unmapped
    pub fn resolve_result_categories_or_other(&self, category: CategoryRef<'_>) -> Vec<i32> {
        let ids = self.resolve_result_categories(category);
        if ids.is_empty() {
            tracing::debug!(?category, "Unmapped tracker category");
            vec![cats::OTHER]
        } else {
            ids
        }
    }

    pub fn resolve_token(&self, token: &str) -> Vec<i32> {
        self.resolve_result_categories(CategoryRef::Token(token))
    }

    pub fn resolve_label(&self, label: &str) -> Vec<i32> {
        self.resolve_result_categories(CategoryRef::Label(label))
    }

    /// Every token, in the order it was first mapped
    pub fn tokens(&self) -> &[String] {
        &self.inner.tokens
    }

    /// Every distinct `(token, category)` pair, in insertion order
    pub fn entries(&self) -> &[CategoryMapping] {
        &self.inner.entries
    }

    /// Distinct Torznab categories this map can produce, in insertion order
    pub fn unified_ids(&self) -> Vec<i32> {
        let mut ids = Vec::new();
        for entry in self.inner.entries.iter() {
            push_distinct(&mut ids, entry.torznab_cat);
        }
        ids
    }

    /// Whether a search in `torznab_cat` can be served.
    ///
    /// True for a direct mapping, a mapped subcategory, or a mapped parent.
    pub fn supports(&self, torznab_cat: i32) -> bool {
        if self.inner.forward.contains_key(&torznab_cat) {
            return true;
        }
        if categories::get_subcategories(torznab_cat)
            .iter()
            .any(|sub| self.inner.forward.contains_key(&sub.id))
        {
            return true;
        }
        categories::get_parent_category(torznab_cat)
            .is_some_and(|parent| self.inner.forward.contains_key(&parent.id))
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

impl Serialize for CategoryMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.entries.serialize(serializer)
    }
}

fn push_distinct<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if !values.contains(&value) {
        values.push(value);
    }
}

fn freeze_index(index: HashMap<String, Vec<i32>>) -> HashMap<String, Box<[i32]>> {
    index
        .into_iter()
        .map(|(key, ids)| (key, ids.into_boxed_slice()))
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    fn scenario() -> CategoryMap {
        let mut builder = CategoryMapBuilder::new();
        builder.add_mapping("7", cats::TV_SD, Some("TV/SD")).unwrap();
        builder.add_mapping("7", cats::TV_HD, Some("TV/HD")).unwrap();
        builder.add_mapping("8", cats::TV, Some("TV")).unwrap();
        builder.build()
    }

    #[test]
    fn test_forward_resolution() {
        let map = scenario();
        assert_eq!(map.resolve_request_categories(&[cats::TV_SD]), vec!["7"]);
        assert_eq!(map.resolve_request_categories(&[cats::TV]), vec!["8"]);
    }

    #[test]
    fn test_empty_request_means_all_tokens() {
        let map = scenario();
        assert_eq!(map.resolve_request_categories(&[]), vec!["7", "8"]);
        assert_eq!(map.resolve_request_categories_expanded(&[]), vec!["7", "8"]);
    }

    #[test]
    fn test_reverse_resolution_keeps_insertion_order() {
        let map = scenario();
        assert_eq!(map.resolve_token("7"), vec![cats::TV_SD, cats::TV_HD]);
        assert_eq!(map.resolve_token("8"), vec![cats::TV]);
    }

    #[test]
    fn test_every_added_pair_resolves_back() {
        let map = scenario();
        for entry in map.entries() {
            assert!(map.resolve_token(&entry.tracker_id).contains(&entry.torznab_cat));
        }
    }

    #[test]
    fn test_reverse_resolution_by_label() {
        let map = scenario();
        assert_eq!(map.resolve_label("TV/HD"), vec![cats::TV_HD]);
        // Labels are matched verbatim
        assert!(map.resolve_label("tv/hd").is_empty());
        assert!(map.resolve_label(" TV/HD").is_empty());
    }

    #[test]
    fn test_duplicate_mapping_is_idempotent() {
        let mut once = CategoryMapBuilder::new();
        once.add_mapping("1", cats::MOVIES, None).unwrap();
        let once = once.build();

        let mut twice = CategoryMapBuilder::new();
        twice.add_mapping("1", cats::MOVIES, None).unwrap();
        twice.add_mapping("1", cats::MOVIES, None).unwrap();
        let twice = twice.build();

        assert_eq!(once.resolve_request_categories(&[]), twice.resolve_request_categories(&[]));
        assert_eq!(
            once.resolve_request_categories(&[cats::MOVIES]),
            twice.resolve_request_categories(&[cats::MOVIES])
        );
        assert_eq!(once.resolve_token("1"), twice.resolve_token("1"));
        assert_eq!(twice.len(), 1);
    }

    #[test]
    fn test_duplicate_pair_registers_new_label() {
        let mut builder = CategoryMapBuilder::new();
        builder.add_mapping("1", cats::MOVIES, None).unwrap();
        builder.add_mapping("1", cats::MOVIES, Some("Films")).unwrap();
        let map = builder.build();

        assert_eq!(map.resolve_label("Films"), vec![cats::MOVIES]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.entries()[0].description.as_deref(), Some("Films"));
    }

    #[test]
    fn test_one_token_many_categories() {
        let mut builder = CategoryMapBuilder::new();
        builder.add_mapping("X", cats::MOVIES_HD, None).unwrap();
        builder.add_mapping("X", cats::TV_HD, None).unwrap();
        let map = builder.build();

        assert_eq!(map.resolve_token("X"), vec![cats::MOVIES_HD, cats::TV_HD]);
        assert_eq!(map.resolve_request_categories(&[cats::MOVIES_HD, cats::TV_HD]), vec!["X"]);
    }

    #[test]
    fn test_multi_mapping_keeps_token_order() {
        let mut builder = CategoryMapBuilder::new();
        builder
            .add_multi_mapping(cats::AUDIO, ["A", "B", "C"])
            .unwrap();
        let map = builder.build();

        assert_eq!(map.resolve_request_categories(&[cats::AUDIO]), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_first_seen_order_across_requested_ids() {
        let mut builder = CategoryMapBuilder::new();
        builder.add_mapping("m1", cats::MOVIES_HD, None).unwrap();
        builder.add_mapping("t1", cats::TV_HD, None).unwrap();
        builder.add_mapping("shared", cats::MOVIES_HD, None).unwrap();
        builder.add_mapping("shared", cats::TV_HD, None).unwrap();
        let map = builder.build();

        assert_eq!(
            map.resolve_request_categories(&[cats::TV_HD, cats::MOVIES_HD]),
            vec!["t1", "shared", "m1"]
        );
        assert_eq!(
            map.resolve_request_categories(&[cats::MOVIES_HD, cats::TV_HD]),
            vec!["m1", "shared", "t1"]
        );
    }

    #[test]
    fn test_unmapped_lookups_are_empty() {
        let map = scenario();
        assert!(map.resolve_request_categories(&[cats::BOOKS]).is_empty());
        assert!(map.resolve_request_categories(&[9999]).is_empty());
        assert!(map.resolve_token("unknown-token").is_empty());
        assert_eq!(
            map.resolve_result_categories_or_other(CategoryRef::Token("unknown-token")),
            vec![cats::OTHER]
        );
    }

    #[test]
    fn test_unknown_category_fails_fast() {
        let mut builder = CategoryMapBuilder::new();
        let err = builder.add_mapping("5", 2041, None).unwrap_err();
        assert_matches!(
            err,
            CategoryError::UnknownCategory { ref tracker_id, torznab_cat: 2041 } if tracker_id == "5"
        );
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_expanded_request_includes_subcategories() {
        let mut builder = CategoryMapBuilder::new();
        builder.add_mapping("hd", cats::MOVIES_HD, None).unwrap();
        builder.add_mapping("sd", cats::MOVIES_SD, None).unwrap();
        builder.add_mapping("tv", cats::TV, None).unwrap();
        let map = builder.build();

        assert!(map.resolve_request_categories(&[cats::MOVIES]).is_empty());
        assert_eq!(
            map.resolve_request_categories_expanded(&[cats::MOVIES]),
            vec!["sd", "hd"]
        );
    }

    #[test]
    fn test_expanded_request_falls_back_to_parent() {
        let mut builder = CategoryMapBuilder::new();
        builder.add_mapping("movies", cats::MOVIES, None).unwrap();
        builder.add_mapping("hd", cats::MOVIES_HD, None).unwrap();
        builder.add_mapping("tv", cats::TV, None).unwrap();
        let map = builder.build();

        assert!(map.resolve_request_categories(&[cats::MOVIES_SD]).is_empty());
        assert_eq!(
            map.resolve_request_categories_expanded(&[cats::MOVIES_SD]),
            vec!["movies"]
        );
        assert_eq!(
            map.resolve_request_categories_expanded(&[cats::MOVIES_HD, cats::TV_ANIME]),
            vec!["hd", "tv"]
        );
        // Nothing to fall back to
        assert!(map.resolve_request_categories_expanded(&[cats::AUDIO_MP3]).is_empty());
    }

    #[test]
    fn test_supported_categories_always_resolve_to_tokens() {
        let mut builder = CategoryMapBuilder::new();
        builder.add_mapping("movies", cats::MOVIES, None).unwrap();
        builder.add_mapping("hd", cats::TV_HD, None).unwrap();
        let map = builder.build();

        for category in categories::TORZNAB_CATEGORIES {
            assert_eq!(
                map.supports(category.id),
                !map.resolve_request_categories_expanded(&[category.id]).is_empty(),
                "{}",
                category.name
            );
        }
    }

    #[test]
    fn test_supports_parent_and_child() {
        let mut builder = CategoryMapBuilder::new();
        builder.add_mapping("hd", cats::MOVIES_HD, None).unwrap();
        builder.add_mapping("tv", cats::TV, None).unwrap();
        let map = builder.build();

        assert!(map.supports(cats::MOVIES_HD));
        assert!(map.supports(cats::MOVIES));
        assert!(map.supports(cats::TV_ANIME));
        assert!(!map.supports(cats::MOVIES_SD));
        assert!(!map.supports(cats::AUDIO));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let map = scenario();
        let first = map.resolve_request_categories(&[cats::TV, cats::TV_SD]);
        for _ in 0..10 {
            assert_eq!(map.resolve_request_categories(&[cats::TV, cats::TV_SD]), first);
        }
        assert_eq!(map.unified_ids(), vec![cats::TV_SD, cats::TV_HD, cats::TV]);
    }

    #[test]
    fn test_frozen_map_is_shared_across_threads() {
        let map = scenario();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let map = map.clone();
                std::thread::spawn(move || map.resolve_request_categories(&[]))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec!["7", "8"]);
        }
    }
}
