//! Indexarr - Torznab indexer adapters
//!
//! Translates unified Torznab searches into per-site requests and maps site
//! categories back onto the Torznab taxonomy.

pub mod config;
pub mod indexer;
