//! Torznab API surface
//!
//! Lets Torznab clients such as Sonarr and Radarr use an indexer. The
//! transport is up to the host; [`handle`] takes the parsed query parameters
//! of one API call and produces the XML body.
//!
//! - `t=caps` - indexer capabilities
//! - `t=search&q=...` - general search
//! - `t=tvsearch&q=...&season=..&ep=..` - TV search
//! - `t=movie&q=...` - movie search

pub mod request;
pub mod response;

pub use request::TorznabRequest;
pub use response::{TorznabError, capabilities_xml, search_results_xml};

use crate::indexer::{Indexer, QueryType};

/// Answer one Torznab API call.
///
/// When `api_key` is set, the request must carry the same `apikey`.
pub async fn handle(
    indexer: &dyn Indexer,
    params: &TorznabRequest,
    api_key: Option<&str>,
) -> Result<String, TorznabError> {
    if let Some(expected) = api_key {
        if params.apikey.as_deref() != Some(expected) {
            return Err(TorznabError::unauthorized("Invalid API Key"));
        }
    }

    let query = params
        .to_query()
        .map_err(|e| TorznabError::bad_request(&e.to_string()))?;

    if query.query_type == QueryType::Caps {
        return Ok(capabilities_xml(indexer.name(), indexer.capabilities()));
    }

    if !indexer.can_handle_query(&query) {
        return Err(TorznabError::function_not_available(&format!(
            "{} is not supported by this indexer",
            query.query_type
        )));
    }

    match indexer.search(&query).await {
        Ok(releases) => Ok(search_results_xml(
            indexer.name(),
            indexer.description(),
            indexer.site_link(),
            &releases,
        )),
        Err(e) => {
            tracing::error!(
                indexer_id = indexer.id(),
                error = %e,
                "Torznab search failed"
            );
            Err(TorznabError::indexer_error(&e.to_string()))
        }
    }
}
