//! # List Query Executor
//!
//! Executes one page request over a collection.
//!
//! # Execution Flow (strict order)
//!
//! 1. Resolve sort field (`-1` → `time`) and direction
//! 2. Compile the search term; a bad term fails before any storage access
//! 3. No filter: fetch only the page window, count the whole collection
//! 4. Filter: fetch the ordered collection, retain matches, count matches,
//!    slice the page
//!
//! A page starting past the end is empty, not an error.

use std::sync::Arc;

use crate::observability::Logger;
use crate::search::CompiledQueryCache;

use super::errors::{ListError, ListingResult};
use super::request::ListRequest;
use super::result::ListResult;
use super::source::RecordSource;

/// Runs list requests against a record source
pub struct ListQueryExecutor<S: RecordSource> {
    source: Arc<S>,
    cache: Arc<CompiledQueryCache>,
}

impl<S: RecordSource> ListQueryExecutor<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self::with_cache(source, Arc::new(CompiledQueryCache::default()))
    }

    pub fn with_cache(source: Arc<S>, cache: Arc<CompiledQueryCache>) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn cache(&self) -> &CompiledQueryCache {
        &self.cache
    }

    /// Execute one page request over `collection`
    pub async fn execute(&self, collection: &str, request: &ListRequest) -> ListingResult<ListResult> {
        match self.run(collection, request).await {
            Ok(result) => {
                let rows = result.rows.len().to_string();
                let total = result.total_length.to_string();
                Logger::trace(
                    "LIST_QUERY_COMPLETE",
                    &[
                        ("collection", collection),
                        ("rows", rows.as_str()),
                        ("total_length", total.as_str()),
                    ],
                );
                Ok(result)
            }
            Err(ListError::BadSearchTerm(cause)) => {
                let detail = cause.to_string();
                Logger::warn(
                    "SEARCH_REJECTED",
                    &[
                        ("collection", collection),
                        ("error", detail.as_str()),
                        ("search_term", request.search_term.as_str()),
                    ],
                );
                Err(ListError::BadSearchTerm(cause))
            }
            Err(err) => {
                let detail = err.to_string();
                let fields = [("collection", collection), ("error", detail.as_str())];
                if err.status_code() < 500 {
                    Logger::warn("LIST_QUERY_FAILED", &fields);
                } else {
                    Logger::error("LIST_QUERY_FAILED", &fields);
                }
                Err(err)
            }
        }
    }

    async fn run(&self, collection: &str, request: &ListRequest) -> ListingResult<ListResult> {
        if request.page_length == 0 {
            return Err(ListError::InvalidRequest(
                "pageLength must be greater than 0".to_string(),
            ));
        }

        let order = request.sort_spec();

        let predicate = self
            .cache
            .get_or_compile(&request.search_term)
            .map_err(ListError::BadSearchTerm)?;

        match predicate {
            None => {
                let window = request.page_start..request.page_end();
                let rows = self
                    .source
                    .fetch_ordered(collection, &order, Some(window))
                    .await?;
                let total_length = self.source.count(collection).await?;

                Ok(ListResult { rows, total_length })
            }
            Some(predicate) => {
                let ordered = self.source.fetch_ordered(collection, &order, None).await?;

                let matching: Vec<_> = ordered
                    .into_iter()
                    .filter(|record| predicate.matches(record))
                    .collect();
                let total_length = matching.len();

                let rows = matching
                    .into_iter()
                    .skip(request.page_start)
                    .take(request.page_length)
                    .collect();

                Ok(ListResult { rows, total_length })
            }
        }
    }
}
