//! # Listing Module
//!
//! Paginated, sorted, optionally filtered listings over record collections.
//!
//! ```text
//! ListRequest ──► ListQueryExecutor ──► RecordSource
//!                      │
//!                      └── CompiledQueryCache (search term → Predicate)
//! ```
//!
//! `total_length` is the number of records matching the filter (or the
//! collection size when there is no filter), never the page size.

pub mod errors;
pub mod executor;
pub mod request;
pub mod result;
pub mod sorter;
pub mod source;

pub use errors::{ListError, ListingResult, StorageError, StorageResult};
pub use executor::ListQueryExecutor;
pub use request::{ListRequest, PageLimits, DEFAULT_SORT_FIELD, UNSET_SORT_INDEX};
pub use result::ListResult;
pub use sorter::{RecordSorter, SortDirection, SortSpec};
pub use source::{InMemoryRecordSource, RecordSource, StorageFuture};
