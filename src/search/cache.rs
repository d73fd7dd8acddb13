//! Compiled query cache
//!
//! Search strings recur (paging through the same listing re-sends the same
//! term), so compiled predicates are kept keyed by the raw text. Entries are
//! immutable. When full, the oldest entry is evicted. Failed compilations
//! are never cached.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use super::compiler::{Predicate, PredicateCompiler};
use super::errors::SearchResult;
use super::parser::parse;

/// Cache statistics for observability. Passive only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, Arc<Predicate>>,
    order: VecDeque<String>,
    stats: CacheStats,
}

/// Bounded cache of compiled search predicates
#[derive(Debug)]
pub struct CompiledQueryCache {
    max_entries: usize,
    inner: Mutex<CacheInner>,
}

impl CompiledQueryCache {
    /// Create a cache holding at most `max_entries` predicates.
    /// A capacity of zero disables caching.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Compile a search string, reusing a cached predicate when present.
    ///
    /// Empty search text yields `Ok(None)` and is not cached.
    pub fn get_or_compile(&self, text: &str) -> SearchResult<Option<Arc<Predicate>>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        if let Some(hit) = self.lookup(text) {
            return Ok(Some(hit));
        }

        let predicate = match parse(text)? {
            Some(node) => Arc::new(PredicateCompiler::compile(&node)?),
            None => return Ok(None),
        };

        self.store(text, predicate.clone());
        Ok(Some(predicate))
    }

    fn lookup(&self, text: &str) -> Option<Arc<Predicate>> {
        let mut inner = self.inner.lock().ok()?;
        match inner.entries.get(text).cloned() {
            Some(hit) => {
                inner.stats.hits += 1;
                Some(hit)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    fn store(&self, text: &str, predicate: Arc<Predicate>) {
        if self.max_entries == 0 {
            return;
        }
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.entries.contains_key(text) {
            return;
        }

        while inner.entries.len() >= self.max_entries {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            inner.stats.evictions += 1;
        }

        inner.order.push_back(text.to_string());
        inner.entries.insert(text.to_string(), predicate);
    }

    /// Number of cached predicates
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner
            .lock()
            .map(|i| i.stats.clone())
            .unwrap_or_default()
    }
}

impl Default for CompiledQueryCache {
    fn default() -> Self {
        Self::new(256)
    }
}
