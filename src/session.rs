use std::sync::Arc;

use crate::data::model::RelationshipTable;
use crate::data::source::RelationshipSource;
use crate::error::Result;

/// Session-scoped cache of the fetched dataset.
///
/// The table is fetched on first access and reused until [`invalidate`]
/// or [`reload`] is called. A failed fetch leaves the cache empty so the
/// next access retries.
///
/// [`invalidate`]: SessionCache::invalidate
/// [`reload`]: SessionCache::reload
pub struct SessionCache {
    source: Box<dyn RelationshipSource>,
    table: Option<Arc<RelationshipTable>>,
    fetch_count: usize,
}

impl SessionCache {
    pub fn new(source: Box<dyn RelationshipSource>) -> Self {
        Self {
            source,
            table: None,
            fetch_count: 0,
        }
    }

    /// The cached table, fetching it if needed.
    pub fn get(&mut self) -> Result<Arc<RelationshipTable>> {
        if let Some(table) = &self.table {
            return Ok(Arc::clone(table));
        }
        self.reload()
    }

    /// The cached table without triggering a fetch.
    pub fn peek(&self) -> Option<Arc<RelationshipTable>> {
        self.table.clone()
    }

    /// Drop the cached table; the next [`get`](Self::get) fetches again.
    pub fn invalidate(&mut self) {
        if self.table.take().is_some() {
            log::info!("Invalidated cached dataset from {}", self.source.describe());
        }
    }

    /// Fetch unconditionally and replace the cached table.
    pub fn reload(&mut self) -> Result<Arc<RelationshipTable>> {
        self.table = None;
        self.fetch_count += 1;
        let table = Arc::new(self.source.fetch_relationships()?);
        self.table = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Swap the source (e.g. after opening a local snapshot) and clear the cache.
    pub fn replace_source(&mut self, source: Box<dyn RelationshipSource>) {
        self.source = source;
        self.invalidate();
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// How many times the source has been asked for data.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::ViewerError;

    struct Counting {
        calls: Rc<Cell<usize>>,
        fail: bool,
    }

    impl RelationshipSource for Counting {
        fn fetch_relationships(&self) -> Result<RelationshipTable> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(ViewerError::NotAnArray)
            } else {
                Ok(RelationshipTable::default())
            }
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn cache(fail: bool) -> (SessionCache, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let source = Counting {
            calls: Rc::clone(&calls),
            fail,
        };
        (SessionCache::new(Box::new(source)), calls)
    }

    #[test]
    fn fetches_once_per_session() {
        let (mut cache, calls) = cache(false);
        assert!(cache.peek().is_none());
        cache.get().unwrap();
        cache.get().unwrap();
        assert_eq!(calls.get(), 1);
        assert!(cache.peek().is_some());
    }

    #[test]
    fn invalidate_and_reload_refetch() {
        let (mut cache, calls) = cache(false);
        cache.get().unwrap();
        cache.invalidate();
        assert!(cache.peek().is_none());
        cache.get().unwrap();
        cache.reload().unwrap();
        assert_eq!(calls.get(), 3);
        assert_eq!(cache.fetch_count(), 3);
    }

    #[test]
    fn failed_fetch_is_not_cached() {
        let (mut cache, calls) = cache(true);
        assert!(cache.get().is_err());
        assert!(cache.get().is_err());
        assert!(cache.peek().is_none());
        assert_eq!(calls.get(), 2);
    }
}
