//! A read-through cache of query results, keyed by entity and owner.
//!
//! Entries never expire on their own. Whoever performs a mutation is responsible for
//! invalidating the entries it affects.

use crate::error::Result;
use std::collections::HashMap;
use std::fmt;

/// The kinds of rows that are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Profile,
    Courses,
    Sessions,
    DutyLeave,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Profile => "profile",
            Self::Courses => "courses",
            Self::Sessions => "sessions",
            Self::DutyLeave => "duty-leave",
        })
    }
}

/// Cached results for one entity, one entry per owner.
#[derive(Debug)]
pub struct QueryCache<V> {
    entity: Entity,
    entries: HashMap<String, V>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            entries: HashMap::new(),
        }
    }

    /// Returns the cached value for `owner`, running `fetch` and caching its result on a miss.
    /// Failed fetches are not cached.
    pub fn get_or_fetch<F>(&mut self, owner: &str, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.entries.get(owner) {
            tracing::debug!(entity = %self.entity, owner, "cache hit");
            return Ok(value.clone());
        }

        tracing::debug!(entity = %self.entity, owner, "cache miss");
        let value = fetch()?;
        self.entries.insert(owner.to_string(), value.clone());
        Ok(value)
    }

    /// Drops the cached value for `owner` so the next read refetches it.
    pub fn invalidate(&mut self, owner: &str) {
        if self.entries.remove(owner).is_some() {
            tracing::debug!(entity = %self.entity, owner, "invalidated");
        }
    }

    pub fn contains(&self, owner: &str) -> bool {
        self.entries.contains_key(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;

    #[test]
    fn second_read_is_served_from_cache() {
        let mut cache = QueryCache::new(Entity::Courses);
        let fetches = Cell::new(0);
        let fetch = || {
            fetches.set(fetches.get() + 1);
            Ok(vec!["Compilers".to_string()])
        };

        assert_eq!(cache.get_or_fetch("user-1", fetch).unwrap(), ["Compilers"]);
        assert_eq!(cache.get_or_fetch("user-1", fetch).unwrap(), ["Compilers"]);
        assert_eq!(fetches.get(), 1);
    }

    #[test]
    fn owners_are_cached_separately_and_invalidated_alone() {
        let mut cache = QueryCache::new(Entity::Sessions);
        cache.get_or_fetch("user-1", || Ok(1)).unwrap();
        cache.get_or_fetch("user-2", || Ok(2)).unwrap();

        cache.invalidate("user-1");

        assert!(!cache.contains("user-1"));
        assert!(cache.contains("user-2"));
        assert_eq!(cache.get_or_fetch("user-1", || Ok(10)).unwrap(), 10);
        assert_eq!(cache.get_or_fetch("user-2", || Ok(20)).unwrap(), 2);
    }

    #[test]
    fn failed_fetches_are_not_cached() {
        let mut cache: QueryCache<u32> = QueryCache::new(Entity::Profile);
        let err = cache
            .get_or_fetch("user-1", || Err(Error::NotFound("profile")))
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert!(!cache.contains("user-1"));
    }
}
