// Copyright 2024 The ShaleKV Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use static_assertions::assert_impl_all;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, TxnError};
use crate::protos::KeyRange;

/// Read-only view of one shard: a contiguous key range served by a replica
/// group. `epoch` versions the geometry and is bumped on split/merge.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub id: u64,
    pub epoch: u64,
    pub range: KeyRange,
    pub leader: String,
}

impl Region {
    pub fn contains(&self, key: &[u8]) -> bool {
        self.range.contains(key)
    }

    fn overlaps(&self, other: &Region) -> bool {
        let before = !other.range.end.is_empty() && self.range.start.as_slice() >= other.range.end.as_slice();
        let after = !self.range.end.is_empty() && other.range.start.as_slice() >= self.range.end.as_slice();
        !(before || after)
    }
}

/// Seam to the meta service that owns region geometry. The cache refreshes
/// through it on misses; its internals (watches, leases) are not this
/// crate's concern.
#[async_trait]
pub trait RegionSource: Send + Sync + 'static {
    /// Region whose range contains `key`, if any.
    async fn region_by_key(&self, key: &[u8]) -> std::result::Result<Option<Region>, tonic::Status>;

    /// First region whose range overlaps `[start, end)`, if any.
    async fn region_between(&self, start: &[u8], end: &[u8]) -> std::result::Result<Option<Region>, tonic::Status>;
}

/// Process-wide cache mapping keys to regions, keyed by range start.
///
/// Lookups are epoch-monotonic: a cached region is only evicted by an
/// overlapping region carrying an equal or newer epoch, so an observed split
/// is never rolled back by a stale fetch.
pub struct RouterCache {
    source: Arc<dyn RegionSource>,
    regions: RwLock<BTreeMap<Vec<u8>, Region>>,
}

assert_impl_all!(RouterCache: Send, Sync);

impl RouterCache {
    pub fn new(source: Arc<dyn RegionSource>) -> Self {
        Self { source, regions: RwLock::new(BTreeMap::new()) }
    }

    fn cached_containing(regions: &BTreeMap<Vec<u8>, Region>, key: &[u8]) -> Option<Region> {
        regions
            .range::<[u8], _>((Bound::Unbounded, Bound::Included(key)))
            .next_back()
            .map(|(_, region)| region)
            .filter(|r| r.contains(key))
            .cloned()
    }

    fn insert(regions: &mut BTreeMap<Vec<u8>, Region>, region: Region) -> Region {
        let stale = regions
            .values()
            .any(|cached| cached.id == region.id && cached.overlaps(&region) && cached.epoch > region.epoch);
        if stale {
            debug!("dropping fetched region {} epoch {}: cache is newer", region.id, region.epoch);
            return Self::cached_containing(regions, &region.range.start).unwrap_or(region);
        }
        regions.retain(|_, cached| !cached.overlaps(&region));
        regions.insert(region.range.start.clone(), region.clone());
        region
    }

    pub async fn lookup_region_by_key(&self, key: &[u8]) -> Result<Region> {
        if let Some(region) = Self::cached_containing(&*self.regions.read().await, key) {
            return Ok(region);
        }
        match self.source.region_by_key(key).await? {
            None => Err(TxnError::RegionNotFound { key: key.to_vec() }),
            Some(region) => Ok(Self::insert(&mut *self.regions.write().await, region)),
        }
    }

    /// Any region overlapping `[start, end)`, preferring the one that owns
    /// `start`. `None` means the whole range is a gap.
    pub async fn lookup_region_between(&self, start: &[u8], end: &[u8]) -> Result<Option<Region>> {
        {
            let regions = self.regions.read().await;
            if let Some(region) = Self::cached_containing(&regions, start) {
                return Ok(Some(region));
            }
            if let Some((_, region)) =
                regions.range::<[u8], _>((Bound::Included(start), Bound::Excluded(end))).next()
            {
                return Ok(Some(region.clone()));
            }
        }
        match self.source.region_between(start, end).await? {
            None => Ok(None),
            Some(region) => Ok(Some(Self::insert(&mut *self.regions.write().await, region))),
        }
    }

    pub async fn invalidate(&self, region_id: u64) {
        self.regions.write().await.retain(|_, region| region.id != region_id);
    }

    /// Applies a not-leader hint without touching the cached geometry.
    pub async fn update_leader(&self, region_id: u64, leader: impl Into<String>) {
        let leader = leader.into();
        let mut regions = self.regions.write().await;
        for region in regions.values_mut().filter(|region| region.id == region_id) {
            region.leader = leader.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assertor::*;

    use super::*;

    struct StaticSource {
        regions: Vec<Region>,
        fetches: AtomicUsize,
    }

    impl StaticSource {
        fn new(regions: Vec<Region>) -> Self {
            Self { regions, fetches: AtomicUsize::new(0) }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RegionSource for StaticSource {
        async fn region_by_key(&self, key: &[u8]) -> std::result::Result<Option<Region>, tonic::Status> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.regions.iter().find(|region| region.contains(key)).cloned())
        }

        async fn region_between(&self, start: &[u8], end: &[u8]) -> std::result::Result<Option<Region>, tonic::Status> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .regions
                .iter()
                .find(|region| region.range.start.as_slice() < end && region.range.end.as_slice() > start)
                .cloned())
        }
    }

    fn region(id: u64, epoch: u64, start: &[u8], end: &[u8]) -> Region {
        Region { id, epoch, range: KeyRange::new(start.to_vec(), end.to_vec()), leader: format!("node-{id}") }
    }

    #[tokio::test]
    async fn test_lookup_caches() {
        let source = Arc::new(StaticSource::new(vec![region(1, 1, b"a", b"m"), region(2, 1, b"m", b"z")]));
        let cache = RouterCache::new(source.clone());

        let found = cache.lookup_region_by_key(b"b").await.unwrap();
        assert_that!(found.id).is_equal_to(1);
        assert_that!(source.fetches()).is_equal_to(1);

        let found = cache.lookup_region_by_key(b"c").await.unwrap();
        assert_that!(found.id).is_equal_to(1);
        assert_that!(source.fetches()).is_equal_to(1);

        let found = cache.lookup_region_by_key(b"n").await.unwrap();
        assert_that!(found.id).is_equal_to(2);
        assert_that!(source.fetches()).is_equal_to(2);
    }

    #[tokio::test]
    async fn test_lookup_miss() {
        let source = Arc::new(StaticSource::new(vec![region(1, 1, b"a", b"m")]));
        let cache = RouterCache::new(source);
        let err = cache.lookup_region_by_key(b"z").await.unwrap_err();
        assert!(matches!(err, TxnError::RegionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let source = Arc::new(StaticSource::new(vec![region(1, 1, b"a", b"m")]));
        let cache = RouterCache::new(source.clone());

        cache.lookup_region_by_key(b"b").await.unwrap();
        cache.invalidate(1).await;
        cache.lookup_region_by_key(b"b").await.unwrap();
        assert_that!(source.fetches()).is_equal_to(2);
    }

    #[tokio::test]
    async fn test_epoch_monotonic() {
        let source = Arc::new(StaticSource::new(vec![region(1, 1, b"a", b"z")]));
        let cache = RouterCache::new(source);

        // Post-split geometry observed out of band.
        {
            let mut regions = cache.regions.write().await;
            RouterCache::insert(&mut regions, region(1, 3, b"a", b"m"));
            RouterCache::insert(&mut regions, region(3, 1, b"m", b"z"));
        }

        // A stale fetch of the pre-split region must not clobber the split.
        {
            let mut regions = cache.regions.write().await;
            RouterCache::insert(&mut regions, region(1, 1, b"a", b"z"));
        }
        let found = cache.lookup_region_by_key(b"n").await.unwrap();
        assert_that!(found.id).is_equal_to(3);
        let found = cache.lookup_region_by_key(b"b").await.unwrap();
        assert_that!(found.epoch).is_equal_to(3);
    }

    #[tokio::test]
    async fn test_lookup_between_gap() {
        let source = Arc::new(StaticSource::new(vec![region(2, 1, b"m", b"z")]));
        let cache = RouterCache::new(source);

        let found = cache.lookup_region_between(b"a", b"c").await.unwrap();
        assert_that!(found.is_none()).is_true();

        let found = cache.lookup_region_between(b"a", b"p").await.unwrap().unwrap();
        assert_that!(found.id).is_equal_to(2);
    }
}
