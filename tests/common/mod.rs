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

//! In-process fake of a ShaleKV deployment: a handful of regions over one
//! MVCC store with Percolator-style locks, plus the timestamp oracle. Serves
//! the transport, routing and oracle seams so coordinator tests run without
//! a cluster.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shalekv_client::protos::{
    txn_result_info,
    KeyRange,
    KeyValue,
    LockInfo,
    Mutation,
    MutationOp,
    Timestamp,
    TxnAction,
    TxnBatchGetRequest,
    TxnBatchGetResponse,
    TxnBatchRollbackRequest,
    TxnBatchRollbackResponse,
    TxnCheckTxnStatusRequest,
    TxnCheckTxnStatusResponse,
    TxnCommitRequest,
    TxnCommitResponse,
    TxnGetRequest,
    TxnGetResponse,
    TxnPrewriteRequest,
    TxnPrewriteResponse,
    TxnResultInfo,
    TxnScanRequest,
    TxnScanResponse,
    WriteConflict,
};
use shalekv_client::{
    Region,
    RegionSource,
    ScanStream,
    StoreTransport,
    TimestampOracle,
    TxnClient,
    TxnConfig,
};
use tonic::Status;

const SCAN_RESPONSE_BATCH: usize = 2;

#[derive(Default)]
pub struct RpcCounters {
    pub get: AtomicUsize,
    pub batch_get: AtomicUsize,
    pub scan: AtomicUsize,
    pub prewrite: AtomicUsize,
    pub commit: AtomicUsize,
    pub batch_rollback: AtomicUsize,
    pub check_txn_status: AtomicUsize,
}

#[derive(Clone)]
struct StoredLock {
    primary: Vec<u8>,
    start_ts: Timestamp,
    ttl: u64,
    op: MutationOp,
    value: Option<Vec<u8>>,
}

impl StoredLock {
    fn info(&self, key: &[u8]) -> LockInfo {
        LockInfo {
            primary_lock: self.primary.clone(),
            lock_ts: self.start_ts,
            key: key.to_vec(),
            lock_ttl: self.ttl,
            txn_size: 1,
            lock_kind: self.op as i32,
        }
    }
}

#[derive(Default)]
struct StoreInner {
    // Committed versions per key, ascending by commit ts; None is a tombstone.
    data: BTreeMap<Vec<u8>, Vec<(Timestamp, Option<Vec<u8>>)>>,
    locks: BTreeMap<Vec<u8>, StoredLock>,
    committed: BTreeMap<Timestamp, Timestamp>,
    rolled_back: BTreeSet<Timestamp>,
}

impl StoreInner {
    fn blocking_lock(&self, key: &[u8], read_ts: Timestamp) -> Option<&StoredLock> {
        self.locks.get(key).filter(|lock| lock.start_ts <= read_ts)
    }

    fn visible(&self, key: &[u8], read_ts: Timestamp) -> Option<Vec<u8>> {
        let versions = self.data.get(key)?;
        versions.iter().rev().find(|(commit_ts, _)| *commit_ts <= read_ts).and_then(|(_, value)| value.clone())
    }

    fn apply(&mut self, key: Vec<u8>, commit_ts: Timestamp, value: Option<Vec<u8>>) {
        self.data.entry(key).or_default().push((commit_ts, value));
    }

    fn apply_mutation(&mut self, mutation: &Mutation, commit_ts: Timestamp) {
        let value = match mutation.op() {
            MutationOp::Put | MutationOp::PutIfAbsent => Some(mutation.value.clone().unwrap_or_default()),
            MutationOp::Delete => None,
        };
        self.apply(mutation.key.clone(), commit_ts, value);
    }
}

/// One object serving all three seams of the coordinator.
pub struct MockCluster {
    regions: Vec<Region>,
    ts: AtomicU64,
    inner: Mutex<StoreInner>,
    pub counters: RpcCounters,
}

impl MockCluster {
    /// Regions given as `(id, start, end)`; an empty end means unbounded.
    pub fn new(regions: &[(u64, &[u8], &[u8])]) -> Arc<Self> {
        let regions = regions
            .iter()
            .map(|(id, start, end)| Region {
                id: *id,
                epoch: 1,
                range: KeyRange::new(start.to_vec(), end.to_vec()),
                leader: format!("node-{id}"),
            })
            .collect();
        Arc::new(Self {
            regions,
            ts: AtomicU64::new(0),
            inner: Mutex::new(StoreInner::default()),
            counters: RpcCounters::default(),
        })
    }

    pub fn single_region() -> Arc<Self> {
        Self::new(&[(1, b"", b"")])
    }

    pub fn client(self: &Arc<Self>) -> TxnClient {
        self.client_with_config(TxnConfig { op_delay: std::time::Duration::from_millis(1), ..TxnConfig::default() })
    }

    pub fn client_with_config(self: &Arc<Self>, config: TxnConfig) -> TxnClient {
        TxnClient::new(self.clone(), self.clone(), self.clone(), config)
    }

    fn next_ts(&self) -> Timestamp {
        Timestamp { physical: self.ts.fetch_add(1, Ordering::SeqCst) + 1, logical: 0 }
    }

    /// Commits `key = value` outside any coordinator, as an earlier
    /// transaction would have.
    pub fn seed_value(&self, key: &[u8], value: &[u8]) -> Timestamp {
        let commit_ts = self.next_ts();
        self.inner.lock().unwrap().apply(key.to_vec(), commit_ts, Some(value.to_vec()));
        commit_ts
    }

    /// Leaves a live foreign lock behind. `ttl` of zero reads as expired.
    pub fn seed_live_lock(&self, key: &[u8], primary: &[u8], ttl: u64) -> Timestamp {
        let lock_ts = self.next_ts();
        self.inner.lock().unwrap().locks.insert(
            key.to_vec(),
            StoredLock { primary: primary.to_vec(), start_ts: lock_ts, ttl, op: MutationOp::Put, value: None },
        );
        lock_ts
    }

    /// Leaves the straggler lock of a *committed* foreign transaction behind:
    /// its primary carries a commit record, the lock on `key` was never
    /// cleaned and still holds the intent value.
    pub fn seed_committed_lock(&self, key: &[u8], primary: &[u8], value: &[u8]) -> (Timestamp, Timestamp) {
        let lock_ts = self.next_ts();
        let commit_ts = self.next_ts();
        let mut inner = self.inner.lock().unwrap();
        inner.locks.insert(
            key.to_vec(),
            StoredLock {
                primary: primary.to_vec(),
                start_ts: lock_ts,
                ttl: u64::MAX,
                op: MutationOp::Put,
                value: Some(value.to_vec()),
            },
        );
        inner.committed.insert(lock_ts, commit_ts);
        (lock_ts, commit_ts)
    }

    /// Server-side view of `key` at `ts`, bypassing rpc.
    pub fn committed_value(&self, key: &[u8], ts: Timestamp) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().visible(key, ts)
    }

    /// Simulates a lost lock (administrative intervention or data loss).
    pub fn drop_lock(&self, key: &[u8]) {
        self.inner.lock().unwrap().locks.remove(key);
    }

    pub fn has_lock(&self, key: &[u8]) -> bool {
        self.inner.lock().unwrap().locks.contains_key(key)
    }

    fn locked_result(lock: &StoredLock, key: &[u8]) -> TxnResultInfo {
        TxnResultInfo { conflict: Some(txn_result_info::Conflict::Locked(lock.info(key))) }
    }

    fn conflict_result(start_ts: Timestamp, conflict_ts: Timestamp, key: &[u8]) -> TxnResultInfo {
        TxnResultInfo {
            conflict: Some(txn_result_info::Conflict::WriteConflict(WriteConflict {
                start_ts,
                conflict_ts,
                key: key.to_vec(),
            })),
        }
    }

    fn not_found_result(start_ts: Timestamp, primary_key: &[u8]) -> TxnResultInfo {
        TxnResultInfo {
            conflict: Some(txn_result_info::Conflict::TxnNotFound(shalekv_client::protos::TxnNotFound {
                start_ts,
                primary_key: primary_key.to_vec(),
            })),
        }
    }
}

#[async_trait]
impl RegionSource for MockCluster {
    async fn region_by_key(&self, key: &[u8]) -> Result<Option<Region>, Status> {
        Ok(self.regions.iter().find(|region| region.contains(key)).cloned())
    }

    async fn region_between(&self, start: &[u8], end: &[u8]) -> Result<Option<Region>, Status> {
        Ok(self
            .regions
            .iter()
            .filter(|region| {
                let starts_before_end = region.range.start.as_slice() < end;
                let ends_after_start = region.range.end.is_empty() || region.range.end.as_slice() > start;
                starts_before_end && ends_after_start
            })
            .min_by(|a, b| a.range.start.cmp(&b.range.start))
            .cloned())
    }
}

#[async_trait]
impl TimestampOracle for MockCluster {
    async fn timestamp(&self) -> Result<Timestamp, Status> {
        Ok(self.next_ts())
    }
}

#[async_trait]
impl StoreTransport for MockCluster {
    async fn txn_get(&self, _address: &str, request: TxnGetRequest) -> Result<TxnGetResponse, Status> {
        self.counters.get.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().unwrap();
        if let Some(lock) = inner.blocking_lock(&request.key, request.start_ts) {
            return Ok(TxnGetResponse {
                region_error: None,
                txn_result: Some(Self::locked_result(lock, &request.key)),
                value: None,
            });
        }
        let value = inner.visible(&request.key, request.start_ts);
        Ok(TxnGetResponse { region_error: None, txn_result: None, value })
    }

    async fn txn_batch_get(
        &self,
        _address: &str,
        request: TxnBatchGetRequest,
    ) -> Result<TxnBatchGetResponse, Status> {
        self.counters.batch_get.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().unwrap();
        for key in &request.keys {
            if let Some(lock) = inner.blocking_lock(key, request.start_ts) {
                return Ok(TxnBatchGetResponse {
                    region_error: None,
                    txn_result: Some(Self::locked_result(lock, key)),
                    kvs: Vec::new(),
                });
            }
        }
        let kvs = request
            .keys
            .iter()
            .map(|key| KeyValue::new(key.clone(), inner.visible(key, request.start_ts).unwrap_or_default()))
            .collect();
        Ok(TxnBatchGetResponse { region_error: None, txn_result: None, kvs })
    }

    async fn txn_scan(&self, _address: &str, request: TxnScanRequest) -> Result<ScanStream, Status> {
        self.counters.scan.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().unwrap();
        let range = (
            std::ops::Bound::Included(request.range.start.clone()),
            match request.range.end.is_empty() {
                true => std::ops::Bound::Unbounded,
                false => std::ops::Bound::Excluded(request.range.end.clone()),
            },
        );
        for (key, lock) in inner.locks.range::<Vec<u8>, _>((range.0.as_ref(), range.1.as_ref())) {
            if lock.start_ts <= request.start_ts {
                let response = TxnScanResponse {
                    region_error: None,
                    txn_result: Some(Self::locked_result(lock, key)),
                    kvs: Vec::new(),
                };
                return Ok(Box::pin(futures::stream::iter(vec![Ok(response)])));
            }
        }
        let mut kvs = Vec::new();
        for (key, _) in inner.data.range::<Vec<u8>, _>((range.0.as_ref(), range.1.as_ref())) {
            if kvs.len() >= request.limit as usize {
                break;
            }
            if let Some(value) = inner.visible(key, request.start_ts) {
                kvs.push(KeyValue::new(key.clone(), value));
            }
        }
        let responses: Vec<Result<TxnScanResponse, Status>> = kvs
            .chunks(SCAN_RESPONSE_BATCH)
            .map(|chunk| Ok(TxnScanResponse { region_error: None, txn_result: None, kvs: chunk.to_vec() }))
            .collect();
        Ok(Box::pin(futures::stream::iter(responses)))
    }

    async fn txn_prewrite(
        &self,
        _address: &str,
        request: TxnPrewriteRequest,
    ) -> Result<TxnPrewriteResponse, Status> {
        self.counters.prewrite.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        let mut txn_results = Vec::new();
        for mutation in &request.mutations {
            if let Some(lock) = inner.locks.get(&mutation.key) {
                if lock.start_ts != request.start_ts {
                    txn_results.push(Self::locked_result(lock, &mutation.key));
                }
                continue;
            }
            if inner.rolled_back.contains(&request.start_ts) {
                txn_results.push(Self::conflict_result(request.start_ts, request.start_ts, &mutation.key));
                continue;
            }
            if let Some((latest_ts, _)) = inner.data.get(&mutation.key).and_then(|versions| versions.last()) {
                if *latest_ts > request.start_ts {
                    txn_results.push(Self::conflict_result(request.start_ts, *latest_ts, &mutation.key));
                    continue;
                }
            }
            if !request.try_one_pc {
                inner.locks.insert(
                    mutation.key.clone(),
                    StoredLock {
                        primary: request.primary_lock.clone(),
                        start_ts: request.start_ts,
                        ttl: request.lock_ttl,
                        op: mutation.op(),
                        value: mutation.value.clone(),
                    },
                );
            }
        }
        let mut one_pc_commit_ts = None;
        if request.try_one_pc && txn_results.is_empty() {
            let commit_ts = self.next_ts();
            for mutation in &request.mutations {
                inner.apply_mutation(mutation, commit_ts);
            }
            inner.committed.insert(request.start_ts, commit_ts);
            one_pc_commit_ts = Some(commit_ts);
        }
        Ok(TxnPrewriteResponse { region_error: None, txn_results, one_pc_commit_ts })
    }

    async fn txn_commit(&self, _address: &str, request: TxnCommitRequest) -> Result<TxnCommitResponse, Status> {
        self.counters.commit.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        for key in &request.keys {
            match inner.locks.get(key).map(|lock| lock.start_ts) {
                Some(start_ts) if start_ts == request.start_ts => {
                    if let Some(lock) = inner.locks.remove(key) {
                        let value = match lock.op {
                            MutationOp::Put | MutationOp::PutIfAbsent => Some(lock.value.unwrap_or_default()),
                            MutationOp::Delete => None,
                        };
                        inner.apply(key.clone(), request.commit_ts, value);
                    }
                    inner.committed.insert(request.start_ts, request.commit_ts);
                },
                Some(_) => {},
                None => {
                    if inner.committed.contains_key(&request.start_ts) {
                        continue;
                    }
                    let txn_result = match inner.rolled_back.contains(&request.start_ts) {
                        true => Self::conflict_result(request.start_ts, request.start_ts, key),
                        false => Self::not_found_result(request.start_ts, key),
                    };
                    return Ok(TxnCommitResponse { region_error: None, txn_result: Some(txn_result) });
                },
            }
        }
        Ok(TxnCommitResponse { region_error: None, txn_result: None })
    }

    async fn txn_batch_rollback(
        &self,
        _address: &str,
        request: TxnBatchRollbackRequest,
    ) -> Result<TxnBatchRollbackResponse, Status> {
        self.counters.batch_rollback.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        if inner.committed.contains_key(&request.start_ts) {
            let key = request.keys.first().cloned().unwrap_or_default();
            return Ok(TxnBatchRollbackResponse {
                region_error: None,
                txn_result: Some(Self::conflict_result(request.start_ts, request.start_ts, &key)),
            });
        }
        for key in &request.keys {
            if inner.locks.get(key).is_some_and(|lock| lock.start_ts == request.start_ts) {
                inner.locks.remove(key);
            }
        }
        inner.rolled_back.insert(request.start_ts);
        Ok(TxnBatchRollbackResponse { region_error: None, txn_result: None })
    }

    async fn txn_check_txn_status(
        &self,
        _address: &str,
        request: TxnCheckTxnStatusRequest,
    ) -> Result<TxnCheckTxnStatusResponse, Status> {
        self.counters.check_txn_status.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        if let Some(commit_ts) = inner.committed.get(&request.lock_ts) {
            return Ok(TxnCheckTxnStatusResponse {
                region_error: None,
                action: TxnAction::Committed as i32,
                commit_ts: Some(*commit_ts),
            });
        }
        if inner.rolled_back.contains(&request.lock_ts) {
            return Ok(TxnCheckTxnStatusResponse {
                region_error: None,
                action: TxnAction::RolledBack as i32,
                commit_ts: None,
            });
        }
        match inner.locks.get(&request.primary_key) {
            Some(lock) if lock.start_ts == request.lock_ts => {
                let action = match lock.ttl {
                    0 => TxnAction::TtlExpired,
                    _ => TxnAction::LockAlive,
                };
                Ok(TxnCheckTxnStatusResponse { region_error: None, action: action as i32, commit_ts: None })
            },
            _ => {
                // No lock and no outcome: the server writes a rollback record
                // so the transaction can never commit later.
                inner.rolled_back.insert(request.lock_ts);
                Ok(TxnCheckTxnStatusResponse {
                    region_error: None,
                    action: TxnAction::RolledBack as i32,
                    commit_ts: None,
                })
            },
        }
    }
}
