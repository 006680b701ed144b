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

use std::cmp;

use anyhow::anyhow;
use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::buffer::TxnBuffer;
use crate::client::TxnClient;
use crate::error::{check_txn_result, Result, TxnError};
use crate::executor::TaskError;
use crate::protos::{
    Context,
    IsolationLevel,
    KeyRange,
    KeyValue,
    LockInfo,
    Mutation,
    MutationOp,
    Timestamp,
    TxnBatchGetRequest,
    TxnBatchRollbackRequest,
    TxnCommitRequest,
    TxnGetRequest,
    TxnPrewriteRequest,
    TxnPrewriteResponse,
    TxnResultInfo,
};
use crate::router::Region;
use crate::scanner::{RegionScanner, ScanState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnKind {
    Optimistic,
    Pessimistic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxnOptions {
    pub isolation: IsolationLevel,
    pub kind: TxnKind,
}

impl Default for TxnOptions {
    fn default() -> Self {
        Self { isolation: IsolationLevel::SnapshotIsolation, kind: TxnKind::Optimistic }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnState {
    Init,
    Active,
    PreCommitting,
    PreCommitted,
    Committing,
    Committed,
    RollingBack,
    RolledBack,
}

/// A multi-key transaction against the store, committed with two-phase
/// commit over per-region prewrites.
///
/// Reads see the transaction's own buffered writes; nothing reaches the
/// servers until [`Txn::pre_commit`]. Commit of the primary key is the
/// linearization point: afterwards the transaction is durably committed and
/// remaining per-key commit markers are applied best-effort.
pub struct Txn {
    client: TxnClient,
    options: TxnOptions,
    state: TxnState,
    start_ts: Timestamp,
    commit_ts: Option<Timestamp>,
    is_one_pc: bool,
    buffer: TxnBuffer,
    scan_states: HashMap<(Vec<u8>, Vec<u8>), ScanState>,
}

impl Txn {
    pub(crate) fn new(client: TxnClient, options: TxnOptions) -> Self {
        Self {
            client,
            options,
            state: TxnState::Init,
            start_ts: Timestamp::zero(),
            commit_ts: None,
            is_one_pc: false,
            buffer: TxnBuffer::new(),
            scan_states: HashMap::new(),
        }
    }

    pub fn state(&self) -> TxnState {
        self.state
    }

    pub fn options(&self) -> &TxnOptions {
        &self.options
    }

    pub fn start_ts(&self) -> Timestamp {
        self.start_ts
    }

    pub fn commit_ts(&self) -> Option<Timestamp> {
        self.commit_ts
    }

    pub fn is_one_pc(&self) -> bool {
        self.is_one_pc
    }

    fn check_state(&self, allowed: &[TxnState], op: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(TxnError::IllegalState { state: self.state, op })
    }

    /// Assigns the start timestamp and activates the transaction.
    pub async fn begin(&mut self) -> Result<()> {
        self.check_state(&[TxnState::Init], "begin")?;
        self.start_ts = self.client.tso().timestamp().await.map_err(TxnError::Transport)?;
        self.state = TxnState::Active;
        Ok(())
    }

    pub async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_state(&[TxnState::Active], "get")?;
        if let Some(mutation) = self.buffer.get(key) {
            return Ok(match mutation.op() {
                MutationOp::Put | MutationOp::PutIfAbsent => Some(mutation.value.clone().unwrap_or_default()),
                MutationOp::Delete => None,
            });
        }
        self.remote_get(key).await
    }

    /// Lock conflicts re-enter this loop after resolution or backoff; stale
    /// routing re-enters after a cache refresh. Write conflicts and transport
    /// errors surface.
    async fn remote_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let max_retry = self.client.config().max_retry;
        let op_delay = self.client.config().op_delay;
        let mut retry = 0;
        loop {
            let region = self.client.router().lookup_region_by_key(key).await?;
            let request = TxnGetRequest {
                context: Context::new(0, 0, self.options.isolation),
                start_ts: self.start_ts,
                key: key.to_vec(),
            };
            let response = match self.client.dispatcher().txn_get(&region, self.options.isolation, request).await {
                Ok(response) => response,
                Err(TxnError::StaleRegion { .. }) if retry < max_retry => {
                    retry += 1;
                    continue;
                },
                Err(err) => return Err(err),
            };
            if let Some(result) = &response.txn_result {
                match check_txn_result(result) {
                    Ok(()) => {},
                    Err(TxnError::LockConflict(lock)) => {
                        if retry >= max_retry {
                            return Err(TxnError::LockConflict(lock));
                        }
                        retry += 1;
                        self.resolve_or_backoff(&lock).await?;
                        continue;
                    },
                    Err(err) => return Err(err),
                }
            }
            return Ok(response.value.filter(|value| !value.is_empty()));
        }
    }

    async fn resolve_or_backoff(&self, lock: &LockInfo) -> Result<()> {
        match self.client.resolver().resolve_lock(lock, self.start_ts).await {
            Ok(()) => {},
            Err(err) if err.is_lock_conflict() => {
                debug!("lock owner of {:?} still live, backing off", lock.key);
            },
            Err(err) => return Err(err),
        }
        tokio::time::sleep(self.client.config().op_delay).await;
        Ok(())
    }

    pub async fn batch_get(&self, keys: &[Vec<u8>]) -> Result<Vec<KeyValue>> {
        self.check_state(&[TxnState::Active], "batch_get")?;
        let mut out = Vec::new();
        let mut remote = Vec::new();
        for key in keys {
            match self.buffer.get(key) {
                None => remote.push(key.clone()),
                Some(mutation) => match mutation.op() {
                    MutationOp::Put | MutationOp::PutIfAbsent => {
                        out.push(KeyValue::new(key.clone(), mutation.value.clone().unwrap_or_default()));
                    },
                    MutationOp::Delete => {},
                },
            }
        }
        if remote.is_empty() {
            return Ok(out);
        }

        let grouped = self.group_keys_by_region(remote).await?;
        let tasks: Vec<_> = grouped
            .into_iter()
            .map(|(region, keys)| {
                let client = self.client.clone();
                let isolation = self.options.isolation;
                let start_ts = self.start_ts;
                move || run_batch_get(client, isolation, start_ts, region, keys)
            })
            .collect();
        let results = self.client.executor().execute(tasks).await;

        let mut failure = None;
        for (index, result) in results.into_iter().enumerate() {
            match flatten_task(result) {
                Ok(kvs) => out.extend(kvs),
                Err(err) => {
                    warn!("batch get sub-task {index} failed: {err}");
                    if failure.is_none() {
                        failure = Some(err);
                    }
                },
            }
        }
        match failure {
            None => Ok(out),
            Some(err) => Err(err),
        }
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Result<()> {
        self.check_state(&[TxnState::Active], "put")?;
        self.buffer.put(key, value);
        Ok(())
    }

    pub fn batch_put(&mut self, kvs: Vec<KeyValue>) -> Result<()> {
        self.check_state(&[TxnState::Active], "batch_put")?;
        for kv in kvs {
            self.buffer.put(kv.key, kv.value);
        }
        Ok(())
    }

    pub fn put_if_absent(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Result<()> {
        self.check_state(&[TxnState::Active], "put_if_absent")?;
        self.buffer.put_if_absent(key, value);
        Ok(())
    }

    pub fn batch_put_if_absent(&mut self, kvs: Vec<KeyValue>) -> Result<()> {
        self.check_state(&[TxnState::Active], "batch_put_if_absent")?;
        for kv in kvs {
            self.buffer.put_if_absent(kv.key, kv.value);
        }
        Ok(())
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) -> Result<()> {
        self.check_state(&[TxnState::Active], "delete")?;
        self.buffer.delete(key);
        Ok(())
    }

    pub fn batch_delete(&mut self, keys: Vec<Vec<u8>>) -> Result<()> {
        self.check_state(&[TxnState::Active], "batch_delete")?;
        for key in keys {
            self.buffer.delete(key);
        }
        Ok(())
    }

    /// Streams `[start, end)` in key order, merging buffered mutations into
    /// the server-side view. Returns at most `limit` pairs; a limited call
    /// leaves a cursor behind and the next call with the same bounds resumes
    /// after the last returned key.
    pub async fn scan(&mut self, start: &[u8], end: &[u8], limit: usize) -> Result<Vec<KeyValue>> {
        self.check_state(&[TxnState::Active], "scan")?;
        if start.is_empty() || end.is_empty() {
            return Err(TxnError::InvalidArgument("scan bounds must not be empty".to_string()));
        }
        if start >= end {
            return Err(TxnError::InvalidArgument("scan end must be greater than start".to_string()));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let cursor = (start.to_vec(), end.to_vec());
        let mut state = match self.scan_states.remove(&cursor) {
            Some(state) => state,
            None => ScanState::new(start.to_vec(), self.buffer.range(start, end)),
        };
        let result = self.drive_scan(&mut state, end, limit).await;
        match result {
            Ok(out) => {
                if !state.finished() {
                    self.scan_states.insert(cursor, state);
                }
                Ok(out)
            },
            Err(err) => {
                self.scan_states.insert(cursor, state);
                Err(err)
            },
        }
    }

    /// Stale regions re-enter this loop after invalidation, bounded by
    /// `max_retry`; everything else surfaces.
    async fn drive_scan(&self, state: &mut ScanState, end: &[u8], limit: usize) -> Result<Vec<KeyValue>> {
        let config = self.client.config();
        let mut out = Vec::new();
        let mut reroutes = 0;
        loop {
            if state.merge_pending(end, limit, &mut out) {
                state.server_done = true;
                state.scanner = None;
            }
            if out.len() >= limit {
                return Ok(out);
            }
            if state.server_done {
                state.drain_local(limit, &mut out);
                return Ok(out);
            }

            if state.scanner.is_none() {
                match self.client.router().lookup_region_between(&state.next_key, end).await? {
                    None => {
                        // The rest of the range is a gap: only buffered
                        // mutations remain.
                        state.server_done = true;
                        continue;
                    },
                    Some(region) => {
                        let slice_start = cmp::max(state.next_key.as_slice(), region.range.start.as_slice()).to_vec();
                        let slice_end = match region.range.end.is_empty() || end <= region.range.end.as_slice() {
                            true => end.to_vec(),
                            false => region.range.end.clone(),
                        };
                        debug!("txn {} scans region {} slice [{slice_start:?}, {slice_end:?})", self.start_ts, region.id);
                        state.scanner = Some(RegionScanner::new(
                            self.client.dispatcher().clone(),
                            self.client.resolver().clone(),
                            self.options.isolation,
                            self.start_ts,
                            region,
                            KeyRange::new(slice_start, slice_end),
                            config.scan_batch_limit,
                            config.max_retry,
                            config.op_delay,
                        ));
                    },
                }
            }
            let Some(scanner) = state.scanner.as_mut() else {
                continue;
            };
            match scanner.next_batch().await {
                Ok(Some(kvs)) => state.take_batch(kvs),
                Ok(None) => {
                    let region_end = scanner.region().range.end.clone();
                    state.scanner = None;
                    if region_end.is_empty() || region_end.as_slice() >= end {
                        state.server_done = true;
                    } else {
                        state.advance_to(region_end);
                    }
                },
                Err(TxnError::StaleRegion { region_id }) => {
                    state.scanner = None;
                    self.client.router().invalidate(region_id).await;
                    if reroutes >= config.max_retry {
                        return Err(TxnError::StaleRegion { region_id });
                    }
                    reroutes += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Phase one of two-phase commit.
    ///
    /// Prewrites the primary key first, then the remaining mutations grouped
    /// by region in parallel. When every buffered key lives in one region the
    /// primary prewrite carries all mutations with `try_one_pc` and a success
    /// commits the transaction outright.
    pub async fn pre_commit(&mut self) -> Result<()> {
        self.check_state(&[TxnState::Active], "pre_commit")?;
        self.state = TxnState::PreCommitting;
        if self.buffer.is_empty() {
            self.state = TxnState::PreCommitted;
            return Ok(());
        }
        let primary = match self.buffer.primary_key() {
            Some(primary) => primary.to_vec(),
            None => return Err(TxnError::Internal(anyhow!("buffer has mutations but no primary key"))),
        };
        self.is_one_pc = self.is_single_region().await;
        debug!("txn {} prewrites with primary {primary:?}, one_pc: {}", self.start_ts, self.is_one_pc);

        let primary_response = match self.prewrite_primary(&primary).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_write_conflict() {
                    self.state = TxnState::RollingBack;
                }
                return Err(err);
            },
        };
        if self.is_one_pc {
            self.commit_ts = primary_response.one_pc_commit_ts;
            self.state = TxnState::Committed;
            return Ok(());
        }

        let batches = self.secondary_prewrite_batches(&primary).await?;
        let tasks: Vec<_> = batches
            .into_iter()
            .map(|(region, request)| {
                let client = self.client.clone();
                let isolation = self.options.isolation;
                let start_ts = self.start_ts;
                move || async move { run_prewrite(client, isolation, start_ts, region, request).await.map(|_| ()) }
            })
            .collect();
        let results = self.client.executor().execute(tasks).await;

        let mut failure: Option<TxnError> = None;
        for (index, result) in results.into_iter().enumerate() {
            if let Err(err) = flatten_task(result) {
                warn!("prewrite sub-task {index} of txn {} failed: {err}", self.start_ts);
                if failure.is_none() {
                    failure = Some(err);
                }
            }
        }
        match failure {
            None => {
                self.state = TxnState::PreCommitted;
                Ok(())
            },
            Some(err) => {
                if err.is_write_conflict() {
                    self.state = TxnState::RollingBack;
                }
                Err(err)
            },
        }
    }

    /// Phase two. Commit of the primary key decides the transaction; failures
    /// on the remaining keys are logged and left to resolvers.
    pub async fn commit(&mut self) -> Result<()> {
        match self.state {
            TxnState::Committed => return Ok(()),
            TxnState::PreCommitted => {},
            state => return Err(TxnError::IllegalState { state, op: "commit" }),
        }
        if self.buffer.is_empty() {
            self.state = TxnState::Committed;
            return Ok(());
        }
        self.state = TxnState::Committing;
        let commit_ts = self.client.tso().timestamp().await.map_err(TxnError::Transport)?;
        if commit_ts <= self.start_ts {
            return Err(TxnError::Internal(anyhow!(
                "commit ts {commit_ts} does not advance past start ts {}",
                self.start_ts
            )));
        }
        self.commit_ts = Some(commit_ts);
        let primary = match self.buffer.primary_key() {
            Some(primary) => primary.to_vec(),
            None => return Err(TxnError::Internal(anyhow!("buffer has mutations but no primary key"))),
        };

        let region = self.client.router().lookup_region_by_key(&primary).await?;
        let request = TxnCommitRequest {
            context: Context::new(0, 0, self.options.isolation),
            start_ts: self.start_ts,
            commit_ts,
            keys: vec![primary.clone()],
        };
        let response = self.client.dispatcher().txn_commit(&region, self.options.isolation, request).await?;
        if let Some(result) = &response.txn_result {
            match check_txn_result(result) {
                Ok(()) => {},
                Err(TxnError::WriteConflict { .. }) => {
                    // A resolver decided our fate before we got here.
                    self.state = TxnState::RolledBack;
                    return Err(TxnError::TxnRolledBack { start_ts: self.start_ts });
                },
                Err(TxnError::LockConflict(lock)) => {
                    return Err(TxnError::Internal(anyhow!(
                        "commit of primary {primary:?} blocked by lock of txn {}",
                        lock.lock_ts
                    )));
                },
                // The server lost our primary lock without recording an
                // outcome; nothing sane can be done client-side.
                Err(err) => return Err(err),
            }
        }
        self.state = TxnState::Committed;

        let batches = self.secondary_key_batches(&primary).await;
        if batches.is_empty() {
            return Ok(());
        }
        let tasks: Vec<_> = batches
            .into_iter()
            .map(|(region, keys)| {
                let client = self.client.clone();
                let isolation = self.options.isolation;
                let start_ts = self.start_ts;
                move || run_secondary_commit(client, isolation, start_ts, commit_ts, region, keys)
            })
            .collect();
        // Statuses are logged inside the sub-tasks and never surfaced: the
        // primary marker already made the commit durable.
        self.client.executor().execute(tasks).await;
        Ok(())
    }

    /// Rolls prewritten locks back. The primary rollback must succeed;
    /// secondary rollbacks are best-effort.
    pub async fn rollback(&mut self) -> Result<()> {
        match self.state {
            TxnState::PreCommitting | TxnState::PreCommitted | TxnState::RollingBack => {},
            state => return Err(TxnError::IllegalState { state, op: "rollback" }),
        }
        self.state = TxnState::RollingBack;
        if self.buffer.is_empty() {
            self.state = TxnState::RolledBack;
            return Ok(());
        }
        let primary = match self.buffer.primary_key() {
            Some(primary) => primary.to_vec(),
            None => return Err(TxnError::Internal(anyhow!("buffer has mutations but no primary key"))),
        };

        let region = self.client.router().lookup_region_by_key(&primary).await?;
        let mut keys = vec![primary.clone()];
        if self.is_one_pc {
            // A one-pc prewrite placed every lock in the primary's region.
            keys.extend(self.buffer.mutations().filter(|m| m.key != primary).map(|m| m.key.clone()));
        }
        let request = TxnBatchRollbackRequest {
            context: Context::new(0, 0, self.options.isolation),
            start_ts: self.start_ts,
            keys,
        };
        let response = self.client.dispatcher().txn_batch_rollback(&region, self.options.isolation, request).await?;
        if let Some(result) = &response.txn_result {
            match check_txn_result(result) {
                // Nothing left to roll back.
                Ok(()) | Err(TxnError::TxnNotFound { .. }) => {},
                Err(err) => return Err(err),
            }
        }
        self.state = TxnState::RolledBack;
        if self.is_one_pc {
            return Ok(());
        }

        let batches = self.secondary_key_batches(&primary).await;
        if batches.is_empty() {
            return Ok(());
        }
        let tasks: Vec<_> = batches
            .into_iter()
            .map(|(region, keys)| {
                let client = self.client.clone();
                let isolation = self.options.isolation;
                let start_ts = self.start_ts;
                move || run_secondary_rollback(client, isolation, start_ts, region, keys)
            })
            .collect();
        self.client.executor().execute(tasks).await;
        Ok(())
    }

    async fn prewrite_primary(&self, primary: &[u8]) -> Result<TxnPrewriteResponse> {
        let region = self.client.router().lookup_region_by_key(primary).await?;
        let mut mutations = Vec::new();
        match self.buffer.get(primary) {
            Some(mutation) => mutations.push(mutation.clone()),
            None => return Err(TxnError::Internal(anyhow!("primary key {primary:?} not buffered"))),
        }
        if self.is_one_pc {
            mutations.extend(self.buffer.mutations().filter(|m| m.key != primary).cloned());
        }
        let request = self.prewrite_request(mutations, primary, self.is_one_pc);
        run_prewrite(self.client.clone(), self.options.isolation, self.start_ts, region, request).await
    }

    fn prewrite_request(&self, mutations: Vec<Mutation>, primary: &[u8], try_one_pc: bool) -> TxnPrewriteRequest {
        TxnPrewriteRequest {
            context: Context::new(0, 0, self.options.isolation),
            start_ts: self.start_ts,
            mutations,
            primary_lock: primary.to_vec(),
            lock_ttl: self.client.config().lock_ttl,
            txn_size: self.buffer.len() as u64,
            try_one_pc,
        }
    }

    async fn secondary_prewrite_batches(&self, primary: &[u8]) -> Result<Vec<(Region, TxnPrewriteRequest)>> {
        let mut index: HashMap<u64, usize> = HashMap::new();
        let mut grouped: Vec<(Region, Vec<Mutation>)> = Vec::new();
        for mutation in self.buffer.mutations().filter(|m| m.key != primary) {
            let region = self.client.router().lookup_region_by_key(&mutation.key).await?;
            match index.get(&region.id) {
                Some(&at) => grouped[at].1.push(mutation.clone()),
                None => {
                    index.insert(region.id, grouped.len());
                    grouped.push((region, vec![mutation.clone()]));
                },
            }
        }
        let max_batch_count = self.client.config().max_batch_count;
        let mut batches = Vec::new();
        for (region, mutations) in grouped {
            for chunk in mutations.chunks(max_batch_count) {
                batches.push((region.clone(), self.prewrite_request(chunk.to_vec(), primary, false)));
            }
        }
        Ok(batches)
    }

    async fn group_keys_by_region(&self, keys: Vec<Vec<u8>>) -> Result<Vec<(Region, Vec<Vec<u8>>)>> {
        let mut index: HashMap<u64, usize> = HashMap::new();
        let mut grouped: Vec<(Region, Vec<Vec<u8>>)> = Vec::new();
        for key in keys {
            let region = self.client.router().lookup_region_by_key(&key).await?;
            match index.get(&region.id) {
                Some(&at) => grouped[at].1.push(key),
                None => {
                    index.insert(region.id, grouped.len());
                    grouped.push((region, vec![key]));
                },
            }
        }
        Ok(grouped)
    }

    /// Secondary keys grouped by region and chunked, for best-effort phase
    /// two traffic. Keys whose region cannot be resolved are skipped.
    async fn secondary_key_batches(&self, primary: &[u8]) -> Vec<(Region, Vec<Vec<u8>>)> {
        let mut index: HashMap<u64, usize> = HashMap::new();
        let mut grouped: Vec<(Region, Vec<Vec<u8>>)> = Vec::new();
        for mutation in self.buffer.mutations().filter(|m| m.key != primary) {
            let region = match self.client.router().lookup_region_by_key(&mutation.key).await {
                Ok(region) => region,
                Err(err) => {
                    warn!("skipping best-effort cleanup of key {:?}: {err}", mutation.key);
                    continue;
                },
            };
            match index.get(&region.id) {
                Some(&at) => grouped[at].1.push(mutation.key.clone()),
                None => {
                    index.insert(region.id, grouped.len());
                    grouped.push((region, vec![mutation.key.clone()]));
                },
            }
        }
        let max_batch_count = self.client.config().max_batch_count;
        let mut batches = Vec::new();
        for (region, keys) in grouped {
            for chunk in keys.chunks(max_batch_count) {
                batches.push((region.clone(), chunk.to_vec()));
            }
        }
        batches
    }

    /// One-pc probe: every buffered key resolves to the same region. Lookup
    /// failures fall back to the two-phase path.
    async fn is_single_region(&self) -> bool {
        let mut region_id = None;
        for mutation in self.buffer.mutations() {
            match self.client.router().lookup_region_by_key(&mutation.key).await {
                Err(_) => return false,
                Ok(region) => match region_id {
                    None => region_id = Some(region.id),
                    Some(id) if id != region.id => return false,
                    Some(_) => {},
                },
            }
        }
        true
    }
}

fn flatten_task<T>(result: std::result::Result<Result<T>, TaskError>) -> Result<T> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(TxnError::Internal(anyhow::Error::new(err))),
    }
}

/// Examines per-mutation prewrite results. A write conflict aborts
/// immediately. Locks are resolved in place; if any lock was seen the caller
/// gets a `LockConflict` back and retries the prewrite.
async fn check_prewrite_results(client: &TxnClient, results: &[TxnResultInfo], start_ts: Timestamp) -> Result<()> {
    let mut conflict: Option<TxnError> = None;
    for result in results {
        match check_txn_result(result) {
            Ok(()) => {},
            Err(err @ TxnError::WriteConflict { .. }) => return Err(err),
            Err(TxnError::LockConflict(lock)) => {
                match client.resolver().resolve_lock(&lock, start_ts).await {
                    Ok(()) => {},
                    Err(err) if err.is_lock_conflict() => {},
                    Err(err) => return Err(err),
                }
                if conflict.is_none() {
                    conflict = Some(TxnError::LockConflict(lock));
                }
            },
            Err(err) => return Err(err),
        }
    }
    match conflict {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

/// Lock conflicts re-enter this loop after resolution, bounded by
/// `max_retry`; write conflicts and transport errors surface without retry.
async fn run_prewrite(
    client: TxnClient,
    isolation: IsolationLevel,
    start_ts: Timestamp,
    region: Region,
    request: TxnPrewriteRequest,
) -> Result<TxnPrewriteResponse> {
    let max_retry = client.config().max_retry;
    let op_delay = client.config().op_delay;
    let mut retry = 0;
    loop {
        let response = client.dispatcher().txn_prewrite(&region, isolation, request.clone()).await?;
        match check_prewrite_results(&client, &response.txn_results, start_ts).await {
            Ok(()) => return Ok(response),
            Err(err) if err.is_lock_conflict() => {
                if retry >= max_retry {
                    return Err(err);
                }
                retry += 1;
                debug!("prewrite to region {} blocked by a lock, retrying", region.id);
                tokio::time::sleep(op_delay).await;
            },
            Err(err) => return Err(err),
        }
    }
}

/// Lock conflicts re-enter this loop after resolution or backoff, bounded by
/// `max_retry`; everything else surfaces.
async fn run_batch_get(
    client: TxnClient,
    isolation: IsolationLevel,
    start_ts: Timestamp,
    region: Region,
    keys: Vec<Vec<u8>>,
) -> Result<Vec<KeyValue>> {
    let max_retry = client.config().max_retry;
    let op_delay = client.config().op_delay;
    let request = TxnBatchGetRequest { context: Context::new(0, 0, isolation), start_ts, keys };
    let mut retry = 0;
    loop {
        let response = client.dispatcher().txn_batch_get(&region, isolation, request.clone()).await?;
        if let Some(result) = &response.txn_result {
            match check_txn_result(result) {
                Ok(()) => {},
                Err(TxnError::LockConflict(lock)) => {
                    if retry >= max_retry {
                        return Err(TxnError::LockConflict(lock));
                    }
                    retry += 1;
                    match client.resolver().resolve_lock(&lock, start_ts).await {
                        Ok(()) => {},
                        Err(err) if err.is_lock_conflict() => {},
                        Err(err) => return Err(err),
                    }
                    tokio::time::sleep(op_delay).await;
                    continue;
                },
                Err(err) => return Err(err),
            }
        }
        // Missing keys come back with empty values; drop them.
        return Ok(response.kvs.into_iter().filter(|kv| !kv.value.is_empty()).collect());
    }
}

async fn run_secondary_commit(
    client: TxnClient,
    isolation: IsolationLevel,
    start_ts: Timestamp,
    commit_ts: Timestamp,
    region: Region,
    keys: Vec<Vec<u8>>,
) {
    let request = TxnCommitRequest { context: Context::new(0, 0, isolation), start_ts, commit_ts, keys };
    match client.dispatcher().txn_commit(&region, isolation, request).await {
        Err(err) => warn!("best-effort commit of txn {start_ts} to region {} failed: {err}", region.id),
        Ok(response) => {
            if let Some(result) = &response.txn_result {
                if let Err(err) = check_txn_result(result) {
                    warn!("best-effort commit of txn {start_ts} to region {} reported: {err}", region.id);
                }
            }
        },
    }
}

async fn run_secondary_rollback(
    client: TxnClient,
    isolation: IsolationLevel,
    start_ts: Timestamp,
    region: Region,
    keys: Vec<Vec<u8>>,
) {
    let request = TxnBatchRollbackRequest { context: Context::new(0, 0, isolation), start_ts, keys };
    match client.dispatcher().txn_batch_rollback(&region, isolation, request).await {
        Err(err) => warn!("best-effort rollback of txn {start_ts} to region {} failed: {err}", region.id),
        Ok(response) => {
            if let Some(result) = &response.txn_result {
                if let Err(err) = check_txn_result(result) {
                    warn!("best-effort rollback of txn {start_ts} to region {} reported: {err}", region.id);
                }
            }
        },
    }
}
