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

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::dispatcher::{RpcDispatcher, ScanStream};
use crate::error::{check_txn_result, Result, TxnError};
use crate::protos::{Context, IsolationLevel, KeyRange, KeyValue, Mutation, MutationOp, Timestamp, TxnScanRequest};
use crate::resolver::LockResolver;
use crate::router::Region;

/// Smallest key strictly greater than `key`.
pub fn key_successor(key: &[u8]) -> Vec<u8> {
    let mut successor = Vec::with_capacity(key.len() + 1);
    successor.extend_from_slice(key);
    successor.push(0);
    successor
}

/// Server-side streaming cursor over one region's slice of a scan range.
///
/// Tracks its own resume position so the stream can be reopened after a lock
/// resolution or a transient stream failure without re-emitting keys.
pub struct RegionScanner {
    dispatcher: Arc<RpcDispatcher>,
    resolver: Arc<LockResolver>,
    isolation: IsolationLevel,
    start_ts: Timestamp,
    region: Region,
    range: KeyRange,
    batch_limit: u32,
    max_retry: usize,
    op_delay: Duration,
    stream: Option<ScanStream>,
    exhausted: bool,
}

impl RegionScanner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dispatcher: Arc<RpcDispatcher>,
        resolver: Arc<LockResolver>,
        isolation: IsolationLevel,
        start_ts: Timestamp,
        region: Region,
        range: KeyRange,
        batch_limit: u32,
        max_retry: usize,
        op_delay: Duration,
    ) -> Self {
        Self {
            dispatcher,
            resolver,
            isolation,
            start_ts,
            region,
            range,
            batch_limit,
            max_retry,
            op_delay,
            stream: None,
            exhausted: false,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    async fn open(&mut self) -> Result<()> {
        let request = TxnScanRequest {
            context: Context::new(0, 0, self.isolation),
            start_ts: self.start_ts,
            range: self.range.clone(),
            limit: self.batch_limit,
        };
        self.stream = Some(self.dispatcher.open_scan(&self.region, self.isolation, request).await?);
        Ok(())
    }

    /// Next batch of versioned kvs, or `None` once the region slice is
    /// drained. Re-entered on retry by: lock conflicts (after resolution, or
    /// after backoff while the owner is live) and transient stream errors.
    /// Region errors, write conflicts and exhausted retries surface.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<KeyValue>>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut retry = 0;
        loop {
            if self.stream.is_none() {
                self.open().await?;
            }
            let Some(stream) = self.stream.as_mut() else {
                continue;
            };
            match stream.next().await {
                None => {
                    self.exhausted = true;
                    self.stream = None;
                    return Ok(None);
                },
                Some(Err(status)) => {
                    self.stream = None;
                    if retry >= self.max_retry {
                        return Err(TxnError::Transport(status));
                    }
                    warn!("scan stream against region {} broke: {status}", self.region.id);
                    retry += 1;
                },
                Some(Ok(mut response)) => {
                    if response.region_error.take().is_some() {
                        self.stream = None;
                        return Err(TxnError::StaleRegion { region_id: self.region.id });
                    }
                    if let Some(result) = &response.txn_result {
                        match check_txn_result(result) {
                            Ok(()) => {},
                            Err(TxnError::LockConflict(lock)) => {
                                self.stream = None;
                                if retry >= self.max_retry {
                                    return Err(TxnError::LockConflict(lock));
                                }
                                retry += 1;
                                match self.resolver.resolve_lock(&lock, self.start_ts).await {
                                    Ok(()) => {},
                                    Err(err) if err.is_lock_conflict() => {
                                        debug!("lock owner of {:?} still live, backing off", lock.key);
                                        tokio::time::sleep(self.op_delay).await;
                                    },
                                    Err(err) => return Err(err),
                                }
                                continue;
                            },
                            Err(err) => return Err(err),
                        }
                    }
                    if response.kvs.is_empty() {
                        self.exhausted = true;
                        self.stream = None;
                        return Ok(None);
                    }
                    if let Some(last) = response.kvs.last() {
                        self.range.start = key_successor(&last.key);
                    }
                    return Ok(Some(response.kvs));
                },
            }
        }
    }
}

/// Resumable cursor for one `[start, end)` scan range of a transaction.
///
/// `next_key` is the smallest key not yet returned; emitted keys advance it
/// to their successor so a resumed scan never repeats a key.
pub struct ScanState {
    pub next_key: Vec<u8>,
    pub pending_server_kvs: Vec<KeyValue>,
    pub pending_offset: usize,
    local_mutations: Vec<Mutation>,
    local_offset: usize,
    pub scanner: Option<RegionScanner>,
    /// True once the server side of the whole range is exhausted; only
    /// buffered mutations can remain.
    pub server_done: bool,
}

impl ScanState {
    pub fn new(start: impl Into<Vec<u8>>, local_mutations: Vec<Mutation>) -> Self {
        Self {
            next_key: start.into(),
            pending_server_kvs: Vec::new(),
            pending_offset: 0,
            local_mutations,
            local_offset: 0,
            scanner: None,
            server_done: false,
        }
    }

    pub fn take_batch(&mut self, kvs: Vec<KeyValue>) {
        self.pending_server_kvs = kvs;
        self.pending_offset = 0;
    }

    /// The cursor is spent: nothing pending, nothing buffered, server done.
    pub fn finished(&self) -> bool {
        self.server_done
            && self.pending_offset >= self.pending_server_kvs.len()
            && self.local_offset >= self.local_mutations.len()
    }

    /// Moves `next_key` forward, never backward.
    pub fn advance_to(&mut self, key: Vec<u8>) {
        if key > self.next_key {
            self.next_key = key;
        }
    }

    fn advance_past(&mut self, key: &[u8]) {
        let successor = key_successor(key);
        self.advance_to(successor);
    }

    fn emit(&mut self, out: &mut Vec<KeyValue>, kv: KeyValue) {
        self.advance_past(&kv.key);
        out.push(kv);
    }

    fn emit_mutation(&mut self, out: &mut Vec<KeyValue>, mutation: Mutation) {
        let value = mutation.value.unwrap_or_default();
        self.emit(out, KeyValue::new(mutation.key, value));
    }

    /// Interleaves pending server kvs with the buffered mutations per key
    /// order. Returns true when a server key at or past `end` was seen,
    /// meaning the server side of the range is finished.
    pub fn merge_pending(&mut self, end: &[u8], limit: usize, out: &mut Vec<KeyValue>) -> bool {
        while self.pending_offset < self.pending_server_kvs.len() {
            if out.len() >= limit {
                return false;
            }
            let kv = self.pending_server_kvs[self.pending_offset].clone();
            if kv.key.as_slice() >= end {
                self.pending_offset = self.pending_server_kvs.len();
                return true;
            }
            // Buffered mutations strictly before the server key go first.
            while let Some(mutation) = self.local_mutations.get(self.local_offset) {
                if mutation.key.as_slice() >= kv.key.as_slice() {
                    break;
                }
                let mutation = mutation.clone();
                self.local_offset += 1;
                match mutation.op() {
                    MutationOp::Put | MutationOp::PutIfAbsent => {
                        self.emit_mutation(out, mutation);
                        if out.len() >= limit {
                            return false;
                        }
                    },
                    MutationOp::Delete => {},
                }
            }
            match self.local_mutations.get(self.local_offset) {
                Some(mutation) if mutation.key == kv.key => {
                    let mutation = mutation.clone();
                    self.local_offset += 1;
                    self.pending_offset += 1;
                    match mutation.op() {
                        // The buffered value is what read-your-writes shows,
                        // for PutIfAbsent included.
                        MutationOp::Put | MutationOp::PutIfAbsent => self.emit_mutation(out, mutation),
                        // Keep the cursor ahead of the suppressed server key
                        // so a reopened stream cannot replay it.
                        MutationOp::Delete => self.advance_past(&kv.key),
                    }
                },
                _ => {
                    self.pending_offset += 1;
                    self.emit(out, kv);
                },
            }
        }
        false
    }

    /// Emits buffered mutations left over once the server side of the range
    /// is exhausted. Returns false when interrupted by `limit`.
    pub fn drain_local(&mut self, limit: usize, out: &mut Vec<KeyValue>) -> bool {
        while let Some(mutation) = self.local_mutations.get(self.local_offset) {
            if out.len() >= limit {
                return false;
            }
            let mutation = mutation.clone();
            self.local_offset += 1;
            match mutation.op() {
                MutationOp::Put | MutationOp::PutIfAbsent => self.emit_mutation(out, mutation),
                MutationOp::Delete => {},
            }
        }
        true
    }
}
