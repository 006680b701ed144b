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

use anyhow::anyhow;
use static_assertions::assert_impl_all;
use tracing::debug;

use crate::dispatcher::RpcDispatcher;
use crate::error::{check_txn_result, Result, TxnError};
use crate::protos::{
    Context,
    IsolationLevel,
    LockInfo,
    Timestamp,
    TxnAction,
    TxnBatchRollbackRequest,
    TxnCheckTxnStatusRequest,
    TxnCommitRequest,
};
use crate::router::RouterCache;

/// Unblocks a reader or writer that ran into another transaction's lock by
/// determining the owning transaction's fate from its primary key.
///
/// Shared across all transactions of a process; holds no per-txn state.
pub struct LockResolver {
    dispatcher: Arc<RpcDispatcher>,
    router: Arc<RouterCache>,
}

assert_impl_all!(LockResolver: Send, Sync);

impl LockResolver {
    pub fn new(dispatcher: Arc<RpcDispatcher>, router: Arc<RouterCache>) -> Self {
        Self { dispatcher, router }
    }

    /// Resolves `lock`. `Ok(())` means the blocking lock is gone and the
    /// caller should retry its original operation; [`TxnError::LockConflict`]
    /// means the owning transaction is still live and unexpired, so the
    /// caller backs off.
    pub async fn resolve_lock(&self, lock: &LockInfo, caller_start_ts: Timestamp) -> Result<()> {
        let region = self.router.lookup_region_by_key(&lock.primary_lock).await?;
        let request = TxnCheckTxnStatusRequest {
            context: Context::new(0, 0, IsolationLevel::SnapshotIsolation),
            primary_key: lock.primary_lock.clone(),
            lock_ts: lock.lock_ts,
            caller_start_ts,
        };
        let response = self.dispatcher.txn_check_txn_status(&region, IsolationLevel::SnapshotIsolation, request).await?;
        match response.action() {
            TxnAction::LockAlive => Err(TxnError::LockConflict(Box::new(lock.clone()))),
            TxnAction::Committed => {
                let commit_ts = response
                    .commit_ts
                    .ok_or_else(|| anyhow!("txn {} reported committed without commit ts", lock.lock_ts))?;
                self.roll_forward(lock, commit_ts).await
            },
            TxnAction::RolledBack | TxnAction::TtlExpired => self.purge(lock).await,
        }
    }

    /// The foreign transaction committed: apply its commit marker to the
    /// blocking key.
    async fn roll_forward(&self, lock: &LockInfo, commit_ts: Timestamp) -> Result<()> {
        debug!("rolling forward lock on key {:?} to commit ts {commit_ts}", lock.key);
        let region = self.router.lookup_region_by_key(&lock.key).await?;
        let request = TxnCommitRequest {
            context: Context::new(0, 0, IsolationLevel::SnapshotIsolation),
            start_ts: lock.lock_ts,
            commit_ts,
            keys: vec![lock.key.clone()],
        };
        let response = self.dispatcher.txn_commit(&region, IsolationLevel::SnapshotIsolation, request).await?;
        match response.txn_result.as_ref().map(check_txn_result).transpose() {
            // A concurrent resolver may have applied the marker already.
            Err(TxnError::TxnNotFound { .. }) | Ok(_) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// The foreign transaction is gone (rolled back or expired): ask the
    /// shard to purge its stale lock.
    async fn purge(&self, lock: &LockInfo) -> Result<()> {
        debug!("purging stale lock of txn {} on key {:?}", lock.lock_ts, lock.key);
        let region = self.router.lookup_region_by_key(&lock.key).await?;
        let request = TxnBatchRollbackRequest {
            context: Context::new(0, 0, IsolationLevel::SnapshotIsolation),
            start_ts: lock.lock_ts,
            keys: vec![lock.key.clone()],
        };
        let response = self.dispatcher.txn_batch_rollback(&region, IsolationLevel::SnapshotIsolation, request).await?;
        match response.txn_result.as_ref().map(check_txn_result).transpose() {
            Err(TxnError::TxnNotFound { .. }) | Ok(_) => Ok(()),
            Err(err) => Err(err),
        }
    }
}
