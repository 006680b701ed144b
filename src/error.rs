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

use thiserror::Error;

use crate::protos::{txn_result_info, LockInfo, Timestamp, TxnResultInfo};
use crate::txn::TxnState;

#[derive(Debug, Error)]
pub enum TxnError {
    #[error("transport: {0}")]
    Transport(#[from] tonic::Status),
    #[error("no region for key {key:?}")]
    RegionNotFound { key: Vec<u8> },
    #[error("routing for region {region_id} is stale")]
    StaleRegion { region_id: u64 },
    #[error("key {:?} locked by txn {} with primary {:?}", .0.key, .0.lock_ts, .0.primary_lock)]
    LockConflict(Box<LockInfo>),
    #[error("write to key {key:?} from txn {start_ts} conflicts with commit at {conflict_ts}")]
    WriteConflict { key: Vec<u8>, start_ts: Timestamp, conflict_ts: Timestamp },
    #[error("txn {start_ts} rolled back")]
    TxnRolledBack { start_ts: Timestamp },
    #[error("txn {start_ts} not found on primary {primary_key:?}")]
    TxnNotFound { start_ts: Timestamp, primary_key: Vec<u8> },
    #[error("{op} forbidden in txn state {state:?}")]
    IllegalState { state: TxnState, op: &'static str },
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T, E = TxnError> = std::result::Result<T, E>;

impl TxnError {
    pub fn is_lock_conflict(&self) -> bool {
        matches!(self, Self::LockConflict(_))
    }

    pub fn is_write_conflict(&self) -> bool {
        matches!(self, Self::WriteConflict { .. })
    }
}

/// Maps the conflict a server attached to a txn response, if any.
pub fn check_txn_result(result: &TxnResultInfo) -> Result<()> {
    match &result.conflict {
        None => Ok(()),
        Some(txn_result_info::Conflict::Locked(lock)) => Err(TxnError::LockConflict(Box::new(lock.clone()))),
        Some(txn_result_info::Conflict::WriteConflict(conflict)) => Err(TxnError::WriteConflict {
            key: conflict.key.clone(),
            start_ts: conflict.start_ts,
            conflict_ts: conflict.conflict_ts,
        }),
        Some(txn_result_info::Conflict::TxnNotFound(not_found)) => Err(TxnError::TxnNotFound {
            start_ts: not_found.start_ts,
            primary_key: not_found.primary_key.clone(),
        }),
    }
}
