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

//! Generated code for protobuf message and rpc.

#[rustfmt::skip]
mod generated;

use std::fmt::{Display, Error, Formatter};

pub use self::generated::store_service_client::StoreServiceClient;
pub use self::generated::tso_service_client::TsoServiceClient;
pub use self::generated::*;

impl Timestamp {
    pub const fn zero() -> Self {
        Self { physical: 0, logical: 0 }
    }

    pub const fn is_zero(&self) -> bool {
        self.physical == 0 && self.logical == 0
    }

    /// Smallest timestamp strictly greater than `self`.
    pub const fn next(self) -> Self {
        match self.logical {
            u64::MAX => Self { physical: self.physical + 1, logical: 0 },
            logical => Self { physical: self.physical, logical: logical + 1 },
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}.{}", self.physical, self.logical)
    }
}

impl Context {
    pub fn new(region_id: u64, region_epoch: u64, isolation_level: IsolationLevel) -> Self {
        Self { region_id, region_epoch, isolation_level: isolation_level as i32 }
    }
}

impl Mutation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self { op: MutationOp::Put as i32, key: key.into(), value: Some(value.into()) }
    }

    pub fn put_if_absent(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self { op: MutationOp::PutIfAbsent as i32, key: key.into(), value: Some(value.into()) }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self { op: MutationOp::Delete as i32, key: key.into(), value: None }
    }
}

impl KeyValue {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

impl KeyRange {
    pub fn new(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        Self { start: start.into(), end: end.into() }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start.as_slice() && (self.end.is_empty() || key < self.end.as_slice())
    }
}

impl TxnResultInfo {
    pub fn locked(&self) -> Option<&LockInfo> {
        match &self.conflict {
            Some(txn_result_info::Conflict::Locked(lock)) => Some(lock),
            _ => None,
        }
    }

    pub fn write_conflict(&self) -> Option<&WriteConflict> {
        match &self.conflict {
            Some(txn_result_info::Conflict::WriteConflict(conflict)) => Some(conflict),
            _ => None,
        }
    }

    pub fn txn_not_found(&self) -> Option<&TxnNotFound> {
        match &self.conflict {
            Some(txn_result_info::Conflict::TxnNotFound(not_found)) => Some(not_found),
            _ => None,
        }
    }
}

impl From<LockInfo> for TxnResultInfo {
    fn from(lock: LockInfo) -> Self {
        Self { conflict: Some(txn_result_info::Conflict::Locked(lock)) }
    }
}

impl From<WriteConflict> for TxnResultInfo {
    fn from(conflict: WriteConflict) -> Self {
        Self { conflict: Some(txn_result_info::Conflict::WriteConflict(conflict)) }
    }
}

impl From<TxnNotFound> for TxnResultInfo {
    fn from(not_found: TxnNotFound) -> Self {
        Self { conflict: Some(txn_result_info::Conflict::TxnNotFound(not_found)) }
    }
}

impl RegionError {
    pub fn not_leader(leader_address: Option<String>) -> Self {
        Self { not_leader: Some(NotLeader { leader_address }), ..Default::default() }
    }

    pub fn epoch_mismatch() -> Self {
        Self { epoch_mismatch: Some(EpochMismatch {}), ..Default::default() }
    }

    pub fn region_missing() -> Self {
        Self { region_missing: Some(RegionMissing {}), ..Default::default() }
    }

    pub fn leader_hint(&self) -> Option<&str> {
        self.not_leader.as_ref().and_then(|e| e.leader_address.as_deref())
    }
}

impl Display for RegionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        if self.not_leader.is_some() {
            write!(f, "not leader")?;
        } else if self.epoch_mismatch.is_some() {
            write!(f, "epoch mismatch")?;
        } else if self.region_missing.is_some() {
            write!(f, "region missing")?;
        } else {
            write!(f, "region error")?;
        }
        match &self.message {
            Some(message) => write!(f, ": {message}"),
            None => Ok(()),
        }
    }
}
