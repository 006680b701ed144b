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

use crate::protos::{Mutation, MutationOp};

/// Ordered log of a transaction's local mutations, one entry per key.
///
/// The buffer is consulted before any remote read so the transaction sees its
/// own writes, and drained at prewrite time. The primary key is pinned to the
/// first non-empty key ever written and stays stable for the transaction's
/// lifetime.
#[derive(Default)]
pub struct TxnBuffer {
    mutations: BTreeMap<Vec<u8>, Mutation>,
    primary_key: Option<Vec<u8>>,
}

impl TxnBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn pin_primary(&mut self, key: &[u8]) {
        if self.primary_key.is_none() && !key.is_empty() {
            self.primary_key = Some(key.to_vec());
        }
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        self.pin_primary(&key);
        self.mutations.insert(key.clone(), Mutation::put(key, value.into()));
    }

    /// Inserts only when the key is not buffered yet. A buffered `Delete` is
    /// superseded with a plain `Put` since the deletion proves the key will
    /// not exist server-side; a buffered `Put`/`PutIfAbsent` wins.
    pub fn put_if_absent(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        self.pin_primary(&key);
        match self.mutations.get(&key).map(|m| m.op()) {
            None => {
                self.mutations.insert(key.clone(), Mutation::put_if_absent(key, value.into()));
            },
            Some(MutationOp::Delete) => {
                self.mutations.insert(key.clone(), Mutation::put(key, value.into()));
            },
            Some(MutationOp::Put) | Some(MutationOp::PutIfAbsent) => {},
        }
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        let key = key.into();
        self.pin_primary(&key);
        self.mutations.insert(key.clone(), Mutation::delete(key));
    }

    pub fn get(&self, key: &[u8]) -> Option<&Mutation> {
        self.mutations.get(key)
    }

    /// Buffered mutations with `start <= key < end`, in key order.
    pub fn range(&self, start: &[u8], end: &[u8]) -> Vec<Mutation> {
        self.mutations
            .range::<[u8], _>((Bound::Included(start), Bound::Excluded(end)))
            .map(|(_, mutation)| mutation.clone())
            .collect()
    }

    /// All buffered mutations in key order.
    pub fn mutations(&self) -> impl Iterator<Item = &Mutation> {
        self.mutations.values()
    }

    pub fn primary_key(&self) -> Option<&[u8]> {
        self.primary_key.as_deref()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
