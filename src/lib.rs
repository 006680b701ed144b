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

//! Client-side transaction coordinator for the ShaleKV distributed
//! key-value store.
//!
//! Transactions buffer their writes locally, read through the buffer for
//! read-your-writes, and commit with a Percolator-style two-phase protocol
//! across the regions owning their keys. The routing cache, timestamp
//! oracle, rpc dispatcher and lock resolver are process-wide services
//! bundled in a [`TxnClient`].

mod buffer;
mod client;
mod dispatcher;
mod error;
mod executor;
pub mod protos;
mod resolver;
mod router;
mod scanner;
mod tso;
mod txn;

pub use self::buffer::TxnBuffer;
pub use self::client::{TxnClient, TxnConfig};
pub use self::dispatcher::{GrpcTransport, RpcDispatcher, ScanStream, StoreTransport};
pub use self::error::{Result, TxnError};
pub use self::executor::{ParallelExecutor, TaskError};
pub use self::resolver::LockResolver;
pub use self::router::{Region, RegionSource, RouterCache};
pub use self::scanner::{RegionScanner, ScanState};
pub use self::tso::{GrpcTimestampOracle, MonotonicGuard, TimestampOracle};
pub use self::txn::{Txn, TxnKind, TxnOptions, TxnState};
