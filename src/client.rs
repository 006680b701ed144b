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

use static_assertions::assert_impl_all;

use crate::dispatcher::{GrpcTransport, RpcDispatcher, StoreTransport};
use crate::error::Result;
use crate::executor::ParallelExecutor;
use crate::resolver::LockResolver;
use crate::router::{RegionSource, RouterCache};
use crate::tso::{GrpcTimestampOracle, TimestampOracle};
use crate::txn::{Txn, TxnOptions};

/// Tunables of the transaction coordinator.
#[derive(Clone, Debug)]
pub struct TxnConfig {
    /// Bound on per-sub-task retries after lock conflicts.
    pub max_retry: usize,
    /// Sleep between such retries.
    pub op_delay: Duration,
    /// Mutations or keys per shard-scoped rpc chunk.
    pub max_batch_count: usize,
    /// Prewrite lock ttl. Effectively infinite by default since no heartbeat
    /// runs; crashed clients rely on resolvers observing a terminal status.
    pub lock_ttl: u64,
    /// Bound on dispatcher-level transport/routing retries.
    pub max_rpc_attempts: usize,
    /// Parallel executor permit count.
    pub max_concurrency: usize,
    /// Per-request row cap forwarded to server-side scans.
    pub scan_batch_limit: u32,
}

impl Default for TxnConfig {
    fn default() -> Self {
        Self {
            max_retry: 3,
            op_delay: Duration::from_millis(100),
            max_batch_count: 1024,
            lock_ttl: u64::MAX,
            max_rpc_attempts: 3,
            max_concurrency: 8,
            scan_batch_limit: 256,
        }
    }
}

struct ClientCore {
    config: TxnConfig,
    router: Arc<RouterCache>,
    tso: Arc<dyn TimestampOracle>,
    dispatcher: Arc<RpcDispatcher>,
    resolver: Arc<LockResolver>,
    executor: ParallelExecutor,
}

/// Shared handle to the process-wide transaction services: routing cache,
/// timestamp oracle, rpc dispatcher, lock resolver and parallel executor.
///
/// Cheap to clone; every transaction references the same underlying services.
#[derive(Clone)]
pub struct TxnClient {
    core: Arc<ClientCore>,
}

assert_impl_all!(TxnClient: Send, Sync);

impl TxnClient {
    pub fn new(
        source: Arc<dyn RegionSource>,
        tso: Arc<dyn TimestampOracle>,
        transport: Arc<dyn StoreTransport>,
        config: TxnConfig,
    ) -> Self {
        let router = Arc::new(RouterCache::new(source));
        let dispatcher = Arc::new(RpcDispatcher::new(transport, router.clone(), config.max_rpc_attempts));
        let resolver = Arc::new(LockResolver::new(dispatcher.clone(), router.clone()));
        let executor = ParallelExecutor::new(config.max_concurrency);
        Self { core: Arc::new(ClientCore { config, router, tso, dispatcher, resolver, executor }) }
    }

    /// Production wiring: grpc transport plus the grpc timestamp oracle at
    /// `tso_address`. Region geometry still comes from the deployment's meta
    /// service seam.
    pub fn with_grpc(source: Arc<dyn RegionSource>, tso_address: impl Into<String>, config: TxnConfig) -> Self {
        Self::new(source, Arc::new(GrpcTimestampOracle::new(tso_address)), Arc::new(GrpcTransport), config)
    }

    /// New transaction in its initial state; drive it with [`Txn::begin`].
    pub fn new_transaction(&self, options: TxnOptions) -> Txn {
        Txn::new(self.clone(), options)
    }

    /// New transaction with a start timestamp already assigned.
    pub async fn begin_with_options(&self, options: TxnOptions) -> Result<Txn> {
        let mut txn = self.new_transaction(options);
        txn.begin().await?;
        Ok(txn)
    }

    pub async fn begin(&self) -> Result<Txn> {
        self.begin_with_options(TxnOptions::default()).await
    }

    pub(crate) fn config(&self) -> &TxnConfig {
        &self.core.config
    }

    pub(crate) fn router(&self) -> &Arc<RouterCache> {
        &self.core.router
    }

    pub(crate) fn tso(&self) -> &Arc<dyn TimestampOracle> {
        &self.core.tso
    }

    pub(crate) fn dispatcher(&self) -> &Arc<RpcDispatcher> {
        &self.core.dispatcher
    }

    pub(crate) fn resolver(&self) -> &Arc<LockResolver> {
        &self.core.resolver
    }

    pub(crate) fn executor(&self) -> &ParallelExecutor {
        &self.core.executor
    }
}
