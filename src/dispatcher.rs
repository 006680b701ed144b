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

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use static_assertions::assert_impl_all;
use tonic::transport::Channel;
use tonic::{Code, Status};
use tracing::{debug, warn};

use crate::error::{Result, TxnError};
use crate::protos::{
    Context,
    IsolationLevel,
    RegionError,
    StoreServiceClient,
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
    TxnScanRequest,
    TxnScanResponse,
};
use crate::router::{Region, RouterCache};

pub type ScanStream = BoxStream<'static, std::result::Result<TxnScanResponse, Status>>;

/// Seam over the wire. The grpc implementation dials the region leader per
/// call; tests substitute an in-process store.
#[async_trait]
pub trait StoreTransport: Send + Sync + 'static {
    async fn txn_get(&self, address: &str, request: TxnGetRequest)
        -> std::result::Result<TxnGetResponse, Status>;

    async fn txn_batch_get(
        &self,
        address: &str,
        request: TxnBatchGetRequest,
    ) -> std::result::Result<TxnBatchGetResponse, Status>;

    async fn txn_scan(&self, address: &str, request: TxnScanRequest) -> std::result::Result<ScanStream, Status>;

    async fn txn_prewrite(
        &self,
        address: &str,
        request: TxnPrewriteRequest,
    ) -> std::result::Result<TxnPrewriteResponse, Status>;

    async fn txn_commit(
        &self,
        address: &str,
        request: TxnCommitRequest,
    ) -> std::result::Result<TxnCommitResponse, Status>;

    async fn txn_batch_rollback(
        &self,
        address: &str,
        request: TxnBatchRollbackRequest,
    ) -> std::result::Result<TxnBatchRollbackResponse, Status>;

    async fn txn_check_txn_status(
        &self,
        address: &str,
        request: TxnCheckTxnStatusRequest,
    ) -> std::result::Result<TxnCheckTxnStatusResponse, Status>;
}

/// Responses whose routing error is checked before the payload.
pub trait RegionResponse {
    fn take_region_error(&mut self) -> Option<RegionError>;
}

macro_rules! impl_region_response {
    ($($response:ty),+ $(,)?) => {
        $(impl RegionResponse for $response {
            fn take_region_error(&mut self) -> Option<RegionError> {
                self.region_error.take()
            }
        })+
    };
}

impl_region_response! {
    TxnGetResponse,
    TxnBatchGetResponse,
    TxnScanResponse,
    TxnPrewriteResponse,
    TxnCommitResponse,
    TxnBatchRollbackResponse,
    TxnCheckTxnStatusResponse,
}

pub struct GrpcTransport;

impl GrpcTransport {
    async fn client(&self, address: &str) -> std::result::Result<StoreServiceClient<Channel>, Status> {
        StoreServiceClient::connect(address.to_string()).await.map_err(|e| Status::unavailable(e.to_string()))
    }
}

#[async_trait]
impl StoreTransport for GrpcTransport {
    async fn txn_get(
        &self,
        address: &str,
        request: TxnGetRequest,
    ) -> std::result::Result<TxnGetResponse, Status> {
        Ok(self.client(address).await?.txn_get(request).await?.into_inner())
    }

    async fn txn_batch_get(
        &self,
        address: &str,
        request: TxnBatchGetRequest,
    ) -> std::result::Result<TxnBatchGetResponse, Status> {
        Ok(self.client(address).await?.txn_batch_get(request).await?.into_inner())
    }

    async fn txn_scan(&self, address: &str, request: TxnScanRequest) -> std::result::Result<ScanStream, Status> {
        let streaming = self.client(address).await?.txn_scan(request).await?.into_inner();
        Ok(Box::pin(streaming))
    }

    async fn txn_prewrite(
        &self,
        address: &str,
        request: TxnPrewriteRequest,
    ) -> std::result::Result<TxnPrewriteResponse, Status> {
        Ok(self.client(address).await?.txn_prewrite(request).await?.into_inner())
    }

    async fn txn_commit(
        &self,
        address: &str,
        request: TxnCommitRequest,
    ) -> std::result::Result<TxnCommitResponse, Status> {
        Ok(self.client(address).await?.txn_commit(request).await?.into_inner())
    }

    async fn txn_batch_rollback(
        &self,
        address: &str,
        request: TxnBatchRollbackRequest,
    ) -> std::result::Result<TxnBatchRollbackResponse, Status> {
        Ok(self.client(address).await?.txn_batch_rollback(request).await?.into_inner())
    }

    async fn txn_check_txn_status(
        &self,
        address: &str,
        request: TxnCheckTxnStatusRequest,
    ) -> std::result::Result<TxnCheckTxnStatusResponse, Status> {
        Ok(self.client(address).await?.txn_check_txn_status(request).await?.into_inner())
    }
}

fn is_transient(status: &Status) -> bool {
    matches!(status.code(), Code::Unavailable | Code::DeadlineExceeded)
}

/// Sends shard-scoped requests, absorbing leader changes, stale epochs and
/// transient transport failures up to a bounded number of attempts.
///
/// Retry re-enters for: transient transport errors, not-leader redirects and
/// epoch mismatches that re-resolve to the *same* region. A key that migrated
/// to a different region surfaces [`TxnError::StaleRegion`] so the caller can
/// re-partition its work.
pub struct RpcDispatcher {
    transport: Arc<dyn StoreTransport>,
    router: Arc<RouterCache>,
    max_attempts: usize,
}

assert_impl_all!(RpcDispatcher: Send, Sync);

impl RpcDispatcher {
    pub fn new(transport: Arc<dyn StoreTransport>, router: Arc<RouterCache>, max_attempts: usize) -> Self {
        Self { transport, router, max_attempts: max_attempts.max(1) }
    }

    pub fn transport(&self) -> &Arc<dyn StoreTransport> {
        &self.transport
    }

    async fn reroute(&self, region: &Region) -> Result<Region> {
        self.router.invalidate(region.id).await;
        let fresh = self.router.lookup_region_by_key(&region.range.start).await?;
        if fresh.id != region.id {
            debug!("region {} re-resolved to region {}", region.id, fresh.id);
            return Err(TxnError::StaleRegion { region_id: region.id });
        }
        Ok(fresh)
    }

    async fn send<R, F, Fut>(&self, region: &Region, isolation: IsolationLevel, call: F) -> Result<R>
    where
        R: RegionResponse,
        F: Fn(Arc<dyn StoreTransport>, String, Context) -> Fut,
        Fut: Future<Output = std::result::Result<R, Status>>,
    {
        let mut current = region.clone();
        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            let context = Context::new(current.id, current.epoch, isolation);
            match call(self.transport.clone(), current.leader.clone(), context).await {
                Err(status) if is_transient(&status) => {
                    warn!("transient rpc failure against region {} (attempt {attempt}): {status}", current.id);
                    last_error = Some(TxnError::Transport(status));
                    current = self.reroute(&current).await?;
                },
                Err(status) => return Err(TxnError::Transport(status)),
                Ok(mut response) => match response.take_region_error() {
                    None => return Ok(response),
                    Some(region_error) => {
                        debug!("region error from region {} (attempt {attempt}): {region_error}", current.id);
                        last_error = Some(TxnError::StaleRegion { region_id: current.id });
                        match region_error.leader_hint() {
                            Some(leader) => {
                                self.router.update_leader(current.id, leader).await;
                                current.leader = leader.to_string();
                            },
                            None => current = self.reroute(&current).await?,
                        }
                    },
                },
            }
        }
        Err(last_error.unwrap_or(TxnError::StaleRegion { region_id: region.id }))
    }

    pub async fn txn_get(
        &self,
        region: &Region,
        isolation: IsolationLevel,
        request: TxnGetRequest,
    ) -> Result<TxnGetResponse> {
        self.send(region, isolation, move |transport, address, context| {
            let request = TxnGetRequest { context, ..request.clone() };
            async move { transport.txn_get(&address, request).await }
        })
        .await
    }

    pub async fn txn_batch_get(
        &self,
        region: &Region,
        isolation: IsolationLevel,
        request: TxnBatchGetRequest,
    ) -> Result<TxnBatchGetResponse> {
        self.send(region, isolation, move |transport, address, context| {
            let request = TxnBatchGetRequest { context, ..request.clone() };
            async move { transport.txn_batch_get(&address, request).await }
        })
        .await
    }

    pub async fn txn_prewrite(
        &self,
        region: &Region,
        isolation: IsolationLevel,
        request: TxnPrewriteRequest,
    ) -> Result<TxnPrewriteResponse> {
        self.send(region, isolation, move |transport, address, context| {
            let request = TxnPrewriteRequest { context, ..request.clone() };
            async move { transport.txn_prewrite(&address, request).await }
        })
        .await
    }

    pub async fn txn_commit(
        &self,
        region: &Region,
        isolation: IsolationLevel,
        request: TxnCommitRequest,
    ) -> Result<TxnCommitResponse> {
        self.send(region, isolation, move |transport, address, context| {
            let request = TxnCommitRequest { context, ..request.clone() };
            async move { transport.txn_commit(&address, request).await }
        })
        .await
    }

    pub async fn txn_batch_rollback(
        &self,
        region: &Region,
        isolation: IsolationLevel,
        request: TxnBatchRollbackRequest,
    ) -> Result<TxnBatchRollbackResponse> {
        self.send(region, isolation, move |transport, address, context| {
            let request = TxnBatchRollbackRequest { context, ..request.clone() };
            async move { transport.txn_batch_rollback(&address, request).await }
        })
        .await
    }

    pub async fn txn_check_txn_status(
        &self,
        region: &Region,
        isolation: IsolationLevel,
        request: TxnCheckTxnStatusRequest,
    ) -> Result<TxnCheckTxnStatusResponse> {
        self.send(region, isolation, move |transport, address, context| {
            let request = TxnCheckTxnStatusRequest { context, ..request.clone() };
            async move { transport.txn_check_txn_status(&address, request).await }
        })
        .await
    }

    /// Opens the server-side scan stream. Stream items are checked by the
    /// region scanner; only the open itself is retried here.
    pub async fn open_scan(
        &self,
        region: &Region,
        isolation: IsolationLevel,
        request: TxnScanRequest,
    ) -> Result<ScanStream> {
        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            let request = TxnScanRequest {
                context: Context::new(region.id, region.epoch, isolation),
                ..request.clone()
            };
            match self.transport.txn_scan(&region.leader, request).await {
                Ok(stream) => return Ok(stream),
                Err(status) if is_transient(&status) => {
                    warn!("transient scan open failure against region {} (attempt {attempt}): {status}", region.id);
                    last_error = Some(TxnError::Transport(status));
                },
                Err(status) => return Err(TxnError::Transport(status)),
            }
        }
        Err(last_error.unwrap_or(TxnError::StaleRegion { region_id: region.id }))
    }
}
