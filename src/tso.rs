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

use async_trait::async_trait;
use static_assertions::assert_impl_all;
use tonic::Status;

use crate::protos::{GetTimestampRequest, Timestamp, TsoServiceClient};

/// Source of monotonically increasing transaction timestamps.
#[async_trait]
pub trait TimestampOracle: Send + Sync + 'static {
    async fn timestamp(&self) -> Result<Timestamp, Status>;
}

/// Caches the newest timestamp ever observed and rejects regressions.
pub struct MonotonicGuard {
    last: spin::Mutex<Timestamp>,
}

impl MonotonicGuard {
    pub fn new() -> Self {
        Self { last: spin::Mutex::new(Timestamp::zero()) }
    }

    pub fn observe(&self, timestamp: Timestamp) -> Result<Timestamp, Status> {
        let mut last = self.last.lock();
        if timestamp <= *last {
            return Err(Status::data_loss(format!("timestamp oracle regressed from {} to {}", *last, timestamp)));
        }
        *last = timestamp;
        Ok(timestamp)
    }
}

impl Default for MonotonicGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp oracle backed by the TSO grpc service.
pub struct GrpcTimestampOracle {
    address: String,
    guard: MonotonicGuard,
}

assert_impl_all!(GrpcTimestampOracle: Send, Sync);

impl GrpcTimestampOracle {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), guard: MonotonicGuard::new() }
    }
}

#[async_trait]
impl TimestampOracle for GrpcTimestampOracle {
    async fn timestamp(&self) -> Result<Timestamp, Status> {
        let mut client =
            TsoServiceClient::connect(self.address.clone()).await.map_err(|e| Status::unavailable(e.to_string()))?;
        let response = client.get_timestamp(GetTimestampRequest {}).await?.into_inner();
        self.guard.observe(response.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use assertor::*;

    use super::*;

    #[test]
    fn test_guard_accepts_increasing() {
        let guard = MonotonicGuard::new();
        let ts1 = guard.observe(Timestamp { physical: 1, logical: 0 }).unwrap();
        let ts2 = guard.observe(Timestamp { physical: 1, logical: 1 }).unwrap();
        assert_that!(ts2).is_greater_than(ts1);
    }

    #[test]
    fn test_guard_rejects_regression() {
        let guard = MonotonicGuard::new();
        guard.observe(Timestamp { physical: 5, logical: 0 }).unwrap();
        assert!(guard.observe(Timestamp { physical: 5, logical: 0 }).is_err());
        assert!(guard.observe(Timestamp { physical: 4, logical: 9 }).is_err());
        guard.observe(Timestamp { physical: 5, logical: 1 }).unwrap();
    }
}
