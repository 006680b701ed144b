#[derive(Copy, Eq, PartialOrd, Ord)]
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Timestamp {
    #[prost(uint64, required, tag = "1")]
    pub physical: u64,
    #[prost(uint64, required, tag = "2")]
    pub logical: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Context {
    #[prost(uint64, required, tag = "1")]
    pub region_id: u64,
    #[prost(uint64, required, tag = "2")]
    pub region_epoch: u64,
    #[prost(enumeration = "IsolationLevel", required, tag = "3")]
    pub isolation_level: i32,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NotLeader {
    #[prost(string, optional, tag = "1")]
    pub leader_address: ::core::option::Option<::prost::alloc::string::String>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EpochMismatch {}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegionMissing {}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegionError {
    #[prost(string, optional, tag = "1")]
    pub message: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(message, optional, tag = "2")]
    pub not_leader: ::core::option::Option<NotLeader>,
    #[prost(message, optional, tag = "3")]
    pub epoch_mismatch: ::core::option::Option<EpochMismatch>,
    #[prost(message, optional, tag = "4")]
    pub region_missing: ::core::option::Option<RegionMissing>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Mutation {
    #[prost(enumeration = "MutationOp", required, tag = "1")]
    pub op: i32,
    #[prost(bytes = "vec", required, tag = "2")]
    pub key: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub value: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyValue {
    #[prost(bytes = "vec", required, tag = "1")]
    pub key: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", required, tag = "2")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyRange {
    #[prost(bytes = "vec", required, tag = "1")]
    pub start: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", required, tag = "2")]
    pub end: ::prost::alloc::vec::Vec<u8>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LockInfo {
    #[prost(bytes = "vec", required, tag = "1")]
    pub primary_lock: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, required, tag = "2")]
    pub lock_ts: Timestamp,
    #[prost(bytes = "vec", required, tag = "3")]
    pub key: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, required, tag = "4")]
    pub lock_ttl: u64,
    #[prost(uint64, required, tag = "5")]
    pub txn_size: u64,
    #[prost(enumeration = "MutationOp", required, tag = "6")]
    pub lock_kind: i32,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WriteConflict {
    #[prost(message, required, tag = "1")]
    pub start_ts: Timestamp,
    #[prost(message, required, tag = "2")]
    pub conflict_ts: Timestamp,
    #[prost(bytes = "vec", required, tag = "3")]
    pub key: ::prost::alloc::vec::Vec<u8>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnNotFound {
    #[prost(message, required, tag = "1")]
    pub start_ts: Timestamp,
    #[prost(bytes = "vec", required, tag = "2")]
    pub primary_key: ::prost::alloc::vec::Vec<u8>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnResultInfo {
    #[prost(oneof = "txn_result_info::Conflict", tags = "1, 2, 3")]
    pub conflict: ::core::option::Option<txn_result_info::Conflict>,
}
/// Nested message and enum types in `TxnResultInfo`.
pub mod txn_result_info {
    #[allow(clippy::derive_partial_eq_without_eq)]
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Conflict {
        #[prost(message, tag = "1")]
        Locked(super::LockInfo),
        #[prost(message, tag = "2")]
        WriteConflict(super::WriteConflict),
        #[prost(message, tag = "3")]
        TxnNotFound(super::TxnNotFound),
    }
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnGetRequest {
    #[prost(message, required, tag = "1")]
    pub context: Context,
    #[prost(message, required, tag = "2")]
    pub start_ts: Timestamp,
    #[prost(bytes = "vec", required, tag = "3")]
    pub key: ::prost::alloc::vec::Vec<u8>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnGetResponse {
    #[prost(message, optional, tag = "1")]
    pub region_error: ::core::option::Option<RegionError>,
    #[prost(message, optional, tag = "2")]
    pub txn_result: ::core::option::Option<TxnResultInfo>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub value: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnBatchGetRequest {
    #[prost(message, required, tag = "1")]
    pub context: Context,
    #[prost(message, required, tag = "2")]
    pub start_ts: Timestamp,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub keys: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnBatchGetResponse {
    #[prost(message, optional, tag = "1")]
    pub region_error: ::core::option::Option<RegionError>,
    #[prost(message, optional, tag = "2")]
    pub txn_result: ::core::option::Option<TxnResultInfo>,
    #[prost(message, repeated, tag = "3")]
    pub kvs: ::prost::alloc::vec::Vec<KeyValue>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnScanRequest {
    #[prost(message, required, tag = "1")]
    pub context: Context,
    #[prost(message, required, tag = "2")]
    pub start_ts: Timestamp,
    #[prost(message, required, tag = "3")]
    pub range: KeyRange,
    #[prost(uint32, required, tag = "4")]
    pub limit: u32,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnScanResponse {
    #[prost(message, optional, tag = "1")]
    pub region_error: ::core::option::Option<RegionError>,
    #[prost(message, optional, tag = "2")]
    pub txn_result: ::core::option::Option<TxnResultInfo>,
    #[prost(message, repeated, tag = "3")]
    pub kvs: ::prost::alloc::vec::Vec<KeyValue>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnPrewriteRequest {
    #[prost(message, required, tag = "1")]
    pub context: Context,
    #[prost(message, required, tag = "2")]
    pub start_ts: Timestamp,
    #[prost(message, repeated, tag = "3")]
    pub mutations: ::prost::alloc::vec::Vec<Mutation>,
    #[prost(bytes = "vec", required, tag = "4")]
    pub primary_lock: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, required, tag = "5")]
    pub lock_ttl: u64,
    #[prost(uint64, required, tag = "6")]
    pub txn_size: u64,
    #[prost(bool, required, tag = "7")]
    pub try_one_pc: bool,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnPrewriteResponse {
    #[prost(message, optional, tag = "1")]
    pub region_error: ::core::option::Option<RegionError>,
    #[prost(message, repeated, tag = "2")]
    pub txn_results: ::prost::alloc::vec::Vec<TxnResultInfo>,
    /// Set iff the prewrite carried try_one_pc and committed in one phase.
    #[prost(message, optional, tag = "3")]
    pub one_pc_commit_ts: ::core::option::Option<Timestamp>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnCommitRequest {
    #[prost(message, required, tag = "1")]
    pub context: Context,
    #[prost(message, required, tag = "2")]
    pub start_ts: Timestamp,
    #[prost(message, required, tag = "3")]
    pub commit_ts: Timestamp,
    #[prost(bytes = "vec", repeated, tag = "4")]
    pub keys: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnCommitResponse {
    #[prost(message, optional, tag = "1")]
    pub region_error: ::core::option::Option<RegionError>,
    #[prost(message, optional, tag = "2")]
    pub txn_result: ::core::option::Option<TxnResultInfo>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnBatchRollbackRequest {
    #[prost(message, required, tag = "1")]
    pub context: Context,
    #[prost(message, required, tag = "2")]
    pub start_ts: Timestamp,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub keys: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnBatchRollbackResponse {
    #[prost(message, optional, tag = "1")]
    pub region_error: ::core::option::Option<RegionError>,
    #[prost(message, optional, tag = "2")]
    pub txn_result: ::core::option::Option<TxnResultInfo>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnCheckTxnStatusRequest {
    #[prost(message, required, tag = "1")]
    pub context: Context,
    #[prost(bytes = "vec", required, tag = "2")]
    pub primary_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, required, tag = "3")]
    pub lock_ts: Timestamp,
    #[prost(message, required, tag = "4")]
    pub caller_start_ts: Timestamp,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxnCheckTxnStatusResponse {
    #[prost(message, optional, tag = "1")]
    pub region_error: ::core::option::Option<RegionError>,
    #[prost(enumeration = "TxnAction", required, tag = "2")]
    pub action: i32,
    #[prost(message, optional, tag = "3")]
    pub commit_ts: ::core::option::Option<Timestamp>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTimestampRequest {}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTimestampResponse {
    #[prost(message, required, tag = "1")]
    pub timestamp: Timestamp,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum IsolationLevel {
    SnapshotIsolation = 0,
    ReadCommitted = 1,
}
impl IsolationLevel {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            IsolationLevel::SnapshotIsolation => "SnapshotIsolation",
            IsolationLevel::ReadCommitted => "ReadCommitted",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "SnapshotIsolation" => Some(Self::SnapshotIsolation),
            "ReadCommitted" => Some(Self::ReadCommitted),
            _ => None,
        }
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum MutationOp {
    Put = 0,
    PutIfAbsent = 1,
    Delete = 2,
}
impl MutationOp {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            MutationOp::Put => "Put",
            MutationOp::PutIfAbsent => "PutIfAbsent",
            MutationOp::Delete => "Delete",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "Put" => Some(Self::Put),
            "PutIfAbsent" => Some(Self::PutIfAbsent),
            "Delete" => Some(Self::Delete),
            _ => None,
        }
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TxnAction {
    LockAlive = 0,
    Committed = 1,
    RolledBack = 2,
    TtlExpired = 3,
}
impl TxnAction {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            TxnAction::LockAlive => "LockAlive",
            TxnAction::Committed => "Committed",
            TxnAction::RolledBack => "RolledBack",
            TxnAction::TtlExpired => "TtlExpired",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "LockAlive" => Some(Self::LockAlive),
            "Committed" => Some(Self::Committed),
            "RolledBack" => Some(Self::RolledBack),
            "TtlExpired" => Some(Self::TtlExpired),
            _ => None,
        }
    }
}
/// Generated client implementations.
pub mod store_service_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::http::Uri;
    use tonic::codegen::*;
    #[derive(Debug, Clone)]
    pub struct StoreServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl StoreServiceClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> StoreServiceClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_origin(inner: T, origin: Uri) -> Self {
            let inner = tonic::client::Grpc::with_origin(inner, origin);
            Self { inner }
        }
        pub fn with_interceptor<F>(inner: T, interceptor: F) -> StoreServiceClient<InterceptedService<T, F>>
        where
            F: tonic::service::Interceptor,
            T::ResponseBody: Default,
            T: tonic::codegen::Service<
                http::Request<tonic::body::BoxBody>,
                Response = http::Response<<T as tonic::client::GrpcService<tonic::body::BoxBody>>::ResponseBody>,
            >,
            <T as tonic::codegen::Service<http::Request<tonic::body::BoxBody>>>::Error: Into<StdError> + Send + Sync,
        {
            StoreServiceClient::new(InterceptedService::new(inner, interceptor))
        }
        /// Compress requests with the given encoding.
        ///
        /// This requires the server to support it otherwise it might respond with an
        /// error.
        #[must_use]
        pub fn send_compressed(mut self, encoding: CompressionEncoding) -> Self {
            self.inner = self.inner.send_compressed(encoding);
            self
        }
        /// Enable decompressing responses.
        #[must_use]
        pub fn accept_compressed(mut self, encoding: CompressionEncoding) -> Self {
            self.inner = self.inner.accept_compressed(encoding);
            self
        }
        /// Limits the maximum size of a decoded message.
        ///
        /// Default: `4MB`
        #[must_use]
        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }
        /// Limits the maximum size of an encoded message.
        ///
        /// Default: `usize::MAX`
        #[must_use]
        pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_encoding_message_size(limit);
            self
        }
        pub async fn txn_get(
            &mut self,
            request: impl tonic::IntoRequest<super::TxnGetRequest>,
        ) -> std::result::Result<tonic::Response<super::TxnGetResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/shalekv.StoreService/TxnGet");
            let mut req = request.into_request();
            req.extensions_mut().insert(GrpcMethod::new("shalekv.StoreService", "TxnGet"));
            self.inner.unary(req, path, codec).await
        }
        pub async fn txn_batch_get(
            &mut self,
            request: impl tonic::IntoRequest<super::TxnBatchGetRequest>,
        ) -> std::result::Result<tonic::Response<super::TxnBatchGetResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/shalekv.StoreService/TxnBatchGet");
            let mut req = request.into_request();
            req.extensions_mut().insert(GrpcMethod::new("shalekv.StoreService", "TxnBatchGet"));
            self.inner.unary(req, path, codec).await
        }
        pub async fn txn_scan(
            &mut self,
            request: impl tonic::IntoRequest<super::TxnScanRequest>,
        ) -> std::result::Result<tonic::Response<tonic::codec::Streaming<super::TxnScanResponse>>, tonic::Status>
        {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/shalekv.StoreService/TxnScan");
            let mut req = request.into_request();
            req.extensions_mut().insert(GrpcMethod::new("shalekv.StoreService", "TxnScan"));
            self.inner.server_streaming(req, path, codec).await
        }
        pub async fn txn_prewrite(
            &mut self,
            request: impl tonic::IntoRequest<super::TxnPrewriteRequest>,
        ) -> std::result::Result<tonic::Response<super::TxnPrewriteResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/shalekv.StoreService/TxnPrewrite");
            let mut req = request.into_request();
            req.extensions_mut().insert(GrpcMethod::new("shalekv.StoreService", "TxnPrewrite"));
            self.inner.unary(req, path, codec).await
        }
        pub async fn txn_commit(
            &mut self,
            request: impl tonic::IntoRequest<super::TxnCommitRequest>,
        ) -> std::result::Result<tonic::Response<super::TxnCommitResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/shalekv.StoreService/TxnCommit");
            let mut req = request.into_request();
            req.extensions_mut().insert(GrpcMethod::new("shalekv.StoreService", "TxnCommit"));
            self.inner.unary(req, path, codec).await
        }
        pub async fn txn_batch_rollback(
            &mut self,
            request: impl tonic::IntoRequest<super::TxnBatchRollbackRequest>,
        ) -> std::result::Result<tonic::Response<super::TxnBatchRollbackResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/shalekv.StoreService/TxnBatchRollback");
            let mut req = request.into_request();
            req.extensions_mut().insert(GrpcMethod::new("shalekv.StoreService", "TxnBatchRollback"));
            self.inner.unary(req, path, codec).await
        }
        pub async fn txn_check_txn_status(
            &mut self,
            request: impl tonic::IntoRequest<super::TxnCheckTxnStatusRequest>,
        ) -> std::result::Result<tonic::Response<super::TxnCheckTxnStatusResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/shalekv.StoreService/TxnCheckTxnStatus");
            let mut req = request.into_request();
            req.extensions_mut().insert(GrpcMethod::new("shalekv.StoreService", "TxnCheckTxnStatus"));
            self.inner.unary(req, path, codec).await
        }
    }
}
/// Generated client implementations.
pub mod tso_service_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::http::Uri;
    use tonic::codegen::*;
    #[derive(Debug, Clone)]
    pub struct TsoServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl TsoServiceClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> TsoServiceClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_origin(inner: T, origin: Uri) -> Self {
            let inner = tonic::client::Grpc::with_origin(inner, origin);
            Self { inner }
        }
        pub fn with_interceptor<F>(inner: T, interceptor: F) -> TsoServiceClient<InterceptedService<T, F>>
        where
            F: tonic::service::Interceptor,
            T::ResponseBody: Default,
            T: tonic::codegen::Service<
                http::Request<tonic::body::BoxBody>,
                Response = http::Response<<T as tonic::client::GrpcService<tonic::body::BoxBody>>::ResponseBody>,
            >,
            <T as tonic::codegen::Service<http::Request<tonic::body::BoxBody>>>::Error: Into<StdError> + Send + Sync,
        {
            TsoServiceClient::new(InterceptedService::new(inner, interceptor))
        }
        /// Compress requests with the given encoding.
        ///
        /// This requires the server to support it otherwise it might respond with an
        /// error.
        #[must_use]
        pub fn send_compressed(mut self, encoding: CompressionEncoding) -> Self {
            self.inner = self.inner.send_compressed(encoding);
            self
        }
        /// Enable decompressing responses.
        #[must_use]
        pub fn accept_compressed(mut self, encoding: CompressionEncoding) -> Self {
            self.inner = self.inner.accept_compressed(encoding);
            self
        }
        /// Limits the maximum size of a decoded message.
        ///
        /// Default: `4MB`
        #[must_use]
        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }
        /// Limits the maximum size of an encoded message.
        ///
        /// Default: `usize::MAX`
        #[must_use]
        pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_encoding_message_size(limit);
            self
        }
        pub async fn get_timestamp(
            &mut self,
            request: impl tonic::IntoRequest<super::GetTimestampRequest>,
        ) -> std::result::Result<tonic::Response<super::GetTimestampResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/shalekv.TsoService/GetTimestamp");
            let mut req = request.into_request();
            req.extensions_mut().insert(GrpcMethod::new("shalekv.TsoService", "GetTimestamp"));
            self.inner.unary(req, path, codec).await
        }
    }
}
