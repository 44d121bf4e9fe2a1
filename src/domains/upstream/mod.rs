//! Upstream domain module.
//!
//! Everything needed to talk to the PipeRun CRM API: call descriptors and
//! credentials, the retry policy, the wire transport and the retry-aware
//! executor that ties them together.
//!
//! ## Architecture
//!
//! - `descriptor.rs` - One upstream call, plus credential resolution
//! - `policy.rs` - Retry/backoff policy and failure classification
//! - `transport.rs` - `Transport` trait and the reqwest implementation
//! - `executor.rs` - Bounded retry loop around a transport
//! - `error.rs` - Upstream error types

mod descriptor;
mod error;
pub mod executor;
mod policy;
mod transport;

pub use descriptor::{
    Credential, HttpMethod, UpstreamCallDescriptor, query_scalar, resolve_credential,
};
pub use error::UpstreamError;
pub use executor::RequestExecutor;
pub use policy::{BACKOFF_MULTIPLIER, RetryPolicy, default_retryable_status};
pub use transport::{ReqwestTransport, TOKEN_HEADER, Transport, UpstreamResponse};
