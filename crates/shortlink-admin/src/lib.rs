//! gRPC client for the identity service's admin check.

pub mod client;
pub mod proto;

pub use client::{AdminClientError, AdminClientSettings, GrpcAdminChecker};
