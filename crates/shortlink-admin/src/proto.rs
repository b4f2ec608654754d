//! Generated wire types and client for the identity service's `auth.Auth`.

pub mod auth {
    tonic::include_proto!("auth");
}

pub use auth::auth_client::AuthClient;
pub use auth::{IsAdminRequest, IsAdminResponse};
