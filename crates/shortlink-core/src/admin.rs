use crate::error::AdminCheckError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Answers whether a user holds admin rights.
///
/// The authority lives outside this service (an identity service reached over
/// gRPC in production), so implementations own their timeout and retry policy.
#[async_trait]
pub trait AdminChecker: Send + Sync + 'static {
    async fn is_admin(&self, user_id: i64) -> Result<bool, AdminCheckError>;
}

#[async_trait]
impl<T: AdminChecker + ?Sized> AdminChecker for Arc<T> {
    async fn is_admin(&self, user_id: i64) -> Result<bool, AdminCheckError> {
        (**self).is_admin(user_id).await
    }
}

/// An admin checker backed by a fixed set of user ids.
///
/// Used when no identity service is configured, and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAdminChecker {
    admins: HashSet<i64>,
}

impl StaticAdminChecker {
    pub fn new(admins: impl IntoIterator<Item = i64>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }
}

#[async_trait]
impl AdminChecker for StaticAdminChecker {
    async fn is_admin(&self, user_id: i64) -> Result<bool, AdminCheckError> {
        Ok(self.admins.contains(&user_id))
    }
}
