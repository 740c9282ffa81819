use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{Chart, ChartWithOwner, NewChart, NewUser, UpdateOutcome, User, UserChanges};

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// True when the backend could not be reached, as opposed to a failed query
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlx(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_))
        )
    }
}

/// Every operation the API performs against users and charts.
///
/// Each method is a single read or write; nothing here is transactional
/// across calls.
#[async_trait]
pub trait Store: Send + Sync {
    /// Round-trip to the backend to confirm it is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    // Users

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// All users in creation order
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> Result<UpdateOutcome, StoreError>;

    /// Returns the number of removed users (0 or 1)
    async fn delete_user(&self, id: Uuid) -> Result<u64, StoreError>;

    /// Set the admin flag for every user with `email`; returns rows touched
    async fn set_admin(&self, email: &str, is_admin: bool) -> Result<u64, StoreError>;

    // Charts

    async fn insert_chart(&self, chart: NewChart) -> Result<Chart, StoreError>;

    async fn find_chart(&self, id: Uuid) -> Result<Option<Chart>, StoreError>;

    /// Charts owned by `owner`, newest first
    async fn charts_by_owner(&self, owner: Uuid) -> Result<Vec<Chart>, StoreError>;

    /// Every chart with its owner joined, newest first
    async fn charts_with_owners(&self) -> Result<Vec<ChartWithOwner>, StoreError>;

    /// Returns the number of removed charts (0 or 1)
    async fn delete_chart(&self, id: Uuid) -> Result<u64, StoreError>;
}
