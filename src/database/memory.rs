use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Chart, ChartOwner, ChartWithOwner, NewChart, NewUser, UpdateOutcome, User, UserChanges,
};
use super::store::{Store, StoreError};

/// Process-local store backed by vectors in insertion order.
/// Used by the test suites and `STORE_BACKEND=memory`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    users: Arc<RwLock<Vec<User>>>,
    charts: Arc<RwLock<Vec<Chart>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(charts: &mut [Chart]) {
    // Later inserts win ties on equal timestamps
    charts.reverse();
    charts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().await.clone())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user(Utc::now());
        self.users.write().await.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> Result<UpdateOutcome, StoreError> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => Ok(UpdateOutcome::matched(changes.apply(user, Utc::now()))),
            None => Ok(UpdateOutcome::unmatched()),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok((before - users.len()) as u64)
    }

    async fn set_admin(&self, email: &str, is_admin: bool) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let now = Utc::now();
        let mut touched = 0;
        for user in users.iter_mut().filter(|u| u.email == email) {
            user.is_admin = is_admin;
            user.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn insert_chart(&self, chart: NewChart) -> Result<Chart, StoreError> {
        let chart = chart.into_chart(Utc::now());
        self.charts.write().await.push(chart.clone());
        Ok(chart)
    }

    async fn find_chart(&self, id: Uuid) -> Result<Option<Chart>, StoreError> {
        let charts = self.charts.read().await;
        Ok(charts.iter().find(|c| c.id == id).cloned())
    }

    async fn charts_by_owner(&self, owner: Uuid) -> Result<Vec<Chart>, StoreError> {
        let mut owned: Vec<Chart> = {
            let charts = self.charts.read().await;
            charts.iter().filter(|c| c.created_by == owner).cloned().collect()
        };
        newest_first(&mut owned);
        Ok(owned)
    }

    async fn charts_with_owners(&self) -> Result<Vec<ChartWithOwner>, StoreError> {
        let mut charts = self.charts.read().await.clone();
        newest_first(&mut charts);

        let users = self.users.read().await;
        Ok(charts
            .into_iter()
            .map(|chart| {
                let owner = users.iter().find(|u| u.id == chart.created_by).map(|u| ChartOwner {
                    id: u.id,
                    username: u.username.clone(),
                    email: u.email.clone(),
                });
                ChartWithOwner::new(chart, owner)
            })
            .collect())
    }

    async fn delete_chart(&self, id: Uuid) -> Result<u64, StoreError> {
        let mut charts = self.charts.write().await;
        let before = charts.len();
        charts.retain(|c| c.id != id);
        Ok((before - charts.len()) as u64)
    }
}
