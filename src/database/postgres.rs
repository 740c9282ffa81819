use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::models::{
    Chart, ChartOwner, ChartWithOwner, NewChart, NewUser, UpdateOutcome, User, UserChanges,
};
use super::store::{Store, StoreError};

const USER_COLUMNS: &str = "id, username, email, phone, password, is_admin, created_at, updated_at";
const CHART_COLUMNS: &str =
    "id, title, labels, data_values, chart_type, created_by, created_at, updated_at";

/// Postgres-backed store over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Chart row with the owner's columns from a LEFT JOIN
#[derive(Debug, FromRow)]
struct ChartOwnerRow {
    id: Uuid,
    title: String,
    labels: Vec<String>,
    data_values: Vec<f64>,
    chart_type: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_id: Option<Uuid>,
    owner_username: Option<String>,
    owner_email: Option<String>,
}

impl From<ChartOwnerRow> for ChartWithOwner {
    fn from(row: ChartOwnerRow) -> Self {
        let owner = match (row.owner_id, row.owner_username, row.owner_email) {
            (Some(id), Some(username), Some(email)) => Some(ChartOwner { id, username, email }),
            _ => None,
        };
        let chart = Chart {
            id: row.id,
            title: row.title,
            labels: row.labels,
            values: row.data_values,
            chart_type: row.chart_type,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        ChartWithOwner::new(chart, owner)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        // Emails are not unique at the store level; the oldest match wins
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 ORDER BY created_at ASC LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user(Utc::now());
        sqlx::query(
            "INSERT INTO users (id, username, email, phone, password, is_admin, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> Result<UpdateOutcome, StoreError> {
        let Some(mut user) = self.find_user(id).await? else {
            return Ok(UpdateOutcome::unmatched());
        };

        if !changes.apply(&mut user, Utc::now()) {
            return Ok(UpdateOutcome::matched(false));
        }

        let result = sqlx::query(
            "UPDATE users SET username = $2, email = $3, phone = $4, password = $5, updated_at = $6
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        // The row may have been deleted between the read and the write
        if result.rows_affected() == 0 {
            return Ok(UpdateOutcome::unmatched());
        }
        Ok(UpdateOutcome::matched(true))
    }

    async fn delete_user(&self, id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_admin(&self, email: &str, is_admin: bool) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE users SET is_admin = $2, updated_at = now() WHERE email = $1")
            .bind(email)
            .bind(is_admin)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_chart(&self, chart: NewChart) -> Result<Chart, StoreError> {
        let chart = chart.into_chart(Utc::now());
        sqlx::query(
            "INSERT INTO charts (id, title, labels, data_values, chart_type, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(chart.id)
        .bind(&chart.title)
        .bind(&chart.labels)
        .bind(&chart.values)
        .bind(&chart.chart_type)
        .bind(chart.created_by)
        .bind(chart.created_at)
        .bind(chart.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(chart)
    }

    async fn find_chart(&self, id: Uuid) -> Result<Option<Chart>, StoreError> {
        let sql = format!("SELECT {CHART_COLUMNS} FROM charts WHERE id = $1");
        let chart = sqlx::query_as::<_, Chart>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(chart)
    }

    async fn charts_by_owner(&self, owner: Uuid) -> Result<Vec<Chart>, StoreError> {
        let sql = format!(
            "SELECT {CHART_COLUMNS} FROM charts WHERE created_by = $1 ORDER BY created_at DESC"
        );
        let charts = sqlx::query_as::<_, Chart>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(charts)
    }

    async fn charts_with_owners(&self) -> Result<Vec<ChartWithOwner>, StoreError> {
        let rows = sqlx::query_as::<_, ChartOwnerRow>(
            "SELECT c.id, c.title, c.labels, c.data_values, c.chart_type, c.created_by,
                    c.created_at, c.updated_at,
                    u.id AS owner_id, u.username AS owner_username, u.email AS owner_email
             FROM charts c
             LEFT JOIN users u ON u.id = c.created_by
             ORDER BY c.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ChartWithOwner::from).collect())
    }

    async fn delete_chart(&self, id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM charts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
