use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::api::format::serialize_numbers;

pub const DEFAULT_CHART_TITLE: &str = "Untitled";
pub const DEFAULT_CHART_TYPE: &str = "bar";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub labels: Vec<String>,
    #[sqlx(rename = "data_values")]
    #[serde(serialize_with = "serialize_numbers")]
    pub values: Vec<f64>,
    #[sqlx(rename = "chart_type")]
    #[serde(rename = "type")]
    pub chart_type: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChart {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub chart_type: String,
    pub created_by: Uuid,
}

impl NewChart {
    pub fn into_chart(self, now: DateTime<Utc>) -> Chart {
        Chart {
            id: Uuid::new_v4(),
            title: self.title,
            labels: self.labels,
            values: self.values,
            chart_type: self.chart_type,
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Owner fields joined into the admin chart listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOwner {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// A chart with `createdBy` populated; `None` once the owner is deleted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartWithOwner {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub labels: Vec<String>,
    #[serde(serialize_with = "serialize_numbers")]
    pub values: Vec<f64>,
    #[serde(rename = "type")]
    pub chart_type: String,
    pub created_by: Option<ChartOwner>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChartWithOwner {
    pub fn new(chart: Chart, owner: Option<ChartOwner>) -> Self {
        Self {
            id: chart.id,
            title: chart.title,
            labels: chart.labels,
            values: chart.values,
            chart_type: chart.chart_type,
            created_by: owner,
            created_at: chart.created_at,
            updated_at: chart.updated_at,
        }
    }
}
