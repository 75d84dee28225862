use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hackathon {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, with = "super::timestamp::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_team_size: Option<u32>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHackathon {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(with = "super::timestamp::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(with = "super::timestamp::option")]
    pub end_date: Option<DateTime<Utc>>,
    pub max_team_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: Uuid,
    pub hackathon_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub round_number: u32,
    #[serde(default, with = "super::timestamp::option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRound {
    pub name: String,
    pub description: Option<String>,
    pub round_number: u32,
    #[serde(with = "super::timestamp::option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(with = "super::timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sponsorship {
    pub id: Uuid,
    pub hackathon_id: Uuid,
    pub sponsor_name: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSponsorship {
    pub hackathon_id: Uuid,
    pub sponsor_name: String,
    pub tier: Option<String>,
    pub amount: Option<f64>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: Uuid,
    #[serde(default)]
    pub hackathon_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub assigned_team_id: Option<Uuid>,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}
