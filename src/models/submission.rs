use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub team_id: Uuid,
    pub round_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, with = "super::timestamp::option")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmission {
    pub team_id: Uuid,
    pub round_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub repository_url: Option<String>,
    pub demo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeSubmission {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub judge_id: Uuid,
    pub score: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJudgeSubmission {
    pub submission_id: Uuid,
    pub judge_id: Uuid,
    pub score: f64,
    pub note: Option<String>,
}
