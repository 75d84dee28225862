//! HTML form payloads and their validation into backend requests.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::error::AppError;
use crate::models::{
    CreateHackathon, CreateJudgeSubmission, CreateRound, CreateSponsorship, CreateSubmission,
    CreateTeam,
};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap());

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn optional_email(value: &Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match optional(value) {
        Some(email) if !EMAIL_RE.is_match(&email) => Err(AppError::BadRequest(format!(
            "{field} must be a valid email address"
        ))),
        other => Ok(other),
    }
}

fn optional_url(value: &Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match optional(value) {
        Some(url) if !URL_RE.is_match(&url) => Err(AppError::BadRequest(format!(
            "{field} must be an http(s) URL"
        ))),
        other => Ok(other),
    }
}

/// `datetime-local` inputs (`2025-03-01T09:30`) or plain dates.
fn optional_datetime(value: &Option<String>, field: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(raw) = optional(value) else {
        return Ok(None);
    };
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| AppError::BadRequest(format!("{field} is not a valid date")))
}

fn ordered(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(AppError::BadRequest(
            "End must not be before start".to_string(),
        )),
        _ => Ok(()),
    }
}

fn optional_number<T: std::str::FromStr>(value: &Option<String>, field: &str) -> Result<Option<T>, AppError> {
    optional(value)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| AppError::BadRequest(format!("{field} must be a number")))
        })
        .transpose()
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct HackathonForm {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub max_team_size: Option<String>,
}

impl HackathonForm {
    pub fn validate(&self) -> Result<CreateHackathon, AppError> {
        let start_date = optional_datetime(&self.start_date, "Start date")?;
        let end_date = optional_datetime(&self.end_date, "End date")?;
        ordered(start_date, end_date)?;

        let max_team_size: Option<u32> = optional_number(&self.max_team_size, "Max team size")?;
        if max_team_size == Some(0) {
            return Err(AppError::BadRequest(
                "Max team size must be at least 1".to_string(),
            ));
        }

        Ok(CreateHackathon {
            title: required(&self.title, "Title")?,
            description: optional(&self.description),
            location: optional(&self.location),
            start_date,
            end_date,
            max_team_size,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RoundForm {
    pub name: String,
    pub description: Option<String>,
    pub round_number: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl RoundForm {
    pub fn validate(&self) -> Result<CreateRound, AppError> {
        let start_time = optional_datetime(&self.start_time, "Start time")?;
        let end_time = optional_datetime(&self.end_time, "End time")?;
        ordered(start_time, end_time)?;

        let round_number = self
            .round_number
            .trim()
            .parse::<u32>()
            .map_err(|_| AppError::BadRequest("Round number must be a number".to_string()))?;

        Ok(CreateRound {
            name: required(&self.name, "Name")?,
            description: optional(&self.description),
            round_number,
            start_time,
            end_time,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SponsorshipForm {
    pub sponsor_name: String,
    pub tier: Option<String>,
    pub amount: Option<String>,
    pub contact_email: Option<String>,
}

impl SponsorshipForm {
    pub fn validate(&self, hackathon_id: Uuid) -> Result<CreateSponsorship, AppError> {
        let amount: Option<f64> = optional_number(&self.amount, "Amount")?;
        if amount.is_some_and(|a| a < 0.0) {
            return Err(AppError::BadRequest("Amount cannot be negative".to_string()));
        }

        Ok(CreateSponsorship {
            hackathon_id,
            sponsor_name: required(&self.sponsor_name, "Sponsor name")?,
            tier: optional(&self.tier),
            amount,
            contact_email: optional_email(&self.contact_email, "Contact email")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamForm {
    pub hackathon_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl TeamForm {
    pub fn validate(&self) -> Result<CreateTeam, AppError> {
        Ok(CreateTeam {
            hackathon_id: self.hackathon_id,
            name: required(&self.name, "Team name")?,
            description: optional(&self.description),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmissionForm {
    pub round_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub repository_url: Option<String>,
    pub demo_url: Option<String>,
}

impl SubmissionForm {
    pub fn validate(&self, team_id: Uuid) -> Result<CreateSubmission, AppError> {
        Ok(CreateSubmission {
            team_id,
            round_id: self.round_id,
            title: required(&self.title, "Title")?,
            description: optional(&self.description),
            repository_url: optional_url(&self.repository_url, "Repository URL")?,
            demo_url: optional_url(&self.demo_url, "Demo URL")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ScoreForm {
    pub score: String,
    pub note: Option<String>,
}

impl ScoreForm {
    pub fn validate(&self, submission_id: Uuid, judge_id: Uuid) -> Result<CreateJudgeSubmission, AppError> {
        let score = self
            .score
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|s| (0.0..=100.0).contains(s))
            .ok_or_else(|| AppError::BadRequest("Score must be between 0 and 100".to_string()))?;

        Ok(CreateJudgeSubmission {
            submission_id,
            judge_id,
            score,
            note: optional(&self.note),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MemberForm {
    pub email: String,
}

impl MemberForm {
    pub fn validate(&self) -> Result<String, AppError> {
        let email = required(&self.email, "Email")?;
        if !EMAIL_RE.is_match(&email) {
            return Err(AppError::BadRequest(
                "Email must be a valid email address".to_string(),
            ));
        }
        Ok(email)
    }
}

#[derive(Debug, Deserialize)]
pub struct BoardForm {
    pub name: String,
}

impl BoardForm {
    pub fn validate(&self) -> Result<String, AppError> {
        required(&self.name, "Board name")
    }
}

/// Comma separated role names, e.g. `organizer, judge`.
#[derive(Debug, Deserialize)]
pub struct RolesForm {
    pub roles: String,
}

impl RolesForm {
    pub fn validate(&self) -> Result<Vec<String>, AppError> {
        let mut roles = Vec::new();
        for name in self.roles.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let role = Role::parse(name)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown role: {name}")))?;
            roles.push(role);
        }
        if roles.is_empty() {
            return Err(AppError::BadRequest("At least one role is required".to_string()));
        }
        roles.sort();
        roles.dedup();
        Ok(roles.iter().map(|r| r.as_str().to_string()).collect())
    }
}

/// Team to lend a device to; blank returns it to the pool.
#[derive(Debug, Deserialize)]
pub struct AssignDeviceForm {
    pub team_id: Option<String>,
}

impl AssignDeviceForm {
    pub fn validate(&self) -> Result<Option<Uuid>, AppError> {
        optional(&self.team_id)
            .map(|raw| {
                Uuid::parse_str(&raw)
                    .map_err(|_| AppError::BadRequest("Team id is not valid".to_string()))
            })
            .transpose()
    }
}
