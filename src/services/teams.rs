use serde_json::json;
use uuid::Uuid;

use super::HACKATHON;
use crate::client::{ApiClient, ApiError, Session};
use crate::models::{CreateTeam, Team};

pub async fn list_by_hackathon(
    api: &ApiClient,
    session: &Session,
    hackathon_id: Uuid,
) -> Result<Vec<Team>, ApiError> {
    api.list(
        session,
        &format!("{HACKATHON}/teams"),
        &[("hackathonId", hackathon_id.to_string())],
    )
    .await
}

pub async fn list_by_mentor(
    api: &ApiClient,
    session: &Session,
    mentor_id: Uuid,
) -> Result<Vec<Team>, ApiError> {
    api.list(
        session,
        &format!("{HACKATHON}/teams"),
        &[("mentorId", mentor_id.to_string())],
    )
    .await
}

/// Teams the session's user belongs to.
pub async fn my_teams(api: &ApiClient, session: &Session) -> Result<Vec<Team>, ApiError> {
    api.list(session, &format!("{HACKATHON}/teams/my-teams"), &[])
        .await
}

pub async fn get(api: &ApiClient, session: &Session, id: Uuid) -> Result<Team, ApiError> {
    api.get(session, &format!("{HACKATHON}/teams/{id}")).await
}

pub async fn create(api: &ApiClient, session: &Session, req: &CreateTeam) -> Result<Team, ApiError> {
    api.post(session, &format!("{HACKATHON}/teams"), req).await
}

pub async fn invite_member(
    api: &ApiClient,
    session: &Session,
    team_id: Uuid,
    email: &str,
) -> Result<Team, ApiError> {
    api.post(
        session,
        &format!("{HACKATHON}/teams/{team_id}/members"),
        &json!({ "email": email }),
    )
    .await
}

pub async fn remove_member(
    api: &ApiClient,
    session: &Session,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    api.delete(
        session,
        &format!("{HACKATHON}/teams/{team_id}/members/{user_id}"),
    )
    .await
}
