use uuid::Uuid;

use super::SUBMISSION;
use crate::client::{ApiClient, ApiError, Session};
use crate::models::{CreateSubmission, Submission};

pub async fn list_by_team(
    api: &ApiClient,
    session: &Session,
    team_id: Uuid,
) -> Result<Vec<Submission>, ApiError> {
    api.list(
        session,
        &format!("{SUBMISSION}/submissions"),
        &[("teamId", team_id.to_string())],
    )
    .await
}

/// Submissions waiting for the given judge.
pub async fn list_for_judge(
    api: &ApiClient,
    session: &Session,
    judge_id: Uuid,
) -> Result<Vec<Submission>, ApiError> {
    api.list(
        session,
        &format!("{SUBMISSION}/submissions"),
        &[("judgeId", judge_id.to_string())],
    )
    .await
}

pub async fn create(
    api: &ApiClient,
    session: &Session,
    req: &CreateSubmission,
) -> Result<Submission, ApiError> {
    api.post(session, &format!("{SUBMISSION}/submissions"), req)
        .await
}
