use serde_json::json;
use uuid::Uuid;

use super::SUBMISSION;
use crate::client::{ApiClient, ApiError, Session};
use crate::models::{CreateJudgeSubmission, JudgeSubmission};

pub async fn list_by_judge(
    api: &ApiClient,
    session: &Session,
    judge_id: Uuid,
) -> Result<Vec<JudgeSubmission>, ApiError> {
    api.list(
        session,
        &format!("{SUBMISSION}/judge-submissions"),
        &[("judgeId", judge_id.to_string())],
    )
    .await
}

pub async fn list_by_submission(
    api: &ApiClient,
    session: &Session,
    submission_id: Uuid,
) -> Result<Vec<JudgeSubmission>, ApiError> {
    api.list(
        session,
        &format!("{SUBMISSION}/judge-submissions"),
        &[("submissionId", submission_id.to_string())],
    )
    .await
}

pub async fn score(
    api: &ApiClient,
    session: &Session,
    req: &CreateJudgeSubmission,
) -> Result<JudgeSubmission, ApiError> {
    api.post(session, &format!("{SUBMISSION}/judge-submissions"), req)
        .await
}

pub async fn rescore(
    api: &ApiClient,
    session: &Session,
    id: Uuid,
    score: f64,
    note: Option<&str>,
) -> Result<JudgeSubmission, ApiError> {
    api.put(
        session,
        &format!("{SUBMISSION}/judge-submissions/{id}"),
        &json!({ "score": score, "note": note }),
    )
    .await
}
