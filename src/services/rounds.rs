use uuid::Uuid;

use super::HACKATHON;
use crate::client::{ApiClient, ApiError, Session};
use crate::models::{CreateRound, Round};

pub async fn list_by_hackathon(
    api: &ApiClient,
    session: &Session,
    hackathon_id: Uuid,
) -> Result<Vec<Round>, ApiError> {
    let mut rounds: Vec<Round> = api
        .list(
            session,
            &format!("{HACKATHON}/hackathons/{hackathon_id}/rounds"),
            &[],
        )
        .await?;
    rounds.sort_by_key(|r| r.round_number);
    Ok(rounds)
}

pub async fn create(
    api: &ApiClient,
    session: &Session,
    hackathon_id: Uuid,
    req: &CreateRound,
) -> Result<Round, ApiError> {
    api.post(
        session,
        &format!("{HACKATHON}/hackathons/{hackathon_id}/rounds"),
        req,
    )
    .await
}
