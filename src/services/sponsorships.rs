use uuid::Uuid;

use super::HACKATHON;
use crate::client::{ApiClient, ApiError, Session};
use crate::models::{CreateSponsorship, Sponsorship};

pub async fn list_by_hackathon(
    api: &ApiClient,
    session: &Session,
    hackathon_id: Uuid,
) -> Result<Vec<Sponsorship>, ApiError> {
    api.list(
        session,
        &format!("{HACKATHON}/sponsorships"),
        &[("hackathonId", hackathon_id.to_string())],
    )
    .await
}

pub async fn create(
    api: &ApiClient,
    session: &Session,
    req: &CreateSponsorship,
) -> Result<Sponsorship, ApiError> {
    api.post(session, &format!("{HACKATHON}/sponsorships"), req)
        .await
}
