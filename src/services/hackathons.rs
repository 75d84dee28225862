use uuid::Uuid;

use super::HACKATHON;
use crate::client::{ApiClient, ApiError, Session};
use crate::models::{CreateHackathon, Hackathon};

pub async fn list(api: &ApiClient, session: &Session) -> Result<Vec<Hackathon>, ApiError> {
    api.list(session, &format!("{HACKATHON}/hackathons"), &[]).await
}

pub async fn get(api: &ApiClient, session: &Session, id: Uuid) -> Result<Hackathon, ApiError> {
    api.get(session, &format!("{HACKATHON}/hackathons/{id}")).await
}

pub async fn create(
    api: &ApiClient,
    session: &Session,
    req: &CreateHackathon,
) -> Result<Hackathon, ApiError> {
    api.post(session, &format!("{HACKATHON}/hackathons"), req).await
}
