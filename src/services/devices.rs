use serde_json::json;
use uuid::Uuid;

use super::HACKATHON;
use crate::client::{ApiClient, ApiError, Session};
use crate::models::Device;

pub async fn list(
    api: &ApiClient,
    session: &Session,
    hackathon_id: Option<Uuid>,
) -> Result<Vec<Device>, ApiError> {
    let query: Vec<(&str, String)> = hackathon_id
        .map(|id| vec![("hackathonId", id.to_string())])
        .unwrap_or_default();
    api.list(session, &format!("{HACKATHON}/devices"), &query).await
}

/// Lend a device to a team; `None` returns it to the pool.
pub async fn assign(
    api: &ApiClient,
    session: &Session,
    id: Uuid,
    team_id: Option<Uuid>,
) -> Result<Device, ApiError> {
    api.post(
        session,
        &format!("{HACKATHON}/devices/{id}/assign"),
        &json!({ "teamId": team_id }),
    )
    .await
}
