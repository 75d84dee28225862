use serde_json::json;
use uuid::Uuid;

use super::HACKATHON;
use crate::client::{ApiClient, ApiError, Session};
use crate::models::Board;

pub async fn list_by_team(
    api: &ApiClient,
    session: &Session,
    team_id: Uuid,
) -> Result<Vec<Board>, ApiError> {
    let boards: Vec<Board> = api
        .list(
            session,
            &format!("{HACKATHON}/boards"),
            &[("teamId", team_id.to_string())],
        )
        .await?;
    Ok(boards.into_iter().map(Board::sorted).collect())
}

pub async fn create(
    api: &ApiClient,
    session: &Session,
    team_id: Uuid,
    name: &str,
) -> Result<Board, ApiError> {
    api.post(
        session,
        &format!("{HACKATHON}/boards"),
        &json!({ "teamId": team_id, "name": name }),
    )
    .await
}
