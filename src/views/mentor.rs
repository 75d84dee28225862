use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum_extra::extract::CookieJar;

use super::participant::BoardView;
use super::toast;
use super::Nav;
use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::services::{boards, teams};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "mentor/overview.html")]
struct OverviewTemplate {
    nav: Nav,
    teams: Vec<MentoredTeam>,
}

struct MentoredTeam {
    name: String,
    members: String,
    boards: Vec<BoardView>,
}

pub async fn overview(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let mentored = teams::list_by_mentor(&state.api, auth.session(), auth.user.id).await?;

    let mut rows = Vec::with_capacity(mentored.len());
    for team in &mentored {
        let team_boards = boards::list_by_team(&state.api, auth.session(), team.id).await?;
        rows.push(MentoredTeam {
            name: team.name.clone(),
            members: team
                .members
                .iter()
                .map(|m| m.username.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            boards: team_boards.iter().map(BoardView::from).collect(),
        });
    }

    let (jar, toast) = toast::take(jar);
    let template = OverviewTemplate {
        nav: Nav::for_user(&auth.user, toast),
        teams: rows,
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}
