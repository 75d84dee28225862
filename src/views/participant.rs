use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect};
use axum::Form;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use super::forms::{BoardForm, MemberForm, SubmissionForm, TeamForm};
use super::toast;
use super::Nav;
use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::{Board, timestamp};
use crate::services::{boards, hackathons, rounds, submissions, teams};
use crate::state::SharedState;

pub(super) struct BoardView {
    pub name: String,
    pub lists: Vec<ListView>,
}

pub(super) struct ListView {
    pub name: String,
    pub cards: Vec<CardView>,
}

pub(super) struct CardView {
    pub title: String,
    pub description: String,
}

impl From<&Board> for BoardView {
    fn from(board: &Board) -> Self {
        Self {
            name: board.name.clone(),
            lists: board
                .lists
                .iter()
                .map(|list| ListView {
                    name: list.name.clone(),
                    cards: list
                        .cards
                        .iter()
                        .map(|card| CardView {
                            title: card.title.clone(),
                            description: card.description.clone().unwrap_or_default(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "participant/overview.html")]
struct OverviewTemplate {
    nav: Nav,
    teams: Vec<TeamRow>,
    hackathons: Vec<Choice>,
}

struct TeamRow {
    id: String,
    name: String,
    hackathon: String,
    member_count: usize,
}

struct Choice {
    id: String,
    label: String,
}

#[derive(Template)]
#[template(path = "participant/team.html")]
struct TeamTemplate {
    nav: Nav,
    team_id: String,
    name: String,
    description: String,
    members: Vec<MemberRow>,
    boards: Vec<BoardView>,
    submissions: Vec<SubmissionRow>,
    rounds: Vec<Choice>,
}

struct MemberRow {
    user_id: String,
    username: String,
    role: String,
}

struct SubmissionRow {
    title: String,
    status: String,
    repository_url: String,
    submitted_at: String,
}

pub async fn overview(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (mine, all_hackathons) = tokio::try_join!(
        teams::my_teams(&state.api, auth.session()),
        hackathons::list(&state.api, auth.session()),
    )?;

    let title_of = |id: Uuid| {
        all_hackathons
            .iter()
            .find(|h| h.id == id)
            .map(|h| h.title.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let team_rows = mine
        .iter()
        .map(|t| TeamRow {
            id: t.id.to_string(),
            name: t.name.clone(),
            hackathon: title_of(t.hackathon_id),
            member_count: t.members.len(),
        })
        .collect();

    let choices = all_hackathons
        .iter()
        .filter(|h| !h.status.eq_ignore_ascii_case("COMPLETED"))
        .map(|h| Choice {
            id: h.id.to_string(),
            label: h.title.clone(),
        })
        .collect();

    let (jar, toast) = toast::take(jar);
    let template = OverviewTemplate {
        nav: Nav::for_user(&auth.user, toast),
        teams: team_rows,
        hackathons: choices,
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}

pub async fn create_team(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<TeamForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = match form.validate() {
        Ok(req) => teams::create(&state.api, auth.session(), &req)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };

    let to = match &outcome {
        Ok(team) => format!("/participant/teams/{}", team.id),
        Err(_) => "/participant".to_string(),
    };
    toast::after_submit(jar, outcome, &to, "Team created")
}

pub async fn team(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let session = auth.session();
    let team = teams::get(&state.api, session, id).await?;
    let (team_boards, team_submissions, round_list) = tokio::try_join!(
        boards::list_by_team(&state.api, session, id),
        submissions::list_by_team(&state.api, session, id),
        rounds::list_by_hackathon(&state.api, session, team.hackathon_id),
    )?;

    let (jar, toast) = toast::take(jar);
    let template = TeamTemplate {
        nav: Nav::for_user(&auth.user, toast),
        team_id: team.id.to_string(),
        name: team.name.clone(),
        description: team.description.clone().unwrap_or_default(),
        members: team
            .members
            .iter()
            .map(|m| MemberRow {
                user_id: m.user_id.to_string(),
                username: m.username.clone(),
                role: m.role.clone().unwrap_or_default(),
            })
            .collect(),
        boards: team_boards.iter().map(BoardView::from).collect(),
        submissions: team_submissions
            .iter()
            .map(|s| SubmissionRow {
                title: s.title.clone(),
                status: s.status.clone().unwrap_or_default(),
                repository_url: s.repository_url.clone().unwrap_or_default(),
                submitted_at: timestamp::display(&s.submitted_at),
            })
            .collect(),
        rounds: round_list
            .iter()
            .map(|r| Choice {
                id: r.id.to_string(),
                label: format!("Round {}: {}", r.round_number, r.name),
            })
            .collect(),
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}

pub async fn create_submission(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<SubmissionForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = match form.validate(id) {
        Ok(req) => submissions::create(&state.api, auth.session(), &req)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };
    toast::after_submit(
        jar,
        outcome,
        &format!("/participant/teams/{id}"),
        "Project submitted",
    )
}

pub async fn invite_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<MemberForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = match form.validate() {
        Ok(email) => teams::invite_member(&state.api, auth.session(), id, &email)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };
    toast::after_submit(
        jar,
        outcome,
        &format!("/participant/teams/{id}"),
        "Invitation sent",
    )
}

pub async fn remove_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = teams::remove_member(&state.api, auth.session(), id, user_id)
        .await
        .map_err(AppError::from);
    toast::after_submit(
        jar,
        outcome,
        &format!("/participant/teams/{id}"),
        "Member removed",
    )
}

pub async fn create_board(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<BoardForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = match form.validate() {
        Ok(name) => boards::create(&state.api, auth.session(), id, &name)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };
    toast::after_submit(
        jar,
        outcome,
        &format!("/participant/teams/{id}"),
        "Board created",
    )
}
