use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect};
use axum::Form;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use super::forms::RolesForm;
use super::toast;
use super::Nav;
use crate::auth::extractor::AuthUser;
use crate::auth::roles::Role;
use crate::error::AppError;
use crate::models::{Hackathon, timestamp};
use crate::services::{hackathons, identity};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "admin/overview.html")]
struct OverviewTemplate {
    nav: Nav,
    user_count: usize,
    hackathon_count: usize,
    ongoing_count: usize,
    role_counts: Vec<(String, usize)>,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
struct UsersTemplate {
    nav: Nav,
    users: Vec<UserRow>,
}

struct UserRow {
    id: String,
    username: String,
    email: String,
    full_name: String,
    roles: String,
    created_at: String,
}

#[derive(Template)]
#[template(path = "admin/hackathons.html")]
struct HackathonsTemplate {
    nav: Nav,
    hackathons: Vec<HackathonRow>,
}

pub(super) struct HackathonRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
}

impl From<&Hackathon> for HackathonRow {
    fn from(h: &Hackathon) -> Self {
        Self {
            id: h.id.to_string(),
            title: h.title.clone(),
            status: h.status.clone(),
            location: h.location.clone().unwrap_or_default(),
            start_date: timestamp::display(&h.start_date),
            end_date: timestamp::display(&h.end_date),
        }
    }
}

pub async fn overview(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (users, all_hackathons) = tokio::try_join!(
        identity::list_users(&state.api, auth.session()),
        hackathons::list(&state.api, auth.session()),
    )?;

    let held: Vec<Vec<Role>> = users
        .iter()
        .map(|u| Role::parse_all(&u.role_names()))
        .collect();
    let role_counts = Role::ALL
        .iter()
        .map(|role| {
            let count = held.iter().filter(|roles| roles.contains(role)).count();
            (role.label().to_string(), count)
        })
        .collect();

    let ongoing_count = all_hackathons
        .iter()
        .filter(|h| h.status.eq_ignore_ascii_case("ONGOING"))
        .count();

    let (jar, toast) = toast::take(jar);
    let template = OverviewTemplate {
        nav: Nav::for_user(&auth.user, toast),
        user_count: users.len(),
        hackathon_count: all_hackathons.len(),
        ongoing_count,
        role_counts,
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}

pub async fn users(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let users = identity::list_users(&state.api, auth.session()).await?;

    let rows = users
        .iter()
        .map(|u| UserRow {
            id: u.id.to_string(),
            username: u.username.clone(),
            email: u.email.clone(),
            full_name: u.full_name.clone().unwrap_or_default(),
            roles: u.role_names().join(", "),
            created_at: timestamp::display(&u.created_at),
        })
        .collect();

    let (jar, toast) = toast::take(jar);
    let template = UsersTemplate {
        nav: Nav::for_user(&auth.user, toast),
        users: rows,
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}

pub async fn hackathons(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let list = hackathons::list(&state.api, auth.session()).await?;

    let (jar, toast) = toast::take(jar);
    let template = HackathonsTemplate {
        nav: Nav::for_user(&auth.user, toast),
        hackathons: list.iter().map(HackathonRow::from).collect(),
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}

/// Replace a user's roles. Takes effect on that user's next `checkUser`.
pub async fn update_roles(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<RolesForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = match form.validate() {
        Ok(roles) => identity::update_roles(&state.api, auth.session(), id, &roles)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };
    if let Ok(updated) = &outcome {
        tracing::info!(user = %updated.username, admin = %auth.user.username, "Roles updated");
    }
    toast::after_submit(jar, outcome, "/admin/users", "Roles updated")
}
