use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect};
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use super::admin::HackathonRow;
use super::forms::{AssignDeviceForm, HackathonForm, RoundForm, SponsorshipForm};
use super::toast;
use super::Nav;
use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::timestamp;
use crate::services::{devices, hackathons, rounds, sponsorships, teams};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "organizer/overview.html")]
struct OverviewTemplate {
    nav: Nav,
    hackathons: Vec<HackathonRow>,
}

#[derive(Template)]
#[template(path = "organizer/hackathon.html")]
struct HackathonTemplate {
    nav: Nav,
    hackathon: HackathonRow,
    description: String,
    max_team_size: String,
    rounds: Vec<RoundRow>,
    sponsorships: Vec<SponsorshipRow>,
    teams: Vec<TeamRow>,
}

struct RoundRow {
    number: u32,
    name: String,
    start_time: String,
    end_time: String,
}

struct SponsorshipRow {
    sponsor_name: String,
    tier: String,
    amount: String,
    contact_email: String,
}

struct TeamRow {
    name: String,
    member_count: usize,
    mentor_assigned: bool,
}

#[derive(Template)]
#[template(path = "organizer/devices.html")]
struct DevicesTemplate {
    nav: Nav,
    devices: Vec<DeviceRow>,
    filtered: bool,
}

struct DeviceRow {
    id: String,
    name: String,
    serial_number: String,
    status: String,
    assigned_team: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFilter {
    pub hackathon_id: Option<Uuid>,
}

pub async fn overview(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let mut list = hackathons::list(&state.api, auth.session()).await?;
    list.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    let (jar, toast) = toast::take(jar);
    let template = OverviewTemplate {
        nav: Nav::for_user(&auth.user, toast),
        hackathons: list.iter().map(HackathonRow::from).collect(),
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}

pub async fn create_hackathon(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<HackathonForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = match form.validate() {
        Ok(req) => hackathons::create(&state.api, auth.session(), &req)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };

    let to = match &outcome {
        Ok(created) => {
            tracing::info!(hackathon_id = %created.id, username = %auth.user.username, "Hackathon created");
            format!("/organizer/hackathons/{}", created.id)
        }
        Err(_) => "/organizer".to_string(),
    };
    toast::after_submit(jar, outcome, &to, "Hackathon created")
}

pub async fn hackathon(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let session = auth.session();
    let (hackathon, round_list, sponsor_list, team_list) = tokio::try_join!(
        hackathons::get(&state.api, session, id),
        rounds::list_by_hackathon(&state.api, session, id),
        sponsorships::list_by_hackathon(&state.api, session, id),
        teams::list_by_hackathon(&state.api, session, id),
    )?;

    let (jar, toast) = toast::take(jar);
    let template = HackathonTemplate {
        nav: Nav::for_user(&auth.user, toast),
        description: hackathon.description.clone().unwrap_or_default(),
        max_team_size: hackathon
            .max_team_size
            .map(|n| n.to_string())
            .unwrap_or_default(),
        hackathon: HackathonRow::from(&hackathon),
        rounds: round_list
            .iter()
            .map(|r| RoundRow {
                number: r.round_number,
                name: r.name.clone(),
                start_time: timestamp::display(&r.start_time),
                end_time: timestamp::display(&r.end_time),
            })
            .collect(),
        sponsorships: sponsor_list
            .iter()
            .map(|s| SponsorshipRow {
                sponsor_name: s.sponsor_name.clone(),
                tier: s.tier.clone().unwrap_or_default(),
                amount: s.amount.map(|a| format!("{a:.2}")).unwrap_or_default(),
                contact_email: s.contact_email.clone().unwrap_or_default(),
            })
            .collect(),
        teams: team_list
            .iter()
            .map(|t| TeamRow {
                name: t.name.clone(),
                member_count: t.members.len(),
                mentor_assigned: t.mentor_id.is_some(),
            })
            .collect(),
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}

pub async fn create_round(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<RoundForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = match form.validate() {
        Ok(req) => rounds::create(&state.api, auth.session(), id, &req)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };
    toast::after_submit(
        jar,
        outcome,
        &format!("/organizer/hackathons/{id}"),
        "Round added",
    )
}

pub async fn create_sponsorship(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<SponsorshipForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = match form.validate(id) {
        Ok(req) => sponsorships::create(&state.api, auth.session(), &req)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };
    toast::after_submit(
        jar,
        outcome,
        &format!("/organizer/hackathons/{id}"),
        "Sponsorship added",
    )
}

pub async fn devices(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(filter): Query<DeviceFilter>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let list = devices::list(&state.api, auth.session(), filter.hackathon_id).await?;

    let rows = list
        .iter()
        .map(|d| DeviceRow {
            id: d.id.to_string(),
            name: d.name.clone(),
            serial_number: d.serial_number.clone().unwrap_or_default(),
            status: d.status.clone(),
            assigned_team: d
                .assigned_team_id
                .map(|t| t.to_string())
                .unwrap_or_default(),
        })
        .collect();

    let (jar, toast) = toast::take(jar);
    let template = DevicesTemplate {
        nav: Nav::for_user(&auth.user, toast),
        devices: rows,
        filtered: filter.hackathon_id.is_some(),
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}

pub async fn assign_device(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<AssignDeviceForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let team_id = form.validate();
    let success = match &team_id {
        Ok(None) => "Device returned to the pool",
        _ => "Device assigned",
    };
    let outcome = match team_id {
        Ok(team_id) => devices::assign(&state.api, auth.session(), id, team_id)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };
    toast::after_submit(jar, outcome, "/organizer/devices", success)
}
