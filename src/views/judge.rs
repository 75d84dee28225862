use std::collections::HashMap;

use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect};
use axum::Form;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use super::forms::ScoreForm;
use super::toast;
use super::Nav;
use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::timestamp;
use crate::services::{judging, submissions};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "judge/overview.html")]
struct OverviewTemplate {
    nav: Nav,
    submissions: Vec<SubmissionRow>,
    scored: usize,
}

struct SubmissionRow {
    id: String,
    title: String,
    repository_url: String,
    demo_url: String,
    submitted_at: String,
    my_score: String,
    my_note: String,
}

pub async fn overview(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let judge_id = auth.user.id;
    let (queue, scores) = tokio::try_join!(
        submissions::list_for_judge(&state.api, auth.session(), judge_id),
        judging::list_by_judge(&state.api, auth.session(), judge_id),
    )?;

    let by_submission: HashMap<Uuid, _> = scores.iter().map(|s| (s.submission_id, s)).collect();

    let rows: Vec<SubmissionRow> = queue
        .iter()
        .map(|sub| {
            let mine = by_submission.get(&sub.id);
            SubmissionRow {
                id: sub.id.to_string(),
                title: sub.title.clone(),
                repository_url: sub.repository_url.clone().unwrap_or_default(),
                demo_url: sub.demo_url.clone().unwrap_or_default(),
                submitted_at: timestamp::display(&sub.submitted_at),
                my_score: mine.map(|s| format!("{:.1}", s.score)).unwrap_or_default(),
                my_note: mine.and_then(|s| s.note.clone()).unwrap_or_default(),
            }
        })
        .collect();
    let scored = rows.iter().filter(|r| !r.my_score.is_empty()).count();

    let (jar, toast) = toast::take(jar);
    let template = OverviewTemplate {
        nav: Nav::for_user(&auth.user, toast),
        submissions: rows,
        scored,
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}

/// Score a submission, or update this judge's earlier score for it.
pub async fn score(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(submission_id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<ScoreForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = async {
        let req = form.validate(submission_id, auth.user.id)?;
        let existing = judging::list_by_submission(&state.api, auth.session(), submission_id)
            .await?
            .into_iter()
            .find(|s| s.judge_id == auth.user.id);

        let saved = match existing {
            Some(previous) => {
                judging::rescore(
                    &state.api,
                    auth.session(),
                    previous.id,
                    req.score,
                    req.note.as_deref(),
                )
                .await?
            }
            None => judging::score(&state.api, auth.session(), &req).await?,
        };
        Ok::<_, AppError>(saved)
    }
    .await;

    toast::after_submit(jar, outcome, "/judge", "Score saved")
}
