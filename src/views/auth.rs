use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;

use super::forms::LoginForm;
use super::toast::{self, ToastKind};
use super::Nav;
use crate::auth::extractor::AuthContext;
use crate::error::AppError;
use crate::routes::auth::{end_session, establish_session};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    nav: Nav,
    username: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "forbidden.html")]
struct ForbiddenTemplate {
    nav: Nav,
}

pub async fn home(ctx: AuthContext) -> Redirect {
    if ctx.user.is_some() {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/auth/login")
    }
}

pub async fn login_page(ctx: AuthContext, jar: CookieJar) -> Response {
    // Already signed in
    if ctx.user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    let (jar, toast) = toast::take(jar);
    let template = LoginTemplate {
        nav: Nav::anonymous(toast),
        username: String::new(),
        error: None,
    };
    (jar, Html(template.render().unwrap_or_default())).into_response()
}

pub async fn login_submit(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match establish_session(&state, jar, &form.username, &form.password).await {
        Ok((jar, _user)) => (jar, Redirect::to("/dashboard")).into_response(),
        Err(e) => {
            let template = LoginTemplate {
                nav: Nav::anonymous(None),
                username: form.username,
                error: Some(e.public_message()),
            };
            // Keep the status so a 401 here is not mistaken for a lost session.
            let status = match e {
                AppError::Unauthorized(_) => axum::http::StatusCode::OK,
                other => other.status(),
            };
            (status, Html(template.render().unwrap_or_default())).into_response()
        }
    }
}

pub async fn logout(
    State(state): State<SharedState>,
    ctx: AuthContext,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let jar = end_session(&state, &ctx, jar).await;
    let jar = toast::flash(jar, ToastKind::Info, "You have been signed out.");
    (jar, Redirect::to("/auth/login"))
}

pub async fn forbidden(ctx: AuthContext, jar: CookieJar) -> impl IntoResponse {
    let (jar, toast) = toast::take(jar);
    let nav = match &ctx.user {
        Some(user) => Nav::for_user(user, toast),
        None => Nav::anonymous(toast),
    };
    let template = ForbiddenTemplate { nav };
    (
        axum::http::StatusCode::FORBIDDEN,
        jar,
        Html(template.render().unwrap_or_default()),
    )
}
