pub mod admin;
pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod forms;
pub mod judge;
pub mod mentor;
pub mod notifications;
pub mod organizer;
pub mod participant;
pub mod toast;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::roles::Role;
use crate::middleware::role_guard::{RoleGuard, require_roles};
use crate::models::CurrentUser;
use crate::state::SharedState;
use toast::Toast;

pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
}

/// Header data shared by every page.
pub struct Nav {
    pub signed_in: bool,
    pub display_name: String,
    pub role_label: String,
    pub links: Vec<NavLink>,
    pub toast: Option<Toast>,
}

impl Nav {
    pub fn anonymous(toast: Option<Toast>) -> Self {
        Self {
            signed_in: false,
            display_name: String::new(),
            role_label: String::new(),
            links: Vec::new(),
            toast,
        }
    }

    pub fn for_user(user: &CurrentUser, toast: Option<Toast>) -> Self {
        let mut links: Vec<NavLink> = user
            .roles
            .iter()
            .map(|role| NavLink {
                href: role.home(),
                label: role.label(),
            })
            .collect();
        if user.has_role(Role::Admin) && !user.has_role(Role::Organizer) {
            links.push(NavLink {
                href: Role::Organizer.home(),
                label: Role::Organizer.label(),
            });
        }
        links.push(NavLink {
            href: "/notifications",
            label: "Notifications",
        });

        Self {
            signed_in: true,
            display_name: user.display_name.clone(),
            role_label: user
                .primary_role()
                .map(|r| r.label())
                .unwrap_or("Member")
                .to_string(),
            links,
            toast,
        }
    }
}

fn guarded(routes: Router<SharedState>, guard: RoleGuard) -> Router<SharedState> {
    routes.route_layer(from_fn_with_state(guard, require_roles))
}

pub fn view_routes() -> Router<SharedState> {
    let admin = Router::new()
        .route("/admin", get(admin::overview))
        .route("/admin/users", get(admin::users))
        .route("/admin/users/{id}/roles", post(admin::update_roles))
        .route("/admin/hackathons", get(admin::hackathons));

    let organizer = Router::new()
        .route("/organizer", get(organizer::overview))
        .route("/organizer/hackathons", post(organizer::create_hackathon))
        .route("/organizer/hackathons/{id}", get(organizer::hackathon))
        .route("/organizer/hackathons/{id}/rounds", post(organizer::create_round))
        .route(
            "/organizer/hackathons/{id}/sponsorships",
            post(organizer::create_sponsorship),
        )
        .route("/organizer/devices", get(organizer::devices))
        .route("/organizer/devices/{id}/assign", post(organizer::assign_device));

    let judge = Router::new()
        .route("/judge", get(judge::overview))
        .route("/judge/submissions/{id}/score", post(judge::score));

    let mentor = Router::new().route("/mentor", get(mentor::overview));

    let participant = Router::new()
        .route("/participant", get(participant::overview))
        .route("/participant/teams", post(participant::create_team))
        .route("/participant/teams/{id}", get(participant::team))
        .route(
            "/participant/teams/{id}/submissions",
            post(participant::create_submission),
        )
        .route("/participant/teams/{id}/members", post(participant::invite_member))
        .route(
            "/participant/teams/{id}/members/{user_id}/remove",
            post(participant::remove_member),
        )
        .route("/participant/teams/{id}/boards", post(participant::create_board));

    let shared = Router::new()
        .route("/notifications", get(notifications::index))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/chat/{room_id}", get(chat::room));

    Router::new()
        // Public
        .route("/", get(auth::home))
        .route("/auth/login", get(auth::login_page).post(auth::login_submit))
        .route("/auth/logout", post(auth::logout))
        .route("/forbidden", get(auth::forbidden))
        .route("/dashboard", get(dashboard::index))
        // Role areas
        .merge(guarded(admin, RoleGuard::new(&[Role::Admin])))
        .merge(guarded(organizer, RoleGuard::new(&[Role::Organizer, Role::Admin])))
        .merge(guarded(judge, RoleGuard::new(&[Role::Judge])))
        .merge(guarded(mentor, RoleGuard::new(&[Role::Mentor])))
        .merge(guarded(participant, RoleGuard::new(&[Role::Participant])))
        .merge(guarded(shared, RoleGuard::authenticated()))
}
