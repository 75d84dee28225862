mod common;

use std::sync::atomic::Ordering;

use reqwest::StatusCode;
use serde_json::json;

use common::{
    location, spawn_app, user_id, CREATED_HACKATHON_ID, CREATED_TEAM_ID, DEVICE_ID,
    HACKATHON_ID, NOTIFICATION_ID, ROOM_ID, ROUND_ID, SUBMISSION_ID, TEAM_ID,
};

fn success(message: &str) -> Option<(String, String)> {
    Some(("success".to_string(), message.to_string()))
}

fn error(message: &str) -> Option<(String, String)> {
    Some(("error".to_string(), message.to_string()))
}

#[tokio::test]
async fn organizer_creates_hackathon_round_and_sponsorship() {
    let (app, mock) = spawn_app().await;
    app.login("olga").await;

    let resp = app
        .post_form(
            "/organizer/hackathons",
            &[
                ("title", "Autumn Hack"),
                ("location", "Berlin"),
                ("start_date", "2026-10-01T09:00"),
                ("end_date", "2026-10-02T18:00"),
                ("max_team_size", "5"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        format!("/organizer/hackathons/{CREATED_HACKATHON_ID}")
    );
    assert_eq!(app.toast(), success("Hackathon created"));
    let write = mock.last_write();
    assert_eq!(write.path, "/hackathon-service/api/v1/hackathons");
    assert_eq!(write.body["title"], "Autumn Hack");
    assert_eq!(write.body["maxTeamSize"], 5);

    // The toast is shown once, on the page the redirect lands on.
    let resp = app.get(&location(&resp)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Hackathon created"));
    assert_eq!(app.toast(), None);

    let target = format!("/organizer/hackathons/{HACKATHON_ID}");
    let resp = app
        .post_form(
            &format!("{target}/rounds"),
            &[("name", "Finals"), ("round_number", "2")],
        )
        .await;
    assert_eq!(location(&resp), target);
    assert_eq!(app.toast(), success("Round added"));
    let write = mock.last_write();
    assert_eq!(
        write.path,
        format!("/hackathon-service/api/v1/hackathons/{HACKATHON_ID}/rounds")
    );
    assert_eq!(write.body["roundNumber"], 2);

    let resp = app
        .post_form(
            &format!("{target}/sponsorships"),
            &[("sponsor_name", "Acme"), ("tier", "Gold"), ("amount", "2500")],
        )
        .await;
    assert_eq!(location(&resp), target);
    assert_eq!(app.toast(), success("Sponsorship added"));
    let write = mock.last_write();
    assert_eq!(write.path, "/hackathon-service/api/v1/sponsorships");
    assert_eq!(write.body["hackathonId"], json!(HACKATHON_ID));
    assert_eq!(write.body["sponsorName"], "Acme");
}

#[tokio::test]
async fn invalid_form_flashes_error_without_backend_call() {
    let (app, mock) = spawn_app().await;
    app.login("olga").await;

    let resp = app
        .post_form(
            "/organizer/hackathons",
            &[
                ("title", "Backwards"),
                ("start_date", "2026-10-02T09:00"),
                ("end_date", "2026-10-01T09:00"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/organizer");
    let (kind, _) = app.toast().unwrap();
    assert_eq!(kind, "error");
    assert!(mock.writes().is_empty());
}

#[tokio::test]
async fn backend_rejection_surfaces_as_error_toast() {
    let (app, mock) = spawn_app().await;
    app.login("alice").await;
    mock.refuse_writes("Team is full");

    let resp = app
        .post_form(
            &format!("/participant/teams/{TEAM_ID}/members"),
            &[("email", "carol@example.com")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/participant/teams/{TEAM_ID}"));
    assert_eq!(app.toast(), error("Team is full"));
    // A rejected write is not a lost session.
    assert!(app.cookie("hb_session").is_some());

    let resp = app.get(&location(&resp)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Team is full"));
}

#[tokio::test]
async fn lost_session_on_submit_redirects_to_login() {
    let (app, mock) = spawn_app().await;
    app.login("alice").await;
    mock.reject_all.store(true, Ordering::SeqCst);

    let resp = app
        .post_form(
            "/participant/teams",
            &[("hackathon_id", HACKATHON_ID.to_string().as_str()), ("name", "Late")],
        )
        .await;
    assert!(resp.status().is_redirection());
    assert_eq!(location(&resp), "/auth/login");
    assert_eq!(app.toast(), None);
    assert!(app.cookie("hb_session").is_none());
    assert!(app.cookie("hb_user").is_none());
}

#[tokio::test]
async fn participant_manages_team() {
    let (app, mock) = spawn_app().await;
    app.login("alice").await;

    let resp = app
        .post_form(
            "/participant/teams",
            &[
                ("hackathon_id", HACKATHON_ID.to_string().as_str()),
                ("name", "Segfaults"),
                ("description", ""),
            ],
        )
        .await;
    assert_eq!(location(&resp), format!("/participant/teams/{CREATED_TEAM_ID}"));
    assert_eq!(app.toast(), success("Team created"));
    let write = mock.last_write();
    assert_eq!(write.body["name"], "Segfaults");
    assert_eq!(write.body["description"], json!(null));

    let team = format!("/participant/teams/{TEAM_ID}");
    let resp = app.get(&team).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Null Pointers"));
    // Lists render in position order.
    assert!(html.find("Lane Alpha").unwrap() < html.find("Lane Omega").unwrap());

    let resp = app
        .post_form(
            &format!("{team}/submissions"),
            &[
                ("round_id", ROUND_ID.to_string().as_str()),
                ("title", "Hackboard"),
                ("repository_url", "https://example.com/hackboard"),
            ],
        )
        .await;
    assert_eq!(location(&resp), team);
    assert_eq!(app.toast(), success("Project submitted"));
    let write = mock.last_write();
    assert_eq!(write.path, "/submission-service/api/v1/submissions");
    assert_eq!(write.body["teamId"], json!(TEAM_ID));
    assert_eq!(write.body["roundId"], json!(ROUND_ID));

    let resp = app
        .post_form(&format!("{team}/members"), &[("email", "carol@example.com")])
        .await;
    assert_eq!(location(&resp), team);
    assert_eq!(app.toast(), success("Invitation sent"));
    assert_eq!(mock.last_write().body["email"], "carol@example.com");

    let bob = user_id("bob");
    let resp = app
        .post_form(&format!("{team}/members/{bob}/remove"), &[])
        .await;
    assert_eq!(location(&resp), team);
    assert_eq!(app.toast(), success("Member removed"));
    let write = mock.last_write();
    assert_eq!(write.method, "DELETE");
    assert_eq!(
        write.path,
        format!("/hackathon-service/api/v1/teams/{TEAM_ID}/members/{bob}")
    );

    let resp = app
        .post_form(&format!("{team}/boards"), &[("name", "Backlog")])
        .await;
    assert_eq!(location(&resp), team);
    assert_eq!(app.toast(), success("Board created"));
    let write = mock.last_write();
    assert_eq!(write.path, "/hackathon-service/api/v1/boards");
    assert_eq!(write.body["teamId"], json!(TEAM_ID));
    assert_eq!(write.body["name"], "Backlog");
}

#[tokio::test]
async fn invalid_invite_email_is_rejected() {
    let (app, mock) = spawn_app().await;
    app.login("alice").await;

    let resp = app
        .post_form(
            &format!("/participant/teams/{TEAM_ID}/members"),
            &[("email", "not-an-email")],
        )
        .await;
    assert_eq!(location(&resp), format!("/participant/teams/{TEAM_ID}"));
    assert_eq!(app.toast(), error("Email must be a valid email address"));
    assert!(mock.writes().is_empty());
}

#[tokio::test]
async fn judge_scores_submission() {
    let (app, mock) = spawn_app().await;
    app.login("jules").await;

    let resp = app.get("/judge").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Sensor Mesh"));

    let target = format!("/judge/submissions/{SUBMISSION_ID}/score");
    let resp = app
        .post_form(&target, &[("score", "150"), ("note", "")])
        .await;
    assert_eq!(location(&resp), "/judge");
    assert_eq!(app.toast(), error("Score must be between 0 and 100"));
    assert!(mock.writes().is_empty());

    let resp = app
        .post_form(&target, &[("score", "87.5"), ("note", "Solid demo")])
        .await;
    assert_eq!(location(&resp), "/judge");
    assert_eq!(app.toast(), success("Score saved"));
    let write = mock.last_write();
    assert_eq!(write.method, "POST");
    assert_eq!(write.path, "/submission-service/api/v1/judge-submissions");
    assert_eq!(write.body["submissionId"], json!(SUBMISSION_ID));
    assert_eq!(write.body["judgeId"], json!(user_id("jules")));
    assert_eq!(write.body["score"], 87.5);
}

#[tokio::test]
async fn notifications_are_marked_read() {
    let (app, mock) = spawn_app().await;
    app.login("alice").await;

    let resp = app.get("/notifications").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    // Newest first.
    assert!(html.find("Judging starts").unwrap() < html.find("Older notice").unwrap());
    assert!(html.contains("Null Pointers chat"));

    let resp = app
        .post_form(&format!("/notifications/{NOTIFICATION_ID}/read"), &[])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/notifications");
    assert_eq!(app.toast(), success("Notification marked as read"));
    let write = mock.last_write();
    assert_eq!(write.method, "PUT");
    assert_eq!(
        write.path,
        format!("/communication-service/api/v1/notifications/{NOTIFICATION_ID}/read")
    );

    let resp = app.post_form("/notifications/read-all", &[]).await;
    assert_eq!(location(&resp), "/notifications");
    assert_eq!(app.toast(), success("All notifications marked as read"));
    assert_eq!(
        mock.last_write().path,
        "/communication-service/api/v1/notifications/read-all"
    );
}

#[tokio::test]
async fn chat_room_shows_history_oldest_first() {
    let (app, _mock) = spawn_app().await;
    app.login("alice").await;

    let resp = app.get(&format!("/chat/{ROOM_ID}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Null Pointers chat"));
    assert!(html.find("first message").unwrap() < html.find("second message").unwrap());
}

#[tokio::test]
async fn admin_updates_roles() {
    let (app, mock) = spawn_app().await;
    app.login("adam").await;

    let alice = user_id("alice");
    let resp = app
        .post_form(
            &format!("/admin/users/{alice}/roles"),
            &[("roles", "judge, ROLE_participant, Judge")],
        )
        .await;
    assert_eq!(location(&resp), "/admin/users");
    assert_eq!(app.toast(), success("Roles updated"));
    let write = mock.last_write();
    assert_eq!(write.method, "PUT");
    assert_eq!(
        write.path,
        format!("/identity-service/api/v1/users/{alice}/roles")
    );
    assert_eq!(write.body["roles"].as_array().unwrap().len(), 2);

    let resp = app
        .post_form(&format!("/admin/users/{alice}/roles"), &[("roles", "wizard")])
        .await;
    assert_eq!(location(&resp), "/admin/users");
    assert_eq!(app.toast(), error("Unknown role: wizard"));
    assert_eq!(mock.writes().len(), 1);
}

#[tokio::test]
async fn organizer_lends_and_returns_device() {
    let (app, mock) = spawn_app().await;
    app.login("olga").await;

    let resp = app.get("/organizer/devices").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Pi Kit 7"));

    let target = format!("/organizer/devices/{DEVICE_ID}/assign");
    let resp = app
        .post_form(&target, &[("team_id", TEAM_ID.to_string().as_str())])
        .await;
    assert_eq!(location(&resp), "/organizer/devices");
    assert_eq!(app.toast(), success("Device assigned"));
    assert_eq!(mock.last_write().body["teamId"], json!(TEAM_ID));

    let resp = app.post_form(&target, &[("team_id", "")]).await;
    assert_eq!(location(&resp), "/organizer/devices");
    assert_eq!(app.toast(), success("Device returned to the pool"));
    assert_eq!(mock.last_write().body["teamId"], json!(null));
}
