#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode as AxumStatus, Uri};
use axum::response::{IntoResponse, Response as AxumResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use hackboard::config::{Config, RealtimeConfig};

pub const PASSWORD: &str = "secret";

/// Users known to the mock identity service: (username, role).
const USERS: [(&str, &str); 4] = [
    ("alice", "PARTICIPANT"),
    ("olga", "ORGANIZER"),
    ("adam", "ADMIN"),
    ("jules", "ROLE_JUDGE"),
];

/// In-memory stand-in for the backend services.
#[derive(Default)]
pub struct MockBackend {
    /// access token -> username
    access: Mutex<HashMap<String, String>>,
    /// refresh token -> username
    refresh: Mutex<HashMap<String, String>>,
    issued: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub my_info_calls: AtomicUsize,
    pub refresh_fails: AtomicBool,
    /// Reject every access token, even freshly refreshed ones.
    pub reject_all: AtomicBool,
    writes: Mutex<Vec<Recorded>>,
    /// When set, every write is refused with 422 and this message.
    refuse_writes: Mutex<Option<String>>,
}

/// A non-GET call the mock received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Value,
}

pub const HACKATHON_ID: Uuid = Uuid::from_u128(0x2000);
pub const CREATED_HACKATHON_ID: Uuid = Uuid::from_u128(0x2001);
pub const ROUND_ID: Uuid = Uuid::from_u128(0x3000);
pub const TEAM_ID: Uuid = Uuid::from_u128(0x4000);
pub const CREATED_TEAM_ID: Uuid = Uuid::from_u128(0x4001);
pub const SUBMISSION_ID: Uuid = Uuid::from_u128(0x5000);
pub const NOTIFICATION_ID: Uuid = Uuid::from_u128(0x6000);
pub const ROOM_ID: Uuid = Uuid::from_u128(0x7000);
pub const DEVICE_ID: Uuid = Uuid::from_u128(0x8000);
pub const BOARD_ID: Uuid = Uuid::from_u128(0x9000);

impl MockBackend {
    fn issue(&self, username: &str) -> (String, String) {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");
        self.access
            .lock()
            .unwrap()
            .insert(access.clone(), username.to_string());
        self.refresh
            .lock()
            .unwrap()
            .insert(refresh.clone(), username.to_string());
        (access, refresh)
    }

    pub fn writes(&self) -> Vec<Recorded> {
        self.writes.lock().unwrap().clone()
    }

    pub fn last_write(&self) -> Recorded {
        self.writes().pop().expect("no write reached the backend")
    }

    pub fn refuse_writes(&self, message: &str) {
        *self.refuse_writes.lock().unwrap() = Some(message.to_string());
    }

    /// Expire every access token; refresh tokens stay valid.
    pub fn expire_access_tokens(&self) {
        self.access.lock().unwrap().clear();
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<String> {
        if self.reject_all.load(Ordering::SeqCst) {
            return None;
        }
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.access.lock().unwrap().get(token).cloned()
    }
}

pub fn user_id(username: &str) -> Uuid {
    let index = USERS
        .iter()
        .position(|(name, _)| *name == username)
        .unwrap_or(USERS.len());
    Uuid::from_u128(0x1000 + index as u128)
}

fn user_json(username: &str) -> Value {
    let role = USERS
        .iter()
        .find(|(name, _)| *name == username)
        .map(|(_, role)| *role)
        .unwrap_or("PARTICIPANT");
    json!({
        "id": user_id(username),
        "username": username,
        "email": format!("{username}@example.com"),
        "fullName": format!("{} Tester", username.to_uppercase()),
        "roles": [{ "name": role }, { "name": "BETA_TESTER" }],
    })
}

fn unauthorized() -> AxumResponse {
    (
        AxumStatus::UNAUTHORIZED,
        Json(json!({ "message": "Token expired" })),
    )
        .into_response()
}

type Mock = State<Arc<MockBackend>>;

async fn mock_login(State(mock): Mock, Json(body): Json<Value>) -> AxumResponse {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    if password != PASSWORD || !USERS.iter().any(|(name, _)| *name == username) {
        return (
            AxumStatus::UNAUTHORIZED,
            Json(json!({ "message": "Bad credentials" })),
        )
            .into_response();
    }
    let (access, refresh) = mock.issue(username);
    Json(json!({
        "code": 1000,
        "data": { "accessToken": access, "refreshToken": refresh },
    }))
    .into_response()
}

async fn mock_refresh(State(mock): Mock, Json(body): Json<Value>) -> AxumResponse {
    mock.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if mock.refresh_fails.load(Ordering::SeqCst) {
        return unauthorized();
    }

    // The presented token is spent on receipt, like a rotating backend.
    let presented = body["refreshToken"].as_str().unwrap_or_default();
    let Some(username) = mock.refresh.lock().unwrap().remove(presented) else {
        return unauthorized();
    };

    // Widen the window in which concurrent requests pile up on the refresh.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let (access, refresh) = mock.issue(&username);
    Json(json!({ "accessToken": access, "refreshToken": refresh })).into_response()
}

async fn mock_logout() -> Json<Value> {
    Json(json!({ "code": 1000, "message": "ok" }))
}

async fn mock_my_info(State(mock): Mock, headers: HeaderMap) -> AxumResponse {
    mock.my_info_calls.fetch_add(1, Ordering::SeqCst);
    match mock.user_for(&headers) {
        Some(username) => Json(json!({ "code": 1000, "data": user_json(&username) })).into_response(),
        None => unauthorized(),
    }
}

async fn mock_users(State(mock): Mock, headers: HeaderMap) -> AxumResponse {
    if mock.user_for(&headers).is_none() {
        return unauthorized();
    }
    let users: Vec<Value> = USERS.iter().map(|(name, _)| user_json(name)).collect();
    Json(json!({ "code": 1000, "data": { "content": users, "totalElements": users.len() } }))
        .into_response()
}

fn hackathon_json(id: Uuid, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "status": "ONGOING",
        "startDate": "2026-03-01T09:00:00",
        "endDate": "2026-03-03T18:00:00",
        "maxTeamSize": 4,
    })
}

fn team_json(id: Uuid, name: &str) -> Value {
    json!({
        "id": id,
        "hackathonId": HACKATHON_ID,
        "name": name,
        "description": "Builds things",
        "members": [
            { "userId": user_id("alice"), "username": "alice", "role": "LEADER" },
            { "userId": user_id("bob"), "username": "bob" },
        ],
    })
}

fn device_json(team: Option<Uuid>) -> Value {
    json!({
        "id": DEVICE_ID,
        "name": "Pi Kit 7",
        "serialNumber": "PK-0007",
        "status": if team.is_some() { "ASSIGNED" } else { "AVAILABLE" },
        "assignedTeamId": team,
    })
}

/// Canned responses for the resource endpoints the pages use.
fn resource(method: &Method, path: &str, body: &Value, username: &str) -> Option<(AxumStatus, Value)> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let ok = |data: Value| Some((AxumStatus::OK, json!({ "code": 1000, "data": data })));
    let created = |data: Value| Some((AxumStatus::CREATED, json!({ "code": 1000, "data": data })));

    match (method.as_str(), segments.as_slice()) {
        ("PUT", ["identity-service", "api", "v1", "users", id, "roles"]) => {
            let name = USERS
                .iter()
                .map(|(name, _)| *name)
                .find(|name| user_id(name).to_string() == *id)?;
            let mut user = user_json(name);
            user["roles"] = json!(body["roles"]
                .as_array()?
                .iter()
                .map(|r| json!({ "name": r }))
                .collect::<Vec<_>>());
            ok(user)
        }

        ("GET", ["hackathon-service", "api", "v1", "hackathons"]) => {
            ok(json!([hackathon_json(HACKATHON_ID, "Spring Hack")]))
        }
        ("POST", ["hackathon-service", "api", "v1", "hackathons"]) => {
            created(hackathon_json(CREATED_HACKATHON_ID, body["title"].as_str()?))
        }
        ("GET", ["hackathon-service", "api", "v1", "hackathons", _]) => {
            ok(hackathon_json(HACKATHON_ID, "Spring Hack"))
        }
        ("GET", ["hackathon-service", "api", "v1", "hackathons", _, "rounds"]) => ok(json!([{
            "id": ROUND_ID,
            "hackathonId": HACKATHON_ID,
            "name": "Prototype",
            "roundNumber": 1,
            "startTime": "2026-03-01T10:00:00",
            "endTime": "2026-03-02T10:00:00",
        }])),
        ("POST", ["hackathon-service", "api", "v1", "hackathons", _, "rounds"]) => created(json!({
            "id": Uuid::from_u128(0x3001),
            "hackathonId": HACKATHON_ID,
            "name": body["name"],
            "roundNumber": body["roundNumber"],
        })),
        ("GET", ["hackathon-service", "api", "v1", "sponsorships"]) => ok(json!([])),
        ("POST", ["hackathon-service", "api", "v1", "sponsorships"]) => created(json!({
            "id": Uuid::from_u128(0xa000),
            "hackathonId": body["hackathonId"],
            "sponsorName": body["sponsorName"],
        })),
        ("GET", ["hackathon-service", "api", "v1", "teams"])
        | ("GET", ["hackathon-service", "api", "v1", "teams", "my-teams"]) => {
            ok(json!([team_json(TEAM_ID, "Null Pointers")]))
        }
        ("GET", ["hackathon-service", "api", "v1", "teams", _]) => ok(team_json(TEAM_ID, "Null Pointers")),
        ("POST", ["hackathon-service", "api", "v1", "teams"]) => {
            created(team_json(CREATED_TEAM_ID, body["name"].as_str()?))
        }
        ("POST", ["hackathon-service", "api", "v1", "teams", _, "members"]) => {
            ok(team_json(TEAM_ID, "Null Pointers"))
        }
        ("DELETE", ["hackathon-service", "api", "v1", "teams", _, "members", _]) => {
            Some((AxumStatus::NO_CONTENT, Value::Null))
        }
        ("GET", ["hackathon-service", "api", "v1", "boards"]) => ok(json!([{
            "id": BOARD_ID,
            "teamId": TEAM_ID,
            "name": "Sprint",
            "lists": [
                { "id": Uuid::from_u128(0x9102), "name": "Lane Omega", "position": 2, "cards": [] },
                { "id": Uuid::from_u128(0x9101), "name": "Lane Alpha", "position": 1, "cards": [
                    { "id": Uuid::from_u128(0x9201), "title": "Wire up login", "position": 0 },
                ]},
            ],
        }])),
        ("POST", ["hackathon-service", "api", "v1", "boards"]) => created(json!({
            "id": Uuid::from_u128(0x9001),
            "teamId": body["teamId"],
            "name": body["name"],
        })),
        ("GET", ["hackathon-service", "api", "v1", "devices"]) => ok(json!([device_json(None)])),
        ("POST", ["hackathon-service", "api", "v1", "devices", _, "assign"]) => {
            let team = body["teamId"].as_str().and_then(|t| Uuid::parse_str(t).ok());
            ok(device_json(team))
        }

        ("GET", ["submission-service", "api", "v1", "submissions"]) => ok(json!([{
            "id": SUBMISSION_ID,
            "teamId": TEAM_ID,
            "roundId": ROUND_ID,
            "title": "Sensor Mesh",
            "repositoryUrl": "https://example.com/sensor-mesh",
            "status": "SUBMITTED",
            "submittedAt": "2026-03-02T09:00:00",
        }])),
        ("POST", ["submission-service", "api", "v1", "submissions"]) => created(json!({
            "id": Uuid::from_u128(0x5001),
            "teamId": body["teamId"],
            "roundId": body["roundId"],
            "title": body["title"],
        })),
        ("GET", ["submission-service", "api", "v1", "judge-submissions"]) => ok(json!([])),
        ("POST", ["submission-service", "api", "v1", "judge-submissions"]) => created(json!({
            "id": Uuid::from_u128(0x5100),
            "submissionId": body["submissionId"],
            "judgeId": user_id(username),
            "score": body["score"],
            "note": body["note"],
        })),

        ("GET", ["communication-service", "api", "v1", "notifications"]) => ok(json!([
            {
                "id": Uuid::from_u128(0x6001),
                "title": "Older notice",
                "content": "Check-in opens at 9",
                "read": true,
                "createdAt": "2026-03-01T08:00:00",
            },
            {
                "id": NOTIFICATION_ID,
                "title": "Judging starts",
                "content": "Round 1 judging has begun",
                "notificationType": "ROUND",
                "read": false,
                "createdAt": "2026-03-02T08:00:00Z",
            },
        ])),
        ("GET", ["communication-service", "api", "v1", "notifications", "unread-count"]) => ok(json!(1)),
        ("PUT", ["communication-service", "api", "v1", "notifications", "read-all"])
        | ("PUT", ["communication-service", "api", "v1", "notifications", _, "read"]) => {
            ok(Value::Null)
        }
        ("GET", ["communication-service", "api", "v1", "chat-rooms"]) => {
            ok(json!([{ "id": ROOM_ID, "name": "Null Pointers chat" }]))
        }
        ("GET", ["communication-service", "api", "v1", "chat-rooms", _]) => {
            ok(json!({ "id": ROOM_ID, "name": "Null Pointers chat" }))
        }
        ("GET", ["communication-service", "api", "v1", "chat-rooms", _, "messages"]) => ok(json!([
            {
                "id": Uuid::from_u128(0x7102),
                "roomId": ROOM_ID,
                "senderId": user_id("alice"),
                "senderName": "ALICE Tester",
                "content": "second message",
                "createdAt": "2026-03-02T10:05:00",
            },
            {
                "id": Uuid::from_u128(0x7101),
                "roomId": ROOM_ID,
                "senderId": user_id("bob"),
                "senderName": "Bob",
                "content": "first message",
                "createdAt": "2026-03-02T10:00:00",
            },
        ])),
        _ => None,
    }
}

async fn mock_resource(
    State(mock): Mock,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> AxumResponse {
    let Some(username) = mock.user_for(&headers) else {
        return unauthorized();
    };
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    if method != Method::GET {
        mock.writes.lock().unwrap().push(Recorded {
            method: method.to_string(),
            path: uri.path().to_string(),
            body: body.clone(),
        });
        if let Some(message) = mock.refuse_writes.lock().unwrap().clone() {
            return (
                AxumStatus::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": message })),
            )
                .into_response();
        }
    }

    match resource(&method, uri.path(), &body, &username) {
        Some((status, _)) if status == AxumStatus::NO_CONTENT => status.into_response(),
        Some((status, value)) => (status, Json(value)).into_response(),
        None => (
            AxumStatus::NOT_FOUND,
            Json(json!({ "message": format!("No mock for {method} {}", uri.path()) })),
        )
            .into_response(),
    }
}

async fn mock_slow(State(mock): Mock, headers: HeaderMap) -> AxumResponse {
    if mock.user_for(&headers).is_none() {
        return unauthorized();
    }
    tokio::time::sleep(Duration::from_millis(800)).await;
    Json(json!({ "slow": true })).into_response()
}

/// Same as `mock_slow` but open to anonymous callers.
async fn mock_public_slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(800)).await;
    Json(json!({ "slow": true }))
}

async fn mock_echo(State(mock): Mock, headers: HeaderMap, body: String) -> AxumResponse {
    if mock.user_for(&headers).is_none() {
        return unauthorized();
    }
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    (
        AxumStatus::CREATED,
        Json(json!({ "received": body, "requestId": request_id })),
    )
        .into_response()
}

async fn mock_teapot(State(mock): Mock, headers: HeaderMap) -> AxumResponse {
    if mock.user_for(&headers).is_none() {
        return unauthorized();
    }
    (
        AxumStatus::UNPROCESSABLE_ENTITY,
        Json(json!({ "message": "Team is full" })),
    )
        .into_response()
}

/// Start the mock backend on a random port.
pub async fn spawn_backend() -> (SocketAddr, Arc<MockBackend>) {
    let mock = Arc::new(MockBackend::default());

    let app = Router::new()
        .route("/identity-service/api/v1/auth/login", post(mock_login))
        .route("/identity-service/api/v1/auth/refresh", post(mock_refresh))
        .route("/identity-service/api/v1/auth/logout", post(mock_logout))
        .route("/identity-service/api/v1/users/my-info", get(mock_my_info))
        .route("/identity-service/api/v1/users", get(mock_users))
        .route("/hackathon-service/api/v1/slow", get(mock_slow))
        .route("/hackathon-service/api/v1/public/slow", get(mock_public_slow))
        .route("/submission-service/api/v1/echo", post(mock_echo))
        .route("/communication-service/api/v1/full", post(mock_teapot))
        .fallback(mock_resource)
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock backend failed");
    });

    (addr, mock)
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn test_config(backend: SocketAddr) -> Config {
    Config {
        api_url: format!("http://{backend}"),
        ws_url: format!("http://{backend}/ws"),
        session_secret: "test-session-secret-that-is-long-enough".to_string(),
        encryption_key: "test-encryption-key-32-chars-ok!".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:0".to_string(),
        secure_cookies: false,
        request_timeout: Duration::from_secs(5),
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
        realtime: RealtimeConfig {
            reconnect_delay: Duration::from_millis(200),
            ..RealtimeConfig::default()
        },
    }
}

/// A running app instance plus a browser-like cookie store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub cookies: Mutex<HashMap<String, String>>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.lock().unwrap().get(name).cloned()
    }

    pub fn set_cookie(&self, name: &str, value: &str) {
        self.cookies
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    pub fn forget_cookie(&self, name: &str) {
        self.cookies.lock().unwrap().remove(name);
    }

    pub fn cookie_header(&self) -> String {
        self.cookies
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Apply `Set-Cookie` headers the way a browser would.
    fn store_cookies(&self, resp: &Response) {
        let mut cookies = self.cookies.lock().unwrap();
        for header in resp.headers().get_all(SET_COOKIE) {
            let Ok(header) = header.to_str() else { continue };
            let pair = header.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else { continue };
            let expired = header.to_ascii_lowercase().contains("max-age=0");
            if value.is_empty() || expired {
                cookies.remove(name.trim());
            } else {
                cookies.insert(name.trim().to_string(), value.to_string());
            }
        }
    }

    pub async fn send(&self, req: reqwest::RequestBuilder) -> Response {
        let resp = req
            .header(COOKIE, self.cookie_header())
            .send()
            .await
            .expect("request failed");
        self.store_cookies(&resp);
        resp
    }

    pub async fn get(&self, path: &str) -> Response {
        self.send(self.client.get(self.url(path))).await
    }

    pub async fn get_json(&self, path: &str) -> (Value, StatusCode) {
        let resp = self.get(path).await;
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self.send(self.client.post(self.url(path)).json(body)).await;
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.send(self.client.post(self.url(path)).form(form)).await
    }

    /// Another browser against the same app, with its own cookie store.
    pub fn other_browser(&self) -> TestApp {
        TestApp {
            addr: self.addr,
            client: self.client.clone(),
            cookies: Mutex::new(HashMap::new()),
        }
    }

    /// The pending flash toast as `(kind, message)`.
    pub fn toast(&self) -> Option<(String, String)> {
        let raw = hex::decode(self.cookie("hb_toast")?).ok()?;
        let toast: Value = serde_json::from_slice(&raw).ok()?;
        Some((
            toast["kind"].as_str()?.to_string(),
            toast["message"].as_str()?.to_string(),
        ))
    }

    pub async fn login(&self, username: &str) -> (Value, StatusCode) {
        self.post_json(
            "/api/auth/login",
            &json!({ "username": username, "password": PASSWORD }),
        )
        .await
    }
}

pub fn location(resp: &Response) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Spawn the app against `config`.
pub async fn spawn_app_with(config: Config) -> TestApp {
    let app = hackboard::build_app(config).expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        cookies: Mutex::new(HashMap::new()),
    }
}

/// Spawn the app in front of a fresh mock backend.
pub async fn spawn_app() -> (TestApp, Arc<MockBackend>) {
    let (backend, mock) = spawn_backend().await;
    let app = spawn_app_with(test_config(backend)).await;
    (app, mock)
}
