//! In-process mock of the target web service

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::{Multipart, State};
use axum::http::header::{
    CONTENT_TYPE, COOKIE, ETAG, HOST, IF_NONE_MATCH, LOCATION, SET_COOKIE,
};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use isubench_config::{BenchConfig, PoolConfig};
use isubench_core::User;
use isubench_http::AgentConfig;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const CSRF_TOKEN: &str = "0123456789abcdef";
pub const STYLESHEET: &str = "body { color: #333; }";
pub const SCRIPT: &str = "console.log('isu');";

/// How long the stalled assets on `/gallery` hang; longer than any test agent timeout
pub const STALL: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct Session {
    account_name: Option<String>,
    invalid_login: bool,
}

/// Image upload received on `POST /`
#[derive(Debug, Clone)]
pub struct Upload {
    pub body: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Debug)]
pub struct MockTarget {
    users: HashMap<String, String>,
    sessions: Mutex<HashMap<u64, Session>>,
    next_session: AtomicU64,
    requests: Mutex<Vec<String>>,
    uploads: Mutex<Vec<Upload>>,
    feed: Mutex<Vec<(u64, String)>>,
    pub initialize_status: AtomicU16,
    pub hide_invalid_login_message: AtomicBool,
}

impl MockTarget {
    fn new(users: &[(&str, &str)]) -> Self {
        Self {
            users: users
                .iter()
                .map(|(name, password)| (name.to_string(), password.to_string()))
                .collect(),
            sessions: Mutex::new(HashMap::new()),
            next_session: AtomicU64::new(1),
            requests: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            feed: Mutex::new(vec![
                (3, "2016-01-02T12:00:00+09:00".to_string()),
                (2, "2016-01-02T11:59:00+09:00".to_string()),
                (1, "2016-01-02T11:58:00+09:00".to_string()),
            ]),
            initialize_status: AtomicU16::new(200),
            hide_invalid_login_message: AtomicBool::new(false),
        }
    }

    /// Page requests seen so far, as `METHOD path status`
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().clone()
    }

    pub fn set_feed(&self, feed: &[(u64, &str)]) {
        *self.feed.lock() = feed.iter().map(|(id, ts)| (*id, ts.to_string())).collect();
    }

    fn log(&self, method: &str, path: &str, status: StatusCode) {
        self.requests
            .lock()
            .push(format!("{} {} {}", method, path, status.as_u16()));
    }

    /// Session id from the cookie, creating a session when absent
    fn session(&self, headers: &HeaderMap) -> (u64, bool) {
        let existing = headers
            .get(COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|cookies| {
                cookies
                    .split(';')
                    .filter_map(|c| c.trim().strip_prefix("isu_session="))
                    .find_map(|id| id.parse::<u64>().ok())
            })
            .filter(|id| self.sessions.lock().contains_key(id));

        match existing {
            Some(id) => (id, false),
            None => {
                let id = self.next_session.fetch_add(1, Ordering::SeqCst);
                self.sessions.lock().insert(id, Session::default());
                (id, true)
            }
        }
    }
}

fn absolute(headers: &HeaderMap, path: &str) -> String {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{}{}", host, path)
}

fn with_cookie(mut res: Response, session: u64, created: bool) -> Response {
    if created {
        let cookie = format!("isu_session={}; Path=/; HttpOnly", session);
        res.headers_mut()
            .insert(SET_COOKIE, cookie.parse().expect("valid cookie"));
    }
    res
}

fn page(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<link href="/favicon.png" rel="icon" type="image/png">
<link href="/css/site.css" media="screen" rel="stylesheet" type="text/css">
</head>
<body>
{}
<script src="/js/app.js" type="text/javascript"></script>
</body>
</html>"#,
        body
    )
}

async fn initialize(State(target): State<Arc<MockTarget>>) -> StatusCode {
    let status = StatusCode::from_u16(target.initialize_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    target.log("GET", "/initialize", status);
    status
}

async fn login_page(State(target): State<Arc<MockTarget>>, headers: HeaderMap) -> Response {
    let (session, created) = target.session(&headers);
    let invalid = target
        .sessions
        .lock()
        .get(&session)
        .is_some_and(|s| s.invalid_login);

    let mut body = String::from(r#"<form method="post" action="/login">"#);
    if invalid && !target.hide_invalid_login_message.load(Ordering::SeqCst) {
        body.push_str(r#"<div id="notice-message" class="alert alert-danger">アカウント名かパスワードが間違っています</div>"#);
    }
    body.push_str("</form>");

    target.log("GET", "/login", StatusCode::OK);
    with_cookie(Html(page(&body)).into_response(), session, created)
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    account_name: String,
    password: String,
}

async fn login(
    State(target): State<Arc<MockTarget>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let (session, created) = target.session(&headers);
    let valid = target.users.get(&form.account_name) == Some(&form.password);

    let location = {
        let mut sessions = target.sessions.lock();
        let state = sessions.entry(session).or_default();
        if valid {
            state.account_name = Some(form.account_name);
            "/"
        } else {
            state.invalid_login = true;
            "/login"
        }
    };

    target.log("POST", "/login", StatusCode::FOUND);
    let res = (StatusCode::FOUND, [(LOCATION, absolute(&headers, location))]).into_response();
    with_cookie(res, session, created)
}

async fn index(State(target): State<Arc<MockTarget>>, headers: HeaderMap) -> Response {
    let (session, created) = target.session(&headers);
    let logged_in = target
        .sessions
        .lock()
        .get(&session)
        .is_some_and(|s| s.account_name.is_some());

    let mut body = String::new();
    if logged_in {
        body.push_str(&format!(
            r#"<form method="post" action="/" enctype="multipart/form-data"><input type="hidden" name="csrf_token" value="{}"></form>"#,
            CSRF_TOKEN
        ));
    }
    body.push_str(r#"<div class="isu-posts">"#);
    for (id, created_at) in target.feed.lock().iter() {
        body.push_str(&format!(
            r#"<div class="isu-post" id="pid_{}" data-created-at="{}"></div>"#,
            id, created_at
        ));
    }
    body.push_str("</div>");

    target.log("GET", "/", StatusCode::OK);
    with_cookie(Html(page(&body)).into_response(), session, created)
}

async fn post_index(
    State(target): State<Arc<MockTarget>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut upload = Upload {
        body: String::new(),
        file_name: None,
        content_type: None,
        size: 0,
    };
    let mut csrf_token = String::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "body" => upload.body = field.text().await.unwrap_or_default(),
            "csrf_token" => csrf_token = field.text().await.unwrap_or_default(),
            "file" => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                upload.size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
            }
            _ => {}
        }
    }

    let status = if csrf_token == CSRF_TOKEN {
        StatusCode::FOUND
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    target.log("POST", "/", status);
    target.uploads.lock().push(upload);

    (status, [(LOCATION, absolute(&headers, "/"))]).into_response()
}

fn asset(headers: &HeaderMap, content_type: &'static str, body: &'static str) -> Response {
    let etag = format!("\"{:x}\"", md5::compute(body));
    let fresh = headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|tag| tag == etag);
    if fresh {
        return (StatusCode::NOT_MODIFIED, [(ETAG, etag)]).into_response();
    }
    (
        StatusCode::OK,
        [(CONTENT_TYPE, content_type.to_string()), (ETAG, etag)],
        body,
    )
        .into_response()
}

async fn stylesheet(headers: HeaderMap) -> Response {
    asset(&headers, "text/css", STYLESHEET)
}

async fn script(headers: HeaderMap) -> Response {
    asset(&headers, "application/javascript", SCRIPT)
}

async fn favicon(headers: HeaderMap) -> Response {
    asset(&headers, "image/png", "png")
}

/// Page linking one asset that never answers and one whose body never ends
async fn gallery() -> Html<String> {
    Html(page(
        r#"<img src="/image/stalled.png"><img src="/image/partial.png">"#,
    ))
}

async fn stalled_image() -> Response {
    tokio::time::sleep(STALL).await;
    (StatusCode::OK, [(CONTENT_TYPE, "image/png")], "png").into_response()
}

async fn partial_image() -> Response {
    let chunks = futures::stream::unfold(false, |sent| async move {
        if sent {
            tokio::time::sleep(STALL).await;
            None
        } else {
            Some((Ok::<_, std::io::Error>(Bytes::from_static(b"\x89PNG")), true))
        }
    });
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "image/png")],
        Body::from_stream(chunks),
    )
        .into_response()
}

/// Start a mock target knowing `users` as `(account_name, password)` pairs
pub async fn spawn_target(users: &[(&str, &str)]) -> anyhow::Result<(SocketAddr, Arc<MockTarget>)> {
    let target = Arc::new(MockTarget::new(users));

    let app = Router::new()
        .route("/initialize", get(initialize))
        .route("/login", get(login_page).post(login))
        .route("/", get(index).post(post_index))
        .route("/css/site.css", get(stylesheet))
        .route("/js/app.js", get(script))
        .route("/favicon.png", get(favicon))
        .route("/gallery", get(gallery))
        .route("/image/stalled.png", get(stalled_image))
        .route("/image/partial.png", get(partial_image))
        .with_state(Arc::clone(&target));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Mock target error: {}", e);
        }
    });

    Ok((addr, target))
}

pub fn agent_config(addr: SocketAddr) -> AgentConfig {
    AgentConfig {
        base_url: format!("http://{}/", addr).parse().expect("valid base URL"),
        timeout: Duration::from_secs(5),
        ..AgentConfig::default()
    }
}

pub fn user(id: u64, account_name: &str, password: &str) -> User {
    User::new(id, account_name, password)
}

/// Configuration pointing at `addr` with a short load phase
pub fn bench_config(addr: SocketAddr, fixtures_dir: &std::path::Path) -> BenchConfig {
    let mut config = BenchConfig::default();
    config.target.host = addr.to_string();
    config.target.request_timeout = Duration::from_secs(5);
    config.load.duration = Duration::from_millis(400);
    config.load.login_success = PoolConfig::infinite(2);
    config.load.login_failure = PoolConfig::count(3, 1);
    config.load.ordered_feed = PoolConfig::infinite(1);
    config.fixtures = isubench_config::FixturesConfig::in_dir(fixtures_dir);
    config
}
