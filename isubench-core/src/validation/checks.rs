//! Built-in response checks

use super::{ResponseCheck, ValidationError};
use crate::failure::{Failure, FailureKind};
use crate::model::User;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use isubench_http::{Agent, HttpError, Response, StatusCode};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

static CSRF_TOKEN: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"input[name="csrf_token"]"#).expect("csrf selector is valid")
});

static FEED_ITEM: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".isu-posts .isu-post").expect("feed selector is valid")
});

/// MD5 digests of the static files every target must serve unchanged
pub fn asset_digests() -> HashMap<String, String> {
    [
        ("favicon.ico", "ad4b0f606e0f8465bc4c4c170b37e1a3"),
        ("js/timeago.min.js", "f2d4c53400d0a46de704f5a97d6d04fb"),
        ("js/main.js", "9c309fed7e360c57a705978dab2c68ad"),
        ("css/style.css", "e4c3606a18d11863189405eb5c6ca551"),
    ]
    .into_iter()
    .map(|(path, digest)| (path.to_string(), digest.to_string()))
    .collect()
}

fn body_failure(res: &Response, err: &HttpError) -> ValidationError {
    Failure::new(
        FailureKind::Response,
        format!("{} {} : {}", res.method, res.path(), err),
    )
    .into()
}

/// The response status must equal the expected code
#[derive(Debug, Clone, Copy)]
pub struct ExpectStatus(pub u16);

#[async_trait]
impl ResponseCheck for ExpectStatus {
    async fn check(&self, res: &Response) -> Option<ValidationError> {
        if res.status.as_u16() == self.0 {
            return None;
        }

        Some(
            Failure::new(
                FailureKind::StatusCode,
                format!(
                    "{} {} : expected({}) != actual({})",
                    res.method,
                    res.path(),
                    self.0,
                    res.status.as_u16()
                ),
            )
            .into(),
        )
    }
}

/// The `Location` header must equal the expected path resolved against the request URL
#[derive(Debug, Clone)]
pub struct ExpectLocation(pub String);

impl ExpectLocation {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }
}

#[async_trait]
impl ResponseCheck for ExpectLocation {
    async fn check(&self, res: &Response) -> Option<ValidationError> {
        let actual = res.location().unwrap_or_default();
        let matches = res
            .url
            .join(&self.0)
            .map(|target| target.as_str() == actual)
            .unwrap_or(false);
        if matches {
            return None;
        }

        Some(
            Failure::new(
                FailureKind::Path,
                format!(
                    "{} {} : Location, expected({}) != actual({})",
                    res.method,
                    res.path(),
                    self.0,
                    actual
                ),
            )
            .into(),
        )
    }
}

/// The body must contain the given text
#[derive(Debug, Clone)]
pub struct ExpectBodyContains(pub String);

impl ExpectBodyContains {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

#[async_trait]
impl ResponseCheck for ExpectBodyContains {
    async fn check(&self, res: &Response) -> Option<ValidationError> {
        let body = match res.text() {
            Ok(body) => body,
            Err(e) => return Some(body_failure(res, e)),
        };

        if body.contains(self.0.as_str()) {
            return None;
        }

        Some(
            Failure::new(
                FailureKind::NotFound,
                format!("{} {} : {} is not found in body", res.method, res.path(), self.0),
            )
            .into(),
        )
    }
}

/// Extract the form's CSRF token onto the user
///
/// The user's token is cleared first, so a failed extraction never leaves
/// a token from an earlier page behind.
#[derive(Debug, Clone, Copy)]
pub struct ExpectCsrfToken<'a>(pub &'a User);

fn find_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let input = document.select(&CSRF_TOKEN).next()?;
    input.value().attr("value").map(str::to_string)
}

#[async_trait]
impl<'a> ResponseCheck for ExpectCsrfToken<'a> {
    async fn check(&self, res: &Response) -> Option<ValidationError> {
        self.0.clear_csrf_token();

        let body = match res.text() {
            Ok(body) => body,
            Err(e) => return Some(body_failure(res, e)),
        };

        match find_csrf_token(&body) {
            Some(token) if !token.is_empty() => {
                self.0.set_csrf_token(token);
                None
            }
            _ => Some(
                Failure::new(
                    FailureKind::CsrfToken,
                    format!("{} {} : CSRF token is not found", res.method, res.path()),
                )
                .into(),
            ),
        }
    }
}

/// Feed items must appear newest first
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectOrderedPosts;

/// `(id, created_at)` of every feed item carrying both attributes, in
/// document order; an ID that does not parse is reported as 0
fn feed_items(html: &str) -> Vec<(u64, DateTime<FixedOffset>)> {
    let document = Html::parse_document(html);
    document
        .select(&FEED_ITEM)
        .filter_map(|item| {
            let item = item.value();
            let id = item
                .attr("id")?
                .trim_start_matches("pid_")
                .parse::<u64>()
                .unwrap_or(0);
            let created_at = DateTime::parse_from_rfc3339(item.attr("data-created-at")?).ok()?;
            Some((id, created_at))
        })
        .collect()
}

#[async_trait]
impl ResponseCheck for ExpectOrderedPosts {
    async fn check(&self, res: &Response) -> Option<ValidationError> {
        let body = match res.text() {
            Ok(body) => body,
            Err(e) => return Some(body_failure(res, e)),
        };

        let mut failures = Vec::new();
        let mut previous: Option<DateTime<FixedOffset>> = None;
        for (id, created_at) in feed_items(&body) {
            if previous.is_some_and(|previous| created_at > previous) {
                info!(target: "admin", "isu-post: {}: {}", id, created_at.to_rfc3339());
                failures.push(
                    Failure::new(
                        FailureKind::PostOrder,
                        format!(
                            "{} {} : invalid order in top page: {}",
                            res.method,
                            res.path(),
                            created_at.to_rfc3339()
                        ),
                    )
                    .with_context(format!("isu-post: {}", id)),
                );
            }
            previous = Some(created_at);
        }

        Some(failures.into())
    }
}

/// Every linked static file must be fetchable and, when known, unmodified
#[derive(Debug, Clone)]
pub struct ExpectAssets {
    agent: Arc<Agent>,
    cancel: CancellationToken,
    digests: HashMap<String, String>,
}

impl ExpectAssets {
    pub fn new(agent: Arc<Agent>, cancel: CancellationToken) -> Self {
        Self::with_digests(agent, cancel, asset_digests())
    }

    pub fn with_digests(
        agent: Arc<Agent>,
        cancel: CancellationToken,
        digests: HashMap<String, String>,
    ) -> Self {
        Self {
            agent,
            cancel,
            digests,
        }
    }
}

#[async_trait]
impl ResponseCheck for ExpectAssets {
    async fn check(&self, res: &Response) -> Option<ValidationError> {
        let resources = match self.agent.process_html(&self.cancel, res).await {
            Ok(resources) => resources,
            Err(HttpError::Cancelled) => return None,
            Err(e) => {
                return Some(
                    Failure::new(
                        FailureKind::Asset,
                        format!("{} {} : {}", res.method, res.path(), e),
                    )
                    .into(),
                )
            }
        };

        let mut failures = Vec::new();
        for resource in &resources {
            let path = resource.path();
            let asset = match &resource.response {
                Ok(asset) => asset,
                // An aborted fetch says nothing about the target
                Err(HttpError::Cancelled) => continue,
                Err(e) => {
                    failures.push(Failure::new(
                        FailureKind::Asset,
                        format!("GET /{} : {}", path, e),
                    ));
                    continue;
                }
            };

            if asset.status == StatusCode::NOT_MODIFIED {
                continue;
            }
            let Some(expected) = self.digests.get(path) else {
                continue;
            };

            let actual = match asset.body() {
                Ok(body) => format!("{:x}", md5::compute(body)),
                Err(e) => {
                    failures.push(Failure::new(
                        FailureKind::Asset,
                        format!("GET /{} : {}", path, e),
                    ));
                    continue;
                }
            };

            if *expected != actual {
                failures.push(Failure::new(
                    FailureKind::Asset,
                    format!(
                        "GET /{} : expected(MD5 {}) != actual(MD5 {})",
                        path, expected, actual
                    ),
                ));
            }
        }

        Some(failures.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_response;
    use bytes::Bytes;
    use isubench_http::header::{HeaderMap, HeaderValue, LOCATION};
    use isubench_http::Method;
    use url::Url;

    fn response(method: Method, path: &str, status: u16, body: &str) -> Response {
        Response::new(
            method,
            Url::parse("http://localhost:8080/").unwrap().join(path).unwrap(),
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            Ok(Bytes::copy_from_slice(body.as_bytes())),
        )
    }

    fn kinds(error: &ValidationError) -> Vec<FailureKind> {
        error.failures().iter().map(|f| f.kind).collect()
    }

    fn feed(timestamps: &[&str]) -> String {
        let items: String = timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| {
                format!(
                    r#"<div class="isu-post" id="pid_{}" data-created-at="{}"></div>"#,
                    i + 1,
                    ts
                )
            })
            .collect();
        format!(r#"<html><body><div class="isu-posts">{}</div></body></html>"#, items)
    }

    #[tokio::test]
    async fn test_status_code_mismatch() {
        let res = response(Method::GET, "/login", 404, "");
        let error = validate_response(&res, &[&ExpectStatus(200)]).await;

        assert_eq!(kinds(&error), vec![FailureKind::StatusCode]);
        assert_eq!(
            error.failures()[0].message,
            "GET /login : expected(200) != actual(404)"
        );

        let res = response(Method::GET, "/login", 200, "");
        assert!(validate_response(&res, &[&ExpectStatus(200)]).await.is_empty());
    }

    #[tokio::test]
    async fn test_checks_do_not_short_circuit() {
        let res = response(Method::GET, "/login", 500, "<html></html>");
        let error = validate_response(
            &res,
            &[&ExpectStatus(200), &ExpectBodyContains::new("welcome")],
        )
        .await;

        assert_eq!(
            kinds(&error),
            vec![FailureKind::StatusCode, FailureKind::NotFound]
        );
    }

    #[tokio::test]
    async fn test_location() {
        let mut res = response(Method::POST, "/login", 302, "");
        res.headers
            .insert(LOCATION, HeaderValue::from_static("http://localhost:8080/"));

        assert!(ExpectLocation::new("/").check(&res).await.is_none());

        let error = ExpectLocation::new("/login").check(&res).await.unwrap();
        assert_eq!(kinds(&error), vec![FailureKind::Path]);
        assert_eq!(
            error.failures()[0].message,
            "POST /login : Location, expected(/login) != actual(http://localhost:8080/)"
        );

        // A relative Location header is not the resolved absolute URL
        res.headers.insert(LOCATION, HeaderValue::from_static("/"));
        assert!(ExpectLocation::new("/").check(&res).await.is_some());
    }

    #[tokio::test]
    async fn test_body_contains() {
        let res = response(
            Method::GET,
            "/login",
            200,
            "<p>アカウント名かパスワードが間違っています</p>",
        );
        assert!(ExpectBodyContains::new("アカウント名かパスワードが間違っています")
            .check(&res)
            .await
            .is_none());

        // Sharing characters with the body is not enough
        let error = ExpectBodyContains::new("パスワードを入力")
            .check(&res)
            .await
            .unwrap();
        assert_eq!(kinds(&error), vec![FailureKind::NotFound]);
    }

    #[tokio::test]
    async fn test_body_read_failure() {
        let res = Response::new(
            Method::GET,
            Url::parse("http://localhost:8080/").unwrap(),
            StatusCode::OK,
            HeaderMap::new(),
            Err(HttpError::Cancelled),
        );
        let error = ExpectBodyContains::new("x").check(&res).await.unwrap();
        assert_eq!(kinds(&error), vec![FailureKind::Response]);
    }

    #[tokio::test]
    async fn test_csrf_token() {
        let user = User::new(1, "mary", "marymary");

        let res = response(
            Method::GET,
            "/",
            200,
            r#"<form><input type="hidden" name="csrf_token" value="abc123"></form>"#,
        );
        assert!(ExpectCsrfToken(&user).check(&res).await.is_none());
        assert_eq!(user.csrf_token(), "abc123");

        // A page without a token clears the previous one
        let res = response(Method::GET, "/", 200, "<form></form>");
        let error = ExpectCsrfToken(&user).check(&res).await.unwrap();
        assert_eq!(kinds(&error), vec![FailureKind::CsrfToken]);
        assert_eq!(user.csrf_token(), "");

        let res = response(
            Method::GET,
            "/",
            200,
            r#"<input type="hidden" name="csrf_token" value="">"#,
        );
        assert!(ExpectCsrfToken(&user).check(&res).await.is_some());
    }

    #[tokio::test]
    async fn test_ordered_posts() {
        let descending = feed(&[
            "2016-01-02T00:02:00+09:00",
            "2016-01-02T00:01:00+09:00",
            "2016-01-02T00:00:00+09:00",
        ]);
        let res = response(Method::GET, "/", 200, &descending);
        let error = ExpectOrderedPosts.check(&res).await.unwrap();
        assert!(error.is_empty());

        let swapped = feed(&[
            "2016-01-02T00:01:00+09:00",
            "2016-01-02T00:02:00+09:00",
            "2016-01-02T00:00:00+09:00",
        ]);
        let res = response(Method::GET, "/", 200, &swapped);
        let error = ExpectOrderedPosts.check(&res).await.unwrap();
        assert_eq!(kinds(&error), vec![FailureKind::PostOrder]);
        assert_eq!(error.failures()[0].context.as_deref(), Some("isu-post: 2"));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_order_violation_logged_at_info() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let shuffled = feed(&[
            "2016-01-02T00:01:00+09:00",
            "2016-01-02T00:02:00+09:00",
            "2016-01-02T00:00:00+09:00",
        ]);
        let res = response(Method::GET, "/", 200, &shuffled);
        ExpectOrderedPosts.check(&res).await.unwrap();

        let output = String::from_utf8_lossy(&captured.0.lock()).to_string();
        assert!(output.contains("isu-post: 2: "), "log output: {}", output);
    }

    #[tokio::test]
    async fn test_ordered_posts_skips_malformed_items() {
        let html = r#"<div class="isu-posts">
            <div class="isu-post" id="pid_1" data-created-at="2016-01-02T00:00:00Z"></div>
            <div class="isu-post" data-created-at="2016-01-03T00:00:00Z"></div>
            <div class="isu-post" id="pid_2" data-created-at="yesterday"></div>
            <div class="isu-post" id="pid_3"></div>
            <div class="isu-post" id="pid_4" data-created-at="2016-01-01T00:00:00Z"></div>
        </div>"#;
        let res = response(Method::GET, "/", 200, html);
        assert!(ExpectOrderedPosts.check(&res).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ordered_posts_checks_items_with_unparsable_id() {
        let html = r#"<div class="isu-posts">
            <div class="isu-post" id="pid_1" data-created-at="2016-01-02T00:00:00Z"></div>
            <div class="isu-post" id="post-x" data-created-at="2016-01-03T00:00:00Z"></div>
        </div>"#;
        let res = response(Method::GET, "/", 200, html);

        let error = ExpectOrderedPosts.check(&res).await.unwrap();
        let failures = error.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::PostOrder);
        assert_eq!(failures[0].context.as_deref(), Some("isu-post: 0"));
    }

    #[tokio::test]
    async fn test_cancelled_asset_fetches_are_not_failures() {
        let agent = Agent::new(isubench_http::AgentConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let html = r#"<link href="/css/style.css" rel="stylesheet"><script src="/js/main.js"></script>"#;
        let res = response(Method::GET, "/login", 200, html);
        let check = ExpectAssets::new(Arc::new(agent), cancel);

        assert!(check.check(&res).await.is_none_or(|error| error.is_empty()));
    }

    #[test]
    fn test_asset_digest_table() {
        let digests = asset_digests();
        assert_eq!(digests.len(), 4);
        assert_eq!(digests["css/style.css"], "e4c3606a18d11863189405eb5c6ca551");
    }
}
