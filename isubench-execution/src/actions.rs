//! Requests the scenarios are made of
//!
//! Each action builds one request on the agent and executes it under the
//! given cancellation token.

use isubench_core::Post;
use isubench_http::multipart::{Form, Part};
use isubench_http::{Agent, HttpResult, Response};
use tokio_util::sync::CancellationToken;

pub async fn get_initialize(cancel: &CancellationToken, agent: &Agent) -> HttpResult<Response> {
    let req = agent.get("/initialize")?;
    agent.execute(cancel, req).await
}

pub async fn get_login(cancel: &CancellationToken, agent: &Agent) -> HttpResult<Response> {
    let req = agent.get("/login")?;
    agent.execute(cancel, req).await
}

pub async fn post_login(
    cancel: &CancellationToken,
    agent: &Agent,
    account_name: &str,
    password: &str,
) -> HttpResult<Response> {
    let req = agent.post_form(
        "/login",
        &[("account_name", account_name), ("password", password)],
    )?;
    agent.execute(cancel, req).await
}

pub async fn get_root(cancel: &CancellationToken, agent: &Agent) -> HttpResult<Response> {
    let req = agent.get("/")?;
    agent.execute(cancel, req).await
}

/// Submit `post` with `image` as its file
pub async fn post_root(
    cancel: &CancellationToken,
    agent: &Agent,
    post: &Post,
    csrf_token: &str,
    image: Vec<u8>,
) -> HttpResult<Response> {
    let file = Part::bytes(image)
        .file_name("image.png")
        .mime_str(&post.mime)?;
    let form = Form::new()
        .text("body", post.body.clone())
        .text("csrf_token", csrf_token.to_string())
        .part("file", file);

    let req = agent.post_multipart("/", form)?;
    agent.execute(cancel, req).await
}
