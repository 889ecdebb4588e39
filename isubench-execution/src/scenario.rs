//! Scenario cases
//!
//! Each case is a fixed sequence of request, validate, branch steps run
//! for one user. A step that fails validation records its failures and
//! ends the case; a step that passes is credited its score tag. The
//! cancellation signal is checked between steps so a cancelled run issues
//! no further requests.

use crate::actions;
use crate::random::{random_image, random_text};
use chrono::Utc;
use isubench_config::FixturesConfig;
use isubench_core::validation::{
    validate_response, ExpectAssets, ExpectBodyContains, ExpectCsrfToken, ExpectLocation,
    ExpectOrderedPosts, ExpectStatus,
};
use isubench_core::{
    BenchResult, BenchmarkStep, Comment, Failure, FailureKind, Post, Registry, ScoreTag, User,
    ValidationError,
};
use isubench_http::{Agent, AgentConfig, HttpError, Method};
use isubench_logging::admin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shown by the target after a login with a wrong password
pub const INVALID_CREDENTIALS_MESSAGE: &str = "アカウント名かパスワードが間違っています";

/// Entity registries plus the agent settings every case uses
#[derive(Debug)]
pub struct Scenario {
    pub users: Registry<User>,
    pub posts: Registry<Post>,
    pub comments: Registry<Comment>,
    agent_config: AgentConfig,
}

impl Scenario {
    pub fn new(agent_config: AgentConfig) -> Self {
        Self {
            users: Registry::new(),
            posts: Registry::new(),
            comments: Registry::new(),
            agent_config,
        }
    }

    pub fn agent_config(&self) -> &AgentConfig {
        &self.agent_config
    }

    /// Load every dump file into its registry
    pub fn load_fixtures(&self, fixtures: &FixturesConfig) -> BenchResult<()> {
        let users = self.users.load_json(&fixtures.users)?;
        let posts = self.posts.load_json(&fixtures.posts)?;
        let comments = self.comments.load_json(&fixtures.comments)?;
        admin!(users, posts, comments, "Fixtures loaded");
        Ok(())
    }

    /// Random user that is not logically deleted
    fn pick_user(&self) -> Option<Arc<User>> {
        self.users
            .sample(&mut rand::rng())
            .filter(|user| !user.is_deleted())
    }

    /// One iteration of the login-success pool: log in, then post an image
    pub async fn run_login_success(&self, cancel: &CancellationToken, step: &BenchmarkStep) {
        let Some(user) = self.pick_user() else {
            return;
        };
        if self.login_success(cancel, step, &user).await {
            self.post_image(cancel, step, &user).await;
        }
        user.reset_session();
    }

    /// One iteration of the login-failure pool
    pub async fn run_login_failure(&self, cancel: &CancellationToken, step: &BenchmarkStep) {
        let Some(user) = self.pick_user() else {
            return;
        };
        self.login_failure(cancel, step, &user).await;
        user.reset_session();
    }

    /// One iteration of the ordered-feed pool
    pub async fn run_ordered_feed(&self, cancel: &CancellationToken, step: &BenchmarkStep) {
        let Some(user) = self.pick_user() else {
            return;
        };
        self.ordered_index(cancel, step, &user).await;
        user.reset_session();
    }

    fn agent(&self, step: &BenchmarkStep, user: &User) -> Option<Arc<Agent>> {
        match user.agent(&self.agent_config) {
            Ok(agent) => Some(agent),
            Err(e) => {
                step.add_failure(
                    Failure::new(FailureKind::Agent, format!("{} : {}", user.account_name, e))
                        .with_context(isubench_core::failure::error_chain(&e)),
                );
                None
            }
        }
    }

    pub async fn login_success(
        &self,
        cancel: &CancellationToken,
        step: &BenchmarkStep,
        user: &User,
    ) -> bool {
        let Some(agent) = self.agent(step, user) else {
            return false;
        };

        let res = match actions::get_login(cancel, &agent).await {
            Ok(res) => res,
            Err(e) => return request_failed(step, Method::GET, "/login", &e),
        };
        let assets = ExpectAssets::new(Arc::clone(&agent), cancel.clone());
        let validation = validate_response(&res, &[&ExpectStatus(200), &assets]).await;
        if !settle(cancel, step, ScoreTag::GetLogin, validation) {
            return false;
        }

        let res = match actions::post_login(cancel, &agent, &user.account_name, &user.password)
            .await
        {
            Ok(res) => res,
            Err(e) => return request_failed(step, Method::POST, "/login", &e),
        };
        let validation =
            validate_response(&res, &[&ExpectStatus(302), &ExpectLocation::new("/")]).await;
        settle(cancel, step, ScoreTag::PostLogin, validation)
    }

    pub async fn login_failure(
        &self,
        cancel: &CancellationToken,
        step: &BenchmarkStep,
        user: &User,
    ) -> bool {
        let Some(agent) = self.agent(step, user) else {
            return false;
        };

        let res = match actions::get_login(cancel, &agent).await {
            Ok(res) => res,
            Err(e) => return request_failed(step, Method::GET, "/login", &e),
        };
        let assets = ExpectAssets::new(Arc::clone(&agent), cancel.clone());
        let validation = validate_response(&res, &[&ExpectStatus(200), &assets]).await;
        if !settle(cancel, step, ScoreTag::GetLogin, validation) {
            return false;
        }

        let wrong_password = format!("{}.invalid", user.password);
        let res = match actions::post_login(cancel, &agent, &user.account_name, &wrong_password)
            .await
        {
            Ok(res) => res,
            Err(e) => return request_failed(step, Method::POST, "/login", &e),
        };
        let validation =
            validate_response(&res, &[&ExpectStatus(302), &ExpectLocation::new("/login")]).await;
        if !settle(cancel, step, ScoreTag::PostLogin, validation) {
            return false;
        }

        let res = match actions::get_login(cancel, &agent).await {
            Ok(res) => res,
            Err(e) => return request_failed(step, Method::GET, "/login", &e),
        };
        let validation = validate_response(
            &res,
            &[
                &ExpectStatus(200),
                &ExpectBodyContains::new(INVALID_CREDENTIALS_MESSAGE),
            ],
        )
        .await;
        settle(cancel, step, ScoreTag::GetLogin, validation)
    }

    /// Post a random image; only meaningful after a successful login
    pub async fn post_image(
        &self,
        cancel: &CancellationToken,
        step: &BenchmarkStep,
        user: &User,
    ) -> bool {
        let Some(agent) = self.agent(step, user) else {
            return false;
        };

        let res = match actions::get_root(cancel, &agent).await {
            Ok(res) => res,
            Err(e) => return request_failed(step, Method::GET, "/", &e),
        };
        let validation =
            validate_response(&res, &[&ExpectStatus(200), &ExpectCsrfToken(user)]).await;
        if !settle(cancel, step, ScoreTag::GetRoot, validation) {
            return false;
        }

        let image = match random_image() {
            Ok(image) => image,
            Err(e) => {
                step.add_failure(Failure::new(
                    FailureKind::Request,
                    format!("POST / : {}", e),
                ));
                return false;
            }
        };
        let post = Post {
            id: 0,
            mime: "image/png".to_string(),
            body: random_text(),
            imgdata_hash: String::new(),
            user_id: user.id,
            created_at: Utc::now(),
        };
        let res = match actions::post_root(cancel, &agent, &post, &user.csrf_token(), image).await
        {
            Ok(res) => res,
            Err(e) => return request_failed(step, Method::POST, "/", &e),
        };
        let validation = validate_response(&res, &[&ExpectStatus(302)]).await;
        if !settle(cancel, step, ScoreTag::PostRoot, validation) {
            return false;
        }

        let res = match actions::get_root(cancel, &agent).await {
            Ok(res) => res,
            Err(e) => return request_failed(step, Method::GET, "/", &e),
        };
        let assets = ExpectAssets::new(Arc::clone(&agent), cancel.clone());
        let validation = validate_response(&res, &[&ExpectStatus(200), &assets]).await;
        settle(cancel, step, ScoreTag::GetRoot, validation)
    }

    /// Fetch the feed and check it is newest first
    pub async fn ordered_index(
        &self,
        cancel: &CancellationToken,
        step: &BenchmarkStep,
        user: &User,
    ) -> bool {
        let Some(agent) = self.agent(step, user) else {
            return false;
        };

        let res = match actions::get_root(cancel, &agent).await {
            Ok(res) => res,
            Err(e) => return request_failed(step, Method::GET, "/", &e),
        };
        let validation =
            validate_response(&res, &[&ExpectStatus(200), &ExpectOrderedPosts]).await;
        settle(cancel, step, ScoreTag::GetRoot, validation)
    }
}

/// Record a step's outcome; true when the case may go on
fn settle(
    cancel: &CancellationToken,
    step: &BenchmarkStep,
    tag: ScoreTag,
    validation: ValidationError,
) -> bool {
    if !validation.is_empty() {
        validation.record(step);
        return false;
    }

    step.add_score(tag);
    !cancel.is_cancelled()
}

/// Record a transport failure; an exchange aborted by cancellation is not one
fn request_failed(step: &BenchmarkStep, method: Method, path: &str, err: &HttpError) -> bool {
    if !matches!(err, HttpError::Cancelled) {
        step.add_failure(Failure::request(&method, path, err));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_failure() -> ValidationError {
        Failure::new(
            FailureKind::StatusCode,
            "GET / : expected(200) != actual(500)",
        )
        .into()
    }

    #[test]
    fn test_settle_records_failures_after_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let step = BenchmarkStep::new();

        assert!(!settle(&cancel, &step, ScoreTag::GetRoot, status_failure()));
        assert_eq!(step.failure_count(), 1);
        assert!(step.score_breakdown().is_empty());
    }

    #[test]
    fn test_settle_credits_then_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        let step = BenchmarkStep::new();

        assert!(settle(&cancel, &step, ScoreTag::GetRoot, ValidationError::empty()));
        cancel.cancel();
        assert!(!settle(&cancel, &step, ScoreTag::GetRoot, ValidationError::empty()));
        assert_eq!(step.score_breakdown()[&ScoreTag::GetRoot], 2);
    }

    #[test]
    fn test_only_aborted_exchanges_are_dropped() {
        let step = BenchmarkStep::new();

        assert!(!request_failed(&step, Method::GET, "/", &HttpError::Cancelled));
        assert_eq!(step.failure_count(), 0);

        let err = HttpError::BodyUnavailable("connection reset".to_string());
        assert!(!request_failed(&step, Method::GET, "/", &err));
        let failures = step.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::Request);
        assert!(failures[0].message.starts_with("GET / : "));
    }
}
