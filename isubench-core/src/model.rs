//! Entity models loaded from the dump files

use chrono::{DateTime, Utc};
use isubench_http::{Agent, AgentConfig, HttpResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Anything a [`Registry`](crate::Registry) can hold
pub trait Entity {
    /// Positive, registry-unique identifier; 0 means "absent"
    fn id(&self) -> u64;

    fn created_at(&self) -> DateTime<Utc>;
}

/// Session-only state of a simulated user
#[derive(Debug, Default)]
pub struct Session {
    pub agent: Option<Arc<Agent>>,
    pub csrf_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub account_name: String,
    pub password: String,
    pub authority: i32,
    #[serde(rename = "del_flg")]
    pub delete_flag: i32,
    pub created_at: DateTime<Utc>,

    #[serde(skip)]
    session: RwLock<Session>,
}

impl User {
    pub fn new(id: u64, account_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id,
            account_name: account_name.into(),
            password: password.into(),
            authority: 0,
            delete_flag: 0,
            created_at: Utc::now(),
            session: RwLock::new(Session::default()),
        }
    }

    /// Logically deleted users are never sampled
    pub fn is_deleted(&self) -> bool {
        self.delete_flag != 0
    }

    /// The user's agent, created on first use
    pub fn agent(&self, config: &AgentConfig) -> HttpResult<Arc<Agent>> {
        if let Some(agent) = &self.session.read().agent {
            return Ok(Arc::clone(agent));
        }

        let mut session = self.session.write();
        // Another task may have won the race between the two locks
        if let Some(agent) = &session.agent {
            return Ok(Arc::clone(agent));
        }

        let agent = Arc::new(Agent::new(config.clone())?);
        session.agent = Some(Arc::clone(&agent));
        Ok(agent)
    }

    pub fn has_agent(&self) -> bool {
        self.session.read().agent.is_some()
    }

    pub fn csrf_token(&self) -> String {
        self.session.read().csrf_token.clone()
    }

    pub fn set_csrf_token(&self, token: impl Into<String>) {
        self.session.write().csrf_token = token.into();
    }

    pub fn clear_csrf_token(&self) {
        self.session.write().csrf_token.clear();
    }

    /// Drop the agent and token so the next iteration starts a new session
    pub fn reset_session(&self) {
        *self.session.write() = Session::default();
    }
}

impl Entity for User {
    fn id(&self) -> u64 {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub mime: String,
    pub body: String,
    pub imgdata_hash: String,
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
}

impl Entity for Post {
    fn id(&self) -> u64 {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub post_id: u64,
    pub user_id: u64,
}

impl Entity for Comment {
    fn id(&self) -> u64 {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
